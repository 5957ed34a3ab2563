use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::auth::bootstrap;
use crate::config::AppConfig;
use crate::error::StoreError;
use crate::nav::Navigator;
use crate::profiles::{NewProfile, Profile, ProfileStore, Role};
use crate::session::{Session, SessionEvent, SessionStore, SignUpMetadata, User};
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Aggregate identity state observed by every consumer.
///
/// `loading` is `true` from construction until the first resolution of
/// either "no session exists" or "a session exists and its profile fetch
/// has settled". While `loading` is `true`, [`AuthState::is_admin`] must
/// not be used for gating decisions.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub profile: Option<Profile>,
    pub session: Option<Session>,
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            profile: None,
            session: None,
            loading: true,
        }
    }
}

impl AuthState {
    /// Derived role check: `true` only for a loaded admin profile.
    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().map(|p| p.role == Role::Admin).unwrap_or(false)
    }

    fn signed_out() -> Self {
        Self {
            user: None,
            profile: None,
            session: None,
            loading: false,
        }
    }
}

/// Single reactive source of truth for "who is signed in and with what
/// role".
///
/// Every state write funnels through this service's one `watch` sender;
/// consumers hold receivers and re-evaluate on change. Profile fetches are
/// tagged with a generation so a result that was superseded by a newer
/// session change (most importantly an explicit sign-out) is discarded
/// instead of resurrecting a stale identity.
pub struct AuthService {
    sessions: Arc<dyn SessionStore>,
    profiles: Arc<dyn ProfileStore>,
    nav: Arc<dyn Navigator>,
    config: Arc<AppConfig>,
    state: watch::Sender<AuthState>,
    generation: AtomicU64,
}

impl AuthService {
    pub fn new(state: AppState) -> Arc<Self> {
        let (tx, _) = watch::channel(AuthState::default());
        Arc::new(Self {
            sessions: state.sessions,
            profiles: state.profiles,
            nav: state.nav,
            config: state.config,
            state: tx,
            generation: AtomicU64::new(0),
        })
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Watch receiver; the value changes on every state write.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub(crate) fn profiles(&self) -> &dyn ProfileStore {
        self.profiles.as_ref()
    }

    /// Resolve the pre-existing session, if any, and settle the initial
    /// state. Call once before serving consumers.
    #[instrument(skip(self))]
    pub async fn init(&self) {
        match self.sessions.current_session().await {
            Ok(session) => self.apply_session(session).await,
            Err(err) => {
                warn!(error = %err, "initial session read failed");
                self.apply_session(None).await;
            }
        }
    }

    /// Pump collaborator session events into the state. The returned
    /// handle is the subscription; aborting it at teardown unsubscribes.
    pub fn listen(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let mut events = self.sessions.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::SignedIn(session))
                    | Ok(SessionEvent::TokenRefreshed(session)) => {
                        service.apply_session(Some(session)).await;
                    }
                    Ok(SessionEvent::SignedOut) => service.apply_session(None).await,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "session events lagged; resyncing");
                        match service.sessions.current_session().await {
                            Ok(session) => service.apply_session(session).await,
                            Err(err) => warn!(error = %err, "resync read failed"),
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Verify credentials with the collaborator and settle the new
    /// identity. On failure the collaborator's error is returned verbatim
    /// and no state is touched.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), StoreError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(StoreError::Rejected("email and password are required".into()));
        }
        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(StoreError::Rejected("Invalid email".into()));
        }

        let session = self.sessions.sign_in_with_password(&email, password).await?;
        let user_id = session.user.id;
        info!(user_id = %user_id, email = %email, "signed in");
        self.apply_session(Some(session)).await;

        if bootstrap::matches(self.config.bootstrap_admin.as_ref(), &email, password) {
            bootstrap::heal_role(self, user_id).await;
        }
        Ok(())
    }

    /// Register a new identity and provision its profile row. The insert
    /// is explicit: the backing store's provisioning trigger is not
    /// guaranteed to exist.
    #[instrument(skip(self, password, full_name))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<(), StoreError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(StoreError::Rejected("email and password are required".into()));
        }
        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(StoreError::Rejected("Invalid email".into()));
        }

        let role = if bootstrap::matches(self.config.bootstrap_admin.as_ref(), &email, password) {
            Role::Admin
        } else {
            Role::Student
        };

        let metadata = SignUpMetadata {
            full_name: full_name.to_string(),
            role,
        };
        let outcome = self.sessions.sign_up(&email, password, metadata).await?;
        info!(user_id = %outcome.user.id, email = %email, role = ?role, "identity registered");

        if let Err(err) = self
            .profiles
            .insert(NewProfile {
                id: outcome.user.id,
                full_name: Some(full_name.to_string()),
                role,
            })
            .await
        {
            // The identity exists either way; a missing profile degrades
            // to student-equivalent gating on the next fetch.
            error!(error = %err, user_id = %outcome.user.id, "profile creation failed");
        }

        if let Some(session) = outcome.session {
            self.apply_session(Some(session)).await;
        }
        Ok(())
    }

    /// Clear the collaborator session, settle the signed-out state, then
    /// navigate to the sign-in page. Safe to call with no session.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        if let Err(err) = self.sessions.sign_out().await {
            warn!(error = %err, "session revocation failed; clearing local state anyway");
        }
        self.apply_session(None).await;
        self.nav.navigate_to(&self.config.routes.sign_in);
    }

    /// Apply a session change: update the identity synchronously, then
    /// fetch the matching profile before `loading` settles.
    async fn apply_session(&self, session: Option<Session>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        match session {
            None => {
                self.state.send_replace(AuthState::signed_out());
            }
            Some(session) => {
                let user = session.user.clone();
                self.state.send_modify(|st| {
                    // A new identity must never be observable with the
                    // previous identity's profile behind a settled
                    // `loading`.
                    st.user = Some(user.clone());
                    st.session = Some(session.clone());
                    st.profile = None;
                    st.loading = true;
                });
                self.resolve_profile(user.id, generation).await;
            }
        }
    }

    /// Fetch the profile for `user_id` and settle `loading`, unless a
    /// newer session change has superseded this fetch.
    async fn resolve_profile(&self, user_id: Uuid, generation: u64) {
        let profile = match self.profiles.select_by_id(user_id).await {
            Ok(profile) => Some(profile),
            Err(err) => {
                // Best effort: a failed read degrades to "no profile"
                // instead of wedging consumers behind `loading`.
                error!(error = %err, user_id = %user_id, "profile fetch failed");
                None
            }
        };
        self.commit_profile(user_id, profile, generation);
    }

    /// Re-run the profile fetch for the current identity without bumping
    /// the generation; a concurrent session change still wins.
    pub(crate) async fn refresh_profile(&self) {
        let user_id = match self.state.borrow().user.as_ref().map(|u| u.id) {
            Some(id) => id,
            None => return,
        };
        let generation = self.generation.load(Ordering::SeqCst);
        self.resolve_profile(user_id, generation).await;
    }

    fn commit_profile(&self, user_id: Uuid, profile: Option<Profile>, generation: u64) {
        self.state.send_if_modified(|st| {
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!(user_id = %user_id, generation, "discarding superseded profile fetch");
                return false;
            }
            if st.user.as_ref().map(|u| u.id) != Some(user_id) {
                return false;
            }
            st.profile = profile;
            st.loading = false;
            true
        });
    }
}
