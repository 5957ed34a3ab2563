use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::repo_types::{Session, SessionEvent, SignUpMetadata, SignUpOutcome, User, UserMetadata};
use super::store::SessionStore;
use crate::error::StoreError;
use crate::profiles::Role;

const EVENT_CAPACITY: usize = 16;

struct Account {
    user: User,
    password: String,
}

/// Scriptable session store used in tests and local development. New
/// accounts are auto-confirmed, so `sign_up` always yields a session.
pub struct InMemorySessionStore {
    accounts: Mutex<HashMap<String, Account>>,
    current: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current: RwLock::new(None),
            events,
        }
    }

    /// Register an account that can then sign in with `password`.
    pub fn register_account(
        &self,
        id: Uuid,
        email: &str,
        password: &str,
        full_name: Option<String>,
        role: Option<Role>,
    ) {
        let user = User {
            id,
            email: email.to_string(),
            user_metadata: UserMetadata { full_name, role },
        };
        self.accounts.lock().expect("accounts poisoned").insert(
            email.to_string(),
            Account {
                user,
                password: password.to_string(),
            },
        );
    }

    /// Install a session silently, as if it survived from a previous run.
    pub fn set_current(&self, session: Session) {
        *self.current.write().expect("session cell poisoned") = Some(session);
    }

    /// Install a session and announce it, as an out-of-band sign-in from
    /// another tab would.
    pub fn push_session(&self, session: Session) {
        self.set_current(session.clone());
        let _ = self.events.send(SessionEvent::SignedIn(session));
    }

    /// Session for a registered account, without going through sign-in.
    pub fn session_for(&self, email: &str) -> Option<Session> {
        let accounts = self.accounts.lock().expect("accounts poisoned");
        accounts.get(email).map(|account| issue_session(account.user.clone()))
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn issue_session(user: User) -> Session {
    Session {
        user,
        access_token: format!("access-{}", Uuid::new_v4()),
        refresh_token: Some(format!("refresh-{}", Uuid::new_v4())),
        expires_at: Some(OffsetDateTime::now_utc() + Duration::hours(1)),
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn current_session(&self) -> Result<Option<Session>, StoreError> {
        Ok(self.current.read().expect("session cell poisoned").clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, StoreError> {
        let session = {
            let accounts = self.accounts.lock().expect("accounts poisoned");
            match accounts.get(email) {
                Some(account) if account.password == password => {
                    issue_session(account.user.clone())
                }
                _ => return Err(StoreError::Rejected("Invalid login credentials".into())),
            }
        };
        self.set_current(session.clone());
        let _ = self.events.send(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: SignUpMetadata,
    ) -> Result<SignUpOutcome, StoreError> {
        let user = {
            let mut accounts = self.accounts.lock().expect("accounts poisoned");
            if accounts.contains_key(email) {
                return Err(StoreError::Rejected("User already registered".into()));
            }
            let user = User {
                id: Uuid::new_v4(),
                email: email.to_string(),
                user_metadata: UserMetadata {
                    full_name: Some(metadata.full_name.clone()),
                    role: Some(metadata.role),
                },
            };
            accounts.insert(
                email.to_string(),
                Account {
                    user: user.clone(),
                    password: password.to_string(),
                },
            );
            user
        };
        let session = issue_session(user.clone());
        self.set_current(session.clone());
        let _ = self.events.send(SessionEvent::SignedIn(session.clone()));
        Ok(SignUpOutcome {
            user,
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> Result<(), StoreError> {
        *self.current.write().expect("session cell poisoned") = None;
        let _ = self.events.send(SessionEvent::SignedOut);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_in_rejects_unknown_or_wrong_credentials() {
        let store = InMemorySessionStore::new();
        store.register_account(Uuid::new_v4(), "a@b.co", "pw", None, None);

        let err = store.sign_in_with_password("a@b.co", "wrong").await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        let err = store.sign_in_with_password("nobody@b.co", "pw").await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert!(store.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_in_installs_session_and_emits_event() {
        let store = InMemorySessionStore::new();
        let id = Uuid::new_v4();
        store.register_account(id, "a@b.co", "pw", Some("Ada".into()), None);
        let mut events = store.subscribe();

        let session = store.sign_in_with_password("a@b.co", "pw").await.unwrap();
        assert_eq!(session.subject_id(), id);
        assert_eq!(store.current_session().await.unwrap().unwrap().user.id, id);
        assert!(matches!(events.recv().await.unwrap(), SessionEvent::SignedIn(_)));
    }

    #[tokio::test]
    async fn sign_up_rejects_duplicate_email() {
        let store = InMemorySessionStore::new();
        let metadata = SignUpMetadata {
            full_name: "Ada".into(),
            role: Role::Student,
        };
        store.sign_up("a@b.co", "pw", metadata.clone()).await.unwrap();
        let err = store.sign_up("a@b.co", "pw", metadata).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }

    #[tokio::test]
    async fn sign_out_is_idempotent_and_announced() {
        let store = InMemorySessionStore::new();
        store.register_account(Uuid::new_v4(), "a@b.co", "pw", None, None);
        store.sign_in_with_password("a@b.co", "pw").await.unwrap();
        let mut events = store.subscribe();

        store.sign_out().await.unwrap();
        store.sign_out().await.unwrap();
        assert!(store.current_session().await.unwrap().is_none());
        assert!(matches!(events.recv().await.unwrap(), SessionEvent::SignedOut));
        assert!(matches!(events.recv().await.unwrap(), SessionEvent::SignedOut));
    }
}
