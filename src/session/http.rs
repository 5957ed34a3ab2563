use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::dto::{PasswordGrantRequest, SignUpRequest, SignUpResponse, TokenGrant};
use super::repo_types::{Session, SessionEvent, SignUpMetadata, SignUpOutcome};
use super::store::SessionStore;
use crate::client::HostedClient;
use crate::error::StoreError;

const EVENT_CAPACITY: usize = 16;

/// Session store backed by the hosted auth endpoint.
///
/// Keeps the shared [`HostedClient`] bearer in sync with the current
/// session so relational calls run as the signed-in user.
pub struct HostedSessionStore {
    client: Arc<HostedClient>,
    current: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl HostedSessionStore {
    pub fn new(client: Arc<HostedClient>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            current: RwLock::new(None),
            events,
        }
    }

    fn install(&self, session: &Session) {
        self.client.set_access_token(Some(session.access_token.clone()));
        *self.current.write().expect("session cell poisoned") = Some(session.clone());
    }
}

#[async_trait]
impl SessionStore for HostedSessionStore {
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
        let grant: TokenGrant = self
            .client
            .auth_post("token?grant_type=password", &PasswordGrantRequest { email, password })
            .await?;
        let session = grant.into_session();
        debug!(user_id = %session.user.id, "password grant accepted");
        self.install(&session);
        let _ = self.events.send(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: SignUpMetadata,
    ) -> Result<SignUpOutcome, StoreError> {
        let response: SignUpResponse = self
            .client
            .auth_post(
                "signup",
                &SignUpRequest {
                    email,
                    password,
                    data: &metadata,
                },
            )
            .await?;
        match response {
            SignUpResponse::Granted(grant) => {
                let session = grant.into_session();
                debug!(user_id = %session.user.id, "signup auto-confirmed");
                self.install(&session);
                let _ = self.events.send(SessionEvent::SignedIn(session.clone()));
                Ok(SignUpOutcome {
                    user: session.user.clone(),
                    session: Some(session),
                })
            }
            SignUpResponse::Pending(user) => {
                debug!(user_id = %user.id, "signup pending confirmation");
                Ok(SignUpOutcome { user, session: None })
            }
        }
    }

    async fn sign_out(&self) -> Result<(), StoreError> {
        let had_session = self.current.read().expect("session cell poisoned").is_some();
        if had_session {
            // Revocation is best effort; the local session is cleared
            // either way.
            if let Err(err) = self.client.auth_post_empty("logout").await {
                warn!(error = %err, "token revocation failed");
            }
        }
        self.client.set_access_token(None);
        *self.current.write().expect("session cell poisoned") = None;
        let _ = self.events.send(SessionEvent::SignedOut);
        Ok(())
    }
}
