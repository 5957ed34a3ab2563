use async_trait::async_trait;
use tokio::sync::broadcast;

use super::repo_types::{Session, SessionEvent, SignUpMetadata, SignUpOutcome};
use crate::error::StoreError;

/// Contract with the authentication collaborator.
///
/// Implementations own the credential lifecycle (issue, refresh, revoke);
/// callers treat the session as opaque apart from the identity it proves.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// One-shot read of the session that currently exists, if any.
    async fn current_session(&self) -> Result<Option<Session>, StoreError>;

    /// Push subscription for session changes (sign-in, token refresh,
    /// sign-out, from any source). Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, StoreError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: SignUpMetadata,
    ) -> Result<SignUpOutcome, StoreError>;

    async fn sign_out(&self) -> Result<(), StoreError>;
}
