use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::profiles::Role;

/// Identity record issued by the auth collaborator. Read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Free-form metadata attached to the identity at registration time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Credential bundle proving an authenticated identity. Replaced wholesale
/// on token refresh, destroyed on sign-out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

impl Session {
    /// Stable subject identifier for the authenticated user.
    pub fn subject_id(&self) -> Uuid {
        self.user.id
    }
}

/// Change notification pushed by a session store. Delivered in the order
/// the transitions occur.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

/// Identity metadata recorded at registration.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpMetadata {
    pub full_name: String,
    pub role: Role,
}

/// Result of a registration: the identity always exists; the session is
/// present only when the backend auto-confirms new accounts.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: User,
    pub session: Option<Session>,
}
