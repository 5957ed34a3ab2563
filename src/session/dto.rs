use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use super::repo_types::{Session, SignUpMetadata, User};

/// Body for `token?grant_type=password`.
#[derive(Debug, Serialize)]
pub(crate) struct PasswordGrantRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body for `signup`. The metadata lands on the identity record.
#[derive(Debug, Serialize)]
pub(crate) struct SignUpRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: &'a SignUpMetadata,
}

/// Token grant returned by the auth endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, relative to receipt.
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: User,
}

impl TokenGrant {
    pub(crate) fn into_session(self) -> Session {
        let expires_at = self
            .expires_in
            .map(|secs| OffsetDateTime::now_utc() + Duration::seconds(secs));
        Session {
            user: self.user,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}

/// Signup response: a full grant when the backend auto-confirms new
/// accounts, otherwise just the pending identity.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SignUpResponse {
    Granted(TokenGrant),
    Pending(User),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_grant_request_serializes_credentials() {
        let body = PasswordGrantRequest {
            email: "student@example.com",
            password: "correct-pw",
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("student@example.com"));
        assert!(json.contains("correct-pw"));
    }

    #[test]
    fn token_grant_deserializes_and_computes_expiry() {
        let json = r#"{
            "access_token": "jwt-abc",
            "refresh_token": "refresh-def",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": {
                "id": "6f2d7a1e-3b1c-4f5a-9d8e-0a1b2c3d4e5f",
                "email": "student@example.com",
                "user_metadata": {"full_name": "Ada Lovelace", "role": "student"}
            }
        }"#;
        let grant: TokenGrant = serde_json::from_str(json).unwrap();
        assert_eq!(grant.user.email, "student@example.com");
        assert_eq!(grant.user.user_metadata.full_name.as_deref(), Some("Ada Lovelace"));

        let session = grant.into_session();
        assert_eq!(session.access_token, "jwt-abc");
        assert_eq!(session.refresh_token.as_deref(), Some("refresh-def"));
        assert!(session.expires_at.is_some());
    }

    #[test]
    fn signup_response_handles_both_shapes() {
        let granted = r#"{
            "access_token": "jwt",
            "expires_in": 60,
            "user": {"id": "6f2d7a1e-3b1c-4f5a-9d8e-0a1b2c3d4e5f", "email": "a@b.co"}
        }"#;
        assert!(matches!(
            serde_json::from_str::<SignUpResponse>(granted).unwrap(),
            SignUpResponse::Granted(_)
        ));

        let pending = r#"{"id": "6f2d7a1e-3b1c-4f5a-9d8e-0a1b2c3d4e5f", "email": "a@b.co"}"#;
        assert!(matches!(
            serde_json::from_str::<SignUpResponse>(pending).unwrap(),
            SignUpResponse::Pending(_)
        ));
    }
}
