use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Account role. A closed set: any other wire value is a deserialization
/// error, which surfaces as a profile-read failure instead of silently
/// gating as non-admin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

/// Application-owned record extending an identity with role and academic
/// metadata. `id` equals the identity's user id, one profile per user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub role: Role,
    pub faculty: Option<String>,
    pub department: Option<String>,
    pub matric_number: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_uses_lowercase_wire_values() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""admin""#);
        assert_eq!(serde_json::to_string(&Role::Student).unwrap(), r#""student""#);
    }

    #[test]
    fn unexpected_role_value_fails_to_deserialize() {
        let err = serde_json::from_str::<Role>(r#""superuser""#);
        assert!(err.is_err());
    }

    #[test]
    fn profile_deserializes_backend_row() {
        let json = r#"{
            "id": "6f2d7a1e-3b1c-4f5a-9d8e-0a1b2c3d4e5f",
            "full_name": "Ada Lovelace",
            "role": "student",
            "faculty": "Engineering",
            "department": null,
            "matric_number": "ENG/2024/001",
            "created_at": "2024-09-01T08:30:00Z",
            "updated_at": "2024-09-02T10:00:00Z"
        }"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(profile.role, Role::Student);
        assert!(profile.department.is_none());
        assert!(!profile.is_admin());
    }
}
