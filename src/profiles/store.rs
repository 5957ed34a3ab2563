use async_trait::async_trait;
use uuid::Uuid;

use super::dto::{NewProfile, ProfilePatch};
use super::repo_types::Profile;
use crate::error::StoreError;

/// Contract with the relational store for profile rows.
///
/// Which callers may read or write which rows is enforced by the
/// collaborator's server-side policies; a policy rejection surfaces as an
/// ordinary [`StoreError`].
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn select_by_id(&self, id: Uuid) -> Result<Profile, StoreError>;

    async fn insert(&self, profile: NewProfile) -> Result<Profile, StoreError>;

    async fn update(&self, id: Uuid, patch: ProfilePatch) -> Result<Profile, StoreError>;
}
