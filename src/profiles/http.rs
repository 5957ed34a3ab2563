use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::dto::{NewProfile, ProfilePatch};
use super::repo_types::Profile;
use super::store::ProfileStore;
use crate::client::{eq, select, HostedClient};
use crate::error::StoreError;

/// Profile store backed by the hosted relational REST endpoint.
pub struct HostedProfileStore {
    client: Arc<HostedClient>,
}

impl HostedProfileStore {
    pub fn new(client: Arc<HostedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProfileStore for HostedProfileStore {
    async fn select_by_id(&self, id: Uuid) -> Result<Profile, StoreError> {
        self.client
            .rest_select_one("profiles", &[select("*"), eq("id", id)])
            .await
    }

    async fn insert(&self, profile: NewProfile) -> Result<Profile, StoreError> {
        self.client.rest_insert("profiles", &profile).await
    }

    async fn update(&self, id: Uuid, patch: ProfilePatch) -> Result<Profile, StoreError> {
        self.client
            .rest_update("profiles", &[eq("id", id)], &patch)
            .await
    }
}
