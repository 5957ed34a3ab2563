use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::dto::{NewProfile, ProfilePatch};
use super::repo_types::Profile;
use super::store::ProfileStore;
use crate::error::StoreError;

/// In-memory profile store for tests and local development. Reads can be
/// made to fail once or block on a gate, which is how the race-sensitive
/// auth paths are exercised deterministically.
pub struct InMemoryProfileStore {
    rows: Mutex<HashMap<Uuid, Profile>>,
    read_error: Mutex<Option<StoreError>>,
    write_error: Mutex<Option<StoreError>>,
    read_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            read_error: Mutex::new(None),
            write_error: Mutex::new(None),
            read_gate: Mutex::new(None),
        }
    }

    /// Put a row in place directly, bypassing the insert path.
    pub fn seed(&self, profile: Profile) {
        self.rows.lock().expect("rows poisoned").insert(profile.id, profile);
    }

    /// Make the next read fail with `error`.
    pub fn fail_next_read(&self, error: StoreError) {
        *self.read_error.lock().expect("read_error poisoned") = Some(error);
    }

    /// Make the next write fail with `error`.
    pub fn fail_next_write(&self, error: StoreError) {
        *self.write_error.lock().expect("write_error poisoned") = Some(error);
    }

    /// Block reads until [`Self::release_reads`] is called.
    pub fn hold_reads(&self) {
        *self.read_gate.lock().expect("read_gate poisoned") = Some(Arc::new(Semaphore::new(0)));
    }

    /// Unblock every held and future read.
    pub fn release_reads(&self) {
        if let Some(gate) = self.read_gate.lock().expect("read_gate poisoned").take() {
            gate.add_permits(Semaphore::MAX_PERMITS);
        }
    }

    fn take_read_error(&self) -> Option<StoreError> {
        self.read_error.lock().expect("read_error poisoned").take()
    }

    fn take_write_error(&self) -> Option<StoreError> {
        self.write_error.lock().expect("write_error poisoned").take()
    }

    async fn wait_for_gate(&self) {
        let gate = self.read_gate.lock().expect("read_gate poisoned").clone();
        if let Some(gate) = gate {
            // The permit is returned on drop, so one release opens the
            // gate for every subsequent reader too.
            let _permit = gate.acquire().await;
        }
    }
}

impl Default for InMemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn select_by_id(&self, id: Uuid) -> Result<Profile, StoreError> {
        self.wait_for_gate().await;
        if let Some(error) = self.take_read_error() {
            return Err(error);
        }
        self.rows
            .lock()
            .expect("rows poisoned")
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert(&self, profile: NewProfile) -> Result<Profile, StoreError> {
        if let Some(error) = self.take_write_error() {
            return Err(error);
        }
        let mut rows = self.rows.lock().expect("rows poisoned");
        if rows.contains_key(&profile.id) {
            return Err(StoreError::Rejected(
                "duplicate key value violates unique constraint \"profiles_pkey\"".into(),
            ));
        }
        let now = OffsetDateTime::now_utc();
        let row = Profile {
            id: profile.id,
            full_name: profile.full_name,
            role: profile.role,
            faculty: None,
            department: None,
            matric_number: None,
            created_at: now,
            updated_at: now,
        };
        rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: ProfilePatch) -> Result<Profile, StoreError> {
        if let Some(error) = self.take_write_error() {
            return Err(error);
        }
        let mut rows = self.rows.lock().expect("rows poisoned");
        let row = rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(full_name) = patch.full_name {
            row.full_name = Some(full_name);
        }
        if let Some(role) = patch.role {
            row.role = role;
        }
        if let Some(faculty) = patch.faculty {
            row.faculty = Some(faculty);
        }
        if let Some(department) = patch.department {
            row.department = Some(department);
        }
        if let Some(matric_number) = patch.matric_number {
            row.matric_number = Some(matric_number);
        }
        row.updated_at = OffsetDateTime::now_utc();
        Ok(row.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::Role;

    fn new_profile(role: Role) -> NewProfile {
        NewProfile {
            id: Uuid::new_v4(),
            full_name: Some("Ada Lovelace".into()),
            role,
        }
    }

    #[tokio::test]
    async fn insert_then_select_round_trips() {
        let store = InMemoryProfileStore::new();
        let inserted = store.insert(new_profile(Role::Student)).await.unwrap();
        let fetched = store.select_by_id(inserted.id).await.unwrap();
        assert_eq!(fetched, inserted);
    }

    #[tokio::test]
    async fn select_missing_row_is_not_found() {
        let store = InMemoryProfileStore::new();
        let err = store.select_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = InMemoryProfileStore::new();
        let profile = new_profile(Role::Student);
        store.insert(profile.clone()).await.unwrap();
        let err = store.insert(profile).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }

    #[tokio::test]
    async fn update_applies_patch_fields_only() {
        let store = InMemoryProfileStore::new();
        let inserted = store.insert(new_profile(Role::Student)).await.unwrap();
        let updated = store
            .update(inserted.id, ProfilePatch::role(Role::Admin))
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.full_name, inserted.full_name);
    }

    #[tokio::test]
    async fn injected_read_failure_fires_once() {
        let store = InMemoryProfileStore::new();
        let inserted = store.insert(new_profile(Role::Student)).await.unwrap();
        store.fail_next_read(StoreError::Transport("connection reset".into()));
        assert!(store.select_by_id(inserted.id).await.is_err());
        assert!(store.select_by_id(inserted.id).await.is_ok());
    }
}
