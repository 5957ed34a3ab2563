use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::StoreError;

/// Shared HTTP plumbing for the hosted backend: one client for both the
/// auth endpoint (`/auth/v1`) and the relational REST endpoint
/// (`/rest/v1`).
///
/// Requests carry the publishable key in `apikey` and a bearer token that
/// is the current access token once a session is established. No request
/// timeouts are configured; a hung call surfaces as a perpetual pending
/// state upstream.
pub struct HostedClient {
    http: reqwest::Client,
    base_url: String,
    publishable_key: String,
    access_token: RwLock<Option<String>>,
}

impl HostedClient {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            publishable_key: config.publishable_key.clone(),
            access_token: RwLock::new(None),
        }
    }

    /// Replace the bearer used for subsequent calls. `None` falls back to
    /// the publishable key.
    pub(crate) fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().expect("token cell poisoned") = token;
    }

    fn bearer(&self) -> String {
        self.access_token
            .read()
            .expect("token cell poisoned")
            .clone()
            .unwrap_or_else(|| self.publishable_key.clone())
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub(crate) async fn auth_post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let res = self
            .http
            .post(self.auth_url(path))
            .header("apikey", &self.publishable_key)
            .bearer_auth(self.bearer())
            .json(body)
            .send()
            .await?;
        let res = Self::check(res).await?;
        Ok(res.json().await?)
    }

    /// POST with no body and no expected payload (e.g. `logout`).
    pub(crate) async fn auth_post_empty(&self, path: &str) -> Result<(), StoreError> {
        let res = self
            .http
            .post(self.auth_url(path))
            .header("apikey", &self.publishable_key)
            .bearer_auth(self.bearer())
            .send()
            .await?;
        Self::check(res).await?;
        Ok(())
    }

    pub(crate) async fn rest_select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(String, String)],
    ) -> Result<Vec<T>, StoreError> {
        debug!(table, "rest select");
        let res = self
            .http
            .get(self.rest_url(table))
            .query(query)
            .header("apikey", &self.publishable_key)
            .bearer_auth(self.bearer())
            .send()
            .await?;
        let res = Self::check(res).await?;
        Ok(res.json().await?)
    }

    pub(crate) async fn rest_select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(String, String)],
    ) -> Result<T, StoreError> {
        let mut rows: Vec<T> = self.rest_select(table, query).await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(rows.swap_remove(0))
    }

    pub(crate) async fn rest_insert<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let mut rows: Vec<T> = self.rest_insert_many(table, body).await?;
        if rows.is_empty() {
            return Err(StoreError::Decode("empty insert representation".into()));
        }
        Ok(rows.swap_remove(0))
    }

    pub(crate) async fn rest_insert_many<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<Vec<T>, StoreError> {
        debug!(table, "rest insert");
        let res = self
            .http
            .post(self.rest_url(table))
            .header("apikey", &self.publishable_key)
            .bearer_auth(self.bearer())
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let res = Self::check(res).await?;
        Ok(res.json().await?)
    }

    pub(crate) async fn rest_update<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(String, String)],
        body: &B,
    ) -> Result<T, StoreError> {
        debug!(table, "rest update");
        let res = self
            .http
            .patch(self.rest_url(table))
            .query(query)
            .header("apikey", &self.publishable_key)
            .bearer_auth(self.bearer())
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let res = Self::check(res).await?;
        let mut rows: Vec<T> = res.json().await?;
        if rows.is_empty() {
            // The filter matched no rows; the update touched nothing.
            return Err(StoreError::NotFound);
        }
        Ok(rows.swap_remove(0))
    }

    pub(crate) async fn rest_delete(
        &self,
        table: &str,
        query: &[(String, String)],
    ) -> Result<(), StoreError> {
        debug!(table, "rest delete");
        let res = self
            .http
            .delete(self.rest_url(table))
            .query(query)
            .header("apikey", &self.publishable_key)
            .bearer_auth(self.bearer())
            .send()
            .await?;
        Self::check(res).await?;
        Ok(())
    }

    async fn check(res: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        let message = extract_message(&body).unwrap_or_else(|| format!("status {status}"));
        Err(match status.as_u16() {
            404 | 406 => StoreError::NotFound,
            400 | 401 | 403 | 409 | 422 | 429 => StoreError::Rejected(message),
            _ => StoreError::Transport(message),
        })
    }
}

/// Pull the human-readable message out of a backend error body. The auth
/// and REST endpoints disagree on the key.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    for key in ["message", "msg", "error_description", "error"] {
        if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
            return Some(text.to_string());
        }
    }
    None
}

/// `select` projection parameter.
pub(crate) fn select(columns: &str) -> (String, String) {
    ("select".to_string(), columns.to_string())
}

/// Column equality filter, `?column=eq.value`.
pub(crate) fn eq(column: &str, value: impl std::fmt::Display) -> (String, String) {
    (column.to_string(), format!("eq.{value}"))
}

/// `order` parameter, e.g. `created_at.desc`.
pub(crate) fn order(expr: &str) -> (String, String) {
    ("order".to_string(), expr.to_string())
}

/// Disjunction filter, `?or=(a.eq.1,b.eq.2)`.
pub(crate) fn or_filter(expr: &str) -> (String, String) {
    ("or".to_string(), format!("({expr})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HostedClient {
        HostedClient::new(&BackendConfig {
            url: "https://example.test/".into(),
            publishable_key: "pk-test".into(),
        })
    }

    #[test]
    fn urls_strip_trailing_slash() {
        let client = client();
        assert_eq!(
            client.auth_url("token?grant_type=password"),
            "https://example.test/auth/v1/token?grant_type=password"
        );
        assert_eq!(client.rest_url("profiles"), "https://example.test/rest/v1/profiles");
    }

    #[test]
    fn bearer_falls_back_to_publishable_key() {
        let client = client();
        assert_eq!(client.bearer(), "pk-test");
        client.set_access_token(Some("jwt".into()));
        assert_eq!(client.bearer(), "jwt");
        client.set_access_token(None);
        assert_eq!(client.bearer(), "pk-test");
    }

    #[test]
    fn query_builders() {
        assert_eq!(select("*"), ("select".to_string(), "*".to_string()));
        assert_eq!(eq("slug", "intro-to-rust"), ("slug".to_string(), "eq.intro-to-rust".to_string()));
        assert_eq!(eq("is_global", true), ("is_global".to_string(), "eq.true".to_string()));
        assert_eq!(order("created_at.desc"), ("order".to_string(), "created_at.desc".to_string()));
        assert_eq!(
            or_filter("course_id.eq.42,is_global.eq.true"),
            ("or".to_string(), "(course_id.eq.42,is_global.eq.true)".to_string())
        );
    }

    #[test]
    fn extracts_backend_error_messages() {
        assert_eq!(
            extract_message(r#"{"message":"duplicate key"}"#).as_deref(),
            Some("duplicate key")
        );
        assert_eq!(
            extract_message(r#"{"error_description":"Invalid login credentials"}"#).as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(
            extract_message(r#"{"msg":"User already registered"}"#).as_deref(),
            Some("User already registered")
        );
        assert_eq!(extract_message("<html>bad gateway</html>"), None);
    }
}
