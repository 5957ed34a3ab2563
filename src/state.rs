use std::sync::Arc;

use crate::client::HostedClient;
use crate::config::{AppConfig, BackendConfig, BootstrapAdmin, RoutesConfig};
use crate::nav::{Navigator, RecordingNavigator};
use crate::profiles::{HostedProfileStore, InMemoryProfileStore, ProfileStore};
use crate::session::{HostedSessionStore, InMemorySessionStore, SessionStore};

/// Everything the auth service and the data layer need, wired once.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub backend: Arc<HostedClient>,
    pub sessions: Arc<dyn SessionStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub nav: Arc<dyn Navigator>,
}

impl AppState {
    /// Wire the hosted backend from environment configuration.
    pub fn init(nav: Arc<dyn Navigator>) -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let backend = Arc::new(HostedClient::new(&config.backend));
        let sessions =
            Arc::new(HostedSessionStore::new(backend.clone())) as Arc<dyn SessionStore>;
        let profiles =
            Arc::new(HostedProfileStore::new(backend.clone())) as Arc<dyn ProfileStore>;
        Ok(Self {
            config,
            backend,
            sessions,
            profiles,
            nav,
        })
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        backend: Arc<HostedClient>,
        sessions: Arc<dyn SessionStore>,
        profiles: Arc<dyn ProfileStore>,
        nav: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            config,
            backend,
            sessions,
            profiles,
            nav,
        }
    }

    /// Fully in-memory wiring. The backend client points at a local
    /// address and is never dialed.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            backend: BackendConfig {
                url: "http://localhost:54321".into(),
                publishable_key: "publishable-test".into(),
            },
            bootstrap_admin: Some(BootstrapAdmin {
                email: "admin@studyzone.com".into(),
                password: "admin123".into(),
            }),
            routes: RoutesConfig::default(),
        });
        let backend = Arc::new(HostedClient::new(&config.backend));
        Self {
            config,
            backend,
            sessions: Arc::new(InMemorySessionStore::new()),
            profiles: Arc::new(InMemoryProfileStore::new()),
            nav: Arc::new(RecordingNavigator::new()),
        }
    }
}
