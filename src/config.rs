use serde::Deserialize;

/// Hosted backend endpoint the client talks to.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    /// Publishable API key sent with every request; row access is enforced
    /// server-side per authenticated user.
    pub publishable_key: String,
}

/// Reserved credential pair used to provision the first administrator.
/// Absent means the bootstrap path is disabled.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

/// Route destinations the gate and the auth service navigate to.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutesConfig {
    pub sign_in: String,
    pub admin_sign_in: String,
    pub student_home: String,
    pub admin_home: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            sign_in: "/auth/login".into(),
            admin_sign_in: "/admin/login".into(),
            student_home: "/student".into(),
            admin_home: "/admin".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    pub routes: RoutesConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = BackendConfig {
            url: std::env::var("STUDYZONE_BACKEND_URL")?,
            publishable_key: std::env::var("STUDYZONE_PUBLISHABLE_KEY")?,
        };
        let bootstrap_admin = match (
            std::env::var("STUDYZONE_BOOTSTRAP_ADMIN_EMAIL").ok(),
            std::env::var("STUDYZONE_BOOTSTRAP_ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            _ => None,
        };
        let defaults = RoutesConfig::default();
        let routes = RoutesConfig {
            sign_in: std::env::var("STUDYZONE_ROUTE_SIGN_IN").unwrap_or(defaults.sign_in),
            admin_sign_in: std::env::var("STUDYZONE_ROUTE_ADMIN_SIGN_IN")
                .unwrap_or(defaults.admin_sign_in),
            student_home: std::env::var("STUDYZONE_ROUTE_STUDENT_HOME")
                .unwrap_or(defaults.student_home),
            admin_home: std::env::var("STUDYZONE_ROUTE_ADMIN_HOME").unwrap_or(defaults.admin_home),
        };
        Ok(Self {
            backend,
            bootstrap_admin,
            routes,
        })
    }
}
