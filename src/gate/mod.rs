mod decision;

pub use decision::{evaluate, GateConfig, GateDecision};

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::auth::AuthState;
use crate::config::RoutesConfig;
use crate::nav::Navigator;

/// Push-driven gate for one protected subtree.
///
/// Re-evaluates on every auth state change and issues a fire-and-forget
/// navigation when the decision flips to a redirect. There is no error
/// state: upstream profile-fetch failures were already normalized to "no
/// profile", which gates exactly like a signed-in student.
pub struct RouteGate {
    config: GateConfig,
    routes: RoutesConfig,
    nav: Arc<dyn Navigator>,
    states: watch::Receiver<AuthState>,
    decision: watch::Sender<GateDecision>,
}

impl RouteGate {
    pub fn new(
        states: watch::Receiver<AuthState>,
        nav: Arc<dyn Navigator>,
        routes: RoutesConfig,
        config: GateConfig,
    ) -> Self {
        let initial = evaluate(&states.borrow(), &config, &routes);
        let (decision, _) = watch::channel(initial);
        Self {
            config,
            routes,
            nav,
            states,
            decision,
        }
    }

    /// Latest decision, for render logic.
    pub fn decision(&self) -> GateDecision {
        self.decision.borrow().clone()
    }

    /// Observe decision changes.
    pub fn decisions(&self) -> watch::Receiver<GateDecision> {
        self.decision.subscribe()
    }

    /// Drive the gate until the auth service goes away. Grab a
    /// [`Self::decisions`] receiver before calling this.
    pub fn run(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            // Mount-time evaluation, then push-driven re-evaluation.
            self.apply(true);
            while self.states.changed().await.is_ok() {
                self.apply(false);
            }
        })
    }

    /// Build and drive a gate in one step, returning the decision stream.
    pub fn spawn(
        states: watch::Receiver<AuthState>,
        nav: Arc<dyn Navigator>,
        routes: RoutesConfig,
        config: GateConfig,
    ) -> (watch::Receiver<GateDecision>, JoinHandle<()>) {
        let gate = Self::new(states, nav, routes, config);
        let decisions = gate.decisions();
        (decisions, gate.run())
    }

    fn apply(&mut self, mount: bool) {
        let snapshot = self.states.borrow_and_update().clone();
        let next = evaluate(&snapshot, &self.config, &self.routes);
        if !mount && *self.decision.borrow() == next {
            return;
        }
        if let GateDecision::Redirect(path) = &next {
            debug!(path, require_admin = self.config.require_admin, "gate redirect");
            self.nav.navigate_to(path);
        }
        self.decision.send_replace(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthService;
    use crate::client::HostedClient;
    use crate::config::{AppConfig, BackendConfig, RoutesConfig};
    use crate::nav::RecordingNavigator;
    use crate::profiles::{InMemoryProfileStore, Profile, Role};
    use crate::session::InMemorySessionStore;
    use crate::state::AppState;
    use time::OffsetDateTime;
    use uuid::Uuid;

    struct Harness {
        service: Arc<AuthService>,
        sessions: Arc<InMemorySessionStore>,
        profiles: Arc<InMemoryProfileStore>,
        gate_nav: Arc<RecordingNavigator>,
        routes: RoutesConfig,
    }

    fn harness() -> Harness {
        let config = Arc::new(AppConfig {
            backend: BackendConfig {
                url: "http://localhost:54321".into(),
                publishable_key: "publishable-test".into(),
            },
            bootstrap_admin: None,
            routes: RoutesConfig::default(),
        });
        let backend = Arc::new(HostedClient::new(&config.backend));
        let sessions = Arc::new(InMemorySessionStore::new());
        let profiles = Arc::new(InMemoryProfileStore::new());
        let routes = config.routes.clone();
        let service = AuthService::new(AppState::from_parts(
            config,
            backend,
            sessions.clone(),
            profiles.clone(),
            Arc::new(RecordingNavigator::new()),
        ));
        Harness {
            service,
            sessions,
            profiles,
            gate_nav: Arc::new(RecordingNavigator::new()),
            routes,
        }
    }

    fn seed_account(h: &Harness, email: &str, role: Role) -> Uuid {
        let id = Uuid::new_v4();
        h.sessions.register_account(id, email, "pw", None, None);
        let now = OffsetDateTime::now_utc();
        h.profiles.seed(Profile {
            id,
            full_name: None,
            role,
            faculty: None,
            department: None,
            matric_number: None,
            created_at: now,
            updated_at: now,
        });
        id
    }

    #[tokio::test]
    async fn fresh_process_waits_then_redirects_without_rendering() {
        let h = harness();
        let (mut decisions, handle) = RouteGate::spawn(
            h.service.subscribe(),
            h.gate_nav.clone(),
            h.routes.clone(),
            GateConfig::student(&h.routes),
        );
        assert_eq!(*decisions.borrow(), GateDecision::Wait);

        h.service.init().await;
        let decision = decisions
            .wait_for(|d| *d != GateDecision::Wait)
            .await
            .unwrap()
            .clone();
        assert_eq!(decision, GateDecision::Redirect("/auth/login".into()));
        assert_eq!(h.gate_nav.paths(), vec!["/auth/login"]);
        handle.abort();
    }

    #[tokio::test]
    async fn student_sign_in_never_renders_the_admin_subtree() {
        let h = harness();
        seed_account(&h, "student@example.com", Role::Student);
        h.service.init().await;
        h.service.sign_in("student@example.com", "pw").await.unwrap();

        let (mut decisions, handle) = RouteGate::spawn(
            h.service.subscribe(),
            h.gate_nav.clone(),
            h.routes.clone(),
            GateConfig::admin(&h.routes),
        );
        let decision = decisions
            .wait_for(|d| *d != GateDecision::Wait)
            .await
            .unwrap()
            .clone();
        assert_eq!(decision, GateDecision::Redirect("/student".into()));
        assert_eq!(h.gate_nav.last().as_deref(), Some("/student"));
        handle.abort();
    }

    #[tokio::test]
    async fn admin_sign_in_renders_the_admin_subtree() {
        let h = harness();
        seed_account(&h, "dean@example.com", Role::Admin);
        h.service.init().await;
        h.service.sign_in("dean@example.com", "pw").await.unwrap();

        let (mut decisions, handle) = RouteGate::spawn(
            h.service.subscribe(),
            h.gate_nav.clone(),
            h.routes.clone(),
            GateConfig::admin(&h.routes),
        );
        let decision = decisions
            .wait_for(|d| *d != GateDecision::Wait)
            .await
            .unwrap()
            .clone();
        assert_eq!(decision, GateDecision::Render);
        assert!(h.gate_nav.paths().is_empty());
        handle.abort();
    }

    #[tokio::test]
    async fn identical_snapshots_do_not_repeat_the_redirect() {
        let h = harness();
        h.service.init().await;

        let (mut decisions, handle) = RouteGate::spawn(
            h.service.subscribe(),
            h.gate_nav.clone(),
            h.routes.clone(),
            GateConfig::student(&h.routes),
        );
        decisions.wait_for(|d| *d != GateDecision::Wait).await.unwrap();

        // Repeated sign-outs re-publish the same signed-out snapshot.
        h.service.sign_out().await;
        h.service.sign_out().await;
        tokio::task::yield_now().await;

        assert_eq!(h.gate_nav.paths(), vec!["/auth/login"]);
        handle.abort();
    }

    #[tokio::test]
    async fn sign_out_flips_an_authorized_gate_to_redirect() {
        let h = harness();
        seed_account(&h, "student@example.com", Role::Student);
        h.service.init().await;
        h.service.sign_in("student@example.com", "pw").await.unwrap();

        let (mut decisions, handle) = RouteGate::spawn(
            h.service.subscribe(),
            h.gate_nav.clone(),
            h.routes.clone(),
            GateConfig::student(&h.routes),
        );
        decisions
            .wait_for(|d| *d == GateDecision::Render)
            .await
            .unwrap();

        h.service.sign_out().await;
        let decision = decisions
            .wait_for(|d| matches!(d, GateDecision::Redirect(_)))
            .await
            .unwrap()
            .clone();
        assert_eq!(decision, GateDecision::Redirect("/auth/login".into()));
        handle.abort();
    }
}
