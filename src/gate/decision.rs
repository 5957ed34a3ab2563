use crate::auth::AuthState;
use crate::config::RoutesConfig;

/// What a protected subtree should do for the current auth snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Identity is still resolving: render a placeholder, take no action.
    Wait,
    /// Navigate away and render nothing for this frame.
    Redirect(String),
    /// Render the protected children.
    Render,
}

/// Per-subtree gate configuration.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Require the admin role, not just a signed-in user.
    pub require_admin: bool,
    /// Destination for unauthenticated visitors.
    pub redirect_to: String,
}

impl GateConfig {
    /// Gate for student subtrees: any signed-in user passes.
    pub fn student(routes: &RoutesConfig) -> Self {
        Self {
            require_admin: false,
            redirect_to: routes.sign_in.clone(),
        }
    }

    /// Gate for admin subtrees: unauthenticated visitors go to the admin
    /// sign-in page, signed-in non-admins to the student home.
    pub fn admin(routes: &RoutesConfig) -> Self {
        Self {
            require_admin: true,
            redirect_to: routes.admin_sign_in.clone(),
        }
    }
}

/// Decide render/redirect/wait for one snapshot.
///
/// `loading` is checked first; the role is never consulted while the
/// profile is still resolving.
pub fn evaluate(state: &AuthState, config: &GateConfig, routes: &RoutesConfig) -> GateDecision {
    if state.loading {
        return GateDecision::Wait;
    }
    if state.user.is_none() {
        return GateDecision::Redirect(config.redirect_to.clone());
    }
    if config.require_admin && !state.is_admin() {
        return GateDecision::Redirect(routes.student_home.clone());
    }
    // An admin landing on a general entry gate belongs on the admin home.
    if !config.require_admin && state.is_admin() && config.redirect_to == routes.sign_in {
        return GateDecision::Redirect(routes.admin_home.clone());
    }
    GateDecision::Render
}
