//! Bootstrap administrator provisioning.
//!
//! The reserved credential pair lives in configuration, and every use of
//! it is routed through this module: the sign-in self-heal for a
//! mis-provisioned seed profile, and the one-time deployment seeding step
//! behind the `seed-admin` binary.

use tracing::{info, warn};
use uuid::Uuid;

use super::services::AuthService;
use crate::config::BootstrapAdmin;
use crate::profiles::{NewProfile, ProfilePatch, Role};
use crate::state::AppState;

/// Whether the submitted credentials are the reserved bootstrap pair.
pub(crate) fn matches(bootstrap: Option<&BootstrapAdmin>, email: &str, password: &str) -> bool {
    bootstrap
        .map(|b| b.email.eq_ignore_ascii_case(email) && b.password == password)
        .unwrap_or(false)
}

/// Best-effort correction for a seed admin whose profile was provisioned
/// with the wrong role, or not at all. Never fails the surrounding
/// sign-in; a write failure only leaves the account gated as a student.
pub(crate) async fn heal_role(service: &AuthService, user_id: Uuid) {
    match service.snapshot().profile.map(|p| p.role) {
        Some(Role::Admin) => {}
        Some(Role::Student) => {
            info!(user_id = %user_id, "bootstrap admin profile has student role; correcting");
            match service.profiles().update(user_id, ProfilePatch::role(Role::Admin)).await {
                Ok(_) => service.refresh_profile().await,
                Err(err) => {
                    warn!(error = %err, user_id = %user_id, "bootstrap role correction failed");
                }
            }
        }
        None => {
            info!(user_id = %user_id, "bootstrap admin profile missing; creating");
            let row = NewProfile {
                id: user_id,
                full_name: None,
                role: Role::Admin,
            };
            match service.profiles().insert(row).await {
                Ok(_) => service.refresh_profile().await,
                Err(err) => {
                    warn!(error = %err, user_id = %user_id, "bootstrap profile creation failed");
                }
            }
        }
    }
}

/// One-time deployment step: make sure the bootstrap admin account
/// exists, can sign in, and carries the admin role. Run by the
/// `seed-admin` binary, outside any interactive sign-in path.
pub async fn seed(state: &AppState) -> anyhow::Result<()> {
    let Some(bootstrap) = state.config.bootstrap_admin.clone() else {
        anyhow::bail!("bootstrap admin credentials are not configured");
    };

    let service = AuthService::new(state.clone());
    service.init().await;

    if let Err(err) = service.sign_in(&bootstrap.email, &bootstrap.password).await {
        info!(error = %err, "bootstrap admin sign-in failed; registering the account");
        service
            .sign_up(&bootstrap.email, &bootstrap.password, "Administrator")
            .await
            .map_err(|e| anyhow::anyhow!("bootstrap admin registration failed: {e}"))?;
    }

    match service.snapshot().profile {
        Some(profile) if profile.role == Role::Admin => {
            info!(user_id = %profile.id, "bootstrap admin ready");
        }
        _ => {
            warn!("bootstrap admin profile not provisioned; rerun once the account is confirmed");
        }
    }

    service.sign_out().await;
    Ok(())
}
