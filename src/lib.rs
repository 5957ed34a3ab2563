//! Client-side core for the StudyZone learning platform.
//!
//! Persistence and authentication live in a hosted backend. This crate
//! owns the contracts with that backend, the reactive auth state deciding
//! "who is signed in and with what role", the route gate protecting admin
//! and student subtrees, and the typed catalog reads the dashboards
//! consume. The view layer injects a [`nav::Navigator`] and observes
//! state through `watch` receivers.

pub mod auth;
pub mod client;
pub mod config;
pub mod data;
pub mod error;
pub mod gate;
pub mod nav;
pub mod profiles;
pub mod session;
pub mod state;

pub use auth::{AuthService, AuthState};
pub use error::StoreError;
pub use gate::{GateConfig, GateDecision, RouteGate};
pub use state::AppState;
