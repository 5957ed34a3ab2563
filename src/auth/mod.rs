pub mod bootstrap;
mod services;

pub use services::{AuthService, AuthState};
