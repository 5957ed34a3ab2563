mod dto;
mod http;
mod memory;
mod repo_types;
mod store;

pub use http::HostedSessionStore;
pub use memory::InMemorySessionStore;
pub use repo_types::{Session, SessionEvent, SignUpMetadata, SignUpOutcome, User, UserMetadata};
pub use store::SessionStore;
