mod dto;
mod http;
mod memory;
mod repo_types;
mod store;

pub use dto::{NewProfile, ProfilePatch};
pub use http::HostedProfileStore;
pub use memory::InMemoryProfileStore;
pub use repo_types::{Profile, Role};
pub use store::ProfileStore;
