//! Business-level domain logic: credential resolution (the layered
//! header/param/affinity/fallback scheme), the IP-affinity cache, the tool
//! catalog, and the gateway to the downstream appointment API.

pub mod affinity;
pub mod error;
pub mod gateway;
pub mod resolver;
pub mod tools;

pub use resolver::{spawn_affinity_sweeper, CredentialResolver, CredentialSources};
