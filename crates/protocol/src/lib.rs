//! WTTP protocol engine.
//!
//! [`Engine`] evaluates the eight protocol verbs against a chunk store and a
//! metadata store:
//! - role graph with fixed `PUBLIC`, `BLACKLIST` and `SUPER_ADMIN` roles and a
//!   swappable site-admin role
//! - content-addressed headers carrying per-method origin roles
//! - per-path resource records with ETags, conditional reads and ranges
//! - a broadcast channel of domain events for every mutation

pub mod bootstrap;
mod dispatcher;
pub mod engine;
pub mod error;
pub mod events;
pub mod headers;
pub mod resources;
pub mod roles;

pub use engine::Engine;
pub use error::{ProtocolError, ProtocolResult};
pub use events::{EventBus, EventKind, ProtocolEvent};
pub use headers::HeaderStore;
pub use resources::{PathLocks, ResourceStore};
pub use roles::RoleGraph;
