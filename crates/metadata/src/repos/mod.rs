//! Repository traits for metadata operations.

pub mod headers;
pub mod resources;
pub mod roles;
pub mod settings;

pub use headers::HeaderRepo;
pub use resources::ResourceRepo;
pub use roles::RoleRepo;
pub use settings::SettingsRepo;
