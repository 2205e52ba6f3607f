//! Role membership and admin-edge repository.

use crate::error::MetadataResult;
use async_trait::async_trait;
use wttp_core::{AccountId, Role};

/// Repository for the role graph: who holds which role, and which role administers it.
///
/// Authorization rules live above this layer; the repository only records facts.
#[async_trait]
pub trait RoleRepo: Send + Sync {
    /// Whether `account` directly holds `role`.
    async fn has_member(&self, role: &Role, account: &AccountId) -> MetadataResult<bool>;

    /// Grant `role` to `account`. Returns `false` if already held.
    async fn add_member(&self, role: &Role, account: &AccountId) -> MetadataResult<bool>;

    /// Revoke `role` from `account`. Returns `false` if not held.
    async fn remove_member(&self, role: &Role, account: &AccountId) -> MetadataResult<bool>;

    /// Accounts directly holding `role`, sorted.
    async fn list_members(&self, role: &Role) -> MetadataResult<Vec<AccountId>>;

    /// Admin role of `role`, if one was recorded.
    async fn get_role_admin(&self, role: &Role) -> MetadataResult<Option<Role>>;

    /// Record `admin` as the admin role of `role`.
    async fn set_role_admin(&self, role: &Role, admin: &Role) -> MetadataResult<()>;
}
