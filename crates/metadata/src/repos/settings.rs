//! Process-wide settings repository.

use crate::error::MetadataResult;
use async_trait::async_trait;

/// Key of the current site-admin role identifier.
pub const SITE_ADMIN_ROLE: &str = "site_admin_role";

/// Repository for small string settings.
#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn get_setting(&self, key: &str) -> MetadataResult<Option<String>>;

    /// Set a setting unconditionally.
    async fn set_setting(&self, key: &str, value: &str) -> MetadataResult<()>;

    /// Set `key` to `new` only if it currently equals `expected` (`None` = unset).
    ///
    /// Returns `true` if the swap happened.
    async fn compare_and_swap_setting(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> MetadataResult<bool>;
}
