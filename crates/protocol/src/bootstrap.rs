//! First-start initialization of the role graph and default header.

use crate::error::ProtocolResult;
use wttp_core::config::SiteConfig;
use wttp_core::{HeaderAddress, Role};
use wttp_metadata::repos::settings::SITE_ADMIN_ROLE;
use wttp_metadata::{HeaderRepo, MetadataStore, RoleRepo, SettingsRepo};

/// Make sure the owner, site admins and default header exist.
///
/// Safe to run on every start. A site-admin identifier or default header
/// already in the store wins over the configured one, since either may have
/// been changed at runtime. Returns the effective site-admin role.
pub async fn ensure_site(metadata: &dyn MetadataStore, config: &SiteConfig) -> ProtocolResult<Role> {
    if metadata.add_member(&Role::super_admin(), &config.owner).await? {
        tracing::info!(owner = %config.owner, "site owner granted super admin");
    }

    let configured = config.site_admin_role.as_str();
    let site_admin = if metadata
        .compare_and_swap_setting(SITE_ADMIN_ROLE, None, configured)
        .await?
    {
        tracing::info!(role = configured, "site admin role initialized");
        config.site_admin_role.clone()
    } else {
        let stored = metadata
            .get_setting(SITE_ADMIN_ROLE)
            .await?
            .map(Role::new)
            .unwrap_or_else(|| config.site_admin_role.clone());
        if stored != config.site_admin_role {
            tracing::debug!(stored = %stored, configured, "keeping stored site admin role");
        }
        stored
    };

    for account in &config.site_admins {
        if metadata.add_member(&site_admin, account).await? {
            tracing::info!(account = %account, role = %site_admin, "site admin granted");
        }
    }

    if metadata.header_exists(&HeaderAddress::DEFAULT).await? {
        tracing::debug!("default header already present");
    } else {
        let header = config.default_header.to_header();
        header.validate()?;
        metadata.put_header(&HeaderAddress::DEFAULT, &header).await?;
        tracing::info!(
            immutable = header.is_immutable(),
            methods = %header.methods,
            "default header written"
        );
    }

    Ok(site_admin)
}
