//! Flat role graph.
//!
//! Membership is a set of `(role, account)` edges. Every role has an admin
//! role that may grant and revoke it. Three identifiers are fixed:
//! `SUPER_ADMIN` passes every check, `PUBLIC` matches everyone not holding
//! `BLACKLIST`. The concrete site-admin identifier lives in the settings store
//! and is swapped with a compare-and-swap. `SITE_ADMIN` is resolved to it on
//! every check, so headers and role admins naming `SITE_ADMIN` follow a swap
//! without being rewritten.

use crate::error::{ProtocolError, ProtocolResult};
use crate::events::{EventBus, EventKind};
use std::sync::Arc;
use wttp_core::{AccountId, Role};
use wttp_metadata::repos::settings::SITE_ADMIN_ROLE;
use wttp_metadata::{MetadataStore, RoleRepo, SettingsRepo};

#[derive(Clone)]
pub struct RoleGraph {
    metadata: Arc<dyn MetadataStore>,
    events: EventBus,
}

impl RoleGraph {
    pub fn new(metadata: Arc<dyn MetadataStore>, events: EventBus) -> Self {
        Self { metadata, events }
    }

    /// Whether `account` is treated as holding `role`.
    pub async fn has_role(&self, role: &Role, account: &AccountId) -> ProtocolResult<bool> {
        if self.metadata.has_member(&Role::super_admin(), account).await? {
            return Ok(true);
        }
        if role.is_public() {
            return Ok(!self.metadata.has_member(&Role::blacklist(), account).await?);
        }
        let role = self.resolve(role).await?;
        Ok(self.metadata.has_member(&role, account).await?)
    }

    /// Fail with `Unauthorized` unless `account` holds `role`.
    pub async fn require(&self, role: &Role, account: &AccountId) -> ProtocolResult<()> {
        if self.has_role(role, account).await? {
            Ok(())
        } else {
            Err(ProtocolError::Unauthorized {
                account: account.clone(),
                role: role.clone(),
            })
        }
    }

    /// Current site-admin identifier.
    pub async fn site_admin_role(&self) -> ProtocolResult<Role> {
        Ok(self
            .metadata
            .get_setting(SITE_ADMIN_ROLE)
            .await?
            .map(Role::new)
            .unwrap_or_else(Role::site_admin))
    }

    pub async fn is_site_admin(&self, account: &AccountId) -> ProtocolResult<bool> {
        self.has_role(&Role::site_admin(), account).await
    }

    /// Map `SITE_ADMIN` to the current site-admin identifier.
    async fn resolve(&self, role: &Role) -> ProtocolResult<Role> {
        if role.is_site_admin() {
            self.site_admin_role().await
        } else {
            Ok(role.clone())
        }
    }

    /// Admin of `role`; `SUPER_ADMIN` unless one was recorded.
    pub async fn role_admin(&self, role: &Role) -> ProtocolResult<Role> {
        Ok(self
            .metadata
            .get_role_admin(role)
            .await?
            .unwrap_or_else(Role::super_admin))
    }

    /// Register a role for use in header origins, administered by `SITE_ADMIN`.
    pub async fn create_resource_role(
        &self,
        caller: &AccountId,
        new_role: &Role,
    ) -> ProtocolResult<()> {
        let site_admin = Role::site_admin();
        self.require(&site_admin, caller).await?;
        if new_role.is_fixed_reserved()
            || new_role.is_site_admin()
            || *new_role == self.site_admin_role().await?
        {
            return Err(ProtocolError::InvalidRole(new_role.clone()));
        }

        self.metadata.set_role_admin(new_role, &site_admin).await?;
        tracing::info!(role = %new_role, "resource role created");
        self.events.emit(
            caller,
            EventKind::RoleCreated {
                role: new_role.clone(),
                admin: site_admin,
            },
        );
        Ok(())
    }

    /// Replace the site-admin identifier. Holders of the previous identifier
    /// lose site-admin status immediately.
    pub async fn change_site_admin(
        &self,
        caller: &AccountId,
        new_role: &Role,
    ) -> ProtocolResult<Role> {
        self.require(&Role::super_admin(), caller).await?;
        if new_role.is_fixed_reserved() {
            return Err(ProtocolError::InvalidRole(new_role.clone()));
        }

        loop {
            let stored = self.metadata.get_setting(SITE_ADMIN_ROLE).await?;
            let swapped = self
                .metadata
                .compare_and_swap_setting(SITE_ADMIN_ROLE, stored.as_deref(), new_role.as_str())
                .await?;
            if !swapped {
                tracing::debug!("site admin role changed concurrently, retrying");
                continue;
            }

            let previous = stored.map(Role::new).unwrap_or_else(Role::site_admin);
            tracing::info!(previous = %previous, current = %new_role, "site admin role changed");
            self.events.emit(
                caller,
                EventKind::SiteAdminChanged {
                    previous: previous.clone(),
                    current: new_role.clone(),
                },
            );
            return Ok(previous);
        }
    }

    /// Deny `account` public access. Explicit grants are unaffected.
    pub async fn blacklist(&self, caller: &AccountId, account: &AccountId) -> ProtocolResult<()> {
        self.require(&Role::super_admin(), caller).await?;
        if self.metadata.add_member(&Role::blacklist(), account).await? {
            tracing::info!(account = %account, "account blacklisted");
            self.events.emit(
                caller,
                EventKind::Blacklisted {
                    account: account.clone(),
                },
            );
        }
        Ok(())
    }

    /// Grant `role` to `account`. Returns false if it was already held.
    pub async fn grant_role(
        &self,
        caller: &AccountId,
        role: &Role,
        account: &AccountId,
    ) -> ProtocolResult<bool> {
        if role.is_public() {
            return Err(ProtocolError::InvalidRole(role.clone()));
        }
        let role = &self.resolve(role).await?;
        let admin = self.role_admin(role).await?;
        self.require(&admin, caller).await?;

        let added = self.metadata.add_member(role, account).await?;
        if added {
            tracing::info!(role = %role, account = %account, "role granted");
            self.events.emit(
                caller,
                EventKind::RoleGranted {
                    role: role.clone(),
                    account: account.clone(),
                },
            );
        }
        Ok(added)
    }

    /// Revoke `role` from `account`. Returns false if it was not held.
    pub async fn revoke_role(
        &self,
        caller: &AccountId,
        role: &Role,
        account: &AccountId,
    ) -> ProtocolResult<bool> {
        if role.is_public() {
            return Err(ProtocolError::InvalidRole(role.clone()));
        }
        let role = &self.resolve(role).await?;
        let admin = self.role_admin(role).await?;
        self.require(&admin, caller).await?;
        self.remove(caller, role, account).await
    }

    /// Drop the caller's own membership of `role`.
    pub async fn renounce_role(&self, caller: &AccountId, role: &Role) -> ProtocolResult<bool> {
        if role.is_public() {
            return Err(ProtocolError::InvalidRole(role.clone()));
        }
        let role = &self.resolve(role).await?;
        self.remove(caller, role, caller).await
    }

    pub async fn members(&self, role: &Role) -> ProtocolResult<Vec<AccountId>> {
        let role = self.resolve(role).await?;
        Ok(self.metadata.list_members(&role).await?)
    }

    async fn remove(
        &self,
        caller: &AccountId,
        role: &Role,
        account: &AccountId,
    ) -> ProtocolResult<bool> {
        let removed = self.metadata.remove_member(role, account).await?;
        if removed {
            tracing::info!(role = %role, account = %account, "role revoked");
            self.events.emit(
                caller,
                EventKind::RoleRevoked {
                    role: role.clone(),
                    account: account.clone(),
                },
            );
        }
        Ok(removed)
    }
}
