//! In-memory metadata store.

use crate::error::MetadataResult;
use crate::repos::{HeaderRepo, ResourceRepo, RoleRepo, SettingsRepo};
use crate::store::MetadataStore;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use wttp_core::{AccountId, HeaderAddress, HeaderContent, ResourceRecord, Role};

/// Metadata store backed by concurrent maps. Contents are lost on drop.
#[derive(Default)]
pub struct MemoryStore {
    members: DashSet<(Role, AccountId)>,
    role_admins: DashMap<Role, Role>,
    headers: DashMap<HeaderAddress, HeaderContent>,
    resources: DashMap<String, ResourceRecord>,
    settings: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn migrate(&self) -> MetadataResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl RoleRepo for MemoryStore {
    async fn has_member(&self, role: &Role, account: &AccountId) -> MetadataResult<bool> {
        Ok(self.members.contains(&(role.clone(), account.clone())))
    }

    async fn add_member(&self, role: &Role, account: &AccountId) -> MetadataResult<bool> {
        Ok(self.members.insert((role.clone(), account.clone())))
    }

    async fn remove_member(&self, role: &Role, account: &AccountId) -> MetadataResult<bool> {
        Ok(self.members.remove(&(role.clone(), account.clone())).is_some())
    }

    async fn list_members(&self, role: &Role) -> MetadataResult<Vec<AccountId>> {
        let mut accounts: Vec<_> = self
            .members
            .iter()
            .filter(|entry| &entry.key().0 == role)
            .map(|entry| entry.key().1.clone())
            .collect();
        accounts.sort();
        Ok(accounts)
    }

    async fn get_role_admin(&self, role: &Role) -> MetadataResult<Option<Role>> {
        Ok(self.role_admins.get(role).map(|admin| admin.value().clone()))
    }

    async fn set_role_admin(&self, role: &Role, admin: &Role) -> MetadataResult<()> {
        self.role_admins.insert(role.clone(), admin.clone());
        Ok(())
    }
}

#[async_trait]
impl HeaderRepo for MemoryStore {
    async fn get_header(&self, address: &HeaderAddress) -> MetadataResult<Option<HeaderContent>> {
        Ok(self.headers.get(address).map(|h| h.value().clone()))
    }

    async fn put_header(
        &self,
        address: &HeaderAddress,
        header: &HeaderContent,
    ) -> MetadataResult<()> {
        self.headers.insert(*address, header.clone());
        Ok(())
    }

    async fn header_exists(&self, address: &HeaderAddress) -> MetadataResult<bool> {
        Ok(self.headers.contains_key(address))
    }
}

#[async_trait]
impl ResourceRepo for MemoryStore {
    async fn get_resource(&self, path: &str) -> MetadataResult<Option<ResourceRecord>> {
        Ok(self.resources.get(path).map(|r| r.value().clone()))
    }

    async fn put_resource(&self, path: &str, record: &ResourceRecord) -> MetadataResult<()> {
        self.resources.insert(path.to_string(), record.clone());
        Ok(())
    }

    async fn list_paths(&self) -> MetadataResult<Vec<String>> {
        let mut paths: Vec<_> = self.resources.iter().map(|r| r.key().clone()).collect();
        paths.sort();
        Ok(paths)
    }
}

#[async_trait]
impl SettingsRepo for MemoryStore {
    async fn get_setting(&self, key: &str) -> MetadataResult<Option<String>> {
        Ok(self.settings.get(key).map(|v| v.value().clone()))
    }

    async fn set_setting(&self, key: &str, value: &str) -> MetadataResult<()> {
        self.settings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn compare_and_swap_setting(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> MetadataResult<bool> {
        // The entry guard holds the shard lock across compare and write.
        let swapped = match (self.settings.entry(key.to_string()), expected) {
            (Entry::Vacant(slot), None) => {
                slot.insert(new.to_string());
                true
            }
            (Entry::Occupied(mut slot), Some(expected)) if slot.get() == expected => {
                slot.insert(new.to_string());
                true
            }
            _ => false,
        };
        Ok(swapped)
    }
}
