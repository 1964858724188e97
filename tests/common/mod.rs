//! Shared fixtures: a throwaway store plus an in-memory directory

#![allow(dead_code)]

use libgate::{AccessResolver, MemoryDirectory, NewPermission, Permission, Role, Store, StoreConfig};
use tempfile::TempDir;

pub struct Fixture {
    pub store: Store,
    pub directory: MemoryDirectory,
    // dropped last so the environment closes before its directory goes away
    pub dir: TempDir,
}

pub fn config(dir: &TempDir) -> StoreConfig {
    StoreConfig { path: dir.path().join("libgate.mdb"), map_size: 10 << 20, max_readers: 126 }
}

pub fn setup() -> Fixture {
    let dir = TempDir::new().unwrap();
    let store = Store::open(&config(&dir)).unwrap();
    Fixture { store, directory: MemoryDirectory::new(), dir }
}

impl Fixture {
    pub fn resolver(&self) -> AccessResolver<'_, MemoryDirectory, MemoryDirectory> {
        AccessResolver::new(&self.store, &self.directory, &self.directory)
    }

    pub fn user(&self, username: &str, role: Role) -> &Self {
        self.directory.insert_user(username, role).unwrap();
        self
    }

    pub fn library(&self, slug: &str, enabled: bool) -> &Self {
        self.directory.upsert_library(slug, enabled).unwrap();
        self
    }

    pub fn permission(&self, new: NewPermission) -> Permission {
        self.store.create_permission(new).unwrap()
    }

    /// Non-wildcard permission bound to `slugs`
    pub fn bound(&self, name: &str, slugs: &[&str]) -> Permission {
        let p = self.permission(NewPermission::named(name));
        self.store.set_libraries_for_permission(p.id, slugs).unwrap();
        p
    }

    pub fn disable(&self, p: &Permission) {
        let mut upd = libgate::PermissionUpdate::from(p);
        upd.is_enabled = false;
        self.store.update_permission(p.id, upd).unwrap();
    }
}
