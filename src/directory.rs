//! External collaborators: identity lookup and library listing
//!
//! The resolver only needs a user's role and the set of libraries with their
//! enabled flag. Host applications implement these traits over their own stores;
//! `MemoryDirectory` serves tests and the bundled server.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Deserialize;

use crate::error::{AccessError, Result};
use crate::keys::text_part;
use crate::model::{Library, Role, User};

/// Identity/role source
pub trait UserDirectory {
    fn find_user(&self, username: &str) -> Result<Option<User>>;
}

/// Library existence/visibility source
pub trait LibraryCatalog {
    fn list_libraries(&self) -> Result<Vec<Library>>;
}

#[derive(Deserialize)]
struct Seed {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    libraries: Vec<Library>,
}

/// In-memory users and libraries
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: RwLock<BTreeMap<String, Role>>,
    libraries: RwLock<BTreeMap<String, bool>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{ "users": [{"username", "role"}], "libraries": [{"slug", "enabled"}] }`
    pub fn from_json(doc: &str) -> Result<Self> {
        let seed: Seed = serde_json::from_str(doc)?;
        let dir = Self::new();
        for u in seed.users {
            dir.insert_user(&u.username, u.role)?;
        }
        for l in seed.libraries {
            dir.upsert_library(&l.slug, l.enabled)?;
        }
        Ok(dir)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Add or replace a user. `anonymous` is reserved for unauthenticated requests.
    pub fn insert_user(&self, username: &str, role: Role) -> Result<()> {
        text_part("username", username)?;
        if role == Role::Anonymous {
            return Err(AccessError::validation("anonymous is not a user role"));
        }
        self.users_mut().insert(username.to_string(), role);
        Ok(())
    }

    pub fn remove_user(&self, username: &str) -> bool {
        self.users_mut().remove(username).is_some()
    }

    pub fn upsert_library(&self, slug: &str, enabled: bool) -> Result<()> {
        text_part("library slug", slug)?;
        self.libraries_mut().insert(slug.to_string(), enabled);
        Ok(())
    }

    pub fn remove_library(&self, slug: &str) -> bool {
        self.libraries_mut().remove(slug).is_some()
    }

    fn users(&self) -> RwLockReadGuard<'_, BTreeMap<String, Role>> {
        self.users.read().unwrap_or_else(|p| p.into_inner())
    }

    fn users_mut(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Role>> {
        self.users.write().unwrap_or_else(|p| p.into_inner())
    }

    fn libraries_mut(&self) -> RwLockWriteGuard<'_, BTreeMap<String, bool>> {
        self.libraries.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl UserDirectory for MemoryDirectory {
    fn find_user(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users().get(username).map(|&role| User { username: username.to_string(), role }))
    }
}

impl LibraryCatalog for MemoryDirectory {
    fn list_libraries(&self) -> Result<Vec<Library>> {
        let libs = self.libraries.read().unwrap_or_else(|p| p.into_inner());
        Ok(libs.iter().map(|(slug, &enabled)| Library { slug: slug.clone(), enabled }).collect())
    }
}
