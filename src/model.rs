//! Domain types: permissions, roles, and the external user/library records

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, Result};

/// Opaque permission handle, assigned on creation and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionId(pub u64);

impl PermissionId {
    #[inline]
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    #[inline]
    pub(crate) fn from_be_slice(b: &[u8]) -> Option<Self> {
        Some(PermissionId(u64::from_be_bytes(b.try_into().ok()?)))
    }
}

impl fmt::Display for PermissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Principal category. `Anonymous` is a binding target only, never a stored user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Anonymous,
    Reader,
    Premium,
    Moderator,
    Admin,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Anonymous, Role::Reader, Role::Premium, Role::Moderator, Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Anonymous => "anonymous",
            Role::Reader => "reader",
            Role::Premium => "premium",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    /// Admins and moderators see every enabled library when enumerating
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Moderator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| AccessError::validation(format!("unknown role {:?}", s)))
    }
}

/// A named grant. Library visibility comes from `is_wildcard` or library bindings;
/// `premium_chapter_access` is a separate axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    pub description: String,
    pub is_wildcard: bool,
    pub is_enabled: bool,
    pub premium_chapter_access: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Input for `create_permission`. New permissions start enabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPermission {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_wildcard: bool,
    #[serde(default)]
    pub premium_chapter_access: bool,
}

impl NewPermission {
    pub fn named(name: impl Into<String>) -> Self {
        NewPermission { name: name.into(), ..Default::default() }
    }

    pub fn wildcard(mut self) -> Self {
        self.is_wildcard = true;
        self
    }

    pub fn premium(mut self) -> Self {
        self.premium_chapter_access = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Full field replacement for `update_permission`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionUpdate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub is_wildcard: bool,
    pub is_enabled: bool,
    pub premium_chapter_access: bool,
}

impl From<&Permission> for PermissionUpdate {
    fn from(p: &Permission) -> Self {
        PermissionUpdate {
            name: p.name.clone(),
            description: p.description.clone(),
            is_wildcard: p.is_wildcard,
            is_enabled: p.is_enabled,
            premium_chapter_access: p.premium_chapter_access,
        }
    }
}

/// Display composition of a permission and its bound library slugs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionWithLibraries {
    #[serde(flatten)]
    pub permission: Permission,
    pub libraries: Vec<String>,
}

/// External identity record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub role: Role,
}

/// External library record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub slug: String,
    pub enabled: bool,
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AccessError::validation("name cannot be empty"));
    }
    Ok(())
}
