//! Binding sets: permission ↔ library, user ↔ permission, role ↔ permission
//!
//! Writes are idempotent. Binding an existing pair or unbinding a missing one
//! succeeds and reports `false`.

use crate::db::Store;
use crate::error::Result;
use crate::model::{PermissionId, Role};
use crate::read;

impl Store {
    pub fn bind_permission_to_library(&self, id: PermissionId, slug: &str) -> Result<bool> {
        self.transact(|tx| tx.bind_library(id, slug))
    }

    pub fn unbind_permission_from_library(&self, id: PermissionId, slug: &str) -> Result<bool> {
        self.transact(|tx| tx.unbind_library(id, slug))
    }

    pub fn assign_permission_to_user(&self, username: &str, id: PermissionId) -> Result<bool> {
        self.transact(|tx| tx.assign_to_user(username, id))
    }

    pub fn revoke_permission_from_user(&self, username: &str, id: PermissionId) -> Result<bool> {
        self.transact(|tx| tx.revoke_from_user(username, id))
    }

    pub fn assign_permission_to_role(&self, role: Role, id: PermissionId) -> Result<bool> {
        self.transact(|tx| tx.assign_to_role(role, id))
    }

    pub fn revoke_permission_from_role(&self, role: Role, id: PermissionId) -> Result<bool> {
        self.transact(|tx| tx.revoke_from_role(role, id))
    }

    /// Library slugs bound to a permission, sorted
    pub fn get_libraries_for_permission(&self, id: PermissionId) -> Result<Vec<String>> {
        self.read(|d, tx| read::libraries_for(d, tx, id))
    }

    /// Ids of permissions assigned directly to `username`, ascending
    pub fn get_user_permissions(&self, username: &str) -> Result<Vec<PermissionId>> {
        self.read(|d, tx| read::user_permission_ids(d, tx, username))
    }

    /// Ids of permissions assigned to `role`, ascending
    pub fn get_role_permissions(&self, role: Role) -> Result<Vec<PermissionId>> {
        self.read(|d, tx| read::role_permission_ids(d, tx, role))
    }

    pub fn get_users_with_permission(&self, id: PermissionId) -> Result<Vec<String>> {
        self.read(|d, tx| read::users_with(d, tx, id))
    }

    /// Roles holding a permission, ordered by role name
    pub fn get_roles_with_permission(&self, id: PermissionId) -> Result<Vec<Role>> {
        self.read(|d, tx| read::roles_with(d, tx, id))
    }
}
