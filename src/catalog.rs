//! Permission catalog: create, read, update and delete permission rows

use crate::db::Store;
use crate::error::{AccessError, Result};
use crate::model::{NewPermission, Permission, PermissionId, PermissionUpdate, PermissionWithLibraries};
use crate::read;

impl Store {
    /// Create a new, enabled permission. Fails with a validation error on an empty name.
    pub fn create_permission(&self, new: NewPermission) -> Result<Permission> {
        let p = self.transact(|tx| tx.create_permission(new))?;
        tracing::info!(id = %p.id, name = %p.name, wildcard = p.is_wildcard, "permission created");
        Ok(p)
    }

    pub fn get_permission(&self, id: PermissionId) -> Result<Permission> {
        self.read(|d, tx| read::load_permission(d, tx, id))?
            .ok_or(AccessError::PermissionNotFound(id))
    }

    /// All permissions, ordered by name
    pub fn get_permissions(&self) -> Result<Vec<Permission>> {
        self.read(read::all_permissions)
    }

    /// Full field replace; the name is re-validated
    pub fn update_permission(&self, id: PermissionId, upd: PermissionUpdate) -> Result<Permission> {
        let p = self.transact(|tx| tx.update_permission(id, upd))?;
        tracing::info!(id = %p.id, name = %p.name, enabled = p.is_enabled, "permission updated");
        Ok(p)
    }

    /// Remove a permission together with its library, user and role bindings.
    /// Returns whether the permission existed.
    pub fn delete_permission(&self, id: PermissionId) -> Result<bool> {
        let existed = self.transact(|tx| tx.delete_permission(id))?;
        if existed {
            tracing::info!(id = %id, "permission deleted");
        }
        Ok(existed)
    }

    pub fn get_permission_with_libraries(&self, id: PermissionId) -> Result<PermissionWithLibraries> {
        self.read(|d, tx| {
            let permission = read::load_permission(d, tx, id)?.ok_or(AccessError::PermissionNotFound(id))?;
            let libraries = read::libraries_for(d, tx, id)?;
            Ok(PermissionWithLibraries { permission, libraries })
        })
    }

    pub fn get_all_permissions_with_libraries(&self) -> Result<Vec<PermissionWithLibraries>> {
        self.read(|d, tx| {
            read::all_permissions(d, tx)?
                .into_iter()
                .map(|permission| {
                    let libraries = read::libraries_for(d, tx, permission.id)?;
                    Ok(PermissionWithLibraries { permission, libraries })
                })
                .collect()
        })
    }
}
