//! Transaction wrapper for composed writes

use heed::{RoTxn, RwTxn};

use crate::db::{current_epoch, Dbs};
use crate::error::{AccessError, Result};
use crate::keys::{get_part, text_part};
use crate::model::{validate_name, NewPermission, Permission, PermissionId, PermissionUpdate, Role};
use crate::read;

const NEXT_ID: &str = "next_permission_id";

/// An open write transaction. Obtained through [`Store::transact`](crate::Store::transact);
/// everything done through one `Tx` commits or rolls back together.
pub struct Tx<'e> {
    txn: RwTxn<'e>,
    dbs: Dbs,
}

impl<'e> Tx<'e> {
    #[inline]
    pub(crate) fn new(txn: RwTxn<'e>, dbs: Dbs) -> Self {
        Tx { txn, dbs }
    }

    #[inline]
    pub(crate) fn txn(&mut self) -> &mut RwTxn<'e> {
        &mut self.txn
    }

    #[inline]
    pub(crate) fn dbs(&self) -> Dbs {
        self.dbs
    }

    #[inline]
    pub(crate) fn commit(self) -> Result<()> {
        Ok(self.txn.commit()?)
    }

    /// Run a read projection against this transaction's uncommitted state
    #[inline]
    pub fn read<T, F: FnOnce(&Dbs, &RoTxn) -> Result<T>>(&self, f: F) -> Result<T> {
        let ro: &RoTxn = &self.txn;
        f(&self.dbs, ro)
    }

    pub(crate) fn require_permission(&self, id: PermissionId) -> Result<Permission> {
        self.read(|d, tx| read::load_permission(d, tx, id))?
            .ok_or(AccessError::PermissionNotFound(id))
    }

    // ------------------------------------------------------------------
    // Permission rows
    // ------------------------------------------------------------------

    /// Create a permission (enabled) and allocate its id
    pub fn create_permission(&mut self, new: NewPermission) -> Result<Permission> {
        validate_name(&new.name)?;
        let id = PermissionId(self.next_id()?);
        let now = current_epoch();
        let p = Permission {
            id,
            name: new.name,
            description: new.description,
            is_wildcard: new.is_wildcard,
            is_enabled: true,
            premium_chapter_access: new.premium_chapter_access,
            created_at: now,
            updated_at: now,
        };
        self.dbs.permissions.put(&mut self.txn, &id.0, &p)?;
        self.dbs.meta.put(&mut self.txn, NEXT_ID, &(id.0 + 1).to_string())?;
        Ok(p)
    }

    /// Replace every mutable field; `created_at` survives, `updated_at` is refreshed
    pub fn update_permission(&mut self, id: PermissionId, upd: PermissionUpdate) -> Result<Permission> {
        validate_name(&upd.name)?;
        let old = self.require_permission(id)?;
        let p = Permission {
            id,
            name: upd.name,
            description: upd.description,
            is_wildcard: upd.is_wildcard,
            is_enabled: upd.is_enabled,
            premium_chapter_access: upd.premium_chapter_access,
            created_at: old.created_at,
            updated_at: current_epoch().max(old.updated_at),
        };
        self.dbs.permissions.put(&mut self.txn, &id.0, &p)?;
        Ok(p)
    }

    /// Delete a permission and every binding that references it
    pub fn delete_permission(&mut self, id: PermissionId) -> Result<bool> {
        let d = self.dbs;
        let idb = id.to_be_bytes();
        let existed = d.permissions.delete(&mut self.txn, &id.0)?;

        for k in d.libraries.list_fwd(&self.txn, &idb)? {
            if let Some(slug) = get_part(&k, 1) {
                d.libraries.remove(&mut self.txn, &idb, slug)?;
            }
        }
        for k in d.users.list_rev(&self.txn, &idb)? {
            if let Some(username) = get_part(&k, 1) {
                d.users.remove(&mut self.txn, username, &idb)?;
            }
        }
        for k in d.roles.list_rev(&self.txn, &idb)? {
            if let Some(role) = get_part(&k, 1) {
                d.roles.remove(&mut self.txn, role, &idb)?;
            }
        }
        Ok(existed)
    }

    fn next_id(&mut self) -> Result<u64> {
        Ok(self.dbs.meta
            .get(&self.txn, NEXT_ID)?
            .and_then(|s| s.parse().ok())
            .unwrap_or(1u64))
    }

    // ------------------------------------------------------------------
    // Bindings: insert-or-ignore / delete-if-present
    // ------------------------------------------------------------------

    pub fn bind_library(&mut self, id: PermissionId, slug: &str) -> Result<bool> {
        let slug = text_part("library slug", slug)?;
        self.require_permission(id)?;
        let d = self.dbs;
        d.libraries.insert(&mut self.txn, &id.to_be_bytes(), slug, current_epoch())
    }

    pub fn unbind_library(&mut self, id: PermissionId, slug: &str) -> Result<bool> {
        let slug = text_part("library slug", slug)?;
        let d = self.dbs;
        d.libraries.remove(&mut self.txn, &id.to_be_bytes(), slug)
    }

    pub fn assign_to_user(&mut self, username: &str, id: PermissionId) -> Result<bool> {
        let username = text_part("username", username)?;
        self.require_permission(id)?;
        let d = self.dbs;
        d.users.insert(&mut self.txn, username, &id.to_be_bytes(), current_epoch())
    }

    pub fn revoke_from_user(&mut self, username: &str, id: PermissionId) -> Result<bool> {
        let username = text_part("username", username)?;
        let d = self.dbs;
        d.users.remove(&mut self.txn, username, &id.to_be_bytes())
    }

    pub fn assign_to_role(&mut self, role: Role, id: PermissionId) -> Result<bool> {
        self.require_permission(id)?;
        let d = self.dbs;
        d.roles.insert(&mut self.txn, role.as_str().as_bytes(), &id.to_be_bytes(), current_epoch())
    }

    pub fn revoke_from_role(&mut self, role: Role, id: PermissionId) -> Result<bool> {
        let d = self.dbs;
        d.roles.remove(&mut self.txn, role.as_str().as_bytes(), &id.to_be_bytes())
    }
}
