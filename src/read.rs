//! Read projections (direct LMDB access, no side effects)
//!
//! Every function here takes `(&Dbs, &RoTxn)` so it runs unchanged under a read
//! snapshot or inside an in-flight write transaction.

use heed::RoTxn;

use crate::db::{BiPair, Dbs};
use crate::error::Result;
use crate::keys::{id_at, text_at, MAX_PART_LEN};
use crate::model::{Permission, PermissionId, Role};

/// Fwd keys under `a`; a part that could never have been stored yields nothing
fn scan_fwd(pair: &BiPair, tx: &RoTxn, a: &[u8]) -> Result<Vec<Vec<u8>>> {
    if a.len() > MAX_PART_LEN {
        return Ok(Vec::new());
    }
    pair.list_fwd(tx, a)
}

pub(crate) fn load_permission(d: &Dbs, tx: &RoTxn, id: PermissionId) -> Result<Option<Permission>> {
    Ok(d.permissions.get(tx, &id.0)?)
}

/// All permissions ordered by name, ties broken by id
pub(crate) fn all_permissions(d: &Dbs, tx: &RoTxn) -> Result<Vec<Permission>> {
    let mut r = Vec::new();
    for item in d.permissions.iter(tx)? {
        let (_, p) = item?;
        r.push(p);
    }
    r.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(r)
}

/// Bound slugs, byte-lexicographic. Key order puts shorter slugs first, so sort here.
pub(crate) fn libraries_for(d: &Dbs, tx: &RoTxn, id: PermissionId) -> Result<Vec<String>> {
    let mut r: Vec<String> = d.libraries.list_fwd(tx, &id.to_be_bytes())?
        .iter()
        .filter_map(|k| text_at(k, 1))
        .collect();
    r.sort_unstable();
    Ok(r)
}

pub(crate) fn user_permission_ids(d: &Dbs, tx: &RoTxn, username: &str) -> Result<Vec<PermissionId>> {
    Ok(scan_fwd(&d.users, tx, username.as_bytes())?
        .iter()
        .filter_map(|k| id_at(k, 1))
        .collect())
}

pub(crate) fn role_permission_ids(d: &Dbs, tx: &RoTxn, role: Role) -> Result<Vec<PermissionId>> {
    Ok(d.roles.list_fwd(tx, role.as_str().as_bytes())?
        .iter()
        .filter_map(|k| id_at(k, 1))
        .collect())
}

pub(crate) fn users_with(d: &Dbs, tx: &RoTxn, id: PermissionId) -> Result<Vec<String>> {
    let mut r: Vec<String> = d.users.list_rev(tx, &id.to_be_bytes())?
        .iter()
        .filter_map(|k| text_at(k, 1))
        .collect();
    r.sort_unstable();
    Ok(r)
}

/// Roles ordered by name, not by declaration order
pub(crate) fn roles_with(d: &Dbs, tx: &RoTxn, id: PermissionId) -> Result<Vec<Role>> {
    let mut r: Vec<Role> = d.roles.list_rev(tx, &id.to_be_bytes())?
        .iter()
        .filter_map(|k| text_at(k, 1))
        .filter_map(|s| s.parse().ok())
        .collect();
    r.sort_unstable_by_key(|role| role.as_str());
    Ok(r)
}

/// Resolve ids to permission rows, skipping ids whose row is gone
pub(crate) fn load_all(d: &Dbs, tx: &RoTxn, ids: &[PermissionId]) -> Result<Vec<Permission>> {
    let mut r = Vec::with_capacity(ids.len());
    for &id in ids {
        if let Some(p) = load_permission(d, tx, id)? {
            r.push(p);
        }
    }
    Ok(r)
}

/// Is library `slug` bound to permission `id`
#[inline]
pub(crate) fn is_bound(d: &Dbs, tx: &RoTxn, id: PermissionId, slug: &str) -> Result<bool> {
    if slug.len() > MAX_PART_LEN {
        return Ok(false);
    }
    d.libraries.contains(tx, &id.to_be_bytes(), slug.as_bytes())
}
