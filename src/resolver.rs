//! Access decisions
//!
//! Library visibility:
//! - A permission counts only while `is_enabled`
//! - A counted permission grants library `L` if it is a wildcard or is bound to `L`
//! - A principal holds a permission directly (user binding) or through its role
//!
//! Enumeration adds two rules the single check does not have: admins and moderators
//! see every enabled library, and anonymous visitors see every enabled library when
//! no enabled anonymous permission binds any library.
//!
//! Premium chapters are a separate axis: any permission with `premium_chapter_access`
//! held directly or through the role, regardless of its enabled/wildcard flags.
//!
//! Every call evaluates against one read snapshot. Storage and collaborator errors
//! propagate unchanged; there is no default-on-error.

use std::collections::BTreeSet;

use heed::RoTxn;

use crate::db::{Dbs, Store};
use crate::directory::{LibraryCatalog, UserDirectory};
use crate::error::{AccessError, Result};
use crate::model::{PermissionId, Role};
use crate::read;

/// What a set of permissions makes visible
enum Reach {
    Everything,
    Bound(BTreeSet<String>),
}

fn grants_library(d: &Dbs, tx: &RoTxn, ids: &[PermissionId], slug: &str) -> Result<bool> {
    for p in read::load_all(d, tx, ids)? {
        if p.is_enabled && (p.is_wildcard || read::is_bound(d, tx, p.id, slug)?) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn reach(d: &Dbs, tx: &RoTxn, ids: &[PermissionId]) -> Result<Reach> {
    let mut bound = BTreeSet::new();
    for p in read::load_all(d, tx, ids)? {
        if !p.is_enabled {
            continue;
        }
        if p.is_wildcard {
            return Ok(Reach::Everything);
        }
        bound.extend(read::libraries_for(d, tx, p.id)?);
    }
    Ok(Reach::Bound(bound))
}

fn any_premium(d: &Dbs, tx: &RoTxn, ids: &[PermissionId]) -> Result<bool> {
    Ok(read::load_all(d, tx, ids)?.iter().any(|p| p.premium_chapter_access))
}

/// Answers access questions against a store plus the two external sources
pub struct AccessResolver<'a, U, L> {
    store: &'a Store,
    users: &'a U,
    libraries: &'a L,
}

impl<'a, U: UserDirectory, L: LibraryCatalog> AccessResolver<'a, U, L> {
    pub fn new(store: &'a Store, users: &'a U, libraries: &'a L) -> Self {
        AccessResolver { store, users, libraries }
    }

    /// Direct-or-role check for one library. An unknown user is simply denied.
    /// Admin and moderator roles get no implicit pass here.
    pub fn user_has_library_access(&self, username: &str, slug: &str) -> Result<bool> {
        let Some(user) = self.users.find_user(username)? else {
            tracing::debug!(username, slug, "library check for unknown user");
            return Ok(false);
        };
        let allowed = self.store.read(|d, tx| {
            let direct = read::user_permission_ids(d, tx, &user.username)?;
            if grants_library(d, tx, &direct, slug)? {
                return Ok(true);
            }
            grants_library(d, tx, &read::role_permission_ids(d, tx, user.role)?, slug)
        })?;
        tracing::debug!(username, slug, role = %user.role, allowed, "library check");
        Ok(allowed)
    }

    /// Same predicate as the role path, for the `anonymous` pseudo-role
    pub fn anonymous_has_library_access(&self, slug: &str) -> Result<bool> {
        let allowed = self.store.read(|d, tx| {
            grants_library(d, tx, &read::role_permission_ids(d, tx, Role::Anonymous)?, slug)
        })?;
        tracing::debug!(slug, allowed, "anonymous library check");
        Ok(allowed)
    }

    /// Sorted slugs of every enabled library the user can see.
    /// Fails with `UserNotFound` for an unknown user.
    pub fn get_accessible_libraries_for_user(&self, username: &str) -> Result<Vec<String>> {
        let user = self
            .users
            .find_user(username)?
            .ok_or_else(|| AccessError::UserNotFound(username.to_string()))?;
        let enabled = self.enabled_slugs()?;

        if user.role.is_staff() {
            tracing::debug!(username, role = %user.role, "staff role sees every enabled library");
            return Ok(enabled.into_iter().collect());
        }

        let visible = self.store.read(|d, tx| {
            let mut ids = read::user_permission_ids(d, tx, &user.username)?;
            ids.extend(read::role_permission_ids(d, tx, user.role)?);
            ids.sort_unstable();
            ids.dedup();
            reach(d, tx, &ids)
        })?;

        Ok(match visible {
            Reach::Everything => enabled.into_iter().collect(),
            Reach::Bound(bound) => bound.intersection(&enabled).cloned().collect(),
        })
    }

    /// Sorted slugs of every enabled library an unauthenticated visitor can see.
    /// Falls back to all enabled libraries when no enabled anonymous permission binds anything.
    /// The fallback looks at the bound slugs before they are filtered by the enabled set:
    /// bindings that all point at disabled libraries yield an empty list, not everything.
    pub fn get_accessible_libraries_for_anonymous(&self) -> Result<Vec<String>> {
        let enabled = self.enabled_slugs()?;
        let visible = self.store.read(|d, tx| {
            reach(d, tx, &read::role_permission_ids(d, tx, Role::Anonymous)?)
        })?;

        Ok(match visible {
            Reach::Everything => enabled.into_iter().collect(),
            Reach::Bound(bound) if bound.is_empty() => {
                tracing::warn!("no anonymous library bindings configured; exposing every enabled library");
                enabled.into_iter().collect()
            }
            Reach::Bound(bound) => bound.intersection(&enabled).cloned().collect(),
        })
    }

    /// Premium chapter access through any permission assigned to `role`
    pub fn role_has_access(&self, role: Role) -> Result<bool> {
        self.store.read(|d, tx| any_premium(d, tx, &read::role_permission_ids(d, tx, role)?))
    }

    /// Premium chapter access, direct first, then through the user's role.
    /// An unknown user has no access.
    pub fn user_has_premium_chapter_access(&self, username: &str) -> Result<bool> {
        let Some(user) = self.users.find_user(username)? else {
            return Ok(false);
        };
        let allowed = self.store.read(|d, tx| {
            if any_premium(d, tx, &read::user_permission_ids(d, tx, &user.username)?)? {
                return Ok(true);
            }
            any_premium(d, tx, &read::role_permission_ids(d, tx, user.role)?)
        })?;
        tracing::debug!(username, role = %user.role, allowed, "premium check");
        Ok(allowed)
    }

    fn enabled_slugs(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .libraries
            .list_libraries()?
            .into_iter()
            .filter(|l| l.enabled)
            .map(|l| l.slug)
            .collect())
    }
}
