//! Atomic replacement of a permission's library set

use crate::db::{current_epoch, Store};
use crate::error::Result;
use crate::keys::{get_part, text_part};
use crate::model::PermissionId;
use crate::tx::Tx;

impl Tx<'_> {
    /// Delete every library binding of `id`, then bind each slug in `slugs`.
    /// An error aborts the enclosing transaction, so the previous set survives.
    pub fn set_libraries_for_permission<I, S>(&mut self, id: PermissionId, slugs: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.require_permission(id)?;
        let d = self.dbs();
        let idb = id.to_be_bytes();

        for k in d.libraries.list_fwd(self.txn(), &idb)? {
            if let Some(slug) = get_part(&k, 1) {
                d.libraries.remove(self.txn(), &idb, slug)?;
            }
        }

        let now = current_epoch();
        for slug in slugs {
            let slug = text_part("library slug", slug.as_ref())?;
            d.libraries.insert(self.txn(), &idb, slug, now)?;
        }
        Ok(())
    }
}

impl Store {
    /// Replace the full library binding set of a permission in one transaction.
    /// Readers see either the old set or the new one; on error nothing changes.
    pub fn set_libraries_for_permission<I, S>(&self, id: PermissionId, slugs: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.transact(|tx| tx.set_libraries_for_permission(id, slugs))?;
        tracing::info!(id = %id, "library set replaced");
        Ok(())
    }
}
