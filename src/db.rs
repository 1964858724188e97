//! LMDB environment, table handles and the read/write entry points

use heed::types::{Bytes, SerdeJson, Str, U64};
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};

use crate::config::StoreConfig;
use crate::error::Result;
use crate::keys::build_key;
use crate::model::Permission;
use crate::tx::Tx;

pub type BindingDb = Database<Bytes, U64<byteorder::BigEndian>>;
pub type PermissionDb = Database<U64<byteorder::BigEndian>, SerdeJson<Permission>>;

/// Bidirectional index: fwd[a,b] and rev[b,a] stay in sync.
/// Values are the epoch second the pair was first written.
#[derive(Clone, Copy)]
pub struct BiPair {
    pub fwd: BindingDb,
    pub rev: BindingDb,
}

impl BiPair {
    #[inline]
    pub fn contains(&self, tx: &RoTxn, a: &[u8], b: &[u8]) -> Result<bool> {
        Ok(self.fwd.get(tx, &build_key(&[a, b])?)?.is_some())
    }

    /// Insert-or-ignore; returns true if the pair was new
    pub fn insert(&self, tx: &mut RwTxn, a: &[u8], b: &[u8], epoch: u64) -> Result<bool> {
        let fwd = build_key(&[a, b])?;
        if self.fwd.get(tx, &fwd)?.is_some() {
            return Ok(false);
        }
        self.fwd.put(tx, &fwd, &epoch)?;
        self.rev.put(tx, &build_key(&[b, a])?, &epoch)?;
        Ok(true)
    }

    /// Delete-if-present; returns true if the pair existed
    pub fn remove(&self, tx: &mut RwTxn, a: &[u8], b: &[u8]) -> Result<bool> {
        let r = self.fwd.delete(tx, &build_key(&[a, b])?)?;
        self.rev.delete(tx, &build_key(&[b, a])?)?;
        Ok(r)
    }

    /// Full keys of every fwd pair whose first part is `a`
    pub fn list_fwd(&self, tx: &RoTxn, a: &[u8]) -> Result<Vec<Vec<u8>>> {
        Self::list_pfx(tx, &self.fwd, a)
    }

    /// Full keys of every rev pair whose first part is `b`
    pub fn list_rev(&self, tx: &RoTxn, b: &[u8]) -> Result<Vec<Vec<u8>>> {
        Self::list_pfx(tx, &self.rev, b)
    }

    fn list_pfx(tx: &RoTxn, db: &BindingDb, pfx: &[u8]) -> Result<Vec<Vec<u8>>> {
        let prefix = build_key(&[pfx])?;
        let mut r = Vec::new();
        for item in db.prefix_iter(tx, &prefix)? {
            let (k, _) = item?;
            r.push(k.to_vec());
        }
        Ok(r)
    }

    fn clear(&self, tx: &mut RwTxn) -> Result<()> {
        self.fwd.clear(tx)?;
        self.rev.clear(tx)?;
        Ok(())
    }
}

/// All database handles
#[derive(Clone, Copy)]
pub struct Dbs {
    pub permissions: PermissionDb,
    /// (permission id, slug)
    pub libraries: BiPair,
    /// (username, permission id)
    pub users: BiPair,
    /// (role, permission id)
    pub roles: BiPair,
    pub meta: Database<Str, Str>,
}

/// Handle to an opened permission store. Cheap to clone; clones share the environment.
#[derive(Clone)]
pub struct Store {
    env: Env,
    dbs: Dbs,
}

impl Store {
    /// Open (or create) the environment described by `config`
    pub fn open(config: &StoreConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.path)?;
        // SAFETY: LMDB requires no other process to open this path with different flags.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(config.map_size)
                .max_readers(config.max_readers)
                .max_dbs(8)
                .open(&config.path)?
        };
        let mut tx = env.write_txn()?;
        let dbs = Dbs {
            permissions: env.create_database(&mut tx, Some("permissions"))?,
            libraries: BiPair {
                fwd: env.create_database(&mut tx, Some("library_bindings"))?,
                rev: env.create_database(&mut tx, Some("library_bindings_rev"))?,
            },
            users: BiPair {
                fwd: env.create_database(&mut tx, Some("user_bindings"))?,
                rev: env.create_database(&mut tx, Some("user_bindings_rev"))?,
            },
            roles: BiPair {
                fwd: env.create_database(&mut tx, Some("role_bindings"))?,
                rev: env.create_database(&mut tx, Some("role_bindings_rev"))?,
            },
            meta: env.create_database(&mut tx, Some("meta"))?,
        };
        tx.commit()?;
        tracing::debug!(path = %config.path.display(), "opened permission store");
        Ok(Store { env, dbs })
    }

    /// Run a read-only closure against one consistent snapshot
    #[inline]
    pub fn read<T, F: FnOnce(&Dbs, &RoTxn) -> Result<T>>(&self, f: F) -> Result<T> {
        let tx = self.env.read_txn()?;
        f(&self.dbs, &tx)
    }

    /// Run multiple operations in a single write transaction.
    /// Commits on `Ok`; on `Err` the transaction is dropped and nothing persists.
    pub fn transact<T, F: FnOnce(&mut Tx<'_>) -> Result<T>>(&self, f: F) -> Result<T> {
        let mut tx = Tx::new(self.env.write_txn()?, self.dbs);
        let r = f(&mut tx)?;
        tx.commit()?;
        Ok(r)
    }

    /// Drop every permission and binding
    pub fn clear_all(&self) -> Result<()> {
        self.transact(|tx| {
            let d = tx.dbs();
            d.permissions.clear(tx.txn())?;
            d.libraries.clear(tx.txn())?;
            d.users.clear(tx.txn())?;
            d.roles.clear(tx.txn())?;
            d.meta.clear(tx.txn())?;
            Ok(())
        })
    }
}

pub(crate) fn current_epoch() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
