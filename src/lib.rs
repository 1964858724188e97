//! libgate - library and premium-content access control
//!
//! Permissions carry three flags: `is_wildcard` (matches every library),
//! `is_enabled` (soft toggle) and `premium_chapter_access` (separate premium axis).
//! They are bound to libraries and granted to users or roles through three
//! independent binding sets. [`AccessResolver`] turns that state plus an external
//! user directory and library listing into yes/no decisions and library slug sets.
//!
//! ```no_run
//! use libgate::{AccessResolver, MemoryDirectory, NewPermission, Role, Store, StoreConfig};
//!
//! # fn main() -> libgate::Result<()> {
//! let store = Store::open(&StoreConfig::at("./data/libgate.mdb"))?;
//! let dir = MemoryDirectory::new();
//! dir.insert_user("bob", Role::Reader)?;
//! dir.upsert_library("fantasy", true)?;
//!
//! let p = store.create_permission(NewPermission::named("fantasy-reader"))?;
//! store.set_libraries_for_permission(p.id, ["fantasy"])?;
//! store.assign_permission_to_user("bob", p.id)?;
//!
//! let resolver = AccessResolver::new(&store, &dir, &dir);
//! assert!(resolver.user_has_library_access("bob", "fantasy")?);
//! # Ok(())
//! # }
//! ```

mod bindings;
mod catalog;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod keys;
pub mod model;
mod read;
mod rebind;
pub mod resolver;
pub mod tx;

pub use config::StoreConfig;
pub use db::{Dbs, Store};
pub use directory::{LibraryCatalog, MemoryDirectory, UserDirectory};
pub use error::{AccessError, Result};
pub use model::{
    Library, NewPermission, Permission, PermissionId, PermissionUpdate, PermissionWithLibraries, Role, User,
};
pub use resolver::AccessResolver;
pub use tx::Tx;
