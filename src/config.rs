//! Storage configuration

use std::env;
use std::path::PathBuf;

const DEFAULT_PATH: &str = "./data/libgate.mdb";
const DEFAULT_MAP_SIZE: usize = 1 << 30;
const DEFAULT_MAX_READERS: u32 = 126;

/// Where and how the LMDB environment is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the environment files (created if missing)
    pub path: PathBuf,

    /// Maximum size of the memory map in bytes
    pub map_size: usize,

    /// Maximum number of concurrent read transactions
    pub max_readers: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PATH),
            map_size: DEFAULT_MAP_SIZE,
            max_readers: DEFAULT_MAX_READERS,
        }
    }
}

impl StoreConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), ..Self::default() }
    }

    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            path: env::var("LIBGATE_DB").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_PATH)),

            map_size: env::var("LIBGATE_MAP_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_MAP_SIZE),

            max_readers: env::var("LIBGATE_MAX_READERS").ok().and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_MAX_READERS),
        }
    }
}
