//! Per-save-slot storage of generated composite maps.

use std::io;
use std::path::PathBuf;

use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::map::Map;
use crate::map_file::{read_map, write_map_atomic};

pub const DEFAULT_SAVE_PREFIX: &str = "default";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveSlot {
    pub user_root: PathBuf,
    pub save_prefix: String,
    pub slot: u32,
}

impl SaveSlot {
    pub fn new(user_root: impl Into<PathBuf>, save_prefix: impl Into<String>, slot: u32) -> Self {
        Self { user_root: user_root.into(), save_prefix: save_prefix.into(), slot }
    }

    /// Save prefix, falling back to [`DEFAULT_SAVE_PREFIX`] when unset.
    pub fn prefix(&self) -> &str {
        if self.save_prefix.is_empty() { DEFAULT_SAVE_PREFIX } else { &self.save_prefix }
    }

    pub fn dir(&self) -> PathBuf {
        self.user_root.join("saves").join(self.prefix()).join(self.slot.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct GenerationCache {
    slot: SaveSlot,
}

impl GenerationCache {
    pub fn new(slot: SaveSlot) -> Self {
        Self { slot }
    }

    pub fn slot(&self) -> &SaveSlot {
        &self.slot
    }

    /// `<slot dir>/procgen/<xxh3 of the source map name>.json`
    pub fn cache_path(&self, source_map_name: &str) -> PathBuf {
        let hash = xxh3_64(source_map_name.as_bytes());
        self.slot.dir().join("procgen").join(format!("{hash:016x}.json"))
    }

    /// Cached composite for `source_map_name`. A missing file is a miss; an
    /// unreadable one is logged and treated as a miss.
    pub fn load(&self, source_map_name: &str) -> Option<Map> {
        let path = self.cache_path(source_map_name);
        if !path.exists() {
            return None;
        }
        match read_map(&path) {
            Ok(map) => {
                debug!(map = %source_map_name, path = %path.display(), "loaded cached procgen map");
                Some(map)
            }
            Err(err) => {
                warn!(map = %source_map_name, error = %err, "ignoring unreadable procgen cache");
                None
            }
        }
    }

    /// Writes `map` over any previous cache entry and returns its path.
    pub fn store(&self, source_map_name: &str, map: &Map) -> io::Result<PathBuf> {
        let path = self.cache_path(source_map_name);
        write_map_atomic(&path, map)?;
        Ok(path)
    }

    pub fn contains(&self, source_map_name: &str) -> bool {
        self.cache_path(source_map_name).exists()
    }
}
