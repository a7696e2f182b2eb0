//! JSON map files and the source abstraction chunk maps and rules are read through.
//!
//! Map files hold one serialized [`Map`]. Writing goes through a temporary
//! sibling file and a rename so a crash never leaves a half-written map behind.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

use crate::map::Map;
use crate::rules::{RulesConfig, RulesError};

#[derive(Debug, Error)]
pub enum MapFileError {
    #[error("could not read map '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("could not parse map '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("map '{name}' layer '{layer}' has {found} tiles, expected {expected}")]
    LayerSize { name: String, layer: String, found: usize, expected: usize },
}

/// Where maps and rules files are read from.
pub trait MapSource {
    fn read_text(&self, name: &str) -> io::Result<String>;

    fn load_map(&self, name: &str) -> Result<Map, MapFileError> {
        let text = self
            .read_text(name)
            .map_err(|source| MapFileError::Io { name: name.to_string(), source })?;
        parse_map(name, &text)
    }

    fn load_rules(&self, name: &str) -> Result<RulesConfig, RulesError> {
        let text = self
            .read_text(name)
            .map_err(|source| RulesError::Io { name: name.to_string(), source })?;
        RulesConfig::from_toml(name, &text)
    }
}

/// Resolves names relative to a root directory.
#[derive(Clone, Debug)]
pub struct DirMapSource {
    root: PathBuf,
}

impl DirMapSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MapSource for DirMapSource {
    fn read_text(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.root.join(name))
    }
}

/// In-memory name to file-contents table.
#[derive(Clone, Debug, Default)]
pub struct MemoryMapSource {
    files: HashMap<String, String>,
}

impl MemoryMapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.files.insert(name.into(), text.into());
    }

    pub fn insert_map(&mut self, name: impl Into<String>, map: &Map) -> serde_json::Result<()> {
        let text = serde_json::to_string(map)?;
        self.insert_text(name, text);
        Ok(())
    }
}

impl MapSource for MemoryMapSource {
    fn read_text(&self, name: &str) -> io::Result<String> {
        self.files.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no file named '{name}'"))
        })
    }
}

pub fn parse_map(name: &str, text: &str) -> Result<Map, MapFileError> {
    let mut map: Map = serde_json::from_str(text)
        .map_err(|source| MapFileError::Parse { name: name.to_string(), source })?;
    let expected = map.width * map.height;
    for layer in &map.layers {
        if layer.tiles.len() != expected {
            return Err(MapFileError::LayerSize {
                name: name.to_string(),
                layer: layer.name.clone(),
                found: layer.tiles.len(),
                expected,
            });
        }
    }
    map.ensure_collision_layer();
    Ok(map)
}

pub fn read_map(path: &Path) -> Result<Map, MapFileError> {
    let name = path.display().to_string();
    let text = fs::read_to_string(path)
        .map_err(|source| MapFileError::Io { name: name.clone(), source })?;
    parse_map(&name, &text)
}

pub fn map_to_json(map: &Map) -> io::Result<String> {
    serde_json::to_string_pretty(map).map_err(io::Error::other)
}

/// Hash of the serialized map, stable for identical content.
pub fn map_fingerprint(map: &Map) -> io::Result<u64> {
    Ok(xxh3_64(map_to_json(map)?.as_bytes()))
}

pub fn write_map_atomic(path: &Path, map: &Map) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let json = map_to_json(map)?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::map::COLLISION_LAYER;

    #[test]
    fn atomic_write_then_read_preserves_map() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("region.json");
        let mut map = Map::with_layers(4, 3, &["background", COLLISION_LAYER]);
        map.title = "Crypt".into();
        map.set_tile(0, 3, 2, 9);

        write_map_atomic(&path, &map).unwrap();
        let loaded = read_map(&path).unwrap();

        assert_eq!(loaded, map);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn fingerprint_tracks_content() {
        let mut map = Map::with_layers(2, 2, &["background"]);
        let before = map_fingerprint(&map).unwrap();
        assert_eq!(before, map_fingerprint(&map.clone()).unwrap());

        map.set_tile(0, 1, 1, 4);
        assert_ne!(before, map_fingerprint(&map).unwrap());
    }

    #[test]
    fn parse_rejects_layer_with_wrong_tile_count() {
        let mut map = Map::with_layers(4, 3, &["background"]);
        map.layers[0].tiles.pop();
        let text = serde_json::to_string(&map).unwrap();

        let err = parse_map("broken.json", &text).unwrap_err();
        assert!(matches!(err, MapFileError::LayerSize { found: 11, expected: 12, .. }), "{err}");
    }

    #[test]
    fn parse_adds_missing_collision_layer() {
        let map = Map::with_layers(2, 2, &["background"]);
        let text = serde_json::to_string(&map).unwrap();
        let parsed = parse_map("a.json", &text).unwrap();
        assert_eq!(parsed.layer_names(), vec!["background", COLLISION_LAYER]);
    }

    #[test]
    fn memory_source_reports_missing_file_as_not_found() {
        let source = MemoryMapSource::new();
        let err = source.load_map("missing.json").unwrap_err();
        match err {
            MapFileError::Io { source, .. } => assert_eq!(source.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn dir_source_reads_relative_to_root() {
        let dir = tempdir().unwrap();
        let map = Map::with_layers(2, 2, &["background", COLLISION_LAYER]);
        write_map_atomic(&dir.path().join("chunks").join("start.json"), &map).unwrap();

        let source = DirMapSource::new(dir.path());
        assert_eq!(source.load_map("chunks/start.json").unwrap(), map);
    }
}
