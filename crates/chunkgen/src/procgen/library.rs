//! Pre-authored chunk maps grouped by the procgen role each one declares.

use std::collections::BTreeMap;

use slotmap::{SlotMap, new_key_type};
use tracing::{debug, warn};

use crate::map::{Map, ProcgenRole};
use crate::map_file::MapSource;
use crate::rules::RulesConfig;

use super::rng::GenRng;

new_key_type! {
    pub struct ChunkMapId;
}

/// Chunk maps owned for the length of one generation pass.
#[derive(Debug, Default)]
pub struct ChunkLibrary {
    maps: SlotMap<ChunkMapId, Map>,
    by_role: BTreeMap<ProcgenRole, Vec<ChunkMapId>>,
    first_loaded: Option<ChunkMapId>,
}

impl ChunkLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every chunk file the rules name. Unreadable files are logged and skipped.
    pub fn load(source: &dyn MapSource, rules: &RulesConfig) -> Self {
        let mut library = Self::new();
        for name in &rules.chunks {
            match source.load_map(name) {
                Ok(map) => {
                    if library.insert(map).is_none() {
                        warn!(chunk = %name, "chunk map declares no procgen role; skipped");
                    }
                }
                Err(err) => warn!(chunk = %name, error = %err, "could not load chunk map"),
            }
        }
        debug!(chunks = library.len(), "loaded chunk library");
        library
    }

    /// Registers `map` under its declared role. Returns `None` when it has no role.
    pub fn insert(&mut self, map: Map) -> Option<ChunkMapId> {
        let role = map.procgen_role?;
        let id = self.maps.insert(map);
        self.by_role.entry(role).or_default().push(id);
        if role != ProcgenRole::Links && self.first_loaded.is_none() {
            self.first_loaded = Some(id);
        }
        Some(id)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn get(&self, id: ChunkMapId) -> Option<&Map> {
        self.maps.get(id)
    }

    pub fn candidates(&self, role: ProcgenRole) -> &[ChunkMapId] {
        self.by_role.get(&role).map(Vec::as_slice).unwrap_or_default()
    }

    /// Picks one chunk map of `role` uniformly at random.
    pub fn choose(&self, role: ProcgenRole, rng: &mut GenRng) -> Option<&Map> {
        let id = rng.choose(self.candidates(role))?;
        self.maps.get(*id)
    }

    /// Chunk map whose dimensions size the grid: the first start chunk, or
    /// else the first loaded chunk that is not a links chunk.
    pub fn reference(&self) -> Option<&Map> {
        let id = self.candidates(ProcgenRole::Start).first().copied().or(self.first_loaded)?;
        self.maps.get(id)
    }

    /// Tile size of a single chunk, `(width, height)`.
    pub fn chunk_size(&self) -> (usize, usize) {
        self.reference().map_or((0, 0), |map| (map.width, map.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map_file::MemoryMapSource;

    fn chunk(role: Option<ProcgenRole>, width: usize, height: usize) -> Map {
        Map { procgen_role: role, ..Map::with_layers(width, height, &["background"]) }
    }

    #[test]
    fn load_groups_by_role_and_skips_broken_files() {
        let mut source = MemoryMapSource::new();
        source.insert_map("normal_a.json", &chunk(Some(ProcgenRole::Normal), 8, 8)).unwrap();
        source.insert_map("normal_b.json", &chunk(Some(ProcgenRole::Normal), 8, 8)).unwrap();
        source.insert_map("end.json", &chunk(Some(ProcgenRole::End), 8, 8)).unwrap();
        source.insert_map("plain.json", &chunk(None, 8, 8)).unwrap();
        source.insert_text("broken.json", "{ not json");
        let names = [
            "normal_a.json",
            "normal_b.json",
            "end.json",
            "plain.json",
            "broken.json",
            "gone.json",
        ];
        let rules =
            RulesConfig { chunks: names.map(String::from).to_vec(), ..RulesConfig::default() };

        let library = ChunkLibrary::load(&source, &rules);

        assert_eq!(library.len(), 3);
        assert_eq!(library.candidates(ProcgenRole::Normal).len(), 2);
        assert_eq!(library.candidates(ProcgenRole::End).len(), 1);
        assert!(library.candidates(ProcgenRole::Key).is_empty());
    }

    #[test]
    fn reference_prefers_start_chunk() {
        let mut library = ChunkLibrary::new();
        library.insert(chunk(Some(ProcgenRole::Links), 3, 3));
        library.insert(chunk(Some(ProcgenRole::Normal), 6, 4));
        assert_eq!(library.chunk_size(), (6, 4));

        library.insert(chunk(Some(ProcgenRole::Start), 10, 12));
        assert_eq!(library.chunk_size(), (10, 12));
    }

    #[test]
    fn links_only_library_has_no_reference() {
        let mut library = ChunkLibrary::new();
        library.insert(chunk(Some(ProcgenRole::Links), 3, 3));
        assert!(library.reference().is_none());
        assert_eq!(library.chunk_size(), (0, 0));
    }

    #[test]
    fn choose_without_candidates_is_none() {
        let library = ChunkLibrary::new();
        assert!(library.choose(ProcgenRole::Start, &mut GenRng::from_seed(1)).is_none());
    }
}
