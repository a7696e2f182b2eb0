pub mod map;
pub mod map_file;
pub mod procgen;
pub mod rules;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod types;

pub use map::{Map, ProcgenRole, ProcgenTrigger};
pub use map_file::{DirMapSource, MapFileError, MapSource, MemoryMapSource, map_fingerprint};
pub use procgen::{
    CampaignStatus, ChunkGrid, ChunkKind, ChunkLibrary, GenRng, GeneratedRegion, GenerationCache,
    ProcgenLoader, RegionGenerator, SaveSlot,
};
pub use rules::{PathLimits, RulesConfig, RulesError};
pub use types::*;
