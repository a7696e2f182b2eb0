//! Chunk-graph region generation: carve a path graph over a grid of chunk
//! slots, then stitch pre-authored chunk maps into one composite map.

mod cache;
mod carver;
mod generator;
mod grid;
mod keys;
mod library;
mod loader;
mod rng;
mod stitch;

pub use cache::{DEFAULT_SAVE_PREFIX, GenerationCache, SaveSlot};
pub use carver::{CarveOutcome, PathCarver, PathKind};
pub use generator::{GeneratedRegion, GenerationStats, RegionGenerator, grid_size};
pub use grid::{Chunk, ChunkGrid, ChunkKind, GridPos};
pub use keys::place_keys;
pub use library::{ChunkLibrary, ChunkMapId};
pub use loader::{CampaignStatus, ProcgenLoader};
pub use rng::{GenRng, runtime_seed};
pub use stitch::{copy_map_objects, copy_tile_layer, stitch};
