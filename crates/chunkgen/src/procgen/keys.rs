//! Key placement: one key per door level, on a `Normal` cell of that level.

use tracing::warn;

use super::grid::{ChunkGrid, ChunkKind, GridPos};
use super::rng::GenRng;

/// Converts one `Normal` cell per door level in `0..door_count` into a key.
/// Returns how many keys were placed.
pub fn place_keys(grid: &mut ChunkGrid, doors_max: u32, door_count: u32, rng: &mut GenRng) -> u32 {
    let mut buckets: Vec<Vec<GridPos>> = vec![Vec::new(); doors_max as usize];
    for (pos, chunk) in grid.iter() {
        if chunk.kind != ChunkKind::Normal {
            continue;
        }
        if let Some(bucket) = buckets.get_mut(chunk.door_level as usize) {
            bucket.push(pos);
        }
    }

    let mut keys = 0;
    for level in 0..door_count.min(doors_max) {
        let bucket = &mut buckets[level as usize];
        if bucket.is_empty() {
            warn!(level, "no normal chunk available for key");
            continue;
        }
        let pos = bucket.swap_remove(rng.below(bucket.len()));
        if let Some(chunk) = grid.get_mut(pos) {
            chunk.kind = ChunkKind::Key;
            keys += 1;
        }
    }
    keys
}
