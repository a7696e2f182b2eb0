//! Compositing chosen chunk maps into one destination map.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::map::{Map, ProcgenRole};
use crate::types::{Pos, Rect};

use super::grid::{ChunkGrid, ChunkKind};
use super::library::ChunkLibrary;
use super::rng::GenRng;

/// Copies the tiles of `source` layer `source_layer` inside `area` into
/// `dest` layer `dest_layer`, so that source `(x, y)` lands on
/// `(x + offset.x, y + offset.y)`. Both sides are clipped to their bounds.
pub fn copy_tile_layer(
    dest: &mut Map,
    dest_layer: usize,
    source: &Map,
    source_layer: usize,
    area: Rect,
    offset: Pos,
) {
    let x_start = area.x.max(0);
    let y_start = area.y.max(0);
    let x_end = area.right().min(source.width as i32);
    let y_end = area.bottom().min(source.height as i32);

    for y in y_start..y_end {
        let dest_y = y.saturating_add(offset.y);
        if dest_y < 0 {
            continue;
        }
        for x in x_start..x_end {
            let dest_x = x.saturating_add(offset.x);
            if dest_x < 0 {
                continue;
            }
            if let Some(value) = source.tile(source_layer, x as usize, y as usize) {
                dest.set_tile(dest_layer, dest_x as usize, dest_y as usize, value);
            }
        }
    }
}

/// Appends the events, enemy groups and NPCs of `source` positioned inside
/// `area`, translated by `offset`. Procgen metadata events are left out, as is
/// anything requiring a door level other than `door_level`.
pub fn copy_map_objects(dest: &mut Map, source: &Map, area: Rect, offset: Pos, door_level: u32) {
    let level_matches = |required: Option<u32>| required.is_none_or(|level| level == door_level);

    for event in &source.events {
        if event.is_procgen_metadata()
            || !area.contains(event.location.origin())
            || !level_matches(event.requires_door_level)
        {
            continue;
        }
        let mut event = event.clone();
        event.translate(offset);
        dest.events.push(event);
    }

    for group in &source.enemy_groups {
        if !area.contains(group.location.origin()) || !level_matches(group.requires_door_level) {
            continue;
        }
        let mut group = group.clone();
        group.translate(offset);
        dest.enemy_groups.push(group);
    }

    for npc in &source.npcs {
        if !area.contains(npc.pos) || !level_matches(npc.requires_door_level) {
            continue;
        }
        let mut npc = npc.clone();
        npc.translate(offset);
        dest.npcs.push(npc);
    }
}

fn copy_area(dest: &mut Map, source: &Map, area: Rect, offset: Pos, door_level: u32) {
    for layer_index in 0..source.layers.len().min(dest.layers.len()) {
        copy_tile_layer(dest, layer_index, source, layer_index, area, offset);
    }
    copy_map_objects(dest, source, area, offset, door_level);
}

/// Builds the composite map for a carved grid.
///
/// The result is `cols * chunk_width` by `rows * chunk_height` tiles and takes
/// its layer names from the library's reference chunk.
pub fn stitch(grid: &ChunkGrid, library: &ChunkLibrary, rng: &mut GenRng) -> Map {
    let (chunk_width, chunk_height) = library.chunk_size();
    let layer_names = library.reference().map(Map::layer_names).unwrap_or_default();
    let mut dest =
        Map::with_layers(grid.cols() * chunk_width, grid.rows() * chunk_height, &layer_names);

    let mut missing_roles = BTreeSet::new();
    let mut missing_links = BTreeSet::new();

    for (pos, cell) in grid.iter() {
        let Some(role) = cell.kind.role() else {
            continue;
        };
        let Some(chunk) = library.choose(role, rng) else {
            if missing_roles.insert(role) {
                warn!(?role, "no chunk map registered for role; cells left blank");
            }
            continue;
        };
        let links = library.choose(ProcgenRole::Links, rng);

        let offset = Pos::new((pos.col * chunk_width) as i32, (pos.row * chunk_height) as i32);

        if cell.kind == ChunkKind::Start {
            match chunk.hero_pos {
                Some(hero_pos) => dest.hero_pos = Some(hero_pos.offset_by(offset)),
                None => {
                    warn!(row = pos.row, col = pos.col, "start chunk declares no hero position")
                }
            }
        }

        let whole = Rect::new(0, 0, chunk.width as i32, chunk.height as i32);
        copy_area(&mut dest, chunk, whole, offset, cell.door_level);

        if cell.link_count() == 0 {
            continue;
        }
        let Some(links) = links else {
            if missing_links.insert(None) {
                warn!("no links chunk registered; connectors left unstitched");
            }
            continue;
        };
        let rects = links.link_rects();
        for direction in cell.linked_directions() {
            let rect = rects[direction.index()];
            if rect.is_empty() {
                if missing_links.insert(Some(direction)) {
                    warn!(?direction, "links chunk declares no connector rectangle");
                }
                continue;
            }
            copy_area(&mut dest, links, rect, offset, cell.door_level);
        }
    }

    debug!(
        width = dest.width,
        height = dest.height,
        events = dest.events.len(),
        enemy_groups = dest.enemy_groups.len(),
        npcs = dest.npcs.len(),
        "stitched composite map"
    );
    dest
}
