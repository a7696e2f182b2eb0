//! One full generation pass: size the grid, carve, place keys, stitch.

use tracing::{info, warn};

use crate::map::Map;
use crate::rules::RulesConfig;
use crate::types::Rect;

use super::carver::{CarveOutcome, PathCarver, PathKind};
use super::grid::{ChunkGrid, ChunkKind};
use super::keys::place_keys;
use super::library::ChunkLibrary;
use super::rng::GenRng;
use super::stitch::stitch;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub rows: usize,
    pub cols: usize,
    pub main_attempts: u32,
    pub main_length: usize,
    pub main_path_accepted: bool,
    pub doors: u32,
    pub keys: u32,
    pub branches: usize,
}

#[derive(Clone, Debug)]
pub struct GeneratedRegion {
    pub map: Map,
    pub grid: ChunkGrid,
    pub stats: GenerationStats,
}

/// Grid dimensions `(rows, cols)` that fit `area` with chunks of `chunk_size`.
pub fn grid_size(area: Rect, chunk_size: (usize, usize)) -> (usize, usize) {
    let (chunk_width, chunk_height) = chunk_size;
    if chunk_width == 0 || chunk_height == 0 {
        return (0, 0);
    }
    let rows = area.h.max(0) as usize / chunk_height;
    let cols = area.w.max(0) as usize / chunk_width;
    if rows == 0 || cols == 0 { (0, 0) } else { (rows, cols) }
}

pub struct RegionGenerator<'a> {
    library: &'a ChunkLibrary,
    rules: &'a RulesConfig,
}

impl<'a> RegionGenerator<'a> {
    pub fn new(library: &'a ChunkLibrary, rules: &'a RulesConfig) -> Self {
        Self { library, rules }
    }

    /// Generates a composite map filling `area` as far as whole chunks fit.
    pub fn generate(&self, area: Rect, rng: &mut GenRng) -> GeneratedRegion {
        let chunk_size = self.library.chunk_size();
        let (rows, cols) = grid_size(area, chunk_size);
        if rows == 0 || cols == 0 {
            warn!(
                area_width = area.w,
                area_height = area.h,
                chunk_width = chunk_size.0,
                chunk_height = chunk_size.1,
                "procgen region is empty"
            );
        }

        let limits = self.rules.resolve(rows, cols);
        let mut carver = PathCarver::new(ChunkGrid::new(rows, cols), limits);
        let mut stats = GenerationStats { rows, cols, ..GenerationStats::default() };

        let mut main = CarveOutcome::default();
        for attempt in 1..=limits.main_attempts_max {
            main = carver.carve_path(PathKind::Main, rows * cols, rng);
            stats.main_attempts = attempt;
            if limits.accepts_main_path(main.length, main.doors) {
                stats.main_path_accepted = true;
                break;
            }
        }
        if !stats.main_path_accepted && !carver.grid().is_empty() {
            warn!(
                attempts = stats.main_attempts,
                length = main.length,
                doors = main.doors,
                length_min = limits.main_length_min,
                length_max = limits.main_length_max,
                "main path retries exhausted; keeping last path"
            );
        }
        stats.main_length = main.length;
        stats.doors = main.doors;

        for root in carver.take_branch_roots() {
            if carver.grid().kind(root) != ChunkKind::Normal {
                continue;
            }
            let length = rng.range_inclusive(limits.branch_length_min, limits.branch_length_max);
            carver.carve_path(PathKind::Branch { root }, length, rng);
            stats.branches += 1;
        }

        stats.keys = place_keys(carver.grid_mut(), limits.doors_max, main.doors, rng);

        let grid = carver.into_grid();
        let map = stitch(&grid, self.library, rng);

        info!(
            rows,
            cols,
            length = stats.main_length,
            doors = stats.doors,
            keys = stats.keys,
            branches = stats.branches,
            "generated procgen region"
        );
        GeneratedRegion { map, grid, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scenario_library;

    #[test]
    fn grid_size_divides_area_by_chunk() {
        assert_eq!(grid_size(Rect::new(0, 0, 30, 20), (10, 10)), (2, 3));
        assert_eq!(grid_size(Rect::new(0, 0, 35, 29), (10, 10)), (2, 3));
    }

    #[test]
    fn zero_chunk_or_tiny_area_gives_empty_grid() {
        assert_eq!(grid_size(Rect::new(0, 0, 30, 30), (0, 10)), (0, 0));
        assert_eq!(grid_size(Rect::new(0, 0, 5, 30), (10, 10)), (0, 0));
        assert_eq!(grid_size(Rect::new(0, 0, -10, 30), (10, 10)), (0, 0));
    }

    #[test]
    fn empty_library_generates_empty_map() {
        let library = ChunkLibrary::new();
        let rules = RulesConfig::default();
        let region = RegionGenerator::new(&library, &rules)
            .generate(Rect::new(0, 0, 30, 30), &mut GenRng::from_seed(1));

        assert_eq!((region.map.width, region.map.height), (0, 0));
        assert!(region.grid.is_empty());
        assert_eq!(region.stats.main_length, 0);
    }

    #[test]
    fn stats_match_carved_grid() {
        let (library, rules) = scenario_library();
        let region = RegionGenerator::new(&library, &rules)
            .generate(Rect::new(0, 0, 30, 30), &mut GenRng::from_seed(21));

        assert_eq!((region.stats.rows, region.stats.cols), (3, 3));
        let doors = region.grid.iter().filter(|(_, chunk)| chunk.kind.is_door()).count();
        assert_eq!(doors as u32, region.stats.doors);
        assert_eq!(region.grid.count(ChunkKind::Key) as u32, region.stats.keys);
        assert!(region.stats.main_attempts >= 1);
    }

    #[test]
    fn same_seed_generates_same_region() {
        let (library, rules) = scenario_library();
        let generator = RegionGenerator::new(&library, &rules);
        let area = Rect::new(0, 0, 30, 30);

        let first = generator.generate(area, &mut GenRng::from_seed(99));
        let second = generator.generate(area, &mut GenRng::from_seed(99));

        assert_eq!(first.map, second.map);
        assert_eq!(first.grid, second.grid);
    }
}
