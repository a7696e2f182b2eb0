//! Random-walk path carving over a [`ChunkGrid`].
//!
//! The main path erases the grid, starts on a random cell and ends on an `End`
//! cell, placing doors on straight runs and recording branch roots as it goes.
//! Branch paths start from a recorded root and may merge back into existing
//! cells that share their door level.

use std::mem;

use tracing::debug;

use crate::rules::PathLimits;
use crate::types::Direction;

use super::grid::{ChunkGrid, ChunkKind, GridPos};
use super::rng::GenRng;

const CHANCE_STEP: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathKind {
    Main,
    Branch { root: GridPos },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CarveOutcome {
    /// Number of cells on the path, its first cell included.
    pub length: usize,
    pub doors: u32,
    /// Cells in the order they were entered.
    pub cells: Vec<GridPos>,
}

/// Per-run counters of the main walk.
#[derive(Debug, Default)]
struct MainWalk {
    doors: u32,
    door_chance: u32,
    steps_since_door: u32,
    branch_chance: u32,
    branches_this_level: u32,
}

impl MainWalk {
    fn advance(&mut self, door_spacing_min: u32) {
        self.steps_since_door += 1;
        if self.doors == 0 && self.steps_since_door > door_spacing_min * 2 {
            self.door_chance = 100;
        } else if self.steps_since_door > door_spacing_min {
            self.door_chance = (self.door_chance + CHANCE_STEP).min(100);
        }
        self.branch_chance = (self.branch_chance + CHANCE_STEP).min(100);
    }

    fn door_placed(&mut self) {
        self.doors += 1;
        self.door_chance = 0;
        self.steps_since_door = 0;
        self.branch_chance = 0;
        self.branches_this_level = 0;
    }
}

pub struct PathCarver {
    grid: ChunkGrid,
    limits: PathLimits,
    branch_roots: Vec<GridPos>,
}

impl PathCarver {
    pub fn new(grid: ChunkGrid, limits: PathLimits) -> Self {
        Self { grid, limits, branch_roots: Vec::new() }
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut ChunkGrid {
        &mut self.grid
    }

    pub fn into_grid(self) -> ChunkGrid {
        self.grid
    }

    pub fn limits(&self) -> &PathLimits {
        &self.limits
    }

    pub fn branch_roots(&self) -> &[GridPos] {
        &self.branch_roots
    }

    pub fn take_branch_roots(&mut self) -> Vec<GridPos> {
        mem::take(&mut self.branch_roots)
    }

    /// Carves one path of `kind`, trying `steps` single moves.
    ///
    /// A main path resets the grid and its branch roots first. A branch path
    /// whose root is outside the grid carves nothing.
    pub fn carve_path(&mut self, kind: PathKind, steps: usize, rng: &mut GenRng) -> CarveOutcome {
        match kind {
            PathKind::Main => self.carve_main(steps, rng),
            PathKind::Branch { root } => self.carve_branch(root, steps, rng),
        }
    }

    fn carve_main(&mut self, steps: usize, rng: &mut GenRng) -> CarveOutcome {
        self.grid.reset();
        self.branch_roots.clear();
        if self.grid.is_empty() {
            return CarveOutcome::default();
        }

        let start = self.grid.pos_at(rng.below(self.grid.len()));
        if let Some(chunk) = self.grid.get_mut(start) {
            chunk.kind = ChunkKind::Start;
        }

        let mut walk = MainWalk::default();
        let mut current = start;
        let mut cells = vec![start];

        for _ in 0..steps {
            walk.advance(self.limits.door_spacing_min);

            let door_direction =
                self.door_direction(current, &walk).filter(|_| rng.percent(walk.door_chance));
            let direction = door_direction.unwrap_or_else(|| rng.direction());

            let Some(next) = self.walk_single(PathKind::Main, current, direction, rng) else {
                continue;
            };

            if let Some(direction) = door_direction {
                self.convert_to_door(current, next, direction);
                walk.door_placed();
            }

            current = next;
            cells.push(next);

            if self.grid.kind(next) == ChunkKind::Normal
                && walk.branches_this_level < self.limits.branches_per_door_level_max
                && rng.percent(walk.branch_chance)
            {
                self.branch_roots.push(next);
                walk.branch_chance = 0;
                walk.branches_this_level += 1;
            }
        }

        if current != start
            && let Some(chunk) = self.grid.get_mut(current)
        {
            chunk.kind = ChunkKind::End;
        }

        debug!(
            length = cells.len(),
            doors = walk.doors,
            branch_roots = self.branch_roots.len(),
            "carved main path"
        );
        CarveOutcome { length: cells.len(), doors: walk.doors, cells }
    }

    fn carve_branch(&mut self, root: GridPos, steps: usize, rng: &mut GenRng) -> CarveOutcome {
        if self.grid.get(root).is_none() {
            return CarveOutcome::default();
        }

        let mut current = root;
        let mut cells = vec![root];
        for _ in 0..steps {
            let direction = rng.direction();
            let stepped = self.walk_single(PathKind::Branch { root }, current, direction, rng);
            if let Some(next) = stepped {
                current = next;
                cells.push(next);
            }
        }

        CarveOutcome { length: cells.len(), doors: 0, cells }
    }

    /// Straight-through direction when `current` may become a door.
    fn door_direction(&self, current: GridPos, walk: &MainWalk) -> Option<Direction> {
        if walk.doors >= self.limits.doors_max {
            return None;
        }
        let chunk = self.grid.get(current)?;
        if chunk.kind != ChunkKind::Normal || chunk.link_count() != 1 {
            return None;
        }
        let incoming = chunk.linked_directions().next()?;
        Some(incoming.opposite())
    }

    fn convert_to_door(&mut self, door: GridPos, next: GridPos, direction: Direction) {
        let kind = ChunkKind::door_for(direction);
        if let Some(chunk) = self.grid.get_mut(door) {
            debug_assert!(chunk.is_straight_for(kind));
            chunk.kind = kind;
            chunk.door_level += 1;
        }
        if let Some(chunk) = self.grid.get_mut(next) {
            chunk.door_level += 1;
        }
    }

    /// Tries one step from `from` towards `direction`, linking both cells on
    /// success. Returns the cell stepped into.
    pub fn walk_single(
        &mut self,
        kind: PathKind,
        from: GridPos,
        direction: Direction,
        rng: &mut GenRng,
    ) -> Option<GridPos> {
        let to = self.grid.neighbor(from, direction)?;
        let source_level = self.grid.get(from)?.door_level;
        let target = self.grid.get(to)?;

        if target.kind.is_fixed() {
            return None;
        }
        if kind == PathKind::Main && target.kind != ChunkKind::Empty {
            return None;
        }

        let link_count = target.link_count();
        if link_count > 0 && (target.door_level != source_level || !rng.one_in(link_count)) {
            return None;
        }

        if let Some(chunk) = self.grid.get_mut(to)
            && chunk.kind == ChunkKind::Empty
        {
            chunk.kind = ChunkKind::Normal;
            chunk.door_level = source_level;
        }
        self.grid.link(from, direction, to);
        Some(to)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::{BTreeSet, VecDeque};

    use proptest::prelude::*;

    use super::*;
    use crate::rules::RulesConfig;

    pub(crate) fn limits(rows: usize, cols: usize, doors_max: u32) -> PathLimits {
        RulesConfig { doors_max, ..RulesConfig::default() }.resolve(rows, cols)
    }

    fn reachable(grid: &ChunkGrid, from: GridPos) -> BTreeSet<GridPos> {
        let mut seen = BTreeSet::from([from]);
        let mut queue = VecDeque::from([from]);
        while let Some(pos) = queue.pop_front() {
            let Some(chunk) = grid.get(pos) else { continue };
            for next in chunk.links.iter().flatten() {
                if seen.insert(*next) {
                    queue.push_back(*next);
                }
            }
        }
        seen
    }

    #[test]
    fn main_step_never_enters_visited_cell() {
        let mut carver = PathCarver::new(ChunkGrid::new(1, 3), limits(1, 3, 0));
        let mut rng = GenRng::from_seed(1);
        let a = GridPos::new(0, 0);
        let b = GridPos::new(0, 1);
        carver.grid_mut().get_mut(a).unwrap().kind = ChunkKind::Normal;
        carver.grid_mut().get_mut(b).unwrap().kind = ChunkKind::Normal;

        assert_eq!(carver.walk_single(PathKind::Main, a, Direction::East, &mut rng), None);
        assert_eq!(carver.walk_single(PathKind::Main, a, Direction::West, &mut rng), None);
        assert_eq!(
            carver.walk_single(PathKind::Main, b, Direction::East, &mut rng),
            Some(GridPos::new(0, 2))
        );
        assert_eq!(carver.grid().kind(GridPos::new(0, 2)), ChunkKind::Normal);
    }

    #[test]
    fn branch_step_rejects_linked_cell_on_another_door_level() {
        let mut carver = PathCarver::new(ChunkGrid::new(1, 3), limits(1, 3, 0));
        let mut rng = GenRng::from_seed(9);
        let left = GridPos::new(0, 0);
        let middle = GridPos::new(0, 1);
        let right = GridPos::new(0, 2);
        for pos in [left, middle, right] {
            carver.grid_mut().get_mut(pos).unwrap().kind = ChunkKind::Normal;
        }
        carver.grid_mut().link(middle, Direction::East, right);
        carver.grid_mut().get_mut(right).unwrap().door_level = 1;
        carver.grid_mut().get_mut(middle).unwrap().door_level = 1;

        let branch = PathKind::Branch { root: left };
        let stepped = carver.walk_single(branch, left, Direction::East, &mut rng);
        assert_eq!(stepped, None);
        assert!(!carver.grid().get(left).unwrap().has_link(Direction::East));
    }

    #[test]
    fn branch_step_merges_into_single_linked_cell_on_same_level() {
        let mut carver = PathCarver::new(ChunkGrid::new(1, 3), limits(1, 3, 0));
        let mut rng = GenRng::from_seed(4);
        let left = GridPos::new(0, 0);
        let middle = GridPos::new(0, 1);
        let right = GridPos::new(0, 2);
        for pos in [left, middle, right] {
            carver.grid_mut().get_mut(pos).unwrap().kind = ChunkKind::Normal;
        }
        carver.grid_mut().link(middle, Direction::East, right);

        let stepped =
            carver.walk_single(PathKind::Branch { root: left }, left, Direction::East, &mut rng);
        assert_eq!(stepped, Some(middle));
        assert_eq!(carver.grid().get(middle).unwrap().link_count(), 2);
    }

    #[test]
    fn no_step_enters_start_end_or_door() {
        let mut carver = PathCarver::new(ChunkGrid::new(1, 2), limits(1, 2, 0));
        let mut rng = GenRng::from_seed(2);
        let from = GridPos::new(0, 0);
        let to = GridPos::new(0, 1);
        carver.grid_mut().get_mut(from).unwrap().kind = ChunkKind::Normal;
        let fixed =
            [ChunkKind::Start, ChunkKind::End, ChunkKind::DoorNorthSouth, ChunkKind::DoorWestEast];
        for kind in fixed {
            carver.grid_mut().get_mut(to).unwrap().kind = kind;
            let branch = PathKind::Branch { root: from };
            assert_eq!(carver.walk_single(branch, from, Direction::East, &mut rng), None);
        }
    }

    #[test]
    fn empty_grid_carves_nothing() {
        let mut carver = PathCarver::new(ChunkGrid::new(0, 0), limits(0, 0, 1));
        let outcome = carver.carve_path(PathKind::Main, 0, &mut GenRng::from_seed(5));
        assert_eq!(outcome, CarveOutcome::default());
    }

    #[test]
    fn main_path_reset_clears_previous_carve() {
        let mut carver = PathCarver::new(ChunkGrid::new(4, 4), limits(4, 4, 2));
        let mut rng = GenRng::from_seed(11);
        carver.carve_path(PathKind::Main, 16, &mut rng);
        let second = carver.carve_path(PathKind::Main, 16, &mut rng);

        let occupied =
            carver.grid().iter().filter(|(_, chunk)| chunk.kind != ChunkKind::Empty).count();
        assert_eq!(occupied, second.length);
        assert_eq!(carver.grid().count(ChunkKind::Start), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn main_path_invariants_hold(
            seed in any::<u64>(),
            rows in 1_usize..7,
            cols in 1_usize..7,
            doors_max in 0_u32..4,
            spacing in 0_u32..4,
        ) {
            let mut limits = limits(rows, cols, doors_max);
            limits.door_spacing_min = spacing;
            let mut carver = PathCarver::new(ChunkGrid::new(rows, cols), limits);
            let mut rng = GenRng::from_seed(seed);
            let outcome = carver.carve_path(PathKind::Main, rows * cols, &mut rng);
            let grid = carver.grid();

            prop_assert_eq!(grid.count(ChunkKind::Start), 1);
            prop_assert!(outcome.doors <= doors_max);
            let door_cells = grid.iter().filter(|(_, chunk)| chunk.kind.is_door()).count();
            prop_assert_eq!(door_cells as u32, outcome.doors);

            for (_, chunk) in grid.iter().filter(|(_, chunk)| chunk.kind.is_door()) {
                prop_assert!(chunk.is_straight_for(chunk.kind));
            }

            let start = grid.find(ChunkKind::Start).unwrap();
            prop_assert_eq!(outcome.cells.first().copied(), Some(start));
            if outcome.length > 1 {
                let end = grid.find(ChunkKind::End).unwrap();
                prop_assert_eq!(grid.count(ChunkKind::End), 1);
                prop_assert_eq!(outcome.cells.last().copied(), Some(end));
                prop_assert!(reachable(grid, start).contains(&end));
            } else {
                prop_assert_eq!(grid.count(ChunkKind::End), 0);
            }

            let mut level = 0;
            for pos in &outcome.cells {
                let chunk = grid.get(*pos).unwrap();
                if chunk.kind.is_door() {
                    prop_assert_eq!(chunk.door_level, level + 1);
                    level += 1;
                } else {
                    prop_assert_eq!(chunk.door_level, level);
                }
            }
            prop_assert_eq!(level, outcome.doors);
        }

        #[test]
        fn branches_only_link_cells_on_matching_levels(
            seed in any::<u64>(),
            rows in 2_usize..7,
            cols in 2_usize..7,
            doors_max in 0_u32..4,
            branch_length in 1_usize..8,
        ) {
            let limits = limits(rows, cols, doors_max);
            let mut carver = PathCarver::new(ChunkGrid::new(rows, cols), limits);
            let mut rng = GenRng::from_seed(seed);
            carver.carve_path(PathKind::Main, rows * cols, &mut rng);
            let main_cells: BTreeSet<_> = carver.grid().iter()
                .filter(|(_, chunk)| chunk.kind != ChunkKind::Empty)
                .map(|(pos, _)| pos)
                .collect();

            for root in carver.take_branch_roots() {
                if carver.grid().kind(root) == ChunkKind::Normal {
                    carver.carve_path(PathKind::Branch { root }, branch_length, &mut rng);
                }
            }

            let grid = carver.grid();
            prop_assert_eq!(grid.count(ChunkKind::Start), 1);
            for (pos, chunk) in grid.iter() {
                if chunk.kind.is_door() {
                    prop_assert!(chunk.is_straight_for(chunk.kind));
                    continue;
                }
                if chunk.kind == ChunkKind::Empty {
                    prop_assert_eq!(chunk.link_count(), 0);
                    continue;
                }
                if !main_cells.contains(&pos) {
                    prop_assert_eq!(chunk.kind, ChunkKind::Normal);
                }
                for direction in chunk.linked_directions() {
                    let neighbor = grid.get(chunk.links[direction.index()].unwrap()).unwrap();
                    prop_assert!(neighbor.has_link(direction.opposite()));
                    if !neighbor.kind.is_door() {
                        prop_assert_eq!(neighbor.door_level, chunk.door_level);
                    }
                }
            }
        }
    }
}
