//! Chunk grid: a fixed `rows x cols` arena of cells linked by grid coordinates.

use serde::{Deserialize, Serialize};

use crate::map::ProcgenRole;
use crate::types::Direction;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    #[default]
    Empty,
    Links,
    Normal,
    Start,
    End,
    Key,
    DoorNorthSouth,
    DoorWestEast,
    Branch,
}

impl ChunkKind {
    /// Chunk-map role a cell of this kind is stitched from.
    pub fn role(self) -> Option<ProcgenRole> {
        match self {
            Self::Empty => None,
            Self::Links => Some(ProcgenRole::Links),
            Self::Normal | Self::Branch => Some(ProcgenRole::Normal),
            Self::Start => Some(ProcgenRole::Start),
            Self::End => Some(ProcgenRole::End),
            Self::Key => Some(ProcgenRole::Key),
            Self::DoorNorthSouth => Some(ProcgenRole::DoorNorthSouth),
            Self::DoorWestEast => Some(ProcgenRole::DoorWestEast),
        }
    }

    pub fn is_door(self) -> bool {
        matches!(self, Self::DoorNorthSouth | Self::DoorWestEast)
    }

    /// Cells no path may step into.
    pub fn is_fixed(self) -> bool {
        matches!(self, Self::Start | Self::End) || self.is_door()
    }

    /// Door subtype for a corridor running along `direction`.
    pub fn door_for(direction: Direction) -> Self {
        match direction {
            Direction::North | Direction::South => Self::DoorNorthSouth,
            Direction::West | Direction::East => Self::DoorWestEast,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub kind: ChunkKind,
    pub door_level: u32,
    /// Neighbor cells indexed by [`Direction::index`].
    pub links: [Option<GridPos>; 4],
}

impl Chunk {
    pub fn link_count(&self) -> usize {
        self.links.iter().filter(|link| link.is_some()).count()
    }

    pub fn has_link(&self, direction: Direction) -> bool {
        self.links[direction.index()].is_some()
    }

    pub fn linked_directions(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|direction| self.has_link(*direction))
    }

    /// True when the links match the door subtype: exactly the two opposite sides.
    pub fn is_straight_for(&self, kind: ChunkKind) -> bool {
        let axis = match kind {
            ChunkKind::DoorNorthSouth => [Direction::North, Direction::South],
            ChunkKind::DoorWestEast => [Direction::West, Direction::East],
            _ => return false,
        };
        self.link_count() == 2 && axis.iter().all(|direction| self.has_link(*direction))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Chunk>,
}

impl ChunkGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols, cells: vec![Chunk::default(); rows * cols] }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns every cell to `Empty` with no links and level 0.
    pub fn reset(&mut self) {
        self.cells.fill(Chunk::default());
    }

    pub fn pos_at(&self, index: usize) -> GridPos {
        GridPos { row: index / self.cols.max(1), col: index % self.cols.max(1) }
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        (pos.row < self.rows && pos.col < self.cols).then_some(pos.row * self.cols + pos.col)
    }

    pub fn get(&self, pos: GridPos) -> Option<&Chunk> {
        self.index(pos).map(|index| &self.cells[index])
    }

    pub fn get_mut(&mut self, pos: GridPos) -> Option<&mut Chunk> {
        self.index(pos).map(|index| &mut self.cells[index])
    }

    pub fn kind(&self, pos: GridPos) -> ChunkKind {
        self.get(pos).map_or(ChunkKind::Empty, |chunk| chunk.kind)
    }

    pub fn neighbor(&self, pos: GridPos, direction: Direction) -> Option<GridPos> {
        let (dr, dc) = direction.delta();
        let row = pos.row.checked_add_signed(dr)?;
        let col = pos.col.checked_add_signed(dc)?;
        (row < self.rows && col < self.cols).then_some(GridPos { row, col })
    }

    /// Links `from` to its neighbor in `direction` on both sides.
    pub(super) fn link(&mut self, from: GridPos, direction: Direction, to: GridPos) {
        if let Some(chunk) = self.get_mut(from) {
            chunk.links[direction.index()] = Some(to);
        }
        if let Some(chunk) = self.get_mut(to) {
            chunk.links[direction.opposite().index()] = Some(from);
        }
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridPos, &Chunk)> + '_ {
        self.cells.iter().enumerate().map(|(index, chunk)| (self.pos_at(index), chunk))
    }

    pub fn count(&self, kind: ChunkKind) -> usize {
        self.cells.iter().filter(|chunk| chunk.kind == kind).count()
    }

    pub fn find(&self, kind: ChunkKind) -> Option<GridPos> {
        self.iter().find_map(|(pos, chunk)| (chunk.kind == kind).then_some(pos))
    }
}
