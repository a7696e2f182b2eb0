use serde::{Deserialize, Serialize};

/// Tile-space coordinate on a map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset_by(self, offset: Pos) -> Self {
        Self { x: self.x.saturating_add(offset.x), y: self.y.saturating_add(offset.y) }
    }
}

/// Tile-space rectangle. A rectangle with a zero side is treated as unset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn is_empty(self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn origin(self) -> Pos {
        Pos { x: self.x, y: self.y }
    }

    pub fn contains(self, pos: Pos) -> bool {
        pos.x >= self.x && pos.y >= self.y && pos.x < self.right() && pos.y < self.bottom()
    }

    /// Exclusive right edge, saturating at the `i32` bounds.
    pub fn right(self) -> i32 {
        self.x.saturating_add(self.w)
    }

    /// Exclusive bottom edge, saturating at the `i32` bounds.
    pub fn bottom(self) -> i32 {
        self.y.saturating_add(self.h)
    }

    pub fn offset_by(self, offset: Pos) -> Self {
        let origin = self.origin().offset_by(offset);
        Self { x: origin.x, y: origin.y, ..self }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    West,
    East,
}

impl Direction {
    pub const ALL: [Direction; 4] =
        [Direction::North, Direction::South, Direction::West, Direction::East];

    pub fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::South => 1,
            Self::West => 2,
            Self::East => 3,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::East => Self::West,
        }
    }

    /// Grid delta as `(row, col)`.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Self::North => (-1, 0),
            Self::South => (1, 0),
            Self::West => (0, -1),
            Self::East => (0, 1),
        }
    }
}
