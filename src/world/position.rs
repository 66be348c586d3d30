use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::core::CHUNK_SIZE;

/// Integer 2D coordinate, used both for world blocks and for chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub const ORIGIN: Location = Location { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Neighboring location one step in `direction`
    pub fn relative(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x + dx, self.y + dy)
    }

    /// Squared euclidean distance
    pub fn distance_squared_to(&self, other: Location) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    pub fn distance_to(&self, other: Location) -> f64 {
        (self.distance_squared_to(other) as f64).sqrt()
    }

    /// Chunk that contains this world block location
    pub fn to_chunk(&self) -> Location {
        Location::new(world_to_chunk(self.x), world_to_chunk(self.y))
    }

    /// Offset of this world block location inside its chunk
    pub fn to_local(&self) -> (i32, i32) {
        (chunk_offset(self.x), chunk_offset(self.y))
    }

    /// World location of the lower left block of this chunk location
    pub fn chunk_origin(&self) -> Location {
        Location::new(self.x * CHUNK_SIZE, self.y * CHUNK_SIZE)
    }
}

impl From<(i32, i32)> for Location {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The eight compass directions. North is positive y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub const CARDINAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::NorthEast => (1, 1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, -1),
            Direction::South => (0, -1),
            Direction::SouthWest => (-1, -1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, 1),
        }
    }

    pub fn is_cardinal(&self) -> bool {
        matches!(
            self,
            Direction::North | Direction::East | Direction::South | Direction::West
        )
    }
}

/// Chunk coordinate containing the given world coordinate
pub fn world_to_chunk(world: i32) -> i32 {
    world.div_euclid(CHUNK_SIZE)
}

/// Local offset of the given world coordinate within its chunk
pub fn chunk_offset(world: i32) -> i32 {
    world.rem_euclid(CHUNK_SIZE)
}

pub fn chunk_to_world(chunk: i32, local: i32) -> i32 {
    chunk * CHUNK_SIZE + local
}

pub fn is_inside_chunk(local_x: i32, local_y: i32) -> bool {
    (0..CHUNK_SIZE).contains(&local_x) && (0..CHUNK_SIZE).contains(&local_y)
}
