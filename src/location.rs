//! Grid coordinates and 16-point compass directions.

use serde::{Deserialize, Serialize};

use crate::error::UserError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub row: i32,
    pub col: i32,
}

impl Location {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Parses a `"row,col"` string, raising a user error on malformed input.
    pub fn parse(s: &str) -> Result<Self, UserError> {
        let (row_str, col_str) = s
            .split_once(',')
            .ok_or_else(|| UserError::BadLocationString(s.to_string()))?;
        let row = row_str
            .trim()
            .parse::<i32>()
            .map_err(|_| UserError::BadLocationString(s.to_string()))?;
        let col = col_str
            .trim()
            .parse::<i32>()
            .map_err(|_| UserError::BadLocationString(s.to_string()))?;
        Ok(Location { row, col })
    }

    /// Chebyshev distance, used for settler placement and city crowding.
    pub fn chebyshev_distance(self, other: Location) -> i32 {
        (self.row - other.row).abs().max((self.col - other.col).abs())
    }

    /// The eight neighboring locations (not bounds-checked).
    pub fn neighbors(self) -> [Location; 8] {
        [
            Location::new(self.row - 1, self.col - 1),
            Location::new(self.row - 1, self.col),
            Location::new(self.row - 1, self.col + 1),
            Location::new(self.row, self.col - 1),
            Location::new(self.row, self.col + 1),
            Location::new(self.row + 1, self.col - 1),
            Location::new(self.row + 1, self.col),
            Location::new(self.row + 1, self.col + 1),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    N,
    Nne,
    Ne,
    Ene,
    E,
    Ese,
    Se,
    Sse,
    S,
    Ssw,
    Sw,
    Wsw,
    W,
    Wnw,
    Nw,
    Nnw,
}

impl Direction {
    pub const ALL: [Direction; 16] = [
        Direction::N,
        Direction::Nne,
        Direction::Ne,
        Direction::Ene,
        Direction::E,
        Direction::Ese,
        Direction::Se,
        Direction::Sse,
        Direction::S,
        Direction::Ssw,
        Direction::Sw,
        Direction::Wsw,
        Direction::W,
        Direction::Wnw,
        Direction::Nw,
        Direction::Nnw,
    ];
}

/// Immutable wind vector. Wind-plus-Wind vector addition is intentionally
/// left unimplemented; only scalar speed adjustment is needed anywhere
/// this is used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub direction: Direction,
}

impl Wind {
    pub fn new(speed: f64, direction: Direction) -> Self {
        Self { speed, direction }
    }

    /// Adds a scalar to the wind's speed; direction is unchanged.
    pub fn add_speed(self, delta: f64) -> Self {
        Wind { speed: self.speed + delta, direction: self.direction }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_location() {
        assert_eq!(Location::parse("4,2").unwrap(), Location::new(4, 2));
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(Location::parse("nope").is_err());
        assert!(Location::parse("4").is_err());
    }

    #[test]
    fn chebyshev_distance_is_max_of_deltas() {
        assert_eq!(Location::new(0, 0).chebyshev_distance(Location::new(3, 1)), 3);
        assert_eq!(Location::new(0, 0).chebyshev_distance(Location::new(1, 5)), 5);
    }

    #[test]
    fn wind_add_speed_preserves_direction() {
        let w = Wind::new(10.0, Direction::Ne).add_speed(5.0);
        assert_eq!(w.speed, 15.0);
        assert_eq!(w.direction, Direction::Ne);
    }
}
