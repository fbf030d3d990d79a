//! Four-season cyclic clock plus a year counter.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    pub fn index(self) -> usize {
        match self {
            Season::Winter => 0,
            Season::Spring => 1,
            Season::Summer => 2,
            Season::Fall => 3,
        }
    }

    pub fn next(self) -> Season {
        match self {
            Season::Winter => Season::Spring,
            Season::Spring => Season::Summer,
            Season::Summer => Season::Fall,
            Season::Fall => Season::Winter,
        }
    }
}

#[derive(Debug, Clone, Copy, Resource, Serialize, Deserialize)]
pub struct Time {
    pub season: Season,
    pub year: u32,
}

impl Default for Time {
    fn default() -> Self {
        Self { season: Season::Winter, year: 1 }
    }
}

impl Time {
    /// Advances one season, rolling the year over on Fall -> Winter.
    pub fn next(&mut self) {
        let wrapped = matches!(self.season, Season::Fall);
        self.season = self.season.next();
        if wrapped {
            self.year += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_cycles_and_year_increments_on_wrap() {
        let mut t = Time::default();
        assert_eq!(t.season, Season::Winter);
        t.next();
        assert_eq!(t.season, Season::Spring);
        assert_eq!(t.year, 1);
        t.next();
        t.next();
        t.next();
        assert_eq!(t.season, Season::Winter);
        assert_eq!(t.year, 2);
    }
}
