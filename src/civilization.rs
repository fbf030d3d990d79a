//! Aggregate civilization state: total population, tech points, and the
//! yield-adjustment multiplier applied to every tile's production.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const STARTING_TECH_LEVEL: u32 = 1;
pub const FIRST_TECH_LEVEL_COST: f64 = 1000.0;
pub const AI_WINS_AT_TECH_LEVEL: u32 = 100;

#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
pub struct Civilization {
    pub population: f64,
    pub tech_level: u32,
    pub tech_points: f64,
    pub next_tech_level_cost: f64,
}

impl Default for Civilization {
    fn default() -> Self {
        Self {
            population: 0.0,
            tech_level: STARTING_TECH_LEVEL,
            tech_points: 0.0,
            next_tech_level_cost: FIRST_TECH_LEVEL_COST,
        }
    }
}

impl Civilization {
    /// `1 + 0.1 * (tech_level - 1)`, applied to every tile's yield.
    pub fn yield_multiplier(&self) -> f64 {
        1.0 + 0.1 * (self.tech_level as f64 - 1.0)
    }

    fn tech_next_level_cost(level_delta: f64) -> f64 {
        FIRST_TECH_LEVEL_COST * level_delta.powf(1.5)
    }

    /// Recomputes population from the live city roster, accrues tech
    /// points, and rolls over tech levels. `city_populations` is a
    /// snapshot taken after every city has already run its own
    /// `cycle_turn`.
    pub fn cycle_turn(&mut self, city_populations: &[f64]) {
        self.population = city_populations.iter().sum();
        self.tech_points += self.population / 100.0;

        let mut level_delta = 1.0;
        while self.tech_points >= self.next_tech_level_cost {
            self.tech_points -= self.next_tech_level_cost;
            self.tech_level += 1;
            level_delta += 1.0;
            self.next_tech_level_cost = Self::tech_next_level_cost(level_delta);
        }

        info!(
            population = self.population,
            tech_level = self.tech_level,
            tech_points = self.tech_points,
            "civilization cycled"
        );
    }

    pub fn has_won(&self) -> bool {
        self.tech_level >= AI_WINS_AT_TECH_LEVEL
    }

    pub fn has_lost(&self) -> bool {
        self.population <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_is_sum_of_cities() {
        let mut civ = Civilization::default();
        civ.cycle_turn(&[1000.0, 2000.0, 500.0]);
        assert_eq!(civ.population, 3500.0);
    }

    #[test]
    fn tech_points_accrue_from_population() {
        let mut civ = Civilization::default();
        civ.cycle_turn(&[1000.0]);
        assert_eq!(civ.tech_points, 10.0);
    }

    #[test]
    fn tech_level_rolls_over_on_threshold() {
        let mut civ = Civilization::default();
        civ.tech_points = FIRST_TECH_LEVEL_COST - 1.0;
        civ.cycle_turn(&[100.0]);
        assert_eq!(civ.tech_level, STARTING_TECH_LEVEL + 1);
    }

    #[test]
    fn win_and_loss_thresholds() {
        let mut civ = Civilization::default();
        assert!(!civ.has_won());
        civ.tech_level = AI_WINS_AT_TECH_LEVEL;
        assert!(civ.has_won());

        civ.population = 0.0;
        assert!(civ.has_lost());
    }
}
