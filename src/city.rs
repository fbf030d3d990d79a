//! City growth, worker allocation, and build-choice AI.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::location::Location;
use crate::tile::Tile;

pub const CITY_BASE_GROWTH_RATE: f64 = 0.01;
pub const MAX_GROWTH_MODIFIER: f64 = 4.0;
pub const CITY_RANK_UP_MULTIPLIER: f64 = 2.0;
pub const CITY_STARTING_POP: f64 = 1000.0;
pub const MIN_CITY_SIZE: f64 = 200.0;
pub const POP_THAT_EATS_ONE_FOOD: f64 = 1000.0;
pub const FOOD_FROM_CITY_CENTER: f64 = 1.0;
pub const PROD_FROM_CITY_CENTER: f64 = 1.0;
pub const PROD_FROM_SPECIALIST: f64 = 1.0;
pub const SETTLER_PROD_COST: f64 = 200.0;
pub const INFRA_PROD_COST_BASE: f64 = 50.0;
pub const CITY_DEF_PROD_COST: f64 = 400.0;
pub const TOO_MANY_FOOD_WORKERS_FRACTION: f64 = 0.66;
pub const PROD_BEFORE_SETTLER: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildChoice {
    UpgradeFoodTile(Location),
    UpgradeProdTile(Location),
    SpawnSettler(Location),
    InvestDefense,
    None,
}

#[derive(Debug, Clone, Component, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub population: f64,
    pub rank: u32,
    pub next_rank_pop: f64,
    pub prod_bank: f64,
    pub famine: bool,
    pub defense: f64,
    pub location: Location,
}

impl City {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            population: CITY_STARTING_POP,
            rank: 1,
            next_rank_pop: CITY_STARTING_POP * CITY_RANK_UP_MULTIPLIER,
            prod_bank: 0.0,
            famine: false,
            defense: 1.0,
            location,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.population >= MIN_CITY_SIZE
    }

    pub fn next_infra_cost(infra_level: u32) -> f64 {
        (infra_level as f64 + 1.0) * INFRA_PROD_COST_BASE
    }

    pub fn next_defense_cost(&self) -> f64 {
        self.defense * CITY_DEF_PROD_COST
    }

    /// Removes population proportional to `pct` (0-100). If survivors drop
    /// below `MIN_CITY_SIZE`, the city dies outright (caller removes it)
    /// and the full remaining population is counted as killed, with an
    /// exp bonus. Returns `(people_killed, city_destroyed, exp_bonus)`.
    pub fn kill(&mut self, pct: f64) -> (f64, bool, f64) {
        let pct = pct.min(100.0);
        let killed = self.population * pct / 100.0;
        let survivors = self.population - killed;
        if survivors < MIN_CITY_SIZE {
            let total_killed = self.population;
            self.population = 0.0;
            (total_killed, true, 1000.0)
        } else {
            self.population = survivors;
            self.rank_down_if_needed();
            (killed, false, 0.0)
        }
    }

    /// Steps rank down repeatedly while population sits below half of
    /// `next_rank_pop`, with a floor of rank 1.
    fn rank_down_if_needed(&mut self) {
        while self.rank > 1 && self.population < self.next_rank_pop / 2.0 {
            self.rank -= 1;
            self.next_rank_pop /= CITY_RANK_UP_MULTIPLIER;
        }
    }

    /// Runs one turn of city life: worker allocation, production banking,
    /// build choice, and population growth. `adjacent` is the set of
    /// not-yet-worked surrounding tiles available to assign workers to;
    /// `tech_multiplier` comes from the civilization.
    pub fn cycle_turn(
        &mut self,
        food_tiles: &mut Vec<(Location, f64)>,
        prod_tiles: &mut Vec<(Location, f64)>,
        tech_multiplier: f64,
    ) -> BuildChoice {
        food_tiles.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        prod_tiles.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

        let req_food = self.population / POP_THAT_EATS_ONE_FOOD;
        let mut food_gathered = FOOD_FROM_CITY_CENTER;
        let mut prod_gathered = PROD_FROM_CITY_CENTER;
        let mut workers_used = 0u32;
        let mut food_workers_used = 0u32;
        let mut worked_food: Vec<Location> = Vec::new();
        let mut worked_prod: Vec<Location> = Vec::new();

        for (loc, food) in food_tiles.iter() {
            if workers_used >= self.rank || food_gathered >= req_food {
                break;
            }
            food_gathered += food;
            worked_food.push(*loc);
            workers_used += 1;
            food_workers_used += 1;
        }
        for (loc, prod) in prod_tiles.iter() {
            if workers_used >= self.rank {
                break;
            }
            if *prod <= 1.0 {
                continue;
            }
            prod_gathered += prod;
            worked_prod.push(*loc);
            workers_used += 1;
        }
        let specialists = self.rank.saturating_sub(workers_used);
        prod_gathered += specialists as f64 * PROD_FROM_SPECIALIST * tech_multiplier;

        self.prod_bank += prod_gathered;

        let worker_on_food_fraction = if workers_used > 0 {
            food_workers_used as f64 / workers_used as f64
        } else {
            0.0
        };

        let build = self.choose_build(
            worker_on_food_fraction,
            food_gathered,
            req_food,
            prod_gathered,
            &worked_food,
            &worked_prod,
        );

        self.apply_growth(food_gathered, req_food);

        debug!(city = %self.name, population = self.population, prod_bank = self.prod_bank, "city cycled");

        build
    }

    fn choose_build(
        &mut self,
        worker_on_food_fraction: f64,
        food_gathered: f64,
        req_food: f64,
        prod_gathered: f64,
        worked_food: &[Location],
        worked_prod: &[Location],
    ) -> BuildChoice {
        if worker_on_food_fraction > TOO_MANY_FOOD_WORKERS_FRACTION || food_gathered < req_food {
            if let Some(&loc) = worked_food.first() {
                return BuildChoice::UpgradeFoodTile(loc);
            }
        }
        if prod_gathered < PROD_BEFORE_SETTLER {
            if let Some(&loc) = worked_prod.first() {
                return BuildChoice::UpgradeProdTile(loc);
            }
        }
        if self.prod_bank >= SETTLER_PROD_COST {
            return BuildChoice::SpawnSettler(self.location);
        }
        if let Some(&loc) = worked_prod.first() {
            return BuildChoice::UpgradeProdTile(loc);
        }
        if self.prod_bank >= self.next_defense_cost() {
            return BuildChoice::InvestDefense;
        }
        BuildChoice::None
    }

    fn apply_growth(&mut self, food_gathered: f64, req_food: f64) {
        let modifier = if food_gathered < req_food {
            self.famine = true;
            (-req_food / food_gathered.max(1e-9)).clamp(-MAX_GROWTH_MODIFIER, -1.0)
        } else {
            self.famine = false;
            (food_gathered / req_food.max(1e-9)).clamp(1.0, MAX_GROWTH_MODIFIER)
        };
        self.population *= 1.0 + modifier * CITY_BASE_GROWTH_RATE;
        if self.population < 0.0 {
            self.population = 0.0;
        }
        if self.population >= self.next_rank_pop {
            self.rank += 1;
            self.next_rank_pop *= CITY_RANK_UP_MULTIPLIER;
        }
    }

    /// Scores a candidate settler-placement tile for the AI: higher is
    /// better, using a `(1 + food) * (1 + prod)` shape so a tile with
    /// zero of one yield still contributes its other yield.
    pub fn score_settler_site(food_yields: f64, prod_yields: f64) -> f64 {
        (1.0 + food_yields) * (1.0 + prod_yields)
    }

    /// Is `candidate` far enough from every existing city to be a valid
    /// settler site (and, separately, within the 2-3 Chebyshev ring of the
    /// founding city)?
    pub fn far_enough_from(candidate: Location, existing: &[Location]) -> bool {
        existing.iter().all(|&c| candidate.chebyshev_distance(c) > 1)
    }

    pub fn within_settler_ring(founder: Location, candidate: Location) -> bool {
        let d = founder.chebyshev_distance(candidate);
        (2..=3).contains(&d)
    }
}

/// Partitions a city's unworked neighbor tiles into `(food_tiles,
/// prod_tiles)` as `(location, yield_component)` pairs.
pub fn partition_adjacent_tiles(
    tiles: &[&Tile],
    civ_tech_multiplier: f64,
) -> (Vec<(Location, f64)>, Vec<(Location, f64)>) {
    let mut food_tiles = Vec::new();
    let mut prod_tiles = Vec::new();
    for tile in tiles {
        if tile.worked {
            continue;
        }
        let y = tile.effective_yield(civ_tech_multiplier);
        if y.food > 0.0 {
            food_tiles.push((tile.location, y.food));
        } else if y.prod > 0.0 {
            prod_tiles.push((tile.location, y.prod));
        }
    }
    (food_tiles, prod_tiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_city_starts_at_nominal_population() {
        let c = City::new("Capital", Location::new(4, 2));
        assert_eq!(c.population, 1000.0);
        assert_eq!(c.rank, 1);
        assert!(c.is_alive());
    }

    #[test]
    fn kill_below_min_size_destroys_city_with_bonus() {
        let mut c = City::new("Doomed", Location::new(0, 0));
        c.population = MIN_CITY_SIZE + 50.0;
        let (killed, destroyed, bonus) = c.kill(90.0);
        assert!(destroyed);
        assert_eq!(bonus, 1000.0);
        assert_eq!(killed, MIN_CITY_SIZE + 50.0);
        assert_eq!(c.population, 0.0);
    }

    #[test]
    fn kill_above_min_size_survives_without_bonus() {
        let mut c = City::new("Survivor", Location::new(0, 0));
        let (killed, destroyed, bonus) = c.kill(10.0);
        assert!(!destroyed);
        assert_eq!(bonus, 0.0);
        assert!((killed - 100.0).abs() < 1e-9);
        assert_eq!(c.population, 900.0);
    }

    #[test]
    fn rank_down_triggers_when_population_drops_below_half_threshold() {
        let mut c = City::new("Faller", Location::new(0, 0));
        c.rank = 3;
        c.next_rank_pop = 4000.0;
        c.population = 1500.0;
        c.rank_down_if_needed();
        assert!(c.rank < 3);
    }

    #[test]
    fn growth_from_abundant_food_is_positive() {
        let mut c = City::new("Fed", Location::new(0, 0));
        let before = c.population;
        c.apply_growth(10.0, 1.0);
        assert!(c.population > before);
        assert!(!c.famine);
    }

    #[test]
    fn famine_shrinks_population() {
        let mut c = City::new("Starving", Location::new(0, 0));
        let before = c.population;
        c.apply_growth(0.5, 2.0);
        assert!(c.population < before);
        assert!(c.famine);
    }

    #[test]
    fn settler_site_requires_distance_from_existing_cities() {
        let existing = [Location::new(4, 2)];
        assert!(!City::far_enough_from(Location::new(4, 3), &existing));
        assert!(City::far_enough_from(Location::new(4, 5), &existing));
    }

    #[test]
    fn settler_ring_is_chebyshev_two_to_three() {
        let founder = Location::new(4, 2);
        assert!(!City::within_settler_ring(founder, Location::new(4, 3)));
        assert!(City::within_settler_ring(founder, Location::new(4, 4)));
        assert!(City::within_settler_ring(founder, Location::new(4, 5)));
        assert!(!City::within_settler_ring(founder, Location::new(4, 6)));
    }
}
