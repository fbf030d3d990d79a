//! World-tile variants, yields, and the per-turn land/ocean post-processing
//! that runs after the atmosphere cycle.

use std::collections::HashSet;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::geology::Geology;
use crate::location::Location;
use crate::time::Season;
use crate::weather::{Atmosphere, Climate};

/// A tile's production is mutually exclusive: exactly one of `food`/`prod`
/// is positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Yield {
    pub food: f64,
    pub prod: f64,
}

impl Yield {
    pub fn food(v: f64) -> Self {
        Self { food: v, prod: 0.0 }
    }

    pub fn prod(v: f64) -> Self {
        Self { food: 0.0, prod: v }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self { food: self.food * factor, prod: self.prod * factor }
    }

    pub fn is_valid(self) -> bool {
        (self.food > 0.0) != (self.prod > 0.0) || (self.food == 0.0 && self.prod == 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TerrainKind {
    Ocean,
    Mountain,
    Desert,
    Tundra,
    Hills,
    Plains,
    Lush,
}

impl TerrainKind {
    pub fn base_yield(self) -> Yield {
        match self {
            TerrainKind::Ocean => Yield::food(3.0),
            TerrainKind::Mountain => Yield::prod(2.0),
            TerrainKind::Desert => Yield::prod(0.5),
            TerrainKind::Tundra => Yield::prod(0.5),
            TerrainKind::Hills => Yield::prod(1.0),
            TerrainKind::Plains => Yield::food(1.0),
            TerrainKind::Lush => Yield::food(2.0),
        }
    }

    pub fn is_ocean(self) -> bool {
        matches!(self, TerrainKind::Ocean)
    }

    pub fn has_soil_moisture(self) -> bool {
        matches!(self, TerrainKind::Plains | TerrainKind::Lush)
    }

    pub fn can_support_city(self) -> bool {
        !matches!(self, TerrainKind::Ocean)
    }
}

pub const MAX_INFRA_LEVEL: u32 = 5;

/// A single cell of the world grid. Stored as a `bevy_ecs` component so the
/// world can hold tiles in an entity arena with stable handles instead of
/// direct references.
#[derive(Debug, Clone, Component, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TerrainKind,
    pub location: Location,
    pub climate: Climate,
    pub atmosphere: Atmosphere,
    pub geology: Geology,

    pub elevation: f64,
    pub snowpack: f64,
    pub soil_moisture: f64,
    pub sea_surface_temp: f64,

    pub hp: f64,
    pub infra_level: u32,
    pub hosted_city: Option<Entity>,
    pub worked: bool,
    pub casted_this_turn: HashSet<String>,
}

impl Tile {
    pub fn new(kind: TerrainKind, location: Location, climate: Climate, geology: Geology) -> Self {
        Self {
            kind,
            location,
            climate,
            atmosphere: Atmosphere::default(),
            geology,
            elevation: 0.0,
            snowpack: 0.0,
            soil_moisture: 0.0,
            sea_surface_temp: 60.0,
            hp: 1.0,
            infra_level: 0,
            hosted_city: None,
            worked: false,
            casted_this_turn: HashSet::new(),
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = elevation;
        self
    }

    /// Has this specific spell already landed on this tile this turn?
    pub fn already_casted(&self, spell_name: &str) -> bool {
        self.casted_this_turn.contains(spell_name)
    }

    pub fn record_cast(&mut self, spell_name: &str) {
        self.casted_this_turn.insert(spell_name.to_string());
    }

    pub fn increment_infra(&mut self) -> Result<(), crate::error::ProgramError> {
        if self.infra_level >= MAX_INFRA_LEVEL {
            return Err(crate::error::ProgramError::Invariant(
                "infra_level at max, cannot increment".into(),
            ));
        }
        self.infra_level += 1;
        Ok(())
    }

    pub fn reduce_infra(&mut self, n: u32) -> u32 {
        let destroyed = n.min(self.infra_level);
        self.infra_level -= destroyed;
        destroyed
    }

    pub fn damage(&mut self, pct: f64) {
        let pct = pct.clamp(0.0, 100.0);
        self.hp *= 1.0 - pct / 100.0;
    }

    fn snowfall_fraction(temp: f64) -> f64 {
        if temp < 30.0 {
            1.0
        } else if temp < 60.0 {
            (60.0 - temp) / 30.0
        } else {
            0.0
        }
    }

    fn melt_fraction(temp: f64) -> f64 {
        if temp < 15.0 {
            0.0
        } else if temp < 75.0 {
            (temp - 15.0) / 60.0
        } else {
            1.0
        }
    }

    fn yield_moisture_multiplier(moisture: f64) -> f64 {
        if moisture < 1.5 {
            moisture
        } else if moisture < 2.75 {
            1.5 - (moisture - 1.5)
        } else {
            0.25
        }
    }

    fn average_precip(&self, season: Season) -> f64 {
        let v = self.climate.precip_at(season);
        if v == 0.0 { 1.0 } else { v }
    }

    fn average_temp(&self, season: Season) -> f64 {
        self.climate.temperature_at(season)
    }

    /// Runs the per-turn land/ocean post-processing, after the atmosphere
    /// has already cycled.
    pub fn post_atmosphere_cycle(&mut self, season: Season) {
        self.hp = (self.hp + 0.10).min(1.0);

        if self.kind.is_ocean() {
            self.sea_surface_temp = (self.sea_surface_temp + self.atmosphere.temperature) / 2.0;
            self.worked = false;
            self.casted_this_turn.clear();
            return;
        }

        let temp = self.atmosphere.temperature;
        let precip = self.atmosphere.precip;
        self.snowpack = (self.snowpack + precip * 12.0 * Self::snowfall_fraction(temp))
            * (1.0 - Self::melt_fraction(temp));

        if self.kind.has_soil_moisture() {
            let precip_effect = precip / self.average_precip(season);
            let temp_effect = 1.0 + 0.01 * (self.average_temp(season) - temp);
            let recent = precip_effect * temp_effect;
            self.soil_moisture = ((2.0 * recent + self.soil_moisture) / 3.0).clamp(0.0, 99.999);
        }

        self.worked = false;
        self.casted_this_turn.clear();
    }

    /// Effective yield this turn, folding in infra, hp, moisture, and the
    /// civilization's tech multiplier.
    pub fn effective_yield(&self, civ_tech_multiplier: f64) -> Yield {
        let moisture_mult = if self.kind.has_soil_moisture() {
            Self::yield_moisture_multiplier(self.soil_moisture)
        } else {
            1.0
        };
        self.kind
            .base_yield()
            .scale((1.0 + self.infra_level as f64) * self.hp * moisture_mult * civ_tech_multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geology::GeologyKind;
    use crate::location::{Direction, Wind};

    fn plain_climate() -> Climate {
        Climate::new([50.0; 4], [2.0; 4], [Wind::new(5.0, Direction::N); 4])
    }

    fn make_tile(kind: TerrainKind) -> Tile {
        Tile::new(kind, Location::new(0, 0), plain_climate(), Geology::new(GeologyKind::Inactive, 0.0))
    }

    #[test]
    fn hp_regenerates_and_caps_at_one() {
        let mut t = make_tile(TerrainKind::Plains);
        t.hp = 0.95;
        t.atmosphere.cycle(&t.climate.clone(), Season::Spring, t.location, &[]);
        t.post_atmosphere_cycle(Season::Spring);
        assert!(t.hp <= 1.0);
        assert!(t.hp > 0.95);
    }

    #[test]
    fn infra_cannot_exceed_max() {
        let mut t = make_tile(TerrainKind::Hills);
        for _ in 0..MAX_INFRA_LEVEL {
            t.increment_infra().unwrap();
        }
        assert!(t.increment_infra().is_err());
    }

    #[test]
    fn worked_and_casts_reset_each_turn() {
        let mut t = make_tile(TerrainKind::Plains);
        t.worked = true;
        t.record_cast("hot");
        t.atmosphere.cycle(&t.climate.clone(), Season::Spring, t.location, &[]);
        t.post_atmosphere_cycle(Season::Spring);
        assert!(!t.worked);
        assert!(!t.already_casted("hot"));
    }

    #[test]
    fn yield_is_mutually_exclusive() {
        assert!(Yield::food(3.0).is_valid());
        assert!(Yield::prod(2.0).is_valid());
        assert!(Yield { food: 0.0, prod: 0.0 }.is_valid());
    }
}
