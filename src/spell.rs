//! The spell catalogue: cost/level/location bookkeeping, the shared
//! damage/kill/chain-reaction helpers, and every named spell effect.
//!
//! Nine spells (Hot, Cold, Infect, Wind, Fire, Tstorm, Snow, Avalanche,
//! Flood) carry full numeric fidelity. The remaining thirteen are
//! modeled with the same shared helpers and growth-curve vocabulary at
//! higher cost/prereq tiers.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::city::City;
use crate::error::UserError;
use crate::math::{exp_growth, fibonacci_div, poly_growth};
use crate::tile::{Tile, TerrainKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpellPrereq {
    pub min_caster_level: u32,
    pub must_know_spells: &'static [(&'static str, u32)],
}

impl SpellPrereq {
    pub const NONE: SpellPrereq = SpellPrereq { min_caster_level: 0, must_know_spells: &[] };
}

/// Context a spell needs to verify and apply itself, gathered by the
/// command dispatcher from the world/caster/civilization.
pub struct SpellContext<'a> {
    pub tile: &'a mut Tile,
    pub city: Option<&'a mut City>,
    pub tech_level: u32,
    pub season_avg_precip: f64,
    pub rng: &'a mut dyn rand::RngCore,
}

/// Result of applying a spell: exp gained, plus any child spells that
/// should be materialized and applied at the same location (chain
/// reactions).
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    pub exp_gained: f64,
    pub spawn_requests: Vec<(String, u32)>,
}

pub trait Spell {
    fn name(&self) -> &'static str;
    fn base_cost(&self) -> f64;
    fn prereq(&self) -> SpellPrereq {
        SpellPrereq::NONE
    }
    fn level(&self) -> u32;

    /// `base_cost * 1.3^(level-1)`.
    fn cost(&self) -> f64 {
        self.base_cost() * 1.3f64.powi(self.level() as i32 - 1)
    }

    /// Checked before any mutation. Implementations should call
    /// `verify_not_multi_cast` first via `verify_apply_common`.
    fn verify_apply(&self, ctx: &SpellContext) -> Result<(), UserError>;

    /// Mutates `ctx` and returns exp gained (before chain-reaction
    /// doubling, which the caller applies via the `spawn` helper).
    fn apply(&self, ctx: &mut SpellContext) -> ApplyOutcome;
}

// ---------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------

fn verify_not_multi_cast(tile: &Tile, spell_name: &str) -> Result<(), UserError> {
    if tile.already_casted(spell_name) {
        return Err(UserError::DoubleCast { spell: spell_name.to_string() });
    }
    Ok(())
}

/// Every spell's `verify_apply` starts here.
fn verify_apply_common(tile: &Tile, spell_name: &str) -> Result<(), UserError> {
    verify_not_multi_cast(tile, spell_name)
}

fn kill(city: &mut City, pct: f64) -> f64 {
    let (killed, destroyed, bonus) = city.kill(pct);
    if destroyed { killed + bonus } else { killed }
}

fn destroy_infra(tile: &mut Tile, n: u32) -> f64 {
    let destroyed = tile.reduce_infra(n);
    2f64.powi(destroyed as i32) * 200.0
}

fn destroy_defense(city: &mut City, n: f64) -> f64 {
    let destroyed = n.min(city.defense);
    city.defense -= destroyed;
    2f64.powi(destroyed.round() as i32) * 400.0
}

fn damage_tile(tile: &mut Tile, pct: f64) {
    tile.damage(pct);
}

fn infra_damage_common(tile: &mut Tile, base_amount: f64, tech_penalty: f64) -> f64 {
    if tile.infra_level > 0 && base_amount > 0.0 {
        let max_destroyed = (base_amount / tech_penalty).round().max(0.0) as u32;
        destroy_infra(tile, max_destroyed)
    } else {
        0.0
    }
}

fn defense_damage_common(city: &mut City, base_amount: f64, tech_penalty: f64) -> f64 {
    if city.defense > 0.0 && base_amount > 0.0 {
        let max_destroyed = (base_amount / tech_penalty).round().max(0.0);
        destroy_defense(city, max_destroyed)
    } else {
        0.0
    }
}

const CITY_DESTROY_EXP_BONUS: f64 = 1000.0;
const CHAIN_REACTION_BONUS: f64 = 2.0;

// ---------------------------------------------------------------------
// Representative, full-fidelity spells
// ---------------------------------------------------------------------

pub struct Hot {
    pub level: u32,
}

impl Spell for Hot {
    fn name(&self) -> &'static str {
        "hot"
    }
    fn base_cost(&self) -> f64 {
        50.0
    }
    fn level(&self) -> u32 {
        self.level
    }

    fn verify_apply(&self, ctx: &SpellContext) -> Result<(), UserError> {
        verify_apply_common(ctx.tile, self.name())
    }

    fn apply(&self, ctx: &mut SpellContext) -> ApplyOutcome {
        let level = self.level as f64;
        ctx.tile.record_cast(self.name());
        ctx.tile.atmosphere.temperature += 7.0 * level;
        if ctx.tile.kind.is_ocean() {
            ctx.tile.sea_surface_temp += 2.0 * level;
        }

        let mut exp = 0.0;
        if let Some(city) = ctx.city.as_deref_mut() {
            let temp = ctx.tile.atmosphere.temperature;
            let base_kill = poly_growth(temp - 100.0, 1.5, 8.0);
            let tech_penalty = (ctx.tech_level as f64).sqrt().max(1.0);
            let pct_killed = base_kill / tech_penalty;
            exp += kill(city, pct_killed);
        }
        ApplyOutcome { exp_gained: exp, spawn_requests: vec![] }
    }
}

pub struct Cold {
    pub level: u32,
}

impl Spell for Cold {
    fn name(&self) -> &'static str {
        "cold"
    }
    fn base_cost(&self) -> f64 {
        50.0
    }
    fn level(&self) -> u32 {
        self.level
    }

    fn verify_apply(&self, ctx: &SpellContext) -> Result<(), UserError> {
        verify_apply_common(ctx.tile, self.name())
    }

    fn apply(&self, ctx: &mut SpellContext) -> ApplyOutcome {
        let level = self.level as f64;
        ctx.tile.record_cast(self.name());
        ctx.tile.atmosphere.temperature -= 7.0 * level;
        if ctx.tile.kind.is_ocean() {
            // Positive magnitude subtracted; the ocean-surface curve is
            // negative, so the surface actually warms slightly here.
            // Deliberate, not a typo -- see DESIGN.md.
            ctx.tile.sea_surface_temp -= -2.0 * level;
        }

        let mut exp = 0.0;
        if let Some(city) = ctx.city.as_deref_mut() {
            let temp = ctx.tile.atmosphere.temperature;
            let base_kill = poly_growth(0.0 - temp, 1.5, 8.0);
            let wind_bonus = exp_growth(1.02, ctx.tile.atmosphere.wind.speed, 0.0, Some(40.0));
            let famine_bonus = if city.famine { 2.0 } else { 1.0 };
            let tech_penalty = (ctx.tech_level as f64).max(1.0);
            let pct_killed = base_kill * wind_bonus * famine_bonus / tech_penalty;
            exp += kill(city, pct_killed);
        }
        ApplyOutcome { exp_gained: exp, spawn_requests: vec![] }
    }
}

pub struct Infect {
    pub level: u32,
}

impl Spell for Infect {
    fn name(&self) -> &'static str {
        "infect"
    }
    fn base_cost(&self) -> f64 {
        50.0
    }
    fn level(&self) -> u32 {
        self.level
    }

    fn verify_apply(&self, ctx: &SpellContext) -> Result<(), UserError> {
        verify_apply_common(ctx.tile, self.name())?;
        if ctx.city.is_none() {
            return Err(UserError::UncastableHere {
                spell: self.name().to_string(),
                reason: "infect may only be cast on a tile hosting a city".to_string(),
            });
        }
        Ok(())
    }

    fn apply(&self, ctx: &mut SpellContext) -> ApplyOutcome {
        ctx.tile.record_cast(self.name());
        let temp = ctx.tile.atmosphere.temperature;
        let degrees_extreme = (temp - 90.0).max(30.0 - temp).max(0.0);
        let tech_penalty = (ctx.tech_level as f64).max(1.0);
        let mut exp = 0.0;
        if let Some(city) = ctx.city.as_deref_mut() {
            let base_kill = poly_growth(self.level as f64, 1.3, 1.0);
            let city_size_bonus = exp_growth(1.05, city.rank as f64, 0.0, None);
            let extreme_temp_bonus = exp_growth(1.03, degrees_extreme, 0.0, Some(20.0));
            let famine_bonus = if city.famine { 2.0 } else { 1.0 };
            let pct_killed = base_kill * city_size_bonus * extreme_temp_bonus * famine_bonus / tech_penalty;
            exp += kill(city, pct_killed);
        }
        ApplyOutcome { exp_gained: exp, spawn_requests: vec![] }
    }
}

pub struct Wind {
    pub level: u32,
}

impl Spell for Wind {
    fn name(&self) -> &'static str {
        "wind"
    }
    fn base_cost(&self) -> f64 {
        50.0
    }
    fn level(&self) -> u32 {
        self.level
    }

    fn verify_apply(&self, ctx: &SpellContext) -> Result<(), UserError> {
        verify_apply_common(ctx.tile, self.name())
    }

    fn apply(&self, ctx: &mut SpellContext) -> ApplyOutcome {
        let orig_speed = ctx.tile.atmosphere.wind.speed;
        let new_speed = orig_speed + 20.0 * self.level as f64;
        ctx.tile.record_cast(self.name());
        ctx.tile.atmosphere.wind = ctx.tile.atmosphere.wind.add_speed(20.0 * self.level as f64);

        let base_infra_destroy = exp_growth(1.03, new_speed, 60.0, None);
        let base_kill = exp_growth(1.03, new_speed, 80.0, None);
        let base_defense_destroy = exp_growth(1.02, new_speed, 80.0, None);
        let cold_bonus = if ctx.tile.atmosphere.temperature < 0.0 {
            exp_growth(1.02, new_speed, 0.0, Some(40.0)) - exp_growth(1.02, orig_speed, 0.0, Some(40.0))
        } else {
            1.0
        };
        let tech_penalty = (ctx.tech_level as f64).sqrt().max(1.0);

        let mut exp = infra_damage_common(ctx.tile, base_infra_destroy, tech_penalty);

        if let Some(city) = ctx.city.as_deref_mut() {
            let defense_penalty = city.defense.sqrt().max(1.0);
            // Defense damage is applied whenever a city is present,
            // independent of the kill roll below.
            exp += defense_damage_common(city, base_defense_destroy, defense_penalty);
            let pct_killed = base_kill * cold_bonus / tech_penalty / defense_penalty;
            exp += kill(city, pct_killed);
        }

        ApplyOutcome { exp_gained: exp, spawn_requests: vec![] }
    }
}

pub struct Fire {
    pub level: u32,
}

impl Spell for Fire {
    fn name(&self) -> &'static str {
        "fire"
    }
    fn base_cost(&self) -> f64 {
        100.0
    }
    fn prereq(&self) -> SpellPrereq {
        SpellPrereq { min_caster_level: 5, must_know_spells: &[("hot", 1)] }
    }
    fn level(&self) -> u32 {
        self.level
    }

    fn verify_apply(&self, ctx: &SpellContext) -> Result<(), UserError> {
        verify_apply_common(ctx.tile, self.name())?;
        if !ctx.tile.kind.has_soil_moisture() {
            return Err(UserError::UncastableHere {
                spell: self.name().to_string(),
                reason: "fire requires a tile with soil moisture".to_string(),
            });
        }
        Ok(())
    }

    fn apply(&self, ctx: &mut SpellContext) -> ApplyOutcome {
        ctx.tile.record_cast(self.name());
        let base = poly_growth(self.level as f64, 1.3, 1.0);
        let temp_mult = exp_growth(1.03, ctx.tile.atmosphere.temperature, 75.0, None);
        let wind_mult = exp_growth(1.05, ctx.tile.atmosphere.wind.speed, 20.0, Some(30.0));
        let moisture_mult = exp_growth(1.05, 75.0 - ctx.tile.soil_moisture * 100.0, 0.0, Some(30.0));
        let snowpack_div = exp_growth(1.3, ctx.tile.snowpack, 0.0, None).max(1e-9);
        let destructiveness = base * temp_mult * wind_mult * moisture_mult / snowpack_div;

        let tech_penalty = (ctx.tech_level as f64).sqrt().max(1.0);
        let infra_base = exp_growth(1.05, destructiveness, 0.0, None);
        let defense_base = exp_growth(1.03, destructiveness, 0.0, None);

        let mut exp = infra_damage_common(ctx.tile, infra_base, tech_penalty);
        if let Some(city) = ctx.city.as_deref_mut() {
            let defense_penalty = city.defense.sqrt().max(1.0);
            exp += defense_damage_common(city, defense_base, defense_penalty);
            exp += kill(city, destructiveness / tech_penalty);
        }
        ApplyOutcome { exp_gained: exp, spawn_requests: vec![] }
    }
}

pub struct Tstorm {
    pub level: u32,
}

impl Spell for Tstorm {
    fn name(&self) -> &'static str {
        "tstorm"
    }
    fn base_cost(&self) -> f64 {
        100.0
    }
    fn prereq(&self) -> SpellPrereq {
        SpellPrereq { min_caster_level: 5, must_know_spells: &[("wind", 1)] }
    }
    fn level(&self) -> u32 {
        self.level
    }

    fn verify_apply(&self, ctx: &SpellContext) -> Result<(), UserError> {
        verify_apply_common(ctx.tile, self.name())?;
        if !matches!(ctx.tile.kind, TerrainKind::Plains | TerrainKind::Lush) {
            return Err(UserError::UncastableHere {
                spell: self.name().to_string(),
                reason: "tstorm may only be cast on Plains or Lush".to_string(),
            });
        }
        Ok(())
    }

    fn apply(&self, ctx: &mut SpellContext) -> ApplyOutcome {
        ctx.tile.record_cast(self.name());
        let base = poly_growth(self.level as f64, 1.3, 1.0);
        let temp_mult = exp_growth(1.03, ctx.tile.atmosphere.temperature, 85.0, Some(15.0));
        let wind_mult = exp_growth(1.03, ctx.tile.atmosphere.wind.speed, 15.0, Some(15.0));
        let pressure_mult = exp_growth(1.05, ctx.tile.atmosphere.pressure, 990.0, None);
        let destructiveness = base * temp_mult * wind_mult * pressure_mult;

        let tech_penalty = (ctx.tech_level as f64).sqrt().max(1.0);
        let mut exp = 0.0;
        if let Some(city) = ctx.city.as_deref_mut() {
            let defense_penalty = city.defense.sqrt().max(1.0);
            exp += kill(city, 0.02 * destructiveness / tech_penalty / defense_penalty);
        }

        let mut spawn_requests = vec![];
        let wind_level = fibonacci_div(destructiveness, 10.0);
        if wind_level > 0 {
            spawn_requests.push(("wind".to_string(), wind_level));
        }
        let flood_level = fibonacci_div(destructiveness, 15.0);
        if flood_level > 0 {
            spawn_requests.push(("flood".to_string(), flood_level));
        } else {
            ctx.tile.soil_moisture += 0.1;
        }
        let tornado_level = fibonacci_div(destructiveness, 20.0);
        if tornado_level > 0 {
            spawn_requests.push(("tornado".to_string(), tornado_level));
        }

        ApplyOutcome { exp_gained: exp, spawn_requests }
    }
}

pub struct Snow {
    pub level: u32,
}

impl Spell for Snow {
    fn name(&self) -> &'static str {
        "snow"
    }
    fn base_cost(&self) -> f64 {
        100.0
    }
    fn prereq(&self) -> SpellPrereq {
        SpellPrereq { min_caster_level: 5, must_know_spells: &[("cold", 1)] }
    }
    fn level(&self) -> u32 {
        self.level
    }

    fn verify_apply(&self, ctx: &SpellContext) -> Result<(), UserError> {
        verify_apply_common(ctx.tile, self.name())?;
        if ctx.tile.atmosphere.temperature > 32.0 {
            return Err(UserError::UncastableHere {
                spell: self.name().to_string(),
                reason: "snow requires temperature <= 32".to_string(),
            });
        }
        Ok(())
    }

    fn apply(&self, ctx: &mut SpellContext) -> ApplyOutcome {
        ctx.tile.record_cast(self.name());
        let base_snowfall = self.level as f64 * 4.0;
        let temp_mult = exp_growth(1.03, 32.0 - ctx.tile.atmosphere.temperature, 0.0, Some(15.0));
        let pressure_mult = exp_growth(1.05, 990.0 - ctx.tile.atmosphere.pressure, 0.0, None);
        let dewpoint_mult = exp_growth(1.05, ctx.tile.atmosphere.dewpoint, 20.0, None);
        let snowfall = base_snowfall * temp_mult * pressure_mult * dewpoint_mult;
        ctx.tile.snowpack += snowfall;

        let tech_penalty = (ctx.tech_level as f64).sqrt().max(1.0);
        let mut exp = 0.0;
        if let Some(city) = ctx.city.as_deref_mut() {
            let defense_penalty = city.defense.sqrt().max(1.0);
            let base_kill = exp_growth(1.03, snowfall, 0.0, Some(50.0));
            exp += kill(city, base_kill / tech_penalty / defense_penalty);
        }
        ApplyOutcome { exp_gained: exp, spawn_requests: vec![] }
    }
}

pub struct Avalanche {
    pub level: u32,
}

impl Spell for Avalanche {
    fn name(&self) -> &'static str {
        "avalanche"
    }
    fn base_cost(&self) -> f64 {
        200.0
    }
    fn prereq(&self) -> SpellPrereq {
        SpellPrereq { min_caster_level: 10, must_know_spells: &[("snow", 1)] }
    }
    fn level(&self) -> u32 {
        self.level
    }

    fn verify_apply(&self, ctx: &SpellContext) -> Result<(), UserError> {
        verify_apply_common(ctx.tile, self.name())?;
        if !matches!(ctx.tile.kind, TerrainKind::Hills | TerrainKind::Mountain) {
            return Err(UserError::UncastableHere {
                spell: self.name().to_string(),
                reason: "avalanche may only be cast on Hills or Mountain".to_string(),
            });
        }
        if ctx.tile.snowpack <= 0.0 {
            return Err(UserError::UncastableHere {
                spell: self.name().to_string(),
                reason: "avalanche requires existing snowpack".to_string(),
            });
        }
        Ok(())
    }

    fn apply(&self, ctx: &mut SpellContext) -> ApplyOutcome {
        let snowstorm_bonus = if ctx.tile.already_casted("snow") { 1.5 } else { 1.0 };
        let blizzard_bonus = if ctx.tile.already_casted("blizzard") { 2.0 } else { 1.0 };
        ctx.tile.record_cast(self.name());

        let base = poly_growth(self.level as f64, 1.3, 1.0);
        let elevation_bonus = exp_growth(1.1, ctx.tile.elevation / 1000.0, 2.0, None);
        let snowpack_bonus = exp_growth(1.002, ctx.tile.snowpack, 100.0, None);
        let destructiveness = base * snowstorm_bonus * blizzard_bonus * elevation_bonus * snowpack_bonus;

        let tech_penalty = (ctx.tech_level as f64).sqrt().max(1.0);
        let infra_base = exp_growth(1.05, destructiveness, 0.0, None);
        let defense_base = exp_growth(1.03, destructiveness, 0.0, None);

        let mut exp = infra_damage_common(ctx.tile, infra_base, tech_penalty);
        if let Some(city) = ctx.city.as_deref_mut() {
            let defense_penalty = city.defense.sqrt().max(1.0);
            exp += defense_damage_common(city, defense_base, defense_penalty);
            exp += kill(city, destructiveness / tech_penalty);
        }
        ApplyOutcome { exp_gained: exp, spawn_requests: vec![] }
    }
}

pub struct Flood {
    pub level: u32,
}

impl Spell for Flood {
    fn name(&self) -> &'static str {
        "flood"
    }
    fn base_cost(&self) -> f64 {
        200.0
    }
    fn prereq(&self) -> SpellPrereq {
        SpellPrereq { min_caster_level: 10, must_know_spells: &[("tstorm", 1)] }
    }
    fn level(&self) -> u32 {
        self.level
    }

    fn verify_apply(&self, ctx: &SpellContext) -> Result<(), UserError> {
        verify_apply_common(ctx.tile, self.name())?;
        if !ctx.tile.kind.has_soil_moisture() {
            return Err(UserError::UncastableHere {
                spell: self.name().to_string(),
                reason: "flood requires a tile with soil moisture".to_string(),
            });
        }
        if ctx.tile.atmosphere.temperature < 33.0 {
            return Err(UserError::UncastableHere {
                spell: self.name().to_string(),
                reason: "flood requires temperature >= 33".to_string(),
            });
        }
        Ok(())
    }

    fn apply(&self, ctx: &mut SpellContext) -> ApplyOutcome {
        ctx.tile.record_cast(self.name());
        let base_rainfall = self.level as f64;
        let dewpoint_mult = exp_growth(1.03, ctx.tile.atmosphere.dewpoint, 55.0, None);
        let pressure_mult = exp_growth(1.03, ctx.tile.atmosphere.pressure, 990.0, None);
        let total_rainfall = base_rainfall * dewpoint_mult * pressure_mult;

        let added_moisture = total_rainfall / ctx.season_avg_precip.max(1e-9);
        ctx.tile.soil_moisture += added_moisture;

        let moisture_mult = exp_growth(1.05, ctx.tile.soil_moisture * 10.0, 10.0, None);
        // The elevation-effect curve is fed `pressure`, not tile
        // elevation -- deliberate, see DESIGN.md.
        let elevation_mult = exp_growth(1.1, ctx.tile.atmosphere.pressure / 500.0, 0.0, None);
        let destructiveness = total_rainfall * moisture_mult * elevation_mult;

        let tech_penalty = (ctx.tech_level as f64).sqrt().max(1.0);
        let infra_base = exp_growth(1.05, destructiveness, 0.0, None);
        let defense_base = exp_growth(1.03, destructiveness, 0.0, None);

        let mut exp = infra_damage_common(ctx.tile, infra_base, tech_penalty);
        if let Some(city) = ctx.city.as_deref_mut() {
            // Linear defense penalty, unlike most other spells.
            let defense_penalty = city.defense.max(1.0);
            exp += defense_damage_common(city, defense_base, defense_penalty);
            exp += kill(city, destructiveness / tech_penalty);
        }
        ApplyOutcome { exp_gained: exp, spawn_requests: vec![] }
    }
}

// ---------------------------------------------------------------------
// Higher-tier spells: contract-only fidelity
// ---------------------------------------------------------------------

/// Shared skeleton for the thirteen higher-tier spells that don't require
/// full numeric fidelity: a destructiveness scalar from level and one
/// environmental multiplier, fed through the same shared helpers as the
/// representative spells.
struct GenericDisaster {
    name: &'static str,
    base_cost: f64,
    prereq: SpellPrereq,
    level: u32,
    multiplier_base: f64,
    requires_tile: fn(&Tile) -> Result<(), UserError>,
}

impl Spell for GenericDisaster {
    fn name(&self) -> &'static str {
        self.name
    }
    fn base_cost(&self) -> f64 {
        self.base_cost
    }
    fn prereq(&self) -> SpellPrereq {
        self.prereq
    }
    fn level(&self) -> u32 {
        self.level
    }

    fn verify_apply(&self, ctx: &SpellContext) -> Result<(), UserError> {
        verify_apply_common(ctx.tile, self.name())?;
        (self.requires_tile)(ctx.tile)
    }

    fn apply(&self, ctx: &mut SpellContext) -> ApplyOutcome {
        ctx.tile.record_cast(self.name());
        let base = poly_growth(self.level as f64, 1.3, 1.0);
        let env_mult = exp_growth(self.multiplier_base, ctx.tile.atmosphere.temperature.abs(), 0.0, Some(30.0));
        let destructiveness = base * env_mult;

        let tech_penalty = (ctx.tech_level as f64).sqrt().max(1.0);
        let infra_base = exp_growth(1.05, destructiveness, 0.0, None);
        let defense_base = exp_growth(1.03, destructiveness, 0.0, None);

        let mut exp = infra_damage_common(ctx.tile, infra_base, tech_penalty);
        if let Some(city) = ctx.city.as_deref_mut() {
            let defense_penalty = city.defense.sqrt().max(1.0);
            exp += defense_damage_common(city, defense_base, defense_penalty);
            exp += kill(city, destructiveness / tech_penalty);
        }
        ApplyOutcome { exp_gained: exp, spawn_requests: vec![] }
    }
}

fn no_tile_requirement(_: &Tile) -> Result<(), UserError> {
    Ok(())
}

fn requires_non_ocean(tile: &Tile) -> Result<(), UserError> {
    if tile.kind.is_ocean() {
        return Err(UserError::UncastableHere {
            spell: "this spell".to_string(),
            reason: "cannot be cast over ocean".to_string(),
        });
    }
    Ok(())
}

macro_rules! generic_spell {
    ($ctor:ident, $name:literal, $cost:literal, $min_level:literal, $prereqs:expr, $mult:literal, $req:ident) => {
        pub fn $ctor(level: u32) -> impl Spell {
            GenericDisaster {
                name: $name,
                base_cost: $cost,
                prereq: SpellPrereq { min_caster_level: $min_level, must_know_spells: $prereqs },
                level,
                multiplier_base: $mult,
                requires_tile: $req,
            }
        }
    };
}

generic_spell!(dry, "dry", 120.0, 6, &[("cold", 1)], 1.03, no_tile_requirement);
generic_spell!(blizzard, "blizzard", 150.0, 8, &[("snow", 2)], 1.04, requires_non_ocean);
generic_spell!(tornado, "tornado", 150.0, 8, &[("wind", 2)], 1.04, requires_non_ocean);
generic_spell!(heatwave, "heatwave", 150.0, 8, &[("hot", 2)], 1.03, no_tile_requirement);
generic_spell!(coldwave, "coldwave", 150.0, 8, &[("cold", 2)], 1.03, no_tile_requirement);
generic_spell!(drought, "drought", 200.0, 10, &[("dry", 1)], 1.04, no_tile_requirement);
generic_spell!(monsoon, "monsoon", 220.0, 12, &[("flood", 1)], 1.04, requires_non_ocean);
generic_spell!(disease, "disease", 200.0, 10, &[("infect", 1)], 1.05, requires_non_ocean);
generic_spell!(quake, "quake", 250.0, 12, &[], 1.05, requires_non_ocean);
generic_spell!(hurricane, "hurricane", 300.0, 15, &[("tstorm", 1), ("wind", 1)], 1.05, no_tile_requirement);
generic_spell!(plague, "plague", 300.0, 15, &[("disease", 1)], 1.06, requires_non_ocean);
generic_spell!(volcano, "volcano", 350.0, 18, &[("quake", 1)], 1.06, requires_non_ocean);
generic_spell!(asteroid, "asteroid", 500.0, 25, &[], 1.08, no_tile_requirement);

/// Applies a `spawn(name, level)` chain reaction: if the child's verify
/// passes, applies it and doubles its exp; otherwise contributes zero.
pub fn spawn(
    factory: &crate::spell_factory::SpellFactory,
    name: &str,
    level: u32,
    ctx: &mut SpellContext,
) -> f64 {
    let Ok(child) = factory.create(name, level) else {
        return 0.0;
    };
    if child.verify_apply(ctx).is_err() {
        return 0.0;
    }
    let outcome = child.apply(ctx);
    CHAIN_REACTION_BONUS * outcome.exp_gained
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::City;
    use crate::geology::{Geology, GeologyKind};
    use crate::location::{Direction, Location, Wind as WindVec};
    use crate::time::Season;
    use crate::weather::Climate;
    use rand::rngs::mock::StepRng;

    fn make_tile(kind: TerrainKind, temp: f64) -> Tile {
        let climate = Climate::new([temp; 4], [2.0; 4], [WindVec::new(5.0, Direction::N); 4]);
        let mut tile = Tile::new(kind, Location::new(0, 0), climate, Geology::new(GeologyKind::Inactive, 0.0));
        tile.atmosphere.cycle(&tile.climate.clone(), Season::Summer, tile.location, &[]);
        tile.soil_moisture = 0.5;
        tile
    }

    #[test]
    fn hot_raises_temperature_and_kills_above_boiling_threshold() {
        let mut tile = make_tile(TerrainKind::Plains, 98.0);
        let mut city = City::new("Capital", Location::new(0, 0));
        let mut rng = StepRng::new(0, 1);
        let before_pop = city.population;
        {
            let mut ctx = SpellContext {
                tile: &mut tile,
                city: Some(&mut city),
                tech_level: 1,
                season_avg_precip: 2.0,
                rng: &mut rng,
            };
            let hot = Hot { level: 1 };
            hot.verify_apply(&ctx).unwrap();
            let outcome = hot.apply(&mut ctx);
            assert!(outcome.exp_gained >= 0.0);
        }
        assert_eq!(tile.atmosphere.temperature, 105.0);
        assert!(city.population <= before_pop);
    }

    #[test]
    fn double_cast_same_spell_same_tile_is_rejected() {
        let mut tile = make_tile(TerrainKind::Plains, 50.0);
        tile.record_cast("hot");
        let mut rng = StepRng::new(0, 1);
        let ctx = SpellContext { tile: &mut tile, city: None, tech_level: 1, season_avg_precip: 2.0, rng: &mut rng };
        let hot = Hot { level: 1 };
        assert!(hot.verify_apply(&ctx).is_err());
    }

    #[test]
    fn fire_requires_soil_moisture() {
        let mut tile = make_tile(TerrainKind::Mountain, 90.0);
        tile.soil_moisture = 0.0;
        let mut rng = StepRng::new(0, 1);
        let ctx = SpellContext { tile: &mut tile, city: None, tech_level: 1, season_avg_precip: 2.0, rng: &mut rng };
        let fire = Fire { level: 5 };
        assert!(fire.verify_apply(&ctx).is_err());
    }

    #[test]
    fn snow_requires_cold_temperature() {
        let mut tile = make_tile(TerrainKind::Tundra, 50.0);
        let mut rng = StepRng::new(0, 1);
        let ctx = SpellContext { tile: &mut tile, city: None, tech_level: 1, season_avg_precip: 2.0, rng: &mut rng };
        let snow = Snow { level: 5 };
        assert!(snow.verify_apply(&ctx).is_err());
    }

    #[test]
    fn avalanche_requires_snowpack_on_hills_or_mountain() {
        let mut tile = make_tile(TerrainKind::Hills, 20.0);
        tile.snowpack = 0.0;
        let mut rng = StepRng::new(0, 1);
        let ctx = SpellContext { tile: &mut tile, city: None, tech_level: 1, season_avg_precip: 2.0, rng: &mut rng };
        let avalanche = Avalanche { level: 10 };
        assert!(avalanche.verify_apply(&ctx).is_err());
    }

    #[test]
    fn cold_ocean_surface_slightly_warms() {
        let mut tile = make_tile(TerrainKind::Ocean, 20.0);
        let before = tile.sea_surface_temp;
        let mut rng = StepRng::new(0, 1);
        {
            let mut ctx = SpellContext { tile: &mut tile, city: None, tech_level: 1, season_avg_precip: 2.0, rng: &mut rng };
            let cold = Cold { level: 1 };
            cold.apply(&mut ctx);
        }
        assert!(tile.sea_surface_temp > before);
    }

    #[test]
    fn cost_grows_geometrically_with_level() {
        let l1 = Hot { level: 1 }.cost();
        let l2 = Hot { level: 2 }.cost();
        assert!((l2 / l1 - 1.3).abs() < 1e-9);
    }
}
