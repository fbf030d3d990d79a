//! The adversarial player: mana pool, exp/leveling, and talent investment.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::UserError;
use crate::talents::Talents;

pub const STARTING_MANA: f64 = 100.0;
pub const FIRST_LEVELUP_EXP_COST: f64 = 100.0;
pub const MANA_REGEN_RATE: f64 = 1.0 / 20.0;
const MANA_POOL_GROWTH: f64 = 1.4;
const EXP_LEVEL_COST_GROWTH: f64 = 1.4;

#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
pub struct Caster {
    pub name: String,
    pub mana: f64,
    pub max_mana: f64,
    pub exp: f64,
    pub level: u32,
    pub next_level_cost: f64,
    pub talents: Talents,
}

impl Caster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mana: STARTING_MANA,
            max_mana: STARTING_MANA,
            exp: 0.0,
            level: 1,
            next_level_cost: FIRST_LEVELUP_EXP_COST,
            talents: Talents::default(),
        }
    }

    fn mana_pool_for_level(level: u32) -> f64 {
        STARTING_MANA * MANA_POOL_GROWTH.powi(level as i32 - 1)
    }

    fn exp_cost_for_level(level: u32) -> f64 {
        FIRST_LEVELUP_EXP_COST * EXP_LEVEL_COST_GROWTH.powi(level as i32 - 1)
    }

    /// Regenerates mana by `max_mana * MANA_REGEN_RATE`, capped at max.
    pub fn cycle_turn(&mut self) {
        self.mana = (self.mana + self.max_mana * MANA_REGEN_RATE).min(self.max_mana);
    }

    /// Spends `cost` mana, failing with a user error if insufficient.
    pub fn cast(&mut self, cost: f64) -> Result<(), UserError> {
        if self.mana < cost {
            return Err(UserError::InsufficientMana { need: cost, have: self.mana });
        }
        self.mana -= cost;
        Ok(())
    }

    pub fn learn(&mut self, spell_name: &str, prereq_min_level: u32, must_know: &[(&str, u32)]) -> Result<u32, UserError> {
        self.talents.add(spell_name, self.level, prereq_min_level, must_know)
    }

    /// Awards exp, running the level-up while-loop: each level-up
    /// recomputes the mana pool and tops mana up by the delta (not a full
    /// refill).
    pub fn gain_exp(&mut self, amount: f64) {
        self.exp += amount;
        while self.exp >= self.next_level_cost {
            self.exp -= self.next_level_cost;
            let old_max_mana = self.max_mana;
            self.level += 1;
            self.max_mana = Self::mana_pool_for_level(self.level);
            self.mana += self.max_mana - old_max_mana;
            self.next_level_cost = Self::exp_cost_for_level(self.level);
            info!(level = self.level, max_mana = self.max_mana, "caster leveled up");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mana_regenerates_and_caps() {
        let mut c = Caster::new("Baal");
        c.mana = 90.0;
        c.cycle_turn();
        assert_eq!(c.mana, 95.0);
        c.cycle_turn();
        c.cycle_turn();
        assert_eq!(c.mana, 100.0);
    }

    #[test]
    fn cast_fails_on_insufficient_mana() {
        let mut c = Caster::new("Baal");
        c.mana = 10.0;
        assert!(c.cast(50.0).is_err());
        assert_eq!(c.mana, 10.0);
    }

    #[test]
    fn cast_spends_mana() {
        let mut c = Caster::new("Baal");
        c.cast(30.0).unwrap();
        assert_eq!(c.mana, 70.0);
    }

    #[test]
    fn gain_exp_levels_up_and_tops_up_mana_by_delta() {
        let mut c = Caster::new("Baal");
        let needed = c.next_level_cost - c.exp;
        c.gain_exp(needed);
        assert_eq!(c.level, 2);
        let expected_max_mana = STARTING_MANA * MANA_POOL_GROWTH;
        assert!((c.max_mana - expected_max_mana).abs() < 1e-9);
        // Mana topped up by delta, not refilled to new max.
        assert!((c.mana - (STARTING_MANA + (expected_max_mana - STARTING_MANA))).abs() < 1e-9);
    }
}
