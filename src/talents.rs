//! Per-caster skill levels in the spell catalogue, and the prerequisite
//! graph that gates investing in them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::UserError;
use crate::spell_factory::SpellFactory;

pub const MAX_SPELL_LEVEL: u32 = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Talents {
    skills: HashMap<String, u32>,
    points_spent: u32,
}

impl Talents {
    pub fn level_of(&self, spell_name: &str) -> u32 {
        *self.skills.get(spell_name).unwrap_or(&0)
    }

    pub fn points_spent(&self) -> u32 {
        self.points_spent
    }

    pub fn knows(&self, spell_name: &str, level: u32) -> bool {
        self.level_of(spell_name) >= level
    }

    /// Invests one talent point in `spell_name`, raising it to
    /// `current+1`. Validates: spend budget, max level, caster-level
    /// prereq, and spell-name prereqs, in that order.
    pub fn add(
        &mut self,
        spell_name: &str,
        caster_level: u32,
        prereq_min_caster_level: u32,
        must_know_spells: &[(&str, u32)],
    ) -> Result<u32, UserError> {
        if caster_level <= self.points_spent {
            return Err(UserError::NoTalentPoints);
        }
        let new_level = self.level_of(spell_name) + 1;
        if new_level > MAX_SPELL_LEVEL {
            return Err(UserError::TalentAtMax(spell_name.to_string()));
        }
        if caster_level < prereq_min_caster_level {
            return Err(UserError::LevelTooLow { need: prereq_min_caster_level, have: caster_level });
        }
        for &(req_spell, req_level) in must_know_spells {
            if !self.knows(req_spell, req_level) {
                return Err(UserError::MissingPrereq { spell: req_spell.to_string(), level: req_level });
            }
        }
        self.skills.insert(spell_name.to_string(), new_level);
        self.points_spent += 1;
        Ok(new_level)
    }

    /// Iterates the whole spell catalogue and yields `(name, next_level)`
    /// for each spell whose prerequisites are currently satisfied at
    /// `caster_level` and that hasn't already been raised to the max
    /// level. The level passed to `factory.create` is arbitrary (`1`):
    /// only the resulting spell's `prereq()` is consulted here.
    pub fn learnable(&self, factory: &SpellFactory, caster_level: u32) -> Vec<(String, u32)> {
        let mut out = Vec::new();
        for name in factory.iter_names() {
            let Ok(spell) = factory.create(name, 1) else { continue };
            let next_level = self.level_of(name) + 1;
            if next_level > MAX_SPELL_LEVEL {
                continue;
            }
            let prereq = spell.prereq();
            if caster_level < prereq.min_caster_level {
                continue;
            }
            if prereq.must_know_spells.iter().any(|&(req_spell, req_level)| !self.knows(req_spell, req_level)) {
                continue;
            }
            out.push((name.to_string(), next_level));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_increments_from_zero() {
        let mut t = Talents::default();
        let level = t.add("hot", 1, 0, &[]).unwrap();
        assert_eq!(level, 1);
        assert_eq!(t.level_of("hot"), 1);
    }

    #[test]
    fn add_rejects_beyond_max_level() {
        let mut t = Talents::default();
        for lvl in 1..=5u32 {
            t.add("hot", lvl, 0, &[]).unwrap();
        }
        assert!(t.add("hot", 6, 0, &[]).is_err());
    }

    #[test]
    fn add_rejects_when_no_points_left() {
        let mut t = Talents::default();
        t.add("hot", 1, 0, &[]).unwrap();
        assert!(t.add("cold", 1, 0, &[]).is_err());
    }

    #[test]
    fn add_rejects_missing_prereq() {
        let mut t = Talents::default();
        assert!(t.add("fire", 5, 5, &[("hot", 1)]).is_err());
        t.add("hot", 5, 0, &[]).unwrap();
        assert!(t.add("fire", 5, 5, &[("hot", 1)]).is_err());
    }

    #[test]
    fn add_succeeds_once_prereq_and_level_met() {
        let mut t = Talents::default();
        for lvl in 1..=5u32 {
            t.add("hot", lvl, 0, &[]).unwrap();
        }
        assert!(t.add("fire", 6, 5, &[("hot", 1)]).is_ok());
    }

    #[test]
    fn learnable_excludes_gated_spells_until_prereq_known() {
        let factory = SpellFactory::default();
        let t = Talents::default();
        let learnable = t.learnable(&factory, 1);
        assert!(learnable.iter().any(|(name, level)| name == "hot" && *level == 1));
        assert!(!learnable.iter().any(|(name, _)| name == "fire"));
    }

    #[test]
    fn learnable_includes_spell_once_prereq_and_level_met() {
        let factory = SpellFactory::default();
        let mut t = Talents::default();
        for lvl in 1..=5u32 {
            t.add("hot", lvl, 0, &[]).unwrap();
        }
        let learnable = t.learnable(&factory, 5);
        assert!(learnable.iter().any(|(name, level)| name == "fire" && *level == 1));
    }

    #[test]
    fn learnable_omits_spells_already_at_max_level() {
        let factory = SpellFactory::default();
        let mut t = Talents::default();
        for lvl in 1..=5u32 {
            t.add("hot", lvl, 0, &[]).unwrap();
        }
        let learnable = t.learnable(&factory, 5);
        assert!(!learnable.iter().any(|(name, _)| name == "hot"));
    }
}
