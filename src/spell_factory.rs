//! Name -> spell-constructor registry: an explicit, hand-written dispatch
//! table rather than a runtime scan over spell implementations.

use crate::error::UserError;
use crate::spell::{self, Avalanche, Cold, Fire, Flood, Hot, Infect, Snow, Spell, Tstorm, Wind};

pub const SPELL_NAMES: [&str; 22] = [
    "hot", "cold", "infect", "wind", "fire", "tstorm", "snow", "avalanche", "flood", "dry",
    "blizzard", "tornado", "heatwave", "coldwave", "drought", "monsoon", "disease", "quake",
    "hurricane", "plague", "volcano", "asteroid",
];

#[derive(Debug, Default)]
pub struct SpellFactory;

impl SpellFactory {
    /// Materializes a spell by stable name identifier; raises a user
    /// error on unknown names.
    pub fn create(&self, name: &str, level: u32) -> Result<Box<dyn Spell>, UserError> {
        let spell: Box<dyn Spell> = match name {
            "hot" => Box::new(Hot { level }),
            "cold" => Box::new(Cold { level }),
            "infect" => Box::new(Infect { level }),
            "wind" => Box::new(Wind { level }),
            "fire" => Box::new(Fire { level }),
            "tstorm" => Box::new(Tstorm { level }),
            "snow" => Box::new(Snow { level }),
            "avalanche" => Box::new(Avalanche { level }),
            "flood" => Box::new(Flood { level }),
            "dry" => Box::new(spell::dry(level)),
            "blizzard" => Box::new(spell::blizzard(level)),
            "tornado" => Box::new(spell::tornado(level)),
            "heatwave" => Box::new(spell::heatwave(level)),
            "coldwave" => Box::new(spell::coldwave(level)),
            "drought" => Box::new(spell::drought(level)),
            "monsoon" => Box::new(spell::monsoon(level)),
            "disease" => Box::new(spell::disease(level)),
            "quake" => Box::new(spell::quake(level)),
            "hurricane" => Box::new(spell::hurricane(level)),
            "plague" => Box::new(spell::plague(level)),
            "volcano" => Box::new(spell::volcano(level)),
            "asteroid" => Box::new(spell::asteroid(level)),
            other => return Err(UserError::UnknownSpell(other.to_string())),
        };
        Ok(spell)
    }

    /// Sorted-name iteration over the whole catalogue, used by
    /// `Talents::learnable`.
    pub fn iter_names(&self) -> impl Iterator<Item = &'static str> {
        let mut names = SPELL_NAMES;
        names.sort_unstable();
        names.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_known_spell_succeeds() {
        let factory = SpellFactory::default();
        let spell = factory.create("hot", 3).unwrap();
        assert_eq!(spell.name(), "hot");
        assert_eq!(spell.level(), 3);
    }

    #[test]
    fn create_unknown_spell_is_user_error() {
        let factory = SpellFactory::default();
        assert!(factory.create("nonexistent", 1).is_err());
    }

    #[test]
    fn iter_names_is_sorted_and_complete() {
        let factory = SpellFactory::default();
        let names: Vec<_> = factory.iter_names().collect();
        assert_eq!(names.len(), SPELL_NAMES.len());
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }
}
