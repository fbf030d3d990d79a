//! The typed command surface. Turning free-form text into one of these
//! values is the out-of-scope input layer's job; this module defines the
//! shape, its shape-level `validate`, and its `apply` against an engine.

use serde::{Deserialize, Serialize};

use crate::error::{BaalError, UserError};
use crate::location::Location;
use crate::world::{Engine, WinState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Help { topic: Option<String> },
    End { turns: u32 },
    Quit,
    Save { filename: Option<String> },
    Cast { spell: String, level: u32, location: Location },
    Learn { spell: String },
    Draw { mode: Option<String> },
    Hack { exp: f64 },
}

pub const DRAW_MODES: [&str; 12] = [
    "civ", "land", "yield", "moisture", "geology", "magma", "tension", "wind", "temperature",
    "pressure", "rainfall", "dewpoint",
];

impl Command {
    /// Validates shape-level constraints that don't require touching
    /// world state (turn-count bounds, known draw modes). Spell-name and
    /// location validity are deferred to the spell-dispatch boundary,
    /// which has access to the world.
    pub fn validate(&self) -> Result<(), UserError> {
        match self {
            Command::End { turns } => {
                if !(1..=100).contains(turns) {
                    return Err(UserError::BadTurnCount(*turns as i64));
                }
                Ok(())
            }
            Command::Draw { mode: Some(mode) } => {
                if !DRAW_MODES.contains(&mode.as_str()) {
                    return Err(UserError::UnknownDrawMode(mode.clone()));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Dispatches this command against an explicit engine context.
    /// `Quit`/`Help`/`Save` have no effect here: process exit, help text,
    /// and save-file serialization belong to the surrounding interface
    /// and persistence layers, both out of scope for this core.
    pub fn apply(&self, engine: &mut Engine) -> Result<(), BaalError> {
        self.validate().map_err(BaalError::User)?;
        match self {
            Command::Cast { spell, level, location } => engine.cast(spell, *level, *location),
            Command::Learn { spell } => {
                let probe = engine.spell_factory.create(spell, 1).map_err(BaalError::User)?;
                let prereq = probe.prereq();
                engine
                    .caster
                    .learn(spell, prereq.min_caster_level, prereq.must_know_spells)
                    .map(|_| ())
                    .map_err(BaalError::User)
            }
            Command::Hack { exp } => {
                engine.caster.gain_exp(*exp);
                Ok(())
            }
            Command::End { turns } => {
                for _ in 0..*turns {
                    if engine.cycle_turn() != WinState::Ongoing {
                        break;
                    }
                }
                Ok(())
            }
            Command::Quit | Command::Help { .. } | Command::Save { .. } | Command::Draw { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Configuration, InterfaceConfig, PlayerConfig, WorldConfig};
    use crate::location::Location;

    #[test]
    fn end_command_bounds_turns() {
        assert!(Command::End { turns: 0 }.validate().is_err());
        assert!(Command::End { turns: 101 }.validate().is_err());
        assert!(Command::End { turns: 1 }.validate().is_ok());
        assert!(Command::End { turns: 100 }.validate().is_ok());
    }

    #[test]
    fn draw_command_rejects_unknown_mode() {
        assert!(Command::Draw { mode: Some("nonsense".to_string()) }.validate().is_err());
        assert!(Command::Draw { mode: Some("geology".to_string()) }.validate().is_ok());
        assert!(Command::Draw { mode: None }.validate().is_ok());
    }

    fn test_engine() -> Engine {
        let config = Configuration::create(
            InterfaceConfig("text".to_string()),
            WorldConfig::Hardcoded(1),
            PlayerConfig { caster_name: "Baal".to_string() },
        )
        .unwrap();
        Engine::new(config, "Baal", 7)
    }

    #[test]
    fn learn_command_invests_a_talent_point() {
        let mut engine = test_engine();
        Command::Learn { spell: "hot".to_string() }.apply(&mut engine).unwrap();
        assert_eq!(engine.caster.talents.level_of("hot"), 1);
    }

    #[test]
    fn hack_command_grants_exp_directly() {
        let mut engine = test_engine();
        let before = engine.caster.exp;
        Command::Hack { exp: 10.0 }.apply(&mut engine).unwrap();
        assert!(engine.caster.exp > before || engine.caster.level > 1);
    }

    #[test]
    fn cast_command_without_talent_is_rejected() {
        let mut engine = test_engine();
        let result = Command::Cast { spell: "hot".to_string(), level: 1, location: Location::new(4, 2) }.apply(&mut engine);
        assert!(result.is_err());
    }

    #[test]
    fn end_command_advances_turns() {
        let mut engine = test_engine();
        Command::End { turns: 1 }.apply(&mut engine).unwrap();
        assert_eq!(engine.world.time.season, crate::time::Season::Spring);
    }

    #[test]
    fn end_command_with_bad_turn_count_is_rejected() {
        let mut engine = test_engine();
        assert!(Command::End { turns: 0 }.apply(&mut engine).is_err());
    }

    #[test]
    fn quit_help_save_draw_are_no_ops() {
        let mut engine = test_engine();
        Command::Quit.apply(&mut engine).unwrap();
        Command::Help { topic: None }.apply(&mut engine).unwrap();
        Command::Save { filename: None }.apply(&mut engine).unwrap();
        Command::Draw { mode: Some("land".to_string()) }.apply(&mut engine).unwrap();
    }
}
