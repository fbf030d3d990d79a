//! Explicit startup configuration, threaded as a value rather than held
//! behind a global singleton.

use serde::{Deserialize, Serialize};

use crate::error::ProgramError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldConfig {
    Hardcoded(u32),
    Random,
    File(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceConfig(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub caster_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    interface_config: InterfaceConfig,
    world_config: WorldConfig,
    player_config: PlayerConfig,
}

impl Configuration {
    /// Constructs the configuration once, explicitly. Only
    /// `WorldConfig::Hardcoded(1)` is implemented; the other variants are
    /// represented but rejected here since random and file-loaded worlds
    /// aren't implemented yet.
    pub fn create(
        interface_config: InterfaceConfig,
        world_config: WorldConfig,
        player_config: PlayerConfig,
    ) -> Result<Self, ProgramError> {
        match &world_config {
            WorldConfig::Hardcoded(_) => {}
            WorldConfig::Random => {
                return Err(ProgramError::UnsupportedWorldConfig("random world generation".into()));
            }
            WorldConfig::File(path) => {
                return Err(ProgramError::UnsupportedWorldConfig(format!("world file {path}")));
            }
        }
        Ok(Self { interface_config, world_config, player_config })
    }

    pub fn interface_config(&self) -> &InterfaceConfig {
        &self.interface_config
    }

    pub fn world_config(&self) -> &WorldConfig {
        &self.world_config
    }

    pub fn player_config(&self) -> &PlayerConfig {
        &self.player_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardcoded_world_config_succeeds() {
        let cfg = Configuration::create(
            InterfaceConfig("text".to_string()),
            WorldConfig::Hardcoded(1),
            PlayerConfig { caster_name: "Baal".to_string() },
        );
        assert!(cfg.is_ok());
    }

    #[test]
    fn random_world_config_is_not_yet_supported() {
        let cfg = Configuration::create(
            InterfaceConfig("text".to_string()),
            WorldConfig::Random,
            PlayerConfig { caster_name: "Baal".to_string() },
        );
        assert!(matches!(cfg, Err(ProgramError::UnsupportedWorldConfig(_))));
    }

    #[test]
    fn file_world_config_is_not_yet_supported() {
        let cfg = Configuration::create(
            InterfaceConfig("text".to_string()),
            WorldConfig::File("foo.baalmap".to_string()),
            PlayerConfig { caster_name: "Baal".to_string() },
        );
        assert!(matches!(cfg, Err(ProgramError::UnsupportedWorldConfig(_))));
    }
}
