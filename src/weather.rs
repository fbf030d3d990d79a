//! Per-season climate baselines, per-turn atmospheric state, and the
//! stochastic anomaly generator that perturbs them.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::location::{Direction, Location, Wind};
use crate::time::Season;

/// Four-entry-per-season baselines for a single tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Climate {
    pub temperature: [f64; 4],
    pub precip: [f64; 4],
    pub wind: [Wind; 4],
}

impl Climate {
    pub fn new(temperature: [f64; 4], precip: [f64; 4], wind: [Wind; 4]) -> Self {
        Self { temperature, precip, wind }
    }

    pub fn temperature_at(&self, season: Season) -> f64 {
        self.temperature[season.index()]
    }

    pub fn precip_at(&self, season: Season) -> f64 {
        self.precip[season.index()]
    }

    pub fn wind_at(&self, season: Season) -> Wind {
        self.wind[season.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyCategory {
    Temperature,
    Precip,
    Pressure,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Anomaly {
    pub category: AnomalyCategory,
    pub intensity: i32,
    pub location: Location,
}

impl Anomaly {
    pub const MAX_INTENSITY: i32 = 3;
    const POSITIVE_ANOM: f64 = 0.97;

    pub fn temp_effect(&self, loc: Location) -> f64 {
        if loc != self.location || self.category != AnomalyCategory::Temperature {
            return 0.0;
        }
        7.0 * self.intensity as f64
    }

    pub fn pressure_effect(&self, loc: Location) -> f64 {
        if loc != self.location || self.category != AnomalyCategory::Pressure {
            return 0.0;
        }
        15.0 * self.intensity as f64
    }

    pub fn precip_effect(&self, loc: Location) -> f64 {
        if loc != self.location || self.category != AnomalyCategory::Precip {
            return 0.0;
        }
        (2.0f64 / 3.0).powi(self.intensity)
    }

    /// Draws a fresh anomaly for `(category, location)` this turn, or
    /// `None` if the roll lands in the dead zone.
    pub fn roll(rng: &mut impl Rng, category: AnomalyCategory, location: Location) -> Option<Anomaly> {
        let roll: f64 = rng.gen_range(0.0..1.0);
        let mut p = 1.0 - Self::POSITIVE_ANOM;
        let (sign, mut roll) = if roll > Self::POSITIVE_ANOM {
            (1i32, roll - Self::POSITIVE_ANOM)
        } else if roll < p {
            (-1i32, roll)
        } else {
            return None;
        };
        let mut intensity = 0i32;
        while roll < p && intensity.unsigned_abs() < Self::MAX_INTENSITY as u32 {
            intensity += sign;
            p /= 2.0;
            if roll >= p {
                break;
            }
        }
        if intensity == 0 { None } else { Some(Anomaly { category, intensity, location }) }
    }
}

/// Per-tile mutable weather, recomputed from `Climate` and the turn's
/// anomalies each cycle. Spells may override `temperature`/`wind`
/// directly; those overrides persist only until the next `cycle`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atmosphere {
    pub temperature: f64,
    pub dewpoint: f64,
    pub precip: f64,
    pub pressure: f64,
    pub wind: Wind,
}

impl Atmosphere {
    pub const DEFAULT_PRESSURE: f64 = 1000.0;

    pub fn cycle(&mut self, climate: &Climate, season: Season, location: Location, anomalies: &[Anomaly]) {
        let precip_modifier: f64 = anomalies.iter().map(|a| a.precip_effect(location)).fold(1.0, |acc, m| {
            if m == 0.0 { acc } else { acc * m }
        });
        let temp_delta: f64 = anomalies.iter().map(|a| a.temp_effect(location)).sum();
        let pressure_delta: f64 = anomalies.iter().map(|a| a.pressure_effect(location)).sum();

        self.temperature = climate.temperature_at(season) + temp_delta;
        self.pressure = Self::DEFAULT_PRESSURE + pressure_delta;
        self.precip = climate.precip_at(season) * precip_modifier;
        self.dewpoint = self.temperature - 20.0;
        self.wind = climate.wind_at(season);
    }
}

impl Default for Atmosphere {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            dewpoint: -20.0,
            precip: 0.0,
            pressure: Self::DEFAULT_PRESSURE,
            wind: Wind::new(0.0, Direction::N),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn flat_climate(temp: f64, precip: f64, wind_speed: f64) -> Climate {
        Climate::new(
            [temp; 4],
            [precip; 4],
            [Wind::new(wind_speed, Direction::N); 4],
        )
    }

    #[test]
    fn cycle_with_no_anomalies_reproduces_climate() {
        for season in Season::ALL {
            let climate = flat_climate(50.0, 2.0, 10.0);
            let mut atmo = Atmosphere::default();
            atmo.cycle(&climate, season, Location::new(0, 0), &[]);
            assert_eq!(atmo.temperature, 50.0);
            assert_eq!(atmo.precip, 2.0);
            assert_eq!(atmo.dewpoint, 30.0);
            assert_eq!(atmo.pressure, 1000.0);
        }
    }

    #[test]
    fn anomaly_only_affects_its_own_location() {
        let anomaly = Anomaly { category: AnomalyCategory::Temperature, intensity: 2, location: Location::new(1, 1) };
        assert_eq!(anomaly.temp_effect(Location::new(1, 1)), 14.0);
        assert_eq!(anomaly.temp_effect(Location::new(0, 0)), 0.0);
    }

    #[test]
    fn rolled_anomalies_never_have_zero_intensity() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..5000 {
            if let Some(a) = Anomaly::roll(&mut rng, AnomalyCategory::Temperature, Location::new(0, 0)) {
                assert!(a.intensity != 0);
                assert!(a.intensity.abs() <= Anomaly::MAX_INTENSITY);
            }
        }
    }

    #[test]
    fn precip_anomaly_reduces_precip_for_positive_intensity() {
        let anomaly = Anomaly { category: AnomalyCategory::Precip, intensity: 1, location: Location::new(0, 0) };
        assert!(anomaly.precip_effect(Location::new(0, 0)) < 1.0);
    }
}
