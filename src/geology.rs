//! Per-tile plate-tectonic state: tension and magma buildup, asymptotic
//! toward 1.0 and never reaching it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GeologyKind {
    Divergent,
    Subducting,
    Orogenic,
    Transform,
    Inactive,
}

impl GeologyKind {
    /// `(base_magma_buildup, base_tension_buildup)` for the hardcoded
    /// world-1 geology table.
    fn buildup_constants(self) -> (f64, f64) {
        match self {
            GeologyKind::Divergent => (0.001, 0.000),
            GeologyKind::Subducting => (0.002, 0.002),
            GeologyKind::Orogenic => (0.000, 0.002),
            GeologyKind::Transform => (0.000, 0.003),
            GeologyKind::Inactive => (0.000, 0.000),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Geology {
    pub kind: GeologyKind,
    pub plate_movement: f64,
    pub tension: f64,
    pub magma: f64,
}

impl Geology {
    pub fn new(kind: GeologyKind, plate_movement: f64) -> Self {
        let plate_movement = if matches!(kind, GeologyKind::Inactive) { 0.0 } else { plate_movement };
        Self { kind, plate_movement, tension: 0.0, magma: 0.0 }
    }

    /// `x' = x + (1 - x) * (base_x * plate_movement)`.
    pub fn cycle(&mut self) {
        let (base_magma, base_tension) = self.kind.buildup_constants();
        self.magma += (1.0 - self.magma) * (base_magma * self.plate_movement);
        self.tension += (1.0 - self.tension) * (base_tension * self.plate_movement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_never_builds_up() {
        let mut g = Geology::new(GeologyKind::Inactive, 5.0);
        assert_eq!(g.plate_movement, 0.0);
        for _ in 0..10_000 {
            g.cycle();
        }
        assert_eq!(g.tension, 0.0);
        assert_eq!(g.magma, 0.0);
    }

    #[test]
    fn active_geology_asymptotes_below_one() {
        let mut g = Geology::new(GeologyKind::Subducting, 1.0);
        for _ in 0..10_000 {
            g.cycle();
        }
        assert!(g.tension < 1.0);
        assert!(g.magma < 1.0);
        assert!(g.tension > 0.0);
        assert!(g.magma > 0.0);
    }

    #[test]
    fn buildup_is_monotonic() {
        let mut g = Geology::new(GeologyKind::Divergent, 2.0);
        let mut prev_magma = g.magma;
        for _ in 0..1000 {
            g.cycle();
            assert!(g.magma >= prev_magma);
            prev_magma = g.magma;
        }
    }
}
