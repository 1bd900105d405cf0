use serde::{Deserialize, Serialize};

/// Errors from kernel operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("invalid generation config: {0}")]
    InvalidConfig(String),
}

/// Inclusive integer range used for per-parent object counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Closed floating point range used for sampled physical quantities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Parameters controlling procedural generation.
///
/// Defaults: 200 galaxies, 10-200 stars, 0-15 planets per star, 0-3 black
/// holes, 0-5 nebulae, 50-200 asteroids, 10-50 comets per galaxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub galaxy_count: u32,
    pub stars_per_galaxy: CountRange,
    pub planets_per_star: CountRange,
    pub black_holes_per_galaxy: CountRange,
    pub nebulae_per_galaxy: CountRange,
    pub asteroids_per_galaxy: CountRange,
    pub comets_per_galaxy: CountRange,
    /// Base mass range, in arbitrary mass units.
    pub mass: ValueRange,
    /// Base temperature range, in Kelvin.
    pub temperature: ValueRange,
    /// Probability that a planet harbors life.
    pub life_probability: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            galaxy_count: 200,
            stars_per_galaxy: CountRange::new(10, 200),
            planets_per_star: CountRange::new(0, 15),
            black_holes_per_galaxy: CountRange::new(0, 3),
            nebulae_per_galaxy: CountRange::new(0, 5),
            asteroids_per_galaxy: CountRange::new(50, 200),
            comets_per_galaxy: CountRange::new(10, 50),
            mass: ValueRange::new(1e20, 1e40),
            temperature: ValueRange::new(2.0, 1e7),
            life_probability: 0.0005,
        }
    }
}

impl GenerationConfig {
    /// A small universe, handy for tests and demos.
    pub fn small() -> Self {
        Self {
            galaxy_count: 3,
            stars_per_galaxy: CountRange::new(2, 6),
            planets_per_star: CountRange::new(0, 4),
            asteroids_per_galaxy: CountRange::new(3, 8),
            comets_per_galaxy: CountRange::new(1, 4),
            ..Self::default()
        }
    }

    /// Check ranges and probabilities.
    pub fn validate(&self) -> Result<(), KernelError> {
        let counts = [
            ("stars_per_galaxy", self.stars_per_galaxy),
            ("planets_per_star", self.planets_per_star),
            ("black_holes_per_galaxy", self.black_holes_per_galaxy),
            ("nebulae_per_galaxy", self.nebulae_per_galaxy),
            ("asteroids_per_galaxy", self.asteroids_per_galaxy),
            ("comets_per_galaxy", self.comets_per_galaxy),
        ];
        for (name, range) in counts {
            if range.min > range.max {
                return Err(KernelError::InvalidConfig(format!(
                    "{name}: min {} exceeds max {}",
                    range.min, range.max
                )));
            }
        }
        for (name, range) in [("mass", self.mass), ("temperature", self.temperature)] {
            if !range.min.is_finite() || !range.max.is_finite() {
                return Err(KernelError::InvalidConfig(format!(
                    "{name}: bounds must be finite"
                )));
            }
            if range.min > range.max {
                return Err(KernelError::InvalidConfig(format!(
                    "{name}: min {} exceeds max {}",
                    range.min, range.max
                )));
            }
            // The sampler scales the span up slightly; keep it well below f64::MAX.
            let span = range.max - range.min;
            if !(span.is_finite() && span < f64::MAX / 2.0) {
                return Err(KernelError::InvalidConfig(format!(
                    "{name}: range {}..={} is too wide",
                    range.min, range.max
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.life_probability) {
            return Err(KernelError::InvalidConfig(format!(
                "life_probability {} outside [0, 1]",
                self.life_probability
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GenerationConfig::default().validate().unwrap();
        GenerationConfig::small().validate().unwrap();
    }

    #[test]
    fn inverted_count_range_rejected() {
        let cfg = GenerationConfig {
            comets_per_galaxy: CountRange::new(5, 1),
            ..GenerationConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("comets_per_galaxy"));
    }

    #[test]
    fn non_finite_mass_rejected() {
        let cfg = GenerationConfig {
            mass: ValueRange::new(1.0, f64::INFINITY),
            ..GenerationConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn overflowing_span_rejected() {
        let cfg = GenerationConfig {
            mass: ValueRange::new(-f64::MAX, f64::MAX),
            ..GenerationConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("too wide"));

        let cfg = GenerationConfig {
            temperature: ValueRange::new(-f64::MAX, 0.0),
            ..GenerationConfig::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = GenerationConfig {
            temperature: ValueRange::new(0.0, f64::MAX / 4.0),
            ..GenerationConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn probability_bounds() {
        let mut cfg = GenerationConfig {
            life_probability: 1.5,
            ..GenerationConfig::default()
        };
        assert!(cfg.validate().is_err());
        cfg.life_probability = f64::NAN;
        assert!(cfg.validate().is_err());
        cfg.life_probability = 1.0;
        assert!(cfg.validate().is_ok());
    }
}
