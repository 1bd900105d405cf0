use cosmos_common::{Composition, ObjectCode, ObjectKind, SpectralType};
use serde::{Deserialize, Serialize};

/// A planet orbiting a star.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub code: ObjectCode,
    pub mass: f64,
    pub temperature: f64,
    pub has_life: bool,
    pub minerals: Composition,
}

/// A star and its planetary system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub code: ObjectCode,
    pub mass: f64,
    pub temperature: f64,
    pub spectral_type: SpectralType,
    pub planets: Vec<Planet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackHole {
    pub code: ObjectCode,
    pub mass: f64,
    /// Dimensionless spin parameter in `[0, 1)`.
    pub spin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nebula {
    pub code: ObjectCode,
    pub mass: f64,
    pub temperature: f64,
    pub composition: Composition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asteroid {
    pub code: ObjectCode,
    pub mass: f64,
    pub composition: Composition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comet {
    pub code: ObjectCode,
    pub mass: f64,
    pub tail_length_km: f64,
}

/// A galaxy and everything it contains.
///
/// Each collection is stored in index order, so the object with code
/// `G{g}-S{i}` lives at `stars[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Galaxy {
    pub code: ObjectCode,
    pub stars: Vec<Star>,
    pub black_holes: Vec<BlackHole>,
    pub nebulae: Vec<Nebula>,
    pub asteroids: Vec<Asteroid>,
    pub comets: Vec<Comet>,
}

impl Galaxy {
    pub fn planet_count(&self) -> usize {
        self.stars.iter().map(|s| s.planets.len()).sum()
    }

    /// Total number of objects in the galaxy, the galaxy itself excluded.
    pub fn object_count(&self) -> usize {
        self.stars.len()
            + self.planet_count()
            + self.black_holes.len()
            + self.nebulae.len()
            + self.asteroids.len()
            + self.comets.len()
    }

    /// Sum of every contained object's mass.
    pub fn total_mass(&self) -> f64 {
        let stars: f64 = self
            .stars
            .iter()
            .map(|s| s.mass + s.planets.iter().map(|p| p.mass).sum::<f64>())
            .sum();
        stars
            + self.black_holes.iter().map(|b| b.mass).sum::<f64>()
            + self.nebulae.iter().map(|n| n.mass).sum::<f64>()
            + self.asteroids.iter().map(|a| a.mass).sum::<f64>()
            + self.comets.iter().map(|c| c.mass).sum::<f64>()
    }
}

/// Borrowed view of any object in the universe.
#[derive(Debug, Clone, Copy)]
pub enum CelestialRef<'a> {
    Galaxy(&'a Galaxy),
    Star(&'a Star),
    Planet(&'a Planet),
    BlackHole(&'a BlackHole),
    Nebula(&'a Nebula),
    Asteroid(&'a Asteroid),
    Comet(&'a Comet),
}

impl CelestialRef<'_> {
    pub fn code(&self) -> ObjectCode {
        match self {
            Self::Galaxy(g) => g.code,
            Self::Star(s) => s.code,
            Self::Planet(p) => p.code,
            Self::BlackHole(b) => b.code,
            Self::Nebula(n) => n.code,
            Self::Asteroid(a) => a.code,
            Self::Comet(c) => c.code,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.code().kind()
    }

    /// Mass of the object itself. For a galaxy this is the sum of its contents.
    pub fn mass(&self) -> f64 {
        match self {
            Self::Galaxy(g) => g.total_mass(),
            Self::Star(s) => s.mass,
            Self::Planet(p) => p.mass,
            Self::BlackHole(b) => b.mass,
            Self::Nebula(n) => n.mass,
            Self::Asteroid(a) => a.mass,
            Self::Comet(c) => c.mass,
        }
    }

    /// Mineral composition, for bodies that carry one.
    pub fn composition(&self) -> Option<&Composition> {
        match self {
            Self::Planet(p) => Some(&p.minerals),
            Self::Nebula(n) => Some(&n.composition),
            Self::Asteroid(a) => Some(&a.composition),
            _ => None,
        }
    }
}
