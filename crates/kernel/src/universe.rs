use cosmos_common::{ObjectCode, ObjectKind};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{GenerationConfig, KernelError};
use crate::generate::generate_galaxy;
use crate::model::{CelestialRef, Galaxy, Planet};

/// The authoritative universe: every galaxy, generated from one seed.
///
/// `galaxies[i]` always carries code `G{i}`, so lookup by code is a chain of
/// vector indexing with no search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    seed: u64,
    config: GenerationConfig,
    galaxies: Vec<Galaxy>,
}

/// Object counts and aggregate figures for a universe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniverseStats {
    pub galaxies: usize,
    pub stars: usize,
    pub planets: usize,
    pub black_holes: usize,
    pub nebulae: usize,
    pub asteroids: usize,
    pub comets: usize,
    pub inhabited_planets: usize,
    pub total_mass: f64,
}

impl UniverseStats {
    pub fn count(&self, kind: ObjectKind) -> usize {
        match kind {
            ObjectKind::Galaxy => self.galaxies,
            ObjectKind::Star => self.stars,
            ObjectKind::Planet => self.planets,
            ObjectKind::BlackHole => self.black_holes,
            ObjectKind::Nebula => self.nebulae,
            ObjectKind::Asteroid => self.asteroids,
            ObjectKind::Comet => self.comets,
        }
    }

    pub fn total_objects(&self) -> usize {
        ObjectKind::ALL.iter().map(|k| self.count(*k)).sum()
    }
}

impl fmt::Display for UniverseStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "galaxies={} stars={} planets={} black_holes={} nebulae={} asteroids={} comets={} inhabited={} mass={:.3e}",
            self.galaxies,
            self.stars,
            self.planets,
            self.black_holes,
            self.nebulae,
            self.asteroids,
            self.comets,
            self.inhabited_planets,
            self.total_mass
        )
    }
}

impl Universe {
    /// Generate a universe from a seed and a validated configuration.
    pub fn generate(seed: u64, config: GenerationConfig) -> Result<Self, KernelError> {
        config.validate()?;
        let _span = tracing::info_span!("generate", seed, galaxies = config.galaxy_count).entered();
        let galaxies = (0..config.galaxy_count)
            .map(|g| generate_galaxy(seed, g, &config))
            .collect();
        let universe = Self {
            seed,
            config,
            galaxies,
        };
        tracing::debug!(stats = %universe.stats(), "universe generated");
        Ok(universe)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn galaxies(&self) -> &[Galaxy] {
        &self.galaxies
    }

    pub fn galaxy(&self, index: u32) -> Option<&Galaxy> {
        self.galaxies.get(index as usize)
    }

    /// Resolve a reference code to the object it names.
    pub fn find(&self, code: &ObjectCode) -> Option<CelestialRef<'_>> {
        let galaxy = self.galaxy(code.galaxy())?;
        let found = match *code {
            ObjectCode::Galaxy { .. } => CelestialRef::Galaxy(galaxy),
            ObjectCode::Star { star, .. } => CelestialRef::Star(galaxy.stars.get(star as usize)?),
            ObjectCode::Planet { star, planet, .. } => CelestialRef::Planet(
                galaxy
                    .stars
                    .get(star as usize)?
                    .planets
                    .get(planet as usize)?,
            ),
            ObjectCode::BlackHole { index, .. } => {
                CelestialRef::BlackHole(galaxy.black_holes.get(index as usize)?)
            }
            ObjectCode::Nebula { index, .. } => {
                CelestialRef::Nebula(galaxy.nebulae.get(index as usize)?)
            }
            ObjectCode::Asteroid { index, .. } => {
                CelestialRef::Asteroid(galaxy.asteroids.get(index as usize)?)
            }
            ObjectCode::Comet { index, .. } => {
                CelestialRef::Comet(galaxy.comets.get(index as usize)?)
            }
        };
        Some(found)
    }

    pub fn contains(&self, code: &ObjectCode) -> bool {
        self.find(code).is_some()
    }

    /// Direct children of an object, in canonical order. `None` if the code
    /// does not exist.
    pub fn children(&self, code: &ObjectCode) -> Option<Vec<ObjectCode>> {
        let children = match self.find(code)? {
            CelestialRef::Galaxy(g) => g
                .stars
                .iter()
                .map(|s| s.code)
                .chain(g.black_holes.iter().map(|b| b.code))
                .chain(g.nebulae.iter().map(|n| n.code))
                .chain(g.asteroids.iter().map(|a| a.code))
                .chain(g.comets.iter().map(|c| c.code))
                .collect(),
            CelestialRef::Star(s) => s.planets.iter().map(|p| p.code).collect(),
            _ => Vec::new(),
        };
        Some(children)
    }

    /// Every planet that harbors life, in canonical order.
    pub fn inhabited_planets(&self) -> impl Iterator<Item = &Planet> + '_ {
        self.galaxies
            .iter()
            .flat_map(|g| g.stars.iter())
            .flat_map(|s| s.planets.iter())
            .filter(|p| p.has_life)
    }

    pub fn stats(&self) -> UniverseStats {
        let mut stats = UniverseStats {
            galaxies: self.galaxies.len(),
            ..UniverseStats::default()
        };
        for g in &self.galaxies {
            stats.stars += g.stars.len();
            stats.planets += g.planet_count();
            stats.black_holes += g.black_holes.len();
            stats.nebulae += g.nebulae.len();
            stats.asteroids += g.asteroids.len();
            stats.comets += g.comets.len();
            stats.total_mass += g.total_mass();
        }
        stats.inhabited_planets = self.inhabited_planets().count();
        stats
    }

    /// Deterministic FNV-1a hash over every code and numeric field, in
    /// canonical order. Equal universes always hash equal.
    pub fn state_hash(&self) -> u64 {
        let mut h = Fnv::new();
        h.u64(self.seed);
        h.u64(self.galaxies.len() as u64);
        for g in &self.galaxies {
            h.code(&g.code);
            for s in &g.stars {
                h.code(&s.code);
                h.f64(s.mass);
                h.f64(s.temperature);
                h.bytes(&[s.spectral_type.letter() as u8]);
                for p in &s.planets {
                    h.code(&p.code);
                    h.f64(p.mass);
                    h.f64(p.temperature);
                    h.bytes(&[u8::from(p.has_life)]);
                    p.minerals.fractions().iter().for_each(|f| h.f64(*f));
                }
            }
            for b in &g.black_holes {
                h.code(&b.code);
                h.f64(b.mass);
                h.f64(b.spin);
            }
            for n in &g.nebulae {
                h.code(&n.code);
                h.f64(n.mass);
                h.f64(n.temperature);
                n.composition.fractions().iter().for_each(|f| h.f64(*f));
            }
            for a in &g.asteroids {
                h.code(&a.code);
                h.f64(a.mass);
                a.composition.fractions().iter().for_each(|f| h.f64(*f));
            }
            for c in &g.comets {
                h.code(&c.code);
                h.f64(c.mass);
                h.f64(c.tail_length_km);
            }
        }
        h.finish()
    }
}

struct Fnv(u64);

impl Fnv {
    fn new() -> Self {
        Self(0xcbf2_9ce4_8422_2325)
    }

    fn bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= u64::from(b);
            self.0 = self.0.wrapping_mul(0x0100_0000_01b3);
        }
    }

    fn u64(&mut self, v: u64) {
        self.bytes(&v.to_le_bytes());
    }

    fn f64(&mut self, v: f64) {
        self.u64(v.to_bits());
    }

    fn code(&mut self, code: &ObjectCode) {
        self.bytes(code.to_string().as_bytes());
    }

    fn finish(&self) -> u64 {
        self.0
    }
}
