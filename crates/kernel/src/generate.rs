//! Procedural generation of galaxies and their contents.
//!
//! Each galaxy draws from its own `StdRng`, seeded from the universe seed
//! and the galaxy index. Within a galaxy the draw order is fixed: stars (each
//! immediately followed by its planets), black holes, nebulae, asteroids,
//! comets.

use cosmos_common::{Composition, MINERAL_COUNT, ObjectCode, SpectralType};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{CountRange, GenerationConfig};
use crate::model::{Asteroid, BlackHole, Comet, Galaxy, Nebula, Planet, Star};

/// Seed used when none is supplied.
pub const DEFAULT_SEED: u64 = 42;

const BLACK_HOLE_MASS_FACTOR: f64 = 1e3;
const NEBULA_SCALE: f64 = 10.0;
const ASTEROID_MASS_DIVISOR: f64 = 1e3;
const COMET_MASS_DIVISOR: f64 = 1e6;
const COMET_TAIL_KM: (f64, f64) = (1e3, 1e5);

/// Derive the RNG seed for a single galaxy.
pub fn galaxy_seed(seed: u64, galaxy: u32) -> u64 {
    splitmix64(seed ^ splitmix64(u64::from(galaxy)))
}

/// Generate galaxy `index`. `config` must already be validated.
pub fn generate_galaxy(seed: u64, index: u32, config: &GenerationConfig) -> Galaxy {
    let mut rng = StdRng::seed_from_u64(galaxy_seed(seed, index));
    let mut sampler = Sampler {
        rng: &mut rng,
        config,
    };

    let star_count = sampler.count(config.stars_per_galaxy);
    let stars = (0..star_count)
        .map(|star| sampler.star(index, star))
        .collect();

    let bh_count = sampler.count(config.black_holes_per_galaxy);
    let black_holes = (0..bh_count)
        .map(|i| BlackHole {
            code: ObjectCode::BlackHole {
                galaxy: index,
                index: i,
            },
            mass: sampler.mass() * BLACK_HOLE_MASS_FACTOR,
            spin: sampler.rng.random::<f64>(),
        })
        .collect();

    let nebula_count = sampler.count(config.nebulae_per_galaxy);
    let nebulae = (0..nebula_count)
        .map(|i| Nebula {
            code: ObjectCode::Nebula {
                galaxy: index,
                index: i,
            },
            mass: sampler.mass() / NEBULA_SCALE,
            temperature: sampler.temperature() / NEBULA_SCALE,
            composition: sampler.composition(),
        })
        .collect();

    let asteroid_count = sampler.count(config.asteroids_per_galaxy);
    let asteroids = (0..asteroid_count)
        .map(|i| Asteroid {
            code: ObjectCode::Asteroid {
                galaxy: index,
                index: i,
            },
            mass: sampler.mass() / ASTEROID_MASS_DIVISOR,
            composition: sampler.composition(),
        })
        .collect();

    let comet_count = sampler.count(config.comets_per_galaxy);
    let comets = (0..comet_count)
        .map(|i| Comet {
            code: ObjectCode::Comet {
                galaxy: index,
                index: i,
            },
            mass: sampler.mass() / COMET_MASS_DIVISOR,
            tail_length_km: sampler.rng.random_range(COMET_TAIL_KM.0..=COMET_TAIL_KM.1),
        })
        .collect();

    let galaxy = Galaxy {
        code: ObjectCode::Galaxy { galaxy: index },
        stars,
        black_holes,
        nebulae,
        asteroids,
        comets,
    };
    tracing::trace!(
        galaxy = index,
        objects = galaxy.object_count(),
        "generated galaxy"
    );
    galaxy
}

struct Sampler<'a> {
    rng: &'a mut StdRng,
    config: &'a GenerationConfig,
}

impl Sampler<'_> {
    fn count(&mut self, range: CountRange) -> u32 {
        self.rng.random_range(range.min..=range.max)
    }

    fn mass(&mut self) -> f64 {
        let r = self.config.mass;
        self.rng.random_range(r.min..=r.max)
    }

    fn temperature(&mut self) -> f64 {
        let r = self.config.temperature;
        self.rng.random_range(r.min..=r.max)
    }

    fn composition(&mut self) -> Composition {
        let mut weights = [0.0; MINERAL_COUNT];
        for w in &mut weights {
            // (0, 1] keeps the total strictly positive.
            *w = 1.0 - self.rng.random::<f64>();
        }
        Composition::from_weights(weights).unwrap_or_else(|_| Composition::uniform())
    }

    fn star(&mut self, galaxy: u32, star: u32) -> Star {
        let mass = self.mass();
        let temperature = self.temperature();
        let spectral_type = SpectralType::ALL[self.rng.random_range(0..SpectralType::ALL.len())];
        let planet_count = self.count(self.config.planets_per_star);
        let planets = (0..planet_count)
            .map(|planet| Planet {
                code: ObjectCode::Planet {
                    galaxy,
                    star,
                    planet,
                },
                mass: self.mass(),
                temperature: self.temperature(),
                has_life: self.rng.random_bool(self.config.life_probability),
                minerals: self.composition(),
            })
            .collect();
        Star {
            code: ObjectCode::Star { galaxy, star },
            mass,
            temperature,
            spectral_type,
            planets,
        }
    }
}

/// Splitmix64 step function, used to decorrelate per-galaxy seeds.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
