use cosmos_common::{Composition, Mineral, ObjectCode, ObjectKind, SpectralType};
use cosmos_kernel::{CelestialRef, Universe, UniverseStats};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Universe inspector for developer tooling and navigation.
///
/// Provides read-only queries against the universe for the CLI, the REPL
/// and the network server.
pub struct UniverseInspector;

impl UniverseInspector {
    /// Produce a summary of the universe.
    pub fn summary(universe: &Universe) -> UniverseSummary {
        UniverseSummary {
            seed: universe.seed(),
            stats: universe.stats(),
        }
    }

    /// Describe one object as ordered `(field, value)` pairs.
    pub fn describe(universe: &Universe, code: &ObjectCode) -> Option<ObjectInfo> {
        let object = universe.find(code)?;
        let mut fields = Vec::new();
        let mut push = |k: &str, v: String| fields.push((k.to_string(), v));

        match object {
            CelestialRef::Galaxy(g) => {
                push("stars", g.stars.len().to_string());
                push("planets", g.planet_count().to_string());
                push("black holes", g.black_holes.len().to_string());
                push("nebulae", g.nebulae.len().to_string());
                push("asteroids", g.asteroids.len().to_string());
                push("comets", g.comets.len().to_string());
                let inhabited = g
                    .stars
                    .iter()
                    .flat_map(|s| s.planets.iter())
                    .filter(|p| p.has_life)
                    .count();
                push("inhabited planets", inhabited.to_string());
                push("total mass", sci(g.total_mass()));
            }
            CelestialRef::Star(s) => {
                push("spectral type", s.spectral_type.to_string());
                push("mass", sci(s.mass));
                push("temperature", kelvin(s.temperature));
                push("planets", s.planets.len().to_string());
                let inhabited = s.planets.iter().filter(|p| p.has_life).count();
                push("inhabited planets", inhabited.to_string());
            }
            CelestialRef::Planet(p) => {
                push("mass", sci(p.mass));
                push("temperature", kelvin(p.temperature));
                push("life", if p.has_life { "yes" } else { "no" }.to_string());
                push_composition(&mut push, &p.minerals);
            }
            CelestialRef::BlackHole(b) => {
                push("mass", sci(b.mass));
                push("spin", format!("{:.4}", b.spin));
            }
            CelestialRef::Nebula(n) => {
                push("mass", sci(n.mass));
                push("temperature", kelvin(n.temperature));
                push_composition(&mut push, &n.composition);
            }
            CelestialRef::Asteroid(a) => {
                push("mass", sci(a.mass));
                push_composition(&mut push, &a.composition);
            }
            CelestialRef::Comet(c) => {
                push("mass", sci(c.mass));
                push("tail length", format!("{:.0} km", c.tail_length_km));
            }
        }

        Some(ObjectInfo {
            code: *code,
            kind: code.kind(),
            fields,
        })
    }

    /// Direct children of an object with a one-line blurb each.
    pub fn list_children(universe: &Universe, code: &ObjectCode) -> Option<Vec<ChildEntry>> {
        let children = universe.children(code)?;
        Some(
            children
                .into_iter()
                .filter_map(|child| universe.find(&child).map(entry))
                .collect(),
        )
    }

    /// One entry per galaxy.
    pub fn list_galaxies(universe: &Universe) -> Vec<ChildEntry> {
        universe
            .galaxies()
            .iter()
            .map(|g| entry(CelestialRef::Galaxy(g)))
            .collect()
    }

    /// Inhabited planets, optionally restricted to a galaxy or star.
    pub fn find_life(universe: &Universe, scope: Option<&ObjectCode>) -> Vec<ObjectCode> {
        universe
            .inhabited_planets()
            .map(|p| p.code)
            .filter(|c| scope.is_none_or(|s| c.is_within(s)))
            .collect()
    }

    /// Stars of a given spectral type, optionally restricted to a galaxy.
    pub fn find_spectral(
        universe: &Universe,
        spectral: SpectralType,
        scope: Option<&ObjectCode>,
    ) -> Vec<ObjectCode> {
        universe
            .galaxies()
            .iter()
            .filter(|g| scope.is_none_or(|s| s.galaxy() == g.code.galaxy()))
            .flat_map(|g| g.stars.iter())
            .filter(|s| s.spectral_type == spectral)
            .map(|s| s.code)
            .filter(|c| scope.is_none_or(|s| c.is_within(s)))
            .collect()
    }

    /// Bodies (planets, nebulae, asteroids) with the highest fraction of a
    /// mineral, best first. Ties are broken by code.
    pub fn richest(universe: &Universe, mineral: Mineral, limit: usize) -> Vec<(ObjectCode, f64)> {
        let _span = tracing::debug_span!("richest", %mineral, limit).entered();
        let mut hits: Vec<(ObjectCode, f64)> = Vec::new();
        for g in universe.galaxies() {
            for s in &g.stars {
                hits.extend(s.planets.iter().map(|p| (p.code, p.minerals.fraction(mineral))));
            }
            hits.extend(
                g.nebulae
                    .iter()
                    .map(|n| (n.code, n.composition.fraction(mineral))),
            );
            hits.extend(
                g.asteroids
                    .iter()
                    .map(|a| (a.code, a.composition.fraction(mineral))),
            );
        }
        hits.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        hits.truncate(limit);
        hits
    }
}

fn push_composition(push: &mut impl FnMut(&str, String), composition: &Composition) {
    push("dominant mineral", composition.dominant().to_string());
    let parts: Vec<String> = composition
        .iter()
        .map(|(m, f)| format!("{m} {:.1}%", f * 100.0))
        .collect();
    push("composition", parts.join(", "));
}

fn entry(object: CelestialRef<'_>) -> ChildEntry {
    let blurb = match object {
        CelestialRef::Galaxy(g) => format!("{} stars, {} objects", g.stars.len(), g.object_count()),
        CelestialRef::Star(s) => format!("{}-type, {} planets", s.spectral_type, s.planets.len()),
        CelestialRef::Planet(p) => format!(
            "{}, {}-rich{}",
            kelvin(p.temperature),
            p.minerals.dominant(),
            if p.has_life { ", life" } else { "" }
        ),
        CelestialRef::BlackHole(b) => format!("mass {}, spin {:.2}", sci(b.mass), b.spin),
        CelestialRef::Nebula(n) => {
            format!("{}, {}-rich", kelvin(n.temperature), n.composition.dominant())
        }
        CelestialRef::Asteroid(a) => {
            format!("mass {}, {}-rich", sci(a.mass), a.composition.dominant())
        }
        CelestialRef::Comet(c) => format!("tail {:.0} km", c.tail_length_km),
    };
    ChildEntry {
        code: object.code(),
        kind: object.kind(),
        blurb,
    }
}

fn sci(v: f64) -> String {
    format!("{v:.3e}")
}

fn kelvin(v: f64) -> String {
    format!("{v:.0} K")
}

/// Summary of the universe for the inspector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseSummary {
    pub seed: u64,
    pub stats: UniverseStats,
}

impl fmt::Display for UniverseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Universe: seed={}", self.seed)?;
        for kind in ObjectKind::ALL {
            writeln!(f, "  {:<12} {}", kind.label(), self.stats.count(kind))?;
        }
        writeln!(f, "  {:<12} {}", "inhabited", self.stats.inhabited_planets)?;
        write!(f, "  {:<12} {:.3e}", "total mass", self.stats.total_mass)
    }
}

/// Detailed info about a single object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub code: ObjectCode,
    pub kind: ObjectKind,
    pub fields: Vec<(String, String)>,
}

impl ObjectInfo {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for ObjectInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code, self.kind)?;
        for (k, v) in &self.fields {
            write!(f, "\n  {k:<18} {v}")?;
        }
        Ok(())
    }
}

/// A child object in a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildEntry {
    pub code: ObjectCode,
    pub kind: ObjectKind,
    pub blurb: String,
}

impl fmt::Display for ChildEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<14} {:<10} {}", self.code.to_string(), self.kind.label(), self.blurb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmos_kernel::{CountRange, GenerationConfig};

    fn universe() -> Universe {
        let cfg = GenerationConfig {
            life_probability: 0.3,
            nebulae_per_galaxy: CountRange::new(1, 3),
            black_holes_per_galaxy: CountRange::new(1, 2),
            ..GenerationConfig::small()
        };
        Universe::generate(21, cfg).unwrap()
    }

    #[test]
    fn summary_display() {
        let u = universe();
        let summary = UniverseInspector::summary(&u);
        assert_eq!(summary.seed, 21);
        let s = summary.to_string();
        assert!(s.contains("seed=21"));
        assert!(s.contains("galaxy"));
        assert!(s.contains("black hole"));
    }

    #[test]
    fn describe_galaxy_counts() {
        let u = universe();
        let code: ObjectCode = "G0".parse().unwrap();
        let info = UniverseInspector::describe(&u, &code).unwrap();
        assert_eq!(info.kind, ObjectKind::Galaxy);
        let g = u.galaxy(0).unwrap();
        assert_eq!(info.field("stars"), Some(g.stars.len().to_string().as_str()));
        assert_eq!(info.field("comets"), Some(g.comets.len().to_string().as_str()));
    }

    #[test]
    fn describe_planet_has_composition() {
        let u = universe();
        let planet = u
            .galaxies()
            .iter()
            .flat_map(|g| g.stars.iter())
            .flat_map(|s| s.planets.iter())
            .next()
            .unwrap();
        let info = UniverseInspector::describe(&u, &planet.code).unwrap();
        assert_eq!(info.kind, ObjectKind::Planet);
        assert_eq!(
            info.field("dominant mineral"),
            Some(planet.minerals.dominant().name())
        );
        assert!(info.field("composition").unwrap().contains("Iron"));
        assert!(info.to_string().starts_with(&planet.code.to_string()));
    }

    #[test]
    fn describe_missing() {
        let u = universe();
        assert!(UniverseInspector::describe(&u, &"G42".parse().unwrap()).is_none());
    }

    #[test]
    fn list_children_of_galaxy() {
        let u = universe();
        let code: ObjectCode = "G1".parse().unwrap();
        let entries = UniverseInspector::list_children(&u, &code).unwrap();
        assert_eq!(entries.len(), u.children(&code).unwrap().len());
        assert_eq!(entries[0].kind, ObjectKind::Star);
        assert!(entries.iter().any(|e| e.kind == ObjectKind::BlackHole));
        assert!(entries[0].to_string().starts_with("G1-S0"));
    }

    #[test]
    fn list_galaxies_one_per_galaxy() {
        let u = universe();
        let entries = UniverseInspector::list_galaxies(&u);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].code.to_string(), "G2");
    }

    #[test]
    fn find_life_scoped() {
        let u = universe();
        let all = UniverseInspector::find_life(&u, None);
        assert_eq!(all.len(), u.stats().inhabited_planets);
        let g0: ObjectCode = "G0".parse().unwrap();
        let scoped = UniverseInspector::find_life(&u, Some(&g0));
        assert!(scoped.iter().all(|c| c.galaxy() == 0));
        assert_eq!(
            scoped.len(),
            all.iter().filter(|c| c.galaxy() == 0).count()
        );
    }

    #[test]
    fn find_spectral_matches_type() {
        let u = universe();
        for t in SpectralType::ALL {
            let codes = UniverseInspector::find_spectral(&u, t, None);
            for c in codes {
                match u.find(&c) {
                    Some(CelestialRef::Star(s)) => assert_eq!(s.spectral_type, t),
                    other => panic!("expected star, got {other:?}"),
                }
            }
        }
        let total: usize = SpectralType::ALL
            .iter()
            .map(|t| UniverseInspector::find_spectral(&u, *t, None).len())
            .sum();
        assert_eq!(total, u.stats().stars);
    }

    #[test]
    fn richest_sorted_and_limited() {
        let u = universe();
        let top = UniverseInspector::richest(&u, Mineral::Nickel, 5);
        assert_eq!(top.len(), 5);
        for pair in top.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        let best = top[0].0;
        let best_fraction = u.find(&best).unwrap().composition().unwrap().fraction(Mineral::Nickel);
        assert_eq!(best_fraction, top[0].1);
    }
}
