use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Category of a celestial object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    Galaxy,
    Star,
    Planet,
    BlackHole,
    Nebula,
    Asteroid,
    Comet,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 7] = [
        Self::Galaxy,
        Self::Star,
        Self::Planet,
        Self::BlackHole,
        Self::Nebula,
        Self::Asteroid,
        Self::Comet,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Galaxy => "galaxy",
            Self::Star => "star",
            Self::Planet => "planet",
            Self::BlackHole => "black hole",
            Self::Nebula => "nebula",
            Self::Asteroid => "asteroid",
            Self::Comet => "comet",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Number of mineral types tracked in a [`Composition`].
pub const MINERAL_COUNT: usize = 8;

/// Mineral types, in the fixed order used by [`Composition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mineral {
    Iron,
    Silicon,
    Magnesium,
    Oxygen,
    Carbon,
    Nickel,
    Sulfur,
    Aluminum,
}

impl Mineral {
    pub const ALL: [Mineral; MINERAL_COUNT] = [
        Self::Iron,
        Self::Silicon,
        Self::Magnesium,
        Self::Oxygen,
        Self::Carbon,
        Self::Nickel,
        Self::Sulfur,
        Self::Aluminum,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Iron => "Iron",
            Self::Silicon => "Silicon",
            Self::Magnesium => "Magnesium",
            Self::Oxygen => "Oxygen",
            Self::Carbon => "Carbon",
            Self::Nickel => "Nickel",
            Self::Sulfur => "Sulfur",
            Self::Aluminum => "Aluminum",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Mineral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mineral {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown mineral {wanted:?}"))
    }
}

/// Errors from building a [`Composition`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompositionError {
    #[error("mineral weights must be finite and non-negative")]
    InvalidWeight,
    #[error("mineral weights sum to zero")]
    ZeroTotal,
    #[error("unknown mineral {0:?}")]
    UnknownMineral(String),
    #[error("mineral fractions sum to {0}, not 1")]
    NotNormalized(f64),
}

/// Mineral fractions of a body. Fractions are non-negative and sum to 1.
///
/// Serializes as a map from mineral name to fraction, e.g. `{"Iron": 0.12, ...}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Composition {
    fractions: [f64; MINERAL_COUNT],
}

impl Composition {
    /// Normalize raw weights (one per [`Mineral::ALL`] entry) into fractions.
    pub fn from_weights(weights: [f64; MINERAL_COUNT]) -> Result<Self, CompositionError> {
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(CompositionError::InvalidWeight);
        }
        // Scale by the largest weight first so the sum cannot overflow.
        let largest = weights.iter().copied().fold(0.0, f64::max);
        if largest <= 0.0 {
            return Err(CompositionError::ZeroTotal);
        }
        let scaled = weights.map(|w| w / largest);
        let total: f64 = scaled.iter().sum();
        Ok(Self {
            fractions: scaled.map(|w| w / total),
        })
    }

    /// Equal parts of every mineral.
    pub fn uniform() -> Self {
        Self {
            fractions: [1.0 / MINERAL_COUNT as f64; MINERAL_COUNT],
        }
    }

    pub fn fraction(&self, mineral: Mineral) -> f64 {
        self.fractions[mineral.index()]
    }

    /// Mineral with the largest fraction. Ties go to the earlier mineral.
    pub fn dominant(&self) -> Mineral {
        let mut best = Mineral::ALL[0];
        for m in Mineral::ALL {
            if self.fraction(m) > self.fraction(best) {
                best = m;
            }
        }
        best
    }

    pub fn iter(&self) -> impl Iterator<Item = (Mineral, f64)> + '_ {
        Mineral::ALL.into_iter().zip(self.fractions.iter().copied())
    }

    pub fn fractions(&self) -> &[f64; MINERAL_COUNT] {
        &self.fractions
    }
}

const NORMALIZED_TOLERANCE: f64 = 1e-9;

impl TryFrom<BTreeMap<String, f64>> for Composition {
    type Error = CompositionError;

    /// Accept stored fractions as-is. Minerals missing from the map are 0.
    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut fractions = [0.0; MINERAL_COUNT];
        for (name, value) in map {
            let mineral: Mineral = name
                .parse()
                .map_err(|_| CompositionError::UnknownMineral(name))?;
            if !value.is_finite() || value < 0.0 {
                return Err(CompositionError::InvalidWeight);
            }
            fractions[mineral.index()] = value;
        }
        let total: f64 = fractions.iter().sum();
        if (total - 1.0).abs() > NORMALIZED_TOLERANCE {
            return Err(CompositionError::NotNormalized(total));
        }
        Ok(Self { fractions })
    }
}

impl Serialize for Composition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(MINERAL_COUNT))?;
        for (mineral, fraction) in self.iter() {
            map.serialize_entry(mineral.name(), &fraction)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Composition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, f64>::deserialize(deserializer)?;
        Self::try_from(map).map_err(de::Error::custom)
    }
}

/// Stellar spectral classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpectralType {
    O,
    B,
    A,
    F,
    G,
    K,
    M,
}

impl SpectralType {
    pub const ALL: [SpectralType; 7] = [
        Self::O,
        Self::B,
        Self::A,
        Self::F,
        Self::G,
        Self::K,
        Self::M,
    ];

    pub fn letter(&self) -> char {
        match self {
            Self::O => 'O',
            Self::B => 'B',
            Self::A => 'A',
            Self::F => 'F',
            Self::G => 'G',
            Self::K => 'K',
            Self::M => 'M',
        }
    }
}

impl fmt::Display for SpectralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for SpectralType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let mut chars = wanted.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::ALL
                .into_iter()
                .find(|t| t.letter().eq_ignore_ascii_case(&c))
                .ok_or_else(|| format!("unknown spectral type {wanted:?}")),
            _ => Err(format!("unknown spectral type {wanted:?}")),
        }
    }
}
