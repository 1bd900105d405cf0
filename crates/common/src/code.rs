use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::types::ObjectKind;

/// Hierarchical reference code of a celestial object.
///
/// Canonical forms: `G3`, `G3-S12`, `G3-S12-P4`, `G3-BH0`, `G3-N2`, `G3-A77`,
/// `G3-C9`. Codes serialize as their canonical string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectCode {
    Galaxy { galaxy: u32 },
    Star { galaxy: u32, star: u32 },
    Planet { galaxy: u32, star: u32, planet: u32 },
    BlackHole { galaxy: u32, index: u32 },
    Nebula { galaxy: u32, index: u32 },
    Asteroid { galaxy: u32, index: u32 },
    Comet { galaxy: u32, index: u32 },
}

/// Errors from parsing a reference code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    #[error("empty reference code")]
    Empty,
    #[error("reference code must start with a galaxy segment: {0:?}")]
    MissingGalaxy(String),
    #[error("invalid index in segment {0:?}")]
    BadIndex(String),
    #[error("unknown segment {0:?}")]
    UnknownSegment(String),
    #[error("too many segments in {0:?}")]
    TooManySegments(String),
}

impl ObjectCode {
    /// Galaxy index this object belongs to.
    pub fn galaxy(&self) -> u32 {
        match *self {
            Self::Galaxy { galaxy }
            | Self::Star { galaxy, .. }
            | Self::Planet { galaxy, .. }
            | Self::BlackHole { galaxy, .. }
            | Self::Nebula { galaxy, .. }
            | Self::Asteroid { galaxy, .. }
            | Self::Comet { galaxy, .. } => galaxy,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Galaxy { .. } => ObjectKind::Galaxy,
            Self::Star { .. } => ObjectKind::Star,
            Self::Planet { .. } => ObjectKind::Planet,
            Self::BlackHole { .. } => ObjectKind::BlackHole,
            Self::Nebula { .. } => ObjectKind::Nebula,
            Self::Asteroid { .. } => ObjectKind::Asteroid,
            Self::Comet { .. } => ObjectKind::Comet,
        }
    }

    /// The containing object: planet -> star, everything else -> galaxy.
    /// Galaxies have no parent.
    pub fn parent(&self) -> Option<Self> {
        match *self {
            Self::Galaxy { .. } => None,
            Self::Planet { galaxy, star, .. } => Some(Self::Star { galaxy, star }),
            other => Some(Self::Galaxy {
                galaxy: other.galaxy(),
            }),
        }
    }

    /// Whether `self` is `other` or is contained (directly or transitively) in it.
    pub fn is_within(&self, other: &Self) -> bool {
        let mut cur = Some(*self);
        while let Some(code) = cur {
            if code == *other {
                return true;
            }
            cur = code.parent();
        }
        false
    }

    /// Canonical ordering key: galaxy first, then stars (each followed by its
    /// planets), black holes, nebulae, asteroids, comets.
    fn sort_key(&self) -> (u32, u8, u32, u32) {
        match *self {
            Self::Galaxy { galaxy } => (galaxy, 0, 0, 0),
            Self::Star { galaxy, star } => (galaxy, 1, star, 0),
            Self::Planet {
                galaxy,
                star,
                planet,
            } => (galaxy, 1, star, planet.saturating_add(1)),
            Self::BlackHole { galaxy, index } => (galaxy, 2, index, 0),
            Self::Nebula { galaxy, index } => (galaxy, 3, index, 0),
            Self::Asteroid { galaxy, index } => (galaxy, 4, index, 0),
            Self::Comet { galaxy, index } => (galaxy, 5, index, 0),
        }
    }
}

impl Ord for ObjectCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for ObjectCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ObjectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Galaxy { galaxy } => write!(f, "G{galaxy}"),
            Self::Star { galaxy, star } => write!(f, "G{galaxy}-S{star}"),
            Self::Planet {
                galaxy,
                star,
                planet,
            } => write!(f, "G{galaxy}-S{star}-P{planet}"),
            Self::BlackHole { galaxy, index } => write!(f, "G{galaxy}-BH{index}"),
            Self::Nebula { galaxy, index } => write!(f, "G{galaxy}-N{index}"),
            Self::Asteroid { galaxy, index } => write!(f, "G{galaxy}-A{index}"),
            Self::Comet { galaxy, index } => write!(f, "G{galaxy}-C{index}"),
        }
    }
}

impl FromStr for ObjectCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_uppercase();
        if text.is_empty() {
            return Err(CodeError::Empty);
        }
        let parts: Vec<&str> = text.split('-').collect();
        let galaxy = match parts[0].strip_prefix('G') {
            Some(digits) => parse_index(parts[0], digits)?,
            None => return Err(CodeError::MissingGalaxy(text.clone())),
        };

        match parts.as_slice() {
            [_] => Ok(Self::Galaxy { galaxy }),
            [_, seg] => {
                if let Some(d) = seg.strip_prefix("BH") {
                    Ok(Self::BlackHole {
                        galaxy,
                        index: parse_index(seg, d)?,
                    })
                } else if let Some(d) = seg.strip_prefix('S') {
                    Ok(Self::Star {
                        galaxy,
                        star: parse_index(seg, d)?,
                    })
                } else if let Some(d) = seg.strip_prefix('N') {
                    Ok(Self::Nebula {
                        galaxy,
                        index: parse_index(seg, d)?,
                    })
                } else if let Some(d) = seg.strip_prefix('A') {
                    Ok(Self::Asteroid {
                        galaxy,
                        index: parse_index(seg, d)?,
                    })
                } else if let Some(d) = seg.strip_prefix('C') {
                    Ok(Self::Comet {
                        galaxy,
                        index: parse_index(seg, d)?,
                    })
                } else {
                    Err(CodeError::UnknownSegment((*seg).to_string()))
                }
            }
            [_, star_seg, planet_seg] => {
                let star = match star_seg.strip_prefix('S') {
                    Some(d) => parse_index(star_seg, d)?,
                    None => return Err(CodeError::UnknownSegment((*star_seg).to_string())),
                };
                let planet = match planet_seg.strip_prefix('P') {
                    Some(d) => parse_index(planet_seg, d)?,
                    None => return Err(CodeError::UnknownSegment((*planet_seg).to_string())),
                };
                Ok(Self::Planet {
                    galaxy,
                    star,
                    planet,
                })
            }
            _ => Err(CodeError::TooManySegments(text.clone())),
        }
    }
}

fn parse_index(segment: &str, digits: &str) -> Result<u32, CodeError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodeError::BadIndex(segment.to_string()));
    }
    digits
        .parse::<u32>()
        .map_err(|_| CodeError::BadIndex(segment.to_string()))
}

impl Serialize for ObjectCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
