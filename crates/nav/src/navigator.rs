use cosmos_common::{Mineral, ObjectCode};
use cosmos_kernel::Universe;
use cosmos_tools::{ChildEntry, ObjectInfo, UniverseInspector, UniverseSummary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::command::{Command, HELP, NavError};

/// The result of a successful command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    Help {
        commands: Vec<(String, String)>,
    },
    Summary(UniverseSummary),
    Location {
        location: Option<ObjectCode>,
    },
    Moved {
        location: Option<ObjectCode>,
    },
    Listing {
        of: Option<ObjectCode>,
        entries: Vec<ChildEntry>,
    },
    Object(ObjectInfo),
    Codes {
        title: String,
        codes: Vec<ObjectCode>,
    },
    Ranking {
        mineral: Mineral,
        entries: Vec<RankEntry>,
    },
    Bye,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub code: ObjectCode,
    pub fraction: f64,
}

/// One navigation session over a shared, read-only universe.
pub struct Navigator {
    universe: Arc<Universe>,
    location: Option<ObjectCode>,
}

impl Navigator {
    /// Start a session at the root.
    pub fn new(universe: Arc<Universe>) -> Self {
        Self {
            universe,
            location: None,
        }
    }

    /// Current location; `None` is the root.
    pub fn location(&self) -> Option<ObjectCode> {
        self.location
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Parse and execute one line.
    pub fn run_line(&mut self, line: &str) -> Result<Reply, NavError> {
        let cmd = Command::parse(line)?;
        self.execute(cmd)
    }

    pub fn execute(&mut self, cmd: Command) -> Result<Reply, NavError> {
        tracing::debug!(?cmd, location = ?self.location, "execute");
        let reply = match cmd {
            Command::Help => Reply::Help {
                commands: HELP
                    .iter()
                    .map(|(u, s)| ((*u).to_string(), (*s).to_string()))
                    .collect(),
            },
            Command::Stats => Reply::Summary(UniverseInspector::summary(&self.universe)),
            Command::Where => Reply::Location {
                location: self.location,
            },
            Command::Goto(target) => {
                self.location = self.resolve(&target)?;
                Reply::Moved {
                    location: self.location,
                }
            }
            Command::List(target) => {
                let of = self.resolve_opt(target.as_deref())?;
                let entries = match of {
                    None => UniverseInspector::list_galaxies(&self.universe),
                    Some(code) => UniverseInspector::list_children(&self.universe, &code)
                        .ok_or_else(|| NavError::NotFound(code.to_string()))?,
                };
                Reply::Listing { of, entries }
            }
            Command::Show(target) => match self.resolve_opt(target.as_deref())? {
                None => Reply::Summary(UniverseInspector::summary(&self.universe)),
                Some(code) => Reply::Object(
                    UniverseInspector::describe(&self.universe, &code)
                        .ok_or_else(|| NavError::NotFound(code.to_string()))?,
                ),
            },
            Command::FindLife(scope) => {
                let scope = self.resolve_opt(scope.as_deref())?;
                Reply::Codes {
                    title: scoped_title("inhabited planets", scope),
                    codes: UniverseInspector::find_life(&self.universe, scope.as_ref()),
                }
            }
            Command::FindSpectral(spectral, scope) => {
                let scope = self.resolve_opt(scope.as_deref())?;
                Reply::Codes {
                    title: scoped_title(&format!("{spectral}-type stars"), scope),
                    codes: UniverseInspector::find_spectral(
                        &self.universe,
                        spectral,
                        scope.as_ref(),
                    ),
                }
            }
            Command::Richest(mineral, limit) => Reply::Ranking {
                mineral,
                entries: UniverseInspector::richest(&self.universe, mineral, limit)
                    .into_iter()
                    .map(|(code, fraction)| RankEntry { code, fraction })
                    .collect(),
            },
            Command::Quit => Reply::Bye,
        };
        Ok(reply)
    }

    /// Scope argument for commands that default to the current location.
    fn resolve_opt(&self, target: Option<&str>) -> Result<Option<ObjectCode>, NavError> {
        match target {
            None => Ok(self.location),
            Some(t) => self.resolve(t),
        }
    }

    /// Resolve a target to an existing code (`None` = root).
    ///
    /// Accepts `/`, `..`, absolute codes (`G<digit>...`) and codes relative
    /// to the location or any of its ancestors, nearest first.
    pub fn resolve(&self, target: &str) -> Result<Option<ObjectCode>, NavError> {
        let target = target.trim();
        match target {
            "/" => return Ok(None),
            ".." => {
                return match self.location {
                    None => Err(NavError::AlreadyAtRoot),
                    Some(code) => Ok(code.parent()),
                };
            }
            "." => return Ok(self.location),
            _ => {}
        }

        if is_absolute(target) {
            let code: ObjectCode = target.parse()?;
            return if self.universe.contains(&code) {
                Ok(Some(code))
            } else {
                Err(NavError::NotFound(code.to_string()))
            };
        }

        let mut base = self.location;
        while let Some(b) = base {
            if let Ok(code) = format!("{b}-{target}").parse::<ObjectCode>() {
                if self.universe.contains(&code) {
                    return Ok(Some(code));
                }
            }
            base = b.parent();
        }
        Err(NavError::NotFound(target.to_string()))
    }
}

fn is_absolute(target: &str) -> bool {
    let mut chars = target.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('G' | 'g'), Some(c)) if c.is_ascii_digit()
    )
}

fn scoped_title(what: &str, scope: Option<ObjectCode>) -> String {
    match scope {
        Some(code) => format!("{what} in {code}"),
        None => what.to_string(),
    }
}

fn location_str(location: Option<ObjectCode>) -> String {
    location.map_or_else(|| "/".to_string(), |c| c.to_string())
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help { commands } => {
                let width = commands.iter().map(|(u, _)| u.len()).max().unwrap_or(0);
                let lines: Vec<String> = commands
                    .iter()
                    .map(|(usage, summary)| format!("  {usage:<width$}  {summary}"))
                    .collect();
                write!(f, "{}", lines.join("\n"))
            }
            Self::Summary(summary) => write!(f, "{summary}"),
            Self::Location { location } => write!(f, "{}", location_str(*location)),
            Self::Moved { location } => write!(f, "now at {}", location_str(*location)),
            Self::Listing { of, entries } => {
                write!(f, "{} ({} entries)", location_str(*of), entries.len())?;
                for e in entries {
                    write!(f, "\n  {e}")?;
                }
                Ok(())
            }
            Self::Object(info) => write!(f, "{info}"),
            Self::Codes { title, codes } => {
                write!(f, "{title}: {}", codes.len())?;
                for c in codes {
                    write!(f, "\n  {c}")?;
                }
                Ok(())
            }
            Self::Ranking { mineral, entries } => {
                write!(f, "richest in {mineral}:")?;
                for (i, e) in entries.iter().enumerate() {
                    write!(
                        f,
                        "\n  {:>3}. {:<14} {:.2}%",
                        i + 1,
                        e.code.to_string(),
                        e.fraction * 100.0
                    )?;
                }
                Ok(())
            }
            Self::Bye => write!(f, "bye"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmos_common::ObjectKind;
    use cosmos_kernel::{CountRange, GenerationConfig};

    fn navigator() -> Navigator {
        let cfg = GenerationConfig {
            black_holes_per_galaxy: CountRange::new(1, 2),
            planets_per_star: CountRange::new(1, 3),
            life_probability: 0.4,
            ..GenerationConfig::small()
        };
        Navigator::new(Arc::new(Universe::generate(13, cfg).unwrap()))
    }

    fn code(s: &str) -> ObjectCode {
        s.parse().unwrap()
    }

    #[test]
    fn starts_at_root() {
        let mut nav = navigator();
        assert_eq!(nav.location(), None);
        assert_eq!(
            nav.run_line("where").unwrap(),
            Reply::Location { location: None }
        );
        assert_eq!(nav.run_line("pwd").unwrap().to_string(), "/");
    }

    #[test]
    fn goto_absolute_and_back_up() {
        let mut nav = navigator();
        nav.run_line("goto G1-S0-P0").unwrap();
        assert_eq!(nav.location(), Some(code("G1-S0-P0")));
        nav.run_line("up").unwrap();
        assert_eq!(nav.location(), Some(code("G1-S0")));
        nav.run_line("cd ..").unwrap();
        assert_eq!(nav.location(), Some(code("G1")));
        nav.run_line("up").unwrap();
        assert_eq!(nav.location(), None);
        assert_eq!(nav.run_line("up"), Err(NavError::AlreadyAtRoot));
    }

    #[test]
    fn relative_codes_resolve_against_ancestors() {
        let mut nav = navigator();
        nav.run_line("cd G2").unwrap();
        nav.run_line("cd S1").unwrap();
        assert_eq!(nav.location(), Some(code("G2-S1")));
        nav.run_line("cd P0").unwrap();
        assert_eq!(nav.location(), Some(code("G2-S1-P0")));
        // BH0 is not under the planet or the star, but is under the galaxy.
        nav.run_line("cd bh0").unwrap();
        assert_eq!(nav.location(), Some(code("G2-BH0")));
    }

    #[test]
    fn failed_goto_keeps_location() {
        let mut nav = navigator();
        nav.run_line("cd G0").unwrap();
        assert_eq!(
            nav.run_line("cd S9999"),
            Err(NavError::NotFound("S9999".into()))
        );
        assert_eq!(
            nav.run_line("cd G99"),
            Err(NavError::NotFound("G99".into()))
        );
        assert!(matches!(
            nav.run_line("cd G1-Q2"),
            Err(NavError::InvalidCode(_))
        ));
        assert_eq!(nav.location(), Some(code("G0")));
    }

    #[test]
    fn relative_at_root_not_found() {
        let mut nav = navigator();
        assert!(matches!(nav.run_line("cd S0"), Err(NavError::NotFound(_))));
    }

    #[test]
    fn home_returns_to_root() {
        let mut nav = navigator();
        nav.run_line("cd G0-S0").unwrap();
        assert_eq!(nav.run_line("home").unwrap(), Reply::Moved { location: None });
        assert_eq!(nav.location(), None);
    }

    #[test]
    fn ls_root_lists_galaxies() {
        let mut nav = navigator();
        match nav.run_line("ls").unwrap() {
            Reply::Listing { of, entries } => {
                assert_eq!(of, None);
                assert_eq!(entries.len(), 3);
                assert!(entries.iter().all(|e| e.kind == ObjectKind::Galaxy));
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn ls_relative_to_location() {
        let mut nav = navigator();
        nav.run_line("cd G0").unwrap();
        let star_planets = nav.universe().galaxy(0).unwrap().stars[0].planets.len();
        match nav.run_line("ls S0").unwrap() {
            Reply::Listing { of, entries } => {
                assert_eq!(of, Some(code("G0-S0")));
                assert_eq!(entries.len(), star_planets);
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn show_location_or_summary() {
        let mut nav = navigator();
        assert!(matches!(nav.run_line("show").unwrap(), Reply::Summary(_)));
        nav.run_line("cd G1-BH0").unwrap();
        match nav.run_line("show").unwrap() {
            Reply::Object(info) => {
                assert_eq!(info.kind, ObjectKind::BlackHole);
                assert!(info.field("spin").is_some());
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn find_life_defaults_to_location_scope() {
        let mut nav = navigator();
        let all = match nav.run_line("find life").unwrap() {
            Reply::Codes { codes, .. } => codes,
            other => panic!("unexpected reply {other:?}"),
        };
        nav.run_line("cd G0").unwrap();
        match nav.run_line("find life").unwrap() {
            Reply::Codes { title, codes } => {
                assert!(title.ends_with("in G0"));
                assert!(codes.iter().all(|c| c.galaxy() == 0));
                assert_eq!(codes.len(), all.iter().filter(|c| c.galaxy() == 0).count());
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn richest_reply() {
        let mut nav = navigator();
        match nav.run_line("richest oxygen 4").unwrap() {
            Reply::Ranking { mineral, entries } => {
                assert_eq!(mineral, Mineral::Oxygen);
                assert_eq!(entries.len(), 4);
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn quit_says_bye() {
        let mut nav = navigator();
        assert_eq!(nav.run_line("quit").unwrap(), Reply::Bye);
    }

    #[test]
    fn replies_serialize_with_type_tag() {
        let mut nav = navigator();
        let reply = nav.run_line("cd G0").unwrap();
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["type"], "moved");
        assert_eq!(json["location"], "G0");

        let reply = nav.run_line("stats").unwrap();
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["type"], "summary");
        assert_eq!(json["stats"]["galaxies"], 3);
    }

    #[test]
    fn help_renders_every_line() {
        let mut nav = navigator();
        let text = nav.run_line("help").unwrap().to_string();
        assert_eq!(text.lines().count(), HELP.len());
    }
}
