use cosmos_common::{CodeError, Mineral, SpectralType};

/// Default number of entries returned by `richest`.
pub const DEFAULT_RANK_LIMIT: usize = 10;

/// Usage and summary for every command, in display order.
pub const HELP: &[(&str, &str)] = &[
    ("help", "list commands"),
    ("stats", "universe summary"),
    ("where | pwd", "current location"),
    ("goto <code> | cd <code>", "move to an object (codes may be relative)"),
    ("up | cd ..", "move to the parent"),
    ("home | cd /", "move to the root"),
    ("ls [code]", "list children of the location or of code"),
    ("show [code]", "describe the location or code"),
    ("find life [code]", "inhabited planets, optionally within code"),
    ("find spectral <type> [code]", "stars of a spectral type (O B A F G K M)"),
    ("richest <mineral> [n]", "bodies richest in a mineral (default 10)"),
    ("quit | exit", "end the session"),
];

/// Errors from parsing or executing a navigation command.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NavError {
    #[error("unknown command {0:?} (try `help`)")]
    UnknownCommand(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid code: {0}")]
    InvalidCode(#[from] CodeError),
    #[error("no object {0:?}")]
    NotFound(String),
    #[error("already at the root")]
    AlreadyAtRoot,
}

/// A parsed navigation command.
///
/// Object arguments stay as text; they may be relative and are resolved
/// against the session location by the navigator.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Stats,
    Where,
    Goto(String),
    List(Option<String>),
    Show(Option<String>),
    FindLife(Option<String>),
    FindSpectral(SpectralType, Option<String>),
    Richest(Mineral, usize),
    Quit,
}

impl Command {
    /// Parse one line. Keywords are case-insensitive.
    pub fn parse(line: &str) -> Result<Self, NavError> {
        let mut words = line.split_whitespace();
        let Some(keyword) = words.next() else {
            return Err(NavError::MissingArgument("command"));
        };
        let args: Vec<&str> = words.collect();
        let keyword = keyword.to_ascii_lowercase();

        let cmd = match keyword.as_str() {
            "help" | "?" => {
                no_args(&args)?;
                Self::Help
            }
            "stats" => {
                no_args(&args)?;
                Self::Stats
            }
            "where" | "pwd" => {
                no_args(&args)?;
                Self::Where
            }
            "goto" | "cd" => {
                let target = at_most_one(&args)?.ok_or(NavError::MissingArgument("goto"))?;
                Self::Goto(target)
            }
            "up" => {
                no_args(&args)?;
                Self::Goto("..".into())
            }
            "home" => {
                no_args(&args)?;
                Self::Goto("/".into())
            }
            "ls" | "list" => Self::List(at_most_one(&args)?),
            "show" | "inspect" => Self::Show(at_most_one(&args)?),
            "find" => parse_find(&args)?,
            "richest" => parse_richest(&args)?,
            "quit" | "exit" => {
                no_args(&args)?;
                Self::Quit
            }
            other => return Err(NavError::UnknownCommand(other.to_string())),
        };
        Ok(cmd)
    }
}

fn parse_find(args: &[&str]) -> Result<Command, NavError> {
    match args {
        [] => Err(NavError::MissingArgument("find")),
        [what, rest @ ..] => match what.to_ascii_lowercase().as_str() {
            "life" => Ok(Command::FindLife(at_most_one(rest)?)),
            "spectral" => match rest {
                [] => Err(NavError::MissingArgument("find spectral")),
                [t, scope @ ..] => {
                    let spectral = t.parse().map_err(NavError::InvalidArgument)?;
                    Ok(Command::FindSpectral(spectral, at_most_one(scope)?))
                }
            },
            other => Err(NavError::InvalidArgument(format!(
                "cannot find {other:?}; use `find life` or `find spectral`"
            ))),
        },
    }
}

fn parse_richest(args: &[&str]) -> Result<Command, NavError> {
    match args {
        [] => Err(NavError::MissingArgument("richest")),
        [mineral] => Ok(Command::Richest(
            mineral.parse().map_err(NavError::InvalidArgument)?,
            DEFAULT_RANK_LIMIT,
        )),
        [mineral, n] => {
            let mineral = mineral.parse().map_err(NavError::InvalidArgument)?;
            let limit = n
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| NavError::InvalidArgument(format!("bad count {n:?}")))?;
            Ok(Command::Richest(mineral, limit))
        }
        _ => Err(too_many()),
    }
}

fn no_args(args: &[&str]) -> Result<(), NavError> {
    if args.is_empty() { Ok(()) } else { Err(too_many()) }
}

fn at_most_one(args: &[&str]) -> Result<Option<String>, NavError> {
    match args {
        [] => Ok(None),
        [one] => Ok(Some((*one).to_string())),
        _ => Err(too_many()),
    }
}

fn too_many() -> NavError {
    NavError::InvalidArgument("too many arguments".into())
}
