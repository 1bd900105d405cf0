use cosmos_nav::{Command, NavError, Navigator, Reply};
use tokio::task::JoinError;

/// Outcome of one request line, with the navigator handed back.
pub(crate) type LineOutcome = (Navigator, Result<Reply, NavError>);

/// Parse and execute `line` on the blocking pool.
///
/// Searches such as `richest` walk every body in the universe, so they stay
/// off the async workers.
pub(crate) async fn run_line(
    mut navigator: Navigator,
    line: String,
) -> Result<LineOutcome, JoinError> {
    tokio::task::spawn_blocking(move || {
        let result = Command::parse(&line).and_then(|cmd| navigator.execute(cmd));
        (navigator, result)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmos_kernel::{GenerationConfig, Universe};
    use std::sync::Arc;

    #[tokio::test]
    async fn location_survives_the_round_trip() {
        let universe = Arc::new(Universe::generate(2, GenerationConfig::small()).unwrap());
        let nav = Navigator::new(universe);
        let (nav, result) = run_line(nav, "goto G2".into()).await.unwrap();
        assert!(result.is_ok());
        assert_eq!(nav.location().map(|c| c.to_string()), Some("G2".into()));

        let (nav, result) = run_line(nav, "richest iron 2".into()).await.unwrap();
        assert!(matches!(result, Ok(Reply::Ranking { ref entries, .. }) if entries.len() == 2));
        assert_eq!(nav.location().map(|c| c.to_string()), Some("G2".into()));
    }
}
