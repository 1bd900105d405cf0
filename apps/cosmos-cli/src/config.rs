use std::path::{Path, PathBuf};

use anyhow::Context;
use cosmos_kernel::{DEFAULT_SEED, GenerationConfig};
use cosmos_server::ServerConfig;
use serde::{Deserialize, Serialize};

/// Settings read from `--config`. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_file: PathBuf,
    pub seed: u64,
    /// Pad the universe file to this many bytes; 0 disables padding.
    pub target_size: u64,
    pub server: ServerConfig,
    pub generation: GenerationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("universe.bin"),
            seed: DEFAULT_SEED,
            target_size: 0,
            server: ServerConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.generation.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_file_means_defaults() {
        let c = AppConfig::load(None).unwrap();
        assert_eq!(c, AppConfig::default());
        assert_eq!(c.data_file, PathBuf::from("universe.bin"));
        assert_eq!(c.server.port, 50051);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let c = AppConfig::parse(
            "seed: 7\nserver:\n  port: 6000\ngeneration:\n  galaxy_count: 5\n",
        )
        .unwrap();
        assert_eq!(c.seed, 7);
        assert_eq!(c.server.port, 6000);
        assert_eq!(c.server.host, "127.0.0.1");
        assert_eq!(c.generation.galaxy_count, 5);
        assert_eq!(
            c.generation.stars_per_galaxy,
            GenerationConfig::default().stars_per_galaxy
        );
        assert_eq!(c.data_file, PathBuf::from("universe.bin"));
    }

    #[test]
    fn line_transport_can_be_disabled() {
        assert_eq!(AppConfig::default().server.line_port, Some(50052));
        let c = AppConfig::parse("server:\n  line_port: null\n").unwrap();
        assert_eq!(c.server.line_port, None);
        assert_eq!(c.server.port, 50051);
    }

    #[test]
    fn invalid_generation_is_rejected() {
        assert!(AppConfig::parse("generation:\n  life_probability: 2.0\n").is_err());
    }

    #[test]
    fn unreadable_file_is_an_error() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/cosmos.yaml"))).is_err());
    }
}
