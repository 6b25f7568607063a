use std::{fs, path::Path};

use anyhow::{Context, Result};
use geocache_core::GameConfig;

/// Loads the game configuration from an optional TOML file.
///
/// Fields missing from the file keep their defaults.
pub(crate) fn load(path: Option<&Path>) -> Result<GameConfig> {
    let config = match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read game config {}", path.display()))?;
            parse(&contents)?
        }
        None => GameConfig::default(),
    };
    config.validate().context("game config rejected")?;
    Ok(config)
}

fn parse(contents: &str) -> Result<GameConfig> {
    toml::from_str(contents).context("failed to parse game config toml contents")
}
