//! Run configuration
//!
//! # Sources (later wins)
//!
//! 1. Config file: first positional argument, else `RIO_CONFIG`, else `rio.toml`
//! 2. Environment: `RIO_SEED`, `RIO_DIFFICULTY`, `RIO_MAX_TICKS`, `RIO_CONTENT`
//! 3. Flags: `--headless` disables stdin commands
//!
//! # Example
//!
//! ```toml
//! max_ticks = 36000
//! content = "content/amazon.json"
//!
//! [game]
//! seed = 42
//!
//! [game.gameplay]
//! difficulty = "HARD"
//!
//! [game.navigation]
//! start_node = "belem"
//! ```

use crate::error::{Result, RuntimeError};
use rio_game::{DifficultyLevel, GameConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "rio.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub game: GameConfig,
    /// Content file; the built-in campaign when unset
    pub content: Option<PathBuf>,
    /// Stop after this many ticks
    pub max_ticks: Option<u64>,
    /// Read commands from stdin
    pub interactive: bool,
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            content: None,
            max_ticks: None,
            interactive: true,
            config_path: None,
        }
    }
}

impl RunConfig {
    /// Load from the file, environment and command line
    pub fn load() -> Result<Self> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let explicit = args
            .iter()
            .find(|a| !a.starts_with("--"))
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("RIO_CONFIG").map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::load_from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load_from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        if args.iter().any(|a| a == "--headless") {
            config.interactive = false;
        }
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&text)?;
        config.config_path = Some(path.to_path_buf());
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `RIO_*` overrides read through `var`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(seed) = var("RIO_SEED") {
            let seed = seed
                .parse()
                .map_err(|_| RuntimeError::InvalidValue { key: "RIO_SEED", value: seed })?;
            self.game.seed = Some(seed);
        }
        if let Some(difficulty) = var("RIO_DIFFICULTY") {
            let level: DifficultyLevel = difficulty
                .parse()
                .map_err(|_| RuntimeError::InvalidValue { key: "RIO_DIFFICULTY", value: difficulty })?;
            self.game.gameplay.difficulty = level;
        }
        if let Some(ticks) = var("RIO_MAX_TICKS") {
            let ticks = ticks
                .parse()
                .map_err(|_| RuntimeError::InvalidValue { key: "RIO_MAX_TICKS", value: ticks })?;
            self.max_ticks = Some(ticks);
        }
        if let Some(content) = var("RIO_CONTENT").filter(|c| !c.is_empty()) {
            self.content = Some(PathBuf::from(content));
        }
        Ok(())
    }

    pub fn log_summary(&self) {
        log::info!("=== Run Configuration ===");
        if let Some(path) = &self.config_path {
            log::info!("  Config file: {}", path.display());
        }
        match &self.content {
            Some(path) => log::info!("  Content: {}", path.display()),
            None => log::info!("  Content: built-in Amazon campaign"),
        }
        log::info!("  Seed: {:?}", self.game.seed);
        log::info!("  Difficulty: {:?}", self.game.gameplay.difficulty);
        log::info!("  Start: {}", self.game.navigation.start_node);
        log::info!("  Tick rate: {} Hz", self.game.engine.target_fps);
        if let Some(ticks) = self.max_ticks {
            log::info!("  Max ticks: {}", ticks);
        }
        log::info!("  Interactive: {}", self.interactive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_toml_sections() {
        let config = RunConfig::from_toml(
            r#"
            max_ticks = 600
            interactive = false

            [game]
            seed = 9

            [game.gameplay]
            difficulty = "EASY"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_ticks, Some(600));
        assert!(!config.interactive);
        assert_eq!(config.game.seed, Some(9));
        assert_eq!(config.game.gameplay.difficulty, DifficultyLevel::Easy);
        assert_eq!(config.game.navigation.start_node, "belem");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [("RIO_SEED", "77"), ("RIO_DIFFICULTY", "hard"), ("RIO_MAX_TICKS", "120")]
            .into_iter()
            .collect();
        let mut config = RunConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.game.seed, Some(77));
        assert_eq!(config.game.gameplay.difficulty, DifficultyLevel::Hard);
        assert_eq!(config.max_ticks, Some(120));
        assert!(config.content.is_none());
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = RunConfig::default();
        let err = config
            .apply_env(|key| (key == "RIO_SEED").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidValue { key: "RIO_SEED", .. }));
    }
}
