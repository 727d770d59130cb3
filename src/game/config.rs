use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the game
///
/// Every field has a default, so a TOML file only needs to name the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Side of the square, wrap-around grid
    pub grid_size: usize,
    /// Column of the snake's starting segment
    pub start_x: usize,
    /// Row of the snake's starting segment
    pub start_y: usize,

    // Speed curve
    /// Tick delay at level 1, in milliseconds
    pub base_tick_ms: u64,
    /// Milliseconds removed from the tick delay per level
    pub tick_step_ms: u64,
    /// Fastest allowed tick delay, in milliseconds
    pub min_tick_ms: u64,

    // Progression
    /// Food eaten per level
    pub points_per_level: u32,
    /// Length of the pause after a level up, in milliseconds
    pub level_up_pause_ms: u64,
    /// Length of the pause before the first move, in milliseconds
    pub intro_pause_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            start_x: 10,
            start_y: 10,
            base_tick_ms: 200,
            tick_step_ms: 15,
            min_tick_ms: 50,
            points_per_level: 4,
            level_up_pause_ms: 2000,
            intro_pause_ms: 3000,
        }
    }
}

impl GameConfig {
    /// Create a configuration for a custom grid, starting in its centre
    pub fn with_grid_size(grid_size: usize) -> Self {
        Self {
            grid_size,
            start_x: grid_size / 2,
            start_y: grid_size / 2,
            ..Default::default()
        }
    }

    /// Load a configuration from a TOML file and validate it
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: GameConfig = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config
            .validate()
            .map_err(|msg| anyhow::anyhow!("Invalid config in {}: {}", path.display(), msg))?;
        Ok(config)
    }

    /// Validate configuration parameters
    ///
    /// # Returns
    ///
    /// `Ok(())` if all parameters are valid, `Err(String)` with an error message otherwise.
    pub fn validate(&self) -> Result<(), String> {
        if self.grid_size == 0 {
            return Err("grid_size must be at least 1".to_string());
        }

        if self.grid_size > i32::MAX as usize {
            return Err(format!("grid_size is too large, got {}", self.grid_size));
        }

        if self.start_x >= self.grid_size || self.start_y >= self.grid_size {
            return Err(format!(
                "start position ({}, {}) lies outside a {}x{} grid",
                self.start_x, self.start_y, self.grid_size, self.grid_size
            ));
        }

        if self.points_per_level == 0 {
            return Err("points_per_level must be at least 1".to_string());
        }

        if self.min_tick_ms == 0 {
            return Err("min_tick_ms must be positive".to_string());
        }

        if self.min_tick_ms > self.base_tick_ms {
            return Err(format!(
                "min_tick_ms ({}) cannot exceed base_tick_ms ({})",
                self.min_tick_ms, self.base_tick_ms
            ));
        }

        Ok(())
    }

    /// Number of cells on the board
    pub fn cell_count(&self) -> usize {
        self.grid_size * self.grid_size
    }

    /// Tick delay for a level: `max(min, base - (level - 1) * step)`
    pub fn tick_delay(&self, level: u32) -> Duration {
        let reduction = u64::from(level.saturating_sub(1)).saturating_mul(self.tick_step_ms);
        let ms = self
            .base_tick_ms
            .saturating_sub(reduction)
            .max(self.min_tick_ms);
        Duration::from_millis(ms)
    }

    pub fn level_up_pause(&self) -> Duration {
        Duration::from_millis(self.level_up_pause_ms)
    }

    pub fn intro_pause(&self) -> Duration {
        Duration::from_millis(self.intro_pause_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.grid_size, 20);
        assert_eq!((config.start_x, config.start_y), (10, 10));
        assert_eq!(config.points_per_level, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_grid() {
        let config = GameConfig::with_grid_size(6);
        assert_eq!(config.grid_size, 6);
        assert_eq!((config.start_x, config.start_y), (3, 3));
        assert_eq!(config.cell_count(), 36);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tick_delay_curve() {
        let config = GameConfig::default();
        assert_eq!(config.tick_delay(1), Duration::from_millis(200));
        assert_eq!(config.tick_delay(2), Duration::from_millis(185));
        assert_eq!(config.tick_delay(10), Duration::from_millis(65));
        assert_eq!(config.tick_delay(11), Duration::from_millis(50));
        assert_eq!(config.tick_delay(12), Duration::from_millis(50));
        assert_eq!(config.tick_delay(u32::MAX), Duration::from_millis(50));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GameConfig::default();
        config.grid_size = 0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.start_x = 20;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.points_per_level = 0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.min_tick_ms = 0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.min_tick_ms = 300;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "level_up_pause_ms = 500\nbase_tick_ms = 250").unwrap();

        let config = GameConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.level_up_pause_ms, 500);
        assert_eq!(config.base_tick_ms, 250);
        assert_eq!(config.grid_size, 20);
        assert_eq!(config.tick_step_ms, 15);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "points_per_level = 0").unwrap();
        assert!(GameConfig::from_toml_file(file.path()).is_err());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "grid_size = \"big\"").unwrap();
        assert!(GameConfig::from_toml_file(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(GameConfig::from_toml_file(&missing).is_err());
    }
}
