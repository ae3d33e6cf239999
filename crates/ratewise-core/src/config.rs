//! Configuration: `.ratewise/config.toml` overlaid by environment variables.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::repository::DEFAULT_PAGE_SIZE;

/// Project directory holding config and the default database.
pub const RATEWISE_DIR: &str = ".ratewise";
pub const CONFIG_FILE: &str = "config.toml";
pub const DB_FILE: &str = "ratewise.db";

/// Environment variable overriding `database.path`.
pub const ENV_DB: &str = "RATEWISE_DB";
/// Environment variable overriding `reviews.page_size`.
pub const ENV_PAGE_SIZE: &str = "RATEWISE_PAGE_SIZE";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub reviews: ReviewsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file; relative paths resolve against the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub enforce_foreign_keys: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            enforce_foreign_keys: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewsConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

const fn default_true() -> bool {
    true
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Config {
    /// Database file for a project rooted at `root`.
    ///
    /// Uses `database.path` when set, the project's `.ratewise/` directory when
    /// it exists, and the user data directory otherwise.
    #[must_use]
    pub fn database_path(&self, root: &Path) -> PathBuf {
        if let Some(path) = &self.database.path {
            return if path.is_absolute() {
                path.clone()
            } else {
                root.join(path)
            };
        }

        let project_dir = root.join(RATEWISE_DIR);
        if project_dir.is_dir() {
            return project_dir.join(DB_FILE);
        }
        dirs::data_dir().map_or_else(
            || project_dir.join(DB_FILE),
            |d| d.join("ratewise").join(DB_FILE),
        )
    }

    /// Apply overrides from `lookup` (an environment reader).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup(ENV_DB).filter(|v| !v.trim().is_empty()) {
            self.database.path = Some(PathBuf::from(db));
        }
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            let size: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid {ENV_PAGE_SIZE}: {raw}"))?;
            if size == 0 {
                anyhow::bail!("Invalid {ENV_PAGE_SIZE}: must be at least 1");
            }
            self.reviews.page_size = size;
        }
        Ok(())
    }
}

/// Load `.ratewise/config.toml` under `project_root`, or defaults if absent.
pub fn load_project_config(project_root: &Path) -> Result<Config> {
    let path = project_root.join(RATEWISE_DIR).join(CONFIG_FILE);
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Config>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Project config with environment overrides applied.
pub fn resolve_config(project_root: &Path) -> Result<Config> {
    let mut config = load_project_config(project_root)?;
    config.apply_env(|key| env::var(key).ok())?;
    Ok(config)
}

/// Write a default config file unless one exists. Returns its path.
pub fn write_default_config(project_root: &Path) -> Result<PathBuf> {
    let dir = project_root.join(RATEWISE_DIR);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        let content =
            toml::to_string_pretty(&Config::default()).context("Failed to serialize config")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let config = load_project_config(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.reviews.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.database.enforce_foreign_keys);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(RATEWISE_DIR)).unwrap();
        std::fs::write(
            dir.path().join(RATEWISE_DIR).join(CONFIG_FILE),
            "[reviews]\npage_size = 5\n",
        )
        .unwrap();

        let config = load_project_config(dir.path()).unwrap();
        assert_eq!(config.reviews.page_size, 5);
        assert!(config.database.enforce_foreign_keys);
        assert_eq!(
            config.database_path(dir.path()),
            dir.path().join(RATEWISE_DIR).join(DB_FILE)
        );
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(RATEWISE_DIR)).unwrap();
        std::fs::write(
            dir.path().join(RATEWISE_DIR).join(CONFIG_FILE),
            "[reviews]\npage_size = \"many\"\n",
        )
        .unwrap();
        assert!(load_project_config(dir.path()).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> =
            HashMap::from([(ENV_DB, "data/reviews.db"), (ENV_PAGE_SIZE, "25")]);
        let mut config = Config::default();
        config
            .apply_env(|k| vars.get(k).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.reviews.page_size, 25);
        let root = Path::new("/srv/app");
        assert_eq!(config.database_path(root), root.join("data/reviews.db"));
    }

    #[test]
    fn test_bad_page_size_env() {
        let mut config = Config::default();
        assert!(config
            .apply_env(|k| (k == ENV_PAGE_SIZE).then(|| "0".to_string()))
            .is_err());
        assert!(config
            .apply_env(|k| (k == ENV_PAGE_SIZE).then(|| "lots".to_string()))
            .is_err());
    }

    #[test]
    fn test_write_default_config_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = write_default_config(dir.path()).unwrap();
        assert!(path.exists());
        assert_eq!(load_project_config(dir.path()).unwrap(), Config::default());
    }
}
