use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to database file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory export bundles are written to
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Path to log file (stdout belongs to the UI)
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    /// Log filter used when RUST_LOG is not set (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Install the starter deck when the database is new (default: true)
    #[serde(default = "default_seed_sample_cards")]
    pub seed_sample_cards: bool,

    /// Show the next interval next to each rating key (default: true)
    #[serde(default = "default_show_intervals")]
    pub show_intervals: bool,
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("kelma").join("kelma.db"))
        .unwrap_or_else(|| PathBuf::from("kelma.db"))
}

fn default_export_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_log_path() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("kelma").join("kelma.log"))
        .unwrap_or_else(|| PathBuf::from("kelma.log"))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_seed_sample_cards() -> bool {
    true
}

fn default_show_intervals() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            export_dir: default_export_dir(),
            log_path: default_log_path(),
            log_level: default_log_level(),
            seed_sample_cards: default_seed_sample_cards(),
            show_intervals: default_show_intervals(),
        }
    }
}

pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(suffix) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(suffix);
    }
    path.to_path_buf()
}

impl Config {
    /// Load config from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
            Self::parse(&content)
                .with_context(|| format!("Invalid config: {}", config_path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Parse TOML config text, filling in defaults
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.db_path = expand_tilde(&config.db_path);
        config.export_dir = expand_tilde(&config.export_dir);
        config.log_path = expand_tilde(&config.log_path);
        Ok(config)
    }

    /// Path to config file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("kelma").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Ensure required directories exist
    pub fn ensure_dirs(&self) -> Result<()> {
        for path in [&self.db_path, &self.log_path] {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.log_level, "info");
        assert!(config.seed_sample_cards);
        assert!(config.show_intervals);
        assert_eq!(config.db_path, default_db_path());
    }

    #[test]
    fn test_parse_overrides() {
        let config = Config::parse(
            r#"
            db_path = "/tmp/kelma/test.db"
            log_level = "debug"
            seed_sample_cards = false
            "#,
        )
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/kelma/test.db"));
        assert_eq!(config.log_level, "debug");
        assert!(!config.seed_sample_cards);
        assert!(config.show_intervals);
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        assert!(Config::parse("seed_sample_cards = \"yes\"").is_err());
    }

    #[test]
    fn test_expand_tilde() {
        let plain = PathBuf::from("/var/lib/kelma.db");
        assert_eq!(expand_tilde(&plain), plain);

        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_tilde(Path::new("~/exports")),
                home.join("exports")
            );
        }
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            db_path: dir.path().join("data").join("kelma.db"),
            log_path: dir.path().join("logs").join("kelma.log"),
            ..Config::default()
        };

        config.ensure_dirs().unwrap();
        assert!(dir.path().join("data").is_dir());
        assert!(dir.path().join("logs").is_dir());
    }
}
