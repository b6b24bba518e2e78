//! Configuration for wachat.
//!
//! Sources, lowest to highest priority:
//!
//! 1. **Compiled defaults**
//! 2. **User config file** - `~/.config/wachat/config.toml`
//! 3. **Environment variables** - `WACHAT_*` prefix
//! 4. **CLI arguments**
//!
//! # Example Configuration File
//!
//! ```toml
//! [parse]
//! decode_media = true
//! transcript_suffix = ".txt"
//!
//! [output]
//! format = "text"
//! colors = true
//! ```

use crate::error::{ChatError, Result, VALID_OUTPUT_FORMATS, find_closest_match};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parse: ParseConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Read attachment bytes to fill in durations and dimensions.
    /// Environment variable: `WACHAT_NO_MEDIA` turns this off.
    pub decode_media: bool,

    /// Name suffix that marks the transcript entry.
    pub transcript_suffix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// text, json, json-pretty, compact or csv.
    /// Environment variable: `WACHAT_FORMAT`
    pub format: String,

    pub colors: bool,

    /// Suppress the summary header and spinner.
    pub quiet: bool,

    /// Print how long the parse took.
    pub timings: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            decode_media: true,
            transcript_suffix: ".txt".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            colors: true,
            quiet: false,
            timings: false,
        }
    }
}

impl Config {
    /// Defaults, overlaid with the user file (if it parses) and then the
    /// environment.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(path) = Self::user_config_path() {
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(user) => config.merge(user),
                    Err(e) => warn!("Ignoring config file: {}", e),
                }
            } else {
                debug!("Config file not found: {}", path.display());
            }
        }

        config.apply_env_overrides();
        debug!("Configuration loaded: {:?}", config);
        config
    }

    /// # Errors
    ///
    /// Returns [`ChatError::PathError`] if the file cannot be read and
    /// [`ChatError::Config`] if it is not valid TOML for this schema.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ChatError::path_error("read config", path, e))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ChatError::config(path, e.to_string()))?;
        config.validate(path)?;
        info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if !VALID_OUTPUT_FORMATS.contains(&self.output.format.as_str()) {
            return Err(ChatError::config(path, unknown_format_reason(&self.output.format)));
        }
        if self.parse.transcript_suffix.is_empty() {
            return Err(ChatError::config(path, "parse.transcript_suffix is empty"));
        }
        Ok(())
    }

    #[must_use]
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("wachat").join("config.toml"))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(format) = std::env::var("WACHAT_FORMAT") {
            if VALID_OUTPUT_FORMATS.contains(&format.as_str()) {
                self.output.format = format;
            } else {
                let err = ChatError::EnvVar {
                    var: "WACHAT_FORMAT".to_string(),
                    reason: unknown_format_reason(&format),
                };
                warn!("Ignoring override: {}", err);
            }
        }
        if std::env::var("WACHAT_NO_MEDIA").is_ok() {
            self.parse.decode_media = false;
        }
        if std::env::var("WACHAT_NO_COLOR").is_ok() || std::env::var("NO_COLOR").is_ok() {
            self.output.colors = false;
        }
        if std::env::var("WACHAT_QUIET").is_ok() {
            self.output.quiet = true;
        }
    }

    /// Overlay `other` onto `self`; `other` wins.
    pub fn merge(&mut self, other: Self) {
        self.parse = other.parse;
        self.output = other.output;
    }

    /// Write to the user config file, creating its directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined or
    /// the file cannot be written.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::user_config_path().ok_or_else(|| {
            ChatError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// # Errors
    ///
    /// Returns an error if the parent directory or the file cannot be
    /// written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ChatError::path_error("create", parent, e))?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| ChatError::config(path, e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ChatError::path_error("write", path, e))?;
        info!("Saved config to: {}", path.display());
        Ok(())
    }
}

fn unknown_format_reason(format: &str) -> String {
    use std::fmt::Write;

    let mut reason = format!(
        "output format must be one of {}, got '{format}'",
        VALID_OUTPUT_FORMATS.join(", ")
    );
    if let Some(close) = find_closest_match(format, VALID_OUTPUT_FORMATS, None) {
        let _ = write!(reason, " (did you mean '{close}'?)");
    }
    reason
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.parse.decode_media);
        assert_eq!(config.parse.transcript_suffix, ".txt");
        assert_eq!(config.output.format, "text");
        assert!(config.output.colors);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[parse]\ndecode_media = false\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert!(!config.parse.decode_media);
        assert_eq!(config.parse.transcript_suffix, ".txt");
        assert_eq!(config.output.format, "text");
    }

    #[test]
    fn test_bad_format_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[output]\nformat = \"yaml\"\n").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ChatError::Config { .. }));
        assert!(err.to_string().contains("yaml"));
    }

    #[test]
    fn test_near_miss_format_suggests() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[output]\nformat = \"jsno\"\n").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("did you mean 'json'?"));
    }

    #[test]
    fn test_malformed_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[parse\n").unwrap();
        assert!(matches!(
            Config::load_from_file(&path),
            Err(ChatError::Config { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_path_error() {
        let err = Config::load_from_file(Path::new("/nonexistent/wachat.toml")).unwrap_err();
        assert!(matches!(err, ChatError::PathError { .. }));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.output.format = "csv".to_string();
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        let mut other = Config::default();
        other.output.format = "json".to_string();
        other.parse.decode_media = false;
        base.merge(other);
        assert_eq!(base.output.format, "json");
        assert!(!base.parse.decode_media);
    }
}
