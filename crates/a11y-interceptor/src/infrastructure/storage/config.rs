//! TOML-based configuration persistence for the interceptor service.
//!
//! The default file lives at:
//! - Windows:  `%APPDATA%\A11yInput\config.toml`
//! - Linux:    `~/.config/a11y-input/config.toml`
//! - macOS:    `~/Library/Application Support/A11yInput/config.toml`
//!
//! # File layout (for beginners)
//!
//! The `[service]` table holds settings for the process itself. Every other
//! table holds thresholds for one chain link and maps straight onto
//! [`a11y_core::PipelineConfig`]:
//!
//! ```toml
//! [service]
//! features = ["touch-exploration", "key-filtering"]
//! log_level = "debug"
//!
//! [gesture]
//! double_tap_timeout_ms = 250
//!
//! [dwell_click]
//! delay_ms = 800
//! ```
//!
//! Every field has a serde default, so a file only needs to mention what it
//! changes. A missing file is the same as an empty one.

use std::path::{Path, PathBuf};

use a11y_core::{Feature, FeatureFlags, PipelineConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reading or writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no platform config directory (HOME/APPDATA unset)")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Everything the service reads from disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(flatten)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Links enabled at startup.
    #[serde(default = "default_features")]
    pub features: Vec<Feature>,
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ServiceConfig {
    pub fn feature_flags(&self) -> FeatureFlags {
        self.features.iter().copied().collect()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            features: default_features(),
            log_level: default_log_level(),
        }
    }
}

fn default_features() -> Vec<Feature> {
    vec![
        Feature::TouchExploration,
        Feature::KeyFiltering,
        Feature::GestureInjection,
    ]
}
fn default_log_level() -> String {
    "info".to_string()
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the platform default path of the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the base directory
/// cannot be determined from the environment.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Reads the config at `path`. A missing file yields `AppConfig::default()`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("A11yInput"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("a11y-input"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("A11yInput")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use a11y_core::Rect;
    use uuid::Uuid;

    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("a11y-input-test-{}", Uuid::new_v4()))
            .join("nested")
            .join("config.toml")
    }

    #[test]
    fn test_default_service_config_enables_screen_reader_links() {
        // Arrange / Act
        let flags = ServiceConfig::default().feature_flags();

        // Assert
        assert!(flags.contains(Feature::TouchExploration));
        assert!(flags.contains(Feature::KeyFiltering));
        assert!(flags.contains(Feature::GestureInjection));
        assert!(!flags.contains(Feature::Magnification));
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("parse");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_file_overrides_only_named_fields() {
        // Arrange
        let text = r#"
            [service]
            features = ["magnification", "dwell-click"]

            [gesture]
            double_tap_timeout_ms = 250

            [dwell_click]
            delay_ms = 800
        "#;

        // Act
        let cfg: AppConfig = toml::from_str(text).expect("parse");

        // Assert
        assert_eq!(cfg.service.features, vec![Feature::Magnification, Feature::DwellClick]);
        assert_eq!(cfg.service.log_level, "info");
        assert_eq!(cfg.pipeline.gesture.double_tap_timeout_ms, 250);
        assert_eq!(cfg.pipeline.gesture.long_press_timeout_ms, 400);
        assert_eq!(cfg.pipeline.dwell_click.delay_ms, 800);
        assert_eq!(cfg.pipeline.key_relay.timeout_ms, 500);
    }

    #[test]
    fn test_unknown_feature_name_is_a_parse_error() {
        let result: Result<AppConfig, _> = toml::from_str("[service]\nfeatures = [\"teleport\"]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        // Arrange
        let path = scratch_path();

        // Act
        let cfg = load_config(&path).expect("load");

        // Assert
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_save_then_load_preserves_settings() {
        // Arrange
        let path = scratch_path();
        let mut cfg = AppConfig::default();
        cfg.service.features = vec![Feature::MouseKeys];
        cfg.pipeline.mouse_keys.step = 12.0;
        cfg.pipeline
            .magnification
            .excluded_regions
            .push(Rect::new(0.0, 0.0, 100.0, 50.0));

        // Act
        save_config(&path, &cfg).expect("save");
        let restored = load_config(&path).expect("load");

        // Assert
        assert_eq!(restored, cfg);
        if let Some(root) = path.parent().and_then(Path::parent) {
            let _ = std::fs::remove_dir_all(root);
        }
    }

    #[test]
    fn test_malformed_file_reports_parse_error() {
        // Arrange
        let path = scratch_path();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).expect("mkdir");
        }
        std::fs::write(&path, "[gesture\ntap_slop = ").expect("write");

        // Act
        let result = load_config(&path);

        // Assert
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        if let Some(root) = path.parent().and_then(Path::parent) {
            let _ = std::fs::remove_dir_all(root);
        }
    }
}
