//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.reel/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::controller::ControllerOptions;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ReelConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PlaybackConfig {
    pub slide_seconds: Option<f64>,
    pub tick_ms: Option<u64>,
    pub prefetch: Option<bool>,
    pub exit_on_finish: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FetchConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_SLIDE_SECONDS: f64 = 5.0;
pub const DEFAULT_TICK_MS: u64 = 50;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub slide_duration: Duration,
    pub tick_interval: Duration,
    pub prefetch: bool,
    pub exit_on_finish: bool,
    pub base_url: Option<String>,
    pub fetch_timeout: Duration,
}

impl ResolvedConfig {
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            prefetch: self.prefetch,
            default_slide_duration: self.slide_duration,
        }
    }
}

/// Values passed on the command line (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub slide_seconds: Option<f64>,
    pub no_prefetch: bool,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.reel/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".reel").join("config.toml"))
}

/// Load config from `~/.reel/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ReelConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ReelConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(ReelConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(ReelConfig::default());
    }

    load_config_from(&path)
}

/// Load config from an explicit path. A missing file is an error here.
pub fn load_config_from(path: &Path) -> Result<ReelConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ReelConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Reel Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [playback]
# slide_seconds = 5.0                # Or set REEL_SLIDE_SECONDS
# tick_ms = 50                       # Progress timer resolution
# prefetch = true                    # Warm the next slide's image
# exit_on_finish = true

# [fetch]
# base_url = "https://images.example.com"   # Or set REEL_BASE_URL
# timeout_secs = 10
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &ReelConfig, cli: &CliOverrides) -> ResolvedConfig {
    // Base URL: CLI → env → config
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| std::env::var("REEL_BASE_URL").ok())
        .or_else(|| config.fetch.base_url.clone());

    // Slide duration: CLI → env → config → default
    let slide_duration = cli
        .slide_seconds
        .or_else(|| {
            std::env::var("REEL_SLIDE_SECONDS")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
        })
        .or(config.playback.slide_seconds)
        .filter(|s| *s > 0.0)
        .and_then(|s| match Duration::try_from_secs_f64(s) {
            Ok(d) => Some(d),
            Err(e) => {
                warn!("Ignoring slide_seconds {}: {}", s, e);
                None
            }
        })
        .unwrap_or(Duration::from_secs_f64(DEFAULT_SLIDE_SECONDS));

    let tick_ms = config
        .playback
        .tick_ms
        .filter(|ms| *ms > 0)
        .unwrap_or(DEFAULT_TICK_MS);

    // --no-prefetch wins, otherwise config, otherwise on
    let prefetch = !cli.no_prefetch && config.playback.prefetch.unwrap_or(true);

    ResolvedConfig {
        slide_duration,
        tick_interval: Duration::from_millis(tick_ms),
        prefetch,
        exit_on_finish: config.playback.exit_on_finish.unwrap_or(true),
        base_url,
        fetch_timeout: Duration::from_secs(
            config
                .fetch
                .timeout_secs
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = ReelConfig::default();
        assert!(config.playback.slide_seconds.is_none());
        assert!(config.fetch.base_url.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let config = ReelConfig::default();
        let resolved = resolve(&config, &CliOverrides::default());
        assert_eq!(resolved.tick_interval, Duration::from_millis(DEFAULT_TICK_MS));
        assert_eq!(
            resolved.fetch_timeout,
            Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS)
        );
        assert!(resolved.prefetch);
        assert!(resolved.exit_on_finish);
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = ReelConfig {
            playback: PlaybackConfig {
                slide_seconds: Some(3.0),
                tick_ms: Some(20),
                prefetch: Some(false),
                exit_on_finish: Some(false),
            },
            fetch: FetchConfig {
                base_url: Some("https://cdn.example.com".to_string()),
                timeout_secs: Some(2),
            },
        };
        let resolved = resolve(
            &config,
            &CliOverrides {
                slide_seconds: Some(3.0),
                ..Default::default()
            },
        );
        assert_eq!(resolved.slide_duration, Duration::from_secs(3));
        assert_eq!(resolved.tick_interval, Duration::from_millis(20));
        assert!(!resolved.prefetch);
        assert!(!resolved.exit_on_finish);
        assert_eq!(resolved.fetch_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_resolve_cli_wins() {
        let config = ReelConfig {
            fetch: FetchConfig {
                base_url: Some("https://from-config.example.com".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let cli = CliOverrides {
            base_url: Some("http://localhost:8080".to_string()),
            slide_seconds: Some(2.5),
            no_prefetch: true,
        };
        let resolved = resolve(&config, &cli);
        assert_eq!(resolved.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(resolved.slide_duration, Duration::from_secs_f64(2.5));
        assert!(!resolved.prefetch);
        assert!(!resolved.controller_options().prefetch);
    }

    #[test]
    fn test_non_positive_values_fall_back() {
        let config = ReelConfig {
            playback: PlaybackConfig {
                tick_ms: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };
        let cli = CliOverrides {
            slide_seconds: Some(-4.0),
            ..Default::default()
        };
        let resolved = resolve(&config, &cli);
        assert_eq!(resolved.tick_interval, Duration::from_millis(DEFAULT_TICK_MS));
        assert_eq!(
            resolved.slide_duration,
            Duration::from_secs_f64(DEFAULT_SLIDE_SECONDS)
        );
    }

    #[test]
    fn test_out_of_range_slide_seconds_fall_back() {
        for seconds in [1e300, f64::INFINITY, f64::NAN] {
            let cli = CliOverrides {
                slide_seconds: Some(seconds),
                ..Default::default()
            };
            let resolved = resolve(&ReelConfig::default(), &cli);
            assert_eq!(
                resolved.slide_duration,
                Duration::from_secs_f64(DEFAULT_SLIDE_SECONDS)
            );
        }

        let config = ReelConfig {
            playback: PlaybackConfig {
                slide_seconds: Some(1e300),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve(&config, &CliOverrides::default());
        assert_eq!(
            resolved.slide_duration,
            Duration::from_secs_f64(DEFAULT_SLIDE_SECONDS)
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
[playback]
slide_seconds = 4.5
tick_ms = 25
prefetch = false

[fetch]
base_url = "https://images.example.com"
timeout_secs = 3
"#;
        let config: ReelConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.playback.slide_seconds, Some(4.5));
        assert_eq!(config.playback.tick_ms, Some(25));
        assert_eq!(config.playback.prefetch, Some(false));
        assert!(config.playback.exit_on_finish.is_none());
        assert_eq!(
            config.fetch.base_url.as_deref(),
            Some("https://images.example.com")
        );
    }

    #[test]
    fn test_sparse_toml_parses() {
        // Only override one thing, everything else stays default
        let config: ReelConfig = toml::from_str("[fetch]\ntimeout_secs = 1\n").unwrap();
        assert_eq!(config.fetch.timeout_secs, Some(1));
        assert!(config.playback.prefetch.is_none());
    }

    #[test]
    fn test_load_config_from_missing_file() {
        let path = std::env::temp_dir().join("reel-config-does-not-exist.toml");
        assert!(matches!(load_config_from(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_from_malformed_file() {
        let path = std::env::temp_dir().join(format!("reel-bad-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[playback\nslide_seconds = ").unwrap();
        let result = load_config_from(&path);
        let _ = fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
