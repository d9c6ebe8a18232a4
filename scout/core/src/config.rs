//! TOML Configuration File Support
//!
//! Configuration for the search service, form defaults and the map lives in
//! `$XDG_CONFIG_HOME/rental-scout/config.toml`.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI arguments, via [`ConfigOverrides`]
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [service]
//! endpoint = "http://localhost:8000/api/search/stream"
//! connect_timeout_ms = 5000
//!
//! [search]
//! planner = "gpt-4o"
//! executor = "gpt-4o-mini"
//! headless = true
//! max_listings = 10
//!
//! [map]
//! access_token = "pk.your-token"
//! style = "mapbox://styles/mapbox/streets-v12"
//! default_center = [-122.4194, 37.7749]
//! default_zoom = 12.0
//! fit_padding = 50
//! max_fit_zoom = 15.0
//! select_zoom = 15.0
//! animation_duration_ms = 1000
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::geo::LngLat;
use crate::request::{ModelId, SearchForm, DEFAULT_MAX_LISTINGS, MAX_LISTINGS, MIN_LISTINGS};

/// Environment variable naming the search endpoint
pub const ENV_ENDPOINT: &str = "SCOUT_ENDPOINT";

/// Environment variable holding the map access token
pub const ENV_ACCESS_TOKEN: &str = "MAPBOX_ACCESS_TOKEN";

/// Environment variable pointing at an alternative config file
pub const ENV_CONFIG_PATH: &str = "SCOUT_CONFIG";

/// Default streaming search endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/search/stream";

const HEALTH_PATH: &str = "/api/health";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Tracks where the configuration came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[service]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceToml {
    /// Streaming search endpoint
    pub endpoint: Option<String>,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,
}

/// `[search]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchToml {
    /// Planner model identifier
    pub planner: Option<String>,
    /// Executor model identifier
    pub executor: Option<String>,
    /// Run the agent's browser headless
    pub headless: Option<bool>,
    /// Default listing cap
    pub max_listings: Option<u8>,
}

/// `[map]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapToml {
    /// Map provider access token
    pub access_token: Option<String>,
    /// Style URL
    pub style: Option<String>,
    /// Initial center as `[lng, lat]`
    pub default_center: Option<[f64; 2]>,
    /// Initial zoom
    pub default_zoom: Option<f64>,
    /// Padding around fitted regions, in pixels
    pub fit_padding: Option<u32>,
    /// Zoom cap when fitting
    pub max_fit_zoom: Option<f64>,
    /// Zoom used when flying to a selection
    pub select_zoom: Option<f64>,
    /// Camera animation length in milliseconds
    pub animation_duration_ms: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutToml {
    /// Service section
    pub service: ServiceToml,
    /// Search defaults section
    pub search: SearchToml,
    /// Map section
    pub map: MapToml,
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Where and how to reach the search service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Streaming search endpoint
    pub endpoint: String,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout_ms: 5000,
        }
    }
}

impl ServiceConfig {
    /// Health endpoint on the same origin as the search endpoint
    #[must_use]
    pub fn health_url(&self) -> String {
        match Url::parse(&self.endpoint) {
            Ok(mut url) => {
                url.set_path(HEALTH_PATH);
                url.set_query(None);
                url.set_fragment(None);
                url.to_string()
            }
            Err(_) => format!("{}{HEALTH_PATH}", self.endpoint.trim_end_matches('/')),
        }
    }

    /// Connection timeout as a duration
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.endpoint).map_err(|e| {
            ConfigError::ValidationError(format!("endpoint {:?}: {e}", self.endpoint))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "endpoint {:?} must use http or https",
                self.endpoint
            )));
        }
        Ok(())
    }
}

/// Initial values for the search form
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchDefaults {
    /// Planner model
    pub planner: ModelId,
    /// Executor model
    pub executor: ModelId,
    /// Run the agent's browser headless
    pub headless: bool,
    /// Listing cap
    pub max_listings: u8,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            planner: ModelId::default_planner(),
            executor: ModelId::default_executor(),
            headless: true,
            max_listings: DEFAULT_MAX_LISTINGS,
        }
    }
}

impl SearchDefaults {
    /// A form pre-filled with these defaults
    #[must_use]
    pub fn form(&self, description: impl Into<String>) -> SearchForm {
        SearchForm::new(description)
            .with_planner(self.planner.as_str())
            .with_executor(self.executor.as_str())
            .with_headless(self.headless)
            .with_max_listings(self.max_listings.to_string())
    }
}

/// Map provider and camera settings
#[derive(Clone, Debug, PartialEq)]
pub struct MapConfig {
    /// Map provider access token
    pub access_token: Option<String>,
    /// Style URL
    pub style: String,
    /// Initial center
    pub default_center: LngLat,
    /// Initial zoom
    pub default_zoom: f64,
    /// Padding around fitted regions, in pixels
    pub fit_padding: u32,
    /// Zoom cap when fitting
    pub max_fit_zoom: f64,
    /// Zoom used when flying to a selection
    pub select_zoom: f64,
    /// Camera animation length in milliseconds
    pub animation_duration_ms: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            style: "mapbox://styles/mapbox/streets-v12".to_string(),
            default_center: LngLat::new(-122.4194, 37.7749),
            default_zoom: 12.0,
            fit_padding: 50,
            max_fit_zoom: 15.0,
            select_zoom: 15.0,
            animation_duration_ms: 1000,
        }
    }
}

impl MapConfig {
    /// Camera animation length
    #[must_use]
    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }
}

/// Everything the client needs, resolved from all sources
#[derive(Clone, Debug, PartialEq)]
pub struct ScoutConfig {
    /// Search service
    pub service: ServiceConfig,
    /// Form defaults
    pub search: SearchDefaults,
    /// Map settings
    pub map: MapConfig,
    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,
    source: ConfigSource,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            search: SearchDefaults::default(),
            map: MapConfig::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ScoutConfig {
    /// Highest-priority source that contributed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check values that cannot be expressed in the types
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.service.validate()?;
        if !(MIN_LISTINGS..=MAX_LISTINGS).contains(&self.search.max_listings) {
            return Err(ConfigError::ValidationError(format!(
                "search.max_listings must be between {MIN_LISTINGS} and {MAX_LISTINGS}, got {}",
                self.search.max_listings
            )));
        }
        if self.map.select_zoom < 0.0 || self.map.max_fit_zoom < 0.0 {
            return Err(ConfigError::ValidationError(
                "map zoom levels cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Default configuration file path
///
/// `$XDG_CONFIG_HOME/rental-scout/config.toml`, or the platform equivalent.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("rental-scout").join("config.toml"))
}

/// Load configuration from the default path, honoring `SCOUT_CONFIG`
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or a
/// resolved value is invalid. A missing file is not an error.
pub fn load_config() -> Result<ScoutConfig, ConfigError> {
    let path = std::env::var_os(ENV_CONFIG_PATH)
        .map(PathBuf::from)
        .or_else(default_config_path);
    load_config_from_path(path)
}

/// Load configuration from a specific path plus the process environment
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a resolved
/// value is invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ScoutConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration, reading environment variables through `env`
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ScoutConfig, ConfigError> {
    let mut config = ScoutConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ScoutToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(path = %config_path.display(), "Loaded configuration from file");
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

fn parse_model(field: &str, raw: &str) -> Result<ModelId, ConfigError> {
    raw.parse()
        .map_err(|e| ConfigError::ValidationError(format!("{field}: {e}")))
}

fn apply_toml_config(config: &mut ScoutConfig, toml: &ScoutToml) -> Result<(), ConfigError> {
    // Service
    if let Some(ref endpoint) = toml.service.endpoint {
        config.service.endpoint = endpoint.clone();
    }
    if let Some(timeout) = toml.service.connect_timeout_ms {
        config.service.connect_timeout_ms = timeout;
    }

    // Search defaults
    if let Some(ref planner) = toml.search.planner {
        config.search.planner = parse_model("search.planner", planner)?;
    }
    if let Some(ref executor) = toml.search.executor {
        config.search.executor = parse_model("search.executor", executor)?;
    }
    if let Some(headless) = toml.search.headless {
        config.search.headless = headless;
    }
    if let Some(max) = toml.search.max_listings {
        config.search.max_listings = max;
    }

    // Map
    let map = &toml.map;
    if map.access_token.is_some() {
        config.map.access_token = map.access_token.clone();
    }
    if let Some(ref style) = map.style {
        config.map.style = style.clone();
    }
    if let Some([lng, lat]) = map.default_center {
        config.map.default_center = LngLat::new(lng, lat);
    }
    if let Some(zoom) = map.default_zoom {
        config.map.default_zoom = zoom;
    }
    if let Some(padding) = map.fit_padding {
        config.map.fit_padding = padding;
    }
    if let Some(zoom) = map.max_fit_zoom {
        config.map.max_fit_zoom = zoom;
    }
    if let Some(zoom) = map.select_zoom {
        config.map.select_zoom = zoom;
    }
    if let Some(ms) = map.animation_duration_ms {
        config.map.animation_duration_ms = ms;
    }

    Ok(())
}

fn apply_env_config(config: &mut ScoutConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(endpoint) = env(ENV_ENDPOINT).filter(|v| !v.is_empty()) {
        config.service.endpoint = endpoint;
        config.source = ConfigSource::Env;
    }
    if let Some(token) = env(ENV_ACCESS_TOKEN).filter(|v| !v.is_empty()) {
        config.map.access_token = Some(token);
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Command-line overrides, applied after [`load_config`]
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Endpoint override
    pub endpoint: Option<String>,
    /// Access token override
    pub access_token: Option<String>,
    /// Connect timeout override (milliseconds)
    pub connect_timeout_ms: Option<u64>,
}

impl ConfigOverrides {
    /// Create an empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint override
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the access token override
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the connect timeout override
    #[must_use]
    pub fn with_connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = Some(ms);
        self
    }

    /// Apply overrides to a configuration, then revalidate it
    ///
    /// # Errors
    ///
    /// Returns an error if an override makes the configuration invalid.
    pub fn apply(&self, config: &mut ScoutConfig) -> Result<(), ConfigError> {
        if self.endpoint.is_some() || self.access_token.is_some() || self.connect_timeout_ms.is_some()
        {
            config.source = ConfigSource::Cli;
        }
        if let Some(ref endpoint) = self.endpoint {
            config.service.endpoint = endpoint.clone();
        }
        if let Some(ref token) = self.access_token {
            config.map.access_token = Some(token.clone());
        }
        if let Some(ms) = self.connect_timeout_ms {
            config.service.connect_timeout_ms = ms;
        }
        config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = ScoutConfig::default();
        assert_eq!(config.service.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.search.max_listings, 10);
        assert_eq!(config.search.planner, ModelId::Gpt4o);
        assert_eq!(config.search.executor, ModelId::Gpt4oMini);
        assert!(config.search.headless);
        assert_eq!(config.map.fit_padding, 50);
        assert_eq!(config.map.default_center, LngLat::new(-122.4194, 37.7749));
        assert_eq!(config.map.default_zoom, 12.0);
        assert_eq!(config.map.animation_duration(), Duration::from_secs(1));
        assert_eq!(config.map.access_token, None);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_default_config_path() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("rental-scout/config.toml"));
        }
    }

    #[test]
    fn test_health_url_shares_origin() {
        let service = ServiceConfig {
            endpoint: "https://scout.example.com:8443/api/search/stream?x=1".to_string(),
            ..ServiceConfig::default()
        };
        assert_eq!(
            service.health_url(),
            "https://scout.example.com:8443/api/health"
        );
        assert_eq!(
            ServiceConfig::default().health_url(),
            "http://localhost:8000/api/health"
        );
    }

    #[test]
    fn test_parse_valid_toml() {
        let file = write_config(
            r#"
[service]
endpoint = "http://scout.local:9000/api/search/stream"
connect_timeout_ms = 2500

[search]
planner = "claude-3.5-sonnet"
executor = "gpt-4o"
headless = false
max_listings = 25

[map]
access_token = "pk.file"
default_center = [-122.4, 37.7]
select_zoom = 14.0
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();
        assert_eq!(config.service.endpoint, "http://scout.local:9000/api/search/stream");
        assert_eq!(config.service.connect_timeout(), Duration::from_millis(2500));
        assert_eq!(config.search.planner, ModelId::Claude35Sonnet);
        assert_eq!(config.search.executor, ModelId::Gpt4o);
        assert!(!config.search.headless);
        assert_eq!(config.search.max_listings, 25);
        assert_eq!(config.map.access_token.as_deref(), Some("pk.file"));
        assert_eq!(config.map.default_center, LngLat::new(-122.4, 37.7));
        assert_eq!(config.map.select_zoom, 14.0);
        assert_eq!(config.map.fit_padding, 50);
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_missing_file_graceful() {
        let config =
            load_config_with_env(Some(PathBuf::from("/nonexistent/scout.toml")), no_env).unwrap();
        assert_eq!(config, ScoutConfig::default());
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = write_config("[service\nendpoint = ");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let file = write_config("[search]\nmax_listings = 80\n");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));

        let file = write_config("[search]\nplanner = \"gpt-5\"\n");
        let err = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap_err();
        assert!(err.to_string().contains("search.planner"));

        let file = write_config("[service]\nendpoint = \"ftp://scout\"\n");
        assert!(load_config_with_env(Some(file.path().to_path_buf()), no_env).is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_config(
            "[service]\nendpoint = \"http://file:8000/api/search/stream\"\n[map]\naccess_token = \"pk.file\"\n",
        );
        let env: HashMap<&str, &str> = [
            (ENV_ENDPOINT, "http://env:8000/api/search/stream"),
            (ENV_ACCESS_TOKEN, "pk.env"),
        ]
        .into_iter()
        .collect();

        let config = load_config_with_env(Some(file.path().to_path_buf()), |key| {
            env.get(key).map(|v| (*v).to_string())
        })
        .unwrap();
        assert_eq!(config.service.endpoint, "http://env:8000/api/search/stream");
        assert_eq!(config.map.access_token.as_deref(), Some("pk.env"));
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_empty_env_ignored() {
        let config = load_config_with_env(None, |_| Some(String::new())).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
        assert_eq!(config.map.access_token, None);
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config =
            load_config_with_env(None, |key| (key == ENV_ACCESS_TOKEN).then(|| "pk.env".to_string()))
                .unwrap();
        ConfigOverrides::new()
            .with_access_token("pk.cli")
            .with_connect_timeout_ms(100)
            .apply(&mut config)
            .unwrap();
        assert_eq!(config.map.access_token.as_deref(), Some("pk.cli"));
        assert_eq!(config.service.connect_timeout_ms, 100);
        assert_eq!(config.source(), ConfigSource::Cli);

        let err = ConfigOverrides::new()
            .with_endpoint("not a url")
            .apply(&mut config);
        assert!(err.is_err());
    }

    #[test]
    fn test_empty_overrides_keep_source() {
        let mut config = ScoutConfig::default();
        ConfigOverrides::new().apply(&mut config).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_defaults_fill_form() {
        let defaults = SearchDefaults {
            max_listings: 5,
            ..SearchDefaults::default()
        };
        let request = defaults.form("studio").validate().unwrap();
        assert_eq!(request.max_listings(), 5);
        assert_eq!(request.planner(), ModelId::Gpt4o);
        assert!(request.headless_mode());
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "CLI");
        assert_eq!(ConfigSource::File.to_string(), "config file");
    }
}
