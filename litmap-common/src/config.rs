//! Configuration loading and config file resolution
//!
//! Bootstrap configuration lives in a single TOML file. Each value is
//! resolved with the priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is never fatal: defaults are used and a warning
//! is logged. A config file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "LITMAP_CONFIG";

/// Environment variable carrying the Google Geocoding API key
pub const GOOGLE_API_KEY_ENV_VAR: &str = "LITMAP_GOOGLE_API_KEY";

const APP_DIR: &str = "litmap";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    pub logging: LoggingConfig,
    pub gazetteer: GazetteerConfig,
    pub geocoder: GeocoderConfig,
    pub cache: CacheConfig,
    pub dataset: DatasetConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Which representation of a country flows through the pipeline.
///
/// The region tables are keyed by the same representation, so one run must
/// use one field end-to-end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CountryField {
    /// Full English country name ("Brazil")
    #[default]
    Name,
    /// ISO 3166-1 alpha-2 code ("BR")
    Code,
}

impl std::str::FromStr for CountryField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "code" => Ok(Self::Code),
            other => Err(Error::InvalidInput(format!(
                "unknown country field '{}' (expected 'name' or 'code')",
                other
            ))),
        }
    }
}

/// Offline place registry (GeoNames export)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GazetteerConfig {
    /// Path to the GeoNames CSV export
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Field delimiter of the export
    pub delimiter: char,
    /// Match names ignoring case (the exact-match default has higher precision)
    pub case_insensitive: bool,
}

impl Default for GazetteerConfig {
    fn default() -> Self {
        Self {
            path: None,
            delimiter: ';',
            case_insensitive: false,
        }
    }
}

/// Online geocoding provider
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeocoderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Minimum delay between two provider calls
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
    pub country_field: CountryField,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            min_interval_ms: 40,
            timeout_secs: 30,
            country_field: CountryField::Name,
        }
    }
}

/// Persistent resolution cache
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub path: PathBuf,
    /// First location id handed out for an empty cache
    pub id_base: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("geocode_cache.csv"),
            id_base: 1,
        }
    }
}

/// Author dataset column names and reference-year derivation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub born_column: String,
    pub death_column: String,
    pub active_column: String,
    pub birth_year_column: String,
    pub death_year_column: String,
    /// Years added to the birth year when no death year is known
    pub reference_offset_years: i32,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            born_column: "borncity".to_string(),
            death_column: "deathcity".to_string(),
            active_column: "activecity".to_string(),
            birth_year_column: "birthyear".to_string(),
            death_year_column: "deathyear".to_string(),
            reference_offset_years: 60,
        }
    }
}

/// Locate the config file.
///
/// Priority: CLI path, `LITMAP_CONFIG`, `~/.config/litmap/config.toml`,
/// `/etc/litmap/config.toml` (Linux only). Returns `None` when no candidate
/// exists; an explicit CLI or env path is returned even if missing so the
/// caller can report it.
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE_NAME));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILE_NAME);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Default location for a user config file (used by `init-config`)
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR).join(CONFIG_FILE_NAME))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the bootstrap config, falling back to defaults when no file exists.
///
/// A missing file, including one named explicitly by CLI or env, is logged
/// and replaced by defaults. Only a file that exists but fails to read or
/// parse is an error.
pub fn load_config(cli_path: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_path) {
        Some(path) if path.exists() => {
            info!("Loading configuration from {}", path.display());
            load_toml_config(&path)
        }
        Some(path) => {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            warn!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Write a TOML config atomically (temp file + rename).
///
/// On Unix the file is created with mode 0600 since it may hold an API key.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    std::fs::write(&tmp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(Error::Io(e));
    }

    Ok(())
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve the Google Geocoding API key.
///
/// **Priority:** ENV → TOML
pub fn resolve_google_api_key(config: &TomlConfig) -> Result<String> {
    let env_key = std::env::var(GOOGLE_API_KEY_ENV_VAR)
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = config
        .geocoder
        .api_key
        .clone()
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "Google API key found in environment and TOML. Using environment (highest priority)."
        );
    }

    if let Some(key) = env_key {
        info!("Google API key loaded from environment variable");
        return Ok(key);
    }

    if let Some(key) = toml_key {
        info!("Google API key loaded from TOML config");
        return Ok(key);
    }

    Err(Error::Config(format!(
        "Google API key not configured. Set {} or [geocoder] api_key in the config file.",
        GOOGLE_API_KEY_ENV_VAR
    )))
}
