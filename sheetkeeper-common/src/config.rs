//! Configuration loading and resolution
//!
//! Settings are resolved in priority order:
//! 1. Environment variables (`SHEETKEEPER_*`)
//! 2. TOML config file
//! 3. Compiled defaults
//!
//! The config file itself is located via `--config`/`SHEETKEEPER_CONFIG`, then
//! `~/.config/sheetkeeper/config.toml`, then `/etc/sheetkeeper/config.toml`.
//! A missing file is not an error: a warning is logged and defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
const DEFAULT_RICH_MEDIA_COMMAND: &str = "yt-dlp";
/// Archive host whose pages the rich-media extractor mis-handles
const DEFAULT_EXCLUDED_HOST: &str = "web.archive.org";
/// `SHEETKEEPER_RICH_MEDIA_EXCLUDE` value that clears the exclusion list
const EXCLUDE_NOTHING: &str = "none";

/// Complete service configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Job description, e.g. `id1:sheet1:sheet2::id2:sheet1`
    #[serde(default)]
    pub sheets: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub sheets_api: SheetsApiConfig,

    #[serde(default)]
    pub rich_media: RichMediaConfig,

    /// Column layout used for sheets without an override
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Per-sheet layout overrides keyed by sheet (tab) name
    #[serde(default)]
    pub layouts: HashMap<String, LayoutConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Snapshot object storage (S3 or S3-compatible)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Bucket name (required)
    #[serde(default)]
    pub bucket: Option<String>,

    /// Custom endpoint for S3-compatible providers
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Region; falls back to the AWS default provider chain when unset
    #[serde(default)]
    pub region: Option<String>,

    /// Prefix prepended to every snapshot key
    #[serde(default)]
    pub prefix: String,

    /// Static credentials; both must be set to take effect
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

/// Google Sheets REST API access
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SheetsApiConfig {
    #[serde(default = "default_sheets_api_base")]
    pub base_url: String,

    /// Static OAuth bearer token. Takes precedence over `credentials`.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Base64 of a Google service-account JSON key. Access tokens are
    /// minted from it per run and refreshed before they expire.
    #[serde(default)]
    pub credentials: Option<String>,
}

impl Default for SheetsApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_sheets_api_base(),
            access_token: None,
            credentials: None,
        }
    }
}

/// Rich-media extraction settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RichMediaConfig {
    /// Extraction tool executable
    #[serde(default = "default_rich_media_command")]
    pub command: String,

    /// Hosts that are never sent to the rich-media tool (subdomains included)
    #[serde(default = "default_excluded_hosts")]
    pub excluded_hosts: Vec<String>,
}

impl Default for RichMediaConfig {
    fn default() -> Self {
        Self {
            command: default_rich_media_command(),
            excluded_hosts: default_excluded_hosts(),
        }
    }
}

/// Column letters for one sheet layout.
///
/// With only `url_column` and `title_column` set this is the simple layout;
/// setting both `duration_column` and `upload_date_column` selects the
/// extended layout. Contiguity is checked when the layout is built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LayoutConfig {
    #[serde(default = "default_url_column")]
    pub url_column: String,

    #[serde(default)]
    pub duration_column: Option<String>,

    #[serde(default)]
    pub upload_date_column: Option<String>,

    #[serde(default = "default_title_column")]
    pub title_column: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            url_column: default_url_column(),
            duration_column: None,
            upload_date_column: None,
            title_column: default_title_column(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sheets_api_base() -> String {
    DEFAULT_SHEETS_API_BASE.to_string()
}

fn default_rich_media_command() -> String {
    DEFAULT_RICH_MEDIA_COMMAND.to_string()
}

fn default_excluded_hosts() -> Vec<String> {
    vec![DEFAULT_EXCLUDED_HOST.to_string()]
}

fn default_url_column() -> String {
    "A".to_string()
}

fn default_title_column() -> String {
    "B".to_string()
}

impl ServiceConfig {
    /// Load configuration from file (if any) and apply environment overrides.
    ///
    /// `explicit_path` comes from the command line; when it is given the file
    /// must exist. Otherwise the standard locations are searched.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => match find_config_file() {
                Some(path) => {
                    info!("Loading configuration from {}", path.display());
                    Self::from_file(&path)?
                }
                None => {
                    warn!("No config file found; using defaults and environment");
                    Self::default()
                }
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read config {} failed: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `SHEETKEEPER_*` overrides using the given variable lookup.
    ///
    /// Blank values are ignored. `SHEETKEEPER_RICH_MEDIA_EXCLUDE=none`
    /// empties the exclusion list.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SHEETKEEPER_SHEETS") {
            self.sheets = Some(v);
        }
        if let Some(v) = get("SHEETKEEPER_BUCKET") {
            self.storage.bucket = Some(v);
        }
        if let Some(v) = get("SHEETKEEPER_S3_ENDPOINT") {
            self.storage.endpoint = Some(v);
        }
        if let Some(v) = get("SHEETKEEPER_S3_REGION") {
            self.storage.region = Some(v);
        }
        if let Some(v) = get("SHEETKEEPER_S3_PREFIX") {
            self.storage.prefix = v;
        }
        if let Some(v) = get("SHEETKEEPER_ACCESS_TOKEN") {
            self.sheets_api.access_token = Some(v);
        }
        if let Some(v) = get("SHEETKEEPER_CREDENTIALS") {
            self.sheets_api.credentials = Some(v);
        }
        if let Some(v) = get("SHEETKEEPER_SHEETS_API_BASE") {
            self.sheets_api.base_url = v;
        }
        if let Some(v) = get("SHEETKEEPER_RICH_MEDIA_EXCLUDE") {
            self.rich_media.excluded_hosts = if v.trim().eq_ignore_ascii_case(EXCLUDE_NOTHING) {
                Vec::new()
            } else {
                v.split(',')
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(str::to_string)
                    .collect()
            };
        }
        if let Some(v) = get("SHEETKEEPER_YTDLP") {
            self.rich_media.command = v;
        }
        if let Some(v) = get("SHEETKEEPER_LOG_LEVEL") {
            self.logging.level = v;
        }
    }

    /// Check that everything a run needs is present
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();

        if !is_set(&self.sheets) {
            missing.push("sheets (SHEETKEEPER_SHEETS)");
        }
        if !is_set(&self.storage.bucket) {
            missing.push("storage.bucket (SHEETKEEPER_BUCKET)");
        }
        if !is_set(&self.sheets_api.access_token) && !is_set(&self.sheets_api.credentials) {
            missing.push(
                "sheets_api.access_token or sheets_api.credentials \
                 (SHEETKEEPER_ACCESS_TOKEN / SHEETKEEPER_CREDENTIALS)",
            );
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "Missing required settings: {}",
                missing.join(", ")
            )))
        }
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Search the standard config locations
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("sheetkeeper").join("config.toml"));
    let system_config = PathBuf::from("/etc/sheetkeeper/config.toml");

    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }
    if system_config.exists() {
        return Some(system_config);
    }
    None
}
