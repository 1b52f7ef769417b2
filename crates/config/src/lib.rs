//! Shared configuration for Hadir
//!
//! This crate provides the single source of truth for the signature canvas
//! geometry, the storage backend endpoint, the admin credential set, the
//! session cookie policy and the event labels used by exports.
//!
//! Values come from compiled-in defaults, then an optional JSON file, then
//! environment variables.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default listen address
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Default signature canvas width in CSS pixels
pub const DEFAULT_CANVAS_WIDTH: u32 = 400;

/// Default signature canvas height in CSS pixels
pub const DEFAULT_CANVAS_HEIGHT: u32 = 200;

/// Default pen width in CSS pixels
pub const DEFAULT_LINE_WIDTH: f32 = 2.0;

/// Default JPEG quality for encoded signatures (0.8)
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Blob bucket holding signature images
pub const DEFAULT_BUCKET: &str = "ttd";

/// Name of the admin session cookie
pub const SESSION_COOKIE: &str = "admin_session";

/// Session cookie lifetime (one day)
pub const SESSION_MAX_AGE_SECS: i64 = 60 * 60 * 24;

/// Realtime heartbeat interval
pub const DEFAULT_HEARTBEAT_SECS: u64 = 30;

pub const DEFAULT_EVENT_TITLE: &str = "DAFTAR HADIR RAPAT BOD ESELON 1 PT SEMEN TONASA";

pub const DEFAULT_EXPORT_PREFIX: &str = "Daftar_Hadir_Rapat_BODES1_2026";

/// Local time used for export timestamps (WITA, UTC+8)
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;

/// Department choices offered when registering a participant
pub const DEFAULT_DEPARTMENTS: &[&str] = &[
    "DANA PENSIUN",
    "DEPT. OF CLINKER & CEMENT PRODUCTION",
    "DEPT. OF COMMUNICATION & LGA",
    "DEPT. OF FINANCE (BUSINESS CONTROLLER)",
    "DEPT. OF HUMAN CAPITAL & GRC",
    "DEPT. OF INFRASTRUCTURE",
    "DEPT. OF INTERNAL AUDIT",
    "DEPT. OF INVENTORY MANAGEMENT",
    "DEPT. OF MAINTENANCE",
    "DEPT. OF MARKET PLANNING & DEVELOPMENT",
    "DEPT. OF MINING & POWER PLANT",
    "DEPT. OF PRODUCTION PLANNING & CONTROL",
    "DEPT. OF PROJECT MGMT & MAINT. SUPPORT",
    "DEPT. OF SALES",
    "DEWAN KOMISARIS",
    "DIREKSI",
    "GROUP HEAD OF PROCUREMENT",
    "KOMITE AUDIT",
    "KOPKAR ST",
    "OOTC",
    "PT BIRINGKASSI RAYA",
    "PT EMKL TOPABIRING",
    "PT PELSINDO",
    "PT PKM",
    "PT SETRA",
    "PT TONASA LINES",
    "SEK. DEKOM / KOMITE PEMANTAU RISIKO",
    "SKST",
    "STAF SEK. DEKOM",
    "UNIT OF WAREHOUSE",
    "YKST",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub canvas: CanvasConfig,
    pub backend: BackendConfig,
    pub auth: AuthConfig,
    pub event: EventConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,
    /// Production mode marks the session cookie Secure
    pub production: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            production: false,
        }
    }
}

/// Signature canvas geometry and encoding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub line_width: f32,
    pub jpeg_quality: u8,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            line_width: DEFAULT_LINE_WIDTH,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Which storage backend serves records, blobs and change events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-local tables (tests, demos)
    #[default]
    Memory,
    /// Supabase project (PostgREST + Storage + Realtime)
    Supabase,
}

impl BackendKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "supabase" => Some(Self::Supabase),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: Option<String>,
    /// Public anon key sent as `apikey` and bearer token
    pub anon_key: Option<String>,
    pub bucket: String,
    pub heartbeat_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory,
            url: None,
            anon_key: None,
            bucket: DEFAULT_BUCKET.to_string(),
            heartbeat_secs: DEFAULT_HEARTBEAT_SECS,
        }
    }
}

/// One accepted admin username/password pair
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub credentials: Vec<Credential>,
    pub cookie_name: String,
    pub max_age_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials: Vec::new(),
            cookie_name: SESSION_COOKIE.to_string(),
            max_age_secs: SESSION_MAX_AGE_SECS,
        }
    }
}

impl AuthConfig {
    /// True if the pair exactly matches one configured credential
    pub fn accepts(&self, username: &str, password: &str) -> bool {
        self.credentials
            .iter()
            .any(|c| c.username == username && c.password == password)
    }
}

/// Labels and choices specific to the event being run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub title: String,
    pub export_prefix: String,
    pub departments: Vec<String>,
    /// Offset applied to timestamps shown in exports
    pub utc_offset_minutes: i32,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_EVENT_TITLE.to_string(),
            export_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
            departments: DEFAULT_DEPARTMENTS.iter().map(|d| d.to_string()).collect(),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
        }
    }
}

impl AppConfig {
    /// Parse a JSON document; missing sections fall back to defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config file {}", path.display());
        Self::from_json_str(&json)
    }

    /// Defaults or `path`, then process environment overrides, then validation
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup
    ///
    /// Recognised keys: `HADIR_BIND`, `HADIR_PRODUCTION`, `HADIR_BACKEND`,
    /// `SUPABASE_URL`, `SUPABASE_ANON_KEY`, `HADIR_BUCKET`,
    /// `HADIR_ADMIN_CREDENTIALS` (`user:pass` pairs separated by commas),
    /// `HADIR_EVENT_TITLE`, `HADIR_EXPORT_PREFIX`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("HADIR_BIND") {
            self.server.bind = bind;
        }
        if let Some(value) = lookup("HADIR_PRODUCTION") {
            self.server.production = parse_bool("HADIR_PRODUCTION", &value)?;
        }
        if let Some(value) = lookup("HADIR_BACKEND") {
            self.backend.kind =
                BackendKind::parse(&value).ok_or_else(|| ConfigError::InvalidValue {
                    key: "HADIR_BACKEND".to_string(),
                    value,
                })?;
        }
        if let Some(url) = lookup("SUPABASE_URL") {
            self.backend.url = Some(url);
        }
        if let Some(key) = lookup("SUPABASE_ANON_KEY") {
            self.backend.anon_key = Some(key);
        }
        if let Some(bucket) = lookup("HADIR_BUCKET") {
            self.backend.bucket = bucket;
        }
        if let Some(value) = lookup("HADIR_ADMIN_CREDENTIALS") {
            self.auth.credentials = parse_credentials(&value)?;
        }
        if let Some(title) = lookup("HADIR_EVENT_TITLE") {
            self.event.title = title;
        }
        if let Some(prefix) = lookup("HADIR_EXPORT_PREFIX") {
            self.event.export_prefix = prefix;
        }
        Ok(())
    }

    /// Check cross-field requirements
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.kind == BackendKind::Supabase {
            if self.backend.url.as_deref().is_none_or(str::is_empty) {
                return Err(ConfigError::Missing("SUPABASE_URL"));
            }
            if self.backend.anon_key.as_deref().is_none_or(str::is_empty) {
                return Err(ConfigError::Missing("SUPABASE_ANON_KEY"));
            }
        }
        if self.canvas.jpeg_quality == 0 || self.canvas.jpeg_quality > 100 {
            return Err(ConfigError::InvalidValue {
                key: "canvas.jpeg_quality".to_string(),
                value: self.canvas.jpeg_quality.to_string(),
            });
        }
        if self.event.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::InvalidValue {
                key: "event.utc_offset_minutes".to_string(),
                value: self.event.utc_offset_minutes.to_string(),
            });
        }
        if self.auth.credentials.is_empty() {
            warn!("No admin credentials configured; the dashboard login will reject everyone");
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_credentials(value: &str) -> Result<Vec<Credential>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once(':') {
            Some((user, pass)) if !user.is_empty() => Ok(Credential::new(user, pass)),
            _ => Err(ConfigError::InvalidValue {
                key: "HADIR_ADMIN_CREDENTIALS".to_string(),
                value: user_part(pair),
            }),
        })
        .collect()
}

/// Echo only the username half of a malformed pair in errors
fn user_part(pair: &str) -> String {
    pair.split(':').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, DEFAULT_BIND);
        assert_eq!(config.canvas.width, DEFAULT_CANVAS_WIDTH);
        assert_eq!(config.canvas.jpeg_quality, 80);
        assert_eq!(config.backend.kind, BackendKind::Memory);
        assert_eq!(config.backend.bucket, "ttd");
        assert_eq!(config.auth.cookie_name, "admin_session");
        assert_eq!(config.auth.max_age_secs, 86_400);
        assert_eq!(config.event.departments.len(), DEFAULT_DEPARTMENTS.len());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            AppConfig::from_json_str(r#"{ "server": { "production": true } }"#).unwrap();
        assert!(config.server.production);
        assert_eq!(config.server.bind, DEFAULT_BIND);
        assert_eq!(config.canvas.height, DEFAULT_CANVAS_HEIGHT);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "backend": {{ "kind": "supabase", "url": "https://x.supabase.co", "anon_key": "k" }},
                "auth": {{ "credentials": [{{ "username": "admin", "password": "pw" }}] }}
            }}"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.backend.kind, BackendKind::Supabase);
        assert!(config.auth.accepts("admin", "pw"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::from_file(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("HADIR_BIND", "0.0.0.0:8080"),
                ("HADIR_PRODUCTION", "true"),
                ("HADIR_BACKEND", "Supabase"),
                ("SUPABASE_URL", "https://x.supabase.co"),
                ("SUPABASE_ANON_KEY", "anon"),
                ("HADIR_ADMIN_CREDENTIALS", "admin:one, operator:two"),
            ]))
            .unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert!(config.server.production);
        assert_eq!(config.backend.kind, BackendKind::Supabase);
        assert_eq!(config.auth.credentials.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_env_values() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env(&[("HADIR_BACKEND", "firebase")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = config
            .apply_env(env(&[("HADIR_ADMIN_CREDENTIALS", "nocolon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_supabase_requires_endpoint() {
        let mut config = AppConfig::default();
        config.backend.kind = BackendKind::Supabase;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("SUPABASE_URL"))
        ));
        config.backend.url = Some("https://x.supabase.co".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("SUPABASE_ANON_KEY"))
        ));
    }

    #[test]
    fn test_credentials_match_exact_pairs() {
        let auth = AuthConfig {
            credentials: vec![Credential::new("admin", "a1"), Credential::new("ops", "o2")],
            ..Default::default()
        };
        assert!(auth.accepts("admin", "a1"));
        assert!(auth.accepts("ops", "o2"));
        // Cross-pair combinations are rejected
        assert!(!auth.accepts("admin", "o2"));
        assert!(!auth.accepts("ops", "a1"));
        assert!(!auth.accepts("Admin", "a1"));
        assert!(!auth.accepts("", ""));
    }

    #[test]
    fn test_credential_debug_redacts_password() {
        let rendered = format!("{:?}", Credential::new("admin", "secret"));
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("secret"));
    }
}
