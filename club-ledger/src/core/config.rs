use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use shared::AppError;

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-lifetime state only
    Memory,
    /// One JSON snapshot file (`ledger.json`)
    Json,
    /// Embedded redb database (`ledger.redb`)
    Redb,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Json => "json",
            Self::Redb => "redb",
        }
    }

    fn file_name(&self) -> &'static str {
        match self {
            Self::Memory => "",
            Self::Json => "ledger.json",
            Self::Redb => "ledger.redb",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "json" | "file" => Ok(Self::Json),
            "redb" => Ok(Self::Redb),
            other => Err(AppError::config(format!(
                "Unknown storage backend '{}' (expected memory, json or redb)",
                other
            ))),
        }
    }
}

/// Ledger configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | persisted state directory |
/// | STORAGE_BACKEND | json | memory, json or redb |
/// | LOG_LEVEL | info | tracing level |
/// | LOG_DIR | (unset) | daily rolling log files when the directory exists |
/// | ADMIN_CREDENTIALS | (unset) | `id:secret` pairs separated by `,` |
/// | ENVIRONMENT | development | free-form label |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/srv/club STORAGE_BACKEND=redb club-ledger events
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the data file
    pub work_dir: PathBuf,
    /// Which storage adapter to open
    pub storage_backend: StorageBackend,
    /// tracing level (trace/debug/info/warn/error)
    pub log_level: String,
    /// Optional log directory
    pub log_dir: Option<String>,
    /// Administrator (identifier, secret) pairs
    pub admin_credentials: Vec<(String, String)>,
    /// development | staging | production
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("./data"),
            storage_backend: StorageBackend::Json,
            log_level: "info".into(),
            log_dir: None,
            admin_credentials: Vec::new(),
            environment: "development".into(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults; an unknown backend name is an error.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        Ok(Self {
            work_dir: std::env::var("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            storage_backend: match std::env::var("STORAGE_BACKEND") {
                Ok(value) => value.parse()?,
                Err(_) => defaults.storage_backend,
            },
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty()),
            admin_credentials: std::env::var("ADMIN_CREDENTIALS")
                .map(|raw| parse_credential_pairs(&raw))
                .unwrap_or_default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        })
    }

    /// Override the storage location (used by tests and the CLI flags)
    pub fn with_overrides(work_dir: impl Into<PathBuf>, storage_backend: StorageBackend) -> Self {
        Self {
            work_dir: work_dir.into(),
            storage_backend,
            ..Self::default()
        }
    }

    /// Path of the data file for file-backed storage
    pub fn data_file_path(&self) -> PathBuf {
        self.work_dir.join(self.storage_backend.file_name())
    }
}

/// Parse `id:secret,id2:secret2`; malformed entries are skipped.
pub fn parse_credential_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|entry| {
            let (id, secret) = entry.trim().split_once(':')?;
            let (id, secret) = (id.trim(), secret.trim());
            if id.is_empty() || secret.is_empty() {
                tracing::warn!(entry = %id, "Ignoring malformed admin credential entry");
                return None;
            }
            Some((id.to_string(), secret.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!("JSON".parse::<StorageBackend>().unwrap(), StorageBackend::Json);
        assert_eq!("redb".parse::<StorageBackend>().unwrap(), StorageBackend::Redb);
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);

        let err = "mongo".parse::<StorageBackend>().unwrap_err();
        assert_eq!(err.code, shared::ErrorCode::ConfigError);
    }

    #[test]
    fn test_parse_credential_pairs() {
        let pairs = parse_credential_pairs("admin:password, GI11120:CSS12340 ,broken,:x");
        assert_eq!(
            pairs,
            vec![
                ("admin".to_string(), "password".to_string()),
                ("GI11120".to_string(), "CSS12340".to_string()),
            ]
        );
    }

    #[test]
    fn test_secret_may_contain_colon() {
        let pairs = parse_credential_pairs("ops:a:b");
        assert_eq!(pairs, vec![("ops".to_string(), "a:b".to_string())]);
    }

    #[test]
    fn test_data_file_path() {
        let config = Config::with_overrides("/tmp/club", StorageBackend::Redb);
        assert_eq!(config.data_file_path(), PathBuf::from("/tmp/club/ledger.redb"));
        assert_eq!(config.log_level, "info");
    }
}
