//! Server settings read from the environment

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BIND: &str = "0.0.0.0:8787";
pub const DEFAULT_DATA_DIR: &str = "./data";
/// Request body cap; transport protection only, well above the publish ceiling
pub const DEFAULT_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Which key/value backend holds the blobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Memory,
    Fs,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "fs" | "file" => Ok(BackendKind::Fs),
            other => Err(format!("unknown backend: {}", other)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Fs => write!(f, "fs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind: String,
    pub backend: BackendKind,
    pub data_dir: PathBuf,
    pub body_limit: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            backend: BackendKind::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ServerSettings {
    /// `PAGEGEN_BIND`, `PAGEGEN_BACKEND`, `PAGEGEN_DATA_DIR`, `PAGEGEN_BODY_LIMIT`
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bind: lookup("PAGEGEN_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            backend: parse_or(lookup("PAGEGEN_BACKEND"), BackendKind::default()),
            data_dir: lookup("PAGEGEN_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            body_limit: parse_or(lookup("PAGEGEN_BODY_LIMIT"), DEFAULT_BODY_LIMIT),
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
