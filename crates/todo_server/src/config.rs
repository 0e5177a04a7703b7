//! Environment configuration for the server process.
//!
//! # Responsibility
//! - Read and validate every setting the process needs before startup.
//! - Keep the core crate free of environment access.
//!
//! # Invariants
//! - `DATABASE_URL` is required; every other key has a default.
//! - Parsing never touches the process environment when driven through
//!   `from_lookup`.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const SQLITE_SCHEME: &str = "sqlite://";
const MEMORY_URLS: [&str; 2] = ["sqlite::memory:", ":memory:"];
/// `APP_ENV` wins over `NODE_ENV`.
const RUN_MODE_KEYS: [&str; 2] = ["APP_ENV", "NODE_ENV"];

/// Deployment mode, mirrored in startup logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Development,
    Test,
    Production,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

/// Where the todo database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub run_mode: RunMode,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub database: DatabaseLocation,
    pub log_level: String,
    /// Absolute directory for rolling log files; stderr when unset.
    pub log_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing required environment variable {key}"),
            Self::Invalid { key, value, reason } => {
                write!(f, "invalid {key} value `{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

impl ServerConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let run_mode = match RUN_MODE_KEYS
            .iter()
            .find_map(|key| get(key).map(|value| (*key, value)))
        {
            None => RunMode::Development,
            Some((key, value)) => parse_run_mode(key, &value)?,
        };

        let port = match get("PORT") {
            None => DEFAULT_PORT,
            Some(value) => match value.parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "PORT",
                        value,
                        reason: "expected an integer between 1 and 65535",
                    })
                }
            },
        };

        let bind_addr = match get("BIND_ADDR") {
            None => DEFAULT_BIND_ADDR,
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value,
                reason: "expected an IP address",
            })?,
        };

        let database = parse_database_url(get("DATABASE_URL"))?;

        Ok(Self {
            run_mode,
            bind_addr,
            port,
            database,
            log_level: get("LOG_LEVEL")
                .unwrap_or_else(|| todo_core::default_log_level().to_string()),
            log_dir: get("LOG_DIR"),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_run_mode(key: &'static str, value: &str) -> Result<RunMode, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "development" => Ok(RunMode::Development),
        "test" => Ok(RunMode::Test),
        "production" => Ok(RunMode::Production),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected development|test|production",
        }),
    }
}

fn parse_database_url(value: Option<String>) -> Result<DatabaseLocation, ConfigError> {
    let value = value.ok_or(ConfigError::Missing("DATABASE_URL"))?;

    if MEMORY_URLS.contains(&value.as_str()) {
        return Ok(DatabaseLocation::Memory);
    }

    if let Some(path) = value.strip_prefix(SQLITE_SCHEME) {
        if path.is_empty() {
            return Err(ConfigError::Invalid {
                key: "DATABASE_URL",
                value,
                reason: "sqlite URL has no file path",
            });
        }
        return Ok(DatabaseLocation::File(PathBuf::from(path)));
    }

    if value.contains("://") {
        return Err(ConfigError::Invalid {
            key: "DATABASE_URL",
            value,
            reason: "only sqlite:// URLs or plain file paths are supported",
        });
    }

    Ok(DatabaseLocation::File(PathBuf::from(value)))
}
