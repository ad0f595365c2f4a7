use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::leads::admin::FallbackPolicy;
use crate::leads::journey::DEFAULT_JOURNEY_TTL_SECS;

const DEFAULT_TABLE: &str = "jv_sub_e";
const DEFAULT_CACHE_PATH: &str = ".cache/leads.json";
const DEFAULT_RELAY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STORAGE_TIMEOUT_SECS: u64 = 10;
const KEY_PREVIEW_CHARS: usize = 5;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
    pub relay: RelayConfig,
    pub dashboard: DashboardConfig,
    pub journey: JourneyConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let storage = StorageConfig {
            url: optional_var("LEADS_STORAGE_URL"),
            api_key: optional_var("LEADS_STORAGE_KEY"),
            table: optional_var("LEADS_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            timeout: Duration::from_secs(numeric_var(
                "LEADS_STORAGE_TIMEOUT_SECS",
                DEFAULT_STORAGE_TIMEOUT_SECS,
            )?),
        };

        let relay = RelayConfig {
            url: optional_var("LEADS_RELAY_URL"),
            timeout: Duration::from_secs(numeric_var(
                "LEADS_RELAY_TIMEOUT_SECS",
                DEFAULT_RELAY_TIMEOUT_SECS,
            )?),
        };

        let fallback = match optional_var("LEADS_FALLBACK") {
            Some(raw) => raw
                .parse::<FallbackPolicy>()
                .map_err(|_| ConfigError::InvalidFallback(raw))?,
            None => FallbackPolicy::default(),
        };
        let dashboard = DashboardConfig {
            fallback,
            cache_path: optional_var("LEADS_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_PATH)),
        };

        let ttl_secs = numeric_var("LEADS_JOURNEY_TTL_SECS", DEFAULT_JOURNEY_TTL_SECS)?;
        if ttl_secs <= 0 || chrono::Duration::try_seconds(ttl_secs).is_none() {
            return Err(ConfigError::InvalidNumber {
                key: "LEADS_JOURNEY_TTL_SECS",
            });
        }
        let journey = JourneyConfig { ttl_secs };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            storage,
            relay,
            dashboard,
            journey,
        })
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn numeric_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional_var(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber { key }),
        None => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Hosted lead table. Without a URL and key the service keeps leads in memory.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub table: String,
    pub timeout: Duration,
}

impl StorageConfig {
    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.api_key.is_some()
    }

    /// Diagnostics view that never exposes more than a short key prefix.
    pub fn status(&self) -> StorageStatus {
        let key_preview = match &self.api_key {
            Some(key) => {
                let prefix: String = key.chars().take(KEY_PREVIEW_CHARS).collect();
                format!("{prefix}...")
            }
            None => "Not set".to_string(),
        };

        StorageStatus {
            storage_url: self.url.clone().unwrap_or_else(|| "Not set".to_string()),
            key_preview,
            table: self.table.clone(),
            is_configured: self.is_configured(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStatus {
    pub storage_url: String,
    pub key_preview: String,
    pub table: String,
    pub is_configured: bool,
}

/// Outbound automation webhook.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub url: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub fallback: FallbackPolicy,
    pub cache_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct JourneyConfig {
    pub ttl_secs: i64,
}

impl JourneyConfig {
    /// Falls back to the default window when `ttl_secs` is not a positive
    /// number of seconds chrono can represent.
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.ttl_secs)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .unwrap_or_else(|| chrono::Duration::seconds(DEFAULT_JOURNEY_TTL_SECS))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    InvalidFallback(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => write!(f, "{key} must be a whole number"),
            ConfigError::InvalidFallback(value) => write!(
                f,
                "LEADS_FALLBACK must be one of none, cache, mock (got '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidFallback(_) => None,
        }
    }
}
