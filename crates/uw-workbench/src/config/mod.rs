use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::underwriting::confidence::{ConfidenceEvaluator, DEFAULT_REVIEW_THRESHOLD};
use crate::workflows::underwriting::progression::{
    AutoProgressionPolicy, SpecialtyMatch, DEFAULT_AUTO_ASSIGN_THRESHOLD,
};

const DEFAULT_ADVANCE_DELAY_MS: u64 = 650;

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

/// Top-level configuration for the workbench service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub workbench: WorkbenchConfig,
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
        let ansi = env::var("APP_LOG_ANSI")
            .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, ansi },
            workbench: WorkbenchConfig::from_env()?,
        })
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

/// Log filter and formatting.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Auto-progression tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbenchConfig {
    pub review_threshold: u8,
    pub auto_assign_threshold: u8,
    pub advance_delay_ms: u64,
    pub specialty_match: SpecialtyMatch,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            review_threshold: DEFAULT_REVIEW_THRESHOLD,
            auto_assign_threshold: DEFAULT_AUTO_ASSIGN_THRESHOLD,
            advance_delay_ms: DEFAULT_ADVANCE_DELAY_MS,
            specialty_match: SpecialtyMatch::default(),
        }
    }
}

impl WorkbenchConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let review_threshold =
            threshold_from_env("WORKBENCH_REVIEW_THRESHOLD", defaults.review_threshold)?;
        let auto_assign_threshold = threshold_from_env(
            "WORKBENCH_AUTO_ASSIGN_THRESHOLD",
            defaults.auto_assign_threshold,
        )?;
        let advance_delay_ms = match env::var("WORKBENCH_ADVANCE_DELAY_MS") {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidDelay { value })?,
            Err(_) => defaults.advance_delay_ms,
        };
        let specialty_match = match env::var("WORKBENCH_SPECIALTY_MATCH") {
            Ok(value) => value
                .parse::<SpecialtyMatch>()
                .map_err(|_| ConfigError::InvalidSpecialtyMatch { value })?,
            Err(_) => defaults.specialty_match,
        };

        Ok(Self {
            review_threshold,
            auto_assign_threshold,
            advance_delay_ms,
            specialty_match,
        })
    }

    pub fn policy(&self) -> AutoProgressionPolicy {
        AutoProgressionPolicy::new(
            ConfidenceEvaluator::new(self.review_threshold),
            self.auto_assign_threshold,
            self.specialty_match,
        )
    }

    pub fn advance_delay(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.advance_delay_ms).unwrap_or(i64::MAX))
    }
}

fn threshold_from_env(name: &'static str, default: u8) -> Result<u8, ConfigError> {
    let Ok(value) = env::var(name) else {
        return Ok(default);
    };
    match value.trim().parse::<u8>() {
        Ok(parsed) if parsed <= 100 => Ok(parsed),
        _ => Err(ConfigError::InvalidThreshold { name, value }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidThreshold { name: &'static str, value: String },
    InvalidDelay { value: String },
    InvalidSpecialtyMatch { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidThreshold { name, value } => {
                write!(f, "{name} must be an integer between 0 and 100 (got '{value}')")
            }
            ConfigError::InvalidDelay { value } => write!(
                f,
                "WORKBENCH_ADVANCE_DELAY_MS must be a non-negative integer (got '{value}')"
            ),
            ConfigError::InvalidSpecialtyMatch { value } => write!(
                f,
                "WORKBENCH_SPECIALTY_MATCH must be 'permissive' or 'strict' (got '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidThreshold { .. }
            | ConfigError::InvalidDelay { .. }
            | ConfigError::InvalidSpecialtyMatch { .. } => None,
        }
    }
}
