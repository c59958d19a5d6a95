use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Number of option sets a web deployment accepts per analysis.
pub const WEB_MAX_OPTION_SETS: usize = 6;
/// Number of option sets a desktop deployment accepts per analysis.
pub const DESKTOP_MAX_OPTION_SETS: usize = 1000;
/// Default BMDL spread under which candidates are compared by AIC.
pub const DEFAULT_SUFFICIENTLY_CLOSE_BMDL: f64 = 3.0;

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
    pub analysis: AnalysisConfig,
}

impl AppConfig {
    /// Read `.env` (when present) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment =
            AppEnvironment::from_str(&lookup("APP_ENV").unwrap_or_else(|| "development".into()));

        let server = ServerConfig {
            host: lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: match lookup("APP_PORT") {
                Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidPort)?,
                None => 3000,
            },
        };

        let telemetry = TelemetryConfig {
            log_level: lookup("APP_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };

        let mut analysis = AnalysisConfig::default();
        if let Some(raw) = lookup("BMDS_IS_DESKTOP") {
            analysis.is_desktop = parse_flag(&raw).ok_or(ConfigError::InvalidDesktopFlag)?;
        }
        if let Some(raw) = lookup("BMDS_SUFFICIENTLY_CLOSE_BMDL") {
            analysis.sufficiently_close_bmdl = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite() && *value >= 1.0)
                .ok_or(ConfigError::InvalidBmdlSpread)?;
        }

        Ok(Self {
            environment,
            server,
            telemetry,
            analysis,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
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
}

/// Deployment dials for analysis configuration and model recommendation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub is_desktop: bool,
    pub sufficiently_close_bmdl: f64,
}

impl AnalysisConfig {
    pub fn max_option_sets(&self) -> usize {
        if self.is_desktop {
            DESKTOP_MAX_OPTION_SETS
        } else {
            WEB_MAX_OPTION_SETS
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            is_desktop: false,
            sufficiently_close_bmdl: DEFAULT_SUFFICIENTLY_CLOSE_BMDL,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDesktopFlag,
    InvalidBmdlSpread,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDesktopFlag => {
                write!(f, "BMDS_IS_DESKTOP must be a boolean flag (true/false, 1/0)")
            }
            ConfigError::InvalidBmdlSpread => {
                write!(f, "BMDS_SUFFICIENTLY_CLOSE_BMDL must be a finite number >= 1")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidDesktopFlag
            | ConfigError::InvalidBmdlSpread => None,
        }
    }
}
