use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_EMAIL_DOMAIN: &str = "rocketseat.com.br";
const DEFAULT_BUCKET: &str = "forms-react";
const DEFAULT_STORAGE_ROOT: &str = "./storage";

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

/// Top-level configuration for the form service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub forms: FormConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Read `.env` (if present) and then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            environment: AppEnvironment::from_str(&var_or("APP_ENV", "development")),
            server: ServerConfig::from_env()?,
            telemetry: TelemetryConfig {
                log_level: var_or("APP_LOG_LEVEL", "info"),
            },
            forms: FormConfig::from_env()?,
            storage: StorageConfig::from_env()?,
        })
    }
}

/// Listener address for the HTTP surface.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let port = var_or("APP_PORT", "3000")
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;
        Ok(Self {
            host: var_or("APP_HOST", "127.0.0.1"),
            port,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = match self.host.trim() {
            host if host.eq_ignore_ascii_case("localhost") => IpAddr::from([127, 0, 0, 1]),
            host => host
                .parse()
                .map_err(|source| ConfigError::InvalidHost { source })?,
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs fed into the submission schema.
#[derive(Debug, Clone)]
pub struct FormConfig {
    /// Domain suffix enforced by the profile variant, without the `@`.
    pub email_domain: String,
}

impl FormConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let email_domain = var_or("FORM_EMAIL_DOMAIN", DEFAULT_EMAIL_DOMAIN)
            .trim()
            .trim_start_matches('@')
            .to_ascii_lowercase();
        if email_domain.is_empty() {
            return Err(ConfigError::EmptyEmailDomain);
        }
        Ok(Self { email_domain })
    }
}

/// Where uploaded avatars land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub bucket: String,
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// One directory per bucket below `root`.
    Filesystem { root: PathBuf },
    /// Storage REST endpoint reached over HTTP.
    Http { base_url: String, api_key: String },
}

impl StorageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let bucket = var_or("STORAGE_BUCKET", DEFAULT_BUCKET);
        if bucket.trim().is_empty() {
            return Err(ConfigError::EmptyBucket);
        }

        let backend = var_or("STORAGE_BACKEND", "filesystem");
        let backend = match backend.trim().to_ascii_lowercase().as_str() {
            "filesystem" | "fs" | "local" => StorageBackend::Filesystem {
                root: PathBuf::from(var_or("STORAGE_ROOT", DEFAULT_STORAGE_ROOT)),
            },
            "http" | "remote" => StorageBackend::Http {
                base_url: required_var("STORAGE_URL")?,
                api_key: required_var("STORAGE_API_KEY")?,
            },
            other => return Err(ConfigError::UnknownStorageBackend(other.to_string())),
        };

        Ok(Self {
            bucket: bucket.trim().to_string(),
            backend,
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    EmptyEmailDomain,
    EmptyBucket,
    UnknownStorageBackend(String),
    MissingVar(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::EmptyEmailDomain => write!(f, "FORM_EMAIL_DOMAIN must not be empty"),
            ConfigError::EmptyBucket => write!(f, "STORAGE_BUCKET must not be empty"),
            ConfigError::UnknownStorageBackend(value) => write!(
                f,
                "STORAGE_BACKEND '{value}' is not supported (expected filesystem or http)"
            ),
            ConfigError::MissingVar(name) => {
                write!(f, "{name} is required for the http storage backend")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
