use secrecy::SecretString;
use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const DEV_JWT_SECRET: &str = "admissions-development-secret-do-not-deploy";
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 3 * 1024 * 1024;
const DEFAULT_ALLOWED_TYPES: &str = "image/jpeg,image/png,application/pdf";
const DEFAULT_CREDENTIAL_TTL_SECS: u64 = 60;
const DEFAULT_TOKEN_TTL_MINS: i64 = 60;
const MAX_TOKEN_TTL_MINS: i64 = 7 * 24 * 60;

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
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub uploads: UploadConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var_or("APP_LOG_LEVEL", "info");

        let jwt_secret = match env::var("APP_JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingSecret("APP_JWT_SECRET"))
            }
            _ => DEV_JWT_SECRET.to_string(),
        };
        let token_ttl_mins = parse_var("APP_TOKEN_TTL_MINS", DEFAULT_TOKEN_TTL_MINS)?;
        if !(1..=MAX_TOKEN_TTL_MINS).contains(&token_ttl_mins) {
            return Err(ConfigError::InvalidValue("APP_TOKEN_TTL_MINS"));
        }
        let staff_account = match (env::var("APP_STAFF_EMAIL"), env::var("APP_STAFF_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.trim().is_empty() => Some(StaffAccount {
                email,
                password: SecretString::from(password),
            }),
            _ => None,
        };

        let storage = StorageConfig {
            bucket: var_or("APP_STORAGE_BUCKET", "admissions-documents"),
            region: var_or("APP_STORAGE_REGION", "eu-west-3"),
            endpoint: env::var("APP_STORAGE_ENDPOINT")
                .ok()
                .filter(|value| !value.trim().is_empty()),
            access_key: var_or("APP_STORAGE_ACCESS_KEY", ""),
            secret_key: SecretString::from(var_or("APP_STORAGE_SECRET_KEY", "")),
        };

        let allowed_types = var_or("APP_UPLOAD_ALLOWED_TYPES", DEFAULT_ALLOWED_TYPES)
            .split(',')
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .collect::<BTreeSet<_>>();
        if allowed_types.is_empty() {
            return Err(ConfigError::InvalidValue("APP_UPLOAD_ALLOWED_TYPES"));
        }

        let uploads = UploadConfig {
            max_bytes: parse_var("APP_UPLOAD_MAX_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            allowed_types,
            credential_ttl: Duration::from_secs(parse_var(
                "APP_UPLOAD_TTL_SECS",
                DEFAULT_CREDENTIAL_TTL_SECS,
            )?),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            auth: AuthConfig {
                jwt_secret: SecretString::from(jwt_secret),
                token_ttl_mins,
                staff_account,
            },
            storage,
            uploads,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key)),
        Err(_) => Ok(default),
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

/// Bearer token signing and optional staff bootstrap.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: SecretString,
    pub token_ttl_mins: i64,
    pub staff_account: Option<StaffAccount>,
}

#[derive(Debug, Clone)]
pub struct StaffAccount {
    pub email: String,
    pub password: SecretString,
}

/// Object storage the upload credentials are issued against.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible stores such as MinIO.
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: SecretString,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_bytes: u64,
    pub allowed_types: BTreeSet<String>,
    pub credential_ttl: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue(&'static str),
    MissingSecret(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue(key) => write!(f, "{key} has an invalid value"),
            ConfigError::MissingSecret(key) => {
                write!(f, "{key} must be set outside development")
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

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_JWT_SECRET",
            "APP_TOKEN_TTL_MINS",
            "APP_STAFF_EMAIL",
            "APP_STAFF_PASSWORD",
            "APP_STORAGE_BUCKET",
            "APP_STORAGE_ENDPOINT",
            "APP_UPLOAD_MAX_BYTES",
            "APP_UPLOAD_ALLOWED_TYPES",
            "APP_UPLOAD_TTL_SECS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.uploads.max_bytes, 3 * 1024 * 1024);
        assert_eq!(config.uploads.credential_ttl, Duration::from_secs(60));
        assert!(config.uploads.allowed_types.contains("application/pdf"));
        assert!(config.auth.staff_account.is_none());
        assert!(config.storage.endpoint.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn production_requires_jwt_secret() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::MissingSecret("APP_JWT_SECRET"))
        ));

        env::set_var("APP_JWT_SECRET", "prod-secret");
        let config = AppConfig::load().expect("config loads with secret");
        assert_eq!(config.auth.jwt_secret.expose_secret(), "prod-secret");
        reset_env();
    }

    #[test]
    fn token_lifetime_is_bounded() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_TOKEN_TTL_MINS", "10080");
        let config = AppConfig::load().expect("a week is allowed");
        assert_eq!(config.auth.token_ttl_mins, 10_080);

        for raw in ["0", "10081", "153722867280912930"] {
            env::set_var("APP_TOKEN_TTL_MINS", raw);
            assert!(
                matches!(
                    AppConfig::load(),
                    Err(ConfigError::InvalidValue("APP_TOKEN_TTL_MINS"))
                ),
                "{raw}"
            );
        }
        reset_env();
    }

    #[test]
    fn upload_overrides_are_parsed() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_UPLOAD_MAX_BYTES", "1048576");
        env::set_var("APP_UPLOAD_ALLOWED_TYPES", " Image/PNG , application/pdf,");
        env::set_var("APP_UPLOAD_TTL_SECS", "30");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.uploads.max_bytes, 1_048_576);
        assert_eq!(
            config.uploads.allowed_types.iter().collect::<Vec<_>>(),
            vec!["application/pdf", "image/png"]
        );
        assert_eq!(config.uploads.credential_ttl, Duration::from_secs(30));

        env::set_var("APP_UPLOAD_MAX_BYTES", "lots");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidValue("APP_UPLOAD_MAX_BYTES"))
        ));
        reset_env();
    }
}
