use clap::{Args, Parser, ValueEnum};
use ipnetwork::IpNetwork;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub storage: StorageConfig,

    #[command(flatten)]
    pub auth: AuthConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub messaging: MessagingConfig,

    #[command(flatten)]
    pub health: HealthConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "JOBBOARD_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "JOBBOARD_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Port for the management server (health probes)
    #[arg(long, env = "JOBBOARD_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// Seconds to wait for in-flight requests during shutdown
    #[arg(long, env = "JOBBOARD_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,

    /// Comma-separated list of CIDRs to trust for X-Forwarded-For IP extraction
    #[arg(
        long,
        env = "JOBBOARD_TRUSTED_PROXIES",
        default_value = "10.0.0.0/8,172.16.0.0/12,192.168.0.0/16,127.0.0.1/32",
        value_delimiter = ','
    )]
    pub trusted_proxies: Vec<IpNetwork>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    /// Durable storage in Postgres
    Postgres,
    /// Process-local storage, lost on restart
    Memory,
}

#[derive(Clone, Debug, Args)]
pub struct StorageConfig {
    /// Where users and messages are persisted
    #[arg(long = "storage", env = "JOBBOARD_STORAGE", value_enum, default_value_t = StorageBackend::Postgres)]
    pub backend: StorageBackend,

    /// Database connection URL (required for the postgres backend)
    #[arg(long, env = "JOBBOARD_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum number of pooled connections
    #[arg(long, env = "JOBBOARD_DB_MAX_CONNECTIONS", default_value_t = 20)]
    pub max_connections: u32,

    /// Minimum number of idle connections kept open
    #[arg(long, env = "JOBBOARD_DB_MIN_CONNECTIONS", default_value_t = 2)]
    pub min_connections: u32,

    /// Seconds to wait for a free connection
    #[arg(long, env = "JOBBOARD_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct AuthConfig {
    /// Secret key for JWT signing
    #[arg(long, env = "JOBBOARD_JWT_SECRET")]
    pub jwt_secret: String,

    /// Access token time-to-live in seconds
    #[arg(long, env = "JOBBOARD_ACCESS_TOKEN_TTL_SECS", default_value_t = 3600)]
    pub access_token_ttl_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Requests per second allowed for standard endpoints
    #[arg(long, env = "JOBBOARD_RATE_LIMIT_PER_SECOND", default_value_t = 10)]
    pub per_second: u32,

    /// Burst allowance for standard endpoints
    #[arg(long, env = "JOBBOARD_RATE_LIMIT_BURST", default_value_t = 20)]
    pub burst: u32,

    /// Stricter rate limit for register/login
    #[arg(long, env = "JOBBOARD_AUTH_RATE_LIMIT_PER_SECOND", default_value_t = 1)]
    pub auth_per_second: u32,

    /// Burst allowance for register/login
    #[arg(long, env = "JOBBOARD_AUTH_RATE_LIMIT_BURST", default_value_t = 3)]
    pub auth_burst: u32,
}

#[derive(Clone, Debug, Args)]
pub struct MessagingConfig {
    /// Maximum number of characters in a single message
    #[arg(long, env = "JOBBOARD_MAX_MESSAGE_LENGTH", default_value_t = 2000)]
    pub max_content_length: usize,
}

#[derive(Clone, Debug, Args)]
pub struct HealthConfig {
    /// Timeout for the storage readiness check
    #[arg(long, env = "JOBBOARD_HEALTH_STORE_TIMEOUT_MS", default_value_t = 2000)]
    pub store_timeout_ms: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "JOBBOARD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector base URL; traces and metrics are exported when set
    #[arg(long, env = "JOBBOARD_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_args() {
        let config = Config::try_parse_from(["jobboard-server", "--jwt-secret", "s3cret", "--storage", "memory"])
            .expect("config should parse");

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.auth.access_token_ttl_secs, 3600);
        assert_eq!(config.messaging.max_content_length, 2000);
        assert_eq!(config.server.trusted_proxies.len(), 4);
    }

    #[test]
    fn test_missing_jwt_secret_is_rejected() {
        if std::env::var_os("JOBBOARD_JWT_SECRET").is_some() {
            return;
        }
        assert!(Config::try_parse_from(["jobboard-server"]).is_err());
    }
}
