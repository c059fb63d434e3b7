use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Database holding the channel collections; also the credential source.
    pub name: String,
    pub app_name: String,
    pub connect_timeout_secs: u64,
    pub max_query_time_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub cert_path: Option<PathBuf>,
    #[serde(skip_serializing)]
    pub shared_secret: Option<String>,
    pub leeway_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
    /// Empty or `*` allows any origin.
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TLS needs both TLS_CERT_PATH and TLS_KEY_PATH")]
    IncompleteTls,

    #[error("No token verification key: set AUTH_CERT_PATH or AUTH_SHARED_SECRET")]
    MissingAuthKey,

    #[error("DATABASE_NAME cannot be empty")]
    EmptyDatabaseName,

    #[error("LISTEN_PORT must be a non-zero port")]
    InvalidPort,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve the profile and overrides through `lookup` instead of the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Server overrides
        if let Some(v) = lookup("LISTEN_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("LISTEN_PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = lookup("TLS_CERT_PATH") {
            self.server.tls_cert_path = non_empty(v).map(PathBuf::from);
        }
        if let Some(v) = lookup("TLS_KEY_PATH") {
            self.server.tls_key_path = non_empty(v).map(PathBuf::from);
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.uri = v;
        }
        if let Some(v) = lookup("DATABASE_USERNAME") {
            self.database.username = non_empty(v);
        }
        if let Some(v) = lookup("DATABASE_PASSWORD") {
            self.database.password = non_empty(v);
        }
        if let Some(v) = lookup("DATABASE_NAME") {
            self.database.name = v;
        }
        if let Some(v) = lookup("DATABASE_APP_NAME") {
            self.database.app_name = v;
        }
        if let Some(v) = lookup("DATABASE_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs = v.parse().unwrap_or(self.database.connect_timeout_secs);
        }
        if let Some(v) = lookup("DATABASE_MAX_QUERY_TIME_MS") {
            self.database.max_query_time_ms = v.parse().ok().filter(|ms| *ms > 0);
        }

        // Auth overrides
        if let Some(v) = lookup("AUTH_CERT_PATH") {
            self.auth.cert_path = non_empty(v).map(PathBuf::from);
        }
        if let Some(v) = lookup("AUTH_SHARED_SECRET") {
            self.auth.shared_secret = non_empty(v);
        }
        if let Some(v) = lookup("AUTH_LEEWAY_SECS") {
            self.auth.leeway_secs = v.parse().unwrap_or(self.auth.leeway_secs);
        }

        // API overrides
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Some(v) = lookup("API_CORS_ORIGINS") {
            self.api.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.tls_cert_path.is_some() != self.server.tls_key_path.is_some() {
            return Err(ConfigError::IncompleteTls);
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.database.name.is_empty() {
            return Err(ConfigError::EmptyDatabaseName);
        }
        if self.auth.cert_path.is_none() && self.auth.shared_secret.is_none() {
            return Err(ConfigError::MissingAuthKey);
        }
        Ok(())
    }

    /// Certificate and key paths, when both are configured.
    pub fn tls_paths(&self) -> Option<(&Path, &Path)> {
        match (&self.server.tls_cert_path, &self.server.tls_key_path) {
            (Some(cert), Some(key)) => Some((cert.as_path(), key.as_path())),
            _ => None,
        }
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                tls_cert_path: None,
                tls_key_path: None,
            },
            database: DatabaseConfig {
                uri: "mongodb://localhost:27017".to_string(),
                username: None,
                password: None,
                name: "datalake".to_string(),
                app_name: "datalake-gateway".to_string(),
                connect_timeout_secs: 10,
                max_query_time_ms: None,
            },
            auth: AuthConfig {
                cert_path: None,
                shared_secret: None,
                leeway_secs: 60,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                cors_origins: vec![],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                tls_cert_path: None,
                tls_key_path: None,
            },
            database: DatabaseConfig {
                uri: "mongodb://localhost:27017".to_string(),
                username: None,
                password: None,
                name: "datalake".to_string(),
                app_name: "datalake-gateway".to_string(),
                connect_timeout_secs: 10,
                max_query_time_ms: Some(30_000),
            },
            auth: AuthConfig {
                cert_path: None,
                shared_secret: None,
                leeway_secs: 30,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
                cors_origins: vec![],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 443,
                tls_cert_path: None,
                tls_key_path: None,
            },
            database: DatabaseConfig {
                uri: "mongodb://localhost:27017".to_string(),
                username: None,
                password: None,
                name: "datalake".to_string(),
                app_name: "datalake-gateway".to_string(),
                connect_timeout_secs: 5,
                max_query_time_ms: Some(15_000),
            },
            auth: AuthConfig {
                cert_path: None,
                shared_secret: None,
                leeway_secs: 0,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
                cors_origins: vec![],
            },
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
