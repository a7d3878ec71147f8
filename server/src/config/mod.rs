use std::env;
use std::net::SocketAddr;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/evalbase";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_IDENTITY_HEADER: &str = "x-remote-user";
const DEFAULT_LOG_FILTER: &str = "evalbase_server=info,tower_http=info";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    /// Header the fronting identity provider sets to the authenticated username.
    pub identity_header: String,
    /// Enables HSTS.
    pub production: bool,
    pub log_filter: String,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Malformed values fall back to
    /// their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Config: invalid DATABASE_MAX_CONNECTIONS, using default");
                DEFAULT_MAX_CONNECTIONS
            }),
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let default_addr = SocketAddr::from(([0, 0, 0, 0], 3001));
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Config: invalid BIND_ADDR, using default");
                default_addr
            });

        let production = lookup("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            max_connections,
            bind_addr,
            identity_header: lookup("IDENTITY_HEADER")
                .map(|h| h.to_lowercase())
                .unwrap_or_else(|| DEFAULT_IDENTITY_HEADER.to_string()),
            production,
            log_filter: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.identity_header, DEFAULT_IDENTITY_HEADER);
        assert!(!config.production);
        assert_eq!(config.cors_allowed_origins.len(), 2);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let vars = HashMap::from([
            ("DATABASE_MAX_CONNECTIONS", "many"),
            ("BIND_ADDR", "not-an-addr"),
            ("IDENTITY_HEADER", "X-Forwarded-User"),
            ("RUST_ENV", "Production"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.identity_header, "x-forwarded-user");
        assert!(config.production);
    }
}
