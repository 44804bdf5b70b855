//! Connection and pool configuration, resolved from explicit fields, the
//! process environment, and a `.env` file, in that ascending priority (see
//! SPEC_FULL.md §6 Configuration).

use std::env;
use std::time::Duration;

fn env_fallback(keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(value) = env::var(key) {
            return Some(value);
        }
    }
    None
}

/// Options accepted by [`crate::Pool::new`][crate::pool::Pool::new].
///
/// Defaults and environment fallbacks match the table in `spec.md` §6.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: Option<String>,
    pub ssl: bool,

    pub min_connections: usize,
    pub max_connections: usize,
    pub connect_timeout: Duration,
    pub query_timeout: Duration,
    pub idle_timeout: Duration,

    /// Extra startup parameters sent verbatim, e.g. `application_name`.
    pub application_name: Option<String>,

    /// Capacity of each connection's prepared-statement cache. `0` disables
    /// caching (every query is re-parsed).
    pub statement_cache_capacity: usize,
}

impl Default for PoolOptions {
    fn default() -> Self {
        // `dotenvy` loads variables from a `.env` file in the working
        // directory into the process environment; it is a no-op (not an
        // error) if the file is absent. This runs once per process thanks
        // to `dotenvy`'s own internal guard.
        let _ = dotenvy::dotenv();

        PoolOptions {
            host: env_fallback(&["PGHOST"]).unwrap_or_else(|| "localhost".to_string()),
            port: env_fallback(&["PGPORT"])
                .and_then(|v| v.parse().ok())
                .unwrap_or(5432),
            database: env_fallback(&["PGDATABASE", "POSTGRES_DB"])
                .unwrap_or_else(|| "postgres".to_string()),
            username: env_fallback(&["PGUSER", "POSTGRES_USER"])
                .unwrap_or_else(|| "postgres".to_string()),
            password: env_fallback(&["PGPASSWORD", "POSTGRES_PASSWORD"]),
            ssl: false,

            min_connections: 2,
            max_connections: 8,
            connect_timeout: Duration::from_millis(15_000),
            query_timeout: Duration::from_millis(120_000),
            idle_timeout: Duration::from_millis(300_000),

            application_name: None,
            statement_cache_capacity: 100,
        }
    }
}

impl PoolOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn ssl(mut self, ssl: bool) -> Self {
        self.ssl = ssl;
        self
    }

    pub fn min_connections(mut self, n: usize) -> Self {
        self.min_connections = n;
        self
    }

    pub fn max_connections(mut self, n: usize) -> Self {
        self.max_connections = n.max(1);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        // Clear any ambient PG* vars so this test is hermetic regardless of
        // the environment it runs in.
        for key in [
            "PGHOST",
            "PGPORT",
            "PGDATABASE",
            "POSTGRES_DB",
            "PGUSER",
            "POSTGRES_USER",
            "PGPASSWORD",
            "POSTGRES_PASSWORD",
        ] {
            env::remove_var(key);
        }

        let opts = PoolOptions::default();
        assert_eq!(opts.host, "localhost");
        assert_eq!(opts.port, 5432);
        assert_eq!(opts.database, "postgres");
        assert_eq!(opts.username, "postgres");
        assert_eq!(opts.password, None);
        assert_eq!(opts.min_connections, 2);
        assert_eq!(opts.max_connections, 8);
        assert_eq!(opts.connect_timeout, Duration::from_secs(15));
        assert_eq!(opts.query_timeout, Duration::from_millis(120_000));
        assert_eq!(opts.idle_timeout, Duration::from_millis(300_000));
    }

    #[test]
    fn builder_overrides_defaults() {
        let opts = PoolOptions::new().host("db.internal").max_connections(32);
        assert_eq!(opts.host, "db.internal");
        assert_eq!(opts.max_connections, 32);
    }
}
