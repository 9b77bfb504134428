use chrono_tz::Tz;
use companion_core::calendar;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
}

#[derive(Deserialize, Debug)]
pub struct ServerConfig {
    /// Listen address, host:port.
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct StorageConfig {
    /// Path to the SQLite database file. Created on first start.
    pub path: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "companion.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct AuthConfig {
    /// HS256 signing secret. Must be set; there is no default worth having.
    pub jwt_secret: String,
    /// Session lifetime in seconds.
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: 8 * 60 * 60,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct CalendarConfig {
    /// IANA timezone used to evaluate "today" when a request carries no
    /// explicit date. Never UTC-by-accident, never the caller's zone.
    pub timezone: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Singapore".to_string(),
        }
    }
}

impl Config {
    /// Load from a TOML file (missing file means all defaults) with
    /// `COMPANION_*` environment overrides, e.g.
    /// `COMPANION_AUTH__JWT_SECRET` or `COMPANION_SERVER__LISTEN`.
    pub fn load(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("COMPANION_").split("__"))
            .extract()
    }

    /// Refuse configurations the server cannot run safely with, and
    /// resolve the calendar timezone once for the process lifetime.
    pub fn validate(&self) -> anyhow::Result<Tz> {
        if self.auth.jwt_secret.trim().is_empty() {
            anyhow::bail!(
                "auth.jwt_secret is empty; set it in the config file or via COMPANION_AUTH__JWT_SECRET"
            );
        }
        let tz = calendar::validate_timezone(&self.calendar.timezone)?;
        Ok(tz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load("/nonexistent/companion.toml").expect("defaults should load");
        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.storage.path, "companion.db");
        assert_eq!(config.storage.max_connections, 10);
        assert_eq!(config.auth.token_ttl_secs, 28800);
        assert_eq!(config.calendar.timezone, "Asia/Singapore");
        assert!(config.auth.jwt_secret.is_empty());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let config = Config::load("/nonexistent/companion.toml").expect("defaults should load");
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_timezone_is_rejected() {
        let mut config = Config::load("/nonexistent/companion.toml").expect("defaults should load");
        config.auth.jwt_secret = "secret".to_string();
        config.calendar.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn valid_config_resolves_timezone() {
        let mut config = Config::load("/nonexistent/companion.toml").expect("defaults should load");
        config.auth.jwt_secret = "secret".to_string();
        let tz = config.validate().expect("config should validate");
        assert_eq!(tz, chrono_tz::Asia::Singapore);
    }
}
