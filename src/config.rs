//! Startup configuration read from the environment.

use std::{env, num::ParseIntError, path::PathBuf};

use thiserror::Error;
use tracing::{info, warn};

/// Secret used for wipes when `ADMIN_PASSWORD` is unset.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";
/// SQLite file used when no Postgres URL is configured.
pub const DEFAULT_DATABASE_PATH: &str = "potluck.db";
/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Invalid environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `PORT` is not a valid port number.
    #[error("invalid PORT {value:?}: {source}")]
    InvalidPort {
        /// Raw value.
        value: String,
        /// Parse failure.
        source: ParseIntError,
    },
}

/// Which storage backend to open. Chosen once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Hosted Postgres at the given connection string.
    Postgres {
        /// Connection string.
        url: String,
    },
    /// Embedded SQLite file.
    Sqlite {
        /// Database file path.
        path: PathBuf,
    },
}

/// Whether pre-built presentation assets are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployMode {
    /// Serve the API plus the static bundle with SPA fallback.
    Production,
    /// Serve only the API; assets come from an external dev server.
    Development,
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Storage backend.
    pub backend: Backend,
    /// Expected `x-admin-password` value for wipes.
    pub admin_password: String,
    /// Asset serving mode.
    pub mode: DeployMode,
    /// Directory holding the pre-built bundle.
    pub static_dir: PathBuf,
}

impl Config {
    /// Reads the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Blank values count as unset,
    /// except `ADMIN_PASSWORD`, which is used exactly as given unless empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match var("POSTGRES_URL") {
            Some(url) => Backend::Postgres { url },
            None => Backend::Sqlite {
                path: PathBuf::from(or_default(var("DATABASE_PATH"), "DATABASE_PATH", DEFAULT_DATABASE_PATH)),
            },
        };

        let admin_password = lookup("ADMIN_PASSWORD").filter(|v| !v.is_empty()).unwrap_or_else(|| {
            warn!("ADMIN_PASSWORD not set, falling back to the insecure default");
            DEFAULT_ADMIN_PASSWORD.to_string()
        });

        let port = match var("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => DEFAULT_PORT,
        };

        let mode = match var("APP_ENV").as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("production") => DeployMode::Production,
            _ => DeployMode::Development,
        };

        Ok(Self {
            host: or_default(var("HOST"), "HOST", "0.0.0.0"),
            port,
            backend,
            admin_password,
            mode,
            static_dir: PathBuf::from(or_default(var("STATIC_DIR"), "STATIC_DIR", "dist")),
        })
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn or_default(value: Option<String>, key: &str, default: &str) -> String {
    value.unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

#[cfg(test)]
mod tests {
    use hashbrown::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_select_sqlite_and_insecure_secret() {
        let cfg = config_from(&[]).expect("config");
        assert_eq!(
            cfg.backend,
            Backend::Sqlite {
                path: PathBuf::from("potluck.db")
            }
        );
        assert_eq!(cfg.admin_password, "admin");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.mode, DeployMode::Development);
        assert_eq!(cfg.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn postgres_url_selects_postgres() {
        let cfg = config_from(&[("POSTGRES_URL", "postgres://u:p@db/potluck")]).expect("config");
        assert_eq!(
            cfg.backend,
            Backend::Postgres {
                url: "postgres://u:p@db/potluck".to_string()
            }
        );
    }

    #[test]
    fn blank_postgres_url_counts_as_unset() {
        let cfg = config_from(&[("POSTGRES_URL", "  ")]).expect("config");
        assert!(matches!(cfg.backend, Backend::Sqlite { .. }));
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = config_from(&[
            ("ADMIN_PASSWORD", "s3cret"),
            ("PORT", "8080"),
            ("APP_ENV", "Production"),
            ("STATIC_DIR", "public"),
        ])
        .expect("config");
        assert_eq!(cfg.admin_password, "s3cret");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.mode, DeployMode::Production);
        assert_eq!(cfg.static_dir, PathBuf::from("public"));
    }

    #[test]
    fn whitespace_admin_password_is_kept_verbatim() {
        let cfg = config_from(&[("ADMIN_PASSWORD", "  ")]).expect("config");
        assert_eq!(cfg.admin_password, "  ");

        let cfg = config_from(&[("ADMIN_PASSWORD", "")]).expect("config");
        assert_eq!(cfg.admin_password, DEFAULT_ADMIN_PASSWORD);
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = config_from(&[("PORT", "eighty")]).expect_err("bad port");
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
    }
}
