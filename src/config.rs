use std::net::SocketAddr;

use thiserror::Error;

const DEFAULT_DB_URL: &str = "sqlite://todo.db";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),
    #[error("environment variable {name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Which cross-list moves `move_item` accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovePolicy {
    /// Any item may be re-parented anywhere the actor owns.
    #[default]
    Any,
    /// Only top-level items may change lists.
    TopLevelOnly,
}

impl std::str::FromStr for MovePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(MovePolicy::Any),
            "top-level-only" => Ok(MovePolicy::TopLevelOnly),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origin: String,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub move_policy: MovePolicy,
}

impl Config {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(Config {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DB_URL.to_string()),
            bind_addr: parse_or(
                "BIND_ADDR",
                lookup("BIND_ADDR"),
                SocketAddr::from(([127, 0, 0, 1], 3000)),
            )?,
            cors_origin: lookup("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            jwt_secret,
            token_ttl_secs: parse_or(
                "TOKEN_TTL_SECS",
                lookup("TOKEN_TTL_SECS"),
                DEFAULT_TOKEN_TTL_SECS,
            )?,
            move_policy: parse_or("CROSS_LIST_MOVES", lookup("CROSS_LIST_MOVES"), MovePolicy::Any)?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
