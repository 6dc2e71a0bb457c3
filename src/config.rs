use std::env;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:data/sunstone.db";
pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_ALLOWED_ORIGINS: &str =
    "http://localhost:5173,https://sunstone-scribes.vercel.app";
pub const DEFAULT_API_URL: &str = "http://localhost:4000";

/// Process configuration, read from the environment (and `.env`).
///
/// - `DATABASE_URL`: SQLite connection string
/// - `PORT`: listening port for the API
/// - `ALLOWED_ORIGINS`: comma-separated CORS allow-list
/// - `API_URL`: base URL the client commands talk to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            port: DEFAULT_PORT,
            allowed_origins: parse_origins(DEFAULT_ALLOWED_ORIGINS),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid PORT {raw:?}, using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => defaults.port,
        };

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or(defaults.allowed_origins);

        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            port,
            allowed_origins,
            api_url: lookup("API_URL").unwrap_or(defaults.api_url),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
