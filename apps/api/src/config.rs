use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres store when set; in-memory store otherwise.
    pub database_url: Option<String>,
    pub chatbot_url: String,
    pub parser_url: String,
    /// LinkedIn exports are parsed by the main API host, not the résumé parser.
    pub linkedin_parser_url: String,
    pub upstream_timeout_secs: u64,
    /// Sessions untouched for this long are evicted.
    pub session_idle_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            chatbot_url: env_or("CHATBOT_URL", "http://localhost:3001"),
            parser_url: env_or("PARSER_URL", "http://localhost:8080"),
            linkedin_parser_url: env_or("LINKEDIN_PARSER_URL", "http://localhost:3001"),
            upstream_timeout_secs: env_or("UPSTREAM_TIMEOUT_SECS", "120")
                .parse::<u64>()
                .context("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")?,
            session_idle_ttl_secs: env_or("SESSION_IDLE_TTL_SECS", "86400")
                .parse::<u64>()
                .context("SESSION_IDLE_TTL_SECS must be a whole number of seconds")?,
            port: env_or("PORT", "8088")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}
