use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BIND_ADDR is not a socket address: {0}")]
    BindAddr(#[from] std::net::AddrParseError),
    #[error("PUBLIC_URL is not a valid URL: {0}")]
    PublicUrl(#[from] url::ParseError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub media_root: PathBuf,
    /// Absolute base used when building pagination links.
    pub public_url: Url,
    pub secure_cookies: bool,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Reads configuration from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let secure_cookies = matches!(
            var_or("SECURE_COOKIES", "false").to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        );

        Ok(Self {
            database_url: var_or("DATABASE_URL", "sqlite:data/foodgram.db"),
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:8000").parse()?,
            media_root: PathBuf::from(var_or("MEDIA_ROOT", "media")),
            public_url: Url::parse(&var_or("PUBLIC_URL", "http://localhost:8000"))?,
            secure_cookies,
        })
    }
}
