//! Runtime configuration, read from the environment (and `.env` in development).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://crescendo.db";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_UPLOAD_DIR: &str = "static/uploads";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_BCRYPT_COST: u32 = 10;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    /// Where the SQLite database lives, e.g. `sqlite://crescendo.db`
    pub database_url: String,
    pub bind_address: SocketAddr,
    /// Directory uploaded gallery images are written to and served from
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned()),
            bind_address: parse_var("BIND_ADDRESS", DEFAULT_BIND_ADDRESS)?,
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_DIR.to_owned())
                .into(),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            bcrypt_cost: parse_var("BCRYPT_COST", DEFAULT_BCRYPT_COST)?,
            max_connections: parse_var("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
        })
    }
}

fn parse_var<T>(name: &str, default: impl ToString) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .with_context(|| format!("`{name}` has an invalid value: {raw:?}"))
}
