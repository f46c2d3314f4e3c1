use anyhow::{anyhow, Context, Result};

use crate::transfer::coerce::{decode_opt_bool, SalaryPolicy};

pub const DEFAULT_PORT: u16 = 5627;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 << 20; // 10 MiB per file

/// Application configuration loaded from environment variables.
/// Every variable has a default; only malformed values are errors.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Upper bound for one uploaded CSV file.
    pub max_upload_bytes: usize,
    pub salary_policy: SalaryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite://reverse-ats.db".to_string(),
            port: DEFAULT_PORT,
            rust_log: "info".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            salary_policy: SalaryPolicy::ZeroIsValue,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        let zero_is_absent = parse_flag(
            "ZERO_SALARY_IS_ABSENT",
            std::env::var("ZERO_SALARY_IS_ABSENT").ok(),
        )?;

        Ok(Config {
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            port: match std::env::var("REVERSE_ATS_PORT") {
                Ok(port) => port
                    .parse::<u16>()
                    .context("REVERSE_ATS_PORT must be a valid port number")?,
                Err(_) => defaults.port,
            },
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            max_upload_bytes: match std::env::var("MAX_UPLOAD_BYTES") {
                Ok(bytes) => bytes
                    .parse::<usize>()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
                Err(_) => defaults.max_upload_bytes,
            },
            salary_policy: if zero_is_absent {
                SalaryPolicy::ZeroIsAbsent
            } else {
                SalaryPolicy::ZeroIsValue
            },
        })
    }
}

fn parse_flag(key: &str, raw: Option<String>) -> Result<bool> {
    match raw {
        None => Ok(false),
        Some(value) => decode_opt_bool(&value)
            .ok_or_else(|| anyhow!("{key} must be a boolean (true/false), got '{value}'")),
    }
}
