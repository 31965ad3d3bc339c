use std::{env, fmt::Display, str::FromStr};

use tracing::info;

/// Runtime configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub upload_dir: String,
    pub frontend_dir: String,
    pub ai_enabled: bool,
}

impl Config {
    pub fn load() -> Self {
        Self {
            host: try_load("HOST", "127.0.0.1"),
            port: try_load("PORT", "5000"),
            db_path: try_load("LEDGERLY_DB_PATH", "ledgerly.db"),
            upload_dir: try_load("LEDGERLY_UPLOAD_DIR", "uploads"),
            frontend_dir: try_load("LEDGERLY_FRONTEND_DIR", "frontend/dist"),
            ai_enabled: try_load("LEDGERLY_AI", "false"),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| format!("invalid {key} value {raw:?}: {e}"))
        .expect("Environment misconfigured!")
}
