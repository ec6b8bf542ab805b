use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::Deserialize;

static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv::dotenv().ok();

    match build() {
        Ok(cfg) => cfg,
        Err(err) => {
            log::warn!("Failed to load configuration, using defaults: {}", err);
            Config::default()
        }
    }
});

fn build() -> Result<Config, ConfigError> {
    Config::builder()
        .set_default("listen_address", "127.0.0.1:8080")?
        .set_default("log_level", "info")?
        .set_default("require_challenge", false)?
        .set_default("challenge_ttl_seconds", 300)?
        .set_default("challenge_statement", "Login into Web3 App!")?
        .set_default("challenge_capacity", 10_000)?
        .set_default("challenge_purge_seconds", 60)?
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP"))
        .build()
}

pub fn get<'a, T: Deserialize<'a>>(key: &str) -> Result<T, ConfigError> {
    CONFIG.get::<T>(key)
}

/// Same as [`get`], falling back to `default` when the key is missing or mistyped.
pub fn get_or<'a, T: Deserialize<'a>>(key: &str, default: T) -> T {
    get(key).unwrap_or(default)
}
