use crate::app_config::{AppConfig, Environment, COMPRESS_QUALITY_RANGE};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = require("DATABASE_URL")?;
    let storage_url = require("VITRINA_STORAGE_URL")?;
    let storage_key = require("VITRINA_STORAGE_KEY")?;

    let env = parse_environment(&or_default("VITRINA_ENV", "development"));
    let log_level = or_default("VITRINA_LOG_LEVEL", "info");

    let storage_bucket = or_default("VITRINA_STORAGE_BUCKET", "product-images");
    let cover_bucket = or_default("VITRINA_COVER_BUCKET", "collection-covers");
    let storage_timeout_secs = parse_u64("VITRINA_STORAGE_TIMEOUT_SECS", "30")?;
    let storage_user_agent = or_default("VITRINA_STORAGE_USER_AGENT", "vitrina/0.1 (catalog-admin)");
    let cache_control_secs = parse_u64("VITRINA_CACHE_CONTROL_SECS", "3600")?;
    let upload_timeout_secs = parse_u64("VITRINA_UPLOAD_TIMEOUT_SECS", "60")?;

    let compress_max_width = parse_u32("VITRINA_COMPRESS_MAX_WIDTH", "1200")?;
    let compress_quality = parse_quality(&or_default("VITRINA_COMPRESS_QUALITY", "80"))?;
    let compress_threshold_bytes = parse_usize("VITRINA_COMPRESS_THRESHOLD_BYTES", "204800")?;

    let db_max_connections = parse_u32("VITRINA_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("VITRINA_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("VITRINA_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        storage_url,
        storage_key,
        storage_bucket,
        cover_bucket,
        storage_timeout_secs,
        storage_user_agent,
        cache_control_secs,
        upload_timeout_secs,
        compress_max_width,
        compress_quality,
        compress_threshold_bytes,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

/// JPEG quality must fall inside [`COMPRESS_QUALITY_RANGE`].
fn parse_quality(raw: &str) -> Result<u8, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "VITRINA_COMPRESS_QUALITY".to_string(),
        reason,
    };
    let quality = raw.parse::<u8>().map_err(|e| invalid(e.to_string()))?;
    if !COMPRESS_QUALITY_RANGE.contains(&quality) {
        return Err(invalid(format!(
            "{quality} is outside {}..={}",
            COMPRESS_QUALITY_RANGE.start(),
            COMPRESS_QUALITY_RANGE.end()
        )));
    }
    Ok(quality)
}
