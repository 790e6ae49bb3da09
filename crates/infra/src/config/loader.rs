//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `CLEARHOLD_API_URL` is missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `CLEARHOLD_API_URL`: Backend base URL (required)
//! - `CLEARHOLD_REQUEST_TIMEOUT_MS`: Per-request timeout
//! - `CLEARHOLD_MAX_ATTEMPTS`: Attempts per request, including the first
//! - `CLEARHOLD_RETRY_BASE_DELAY_MS` / `CLEARHOLD_RETRY_MAX_DELAY_MS`
//! - `CLEARHOLD_REFRESH_BUFFER_MS`: Renew credentials this early
//! - `CLEARHOLD_DEBUG_LOGGING`: Record requests for export (true/false)
//! - `CLEARHOLD_MAX_LOG_ENTRIES`
//! - `CLEARHOLD_MAX_REPLAY_ATTEMPTS`: Failed replays before a queued request
//!   is dropped
//! - `CLEARHOLD_STORAGE_PATH`: SQLite file for session and queue state
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./clearhold.json` or `./clearhold.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clearhold_domain::{ClearHoldError, ClientConfig, Result};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `ClearHoldError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `CLEARHOLD_API_URL` is required; the rest keep their defaults when
/// unset.
///
/// # Errors
/// Returns `ClearHoldError::Config` if the URL is missing or a numeric
/// variable does not parse.
pub fn load_from_env() -> Result<ClientConfig> {
    let defaults = ClientConfig::default();

    Ok(ClientConfig {
        api_base_url: env_var("CLEARHOLD_API_URL")?,
        request_timeout_ms: env_parse("CLEARHOLD_REQUEST_TIMEOUT_MS", defaults.request_timeout_ms)?,
        max_attempts: env_parse("CLEARHOLD_MAX_ATTEMPTS", defaults.max_attempts)?,
        retry_base_delay_ms: env_parse(
            "CLEARHOLD_RETRY_BASE_DELAY_MS",
            defaults.retry_base_delay_ms,
        )?,
        retry_max_delay_ms: env_parse("CLEARHOLD_RETRY_MAX_DELAY_MS", defaults.retry_max_delay_ms)?,
        refresh_buffer_ms: env_parse("CLEARHOLD_REFRESH_BUFFER_MS", defaults.refresh_buffer_ms)?,
        debug_logging: env_bool("CLEARHOLD_DEBUG_LOGGING", defaults.debug_logging),
        max_log_entries: env_parse("CLEARHOLD_MAX_LOG_ENTRIES", defaults.max_log_entries)?,
        max_replay_attempts: env_parse(
            "CLEARHOLD_MAX_REPLAY_ATTEMPTS",
            defaults.max_replay_attempts,
        )?,
        storage_path: std::env::var("CLEARHOLD_STORAGE_PATH").ok().filter(|p| !p.is_empty()),
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension). Fields
/// missing from the file keep their defaults.
///
/// # Errors
/// Returns `ClearHoldError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ClearHoldError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ClearHoldError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ClearHoldError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ClearHoldError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ClearHoldError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(ClearHoldError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["config.json", "config.toml", "clearhold.json", "clearhold.toml"];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        ClearHoldError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional numeric environment variable
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ClearHoldError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use once_cell::sync::Lazy;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 10] = [
        "CLEARHOLD_API_URL",
        "CLEARHOLD_REQUEST_TIMEOUT_MS",
        "CLEARHOLD_MAX_ATTEMPTS",
        "CLEARHOLD_RETRY_BASE_DELAY_MS",
        "CLEARHOLD_RETRY_MAX_DELAY_MS",
        "CLEARHOLD_REFRESH_BUFFER_MS",
        "CLEARHOLD_DEBUG_LOGGING",
        "CLEARHOLD_MAX_LOG_ENTRIES",
        "CLEARHOLD_MAX_REPLAY_ATTEMPTS",
        "CLEARHOLD_STORAGE_PATH",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for (i, value) in ["1", "true", "yes", "on", "TRUE"].iter().enumerate() {
            let key = format!("CLEARHOLD_TEST_BOOL_TRUE_{i}");
            std::env::set_var(&key, value);
            assert!(env_bool(&key, false), "{value}");
            std::env::remove_var(&key);
        }
        for (i, value) in ["0", "false", "no", "off"].iter().enumerate() {
            let key = format!("CLEARHOLD_TEST_BOOL_FALSE_{i}");
            std::env::set_var(&key, value);
            assert!(!env_bool(&key, true), "{value}");
            std::env::remove_var(&key);
        }

        std::env::remove_var("CLEARHOLD_TEST_BOOL_MISSING");
        assert!(env_bool("CLEARHOLD_TEST_BOOL_MISSING", true));
    }

    #[test]
    fn test_load_from_env_with_overrides() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("CLEARHOLD_API_URL", "https://api.clearhold.test");
        std::env::set_var("CLEARHOLD_MAX_ATTEMPTS", "4");
        std::env::set_var("CLEARHOLD_DEBUG_LOGGING", "on");
        std::env::set_var("CLEARHOLD_STORAGE_PATH", "/tmp/clearhold.db");

        let config = load_from_env().unwrap();
        clear_env();

        assert_eq!(config.api_base_url, "https://api.clearhold.test");
        assert_eq!(config.max_attempts, 4);
        assert!(config.debug_logging);
        assert_eq!(config.storage_path.as_deref(), Some("/tmp/clearhold.db"));
        assert_eq!(config.request_timeout_ms, ClientConfig::default().request_timeout_ms);
    }

    #[test]
    fn test_load_from_env_missing_url() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, ClearHoldError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("CLEARHOLD_API_URL", "https://api.clearhold.test");
        std::env::set_var("CLEARHOLD_REQUEST_TIMEOUT_MS", "soon");

        let result = load_from_env();
        clear_env();

        match result {
            Err(ClearHoldError::Config(msg)) => assert!(msg.contains("REQUEST_TIMEOUT_MS")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_formats() {
        let json = parse_config(r#"{"api_base_url": "https://a.test"}"#, Path::new("c.json"));
        assert_eq!(json.unwrap().api_base_url, "https://a.test");

        let toml = parse_config("debug_logging = true\nmax_attempts = 3\n", Path::new("c.toml"))
            .unwrap();
        assert!(toml.debug_logging);
        assert_eq!(toml.max_attempts, 3);

        assert!(parse_config("x: 1", Path::new("c.yaml")).is_err());
        assert!(parse_config("{", Path::new("c.json")).is_err());
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(matches!(result, Err(ClearHoldError::Config(_))));
    }
}
