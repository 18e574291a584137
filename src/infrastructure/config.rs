use crate::infrastructure::error::InfraError;
use chrono_tz::Tz;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use url::Url;

const APP_JSON: &str = "app.json";
const DEFAULT_TIMEZONE: &str = "UTC";
const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/";
const DEFAULT_LOG_LEVEL: &str = "info";
const SUPPORTED_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub app_name: String,
    pub timezone: Tz,
    pub api_base_url: Url,
    pub log_level: String,
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([(
        APP_JSON,
        serde_json::json!({
            "schema": 1,
            "appName": "Surrogacy CRM",
            "timezone": DEFAULT_TIMEZONE,
            "apiBaseUrl": DEFAULT_API_BASE_URL,
            "logLevel": DEFAULT_LOG_LEVEL
        }),
    )])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

fn read_str<'a>(value: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub fn load_app_config(config_dir: &Path) -> Result<AppConfig, InfraError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    Ok(AppConfig {
        app_name: read_str(&app, "appName").unwrap_or("Surrogacy CRM").to_string(),
        timezone: parse_timezone(read_str(&app, "timezone").unwrap_or(DEFAULT_TIMEZONE))?,
        api_base_url: parse_api_base_url(read_str(&app, "apiBaseUrl").unwrap_or(DEFAULT_API_BASE_URL))?,
        log_level: parse_log_level(read_str(&app, "logLevel").unwrap_or(DEFAULT_LOG_LEVEL))?,
    })
}

fn parse_timezone(value: &str) -> Result<Tz, InfraError> {
    value
        .parse::<Tz>()
        .map_err(|error| InfraError::InvalidConfig(format!("invalid timezone '{value}': {error}")))
}

fn parse_api_base_url(value: &str) -> Result<Url, InfraError> {
    // Relative endpoint joins need a trailing slash on the base path.
    let normalized = if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{value}/")
    };
    let url = Url::parse(&normalized)
        .map_err(|error| InfraError::InvalidConfig(format!("invalid apiBaseUrl '{value}': {error}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(InfraError::InvalidConfig(format!(
            "apiBaseUrl must be an http(s) URL: {value}"
        )));
    }
    Ok(url)
}

fn parse_log_level(value: &str) -> Result<String, InfraError> {
    let normalized = value.to_ascii_lowercase();
    if !SUPPORTED_LOG_LEVELS.contains(&normalized.as_str()) {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported logLevel '{value}'"
        )));
    }
    Ok(normalized)
}
