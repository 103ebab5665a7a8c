use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

use crate::services::ZeroValuePolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub otel_enabled: bool,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: String,
    pub request_timeout_secs: u64,
    pub city_table_path: Option<PathBuf>,
    pub ephe_path: Option<PathBuf>,
    pub zero_value_policy: ZeroValuePolicy,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            port: parse_var("PORT", "3000")?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            otel_enabled: parse_var("OTEL_ENABLED", "true")?,
            otel_service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "sidereal-horoscope-api".to_string()),
            otel_exporter_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", "30")?,
            city_table_path: optional_path("CITY_TABLE_PATH"),
            ephe_path: optional_path("EPHE_PATH"),
            zero_value_policy: parse_var("ZERO_VALUE_POLICY", "unavailable")?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            environment: "development".to_string(),
            otel_enabled: false,
            otel_service_name: "sidereal-horoscope-api".to_string(),
            otel_exporter_endpoint: "http://localhost:4317".to_string(),
            request_timeout_secs: 30,
            city_table_path: None,
            ephe_path: None,
            zero_value_policy: ZeroValuePolicy::default(),
        }
    }
}

fn optional_path(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

fn parse_var<T>(name: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .with_context(|| format!("{name} has an invalid value: {raw:?}"))
}
