pub mod catalog;
pub mod config;
pub mod ephemeris;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod telemetry;

pub use config::Config;

use anyhow::Context;

use catalog::CityTable;
use ephemeris::SwissEphemeris;
use services::HoroscopeService;

#[derive(Clone)]
pub struct AppState {
    pub horoscope_service: HoroscopeService,
}

impl AppState {
    /// Build the shared state: city table (built-in or from `CITY_TABLE_PATH`)
    /// and the Swiss Ephemeris engine reading files from `EPHE_PATH`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let cities = match &config.city_table_path {
            Some(path) => CityTable::from_json_file(path)
                .with_context(|| format!("Failed to load city table from {}", path.display()))?,
            None => CityTable::builtin(),
        };

        let ephemeris = SwissEphemeris::new(config.ephe_path.as_deref())
            .context("Failed to configure the Swiss Ephemeris")?;

        tracing::info!(
            cities = cities.len(),
            ephe_path = ?config.ephe_path,
            zero_value_policy = %config.zero_value_policy,
            "Horoscope service configured"
        );

        Ok(Self {
            horoscope_service: HoroscopeService::new(
                Box::new(ephemeris),
                cities,
                config.zero_value_policy,
            ),
        })
    }
}
