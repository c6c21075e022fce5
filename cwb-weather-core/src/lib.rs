//! Core library for the `cwb-weather` card.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The sunrise/sunset table and day/night resolution
//! - The CWB open-data client and the two-leg aggregator
//! - The card state container and its display derivation
//!
//! It is used by `cwb-weather-cli`, but can also back other front ends.

pub mod aggregator;
pub mod card;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod sun;
pub mod view;

pub use aggregator::Aggregator;
pub use card::{CardState, RefreshStatus, WeatherCard};
pub use config::Config;
pub use error::{Endpoint, WeatherError};
pub use model::{CurrentObservation, ForecastSummary, Moment, WeatherSnapshot};
pub use provider::{CwbClient, WeatherSource};
pub use sun::{SunTime, SunriseSunsetEntry, SunriseSunsetTable};
pub use view::{CardView, WeatherIcon, WeatherKind};

use std::sync::Arc;

/// Wire a card from configuration: CWB client, aggregator and sunrise table.
pub fn card_from_config(config: &Config) -> anyhow::Result<WeatherCard> {
    let client = CwbClient::from_config(config)?;
    let table = config.sun_table()?;

    Ok(WeatherCard::new(
        Aggregator::new(Arc::new(client)),
        Arc::new(table),
        config.district.as_str(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_from_config_requires_api_key() {
        let err = card_from_config(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn card_from_config_starts_with_district_placeholder() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());

        let card = card_from_config(&cfg).unwrap();
        assert_eq!(card.snapshot().location_name, "臺北市");
    }
}
