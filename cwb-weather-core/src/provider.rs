use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::WeatherError,
    model::{CurrentObservation, ForecastSummary},
};

pub mod cwb;

pub use cwb::CwbClient;

/// The two data legs an aggregation cycle needs.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch_current(&self) -> Result<CurrentObservation, WeatherError>;

    async fn fetch_forecast(&self) -> Result<ForecastSummary, WeatherError>;
}
