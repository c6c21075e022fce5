use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::collections::HashMap;

use crate::{
    config::Config,
    error::{Endpoint, WeatherError},
    model::{CurrentObservation, ForecastSummary},
};

use super::WeatherSource;

const WIND_SPEED: &str = "WDSD";
const TEMPERATURE: &str = "TEMP";
const HUMIDITY: &str = "HUMD";

const WEATHER: &str = "Wx";
const RAIN_POSSIBILITY: &str = "PoP";
const COMFORT: &str = "CI";

/// Client for the CWB open-data datastore, bound to one station and one district.
#[derive(Debug, Clone)]
pub struct CwbClient {
    api_key: String,
    base_url: String,
    station: String,
    district: String,
    http: Client,
}

impl CwbClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        station: impl Into<String>,
        district: impl Into<String>,
    ) -> Self {
        Self::with_http(Client::new(), api_key, base_url, station, district)
    }

    pub fn with_http(
        http: Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        station: impl Into<String>,
        district: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            station: station.into(),
            district: district.into(),
            http,
        }
    }

    /// Construct a client from config, applying the optional request timeout.
    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        let api_key = config.api_key()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self::with_http(
            builder.build()?,
            api_key,
            config.base_url.as_str(),
            config.station.as_str(),
            config.district.as_str(),
        ))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        location_name: &str,
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint.dataset_id());
        tracing::debug!(%endpoint, %url, location_name, "requesting CWB dataset");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("Authorization", self.api_key.as_str()),
                ("locationName", location_name),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| WeatherError::Parse { endpoint, source })
    }
}

#[async_trait]
impl WeatherSource for CwbClient {
    async fn fetch_current(&self) -> Result<CurrentObservation, WeatherError> {
        let parsed: CwbResponse<ObsLocation> = self.get(Endpoint::Observation, &self.station).await?;
        let location = parsed
            .records
            .location
            .into_iter()
            .next()
            .ok_or(WeatherError::EmptyRecords(Endpoint::Observation))?;

        location.into_observation()
    }

    async fn fetch_forecast(&self) -> Result<ForecastSummary, WeatherError> {
        let parsed: CwbResponse<ForecastLocation> =
            self.get(Endpoint::Forecast, &self.district).await?;
        let location = parsed
            .records
            .location
            .into_iter()
            .next()
            .ok_or(WeatherError::EmptyRecords(Endpoint::Forecast))?;

        location.into_summary()
    }
}

#[derive(Debug, Deserialize)]
struct CwbResponse<L> {
    records: CwbRecords<L>,
}

#[derive(Debug, Deserialize)]
struct CwbRecords<L> {
    location: Vec<L>,
}

#[derive(Debug, Deserialize)]
struct ObsTime {
    #[serde(rename = "obsTime")]
    obs_time: String,
}

/// Element values arrive as strings, but some dataset revisions send bare numbers.
/// Anything else is kept as-is and only rejected if an allow-listed element holds it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ElementValue {
    Text(String),
    Number(f64),
    Other(serde_json::Value),
}

impl Default for ElementValue {
    fn default() -> Self {
        ElementValue::Other(serde_json::Value::Null)
    }
}

#[derive(Debug, Deserialize)]
struct ObsElement {
    #[serde(rename = "elementName")]
    element_name: String,
    #[serde(rename = "elementValue", default)]
    element_value: ElementValue,
}

#[derive(Debug, Deserialize)]
struct ObsLocation {
    time: ObsTime,
    #[serde(rename = "locationName")]
    location_name: String,
    #[serde(rename = "weatherElement")]
    weather_element: Vec<ObsElement>,
}

impl ObsLocation {
    fn into_observation(self) -> Result<CurrentObservation, WeatherError> {
        let elements: HashMap<&str, &ElementValue> = self
            .weather_element
            .iter()
            .map(|e| (e.element_name.as_str(), &e.element_value))
            .collect();

        let numeric = |name: &str| -> Result<Option<f64>, WeatherError> {
            elements.get(name).map_or(Ok(None), |value| measurement(name, value))
        };

        Ok(CurrentObservation {
            temperature: numeric(TEMPERATURE)?,
            wind_speed: numeric(WIND_SPEED)?,
            humidity: numeric(HUMIDITY)?,
            observation_time: self.time.obs_time,
            location_name: self.location_name,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Parameter {
    #[serde(rename = "parameterName")]
    parameter_name: String,
    #[serde(rename = "parameterValue", default)]
    parameter_value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeBucket {
    parameter: Parameter,
}

#[derive(Debug, Deserialize)]
struct ForecastElement {
    #[serde(rename = "elementName")]
    element_name: String,
    time: Vec<TimeBucket>,
}

#[derive(Debug, Deserialize)]
struct ForecastLocation {
    #[serde(rename = "weatherElement")]
    weather_element: Vec<ForecastElement>,
}

impl ForecastLocation {
    fn into_summary(self) -> Result<ForecastSummary, WeatherError> {
        // Only the first time bucket of each element is used.
        let first: HashMap<&str, &Parameter> = self
            .weather_element
            .iter()
            .filter_map(|e| e.time.first().map(|t| (e.element_name.as_str(), &t.parameter)))
            .collect();

        let weather = first.get(WEATHER);

        let weather_code = weather
            .and_then(|p| p.parameter_value.as_deref())
            .map(|v| {
                v.trim().parse::<u32>().map_err(|_| WeatherError::InvalidElement {
                    name: WEATHER.to_string(),
                    value: v.to_string(),
                })
            })
            .transpose()?;

        let rain_possibility_percent = first
            .get(RAIN_POSSIBILITY)
            .map(|p| parse_number(RAIN_POSSIBILITY, &p.parameter_name))
            .transpose()?;

        Ok(ForecastSummary {
            description: weather.map(|p| p.parameter_name.clone()).unwrap_or_default(),
            weather_code,
            rain_possibility_percent,
            comfortability: first
                .get(COMFORT)
                .map(|p| p.parameter_name.clone())
                .unwrap_or_default(),
        })
    }
}

/// CWB reports missing measurements as -99 or -999; `null` is treated the same.
fn measurement(name: &str, value: &ElementValue) -> Result<Option<f64>, WeatherError> {
    let n = match value {
        ElementValue::Number(n) => *n,
        ElementValue::Text(s) => parse_number(name, s)?,
        ElementValue::Other(serde_json::Value::Null) => return Ok(None),
        ElementValue::Other(other) => {
            return Err(WeatherError::InvalidElement {
                name: name.to_string(),
                value: other.to_string(),
            });
        }
    };

    Ok(if n <= -99.0 { None } else { Some(n) })
}

fn parse_number(name: &str, s: &str) -> Result<f64, WeatherError> {
    s.trim().parse::<f64>().map_err(|_| WeatherError::InvalidElement {
        name: name.to_string(),
        value: s.to_string(),
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
