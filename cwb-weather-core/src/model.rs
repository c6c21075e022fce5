use serde::{Deserialize, Serialize};

/// Day/night classification used to pick an icon variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Moment {
    #[default]
    Day,
    Night,
}

impl Moment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Moment::Day => "day",
            Moment::Night => "night",
        }
    }
}

impl std::fmt::Display for Moment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields projected from the current-observation dataset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurrentObservation {
    pub observation_time: String,
    pub location_name: String,
    pub temperature: Option<f64>,
    pub wind_speed: Option<f64>,
    /// Relative humidity as a fraction in [0, 1].
    pub humidity: Option<f64>,
}

/// Fields projected from the first time bucket of the forecast dataset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub description: String,
    pub weather_code: Option<u32>,
    pub rain_possibility_percent: Option<f64>,
    pub comfortability: String,
}

/// The unified weather state displayed by the card.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub observation_time: String,
    pub location_name: String,
    pub temperature: Option<f64>,
    pub wind_speed: Option<f64>,
    pub humidity: Option<f64>,
    pub description: String,
    pub weather_code: Option<u32>,
    pub rain_possibility_percent: Option<f64>,
    pub comfortability: String,
}

impl WeatherSnapshot {
    /// Placeholder shown before the first aggregation cycle completes.
    pub fn placeholder(location_name: impl Into<String>) -> Self {
        Self {
            location_name: location_name.into(),
            ..Self::default()
        }
    }

    /// Overlay forecast fields on top of current-observation fields.
    pub fn merge(current: CurrentObservation, forecast: ForecastSummary) -> Self {
        Self {
            observation_time: current.observation_time,
            location_name: current.location_name,
            temperature: current.temperature,
            wind_speed: current.wind_speed,
            humidity: current.humidity,
            description: forecast.description,
            weather_code: forecast.weather_code,
            rain_possibility_percent: forecast.rain_possibility_percent,
            comfortability: forecast.comfortability,
        }
    }
}
