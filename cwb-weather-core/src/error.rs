use reqwest::StatusCode;

/// Which CWB dataset a request targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Observation,
    Forecast,
}

impl Endpoint {
    /// CWB dataset id used as the last path segment.
    pub fn dataset_id(&self) -> &'static str {
        match self {
            Endpoint::Observation => "O-A0003-001",
            Endpoint::Forecast => "F-C0032-001",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Observation => f.write_str("current observation"),
            Endpoint::Forecast => f.write_str("forecast"),
        }
    }
}

/// Errors produced while fetching or refreshing weather data.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("CWB {endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: Endpoint,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to parse CWB {endpoint} JSON: {source}")]
    Parse {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    #[error("CWB {0} response contained no location records")]
    EmptyRecords(Endpoint),

    #[error("Weather element '{name}' has a non-numeric value '{value}'")]
    InvalidElement { name: String, value: String },

    #[error("No API key configured.\nHint: run `cwb-weather configure` and enter your CWB authorization key.")]
    MissingApiKey,

    #[error("A refresh is already in progress")]
    RefreshInFlight,
}
