use std::sync::Arc;

use crate::{error::WeatherError, model::WeatherSnapshot, provider::WeatherSource};

/// Runs both data legs concurrently and merges them into one snapshot.
#[derive(Debug, Clone)]
pub struct Aggregator {
    source: Arc<dyn WeatherSource>,
}

impl Aggregator {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        Self { source }
    }

    /// One aggregation cycle.
    ///
    /// Both requests are awaited to completion before either result is
    /// inspected; a failure in either leg fails the whole cycle.
    pub async fn fetch_snapshot(&self) -> Result<WeatherSnapshot, WeatherError> {
        let (current, forecast) =
            tokio::join!(self.source.fetch_current(), self.source.fetch_forecast());

        let current = current?;
        let forecast = forecast?;

        tracing::debug!(location = %current.location_name, "both legs resolved");
        Ok(WeatherSnapshot::merge(current, forecast))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        error::Endpoint,
        model::{CurrentObservation, ForecastSummary},
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted source: each leg either succeeds with fixed data or fails.
    #[derive(Debug, Default)]
    pub(crate) struct FakeSource {
        pub current: Option<CurrentObservation>,
        pub forecast: Option<ForecastSummary>,
        pub current_calls: AtomicUsize,
        pub forecast_calls: AtomicUsize,
    }

    impl FakeSource {
        pub(crate) fn ok() -> Self {
            Self {
                current: Some(CurrentObservation {
                    observation_time: "2024-05-01 12:00:00".into(),
                    location_name: "臺北".into(),
                    temperature: Some(27.5),
                    wind_speed: Some(1.8),
                    humidity: Some(0.66),
                }),
                forecast: Some(ForecastSummary {
                    description: "多雲時晴".into(),
                    weather_code: Some(2),
                    rain_possibility_percent: Some(20.0),
                    comfortability: "舒適至悶熱".into(),
                }),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl WeatherSource for FakeSource {
        async fn fetch_current(&self) -> Result<CurrentObservation, WeatherError> {
            self.current_calls.fetch_add(1, Ordering::SeqCst);
            self.current.clone().ok_or(WeatherError::EmptyRecords(Endpoint::Observation))
        }

        async fn fetch_forecast(&self) -> Result<ForecastSummary, WeatherError> {
            self.forecast_calls.fetch_add(1, Ordering::SeqCst);
            self.forecast.clone().ok_or(WeatherError::EmptyRecords(Endpoint::Forecast))
        }
    }

    #[tokio::test]
    async fn merges_both_legs() {
        let aggregator = Aggregator::new(Arc::new(FakeSource::ok()));
        let snapshot = aggregator.fetch_snapshot().await.unwrap();

        assert_eq!(snapshot.temperature, Some(27.5));
        assert_eq!(snapshot.weather_code, Some(2));
        assert_eq!(snapshot.comfortability, "舒適至悶熱");
    }

    #[tokio::test]
    async fn failing_forecast_fails_the_cycle_after_both_ran() {
        let source = Arc::new(FakeSource { forecast: None, ..FakeSource::ok() });
        let aggregator = Aggregator::new(source.clone());

        let err = aggregator.fetch_snapshot().await.unwrap_err();
        assert!(matches!(err, WeatherError::EmptyRecords(Endpoint::Forecast)));
        assert_eq!(source.current_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.forecast_calls.load(Ordering::SeqCst), 1);
    }

    /// Each leg signals the other and then waits for the other's signal, so
    /// the cycle can only finish if both legs are polled at the same time.
    #[derive(Debug, Default)]
    struct CrossedSource {
        inner: FakeSource,
        current_gate: tokio::sync::Notify,
        forecast_gate: tokio::sync::Notify,
    }

    #[async_trait]
    impl WeatherSource for CrossedSource {
        async fn fetch_current(&self) -> Result<CurrentObservation, WeatherError> {
            self.forecast_gate.notify_one();
            self.current_gate.notified().await;
            self.inner.fetch_current().await
        }

        async fn fetch_forecast(&self) -> Result<ForecastSummary, WeatherError> {
            self.current_gate.notify_one();
            self.forecast_gate.notified().await;
            self.inner.fetch_forecast().await
        }
    }

    #[tokio::test]
    async fn legs_run_concurrently() {
        use std::time::Duration;

        let source = CrossedSource { inner: FakeSource::ok(), ..CrossedSource::default() };
        let aggregator = Aggregator::new(Arc::new(source));

        let snapshot = tokio::time::timeout(Duration::from_secs(2), aggregator.fetch_snapshot())
            .await
            .expect("legs must be awaited together")
            .unwrap();
        assert_eq!(snapshot.weather_code, Some(2));
    }

    #[tokio::test]
    async fn failing_observation_fails_the_cycle() {
        let source = Arc::new(FakeSource { current: None, ..FakeSource::ok() });
        let err = Aggregator::new(source).fetch_snapshot().await.unwrap_err();
        assert!(matches!(err, WeatherError::EmptyRecords(Endpoint::Observation)));
    }
}
