//! State container for the weather card.
//!
//! The card owns the only mutable weather state. Every change is published as
//! a whole [`CardState`] through a `watch` channel, so subscribers never see a
//! half-updated snapshot. At most one aggregation cycle runs at a time; a
//! refresh requested while one is outstanding is rejected.

use chrono::{DateTime, Local, NaiveDateTime};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

use crate::{
    aggregator::Aggregator,
    error::WeatherError,
    model::{Moment, WeatherSnapshot},
    sun::SunriseSunsetTable,
    view::CardView,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RefreshStatus {
    /// No cycle has run yet.
    #[default]
    Idle,
    Loading,
    Ready,
    /// The last cycle failed; the snapshot is from an earlier success.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CardState {
    pub snapshot: WeatherSnapshot,
    pub status: RefreshStatus,
    pub refreshed_at: Option<DateTime<Local>>,
}

#[derive(Debug)]
pub struct WeatherCard {
    aggregator: Aggregator,
    table: Arc<SunriseSunsetTable>,
    district: String,
    state: watch::Sender<CardState>,
    refresh_lock: Mutex<()>,
}

impl WeatherCard {
    /// `district` seeds the placeholder snapshot and is the fallback key into
    /// the sunrise table when the station name has no entry.
    pub fn new(aggregator: Aggregator, table: Arc<SunriseSunsetTable>, district: impl Into<String>) -> Self {
        let district = district.into();
        let initial = CardState {
            snapshot: WeatherSnapshot::placeholder(district.as_str()),
            ..CardState::default()
        };
        let (state, _) = watch::channel(initial);

        Self {
            aggregator,
            table,
            district,
            state,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CardState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> CardState {
        self.state.borrow().clone()
    }

    pub fn snapshot(&self) -> WeatherSnapshot {
        self.state.borrow().snapshot.clone()
    }

    /// Run one aggregation cycle and publish its result.
    ///
    /// On failure the previous snapshot stays in place and the status carries
    /// the error message.
    pub async fn refresh(&self) -> Result<WeatherSnapshot, WeatherError> {
        let _guard = self.refresh_lock.try_lock().map_err(|_| {
            tracing::warn!("refresh rejected: a cycle is already in flight");
            WeatherError::RefreshInFlight
        })?;

        let mut loading = LoadingGuard::start(&self.state);

        let result = self.aggregator.fetch_snapshot().await;
        loading.disarm();

        match result {
            Ok(snapshot) => {
                tracing::info!(
                    location = %snapshot.location_name,
                    observed = %snapshot.observation_time,
                    "weather snapshot replaced"
                );
                let published = snapshot.clone();
                self.state.send_modify(move |s| {
                    s.snapshot = published;
                    s.status = RefreshStatus::Ready;
                    s.refreshed_at = Some(Local::now());
                });
                Ok(snapshot)
            }
            Err(err) => {
                tracing::warn!(error = %err, "aggregation cycle failed; keeping previous snapshot");
                let message = err.to_string();
                self.state.send_modify(move |s| s.status = RefreshStatus::Failed(message));
                Err(err)
            }
        }
    }

    /// Day/night for the current snapshot at `now` (local wall-clock time).
    pub fn moment(&self, now: NaiveDateTime) -> Option<Moment> {
        let location = self.state.borrow().snapshot.location_name.clone();
        self.table
            .moment(&location, now)
            .or_else(|| self.table.moment(&self.district, now))
    }

    pub fn view(&self, now: NaiveDateTime) -> CardView {
        CardView::new(&self.state(), self.moment(now))
    }

    pub fn view_now(&self) -> CardView {
        self.view(Local::now().naive_local())
    }
}

/// Holds the card in `Loading` for the duration of a cycle. If the cycle's
/// future is dropped before it publishes, the previous status comes back.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<CardState>,
    previous: Option<RefreshStatus>,
}

impl<'a> LoadingGuard<'a> {
    fn start(state: &'a watch::Sender<CardState>) -> Self {
        let previous = state.borrow().status.clone();
        state.send_modify(|s| s.status = RefreshStatus::Loading);
        Self { state, previous: Some(previous) }
    }

    fn disarm(&mut self) {
        self.previous = None;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            tracing::debug!("refresh cancelled mid-cycle; restoring previous status");
            self.state.send_modify(|s| s.status = previous);
        }
    }
}
