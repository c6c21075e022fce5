//! Sunrise/sunset reference table and the day/night resolver built on it.
//!
//! The table is a JSON array of `{locationName, time: [{dataTime, sunrise, sunset}]}`
//! records. A copy covering the bundled window is compiled into the crate; a
//! replacement file can be loaded with [`SunriseSunsetTable::load`].

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};

use crate::model::Moment;

const BUNDLED_TABLE: &str = include_str!("../data/sunrise-sunset.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunTime {
    #[serde(rename = "dataTime")]
    pub data_time: String,
    pub sunrise: String,
    pub sunset: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunriseSunsetEntry {
    #[serde(rename = "locationName")]
    pub location_name: String,
    pub time: Vec<SunTime>,
}

/// Immutable lookup from location name to its per-date sunrise/sunset rows.
#[derive(Debug, Clone, Default)]
pub struct SunriseSunsetTable {
    locations: HashMap<String, Vec<SunTime>>,
}

impl SunriseSunsetTable {
    pub fn new(entries: Vec<SunriseSunsetEntry>) -> Self {
        let locations = entries
            .into_iter()
            .map(|entry| (entry.location_name, entry.time))
            .collect();
        Self { locations }
    }

    /// Table compiled into the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_TABLE).context("Failed to parse bundled sunrise/sunset table")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<SunriseSunsetEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read sunrise/sunset table: {}", path.display()))?;

        Self::from_json(&contents)
            .with_context(|| format!("Failed to parse sunrise/sunset table: {}", path.display()))
    }

    pub fn contains_location(&self, location_name: &str) -> bool {
        self.locations.contains_key(location_name)
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Classify `now` (local wall-clock time) as day or night at `location_name`.
    ///
    /// Returns `None` when the location or the date is not in the table, or when
    /// the matching row holds a malformed time. Sunrise and sunset are both
    /// inclusive.
    pub fn moment(&self, location_name: &str, now: NaiveDateTime) -> Option<Moment> {
        let rows = self.locations.get(location_name)?;
        let date = now.date().format("%Y-%m-%d").to_string();
        let row = rows.iter().find(|row| row.data_time == date)?;

        let day = NaiveDate::parse_from_str(&row.data_time, "%Y-%m-%d").ok()?;
        let sunrise = day.and_time(parse_time_of_day(&row.sunrise)?);
        let sunset = day.and_time(parse_time_of_day(&row.sunset)?);

        if sunrise <= now && now <= sunset {
            Some(Moment::Day)
        } else {
            Some(Moment::Night)
        }
    }

    /// Same as [`moment`](Self::moment) for an instant in any time zone.
    pub fn moment_at<Tz: TimeZone>(&self, location_name: &str, now: &DateTime<Tz>) -> Option<Moment> {
        self.moment(location_name, now.naive_local())
    }

    pub fn moment_now(&self, location_name: &str) -> Option<Moment> {
        self.moment_at(location_name, &Local::now())
    }
}

fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}
