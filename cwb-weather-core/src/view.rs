//! Display-only values derived from the card state.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;

use crate::{
    card::{CardState, RefreshStatus},
    model::Moment,
};

/// Icon families selected by CWB weather codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherKind {
    Thunderstorm,
    Clear,
    CloudyFog,
    Cloudy,
    Fog,
    PartiallyClearWithRain,
    Snowing,
}

impl WeatherKind {
    /// Map a CWB `Wx` code to its icon family. Unknown codes fall back to cloudy.
    pub fn from_code(code: u32) -> Self {
        match code {
            15..=18 | 21 | 22 | 33..=36 | 41 => Self::Thunderstorm,
            1 => Self::Clear,
            25..=28 => Self::CloudyFog,
            2..=7 => Self::Cloudy,
            24 => Self::Fog,
            8..=14 | 19 | 20 | 29..=32 | 38 | 39 => Self::PartiallyClearWithRain,
            23 | 37 | 42 => Self::Snowing,
            _ => Self::Cloudy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thunderstorm => "thunderstorm",
            Self::Clear => "clear",
            Self::CloudyFog => "cloudy-fog",
            Self::Cloudy => "cloudy",
            Self::Fog => "fog",
            Self::PartiallyClearWithRain => "partially-clear-with-rain",
            Self::Snowing => "snowing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeatherIcon {
    pub kind: WeatherKind,
    pub moment: Moment,
}

impl WeatherIcon {
    /// Unresolved codes and moments fall back to the default variant.
    pub fn new(code: Option<u32>, moment: Option<Moment>) -> Self {
        Self {
            kind: code.map_or(WeatherKind::Cloudy, WeatherKind::from_code),
            moment: moment.unwrap_or_default(),
        }
    }

    pub fn name(&self) -> String {
        format!("{}-{}", self.moment, self.kind.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub location: String,
    pub description: String,
    pub temperature: Option<i64>,
    pub wind_speed: Option<f64>,
    pub humidity_percent: Option<i64>,
    pub rain_possibility_percent: Option<i64>,
    pub comfortability: String,
    /// Time of day of the observation, e.g. `下午3:20`.
    pub observed_at: Option<String>,
    pub icon: WeatherIcon,
    pub status: RefreshStatus,
}

impl CardView {
    pub fn new(state: &CardState, moment: Option<Moment>) -> Self {
        let s = &state.snapshot;

        Self {
            location: s.location_name.clone(),
            description: s.description.clone(),
            temperature: s.temperature.map(round),
            wind_speed: s.wind_speed,
            humidity_percent: s.humidity.map(|h| round(h * 100.0)),
            rain_possibility_percent: s.rain_possibility_percent.map(round),
            comfortability: s.comfortability.clone(),
            observed_at: parse_observation_time(&s.observation_time).map(format_time_of_day),
            icon: WeatherIcon::new(s.weather_code, moment),
            status: state.status.clone(),
        }
    }
}

impl fmt::Display for CardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.location)?;
        if !self.description.is_empty() {
            writeln!(f, "{}", self.description)?;
        }
        writeln!(f, "{} °C  [{}]", or_dash(self.temperature), self.icon.name())?;
        writeln!(f, "風速 {} m/s", or_dash(self.wind_speed))?;
        writeln!(f, "降雨機率 {}%", or_dash(self.rain_possibility_percent))?;
        writeln!(f, "濕度 {}%", or_dash(self.humidity_percent))?;
        if !self.comfortability.is_empty() {
            writeln!(f, "{}", self.comfortability)?;
        }
        write!(
            f,
            "最後觀測時間：{}",
            self.observed_at.as_deref().unwrap_or("--")
        )?;

        match &self.status {
            RefreshStatus::Loading => write!(f, "  (更新中…)"),
            RefreshStatus::Failed(msg) => write!(f, "\n更新失敗：{msg}"),
            RefreshStatus::Idle | RefreshStatus::Ready => Ok(()),
        }
    }
}

fn round(x: f64) -> i64 {
    x.round() as i64
}

fn or_dash<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "--".to_string(), |v| v.to_string())
}

/// CWB sends `YYYY-MM-DD HH:MM:SS` local time; newer datasets use RFC 3339.
fn parse_observation_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.time())
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.time()))
        .ok()
}

/// `zh-TW` hour/minute formatting: `上午9:05`, `下午12:30`.
fn format_time_of_day(t: NaiveTime) -> String {
    let (pm, hour) = t.hour12();
    let period = if pm { "下午" } else { "上午" };
    format!("{period}{hour}:{:02}", t.minute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WeatherSnapshot;

    fn state() -> CardState {
        CardState {
            snapshot: WeatherSnapshot {
                observation_time: "2024-05-01 15:20:00".into(),
                location_name: "臺北".into(),
                temperature: Some(27.5),
                wind_speed: Some(1.8),
                humidity: Some(0.664),
                description: "多雲時晴".into(),
                weather_code: Some(2),
                rain_possibility_percent: Some(20.0),
                comfortability: "舒適至悶熱".into(),
            },
            status: RefreshStatus::Ready,
            refreshed_at: None,
        }
    }

    #[test]
    fn derives_rounded_values() {
        let view = CardView::new(&state(), Some(Moment::Night));

        assert_eq!(view.temperature, Some(28));
        assert_eq!(view.humidity_percent, Some(66));
        assert_eq!(view.rain_possibility_percent, Some(20));
        assert_eq!(view.observed_at.as_deref(), Some("下午3:20"));
        assert_eq!(view.icon.name(), "night-cloudy");
    }

    #[test]
    fn missing_moment_uses_day_variant() {
        let view = CardView::new(&state(), None);
        assert_eq!(view.icon.moment, Moment::Day);
        assert_eq!(view.icon.name(), "day-cloudy");
    }

    #[test]
    fn weather_codes_select_kinds() {
        assert_eq!(WeatherKind::from_code(1), WeatherKind::Clear);
        assert_eq!(WeatherKind::from_code(4), WeatherKind::Cloudy);
        assert_eq!(WeatherKind::from_code(24), WeatherKind::Fog);
        assert_eq!(WeatherKind::from_code(26), WeatherKind::CloudyFog);
        assert_eq!(WeatherKind::from_code(30), WeatherKind::PartiallyClearWithRain);
        assert_eq!(WeatherKind::from_code(34), WeatherKind::Thunderstorm);
        assert_eq!(WeatherKind::from_code(42), WeatherKind::Snowing);
        assert_eq!(WeatherKind::from_code(99), WeatherKind::Cloudy);
    }

    #[test]
    fn formats_time_of_day() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(format_time_of_day(t(0, 5)), "上午12:05");
        assert_eq!(format_time_of_day(t(9, 5)), "上午9:05");
        assert_eq!(format_time_of_day(t(12, 30)), "下午12:30");
        assert_eq!(format_time_of_day(t(23, 59)), "下午11:59");
    }

    #[test]
    fn accepts_rfc3339_observation_time() {
        assert_eq!(
            parse_observation_time("2024-05-01T08:10:00+08:00"),
            NaiveTime::from_hms_opt(8, 10, 0)
        );
        assert_eq!(parse_observation_time(""), None);
    }

    #[test]
    fn placeholder_renders_dashes() {
        let state = CardState {
            snapshot: WeatherSnapshot::placeholder("臺北市"),
            ..CardState::default()
        };
        let text = CardView::new(&state, None).to_string();

        assert!(text.starts_with("臺北市\n"));
        assert!(text.contains("-- °C  [day-cloudy]"));
        assert!(text.contains("最後觀測時間：--"));
    }

    #[test]
    fn failed_status_is_visible() {
        let mut state = state();
        state.status = RefreshStatus::Failed("boom".into());
        let text = CardView::new(&state, Some(Moment::Day)).to_string();

        assert!(text.contains("28 °C  [day-cloudy]"));
        assert!(text.ends_with("更新失敗：boom"));
    }
}
