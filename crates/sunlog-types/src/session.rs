use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Session timestamp as stored upstream: either a date/timestamp string or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionDate {
    Text(String),
    /// Integral or floating-point milliseconds; fractions are truncated.
    #[serde(deserialize_with = "epoch_millis")]
    EpochMillis(i64),
}

fn epoch_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Int(i64),
        Float(f64),
    }

    match Millis::deserialize(deserializer)? {
        Millis::Int(ms) => Ok(ms),
        Millis::Float(ms) if ms.is_finite() && ms.abs() < i64::MAX as f64 => Ok(ms.trunc() as i64),
        Millis::Float(ms) => Err(de::Error::custom(format!(
            "epoch milliseconds {ms} out of range"
        ))),
    }
}

impl SessionDate {
    /// Calendar day the session belongs to.
    ///
    /// Offset-bearing timestamps keep the day in their own offset; epoch
    /// milliseconds resolve to the UTC day.
    pub fn day(&self) -> Option<NaiveDate> {
        match self {
            SessionDate::Text(raw) => parse_day(raw.trim()),
            SessionDate::EpochMillis(ms) => {
                DateTime::from_timestamp_millis(*ms).map(|dt| dt.date_naive())
            }
        }
    }
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = raw.replacen(' ', "T", 1).parse::<NaiveDateTime>() {
        return Some(dt.date());
    }
    raw.parse::<NaiveDate>().ok()
}

/// One logged sun-exposure session. Read-only from the analytics side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub date: SessionDate,
    #[serde(default, alias = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,
    /// Pre-migration name of `duration_minutes`.
    #[serde(
        default,
        alias = "exposureTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub exposure_time_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,
}

impl SessionRecord {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, date: SessionDate) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            date,
            duration_minutes: None,
            exposure_time_minutes: None,
            uv_index: None,
        }
    }

    pub fn with_duration(mut self, minutes: f64) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn with_exposure_time(mut self, minutes: f64) -> Self {
        self.exposure_time_minutes = Some(minutes);
        self
    }

    pub fn with_uv_index(mut self, uv_index: f64) -> Self {
        self.uv_index = Some(uv_index);
        self
    }

    /// Sanitised duration: first present field wins, negatives and NaN become zero.
    pub fn minutes(&self) -> f64 {
        self.duration_minutes
            .or(self.exposure_time_minutes)
            .map(sanitize)
            .unwrap_or(0.0)
    }

    pub fn uv(&self) -> Option<f64> {
        self.uv_index.filter(|uv| uv.is_finite() && *uv >= 0.0)
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.date.day()
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatistics {
    pub total_sessions: u64,
    pub total_minutes: f64,
    pub current_streak_days: u32,
    pub average_minutes_per_day: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub sessions: u64,
    pub minutes: f64,
    pub active_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotal {
    pub day: NaiveDate,
    pub sessions: u64,
    pub minutes: f64,
}
