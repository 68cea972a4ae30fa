//! Longitudinal statistics over a user's session history.

use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet},
};

use chrono::{Datelike, Days, NaiveDate};
use sunlog_types::{
    config::StatsConfig,
    session::{DailyTotal, MonthlySummary, SessionRecord, SessionStatistics},
};
use tracing::{debug, error, warn};

mod source;

pub use source::{store_error, InMemorySessionSource, SessionSource, SourceMode};

/// Newest day first; undated records last. Ties break on the raw date, then id,
/// so any input permutation sorts to the same sequence.
pub fn sort_descending(records: &mut [SessionRecord]) {
    records.sort_by_cached_key(|record| {
        (
            Reverse(record.day()),
            Reverse(record.date.clone()),
            record.id.clone(),
        )
    });
}

/// Order-independent sum of session minutes.
fn sum_minutes<'a>(records: impl IntoIterator<Item = &'a SessionRecord>) -> f64 {
    let mut minutes: Vec<f64> = records.into_iter().map(SessionRecord::minutes).collect();
    minutes.sort_by(f64::total_cmp);
    minutes.into_iter().sum()
}

pub fn active_days(records: &[SessionRecord]) -> BTreeSet<NaiveDate> {
    records.iter().filter_map(SessionRecord::day).collect()
}

/// Consecutive active days ending today, looking back at most `lookback_days`.
/// An inactive today does not end the streak.
pub fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate, lookback_days: u32) -> u32 {
    let mut streak = 0;
    for offset in 0..lookback_days {
        let Some(day) = today.checked_sub_days(Days::new(offset as u64)) else {
            break;
        };
        if days.contains(&day) {
            streak += 1;
        } else if offset > 0 {
            break;
        }
    }
    streak
}

pub fn compute_statistics(
    records: &[SessionRecord],
    today: NaiveDate,
    lookback_days: u32,
) -> SessionStatistics {
    if records.is_empty() {
        return SessionStatistics::default();
    }
    let total_minutes = sum_minutes(records);
    let days = active_days(records);
    let undated = records.iter().filter(|r| r.day().is_none()).count();
    if undated > 0 {
        warn!("{undated} session(s) have unparseable dates; excluded from day-based stats");
    }
    let average = if days.is_empty() {
        0
    } else {
        (total_minutes / days.len() as f64).round() as u64
    };

    SessionStatistics {
        total_sessions: records.len() as u64,
        total_minutes,
        current_streak_days: current_streak(&days, today, lookback_days),
        average_minutes_per_day: average,
    }
}

pub fn sessions_on(records: &[SessionRecord], day: NaiveDate) -> Vec<SessionRecord> {
    records
        .iter()
        .filter(|record| record.day() == Some(day))
        .cloned()
        .collect()
}

/// Per-day totals, newest day first.
pub fn daily_totals(records: &[SessionRecord]) -> Vec<DailyTotal> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&SessionRecord>> = BTreeMap::new();
    for record in records {
        if let Some(day) = record.day() {
            by_day.entry(day).or_default().push(record);
        }
    }
    by_day
        .into_iter()
        .rev()
        .map(|(day, sessions)| DailyTotal {
            day,
            sessions: sessions.len() as u64,
            minutes: sum_minutes(sessions),
        })
        .collect()
}

pub fn monthly_summary(records: &[SessionRecord], year: i32, month: u32) -> MonthlySummary {
    let in_month: Vec<(&SessionRecord, NaiveDate)> = records
        .iter()
        .filter_map(|record| record.day().map(|day| (record, day)))
        .filter(|(_, day)| day.year() == year && day.month() == month)
        .collect();
    let active: BTreeSet<NaiveDate> = in_month.iter().map(|(_, day)| *day).collect();

    MonthlySummary {
        year,
        month,
        sessions: in_month.len() as u64,
        minutes: sum_minutes(in_month.iter().map(|(record, _)| *record)),
        active_days: active.len() as u32,
    }
}

/// Retrieves histories from a [`SessionSource`] and derives statistics,
/// degrading instead of failing when the store misbehaves.
#[derive(Debug, Clone, Default)]
pub struct StatisticsAggregator {
    config: StatsConfig,
}

impl StatisticsAggregator {
    pub fn new(config: StatsConfig) -> Self {
        Self { config }
    }

    pub fn statistics(&self, records: &[SessionRecord], today: NaiveDate) -> SessionStatistics {
        compute_statistics(records, today, self.config.streak_lookback_days)
    }

    /// Newest-first history. Falls back to an unordered query plus a local
    /// sort, and to an empty list when both queries fail.
    pub async fn fetch_history<S>(&self, source: &S, user_id: &str) -> Vec<SessionRecord>
    where
        S: SessionSource + ?Sized,
    {
        match source.sessions_by_date_desc(user_id).await {
            Ok(records) => {
                debug!("Loaded {} ordered sessions for {user_id}", records.len());
                return records;
            }
            Err(err) => warn!("Ordered session query failed for {user_id}: {err}; sorting locally"),
        }

        match source.sessions_unordered(user_id).await {
            Ok(mut records) => {
                sort_descending(&mut records);
                debug!("Loaded {} unordered sessions for {user_id}", records.len());
                records
            }
            Err(err) => {
                error!("Session store unavailable for {user_id}: {err}");
                Vec::new()
            }
        }
    }

    pub async fn fetch_statistics<S>(
        &self,
        source: &S,
        user_id: &str,
        today: NaiveDate,
    ) -> SessionStatistics
    where
        S: SessionSource + ?Sized,
    {
        let records = self.fetch_history(source, user_id).await;
        self.statistics(&records, today)
    }
}
