//! Daily review statistics

use crate::scheduler::Rating;
use chrono::{DateTime, Days, NaiveDate, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Counters for one calendar day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    pub reviewed: u32,
    pub correct: u32,
}

impl DailyStat {
    /// Percentage of correct answers, 0 when nothing was reviewed
    pub fn success_rate(&self) -> u32 {
        if self.reviewed == 0 {
            return 0;
        }
        (self.correct as f64 / self.reviewed as f64 * 100.0).round() as u32
    }
}

/// Review history keyed by the user's local date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default, deserialize_with = "deserialize_daily")]
    pub daily: BTreeMap<NaiveDate, DailyStat>,
    #[serde(default, deserialize_with = "deserialize_day")]
    pub last_review_date: Option<NaiveDate>,
}

/// Read a day key written either as `2026-10-17` or as `Sat Oct 17 2026`
fn parse_day(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(key, "%a %b %d %Y"))
        .ok()
}

fn deserialize_daily<'de, D>(deserializer: D) -> Result<BTreeMap<NaiveDate, DailyStat>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, DailyStat>>::deserialize(deserializer)?;
    let mut daily = BTreeMap::new();

    for (key, stat) in raw.unwrap_or_default() {
        match parse_day(&key) {
            Some(day) => {
                let entry: &mut DailyStat = daily.entry(day).or_default();
                entry.reviewed = entry.reviewed.saturating_add(stat.reviewed);
                entry.correct = entry.correct.saturating_add(stat.correct);
            }
            None => warn!(key = %key, "Skipping stats entry with unreadable date"),
        }
    }

    Ok(daily)
}

fn deserialize_day<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_day))
}

impl Stats {
    /// Count one rating against the day of `now`
    pub fn record_review<Tz: TimeZone>(&mut self, rating: Rating, now: &DateTime<Tz>) {
        let day = now.date_naive();
        let entry = self.daily.entry(day).or_default();
        entry.reviewed = entry.reviewed.saturating_add(1);
        if rating.is_correct() {
            entry.correct = entry.correct.saturating_add(1);
        }
        self.last_review_date = Some(day);
    }

    /// Consecutive days with reviews, ending today
    pub fn streak<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> u32 {
        let mut day = now.date_naive();
        let mut streak = 0;

        while self.daily.contains_key(&day) {
            streak += 1;
            match day.checked_sub_days(Days::new(1)) {
                Some(previous) => day = previous,
                None => break,
            }
        }

        streak
    }

    pub fn day(&self, day: NaiveDate) -> DailyStat {
        self.daily.get(&day).copied().unwrap_or_default()
    }

    pub fn reviewed_on(&self, day: NaiveDate) -> u32 {
        self.day(day).reviewed
    }

    pub fn success_rate(&self, day: NaiveDate) -> u32 {
        self.day(day).success_rate()
    }

    /// The last `count` days ending today, oldest first, including empty days
    pub fn recent_days<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        count: u64,
    ) -> Vec<(NaiveDate, DailyStat)> {
        let today = now.date_naive();
        (0..count)
            .rev()
            .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
            .map(|day| (day, self.day(day)))
            .collect()
    }
}
