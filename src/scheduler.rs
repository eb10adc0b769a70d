//! Simplified SM-2 style scheduling
//!
//! Intervals go 1 day, 3 days, then grow by the card's ease factor.
//! A failing rating resets the repetition count and the interval but leaves
//! the ease factor alone.

use crate::card::{Card, Schedule, ScheduleState};
use chrono::{DateTime, Duration, Utc};

/// Ease factor given to a card on its first review
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Lower bound for the ease factor
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Longest interval a card can be given, in days
pub const MAX_INTERVAL: u32 = 36_500;

/// How well a card was recalled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    /// Forgot - start over
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// Map a rating key (1-4) to a rating
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Rating::Again),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Good),
            4 => Some(Rating::Easy),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Good and Easy count as correct answers in the daily stats
    pub fn is_correct(&self) -> bool {
        self.as_u8() >= 3
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rating::Again => "Again",
            Rating::Hard => "Hard",
            Rating::Good => "Good",
            Rating::Easy => "Easy",
        }
    }
}

/// Compute the schedule that follows `current` after a rating
pub fn next_schedule(
    current: Option<&ScheduleState>,
    rating: Rating,
    now: DateTime<Utc>,
) -> ScheduleState {
    let (mut repetitions, mut ease_factor, mut interval) = match current {
        Some(state) => (
            state.repetitions,
            state.ease_factor,
            state.interval.clamp(1, MAX_INTERVAL),
        ),
        None => (0, DEFAULT_EASE_FACTOR, 1),
    };

    if rating == Rating::Again {
        repetitions = 0;
        interval = 1;
    } else {
        interval = match repetitions {
            0 => 1,
            1 => 3,
            _ => (interval as f64 * ease_factor)
                .round()
                .clamp(1.0, MAX_INTERVAL as f64) as u32,
        };
        repetitions += 1;

        let penalty = (4 - rating.as_u8()) as f64;
        ease_factor += 0.1 - penalty * (0.08 + penalty * 0.02);
        ease_factor = ease_factor.max(MIN_EASE_FACTOR);
    }

    ScheduleState {
        repetitions,
        ease_factor,
        interval,
        next_review: now
            .checked_add_signed(Duration::days(interval as i64))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
        last_reviewed: now,
    }
}

/// Apply a rating to a card, returning the rescheduled card
pub fn compute_next_schedule(rating: Rating, card: &Card, now: DateTime<Utc>) -> Card {
    let state = next_schedule(card.schedule.state(), rating, now);
    Card {
        schedule: Schedule::Scheduled(state),
        ..card.clone()
    }
}

/// Interval in days that `rating` would give the card
pub fn preview_interval(card: &Card, rating: Rating) -> u32 {
    // Only the interval matters here, so any fixed instant will do
    next_schedule(card.schedule.state(), rating, DateTime::<Utc>::UNIX_EPOCH).interval
}

/// Format an interval in days as a compact label
pub fn format_interval(days: u32) -> String {
    match days {
        0..=6 => format!("{}d", days),
        7..=29 => format!("{}w", days / 7),
        30..=364 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}
