use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How close the next event is. Ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Urgency {
    /// More than `first` minutes away
    Far,
    /// Between `first` and `second` minutes away
    Near,
    /// `second` minutes or less
    Imminent,
}

impl Urgency {
    pub fn as_str(&self) -> &str {
        match self {
            Urgency::Far => "far",
            Urgency::Near => "near",
            Urgency::Imminent => "imminent",
        }
    }
}

/// Minute thresholds separating the urgency bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_first")]
    pub first: i64,
    #[serde(default = "default_second")]
    pub second: i64,
}

fn default_first() -> i64 {
    5
}

fn default_second() -> i64 {
    2
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            first: default_first(),
            second: default_second(),
        }
    }
}

impl Thresholds {
    /// The near band only exists when `second < first`.
    pub fn is_valid(&self) -> bool {
        self.second >= 0 && self.second < self.first
    }

    pub fn classify(&self, minutes: i64) -> Urgency {
        if minutes >= self.first {
            Urgency::Far
        } else if minutes > self.second {
            Urgency::Near
        } else {
            Urgency::Imminent
        }
    }
}

/// Whole minutes from `now` until `start`, rounded down. 4m50s gives 4.
pub fn minutes_until(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (start - now).num_seconds().div_euclid(60)
}

/// Classify with the default 5/2 minute thresholds.
pub fn classify(minutes: i64) -> Urgency {
    Thresholds::default().classify(minutes)
}
