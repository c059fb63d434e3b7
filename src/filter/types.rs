use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field every document carries; its value embeds the creation time in seconds.
pub const IDENTIFIER_FIELD: &str = "_id";

/// Request keys read into a `TimeWindow`, in the order they are applied.
pub const WINDOW_KEYS: [&str; 4] = ["past_days", "past_hours", "past_minutes", "past_seconds"];

/// Look-back offsets from the time a query is translated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl TimeWindow {
    pub fn hours(hours: u64) -> Self {
        Self { hours, ..Default::default() }
    }

    /// Whole window in seconds, saturating instead of overflowing.
    pub fn total_seconds(&self) -> u64 {
        self.days
            .saturating_mul(24 * 60 * 60)
            .saturating_add(self.hours.saturating_mul(60 * 60))
            .saturating_add(self.minutes.saturating_mul(60))
            .saturating_add(self.seconds)
    }

    pub fn is_zero(&self) -> bool {
        self.total_seconds() == 0
    }
}

/// Per-request query parameters: the channel, caller filter and time window.
///
/// Built once from the request body and never mutated; `split_count` returns a
/// new descriptor instead of editing this one.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub(crate) channel: String,
    pub(crate) custom_filter: Map<String, Value>,
    pub(crate) window: TimeWindow,
}

impl QueryDescriptor {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn custom_filter(&self) -> &Map<String, Value> {
        &self.custom_filter
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }
}
