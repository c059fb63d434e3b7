use serde_json::{Map, Value};

use super::channel::collection_from_channel;
use super::error::FilterError;
use super::types::{QueryDescriptor, TimeWindow, WINDOW_KEYS};

/// Key inside `query` that `/latest` reads as a result count.
pub const COUNT_KEY: &str = "count";

impl QueryDescriptor {
    pub fn new(channel: impl Into<String>) -> Result<Self, FilterError> {
        let channel = channel.into();
        if channel.is_empty() {
            return Err(FilterError::BadCollection("channel cannot be empty".to_string()));
        }
        Ok(Self {
            channel,
            custom_filter: Map::new(),
            window: TimeWindow::default(),
        })
    }

    pub fn with_filter(mut self, custom_filter: Map<String, Value>) -> Self {
        self.custom_filter = custom_filter;
        self
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    /// Build a descriptor from a parsed request body.
    ///
    /// `channel` must be a non-empty string. `query` is copied verbatim when it is an
    /// object, and the `past_*` offsets are truncated toward zero.
    pub fn from_request(request: &Map<String, Value>) -> Result<Self, FilterError> {
        let channel = match request.get("channel") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(FilterError::MissingField(format!(
                    "channel must be a string, got {}",
                    json_kind(other)
                )))
            }
            None => return Err(FilterError::MissingField("channel".to_string())),
        };

        let custom_filter = match request.get("query") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(FilterError::invalid_field(
                    "query",
                    format!("expected an object, got {}", json_kind(other)),
                ))
            }
        };

        let [days, hours, minutes, seconds] = WINDOW_KEYS;
        let window = TimeWindow {
            days: window_offset(request, days)?,
            hours: window_offset(request, hours)?,
            minutes: window_offset(request, minutes)?,
            seconds: window_offset(request, seconds)?,
        };

        Ok(Self::new(channel)?.with_filter(custom_filter).with_window(window))
    }

    /// Resolve the collection this descriptor targets.
    pub fn collection_name(&self) -> Result<String, FilterError> {
        let name = collection_from_channel(&self.channel);
        if name.is_empty() {
            return Err(FilterError::BadCollection(format!(
                "channel '{}' does not name a collection",
                self.channel
            )));
        }
        Ok(name)
    }

    /// Separate `query.count` from the filter.
    ///
    /// Returns a descriptor without the `count` key plus the parsed count, which must be
    /// a positive number when present.
    pub fn split_count(&self) -> Result<(QueryDescriptor, Option<u64>), FilterError> {
        let mut custom_filter = self.custom_filter.clone();
        let count = match custom_filter.remove(COUNT_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => {
                let value = n.as_f64().map(f64::trunc).unwrap_or(0.0);
                if value < 1.0 {
                    return Err(FilterError::invalid_field(
                        "query.count",
                        format!("must be a positive integer, got {}", n),
                    ));
                }
                Some(value as u64)
            }
            Some(other) => {
                return Err(FilterError::invalid_field(
                    "query.count",
                    format!("expected a number, got {}", json_kind(&other)),
                ))
            }
        };

        let descriptor = QueryDescriptor {
            channel: self.channel.clone(),
            custom_filter,
            window: self.window,
        };
        Ok((descriptor, count))
    }
}

fn window_offset(request: &Map<String, Value>, key: &str) -> Result<u64, FilterError> {
    match request.get(key) {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => {
            let value = n
                .as_f64()
                .filter(|v| v.is_finite())
                .map(f64::trunc)
                .ok_or_else(|| FilterError::invalid_field(key, format!("unusable number {}", n)))?;
            if value < 0.0 {
                return Err(FilterError::invalid_field(key, "must not be negative"));
            }
            // `as` saturates at u64::MAX for oversized values
            Ok(value as u64)
        }
        Some(other) => Err(FilterError::invalid_field(
            key,
            format!("expected a number, got {}", json_kind(other)),
        )),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
