use chrono::{DateTime, Utc};
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::{QueryDescriptor, TimeWindow, IDENTIFIER_FIELD};

/// Translate a descriptor into a store filter, bounded to documents created at or
/// after `now - window`.
///
/// With a zero window the cutoff is the current second, so only documents created
/// from that second on match. There is no unbounded variant.
pub fn to_native_filter(descriptor: &QueryDescriptor) -> Result<Document, FilterError> {
    to_native_filter_at(descriptor, Utc::now())
}

pub fn to_native_filter_at(
    descriptor: &QueryDescriptor,
    now: DateTime<Utc>,
) -> Result<Document, FilterError> {
    let mut filter = custom_filter_document(descriptor.custom_filter())?;
    let cutoff = cutoff_seconds(now, descriptor.window());

    // Inserted last so a caller-supplied `_id` never survives.
    filter.insert(IDENTIFIER_FIELD, doc! { "$gte": lower_bound_id(cutoff) });

    Ok(filter)
}

/// Cutoff as unix seconds, clamped to what an identifier timestamp can hold.
pub fn cutoff_seconds(now: DateTime<Utc>, window: TimeWindow) -> u32 {
    let back = i64::try_from(window.total_seconds()).unwrap_or(i64::MAX);
    now.timestamp()
        .saturating_sub(back)
        .clamp(0, i64::from(u32::MAX)) as u32
}

/// Smallest identifier whose embedded timestamp is `seconds`.
pub fn lower_bound_id(seconds: u32) -> ObjectId {
    let mut bytes = [0u8; 12];
    bytes[..4].copy_from_slice(&seconds.to_be_bytes());
    ObjectId::from_bytes(bytes)
}

fn custom_filter_document(custom_filter: &Map<String, Value>) -> Result<Document, FilterError> {
    match Bson::try_from(Value::Object(custom_filter.clone())) {
        Ok(Bson::Document(document)) => Ok(document),
        Ok(other) => Err(FilterError::InvalidFilter(format!(
            "query must describe a document, not a {:?} value",
            other.element_type()
        ))),
        Err(e) => Err(FilterError::InvalidFilter(e.to_string())),
    }
}
