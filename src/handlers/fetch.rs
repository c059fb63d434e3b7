use axum::{body::Bytes, extract::State, response::Response};
use tracing::info;

use super::preflight::{json_response, preflight};
use crate::error::ApiError;
use crate::filter::QueryDescriptor;
use crate::server::AppState;

/**
 * POST /get - Documents on a channel inside the requested time window
 *
 * ```json
 * {
 *   "channel": "/Traffic/Bus",   // Required
 *   "access_token": "eyJ...",    // Required
 *   "query": { "route": "42" },  // Optional custom filter
 *   "past_hours": 1              // Optional: past_days, past_hours, past_minutes, past_seconds
 * }
 * ```
 *
 * Responds with a JSON array of matching documents.
 */
pub async fn fetch_post(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    info!("Handling a /get request");

    let request = preflight(&state, &body, &[])?;
    let descriptor = QueryDescriptor::from_request(&request)?;
    let payload = state.datalake.fetch(&descriptor).await?;

    info!("Served /get request");
    Ok(json_response(payload))
}
