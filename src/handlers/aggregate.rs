use axum::{body::Bytes, extract::State, response::Response};
use serde_json::Value;
use tracing::info;

use super::preflight::{json_response, preflight};
use crate::error::ApiError;
use crate::filter::QueryDescriptor;
use crate::server::AppState;

/// POST /aggregate - run an aggregation pipeline on a channel
///
/// `pipeline` is an array of stage objects in Extended JSON. Time-window keys are
/// accepted but only matter if the pipeline filters on them itself.
pub async fn aggregate_post(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    info!("Handling a /aggregate request");

    let request = preflight(&state, &body, &["pipeline"])?;
    let descriptor = QueryDescriptor::from_request(&request)?;
    let pipeline = request.get("pipeline").unwrap_or(&Value::Null);
    let payload = state.datalake.aggregate(&descriptor, pipeline).await?;

    info!("Served /aggregate request");
    Ok(json_response(payload))
}
