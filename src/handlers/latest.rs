use axum::{body::Bytes, extract::State, response::Response};
use tracing::info;

use super::preflight::{json_response, preflight};
use crate::error::ApiError;
use crate::filter::QueryDescriptor;
use crate::server::AppState;

/// POST /latest - newest document(s) on a channel
///
/// The custom filter and time window apply as for `/get`. `query.count` selects an
/// array of the newest `count` documents; without it the single newest document is
/// returned as an object.
pub async fn latest_post(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    info!("Handling a /latest request");

    let request = preflight(&state, &body, &[])?;
    let (descriptor, count) = QueryDescriptor::from_request(&request)?.split_count()?;
    let payload = state.datalake.latest(&descriptor, count).await?;

    info!("Served /latest request");
    Ok(json_response(payload))
}
