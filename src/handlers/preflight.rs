use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ApiError;
use crate::server::AppState;

/// Keys every channel request must carry.
pub const REQUIRED_KEYS: [&str; 2] = ["channel", "access_token"];

/// Parse the body, check required keys, and validate the access token.
///
/// Nothing here touches the store, so a request failing preflight costs no
/// database work.
pub fn preflight(
    state: &AppState,
    body: &[u8],
    extra_keys: &[&str],
) -> Result<Map<String, Value>, ApiError> {
    let request = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(ApiError::invalid_json("request body must be a JSON object")),
        Err(e) => {
            debug!("Rejected unparsable request body: {}", e);
            return Err(ApiError::invalid_json(format!("request body is not valid JSON: {}", e)));
        }
    };

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .chain(extra_keys)
        .copied()
        .filter(|key| !request.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        debug!("Rejected request missing keys: {:?}", missing);
        return Err(ApiError::missing_keys(&missing));
    }

    let token = request
        .get("access_token")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::missing_field("access_token must be a string"))?;

    if !state.validator.validate(token) {
        return Err(ApiError::unauthorized("access token validation failed"));
    }

    Ok(request)
}

/// Wrap an already-encoded JSON body.
pub fn json_response(body: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}
