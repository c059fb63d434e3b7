// handlers/mod.rs - channel endpoints plus service routes
//
// Channel handlers share one flow: preflight (body, required keys, token),
// descriptor, datalake call, raw JSON response. Failures become ApiError bodies.
pub mod aggregate;
pub mod fetch;
pub mod latest;
pub mod preflight;
pub mod system;

pub use aggregate::aggregate_post;
pub use fetch::fetch_post;
pub use latest::latest_post;
pub use system::{health, root};
