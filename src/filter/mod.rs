pub mod channel;
pub mod descriptor;
pub mod error;
pub mod native;
pub mod pipeline;
pub mod types;

pub use channel::collection_from_channel;
pub use error::FilterError;
pub use native::{to_native_filter, to_native_filter_at};
pub use pipeline::to_native_pipeline;
pub use types::*;
