use mongodb::bson::{Bson, Document};
use serde_json::Value;

use super::descriptor::json_kind;
use super::error::FilterError;

/// Re-encode a caller-supplied aggregation pipeline as native stages.
///
/// The pipeline must be a JSON array of stage objects, each written in Extended JSON.
/// Stage contents are otherwise passed through for the store to validate.
pub fn to_native_pipeline(pipeline: &Value) -> Result<Vec<Document>, FilterError> {
    let stages = pipeline.as_array().ok_or_else(|| {
        FilterError::BadPipeline(format!("expected an array of stages, got {}", json_kind(pipeline)))
    })?;

    stages
        .iter()
        .enumerate()
        .map(|(index, stage)| to_native_stage(index, stage))
        .collect()
}

fn to_native_stage(index: usize, stage: &Value) -> Result<Document, FilterError> {
    let fields = stage.as_object().ok_or_else(|| {
        FilterError::BadPipeline(format!("stage {} must be an object, got {}", index, json_kind(stage)))
    })?;
    if fields.is_empty() {
        return Err(FilterError::BadPipeline(format!("stage {} is empty", index)));
    }

    match Bson::try_from(stage.clone()) {
        Ok(Bson::Document(document)) => Ok(document),
        Ok(other) => Err(FilterError::BadPipeline(format!(
            "stage {} decoded to a {:?} value",
            index,
            other.element_type()
        ))),
        Err(e) => Err(FilterError::BadPipeline(format!("stage {}: {}", index, e))),
    }
}
