use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Missing or mistyped field: {0}")]
    MissingField(String),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Invalid collection name: {0}")]
    BadCollection(String),

    #[error("Invalid aggregation pipeline: {0}")]
    BadPipeline(String),

    #[error("Invalid query filter: {0}")]
    InvalidFilter(String),
}

impl FilterError {
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FilterError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
