use async_trait::async_trait;
use futures::stream::BoxStream;
use mongodb::bson::Document;
use thiserror::Error;

/// Errors raised by a document store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid store configuration: {0}")]
    Config(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Driver(#[from] mongodb::error::Error),
}

/// Documents produced by a store cursor, in cursor order.
pub type DocumentStream = BoxStream<'static, Result<Document, StoreError>>;

/// How a find call orders and bounds its results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Walk the collection in reverse natural (insertion) order.
    pub newest_first: bool,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn newest(limit: u64) -> Self {
        Self {
            newest_first: true,
            limit: Some(limit),
        }
    }
}

/// Collection-scoped primitives the gateway needs from a document database.
///
/// Implementations own connection pooling; the gateway only holds a shared handle.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> Result<DocumentStream, StoreError>;

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> Result<DocumentStream, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
