use std::sync::Mutex;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use mongodb::bson::Document;

use crate::auth::TokenValidator;
use crate::database::{DocumentStore, DocumentStream, FindOptions, StoreError};

/// A store call as the accessor issued it
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Find {
        collection: String,
        filter: Document,
        options: FindOptions,
    },
    Aggregate {
        collection: String,
        pipeline: Vec<Document>,
    },
}

impl StoreCall {
    pub fn collection(&self) -> &str {
        match self {
            StoreCall::Find { collection, .. } | StoreCall::Aggregate { collection, .. } => collection,
        }
    }

    pub fn find_options(&self) -> Option<FindOptions> {
        match self {
            StoreCall::Find { options, .. } => Some(*options),
            StoreCall::Aggregate { .. } => None,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, StoreCall::Aggregate { .. })
    }
}

/// In-memory store that records every call.
///
/// Documents are kept in insertion order. Filters and pipelines are recorded but not
/// evaluated: find honours only ordering and limit, aggregate returns everything.
pub struct RecordingStore {
    documents: Vec<Document>,
    failure: Option<String>,
    calls: Mutex<Vec<StoreCall>>,
}

impl RecordingStore {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(vec![])
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: StoreCall) -> Result<(), StoreError> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
        match &self.failure {
            Some(message) => Err(StoreError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> Result<DocumentStream, StoreError> {
        self.record(StoreCall::Find {
            collection: collection.to_string(),
            filter,
            options,
        })?;

        let mut documents = self.documents.clone();
        if options.newest_first {
            documents.reverse();
        }
        if let Some(limit) = options.limit {
            documents.truncate(limit as usize);
        }
        Ok(stream::iter(documents.into_iter().map(Ok)).boxed())
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> Result<DocumentStream, StoreError> {
        self.record(StoreCall::Aggregate {
            collection: collection.to_string(),
            pipeline,
        })?;
        Ok(stream::iter(self.documents.clone().into_iter().map(Ok)).boxed())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        match &self.failure {
            Some(message) => Err(StoreError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

/// Accepts exactly one token.
pub struct StaticValidator(pub &'static str);

impl TokenValidator for StaticValidator {
    fn validate(&self, token: &str) -> bool {
        token == self.0
    }
}
