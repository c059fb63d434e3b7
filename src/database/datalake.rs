use std::sync::Arc;

use futures::TryStreamExt;
use mongodb::bson::{Bson, Document};
use serde_json::Value;
use thiserror::Error;

use super::store::{DocumentStore, DocumentStream, FindOptions, StoreError};
use crate::filter::{to_native_filter, to_native_pipeline, FilterError, QueryDescriptor};

/// Errors from the datalake accessor
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to encode documents: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Channel-level reads over a document store, answered as JSON bytes.
///
/// Documents are written as relaxed Extended JSON one at a time while the cursor is
/// drained, so native types such as decimals and binary keep their tagging.
#[derive(Clone)]
pub struct Datalake {
    store: Arc<dyn DocumentStore>,
}

impl Datalake {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// All documents matching the translated filter, as a JSON array.
    pub async fn fetch(&self, descriptor: &QueryDescriptor) -> Result<Vec<u8>, DatabaseError> {
        let collection = descriptor.collection_name()?;
        let filter = to_native_filter(descriptor)?;

        let documents = self
            .store
            .find(&collection, filter, FindOptions::default())
            .await?;
        encode_array(documents).await
    }

    /// Most recently inserted matching documents.
    ///
    /// Without `count` the newest single document is returned as an object, and an
    /// empty match is `NotFound`. With `count` the newest `count` documents are
    /// returned as an array, newest first.
    pub async fn latest(
        &self,
        descriptor: &QueryDescriptor,
        count: Option<u64>,
    ) -> Result<Vec<u8>, DatabaseError> {
        let collection = descriptor.collection_name()?;
        let filter = to_native_filter(descriptor)?;

        match count {
            Some(n) => {
                let documents = self.store.find(&collection, filter, FindOptions::newest(n)).await?;
                encode_array(documents).await
            }
            None => {
                let mut documents = self.store.find(&collection, filter, FindOptions::newest(1)).await?;
                let document = documents.try_next().await?.ok_or_else(|| {
                    DatabaseError::NotFound(format!("no matching documents in '{}'", collection))
                })?;

                let mut body = Vec::new();
                write_document(&mut body, document)?;
                Ok(body)
            }
        }
    }

    /// Run a caller-supplied pipeline against the descriptor's collection.
    pub async fn aggregate(
        &self,
        descriptor: &QueryDescriptor,
        pipeline: &Value,
    ) -> Result<Vec<u8>, DatabaseError> {
        let stages = to_native_pipeline(pipeline)?;
        let collection = descriptor.collection_name()?;

        let documents = self.store.aggregate(&collection, stages).await?;
        encode_array(documents).await
    }
}

/// Drain a cursor into a JSON array without building per-document strings.
pub async fn encode_array(mut documents: DocumentStream) -> Result<Vec<u8>, DatabaseError> {
    let mut body = vec![b'['];
    let mut first = true;

    while let Some(document) = documents.try_next().await? {
        if !first {
            body.push(b',');
        }
        first = false;
        write_document(&mut body, document)?;
    }

    body.push(b']');
    Ok(body)
}

fn write_document(out: &mut Vec<u8>, document: Document) -> Result<(), serde_json::Error> {
    serde_json::to_writer(out, &Bson::Document(document).into_relaxed_extjson())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::TimeWindow;
    use crate::testing::{RecordingStore, StoreCall};
    use mongodb::bson::{doc, oid::ObjectId};
    use serde_json::json;

    fn sequence(n: i32) -> Vec<Document> {
        (1..=n).map(|seq| doc! { "_id": ObjectId::new(), "seq": seq }).collect()
    }

    fn datalake(store: &Arc<RecordingStore>) -> Datalake {
        Datalake::new(store.clone())
    }

    fn parse(body: &[u8]) -> Value {
        serde_json::from_slice(body).expect("body is JSON")
    }

    #[tokio::test]
    async fn fetch_on_empty_set_is_empty_array() {
        let store = Arc::new(RecordingStore::new(vec![]));
        let body = datalake(&store)
            .fetch(&QueryDescriptor::new("/Bus").unwrap())
            .await
            .unwrap();
        assert_eq!(body, b"[]");
    }

    #[tokio::test]
    async fn fetch_passes_translated_filter_to_normalized_collection() {
        let store = Arc::new(RecordingStore::new(sequence(2)));
        let query = json!({ "route": "42" }).as_object().cloned().unwrap();
        let descriptor = QueryDescriptor::new("/Traffic/Bus")
            .unwrap()
            .with_filter(query)
            .with_window(TimeWindow::hours(1));

        let body = datalake(&store).fetch(&descriptor).await.unwrap();
        let items = parse(&body);
        assert_eq!(items.as_array().map(Vec::len), Some(2));
        assert!(items[0]["_id"]["$oid"].is_string());
        assert_eq!(items[1]["seq"], json!(2));

        match store.calls().as_slice() {
            [StoreCall::Find { collection, filter, options }] => {
                assert_eq!(collection, "traffic/bus");
                assert_eq!(filter.get_str("route").ok(), Some("42"));
                assert!(filter.get_document("_id").is_ok());
                assert_eq!(*options, FindOptions::default());
            }
            other => panic!("unexpected calls: {:?}", other),
        }
    }

    #[tokio::test]
    async fn latest_without_count_on_empty_set_is_not_found() {
        let store = Arc::new(RecordingStore::new(vec![]));
        let err = datalake(&store)
            .latest(&QueryDescriptor::new("/Bus").unwrap(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn latest_without_count_returns_newest_object() {
        let store = Arc::new(RecordingStore::new(sequence(5)));
        let body = datalake(&store)
            .latest(&QueryDescriptor::new("/Bus").unwrap(), None)
            .await
            .unwrap();
        let latest = parse(&body);
        assert!(latest.is_object());
        assert_eq!(latest["seq"], json!(5));
    }

    #[tokio::test]
    async fn latest_with_count_returns_newest_first() {
        let store = Arc::new(RecordingStore::new(sequence(5)));
        let body = datalake(&store)
            .latest(&QueryDescriptor::new("/Bus").unwrap(), Some(3))
            .await
            .unwrap();
        let seqs: Vec<Value> = parse(&body)
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["seq"].clone())
            .collect();
        assert_eq!(seqs, vec![json!(5), json!(4), json!(3)]);
    }

    #[tokio::test]
    async fn malformed_pipeline_never_reaches_store() {
        let store = Arc::new(RecordingStore::new(sequence(1)));
        let err = datalake(&store)
            .aggregate(&QueryDescriptor::new("/Bus").unwrap(), &json!("$match"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Filter(FilterError::BadPipeline(_))));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn aggregate_runs_stages_on_collection() {
        let store = Arc::new(RecordingStore::new(sequence(2)));
        let pipeline = json!([{ "$match": { "seq": { "$gt": 0 } } }, { "$limit": 10 }]);
        let body = datalake(&store)
            .aggregate(&QueryDescriptor::new("/Bus").unwrap(), &pipeline)
            .await
            .unwrap();
        assert_eq!(parse(&body).as_array().map(Vec::len), Some(2));

        match store.calls().as_slice() {
            [StoreCall::Aggregate { collection, pipeline }] => {
                assert_eq!(collection, "bus");
                assert_eq!(pipeline.len(), 2);
            }
            other => panic!("unexpected calls: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unresolvable_channel_is_bad_collection() {
        let store = Arc::new(RecordingStore::new(vec![]));
        let err = datalake(&store)
            .fetch(&QueryDescriptor::new("/").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Filter(FilterError::BadCollection(_))));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_store_error() {
        let store = Arc::new(RecordingStore::failing("connection reset"));
        let err = datalake(&store)
            .fetch(&QueryDescriptor::new("/Bus").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Store(_)));
    }
}
