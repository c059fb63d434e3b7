#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use mongodb::bson::{doc, oid::ObjectId, Document};

use datalake_gateway::config::AppConfig;
use datalake_gateway::server::{router, AppState};
use datalake_gateway::testing::{RecordingStore, StaticValidator};

pub const TOKEN: &str = "valid-token";

pub struct TestServer {
    pub base_url: String,
    pub store: Arc<RecordingStore>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Documents `seq: 1..=n` in insertion order.
pub fn sequence(n: i32) -> Vec<Document> {
    (1..=n)
        .map(|seq| doc! { "_id": ObjectId::new(), "seq": seq, "route": "42" })
        .collect()
}

pub async fn spawn_server(documents: Vec<Document>) -> Result<TestServer> {
    spawn(RecordingStore::new(documents)).await
}

pub async fn spawn_failing_server() -> Result<TestServer> {
    spawn(RecordingStore::failing("connection refused")).await
}

async fn spawn(store: RecordingStore) -> Result<TestServer> {
    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let store = Arc::new(store);
    let mut config = AppConfig::from_lookup(|_| None);
    config.api.enable_request_logging = false;
    let state = AppState::new(store.clone(), Arc::new(StaticValidator(TOKEN)), config);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    let app = router(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer { base_url, store })
}
