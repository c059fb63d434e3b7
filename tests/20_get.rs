mod common;

use anyhow::Result;
use reqwest::{header::CONTENT_TYPE, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn get_returns_documents_as_array() -> Result<()> {
    let server = common::spawn_server(common::sequence(2)).await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/get"))
        .json(&json!({
            "channel": "/Traffic/Bus",
            "access_token": common::TOKEN,
            "query": { "route": "42" },
            "past_hours": 1
        }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK, "unexpected status: {}", res.status());
    assert_eq!(res.headers()[CONTENT_TYPE], "application/json");

    let body = res.json::<Value>().await?;
    let docs = body.as_array().cloned().unwrap_or_default();
    assert_eq!(docs.len(), 2);
    assert!(docs[0]["_id"]["$oid"].is_string(), "id not extended JSON: {}", docs[0]);

    let calls = server.store.calls();
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].is_aggregate());
    assert_eq!(calls[0].collection(), "traffic/bus");
    Ok(())
}

#[tokio::test]
async fn get_on_empty_collection_is_empty_array() -> Result<()> {
    let server = common::spawn_server(vec![]).await?;

    let res = reqwest::Client::new()
        .post(server.url("/get"))
        .json(&json!({ "channel": "/Bus", "access_token": common::TOKEN }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await?, "[]");
    Ok(())
}

#[tokio::test]
async fn missing_access_token_never_reaches_store() -> Result<()> {
    let server = common::spawn_server(common::sequence(1)).await?;

    let res = reqwest::Client::new()
        .post(server.url("/get"))
        .json(&json!({ "channel": "/Bus" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    let message = body["error"].as_str().unwrap_or_default();
    assert!(message.contains("access_token"), "unexpected error: {}", body);
    assert!(server.store.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn rejected_token_never_reaches_store() -> Result<()> {
    let server = common::spawn_server(common::sequence(1)).await?;

    let res = reqwest::Client::new()
        .post(server.url("/get"))
        .json(&json!({ "channel": "/Bus", "access_token": "forged" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert!(body["error"].is_string());
    assert!(server.store.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn non_string_token_is_rejected_before_validation() -> Result<()> {
    let server = common::spawn_server(vec![]).await?;

    let res = reqwest::Client::new()
        .post(server.url("/get"))
        .json(&json!({ "channel": "/Bus", "access_token": 12345 }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(server.store.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn invalid_json_body_is_client_error() -> Result<()> {
    let server = common::spawn_server(vec![]).await?;

    let res = reqwest::Client::new()
        .post(server.url("/get"))
        .header(CONTENT_TYPE, "application/json")
        .body("{\"channel\": ")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert!(body["error"].is_string());
    assert!(server.store.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn mistyped_query_and_window_are_client_errors() -> Result<()> {
    let server = common::spawn_server(vec![]).await?;
    let client = reqwest::Client::new();

    for body in [
        json!({ "channel": "/Bus", "access_token": common::TOKEN, "query": "route=42" }),
        json!({ "channel": "/Bus", "access_token": common::TOKEN, "past_hours": "one" }),
        json!({ "channel": 42, "access_token": common::TOKEN }),
        json!({ "channel": "/", "access_token": common::TOKEN }),
        json!({ "channel": "/Bus", "access_token": common::TOKEN, "query": { "at": { "$date": "junk" } } }),
    ] {
        let res = client.post(server.url("/get")).json(&body).send().await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }

    assert!(server.store.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn store_failure_is_server_error() -> Result<()> {
    let server = common::spawn_failing_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/get"))
        .json(&json!({ "channel": "/Bus", "access_token": common::TOKEN }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json::<Value>().await?;
    assert!(body["error"].is_string());
    Ok(())
}
