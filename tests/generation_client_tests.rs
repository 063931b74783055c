// Integration tests for the generation client
//
// Each test serves a canned chat-completions response from a local axum
// server and points the client at it.

use anyhow::Result;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use mock_interview::generation::GenerationClientConfig;
use mock_interview::{GenerationClient, GenerationError, GenerationService, Topic};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
struct Stub {
    status: StatusCode,
    content: Option<String>,
    requests: Arc<Mutex<Vec<Value>>>,
}

async fn completions(State(stub): State<Stub>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    stub.requests.lock().unwrap().push(body);
    let reply = json!({
        "choices": [{ "message": { "role": "assistant", "content": stub.content } }]
    });
    (stub.status, Json(reply))
}

/// Start a stub server and return its base URL plus the recorded requests
async fn serve(status: StatusCode, content: Option<&str>) -> Result<(String, Arc<Mutex<Vec<Value>>>)> {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let stub = Stub {
        status,
        content: content.map(str::to_string),
        requests: Arc::clone(&requests),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok((format!("http://{addr}"), requests))
}

fn client(endpoint: &str) -> Result<GenerationClient> {
    Ok(GenerationClient::new(GenerationClientConfig {
        endpoint: endpoint.to_string(),
        model: "test-model".to_string(),
        api_key: Some("sk-test".to_string()),
        timeout: Duration::from_secs(5),
        language: "English".to_string(),
    })?)
}

#[tokio::test]
async fn test_generate_question() -> Result<()> {
    let (url, requests) = serve(StatusCode::OK, Some("  Explain the Java memory model.  ")).await?;

    let question = client(&url)?.generate_question(Topic::JavaCore).await?;
    assert_eq!(question, "Explain the Java memory model.");

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["model"], "test-model");
    assert_eq!(requests[0]["messages"][0]["role"], "system");
    let prompt = requests[0]["messages"][1]["content"].as_str().unwrap_or_default();
    assert!(prompt.contains(Topic::JavaCore.label()));
    assert!(requests[0].get("response_format").is_none());

    Ok(())
}

#[tokio::test]
async fn test_evaluate_answer_parses_fenced_json() -> Result<()> {
    let content = "```json\n{\"score\": \"85\", \"analysis\": \"Good coverage\", \"missingPoints\": [\"happens-before\"], \"idealAnswer\": \"Discuss visibility\"}\n```";
    let (url, requests) = serve(StatusCode::OK, Some(content)).await?;

    let evaluation = client(&url)?
        .evaluate_answer(Topic::JavaCore, "What does volatile do?", "It prevents caching")
        .await?;
    assert_eq!(evaluation.score, 85);
    assert_eq!(evaluation.analysis, "Good coverage");
    assert_eq!(evaluation.missing_points, vec!["happens-before".to_string()]);
    assert_eq!(evaluation.ideal_answer, "Discuss visibility");

    let requests = requests.lock().unwrap();
    assert_eq!(requests[0]["response_format"]["type"], "json_object");

    Ok(())
}

#[tokio::test]
async fn test_explain_concept() -> Result<()> {
    let (url, requests) = serve(StatusCode::OK, Some("Happens-before orders memory effects.")).await?;

    let explanation = client(&url)?
        .explain_concept(Topic::JavaCore, "What does volatile do?", "What is happens-before?")
        .await?;
    assert_eq!(explanation, "Happens-before orders memory effects.");

    let requests = requests.lock().unwrap();
    let prompt = requests[0]["messages"][1]["content"].as_str().unwrap_or_default();
    assert!(prompt.contains("What is happens-before?"));

    Ok(())
}

#[tokio::test]
async fn test_error_status_is_reported() -> Result<()> {
    let (url, _) = serve(StatusCode::INTERNAL_SERVER_ERROR, Some("boom")).await?;

    let err = client(&url)?.generate_question(Topic::Redis).await.unwrap_err();
    assert!(matches!(err, GenerationError::Api { status: 500, .. }));

    Ok(())
}

#[tokio::test]
async fn test_empty_content_is_an_error() -> Result<()> {
    let (url, _) = serve(StatusCode::OK, None).await?;
    let err = client(&url)?.generate_question(Topic::Redis).await.unwrap_err();
    assert!(matches!(err, GenerationError::EmptyResponse));

    let (url, _) = serve(StatusCode::OK, Some("   ")).await?;
    let err = client(&url)?.explain_concept(Topic::Redis, "Q", "why?").await.unwrap_err();
    assert!(matches!(err, GenerationError::EmptyResponse));

    Ok(())
}

#[tokio::test]
async fn test_unparseable_evaluation_is_malformed() -> Result<()> {
    let (url, _) = serve(StatusCode::OK, Some("Pretty good answer overall.")).await?;

    let err = client(&url)?
        .evaluate_answer(Topic::Kafka, "Q", "A")
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Malformed(_)));

    Ok(())
}

#[tokio::test]
async fn test_missing_endpoint_is_not_configured() -> Result<()> {
    let err = client("")?.generate_question(Topic::Mongo).await.unwrap_err();
    assert!(matches!(err, GenerationError::NotConfigured));

    Ok(())
}
