#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Ollama client against a mock HTTP server
// The client is blocking, so every call runs on the blocking pool

use hoopscout::commands::bio_search;
use hoopscout::config::{Config, OllamaConfig};
use hoopscout::embeddings::{OllamaClient, TextEmbedder};
use hoopscout::summarize::{SummaryBounds, Summarizer, compare_summaries};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_MODEL: &str = "all-minilm:latest";

fn config_for(server: &MockServer, batch_size: u32) -> Config {
    let address = server.address();
    Config {
        ollama: OllamaConfig {
            protocol: "http".to_string(),
            host: address.ip().to_string(),
            port: address.port(),
            model: TEST_MODEL.to_string(),
            batch_size,
            embedding_dimension: 384,
        },
        ..Config::default()
    }
}

fn client_for(server: &MockServer, batch_size: u32) -> OllamaClient {
    OllamaClient::new(&config_for(server, batch_size))
        .expect("Failed to create Ollama client")
        .with_timeout(Duration::from_secs(5))
        .with_retry_attempts(1)
}

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok(); // Ignore error if already initialized
}

async fn mock_tags(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {"name": TEST_MODEL, "size": 45_000_000, "digest": "abc123"},
                {"name": "llama3.2:1b", "size": 1_300_000_000, "digest": "def456"}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn health_check_and_model_listing() {
    init_test_tracing();
    let server = MockServer::start().await;
    mock_tags(&server).await;

    let client = client_for(&server, 64);
    let models = tokio::task::spawn_blocking(move || {
        client.health_check()?;
        client.list_models()
    })
    .await
    .expect("blocking task completes")
    .expect("models are listed");

    let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec![TEST_MODEL, "llama3.2:1b"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_model_fails_health_check() {
    init_test_tracing();
    let server = MockServer::start().await;
    mock_tags(&server).await;

    let client = client_for(&server, 64).with_model("nomic-embed-text:latest");
    let result = tokio::task::spawn_blocking(move || client.health_check())
        .await
        .expect("blocking task completes");

    let message = format!("{:#}", result.expect_err("model is not served"));
    assert!(message.contains("nomic-embed-text:latest"));
}

#[tokio::test(flavor = "multi_thread")]
async fn embeddings_are_batched() {
    init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({"model": TEST_MODEL, "input": ["Curry", "Green"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": TEST_MODEL,
            "embeddings": [[1.0, 0.0], [0.0, 1.0]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({"model": TEST_MODEL, "input": ["Looney"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": TEST_MODEL,
            "embeddings": [[0.5, 0.5]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 2);
    let texts = vec![
        "Curry".to_string(),
        "Green".to_string(),
        "Looney".to_string(),
    ];
    let vectors = tokio::task::spawn_blocking(move || client.embed_batch(&texts))
        .await
        .expect("blocking task completes")
        .expect("embeddings are generated");

    assert_eq!(
        vectors,
        vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn short_embedding_response_is_an_error() {
    init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 0.0]]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, 64);
    let texts = vec!["one".to_string(), "two".to_string()];
    let result = tokio::task::spawn_blocking(move || client.embed_batch(&texts))
        .await
        .expect("blocking task completes");

    assert!(result.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn client_errors_are_not_retried() {
    init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 64).with_retry_attempts(3);
    let result = tokio::task::spawn_blocking(move || client.embed("tall scorer"))
        .await
        .expect("blocking task completes");

    let message = format!("{:#}", result.expect_err("404 fails the request"));
    assert!(message.contains("404"));
}

#[tokio::test(flavor = "multi_thread")]
async fn summaries_through_generate() {
    init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"model": "llama3.2:1b", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2:1b",
            "response": "  Curry scored forty points.  ",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 64).with_model("llama3.2:1b");
    let comparisons = tokio::task::spawn_blocking(move || {
        let summarizers: [&dyn Summarizer; 1] = [&client];
        compare_summaries(
            "Curry scored forty points against Boston on Tuesday night.",
            &summarizers,
            SummaryBounds::default(),
        )
    })
    .await
    .expect("blocking task completes")
    .expect("summary is generated");

    assert_eq!(comparisons.len(), 1);
    assert_eq!(comparisons[0].model, "llama3.2:1b");
    let scored = comparisons[0].scored().expect("model produced a summary");
    assert_eq!(scored.summary, "Curry scored forty points.");
    assert_eq!(scored.word_count, 4);
    // 4 shared tokens, 9 reference tokens
    assert!((scored.rouge_l - 8.0 / 13.0).abs() < 1e-9);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_summary_model_is_reported_alongside_the_others() {
    init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"model": "llama3.2:1b"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2:1b",
            "response": "Curry scored forty points.",
            "done": true
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"model": "phi3:mini"})))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let missing = client_for(&server, 64).with_model("phi3:mini");
    let present = client_for(&server, 64).with_model("llama3.2:1b");
    let comparisons = tokio::task::spawn_blocking(move || {
        let summarizers: [&dyn Summarizer; 2] = [&missing, &present];
        compare_summaries(
            "Curry scored forty points against Boston on Tuesday night.",
            &summarizers,
            SummaryBounds::default(),
        )
    })
    .await
    .expect("blocking task completes")
    .expect("comparison runs");

    assert_eq!(comparisons.len(), 2);
    assert_eq!(comparisons[0].model, "phi3:mini");
    let error = comparisons[0].outcome.as_ref().expect_err("model is missing");
    assert!(error.contains("404"));
    assert_eq!(
        comparisons[1].scored().map(|s| s.summary.as_str()),
        Some("Curry scored forty points.")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn bio_search_stops_when_the_model_is_missing() {
    init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "llama3.2:1b"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embeddings": []})))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let players = dir.path().join("players.csv");
    std::fs::write(
        &players,
        "PLAYER_NAME,TEAM_ABBREVIATION,AGE\nStephen Curry,GSW,36\n",
    )
    .expect("Failed to write player file");

    let mut config = config_for(&server, 64);
    config.catalog.path = Some(players);

    let result = tokio::task::spawn_blocking(move || bio_search(&config, "shooter", 3))
        .await
        .expect("blocking task completes");

    let message = format!("{:#}", result.expect_err("health check fails"));
    assert!(message.contains(TEST_MODEL));
}
