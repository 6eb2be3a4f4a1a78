//! Test utilities for integration tests
use std::env;
use std::fs;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use axum::Router;
use tokio_rusqlite::Connection;

use parley::api::AppState;
use parley::api::app;
use parley::core::AppConfig;
use parley::core::db::async_db;
use parley::core::db::initialize_db;
use parley::openai::LlmGateway;
use parley::rag::embed::Embedder;

pub fn test_config(llm_api_hostname: &str, db_path: &str) -> AppConfig {
    AppConfig {
        db_path: db_path.to_string(),
        llm_api_hostname: llm_api_hostname.to_string(),
        llm_api_key: String::from("test-api-key"),
        llm_model: String::from("gpt-4.1-mini"),
        chunk_size: 1000,
        chunk_overlap: 200,
        retrieval_k: 4,
    }
}

/// Creates a test application router on a fresh database, pointed at the
/// given LLM endpoint (normally a mockito server). Uses the stub embedder
/// so tests never download a model.
///
/// Also returns the database handle so tests can inspect or sabotage
/// state directly.
pub async fn test_app_with_db(llm_api_hostname: &str) -> (Router, Connection) {
    // Create a unique directory for the test with a randomly
    // generated name using a timestamp to avoid collisions
    let temp_dir = env::temp_dir();
    let ts = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
        .to_string();
    let dir = temp_dir.join(ts);
    fs::create_dir_all(&dir).expect("Failed to create base directory");

    let db_path = dir.join("test.db");
    let db_path = db_path.to_str().expect("Temp path is not valid utf-8");

    let db = async_db(db_path)
        .await
        .expect("Failed to connect to async db");
    db.call(|conn| Ok(initialize_db(conn)?))
        .await
        .expect("Failed to initialize db");

    let config = test_config(llm_api_hostname, db_path);
    let gateway = LlmGateway::new(&config).expect("Failed to configure gateway");
    let app_state = AppState::new(db.clone(), config, gateway, Arc::new(Embedder::Stub));
    let router = app(Arc::new(RwLock::new(app_state)));

    (router, db)
}

pub async fn test_app(llm_api_hostname: &str) -> Router {
    test_app_with_db(llm_api_hostname).await.0
}

pub async fn body_to_string(body: axum::body::Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read response body");
    String::from_utf8(bytes.to_vec()).expect("Response body is not valid utf-8")
}
