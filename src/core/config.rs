use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: String,
    pub llm_api_hostname: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub retrieval_k: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        let db_path = env::var("PARLEY_DB_PATH").unwrap_or("./parley.db".to_string());
        let llm_api_hostname = env::var("PARLEY_LLM_HOST")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let llm_api_key =
            env::var("OPENAI_API_KEY").unwrap_or_else(|_| "thiswontworkforopenai".to_string());
        let llm_model =
            env::var("PARLEY_LLM_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
        let chunk_size = env::var("PARLEY_CHUNK_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);
        let chunk_overlap = env::var("PARLEY_CHUNK_OVERLAP")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(200);
        let (chunk_size, chunk_overlap) = clamp_chunking(chunk_size, chunk_overlap);
        let retrieval_k = env::var("PARLEY_RETRIEVAL_K")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4);

        Self {
            db_path,
            llm_api_hostname,
            llm_api_key,
            llm_model,
            chunk_size,
            chunk_overlap,
            retrieval_k,
        }
    }
}

/// The chunker requires `overlap < chunk_size`. Env values that break that
/// invariant are clamped here, at startup, so a misconfigured deployment
/// cannot panic inside a request handler.
fn clamp_chunking(chunk_size: usize, chunk_overlap: usize) -> (usize, usize) {
    let chunk_size = chunk_size.max(1);
    let chunk_overlap = chunk_overlap.min(chunk_size - 1);
    (chunk_size, chunk_overlap)
}
