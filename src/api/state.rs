use std::sync::Arc;

use tokio_rusqlite::Connection;

use crate::core::AppConfig;
use crate::openai::LlmGateway;
use crate::rag::embed::Embedder;

pub struct AppState {
    pub db: Connection,
    pub config: AppConfig,
    pub gateway: LlmGateway,
    pub embedder: Arc<Embedder>,
}

impl AppState {
    pub fn new(
        db: Connection,
        config: AppConfig,
        gateway: LlmGateway,
        embedder: Arc<Embedder>,
    ) -> Self {
        Self {
            db,
            config,
            gateway,
            embedder,
        }
    }
}
