use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use chat_backend::{BackendConfig, ChatClient};
use openai_reply::OpenAiReplyEngine;
use orchestrator::{ChannelProvisioner, PipelineConfig, TriggerPipeline};

mod config;
mod identity;
mod routes;

use config::ServerConfig;
use identity::TokenRegistry;
use routes::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env();
    let tokens = TokenRegistry::from_spec(&config.tokens);

    let backend_config = BackendConfig::from_env().expect("Backend configuration missing");
    let backend = ChatClient::connect(backend_config)
        .await
        .expect("Failed to connect to messaging backend");

    let engine = OpenAiReplyEngine::from_env().expect("Reply provider configuration missing");

    let state = AppState {
        pipeline: Arc::new(TriggerPipeline::new(
            backend.clone(),
            engine,
            PipelineConfig::new(&config.bot_id),
        )),
        provisioner: Arc::new(ChannelProvisioner::new(backend, &config.bot_id)),
        tokens: Arc::new(tokens),
    };

    let app = routes::router(state);

    let addr: SocketAddr = config.addr.parse().expect("Invalid SOLACE_API_ADDR");
    info!(%addr, bot_id = %config.bot_id, "Solace gateway listening");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
