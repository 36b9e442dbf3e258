mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use lingua_api::auth::{AppState, AppStateInner};
use lingua_api::session::SessionFlow;
use lingua_gateway::{GoogleSpeechRecognizer, GoogleTranslator};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "lingua=debug,lingua_api=debug,lingua_gateway=debug,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = lingua_db::Database::open(&config.db_path)?;

    // Upstream gateways
    let client = lingua_gateway::build_client(config.upstream_timeout)?;
    let translator = GoogleTranslator::new(client.clone(), &config.translate_url);
    let recognizer =
        GoogleSpeechRecognizer::new(client, &config.speech_url, config.speech_api_key.clone());
    info!(
        "Upstreams: translate={} speech={} (timeout {:?})",
        config.translate_url, config.speech_url, config.upstream_timeout
    );

    let flow = SessionFlow::new(db, Arc::new(translator), Arc::new(recognizer));
    let state: AppState = Arc::new(AppStateInner {
        flow,
        jwt_secret: config.jwt_secret.clone(),
    });

    let app = lingua_api::router::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Lingua server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
