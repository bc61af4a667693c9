use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use docvision::{AppState, config::Config, gemini::GeminiClient, router::create_router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // configuration
    let config = Config::from_env().expect("GEMINI_API_KEY environment variable is required");

    // Gemini client shared by every service
    let client = GeminiClient::new(&config.gemini_base_url, &config.gemini_api_key)
        .expect("Failed to create Gemini client");

    // listen address
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid SERVER_HOST, falling back to 127.0.0.1");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }),
        config.server_port,
    );

    tracing::info!("Table model: {}", config.table_model);
    tracing::info!("TTS model: {}", config.tts_model);
    tracing::info!(
        "Daily PDF limit: {}, max pages: {}",
        config.pdf_daily_limit,
        config.max_pdf_pages
    );
    if config.admin_token.is_none() {
        tracing::info!("ADMIN_TOKEN not set, admin routes disabled");
    }

    // services, directories and the usage counter
    let state = AppState::new(config, Arc::new(client))
        .await
        .expect("Failed to initialise services");
    let app = create_router(state);

    // start the server
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .await
    .expect("Failed to start server");
}
