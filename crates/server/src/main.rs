//! Realty chat agent entry point

use std::net::SocketAddr;
use std::sync::Arc;

use realty_agent::ChatEngine;
use realty_config::{load_settings, CodeTables, Settings};
use realty_gateway::{spawn_catalog_refresher, CatalogCache, EstatyClient, ListingGateway};
use realty_llm::{LlmBackend, OpenAiBackend};
use realty_server::{create_router, AppState};
use realty_tools::{HttpSearch, NoSearch, WebSearch};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("REALTY_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized.
            eprintln!("Warning: failed to load config: {e}. Using defaults.");
            Settings::default()
        }
    };

    init_tracing();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        env = env.as_deref().unwrap_or("default"),
        "Starting realty chat agent"
    );

    let tables = match CodeTables::load(&settings.tables_path, settings.search.fuzzy_threshold) {
        Ok(tables) => Arc::new(tables),
        Err(e) => {
            tracing::warn!(
                path = %settings.tables_path,
                error = %e,
                "Code tables unavailable, names will pass through verbatim"
            );
            Arc::new(CodeTables::empty(settings.search.fuzzy_threshold))
        }
    };

    let llm = Arc::new(OpenAiBackend::new(settings.llm.clone())?);
    tracing::info!(model = llm.model_name(), "LLM backend ready");

    let gateway: Arc<dyn ListingGateway> = Arc::new(EstatyClient::new(settings.gateway.clone())?);

    let web_search: Arc<dyn WebSearch> = match &settings.tools.search_url {
        Some(url) => Arc::new(HttpSearch::new(url.clone(), &settings.tools)?),
        None => {
            tracing::info!("Web search disabled, advisor answers from the model alone");
            Arc::new(NoSearch)
        }
    };

    let catalog = CatalogCache::new();
    spawn_catalog_refresher(gateway.clone(), catalog.clone(), settings.catalog.clone());

    let engine = ChatEngine::new(
        llm,
        web_search,
        gateway,
        tables,
        catalog.clone(),
        settings.search.clone(),
        settings.session.ttl(),
    );

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    let state = AppState::new(Arc::new(engine), catalog, settings);
    let app = create_router(state);

    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "realty=info,tower_http=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
