//! Server entry point: wire config, LLM backend, tools, and the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use travel_agent_config::{load_settings, Settings};
use travel_agent_llm::{LlmBackend, LlmConfig, OpenAIBackend};
use travel_agent_server::{create_router, AppState, SessionManager};
use travel_agent_tools::{CurrencyTool, ToolRegistry, WeatherTool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("TRAVEL_AGENT_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing is not up yet
            eprintln!("Warning: failed to load config: {e}. Using defaults.");
            Settings::default()
        }
    };

    init_tracing(&settings);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?settings.environment,
        "starting travel agent server"
    );

    let llm = Arc::new(OpenAIBackend::new(LlmConfig::from(&settings.llm))?);
    tracing::info!(model = llm.model_name(), endpoint = %settings.llm.endpoint, "LLM backend configured");

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WeatherTool::new(&settings.tools)?));
    registry.register(Arc::new(CurrencyTool::new(&settings.tools)?));
    tracing::info!(tools = registry.len(), "tool registry ready");

    let sessions = Arc::new(SessionManager::new(
        &settings.session,
        llm,
        Arc::new(registry),
    ));
    let cleanup_shutdown = sessions.start_cleanup_task();

    let app = create_router(AppState { sessions }, &settings.server);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = cleanup_shutdown.send(true);
    tracing::info!("server shutdown complete");
    Ok(())
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "travel_agent={},tower_http=info",
            settings.observability.log_level
        )
        .into()
    });

    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
