//! Medical Assistant Server Entry Point

use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use medibot_config::{load_settings, Settings};
use medibot_llm::LlmFactory;
use medibot_server::{create_router, init_metrics, AppState};
use medibot_tools::{create_places, create_resolver};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("MEDIBOT_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!(
                "Loaded configuration from files (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        }
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&config);

    tracing::info!("Starting medibot server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        llm = ?config.llm,
        places = ?config.places,
        "Configuration loaded"
    );

    let metrics_handle = if config.observability.metrics_enabled {
        let handle = init_metrics();
        if handle.is_some() {
            tracing::info!("Initialized Prometheus metrics at /metrics");
        }
        handle
    } else {
        None
    };

    // An unreadable reference dataset is a startup error
    let resolver = create_resolver(&config.resolver).map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize specialist resolver");
        e
    })?;
    let llm = LlmFactory::create(&config.llm).map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize language model");
        e
    })?;
    let places = create_places(&config.places);

    let state = AppState::new(config.clone(), llm, resolver, places).with_metrics(metrics_handle);
    let cleanup_shutdown = state.sessions().start_cleanup_task();

    tracing::info!(
        resolver = state.engine.resolver_policy(),
        model = %state.engine.llm().model_name(),
        places = %config.places.endpoint,
        max_sessions = config.dialogue.max_sessions,
        "Initialized application state"
    );

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on SIGTERM/SIGINT
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = cleanup_shutdown.send(true);
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("medibot={level},medibot_server={level},medibot_agent={level},medibot_llm={level},medibot_tools={level},medibot_text_processing={level},medibot_config={level},tower_http=debug").into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
