// Framework bootstrap for the stage server runtime.

use crate::domain::tuning::StageSettings;
use crate::frameworks::config;
use crate::interface_adapters::net::client::launch_stage;
use crate::interface_adapters::routes::app;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{StageRegistry, StageRegistrySettings};

use std::net::SocketAddr;
use std::time::Duration;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let stage = config::stage_settings().inspect_err(|e| {
        tracing::error!(error = %e, "failed to load stage tuning");
    })?;

    run_with_settings(listener, stage, config::tick_interval()).await
}

/// Serve on `listener` with explicit gameplay tuning and tick rate.
pub async fn run_with_settings(
    listener: tokio::net::TcpListener,
    stage: StageSettings,
    tick_interval: Duration,
) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(stage, tick_interval).await?;

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app(state)).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

async fn build_state(stage: StageSettings, tick_interval: Duration) -> Result<Arc<AppState>> {
    tracing::debug!(
        tick_interval_ms = tick_interval.as_millis(),
        initial_lives = stage.player.initial_lives,
        "stage settings loaded"
    );

    // This owns the set of active stage world tasks.
    let stage_registry = Arc::new(StageRegistry::new(StageRegistrySettings {
        input_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
        world_broadcast_capacity: config::WORLD_BROADCAST_CAPACITY,
        tick_interval,
        stage,
    }));

    // Start the default stage eagerly; it is relaunched on demand after it exits.
    launch_stage(&stage_registry, config::DEFAULT_STAGE_ID.to_string())
        .await
        .map_err(|e| std::io::Error::other(format!("failed to start default stage: {e:?}")))?;

    Ok(Arc::new(AppState {
        stage_registry,
        default_stage_id: Arc::from(config::DEFAULT_STAGE_ID),
    }))
}
