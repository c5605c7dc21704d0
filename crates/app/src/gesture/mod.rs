//! Hand-gesture recognition loop: camera lifecycle, capture/inference ticks,
//! and prediction smoothing.
//!
//! The module is split into focused submodules:
//! - `config`: CLI configuration parsing.
//! - `lifecycle`: Camera state machine gating the loop.
//! - `pipeline`: Fixed-cadence capture → encode → classify loop.
//! - `smoother`: Majority-vote label smoothing.
//! - `client`: HTTP client for the external inference endpoint.
//! - `encoding`: PNG payload generation.
//! - `display`: Display-sink boundary and status board.
//! - `server`: Actix status/metrics endpoints.
//! - `telemetry`: Tracing and Prometheus metrics setup.

pub use client::{Confidence, HttpInference, InferenceError, InferenceService, PredictResponse};
pub use config::GestureConfig;
pub use data::RawPrediction;
pub use display::{DisplaySink, Layout, StatusBoard, StatusSnapshot};
pub use lifecycle::{CameraController, CameraState};
pub use pipeline::{GesturePipeline, ShutdownHandle};
pub use smoother::PredictionSmoother;

mod client;
mod config;
mod data;
mod display;
mod encoding;
mod lifecycle;
mod pipeline;
mod server;
mod smoother;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

/// Run the gesture front-end to completion on a current-thread runtime.
///
/// The loop body is cooperative: tick round-trips suspend at frame encoding
/// and at the network await, so a single scheduler thread carries the whole
/// pipeline.
pub fn run(config: GestureConfig) -> anyhow::Result<()> {
    telemetry::init_tracing(config.verbose);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;
    runtime.block_on(run_loop(config))
}

async fn run_loop(config: GestureConfig) -> anyhow::Result<()> {
    let _ = telemetry::init_metrics_recorder();

    let board = Arc::new(StatusBoard::new());
    let status_server = server::spawn_status_server(board.clone(), config.status_port)?;

    let mut controller = CameraController::new(board.clone());
    let (width, height) = (config.width, config.height);
    if !controller.request_access(|| frame_ingest::SyntheticSource::open(width, height)) {
        status_server.stop();
        return Ok(());
    }

    if !config.auto_activate {
        wait_for_activation().await?;
    }
    controller.activate();

    let service: Arc<dyn InferenceService> = Arc::new(HttpInference::new(&config.endpoint)?);
    let pipeline = GesturePipeline::new(controller, service, board.clone(), &config);
    let shutdown = pipeline.shutdown_handle();

    tokio::select! {
        result = pipeline.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
            shutdown.stop();
        }
    }

    status_server.stop();
    Ok(())
}

/// Block until the user confirms activation on stdin.
async fn wait_for_activation() -> anyhow::Result<()> {
    use tokio::io::AsyncBufReadExt;

    let mut line = String::new();
    let mut reader = tokio::io::BufReader::new(tokio::io::stdin());
    reader
        .read_line(&mut line)
        .await
        .context("failed to read activation input")?;
    Ok(())
}
