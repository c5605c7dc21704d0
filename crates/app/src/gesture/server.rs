//! Actix Web status server exposing the camera state, a status event stream,
//! and Prometheus metrics.
//!
//! The server runs on a dedicated thread so the recognition loop's runtime
//! never shares a scheduler with Actix.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{
    App, HttpResponse, HttpServer,
    http::header,
    web::{self, Bytes},
};
use anyhow::{Context, Result};
use async_stream::stream;
use serde_json::to_string;
use tokio::sync::oneshot;
use tracing::error;

use crate::gesture::display::StatusBoard;
use crate::gesture::telemetry;

/// Handle for the status server thread.
#[derive(Default)]
pub(crate) struct StatusServer {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl StatusServer {
    /// Signal the server to stop and block until the thread exits.
    pub(crate) fn stop(self) {
        if let Some(tx) = self.shutdown {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle {
            let _ = handle.join();
        }
    }
}

/// Spawn the status server thread and return a handle that can stop it.
pub(crate) fn spawn_status_server(board: Arc<StatusBoard>, port: u16) -> Result<StatusServer> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let handle = std::thread::Builder::new()
        .name("gesture-status-server".into())
        .spawn(move || {
            if let Err(err) = actix_web::rt::System::new().block_on(async move {
                let server = HttpServer::new(move || {
                    App::new()
                        .app_data(web::Data::new(board.clone()))
                        .route("/status", web::get().to(status_handler))
                        .route("/events", web::get().to(events_handler))
                        .route("/metrics", web::get().to(metrics_handler))
                })
                .bind(("0.0.0.0", port))?
                .run();

                let srv_handle = server.handle();
                actix_web::rt::spawn(async move {
                    let _ = shutdown_rx.await;
                    srv_handle.stop(true).await;
                });

                server.await
            }) {
                error!("status server error: {err}");
            }
        })
        .context("Failed to spawn status server thread")?;
    Ok(StatusServer {
        shutdown: Some(shutdown_tx),
        handle: Some(handle),
    })
}

/// Return the current status snapshot as JSON.
async fn status_handler(board: web::Data<Arc<StatusBoard>>) -> HttpResponse {
    HttpResponse::Ok().json(board.snapshot())
}

/// Stream status snapshots as Server-Sent Events.
async fn events_handler(board: web::Data<Arc<StatusBoard>>) -> HttpResponse {
    let board = board.clone();
    let stream = stream! {
        yield Ok::<Bytes, actix_web::Error>(Bytes::from_static(b"retry: 500\n\n"));
        let mut interval = actix_web::rt::time::interval(Duration::from_millis(250));
        loop {
            interval.tick().await;
            match to_string(&board.snapshot()) {
                Ok(json) => {
                    let mut sse_chunk = String::with_capacity(json.len() + 16);
                    sse_chunk.push_str("data: ");
                    sse_chunk.push_str(&json);
                    sse_chunk.push_str("\n\n");
                    yield Ok::<Bytes, actix_web::Error>(Bytes::from(sse_chunk));
                }
                Err(err) => {
                    let error_chunk = format!("event: error\ndata: {}\n\n", err);
                    yield Ok::<Bytes, actix_web::Error>(Bytes::from(error_chunk));
                }
            }
        }
    };

    HttpResponse::Ok()
        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .append_header(("Cache-Control", "no-cache"))
        .append_header(("Content-Type", "text/event-stream"))
        .append_header(("Connection", "keep-alive"))
        .streaming(stream)
}

/// Render the Prometheus exposition text.
async fn metrics_handler() -> HttpResponse {
    match telemetry::prometheus_handle() {
        Some(handle) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(handle.render()),
        None => HttpResponse::ServiceUnavailable().body("metrics recorder not initialised"),
    }
}
