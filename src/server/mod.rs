//! Http api over the entry and rate storages. Every request runs to completion on its own, state is
//! only shared through [AppState].

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, put},
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    storage::{
        json_store::{JsonEntryStorage, JsonRateStorage},
        repository::{EntryStorage, RateStorage},
    },
    utils::clock::{Clock, DefaultClock},
};

pub mod error;
pub mod routes;
pub mod shutdown;

pub const DEFAULT_PORT: u16 = 4000;

/// Dependencies shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub entries: Arc<dyn EntryStorage>,
    pub rates: Arc<dyn RateStorage>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// State backed by json documents inside `data_dir`. Missing documents are created.
    pub async fn from_data_dir(data_dir: &Path) -> Result<Self> {
        Ok(Self {
            entries: Arc::new(JsonEntryStorage::new(data_dir).await?),
            rates: Arc::new(JsonRateStorage::new(data_dir).await?),
            clock: Arc::new(DefaultClock),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/entries",
            get(routes::list_entries).post(routes::create_entry),
        )
        .route("/api/entries/weeks", get(routes::entries_by_week))
        .route(
            "/api/entries/{id}",
            put(routes::update_entry).delete(routes::delete_entry),
        )
        .route(
            "/api/course-rates",
            get(routes::list_rates).put(routes::upsert_rate),
        )
        .route(
            "/api/course-rates/{course_name}",
            delete(routes::delete_rate),
        )
        .route("/api/stats", get(routes::stats))
        .route("/api/courses", get(routes::courses))
        .fallback(routes::not_found)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let response = next.run(request).await;
    info!("{method} {uri} {}", response.status());
    response
}

/// Serves the api on `listener` until `shutdown` is cancelled.
pub async fn serve(listener: TcpListener, state: AppState, shutdown: CancellationToken) -> Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

/// Represents the starting point for the server
pub async fn start_server(data_dir: &Path, host: &str, port: u16) -> Result<()> {
    let state = AppState::from_data_dir(data_dir).await?;

    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Can't listen on {host}:{port}"))?;
    info!(
        "Backend server running on http://{}, data in {data_dir:?}",
        listener.local_addr()?
    );

    let shutdown_token = CancellationToken::new();

    let (_, serve_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        async {
            let result = serve(listener, state, shutdown_token.clone()).await;
            shutdown_token.cancel();
            result
        },
    );

    if let Err(e) = &serve_result {
        error!("Server stopped with an error {e:?}");
    }
    info!("Server stopped");
    serve_result
}
