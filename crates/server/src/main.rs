use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use server_api::{health, submit_contact, ApiContext, ContactSubmitError};
use shared::protocol::{ContactRequest, ContactResponse};
use storage::Storage;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext::new(storage),
    };
    let app = build_router(Arc::new(state), settings.max_body_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, max_body_bytes = settings.max_body_bytes, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/contact", post(http_submit_contact))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn healthz(State(state): State<Arc<AppState>>) -> Response {
    match health(&state.api).await {
        Ok(()) => "ok".into_response(),
        Err(err) => {
            warn!(error = %err.message, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(err)).into_response()
        }
    }
}

async fn http_submit_contact(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> (StatusCode, Json<ContactResponse>) {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!("contact submission exceeded the body limit");
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ContactResponse::failed(Vec::new())),
            );
        }
        Err(rejection) => {
            warn!(reason = %rejection.body_text(), "unreadable contact submission");
            return (
                StatusCode::BAD_REQUEST,
                Json(ContactResponse::failed(Vec::new())),
            );
        }
    };

    match submit_contact(&state.api, &req).await {
        Ok(_) => (StatusCode::OK, Json(ContactResponse::sent())),
        Err(ContactSubmitError::Invalid(errors)) => {
            (StatusCode::BAD_REQUEST, Json(ContactResponse::failed(errors)))
        }
        Err(ContactSubmitError::Storage(_)) => (
            StatusCode::BAD_REQUEST,
            Json(ContactResponse::failed(Vec::new())),
        ),
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
