use std::net::SocketAddr;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

use super::{
    error::ApiError,
    services::{
        catalog::{
            add_asset, add_sent_log, create_collection, create_slot, delete_asset,
            delete_collection, delete_sent_log, delete_slot, get_setting, list_collections,
            list_sent_log, list_slots, put_setting, update_asset, update_collection,
        },
        health,
        platform::{platform_config, publish_now, refresh_token},
        queue::{cancel, enqueue, list_queue},
        schedule::{confirm, generate, regenerate_cta},
        uploads::{MAX_UPLOAD_FILES, upload_from_url, upload_images},
    },
    state::AppState,
    utils::bearer_token,
};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Room for multipart boundaries and headers on top of the file bytes
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Full application router: `/health`, the `/api` surface and `/uploads`
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state
        .images
        .max_bytes()
        .saturating_mul(MAX_UPLOAD_FILES as u64)
        .saturating_add(MULTIPART_OVERHEAD);
    let upload_limit = usize::try_from(upload_limit).unwrap_or(usize::MAX);

    let api = Router::new()
        .route("/collections", get(list_collections).post(create_collection))
        .route(
            "/collections/{id}",
            put(update_collection).delete(delete_collection),
        )
        .route("/collections/{id}/assets", post(add_asset))
        .route("/assets/{id}", put(update_asset).delete(delete_asset))
        .route("/slots", get(list_slots).post(create_slot))
        .route("/slots/{id}", delete(delete_slot))
        .route("/schedule/generate", post(generate))
        .route("/schedule/confirm", post(confirm))
        .route("/schedule/cta", post(regenerate_cta))
        .route("/queue", get(list_queue).post(enqueue))
        .route("/queue/{id}", delete(cancel))
        .route("/platform/config", get(platform_config))
        .route("/platform/publish", post(publish_now))
        .route("/platform/refresh-token", post(refresh_token))
        .route("/settings", post(put_setting))
        .route("/settings/{key}", get(get_setting))
        .route(
            "/uploads",
            post(upload_images).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/uploads/url", post(upload_from_url))
        .route("/log", get(list_sent_log).post(add_sent_log))
        .route("/log/{id}", delete(delete_sent_log))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    let uploads = ServeDir::new(&state.config.storage.uploads_dir);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Rejects `/api` requests without the configured bearer token
///
/// Open when no token is configured.
async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.config.auth.api_token.as_deref() {
        if bearer_token(request.headers()) != Some(expected) {
            return Err(ApiError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}

/// Serve until Ctrl+C / SIGTERM; in-flight requests finish first
pub async fn serve(router: Router, address: SocketAddr) -> Result<(), AnyError> {
    let listener = TcpListener::bind(address).await?;
    info!(%address, "storydesk API listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
