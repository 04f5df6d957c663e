pub mod health;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderName, Request},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::screening::handlers::{self, REQUEST_ID_HEADER};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);
    let trace_header = request_id_header.clone();

    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&trace_header)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    // Multipart framing on top of the largest accepted file.
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_mul(state.config.batch_max_files)
        .saturating_add(1024 * 1024);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/health", get(health::components_handler))
        .route("/api/v1/screenings/evaluate", post(handlers::handle_evaluate))
        .route("/api/v1/screenings/batch", post(handlers::handle_batch))
        .route("/api/v1/screenings/score", post(handlers::handle_score))
        .route("/api/v1/screenings", get(handlers::handle_list_screenings))
        .route(
            "/api/v1/screenings/:id",
            get(handlers::handle_get_screening).delete(handlers::handle_delete_screening),
        )
        .route(
            "/api/v1/screenings/:id/rescore",
            post(handlers::handle_rescore_screening),
        )
        .route(
            "/api/v1/job-descriptions/analyze",
            post(handlers::handle_analyze_job),
        )
        .route(
            "/api/v1/job-descriptions/analyze-file",
            post(handlers::handle_analyze_job_file),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid::default(),
        ))
        .layer(CorsLayer::permissive()) // TODO: restrict origins once the HR dashboard host is fixed
        .with_state(state)
}
