use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    // Oversized files must reach the upload gate to get its 400 message.
    let upload_limit = state.max_upload_bytes.saturating_mul(2);

    let upload_routes = Router::new()
        .route("/slots/bulk-upload", post(handlers::bulk_upload_slots))
        .layer(DefaultBodyLimit::max(upload_limit));

    let protected_routes = Router::new()
        .route("/", post(handlers::create_doctor).get(handlers::list_doctors))
        .route(
            "/{doctor_id}",
            get(handlers::get_doctor)
                .patch(handlers::update_doctor)
                .delete(handlers::delete_doctor),
        )
        .route("/{doctor_id}/slots", post(handlers::create_slot))
        .merge(upload_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
