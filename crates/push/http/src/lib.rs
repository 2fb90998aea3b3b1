//! Push HTTP Layer
//!
//! Axum handler for the push endpoint.

mod handlers;
mod middleware;

pub use handlers::*;
pub use middleware::*;

use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;

/// Create the push router.
///
/// The endpoint is served at both `/` and `/send_push` and accepts any
/// method; `OPTIONS` is answered without touching the service.
pub fn push_router<S>(service: S) -> Router
where
    S: push_service::PushDispatch + Clone + 'static,
{
    use axum::routing::any;

    Router::new()
        .route("/", any(handlers::send_push_handler::<S>))
        .route("/send_push", any(handlers::send_push_handler::<S>))
        .with_state(service)
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(axum::middleware::from_fn(middleware::cors_middleware))
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
}
