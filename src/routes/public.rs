use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session. The guard redirects unauthenticated navigations
/// here, so nothing in this module may sit behind it.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for the load balancer. Does not touch the backend.
        .route("/health", get(|| async { "ok" }))
        // GET /signin: the guard's redirect target.
        // POST /signin: signs in against the backend and relays its session cookie.
        .route(
            "/signin",
            get(handlers::sign_in_required).post(handlers::sign_in),
        )
        // POST /signout
        .route("/signout", post(handlers::sign_out))
}
