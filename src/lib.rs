use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core policy: route guarding and optimistic mutation. Neither touches HTTP directly.
pub mod access;
pub mod mutator;

// Backend client, session resolution and the HTTP surface built on them.
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;

// Module for routing segregation (Public, Authenticated, Course-scoped).
pub mod routes;
use routes::{authenticated, courses, public};

// --- Public Re-exports ---

pub use access::{AccessDecision, AccessGate};
pub use api::{BackendState, HttpBackend, SessionCookie};
pub use config::AppConfig;

use access::DenyReason;
use error::AppError;

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and every schema used in request/response
/// bodies. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::sign_in, handlers::sign_in_required, handlers::sign_out,
        handlers::get_profile, handlers::update_profile,
        handlers::get_dashboard, handlers::create_course, handlers::update_course,
        handlers::delete_course, handlers::enroll, handlers::unenroll,
        handlers::get_course_home, handlers::get_modules, handlers::get_module,
        handlers::create_module, handlers::update_module, handlers::delete_module,
        handlers::toggle_module_publish, handlers::move_module,
        handlers::get_assignments, handlers::get_assignment, handlers::create_assignment,
        handlers::update_assignment, handlers::delete_assignment,
        handlers::toggle_assignment_publish, handlers::move_assignment,
        handlers::submit_assignment, handlers::update_submission, handlers::grade_submission
    ),
    components(
        schemas(
            models::Role, models::User, models::Session, models::Enrollment, models::Course,
            models::Lesson, models::Module, models::Assignment, models::Submission,
            models::Credentials, models::PublishRequest, models::OrderEntry,
            models::GradeRequest, models::SubmissionRequest, models::NewCourse,
            models::ModuleUpdate, models::AssignmentUpdate, models::ProfileUpdate,
            models::CourseHome, models::Dashboard, mutator::Settlement, mutator::Direction,
        )
    ),
    tags(
        (name = "kambaz-portal", description = "Kambaz LMS web portal")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container shared by every request: the backend client, the loaded
/// configuration and the access policy built from it.
#[derive(Clone)]
pub struct AppState {
    /// Backend Layer: the LMS REST API, behind a trait so tests can swap it out.
    pub backend: BackendState,
    pub config: AppConfig,
    pub gate: AccessGate,
}

impl AppState {
    /// Builds the state, deriving the access gate from the configuration.
    pub fn new(backend: BackendState, config: AppConfig) -> Self {
        let gate = AccessGate::new(config.unlisted_role_policy);
        Self {
            backend,
            config,
            gate,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for BackendState {
    fn from_ref(app_state: &AppState) -> BackendState {
        app_state.backend.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for AccessGate {
    fn from_ref(app_state: &AppState) -> AccessGate {
        app_state.gate
    }
}

/// access_guard
///
/// Route guard for every non-public route. Resolves the session from the forwarded cookie,
/// fetches enrollments only when the gate's decision depends on them, then either redirects
/// (303 to `/signin` or `/dashboard`) or stores the `Session` in the request extensions for
/// the `SessionUser` extractor and runs the handler.
///
/// A backend outage while resolving is a 502, never a redirect: the user is not known to be
/// signed out.
async fn access_guard(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let cookie = SessionCookie::from_headers(request.headers());

    let session = match auth::resolve_session(&state.backend, &cookie).await {
        Ok(session) => session,
        Err(e) => return AppError::from(e).into_response(),
    };

    let enrollments = match &session {
        Some(session) if state.gate.needs_enrollments(Some(session), &path) => {
            match state.backend.enrollments(&cookie, &session.user_id).await {
                Ok(enrollments) => enrollments,
                Err(e) => return AppError::from(e).into_response(),
            }
        }
        _ => Vec::new(),
    };

    match state.gate.decide(session.as_ref(), &enrollments, &path) {
        AccessDecision::Allow => {
            if let Some(session) = session {
                request.extensions_mut().insert(session);
            }
            next.run(request).await
        }
        AccessDecision::Redirect { target, reason } => {
            match reason {
                DenyReason::AuthenticationRequired => {
                    tracing::debug!(%path, %target, "no session, redirecting")
                }
                DenyReason::NotEnrolled | DenyReason::MalformedReference => {
                    tracing::info!(%path, %target, ?reason, "navigation denied")
                }
            }
            Redirect::to(&target).into_response()
        }
    }
}

/// create_router
///
/// Assembles the routing structure, applies the guard to the protected routers, and wraps
/// everything in the observability and CORS layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No guard.
        .merge(public::public_routes())
        // Authenticated and course routes share the guard; only course-scoped paths
        // trigger the enrollment check inside it.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), access_guard)),
        )
        .merge(
            courses::course_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), access_guard)),
        )
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing, correlated by the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation back to the browser.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, URI and the `x-request-id` set above.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
