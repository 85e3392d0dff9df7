use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Routes that need a session but are not scoped to a single course. The enrollment
/// endpoints live here: the lower-case `/dashboard/courses/...` prefix is not
/// course-scoped, so a student can enroll in a course they cannot open yet.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /dashboard
        // The courses this session can see (all of them for faculty/admin).
        .route("/dashboard", get(handlers::get_dashboard))
        // --- Course Catalogue (faculty/admin) ---
        .route("/dashboard/courses", post(handlers::create_course))
        .route(
            "/dashboard/courses/{cid}",
            put(handlers::update_course).delete(handlers::delete_course),
        )
        // POST/DELETE /dashboard/courses/{cid}/enrollment
        // Enrolls or unenrolls the signed-in user.
        .route(
            "/dashboard/courses/{cid}/enrollment",
            post(handlers::enroll).delete(handlers::unenroll),
        )
        // GET/PUT /profile
        .route(
            "/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
}
