use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Course Router Module
///
/// Every route here is course-scoped: the guard extracts `{cid}` from the path and checks the
/// caller's enrollment before a handler runs. Authoring routes additionally check the role
/// inside the handler.
///
/// Routes are registered with their full paths (not nested) so the guard sees the complete
/// request path.
pub fn course_routes() -> Router<AppState> {
    Router::<AppState>::new()
        .route("/Kambaz/Courses/{cid}/Home", get(handlers::get_course_home))
        // --- Modules ---
        .route(
            "/Kambaz/Courses/{cid}/Modules",
            get(handlers::get_modules).post(handlers::create_module),
        )
        .route(
            "/Kambaz/Courses/{cid}/Modules/{mid}",
            get(handlers::get_module)
                .put(handlers::update_module)
                .delete(handlers::delete_module),
        )
        // PUT .../Publish flips the flag optimistically; PUT .../Move/{up|down} swaps
        // neighbours and submits the whole ordering in one call.
        .route(
            "/Kambaz/Courses/{cid}/Modules/{mid}/Publish",
            put(handlers::toggle_module_publish),
        )
        .route(
            "/Kambaz/Courses/{cid}/Modules/{mid}/Move/{direction}",
            put(handlers::move_module),
        )
        // --- Assignments ---
        .route(
            "/Kambaz/Courses/{cid}/Assignments",
            get(handlers::get_assignments).post(handlers::create_assignment),
        )
        .route(
            "/Kambaz/Courses/{cid}/Assignments/{aid}",
            get(handlers::get_assignment)
                .put(handlers::update_assignment)
                .delete(handlers::delete_assignment),
        )
        .route(
            "/Kambaz/Courses/{cid}/Assignments/{aid}/Publish",
            put(handlers::toggle_assignment_publish),
        )
        .route(
            "/Kambaz/Courses/{cid}/Assignments/{aid}/Move/{direction}",
            put(handlers::move_assignment),
        )
        // --- Submissions ---
        .route(
            "/Kambaz/Courses/{cid}/Assignments/{aid}/Submissions",
            post(handlers::submit_assignment),
        )
        .route(
            "/Kambaz/Courses/{cid}/Submissions/{sid}",
            put(handlers::update_submission),
        )
        .route(
            "/Kambaz/Courses/{cid}/Submissions/{sid}/Grade",
            put(handlers::grade_submission),
        )
}
