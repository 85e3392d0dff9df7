use crate::{
    AppState,
    api::{AssignmentRemote, ModuleRemote, SessionCookie},
    auth::SessionUser,
    error::{AppError, MutationError},
    models::{
        Assignment, AssignmentUpdate, Course, CourseHome, Credentials, Dashboard, Enrollment,
        GradeRequest, Module, ModuleUpdate, MutationResult, NewCourse, ProfileUpdate, Role,
        Session, Submission, SubmissionRequest, User,
    },
    mutator::{Direction, Entity, OptimisticMutator, Remote, Settlement},
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::Serialize;

// --- Shared Helpers ---

/// Authoring (create, edit, publish, reorder, delete, grade) is reserved for faculty and admins.
fn require_author(session: &Session) -> Result<(), AppError> {
    if session.role.can_author() {
        Ok(())
    } else {
        tracing::warn!(user_id = %session.user_id, role = ?session.role, "authoring attempt refused");
        Err(AppError::Forbidden)
    }
}

/// Non-authoring roles only ever see published content.
fn visible_to<T: Entity>(role: Role, items: Vec<T>) -> Vec<T> {
    if role.can_author() {
        items
    } else {
        items.into_iter().filter(Entity::is_published).collect()
    }
}

/// Renders a settled mutation. A rollback is reported as 502 so the browser knows the change
/// did not land, with the restored list in the body.
fn settled<T: Serialize>(settlement: Settlement, items: Vec<T>) -> Response {
    let status = match settlement {
        Settlement::RolledBack { .. } => StatusCode::BAD_GATEWAY,
        Settlement::Confirmed { .. } | Settlement::Superseded => StatusCode::OK,
    };
    (status, Json(MutationResult { settlement, items })).into_response()
}

async fn run_toggle<T, R>(items: Vec<T>, id: &str, remote: &R) -> Result<Response, AppError>
where
    T: Entity + Serialize,
    R: Remote<T>,
{
    let mut mutator = OptimisticMutator::new(items);
    let settlement = mutator.toggle_publish(id, remote).await?;
    Ok(settled(settlement, mutator.into_items()))
}

async fn run_move<T, R>(
    items: Vec<T>,
    id: &str,
    direction: Direction,
    remote: &R,
) -> Result<Response, AppError>
where
    T: Entity + Serialize,
    R: Remote<T>,
{
    let mut mutator = OptimisticMutator::new(items);
    let settlement = mutator.move_item(id, direction, remote).await?;
    Ok(settled(settlement, mutator.into_items()))
}

async fn run_remove<T, R>(items: Vec<T>, id: &str, remote: &R) -> Result<Response, AppError>
where
    T: Entity + Serialize,
    R: Remote<T>,
{
    let mut mutator = OptimisticMutator::new(items);
    let settlement = mutator.remove(id, remote).await?;
    Ok(settled(settlement, mutator.into_items()))
}

// --- Session Handlers ---

/// sign_in
///
/// [Public Route] Signs in against the backend and relays its `Set-Cookie` headers, so the
/// browser holds the backend's session cookie from then on.
#[utoipa::path(
    post,
    path = "/signin",
    request_body = Credentials,
    responses(
        (status = 200, description = "Signed in", body = User),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, AppError> {
    let signed_in = state.backend.sign_in(&credentials).await?;
    tracing::info!(user_id = %signed_in.user.id, "user signed in");

    let mut response = Json(signed_in.user).into_response();
    for cookie in signed_in.set_cookie {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    Ok(response)
}

/// sign_in_required
///
/// [Public Route] Where the guard sends navigations that carry no session. Answers with the
/// same `{ "message" }` body as other failures so a client that follows the redirect can show
/// the sign-in form.
#[utoipa::path(
    get,
    path = "/signin",
    responses((status = 401, description = "No session; sign in with POST /signin"))
)]
pub async fn sign_in_required() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "message": "Please sign in to continue." })),
    )
        .into_response()
}

/// sign_out
///
/// [Public Route] Ends the backend session. Signing out without a session is a no-op.
#[utoipa::path(
    post,
    path = "/signout",
    responses((status = 204, description = "Signed out"))
)]
pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let cookie = SessionCookie::from_headers(&headers);
    if cookie.is_present() {
        state.backend.sign_out(&cookie).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// get_profile
///
/// [Authenticated Route] The signed-in user's full profile.
#[utoipa::path(
    get,
    path = "/profile",
    responses((status = 200, description = "Profile", body = User))
)]
pub async fn get_profile(
    SessionUser { cookie, .. }: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.backend.profile(&cookie).await?))
}

/// update_profile
///
/// [Authenticated Route] Updates the signed-in user's own profile. The next request resolves
/// the updated profile from the backend, so no other view needs to be told.
#[utoipa::path(
    put,
    path = "/profile",
    request_body = ProfileUpdate,
    responses((status = 200, description = "Updated", body = User))
)]
pub async fn update_profile(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    let user = state
        .backend
        .update_user(&cookie, &session.user_id, &update)
        .await?;
    Ok(Json(user))
}

// --- Dashboard & Course Catalogue ---

/// get_dashboard
///
/// [Authenticated Route] Faculty and admins see every course; everyone else sees the courses
/// they are enrolled in.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 200, description = "Dashboard", body = Dashboard))
)]
pub async fn get_dashboard(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<Dashboard>, AppError> {
    let courses = state.backend.courses(&cookie).await?;

    let courses = if session.role.bypasses_enrollment() {
        courses
    } else {
        let enrollments = state.backend.enrollments(&cookie, &session.user_id).await?;
        courses
            .into_iter()
            .filter(|course| {
                enrollments.iter().any(|enrollment| {
                    enrollment.user_id == session.user_id && enrollment.course_id == course.id
                })
            })
            .collect()
    };

    Ok(Json(Dashboard { session, courses }))
}

/// create_course
///
/// [Authenticated Route] Faculty/admin only.
#[utoipa::path(
    post,
    path = "/dashboard/courses",
    request_body = NewCourse,
    responses(
        (status = 200, description = "Created", body = Course),
        (status = 403, description = "Not faculty")
    )
)]
pub async fn create_course(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Json(course): Json<NewCourse>,
) -> Result<Json<Course>, AppError> {
    require_author(&session)?;
    Ok(Json(state.backend.create_course(&cookie, &course).await?))
}

/// update_course
///
/// [Authenticated Route] Faculty/admin only.
#[utoipa::path(
    put,
    path = "/dashboard/courses/{cid}",
    params(("cid" = String, Path, description = "Course ID")),
    request_body = NewCourse,
    responses((status = 200, description = "Updated", body = Course))
)]
pub async fn update_course(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(course): Json<NewCourse>,
) -> Result<Json<Course>, AppError> {
    require_author(&session)?;
    Ok(Json(
        state
            .backend
            .update_course(&cookie, &course_id, &course)
            .await?,
    ))
}

/// delete_course
///
/// [Authenticated Route] Faculty/admin only.
#[utoipa::path(
    delete,
    path = "/dashboard/courses/{cid}",
    params(("cid" = String, Path, description = "Course ID")),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_course(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_author(&session)?;
    state.backend.delete_course(&cookie, &course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// enroll
///
/// [Authenticated Route] Enrolls the signed-in user. Lives outside the course-scoped tree:
/// a student has to be able to reach it before they are enrolled.
#[utoipa::path(
    post,
    path = "/dashboard/courses/{cid}/enrollment",
    params(("cid" = String, Path, description = "Course ID")),
    responses((status = 200, description = "Enrolled", body = Enrollment))
)]
pub async fn enroll(
    SessionUser { cookie, .. }: SessionUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Enrollment>, AppError> {
    Ok(Json(state.backend.enroll(&cookie, &course_id).await?))
}

/// unenroll
///
/// [Authenticated Route]
#[utoipa::path(
    delete,
    path = "/dashboard/courses/{cid}/enrollment",
    params(("cid" = String, Path, description = "Course ID")),
    responses((status = 204, description = "Unenrolled"))
)]
pub async fn unenroll(
    SessionUser { cookie, .. }: SessionUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.backend.unenroll(&cookie, &course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Course Home & Modules ---

/// get_course_home
///
/// [Course Route] The course record plus the modules this session may see.
#[utoipa::path(
    get,
    path = "/Kambaz/Courses/{cid}/Home",
    params(("cid" = String, Path, description = "Course ID")),
    responses((status = 200, description = "Course home", body = CourseHome))
)]
pub async fn get_course_home(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseHome>, AppError> {
    let course = state.backend.course(&cookie, &course_id).await?;
    let modules = state.backend.modules(&cookie, &course_id).await?;
    Ok(Json(CourseHome {
        course,
        modules: visible_to(session.role, modules),
    }))
}

/// get_modules
///
/// [Course Route]
#[utoipa::path(
    get,
    path = "/Kambaz/Courses/{cid}/Modules",
    params(("cid" = String, Path, description = "Course ID")),
    responses((status = 200, description = "Modules", body = [Module]))
)]
pub async fn get_modules(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<Module>>, AppError> {
    let mut modules = state.backend.modules(&cookie, &course_id).await?;
    modules.sort_by_key(|module| module.order);
    Ok(Json(visible_to(session.role, modules)))
}

/// get_module
///
/// [Course Route] Unpublished modules, and modules of other courses, read as not found.
#[utoipa::path(
    get,
    path = "/Kambaz/Courses/{cid}/Modules/{mid}",
    params(
        ("cid" = String, Path, description = "Course ID"),
        ("mid" = String, Path, description = "Module ID")
    ),
    responses(
        (status = 200, description = "Module", body = Module),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_module(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path((course_id, module_id)): Path<(String, String)>,
) -> Result<Json<Module>, StatusCode> {
    let module = state
        .backend
        .module(&cookie, &module_id)
        .await
        .map_err(|e| AppError::from(e).into_response().status())?;

    if module.course != course_id || !(module.is_published || session.role.can_author()) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(module))
}

/// create_module
///
/// [Course Route] Faculty/admin only.
#[utoipa::path(
    post,
    path = "/Kambaz/Courses/{cid}/Modules",
    params(("cid" = String, Path, description = "Course ID")),
    request_body = ModuleUpdate,
    responses((status = 200, description = "Created", body = Module))
)]
pub async fn create_module(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(module): Json<ModuleUpdate>,
) -> Result<Json<Module>, AppError> {
    require_author(&session)?;
    Ok(Json(
        state
            .backend
            .create_module(&cookie, &course_id, &module)
            .await?,
    ))
}

/// update_module
///
/// [Course Route] Faculty/admin only. A module of another course reads as not found and is
/// never forwarded.
#[utoipa::path(
    put,
    path = "/Kambaz/Courses/{cid}/Modules/{mid}",
    params(
        ("cid" = String, Path, description = "Course ID"),
        ("mid" = String, Path, description = "Module ID")
    ),
    request_body = ModuleUpdate,
    responses(
        (status = 200, description = "Updated", body = Module),
        (status = 404, description = "Not in this course")
    )
)]
pub async fn update_module(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path((course_id, module_id)): Path<(String, String)>,
    Json(module): Json<ModuleUpdate>,
) -> Result<Json<Module>, AppError> {
    require_author(&session)?;
    let current = state.backend.module(&cookie, &module_id).await?;
    if current.course != course_id {
        return Err(MutationError::UnknownEntity(module_id).into());
    }
    Ok(Json(
        state
            .backend
            .update_module(&cookie, &module_id, &module)
            .await?,
    ))
}

/// delete_module
///
/// [Course Route] Optimistic delete. The module disappears from the returned list at once and
/// is reinserted at its old position if the backend refuses.
#[utoipa::path(
    delete,
    path = "/Kambaz/Courses/{cid}/Modules/{mid}",
    params(
        ("cid" = String, Path, description = "Course ID"),
        ("mid" = String, Path, description = "Module ID")
    ),
    responses(
        (status = 200, description = "Confirmed: {settlement, items}"),
        (status = 404, description = "Not in this course"),
        (status = 502, description = "Rolled back: {settlement, items}")
    )
)]
pub async fn delete_module(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path((course_id, module_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    require_author(&session)?;
    let modules = state.backend.modules(&cookie, &course_id).await?;
    let remote = ModuleRemote::new(state.backend.as_ref(), &cookie, &course_id);
    run_remove(modules, &module_id, &remote).await
}

/// toggle_module_publish
///
/// [Course Route] Optimistic publish toggle; the backend's copy wins on divergence.
#[utoipa::path(
    put,
    path = "/Kambaz/Courses/{cid}/Modules/{mid}/Publish",
    params(
        ("cid" = String, Path, description = "Course ID"),
        ("mid" = String, Path, description = "Module ID")
    ),
    responses(
        (status = 200, description = "Confirmed: {settlement, items}"),
        (status = 502, description = "Rolled back: {settlement, items}")
    )
)]
pub async fn toggle_module_publish(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path((course_id, module_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    require_author(&session)?;
    let modules = state.backend.modules(&cookie, &course_id).await?;
    let remote = ModuleRemote::new(state.backend.as_ref(), &cookie, &course_id);
    run_toggle(modules, &module_id, &remote).await
}

/// move_module
///
/// [Course Route] Moves a module one slot up or down and submits the whole new ordering.
#[utoipa::path(
    put,
    path = "/Kambaz/Courses/{cid}/Modules/{mid}/Move/{direction}",
    params(
        ("cid" = String, Path, description = "Course ID"),
        ("mid" = String, Path, description = "Module ID"),
        ("direction" = Direction, Path, description = "up | down")
    ),
    responses(
        (status = 200, description = "Confirmed: {settlement, items}"),
        (status = 422, description = "Already first/last"),
        (status = 502, description = "Rolled back: {settlement, items}")
    )
)]
pub async fn move_module(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path((course_id, module_id, direction)): Path<(String, String, Direction)>,
) -> Result<Response, AppError> {
    require_author(&session)?;
    let modules = state.backend.modules(&cookie, &course_id).await?;
    let remote = ModuleRemote::new(state.backend.as_ref(), &cookie, &course_id);
    run_move(modules, &module_id, direction, &remote).await
}

// --- Assignments ---

/// get_assignments
///
/// [Course Route]
#[utoipa::path(
    get,
    path = "/Kambaz/Courses/{cid}/Assignments",
    params(("cid" = String, Path, description = "Course ID")),
    responses((status = 200, description = "Assignments", body = [Assignment]))
)]
pub async fn get_assignments(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<Assignment>>, AppError> {
    let mut assignments = state.backend.assignments(&cookie, &course_id).await?;
    assignments.sort_by_key(|assignment| assignment.order);
    Ok(Json(visible_to(session.role, assignments)))
}

/// Fetches one assignment, treating other courses' and (for non-authors) unpublished
/// assignments as missing.
async fn visible_assignment(
    state: &AppState,
    user: &SessionUser,
    course_id: &str,
    assignment_id: &str,
) -> Result<Assignment, StatusCode> {
    let assignment = state
        .backend
        .assignment(&user.cookie, assignment_id)
        .await
        .map_err(|e| AppError::from(e).into_response().status())?;

    if assignment.course != course_id
        || !(assignment.is_published || user.session.role.can_author())
    {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(assignment)
}

/// get_assignment
///
/// [Course Route]
#[utoipa::path(
    get,
    path = "/Kambaz/Courses/{cid}/Assignments/{aid}",
    params(
        ("cid" = String, Path, description = "Course ID"),
        ("aid" = String, Path, description = "Assignment ID")
    ),
    responses(
        (status = 200, description = "Assignment", body = Assignment),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_assignment(
    user: SessionUser,
    State(state): State<AppState>,
    Path((course_id, assignment_id)): Path<(String, String)>,
) -> Result<Json<Assignment>, StatusCode> {
    visible_assignment(&state, &user, &course_id, &assignment_id)
        .await
        .map(Json)
}

/// create_assignment
///
/// [Course Route] Faculty/admin only.
#[utoipa::path(
    post,
    path = "/Kambaz/Courses/{cid}/Assignments",
    params(("cid" = String, Path, description = "Course ID")),
    request_body = AssignmentUpdate,
    responses((status = 200, description = "Created", body = Assignment))
)]
pub async fn create_assignment(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(assignment): Json<AssignmentUpdate>,
) -> Result<Json<Assignment>, AppError> {
    require_author(&session)?;
    Ok(Json(
        state
            .backend
            .create_assignment(&cookie, &course_id, &assignment)
            .await?,
    ))
}

/// update_assignment
///
/// [Course Route] Faculty/admin only, scoped to `{cid}` like `update_module`.
#[utoipa::path(
    put,
    path = "/Kambaz/Courses/{cid}/Assignments/{aid}",
    params(
        ("cid" = String, Path, description = "Course ID"),
        ("aid" = String, Path, description = "Assignment ID")
    ),
    request_body = AssignmentUpdate,
    responses(
        (status = 200, description = "Updated", body = Assignment),
        (status = 404, description = "Not in this course")
    )
)]
pub async fn update_assignment(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path((course_id, assignment_id)): Path<(String, String)>,
    Json(assignment): Json<AssignmentUpdate>,
) -> Result<Json<Assignment>, AppError> {
    require_author(&session)?;
    let current = state.backend.assignment(&cookie, &assignment_id).await?;
    if current.course != course_id {
        return Err(MutationError::UnknownEntity(assignment_id).into());
    }
    Ok(Json(
        state
            .backend
            .update_assignment(&cookie, &assignment_id, &assignment)
            .await?,
    ))
}

/// delete_assignment
///
/// [Course Route] Optimistic delete, see `delete_module`.
#[utoipa::path(
    delete,
    path = "/Kambaz/Courses/{cid}/Assignments/{aid}",
    params(
        ("cid" = String, Path, description = "Course ID"),
        ("aid" = String, Path, description = "Assignment ID")
    ),
    responses(
        (status = 200, description = "Confirmed: {settlement, items}"),
        (status = 502, description = "Rolled back: {settlement, items}")
    )
)]
pub async fn delete_assignment(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path((course_id, assignment_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    require_author(&session)?;
    let assignments = state.backend.assignments(&cookie, &course_id).await?;
    let remote = AssignmentRemote::new(state.backend.as_ref(), &cookie, &course_id);
    run_remove(assignments, &assignment_id, &remote).await
}

/// toggle_assignment_publish
///
/// [Course Route] Optimistic publish toggle.
#[utoipa::path(
    put,
    path = "/Kambaz/Courses/{cid}/Assignments/{aid}/Publish",
    params(
        ("cid" = String, Path, description = "Course ID"),
        ("aid" = String, Path, description = "Assignment ID")
    ),
    responses(
        (status = 200, description = "Confirmed: {settlement, items}"),
        (status = 502, description = "Rolled back: {settlement, items}")
    )
)]
pub async fn toggle_assignment_publish(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path((course_id, assignment_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    require_author(&session)?;
    let assignments = state.backend.assignments(&cookie, &course_id).await?;
    let remote = AssignmentRemote::new(state.backend.as_ref(), &cookie, &course_id);
    run_toggle(assignments, &assignment_id, &remote).await
}

/// move_assignment
///
/// [Course Route] Reorders assignments as one batch.
#[utoipa::path(
    put,
    path = "/Kambaz/Courses/{cid}/Assignments/{aid}/Move/{direction}",
    params(
        ("cid" = String, Path, description = "Course ID"),
        ("aid" = String, Path, description = "Assignment ID"),
        ("direction" = Direction, Path, description = "up | down")
    ),
    responses(
        (status = 200, description = "Confirmed: {settlement, items}"),
        (status = 422, description = "Already first/last"),
        (status = 502, description = "Rolled back: {settlement, items}")
    )
)]
pub async fn move_assignment(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path((course_id, assignment_id, direction)): Path<(String, String, Direction)>,
) -> Result<Response, AppError> {
    require_author(&session)?;
    let assignments = state.backend.assignments(&cookie, &course_id).await?;
    let remote = AssignmentRemote::new(state.backend.as_ref(), &cookie, &course_id);
    run_move(assignments, &assignment_id, direction, &remote).await
}

// --- Submissions ---

/// submit_assignment
///
/// [Course Route] Submits work for a visible assignment of this course.
#[utoipa::path(
    post,
    path = "/Kambaz/Courses/{cid}/Assignments/{aid}/Submissions",
    params(
        ("cid" = String, Path, description = "Course ID"),
        ("aid" = String, Path, description = "Assignment ID")
    ),
    request_body = SubmissionRequest,
    responses(
        (status = 200, description = "Submitted", body = Submission),
        (status = 404, description = "Not Found")
    )
)]
pub async fn submit_assignment(
    user: SessionUser,
    State(state): State<AppState>,
    Path((course_id, assignment_id)): Path<(String, String)>,
    Json(submission): Json<SubmissionRequest>,
) -> Result<Json<Submission>, StatusCode> {
    visible_assignment(&state, &user, &course_id, &assignment_id).await?;

    let submission = state
        .backend
        .submit(&user.cookie, &assignment_id, &submission)
        .await
        .map_err(|e| AppError::from(e).into_response().status())?;
    tracing::info!(user_id = %user.session.user_id, %assignment_id, "assignment submitted");
    Ok(Json(submission))
}

/// update_submission
///
/// [Course Route] Ownership is enforced by the backend.
#[utoipa::path(
    put,
    path = "/Kambaz/Courses/{cid}/Submissions/{sid}",
    params(
        ("cid" = String, Path, description = "Course ID"),
        ("sid" = String, Path, description = "Submission ID")
    ),
    request_body = SubmissionRequest,
    responses((status = 200, description = "Updated", body = Submission))
)]
pub async fn update_submission(
    SessionUser { cookie, .. }: SessionUser,
    State(state): State<AppState>,
    Path((_course_id, submission_id)): Path<(String, String)>,
    Json(submission): Json<SubmissionRequest>,
) -> Result<Json<Submission>, AppError> {
    Ok(Json(
        state
            .backend
            .update_submission(&cookie, &submission_id, &submission)
            .await?,
    ))
}

/// grade_submission
///
/// [Course Route] Faculty/admin only.
#[utoipa::path(
    put,
    path = "/Kambaz/Courses/{cid}/Submissions/{sid}/Grade",
    params(
        ("cid" = String, Path, description = "Course ID"),
        ("sid" = String, Path, description = "Submission ID")
    ),
    request_body = GradeRequest,
    responses(
        (status = 200, description = "Graded", body = Submission),
        (status = 403, description = "Not faculty")
    )
)]
pub async fn grade_submission(
    SessionUser { session, cookie }: SessionUser,
    State(state): State<AppState>,
    Path((_course_id, submission_id)): Path<(String, String)>,
    Json(grade): Json<GradeRequest>,
) -> Result<Json<Submission>, AppError> {
    require_author(&session)?;
    Ok(Json(
        state
            .backend
            .grade_submission(&cookie, &submission_id, &grade)
            .await?,
    ))
}
