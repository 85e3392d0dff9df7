mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::LOCATION},
};
use common::{MockBackend, STUDENT_COOKIE, create_test_state};
use kambaz_portal::create_router;
use serde_json::Value;
use tower::ServiceExt;

fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_openapi_document_lists_course_routes() {
    let (state, _) = create_test_state(MockBackend::default());
    let app = create_router(state);

    let response = app
        .oneshot(get("/api-docs/openapi.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();
    let paths = doc["paths"].as_object().unwrap();
    assert!(paths.contains_key("/Kambaz/Courses/{cid}/Modules/{mid}/Publish"));
    assert!(paths.contains_key("/dashboard"));
    assert!(paths.contains_key("/signin"));
}

#[tokio::test]
async fn test_guard_redirect_is_see_other() {
    let (state, _) = create_test_state(MockBackend::default());
    let app = create_router(state);

    let response = app
        .oneshot(get("/Kambaz/Courses/RS102/Assignments", Some(STUDENT_COOKIE)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(LOCATION).unwrap(), "/dashboard");
}

#[tokio::test]
async fn test_public_routes_skip_session_resolution() {
    let (state, backend) = create_test_state(MockBackend::default());
    let app = create_router(state);

    let response = app.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!backend.called("profile"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (state, _) = create_test_state(MockBackend::default());
    let app = create_router(state);

    let response = app
        .oneshot(get("/Kambaz/Courses/RS101/Quizzes", Some(STUDENT_COOKIE)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
