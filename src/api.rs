use std::{borrow::Cow, fmt, sync::Arc};

use async_trait::async_trait;
use axum::http::HeaderMap;
use reqwest::{
    Method, RequestBuilder, Response,
    header::{COOKIE, SET_COOKIE},
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    error::RemoteError,
    models::{
        Assignment, AssignmentUpdate, Course, Credentials, Enrollment, GradeRequest, Module,
        ModuleUpdate, NewCourse, OrderEntry, ProfileUpdate, PublishRequest, Submission,
        SubmissionRequest, User,
    },
    mutator::Remote,
};

/// SessionCookie
///
/// The browser's `Cookie` header, forwarded verbatim on every backend call so the backend
/// sees the same session the browser holds. Never logged.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionCookie(Option<String>);

impl SessionCookie {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Some(value.into()))
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let value = headers
            .get(axum::http::header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string);
        Self(value)
    }

    pub fn value(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("SessionCookie(<redacted>)"),
            None => f.write_str("SessionCookie(None)"),
        }
    }
}

/// SignedIn
///
/// A successful sign-in: the profile plus the `Set-Cookie` values to relay to the browser.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: User,
    pub set_cookie: Vec<String>,
}

/// Backend Trait
///
/// The contract for every call this service makes to the LMS REST backend. Handlers and the
/// route guard only see this trait, so tests swap in an in-memory mock the same way the
/// real client is swapped in at startup.
#[async_trait]
pub trait Backend: Send + Sync {
    // --- Users & Session ---
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignedIn, RemoteError>;
    async fn sign_out(&self, cookie: &SessionCookie) -> Result<(), RemoteError>;
    async fn profile(&self, cookie: &SessionCookie) -> Result<User, RemoteError>;
    async fn update_user(
        &self,
        cookie: &SessionCookie,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<User, RemoteError>;
    async fn enrollments(
        &self,
        cookie: &SessionCookie,
        user_id: &str,
    ) -> Result<Vec<Enrollment>, RemoteError>;

    // --- Courses ---
    async fn courses(&self, cookie: &SessionCookie) -> Result<Vec<Course>, RemoteError>;
    async fn course(&self, cookie: &SessionCookie, course_id: &str) -> Result<Course, RemoteError>;
    async fn create_course(
        &self,
        cookie: &SessionCookie,
        course: &NewCourse,
    ) -> Result<Course, RemoteError>;
    async fn update_course(
        &self,
        cookie: &SessionCookie,
        course_id: &str,
        course: &NewCourse,
    ) -> Result<Course, RemoteError>;
    async fn delete_course(&self, cookie: &SessionCookie, course_id: &str) -> Result<(), RemoteError>;
    async fn enroll(&self, cookie: &SessionCookie, course_id: &str) -> Result<Enrollment, RemoteError>;
    async fn unenroll(&self, cookie: &SessionCookie, course_id: &str) -> Result<(), RemoteError>;

    // --- Modules ---
    async fn modules(&self, cookie: &SessionCookie, course_id: &str) -> Result<Vec<Module>, RemoteError>;
    async fn module(&self, cookie: &SessionCookie, module_id: &str) -> Result<Module, RemoteError>;
    async fn create_module(
        &self,
        cookie: &SessionCookie,
        course_id: &str,
        module: &ModuleUpdate,
    ) -> Result<Module, RemoteError>;
    async fn update_module(
        &self,
        cookie: &SessionCookie,
        module_id: &str,
        module: &ModuleUpdate,
    ) -> Result<Module, RemoteError>;
    async fn delete_module(&self, cookie: &SessionCookie, module_id: &str) -> Result<(), RemoteError>;
    async fn publish_module(
        &self,
        cookie: &SessionCookie,
        module_id: &str,
        is_published: bool,
    ) -> Result<Module, RemoteError>;
    async fn reorder_modules(
        &self,
        cookie: &SessionCookie,
        course_id: &str,
        batch: &[OrderEntry],
    ) -> Result<Vec<Module>, RemoteError>;

    // --- Assignments ---
    async fn assignments(
        &self,
        cookie: &SessionCookie,
        course_id: &str,
    ) -> Result<Vec<Assignment>, RemoteError>;
    async fn assignment(
        &self,
        cookie: &SessionCookie,
        assignment_id: &str,
    ) -> Result<Assignment, RemoteError>;
    async fn create_assignment(
        &self,
        cookie: &SessionCookie,
        course_id: &str,
        assignment: &AssignmentUpdate,
    ) -> Result<Assignment, RemoteError>;
    async fn update_assignment(
        &self,
        cookie: &SessionCookie,
        assignment_id: &str,
        assignment: &AssignmentUpdate,
    ) -> Result<Assignment, RemoteError>;
    async fn delete_assignment(
        &self,
        cookie: &SessionCookie,
        assignment_id: &str,
    ) -> Result<(), RemoteError>;
    async fn publish_assignment(
        &self,
        cookie: &SessionCookie,
        assignment_id: &str,
        is_published: bool,
    ) -> Result<Assignment, RemoteError>;
    async fn reorder_assignments(
        &self,
        cookie: &SessionCookie,
        course_id: &str,
        batch: &[OrderEntry],
    ) -> Result<Vec<Assignment>, RemoteError>;

    // --- Submissions ---
    async fn submit(
        &self,
        cookie: &SessionCookie,
        assignment_id: &str,
        submission: &SubmissionRequest,
    ) -> Result<Submission, RemoteError>;
    async fn update_submission(
        &self,
        cookie: &SessionCookie,
        submission_id: &str,
        submission: &SubmissionRequest,
    ) -> Result<Submission, RemoteError>;
    async fn grade_submission(
        &self,
        cookie: &SessionCookie,
        submission_id: &str,
        grade: &GradeRequest,
    ) -> Result<Submission, RemoteError>;
}

/// Percent-encodes one id for use as a URL path segment. Dot segments are collapsed by URL
/// normalization even when encoded, so they cannot name a backend resource.
fn segment(id: &str) -> Result<Cow<'_, str>, RemoteError> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(RemoteError::Status {
            status: 404,
            message: None,
        });
    }
    Ok(urlencoding::encode(id))
}

/// BackendState
///
/// The concrete type used to share backend access across the application state.
pub type BackendState = Arc<dyn Backend>;

/// HttpBackend
///
/// The `reqwest` implementation of [`Backend`]. Timeouts are the client defaults and
/// nothing is retried: a failure is reported once and left to the user.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Builds a request carrying the forwarded cookie and a fresh `x-request-id`.
    fn request(&self, method: Method, path: &str, cookie: &SessionCookie) -> RequestBuilder {
        let request_id = Uuid::new_v4().to_string();
        tracing::debug!(%method, path, req_id = %request_id, "backend request");

        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("x-request-id", request_id);

        match cookie.value() {
            Some(value) => builder.header(COOKIE, value),
            None => builder,
        }
    }

    /// Maps non-2xx responses to `RemoteError::Status`, keeping the payload's message.
    async fn check(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::from_payload(status.as_u16(), &body))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::Malformed(e.to_string()))
    }

    async fn fetch<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, RemoteError> {
        let response = Self::check(builder.send().await?).await?;
        Self::decode(response).await
    }

    /// For endpoints whose response body carries nothing this client needs.
    async fn execute(builder: RequestBuilder) -> Result<(), RemoteError> {
        Self::check(builder.send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignedIn, RemoteError> {
        let builder = self
            .request(Method::POST, "/api/users/signin", &SessionCookie::default())
            .json(credentials);
        let response = Self::check(builder.send().await?).await?;

        let set_cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        let user = Self::decode(response).await?;

        Ok(SignedIn { user, set_cookie })
    }

    async fn sign_out(&self, cookie: &SessionCookie) -> Result<(), RemoteError> {
        Self::execute(self.request(Method::POST, "/api/users/signout", cookie)).await
    }

    async fn profile(&self, cookie: &SessionCookie) -> Result<User, RemoteError> {
        Self::fetch(self.request(Method::GET, "/api/users/profile", cookie)).await
    }

    async fn update_user(
        &self,
        cookie: &SessionCookie,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<User, RemoteError> {
        let path = format!("/api/users/{}", segment(user_id)?);
        Self::fetch(self.request(Method::PUT, &path, cookie).json(update)).await
    }

    async fn enrollments(
        &self,
        cookie: &SessionCookie,
        user_id: &str,
    ) -> Result<Vec<Enrollment>, RemoteError> {
        let path = format!("/api/users/{}/enrollments", segment(user_id)?);
        Self::fetch(self.request(Method::GET, &path, cookie)).await
    }

    async fn courses(&self, cookie: &SessionCookie) -> Result<Vec<Course>, RemoteError> {
        Self::fetch(self.request(Method::GET, "/api/courses", cookie)).await
    }

    async fn course(&self, cookie: &SessionCookie, course_id: &str) -> Result<Course, RemoteError> {
        let path = format!("/api/courses/{}", segment(course_id)?);
        Self::fetch(self.request(Method::GET, &path, cookie)).await
    }

    async fn create_course(
        &self,
        cookie: &SessionCookie,
        course: &NewCourse,
    ) -> Result<Course, RemoteError> {
        Self::fetch(self.request(Method::POST, "/api/courses", cookie).json(course)).await
    }

    async fn update_course(
        &self,
        cookie: &SessionCookie,
        course_id: &str,
        course: &NewCourse,
    ) -> Result<Course, RemoteError> {
        let path = format!("/api/courses/{}", segment(course_id)?);
        Self::fetch(self.request(Method::PUT, &path, cookie).json(course)).await
    }

    async fn delete_course(&self, cookie: &SessionCookie, course_id: &str) -> Result<(), RemoteError> {
        let path = format!("/api/courses/{}", segment(course_id)?);
        Self::execute(self.request(Method::DELETE, &path, cookie)).await
    }

    async fn enroll(&self, cookie: &SessionCookie, course_id: &str) -> Result<Enrollment, RemoteError> {
        let path = format!("/api/courses/{}/enroll", segment(course_id)?);
        Self::fetch(self.request(Method::POST, &path, cookie)).await
    }

    async fn unenroll(&self, cookie: &SessionCookie, course_id: &str) -> Result<(), RemoteError> {
        let path = format!("/api/courses/{}/enroll", segment(course_id)?);
        Self::execute(self.request(Method::DELETE, &path, cookie)).await
    }

    async fn modules(&self, cookie: &SessionCookie, course_id: &str) -> Result<Vec<Module>, RemoteError> {
        let builder = self
            .request(Method::GET, "/api/modules", cookie)
            .query(&[("courseId", course_id)]);
        Self::fetch(builder).await
    }

    async fn module(&self, cookie: &SessionCookie, module_id: &str) -> Result<Module, RemoteError> {
        let path = format!("/api/modules/{}", segment(module_id)?);
        Self::fetch(self.request(Method::GET, &path, cookie)).await
    }

    async fn create_module(
        &self,
        cookie: &SessionCookie,
        course_id: &str,
        module: &ModuleUpdate,
    ) -> Result<Module, RemoteError> {
        let path = format!("/api/courses/{}/modules", segment(course_id)?);
        Self::fetch(self.request(Method::POST, &path, cookie).json(module)).await
    }

    async fn update_module(
        &self,
        cookie: &SessionCookie,
        module_id: &str,
        module: &ModuleUpdate,
    ) -> Result<Module, RemoteError> {
        let path = format!("/api/modules/{}", segment(module_id)?);
        Self::fetch(self.request(Method::PUT, &path, cookie).json(module)).await
    }

    async fn delete_module(&self, cookie: &SessionCookie, module_id: &str) -> Result<(), RemoteError> {
        let path = format!("/api/modules/{}", segment(module_id)?);
        Self::execute(self.request(Method::DELETE, &path, cookie)).await
    }

    async fn publish_module(
        &self,
        cookie: &SessionCookie,
        module_id: &str,
        is_published: bool,
    ) -> Result<Module, RemoteError> {
        let path = format!("/api/modules/{}/publish", segment(module_id)?);
        let body = PublishRequest { is_published };
        Self::fetch(self.request(Method::PUT, &path, cookie).json(&body)).await
    }

    async fn reorder_modules(
        &self,
        cookie: &SessionCookie,
        course_id: &str,
        batch: &[OrderEntry],
    ) -> Result<Vec<Module>, RemoteError> {
        let path = format!("/api/courses/{}/modules/order", segment(course_id)?);
        Self::fetch(self.request(Method::PUT, &path, cookie).json(batch)).await
    }

    async fn assignments(
        &self,
        cookie: &SessionCookie,
        course_id: &str,
    ) -> Result<Vec<Assignment>, RemoteError> {
        let path = format!("/api/courses/{}/assignments", segment(course_id)?);
        Self::fetch(self.request(Method::GET, &path, cookie)).await
    }

    async fn assignment(
        &self,
        cookie: &SessionCookie,
        assignment_id: &str,
    ) -> Result<Assignment, RemoteError> {
        let path = format!("/api/assignments/{}", segment(assignment_id)?);
        Self::fetch(self.request(Method::GET, &path, cookie)).await
    }

    async fn create_assignment(
        &self,
        cookie: &SessionCookie,
        course_id: &str,
        assignment: &AssignmentUpdate,
    ) -> Result<Assignment, RemoteError> {
        let path = format!("/api/courses/{}/assignments", segment(course_id)?);
        Self::fetch(self.request(Method::POST, &path, cookie).json(assignment)).await
    }

    async fn update_assignment(
        &self,
        cookie: &SessionCookie,
        assignment_id: &str,
        assignment: &AssignmentUpdate,
    ) -> Result<Assignment, RemoteError> {
        let path = format!("/api/assignments/{}", segment(assignment_id)?);
        Self::fetch(self.request(Method::PUT, &path, cookie).json(assignment)).await
    }

    async fn delete_assignment(
        &self,
        cookie: &SessionCookie,
        assignment_id: &str,
    ) -> Result<(), RemoteError> {
        let path = format!("/api/assignments/{}", segment(assignment_id)?);
        Self::execute(self.request(Method::DELETE, &path, cookie)).await
    }

    async fn publish_assignment(
        &self,
        cookie: &SessionCookie,
        assignment_id: &str,
        is_published: bool,
    ) -> Result<Assignment, RemoteError> {
        let path = format!("/api/assignments/{}/publish", segment(assignment_id)?);
        let body = PublishRequest { is_published };
        Self::fetch(self.request(Method::PUT, &path, cookie).json(&body)).await
    }

    async fn reorder_assignments(
        &self,
        cookie: &SessionCookie,
        course_id: &str,
        batch: &[OrderEntry],
    ) -> Result<Vec<Assignment>, RemoteError> {
        let path = format!("/api/courses/{}/assignments/order", segment(course_id)?);
        Self::fetch(self.request(Method::PUT, &path, cookie).json(batch)).await
    }

    async fn submit(
        &self,
        cookie: &SessionCookie,
        assignment_id: &str,
        submission: &SubmissionRequest,
    ) -> Result<Submission, RemoteError> {
        let path = format!("/api/assignments/{}/submissions", segment(assignment_id)?);
        Self::fetch(self.request(Method::POST, &path, cookie).json(submission)).await
    }

    async fn update_submission(
        &self,
        cookie: &SessionCookie,
        submission_id: &str,
        submission: &SubmissionRequest,
    ) -> Result<Submission, RemoteError> {
        let path = format!("/api/submissions/{}", segment(submission_id)?);
        Self::fetch(self.request(Method::PUT, &path, cookie).json(submission)).await
    }

    async fn grade_submission(
        &self,
        cookie: &SessionCookie,
        submission_id: &str,
        grade: &GradeRequest,
    ) -> Result<Submission, RemoteError> {
        let path = format!("/api/submissions/{}/grade", segment(submission_id)?);
        Self::fetch(self.request(Method::PUT, &path, cookie).json(grade)).await
    }
}

// --- Mutator Adapters ---

/// ModuleRemote
///
/// Binds a backend, the caller's cookie and a course to the mutator's [`Remote`] contract
/// for modules.
pub struct ModuleRemote<'a> {
    backend: &'a dyn Backend,
    cookie: &'a SessionCookie,
    course_id: &'a str,
}

impl<'a> ModuleRemote<'a> {
    pub fn new(backend: &'a dyn Backend, cookie: &'a SessionCookie, course_id: &'a str) -> Self {
        Self {
            backend,
            cookie,
            course_id,
        }
    }
}

#[async_trait]
impl<'a> Remote<Module> for ModuleRemote<'a> {
    async fn publish(&self, id: &str, is_published: bool) -> Result<Module, RemoteError> {
        self.backend.publish_module(self.cookie, id, is_published).await
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.backend.delete_module(self.cookie, id).await
    }

    async fn reorder(&self, batch: &[OrderEntry]) -> Result<Vec<Module>, RemoteError> {
        self.backend
            .reorder_modules(self.cookie, self.course_id, batch)
            .await
    }
}

/// AssignmentRemote
///
/// The assignment counterpart of [`ModuleRemote`].
pub struct AssignmentRemote<'a> {
    backend: &'a dyn Backend,
    cookie: &'a SessionCookie,
    course_id: &'a str,
}

impl<'a> AssignmentRemote<'a> {
    pub fn new(backend: &'a dyn Backend, cookie: &'a SessionCookie, course_id: &'a str) -> Self {
        Self {
            backend,
            cookie,
            course_id,
        }
    }
}

#[async_trait]
impl<'a> Remote<Assignment> for AssignmentRemote<'a> {
    async fn publish(&self, id: &str, is_published: bool) -> Result<Assignment, RemoteError> {
        self.backend
            .publish_assignment(self.cookie, id, is_published)
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.backend.delete_assignment(self.cookie, id).await
    }

    async fn reorder(&self, batch: &[OrderEntry]) -> Result<Vec<Assignment>, RemoteError> {
        self.backend
            .reorder_assignments(self.cookie, self.course_id, batch)
            .await
    }
}
