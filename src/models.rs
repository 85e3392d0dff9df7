use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::mutator::Settlement;

// --- Identity & Session ---

/// Role
///
/// The RBAC field carried on every user profile. The backend spells roles in upper case;
/// any role string this client does not know deserializes as `USER`, the least privileged role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    Faculty,
    #[default]
    Student,
    Ta,
    #[serde(other)]
    User,
}

impl Role {
    /// Faculty and admins skip enrollment checks entirely and may author course content.
    pub fn bypasses_enrollment(self) -> bool {
        matches!(self, Role::Admin | Role::Faculty)
    }

    /// Whether this role may create, edit, publish, reorder or delete course content.
    pub fn can_author(self) -> bool {
        self.bypasses_enrollment()
    }
}

/// User
///
/// The profile record returned by `GET /api/users/profile` and `PUT /api/users/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<String>,
}

/// Session
///
/// The minimal identity the access gate reasons about. Derived from the resolved profile;
/// nothing in this crate mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Session {
            user_id: user.id.clone(),
            role: user.role,
        }
    }
}

/// Enrollment
///
/// A `(user, course)` membership pair. Equality and hashing cover both ids, which is what
/// gives enrollment lists their set semantics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Enrollment {
    #[serde(alias = "user")]
    pub user_id: String,
    #[serde(alias = "course")]
    pub course_id: String,
}

// --- Course Content ---

/// Course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Course {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub credits: u32,
    #[serde(default)]
    pub description: String,
    // Calendar dates as the backend stores them (e.g. "2024-01-10").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Lesson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Lesson {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Module
///
/// A publishable, orderable unit of course content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Module {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub course: String,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// Assignment
///
/// Dates are kept as the backend's local date-time strings (e.g. "2024-05-13T23:59").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Assignment {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub course: String,
    #[serde(default)]
    pub points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_until: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub order: i32,
}

/// Submission
///
/// A student's answer to an assignment, optionally graded by faculty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Submission {
    #[serde(alias = "_id")]
    pub id: String,
    pub assignment: String,
    pub user: String,
    #[serde(default)]
    pub content: String,
    #[ts(type = "string | null")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// Credentials
///
/// Sign-in payload. Passed through to the backend and never logged.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// PublishRequest
///
/// Body of `PUT /api/modules/{id}/publish` and `PUT /api/assignments/{id}/publish`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PublishRequest {
    pub is_published: bool,
}

/// OrderEntry
///
/// One element of a reorder batch. A batch always names every member of the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct OrderEntry {
    pub id: String,
    pub order: i32,
}

/// GradeRequest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct GradeRequest {
    pub grade: f64,
    #[serde(default)]
    pub feedback: String,
}

/// SubmissionRequest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SubmissionRequest {
    pub content: String,
}

/// NewCourse
///
/// Input payload for `POST /api/courses` and `PUT /api/courses/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewCourse {
    pub name: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub credits: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// ModuleUpdate
///
/// Create/update payload for modules. New modules start unpublished at the end of the list
/// unless the backend decides otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ModuleUpdate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// AssignmentUpdate
///
/// Create/update payload for assignments. Uses `Option<T>` with `skip_serializing_if`
/// so that only provided dates are sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AssignmentUpdate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_until: Option<String>,
}

/// ProfileUpdate
///
/// Partial update for `PUT /api/users/{id}`. Has no role field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

// --- View Schemas (Output) ---

/// CourseHome
///
/// Output schema for the course landing page.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CourseHome {
    pub course: Course,
    pub modules: Vec<Module>,
}

/// Dashboard
///
/// Output schema for `GET /dashboard`: the courses this session can see.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Dashboard {
    pub session: Session,
    pub courses: Vec<Course>,
}

/// MutationResult
///
/// Output of every optimistic mutation: how it settled, and the list as it now stands
/// (the restored list after a rollback).
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct MutationResult<T> {
    pub settlement: Settlement,
    pub items: Vec<T>,
}
