//! Route protection for course resources.
//!
//! [`AccessGate::decide`] is a pure function of its inputs: the caller supplies the session,
//! the enrollment list and the requested path, and gets back an [`AccessDecision`]. It does no
//! I/O, which is what lets the route guard, the tests and any other host share one policy.

use serde::{Deserialize, Serialize};

use crate::{
    error::PathError,
    models::{Enrollment, Role, Session},
};

/// Where unauthenticated navigation is sent.
pub const SIGNIN_PATH: &str = "/signin";
/// Where authenticated but unauthorized navigation is sent.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// The segment that introduces a course identifier. Matched exactly, as the front end spells it.
const COURSES_SEGMENT: &str = "Courses";

/// Sub-route names that can never be a course identifier. Matched case-insensitively.
pub const RESERVED_SEGMENTS: [&str; 4] = ["home", "modules", "assignments", "people"];

/// CourseRef
///
/// A course-scoped path decomposed into the course it targets and the sub-resource that
/// follows the course identifier, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRef {
    pub course_id: String,
    pub sub_resource: Option<String>,
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

fn is_reserved(segment: &str) -> bool {
    RESERVED_SEGMENTS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(segment))
}

/// Returns the segments that follow the `Courses` segment, or `None` when the path has no
/// such segment.
fn after_courses(path: &str) -> Option<Vec<&str>> {
    let mut iter = segments(path);
    iter.by_ref().find(|segment| *segment == COURSES_SEGMENT)?;
    Some(iter.collect())
}

/// A path is course-scoped when a `Courses` segment is followed by at least one more segment.
/// `/Kambaz/Courses` on its own is the course listing and is not scoped.
pub fn is_course_scoped(path: &str) -> bool {
    after_courses(path).is_some_and(|rest| !rest.is_empty())
}

/// parse_course_ref
///
/// `Ok(None)` for paths that are not course-scoped. For scoped paths the course identifier is
/// the first segment after `Courses` that is not a reserved keyword; if every remaining segment
/// is reserved the reference is malformed.
pub fn parse_course_ref(path: &str) -> Result<Option<CourseRef>, PathError> {
    let rest = match after_courses(path) {
        Some(rest) if !rest.is_empty() => rest,
        _ => return Ok(None),
    };

    let position = rest
        .iter()
        .position(|segment| !is_reserved(segment))
        .ok_or_else(|| PathError::MissingCourseId(path.to_string()))?;

    Ok(Some(CourseRef {
        course_id: rest[position].to_string(),
        sub_resource: rest.get(position + 1).map(|segment| segment.to_string()),
    }))
}

/// UnlistedRolePolicy
///
/// How roles other than ADMIN, FACULTY and STUDENT (USER, TA) are treated on course-scoped
/// paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnlistedRolePolicy {
    /// Same enrollment check as students.
    #[default]
    RequireEnrollment,
    /// No check at all.
    Allow,
}

impl UnlistedRolePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "require-enrollment" | "require_enrollment" => Some(Self::RequireEnrollment),
            "allow" => Some(Self::Allow),
            _ => None,
        }
    }
}

/// DenyReason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DenyReason {
    /// No session at all.
    AuthenticationRequired,
    /// Signed in, but not enrolled in the requested course.
    NotEnrolled,
    /// The path looked course-scoped but no course identifier could be extracted.
    MalformedReference,
}

/// AccessDecision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Redirect {
        target: String,
        reason: DenyReason,
    },
}

impl AccessDecision {
    fn redirect(target: &str, reason: DenyReason) -> Self {
        AccessDecision::Redirect {
            target: target.to_string(),
            reason,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            AccessDecision::Allow => None,
            AccessDecision::Redirect { target, .. } => Some(target),
        }
    }
}

/// AccessGate
///
/// Holds the only configurable part of the policy. Everything else is fixed:
/// no session redirects to sign-in, faculty and admins bypass enrollment, students need an
/// enrollment in the course they navigate to.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGate {
    unlisted_roles: UnlistedRolePolicy,
}

impl AccessGate {
    pub fn new(unlisted_roles: UnlistedRolePolicy) -> Self {
        Self { unlisted_roles }
    }

    pub fn unlisted_role_policy(&self) -> UnlistedRolePolicy {
        self.unlisted_roles
    }

    fn requires_enrollment(&self, role: Role) -> bool {
        match role {
            Role::Admin | Role::Faculty => false,
            Role::Student => true,
            Role::Ta | Role::User => self.unlisted_roles == UnlistedRolePolicy::RequireEnrollment,
        }
    }

    /// Whether the decision for this navigation depends on the enrollment list. Hosts use this
    /// to skip fetching enrollments for faculty, admins and non-course paths.
    pub fn needs_enrollments(&self, session: Option<&Session>, path: &str) -> bool {
        match session {
            Some(session) => self.requires_enrollment(session.role) && is_course_scoped(path),
            None => false,
        }
    }

    /// decide
    ///
    /// Evaluates one navigation. Enrollment rows with an empty user or course id are ignored.
    pub fn decide(
        &self,
        session: Option<&Session>,
        enrollments: &[Enrollment],
        path: &str,
    ) -> AccessDecision {
        let Some(session) = session else {
            return AccessDecision::redirect(SIGNIN_PATH, DenyReason::AuthenticationRequired);
        };

        if !is_course_scoped(path) || !self.requires_enrollment(session.role) {
            return AccessDecision::Allow;
        }

        let course = match parse_course_ref(path) {
            Ok(Some(course)) => course,
            // Scoped paths always parse to Some or Err; treat anything else as malformed too.
            Ok(None) | Err(_) => {
                return AccessDecision::redirect(DASHBOARD_PATH, DenyReason::MalformedReference);
            }
        };

        let enrolled = enrollments.iter().any(|enrollment| {
            !enrollment.user_id.is_empty()
                && !enrollment.course_id.is_empty()
                && enrollment.user_id == session.user_id
                && enrollment.course_id == course.course_id
        });

        if enrolled {
            AccessDecision::Allow
        } else {
            AccessDecision::redirect(DASHBOARD_PATH, DenyReason::NotEnrolled)
        }
    }
}

/// Evaluates a navigation with the default policy.
pub fn decide(session: Option<&Session>, enrollments: &[Enrollment], path: &str) -> AccessDecision {
    AccessGate::default().decide(session, enrollments, path)
}
