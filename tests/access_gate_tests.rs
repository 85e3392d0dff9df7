use kambaz_portal::{
    AccessDecision, AccessGate,
    access::{
        self, CourseRef, DASHBOARD_PATH, DenyReason, SIGNIN_PATH, UnlistedRolePolicy,
        is_course_scoped, parse_course_ref,
    },
    error::PathError,
    models::{Enrollment, Role, Session},
};

// --- TEST UTILITIES ---

fn session(user_id: &str, role: Role) -> Session {
    Session {
        user_id: user_id.to_string(),
        role,
    }
}

fn enrolled(user_id: &str, course_id: &str) -> Enrollment {
    Enrollment {
        user_id: user_id.to_string(),
        course_id: course_id.to_string(),
    }
}

fn redirect(target: &str, reason: DenyReason) -> AccessDecision {
    AccessDecision::Redirect {
        target: target.to_string(),
        reason,
    }
}

// --- PATH PARSING ---

#[test]
fn test_course_scoped_requires_identifier_after_courses() {
    assert!(is_course_scoped("/Kambaz/Courses/RS101/Home"));
    assert!(is_course_scoped("/Kambaz/Courses/RS101"));
    assert!(!is_course_scoped("/Kambaz/Courses"));
    assert!(!is_course_scoped("/Kambaz/Courses/"));
    assert!(!is_course_scoped("/Kambaz/Dashboard"));
    // The `Courses` segment is matched exactly.
    assert!(!is_course_scoped("/dashboard/courses/RS101/enrollment"));
}

#[test]
fn test_parse_course_ref_extracts_id_and_sub_resource() {
    assert_eq!(
        parse_course_ref("/Kambaz/Courses/RS101/Modules"),
        Ok(Some(CourseRef {
            course_id: "RS101".to_string(),
            sub_resource: Some("Modules".to_string()),
        }))
    );
    assert_eq!(
        parse_course_ref("/Kambaz/Courses/RS101"),
        Ok(Some(CourseRef {
            course_id: "RS101".to_string(),
            sub_resource: None,
        }))
    );
    assert_eq!(parse_course_ref("/Kambaz/Account/Profile"), Ok(None));
}

#[test]
fn test_parse_course_ref_skips_reserved_segments_case_insensitively() {
    let course = parse_course_ref("/Kambaz/Courses/HOME/RS202/Assignments")
        .unwrap()
        .unwrap();
    assert_eq!(course.course_id, "RS202");
    assert_eq!(course.sub_resource.as_deref(), Some("Assignments"));
}

#[test]
fn test_parse_course_ref_all_reserved_is_malformed() {
    let path = "/Kambaz/Courses/Modules/people";
    assert_eq!(
        parse_course_ref(path),
        Err(PathError::MissingCourseId(path.to_string()))
    );
}

// --- DECISIONS ---

#[test]
fn test_no_session_always_redirects_to_signin() {
    for path in ["/dashboard", "/Kambaz/Courses/RS101/Home", "/profile", "/"] {
        assert_eq!(
            access::decide(None, &[], path),
            redirect(SIGNIN_PATH, DenyReason::AuthenticationRequired),
            "path {}",
            path
        );
    }
}

#[test]
fn test_faculty_and_admin_bypass_enrollment() {
    for role in [Role::Faculty, Role::Admin] {
        let decision = access::decide(Some(&session("u1", role)), &[], "/Kambaz/Courses/RS101/Modules");
        assert!(decision.is_allowed(), "{:?} should bypass enrollment", role);
    }
}

#[test]
fn test_student_enrolled_is_allowed() {
    let student = session("u1", Role::Student);
    let enrollments = vec![enrolled("u2", "RS101"), enrolled("u1", "RS101")];

    let decision = access::decide(Some(&student), &enrollments, "/Kambaz/Courses/RS101/Modules");

    assert_eq!(decision, AccessDecision::Allow);
}

#[test]
fn test_student_not_enrolled_redirects_to_dashboard() {
    let student = session("u1", Role::Student);
    // Enrolled elsewhere, and someone else is enrolled in the target course.
    let enrollments = vec![enrolled("u1", "RS102"), enrolled("u2", "RS101")];

    let decision = access::decide(Some(&student), &enrollments, "/Kambaz/Courses/RS101/Home");

    assert_eq!(decision, redirect(DASHBOARD_PATH, DenyReason::NotEnrolled));
    assert_eq!(decision.redirect_target(), Some(DASHBOARD_PATH));
}

#[test]
fn test_student_non_course_paths_are_allowed() {
    let student = session("u1", Role::Student);
    assert!(access::decide(Some(&student), &[], "/dashboard").is_allowed());
    assert!(access::decide(Some(&student), &[], "/Kambaz/Courses").is_allowed());
}

#[test]
fn test_malformed_course_reference_is_denied_not_allowed() {
    let student = session("u1", Role::Student);
    let enrollments = vec![enrolled("u1", "Home")];

    let decision = access::decide(Some(&student), &enrollments, "/Kambaz/Courses/Home");

    assert_eq!(decision, redirect(DASHBOARD_PATH, DenyReason::MalformedReference));
}

#[test]
fn test_enrollments_with_empty_ids_are_ignored() {
    let student = session("", Role::Student);
    let enrollments = vec![enrolled("", "RS101")];

    let decision = access::decide(Some(&student), &enrollments, "/Kambaz/Courses/RS101/Home");

    assert_eq!(decision, redirect(DASHBOARD_PATH, DenyReason::NotEnrolled));
}

#[test]
fn test_decision_ignores_enrollment_order() {
    let student = session("u1", Role::Student);
    let mut enrollments = vec![
        enrolled("u3", "RS103"),
        enrolled("u1", "RS101"),
        enrolled("u2", "RS101"),
    ];
    let path = "/Kambaz/Courses/RS101/Assignments";

    let first = access::decide(Some(&student), &enrollments, path);
    enrollments.reverse();
    let second = access::decide(Some(&student), &enrollments, path);

    assert_eq!(first, second);
    assert!(first.is_allowed());
}

// --- UNLISTED ROLES ---

#[test]
fn test_unlisted_roles_require_enrollment_by_default() {
    let gate = AccessGate::default();
    assert_eq!(gate.unlisted_role_policy(), UnlistedRolePolicy::RequireEnrollment);

    for role in [Role::Ta, Role::User] {
        let who = session("u9", role);
        assert_eq!(
            gate.decide(Some(&who), &[], "/Kambaz/Courses/RS101/Home"),
            redirect(DASHBOARD_PATH, DenyReason::NotEnrolled)
        );
        assert!(
            gate.decide(Some(&who), &[enrolled("u9", "RS101")], "/Kambaz/Courses/RS101/Home")
                .is_allowed()
        );
    }
}

#[test]
fn test_unlisted_roles_allowed_when_configured() {
    let gate = AccessGate::new(UnlistedRolePolicy::Allow);
    let ta = session("u9", Role::Ta);

    assert!(gate.decide(Some(&ta), &[], "/Kambaz/Courses/RS101/Home").is_allowed());
    // Students are unaffected by the policy.
    let student = session("u1", Role::Student);
    assert!(!gate.decide(Some(&student), &[], "/Kambaz/Courses/RS101/Home").is_allowed());
}

#[test]
fn test_needs_enrollments_only_for_checked_roles_on_scoped_paths() {
    let gate = AccessGate::default();
    let student = session("u1", Role::Student);
    let faculty = session("u2", Role::Faculty);

    assert!(gate.needs_enrollments(Some(&student), "/Kambaz/Courses/RS101/Home"));
    assert!(!gate.needs_enrollments(Some(&student), "/dashboard"));
    assert!(!gate.needs_enrollments(Some(&faculty), "/Kambaz/Courses/RS101/Home"));
    assert!(!gate.needs_enrollments(None, "/Kambaz/Courses/RS101/Home"));
    assert!(
        !AccessGate::new(UnlistedRolePolicy::Allow)
            .needs_enrollments(Some(&session("u3", Role::Ta)), "/Kambaz/Courses/RS101/Home")
    );
}

#[test]
fn test_unlisted_role_policy_parse() {
    assert_eq!(UnlistedRolePolicy::parse("allow"), Some(UnlistedRolePolicy::Allow));
    assert_eq!(UnlistedRolePolicy::parse(" ALLOW "), Some(UnlistedRolePolicy::Allow));
    assert_eq!(
        UnlistedRolePolicy::parse("require-enrollment"),
        Some(UnlistedRolePolicy::RequireEnrollment)
    );
    assert_eq!(UnlistedRolePolicy::parse("deny"), None);
}
