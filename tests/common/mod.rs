#![allow(dead_code)]

use async_trait::async_trait;
use kambaz_portal::{
    AppConfig, AppState, SessionCookie,
    api::{Backend, SignedIn},
    error::RemoteError,
    models::{
        Assignment, AssignmentUpdate, Course, Credentials, Enrollment, GradeRequest, Lesson,
        Module, ModuleUpdate, NewCourse, OrderEntry, ProfileUpdate, Role, Submission,
        SubmissionRequest, User,
    },
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

// --- MOCK BACKEND ---

// In-memory stand-in for the LMS REST backend. Sessions are keyed by the raw Cookie header
// value; an unknown cookie is a 401, exactly like the real backend.
pub struct MockBackend {
    pub sessions: HashMap<String, User>,
    pub enrollments: Vec<Enrollment>,
    pub courses: Vec<Course>,
    pub modules: Mutex<Vec<Module>>,
    pub assignments: Mutex<Vec<Assignment>>,

    // When set, every publish/delete/reorder call fails with this status and message.
    pub fail_mutations: Option<(u16, String)>,
    // When true, profile resolution fails with a 500.
    pub outage: bool,
    // Server-side override applied to every publish reply (simulates the backend disagreeing).
    pub publish_override: Option<bool>,

    // Every call, recorded as "method:arg".
    pub calls: Mutex<Vec<String>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        let mut sessions = HashMap::new();
        sessions.insert(STUDENT_COOKIE.to_string(), user("u-student", Role::Student));
        sessions.insert(FACULTY_COOKIE.to_string(), user("u-faculty", Role::Faculty));
        sessions.insert(ADMIN_COOKIE.to_string(), user("u-admin", Role::Admin));
        sessions.insert(TA_COOKIE.to_string(), user("u-ta", Role::Ta));

        MockBackend {
            sessions,
            enrollments: vec![enrollment("u-student", "RS101"), enrollment("u-ta", "RS101")],
            courses: vec![course("RS101"), course("RS102")],
            modules: Mutex::new(vec![
                module("M1", "RS101", 1, true),
                module("M2", "RS101", 2, false),
                module("M3", "RS101", 3, true),
                module("M9", "RS102", 1, true),
            ]),
            assignments: Mutex::new(vec![
                assignment("A1", "RS101", 1, true),
                assignment("A2", "RS101", 2, false),
            ]),
            fail_mutations: None,
            outage: false,
            publish_override: None,
            calls: Mutex::new(vec![]),
        }
    }
}

impl MockBackend {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .any(|call| call.starts_with(prefix))
    }

    fn user_for(&self, cookie: &SessionCookie) -> Result<User, RemoteError> {
        cookie
            .value()
            .and_then(|value| self.sessions.get(value))
            .cloned()
            .ok_or(RemoteError::Status {
                status: 401,
                message: Some("Unauthorized".to_string()),
            })
    }

    fn mutation_failure(&self) -> Result<(), RemoteError> {
        match &self.fail_mutations {
            Some((status, message)) => Err(RemoteError::Status {
                status: *status,
                message: Some(message.clone()),
            }),
            None => Ok(()),
        }
    }

    fn not_found() -> RemoteError {
        RemoteError::Status {
            status: 404,
            message: Some("Not found".to_string()),
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignedIn, RemoteError> {
        self.record(format!("sign_in:{}", credentials.username));
        let cookie = match credentials.username.as_str() {
            "faculty" => FACULTY_COOKIE,
            "student" if credentials.password == "secret" => STUDENT_COOKIE,
            _ => {
                return Err(RemoteError::Status {
                    status: 401,
                    message: Some("Invalid credentials".to_string()),
                });
            }
        };
        Ok(SignedIn {
            user: self.sessions[cookie].clone(),
            set_cookie: vec![format!("{}; Path=/; HttpOnly", cookie)],
        })
    }

    async fn sign_out(&self, _cookie: &SessionCookie) -> Result<(), RemoteError> {
        self.record("sign_out".to_string());
        Ok(())
    }

    async fn profile(&self, cookie: &SessionCookie) -> Result<User, RemoteError> {
        self.record("profile".to_string());
        if self.outage {
            return Err(RemoteError::Status {
                status: 500,
                message: None,
            });
        }
        self.user_for(cookie)
    }

    async fn update_user(
        &self,
        cookie: &SessionCookie,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<User, RemoteError> {
        self.record(format!("update_user:{}", user_id));
        let mut user = self.user_for(cookie)?;
        if let Some(first_name) = &update.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(email) = &update.email {
            user.email = email.clone();
        }
        Ok(user)
    }

    async fn enrollments(
        &self,
        _cookie: &SessionCookie,
        user_id: &str,
    ) -> Result<Vec<Enrollment>, RemoteError> {
        self.record(format!("enrollments:{}", user_id));
        Ok(self
            .enrollments
            .iter()
            .filter(|enrollment| enrollment.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn courses(&self, _cookie: &SessionCookie) -> Result<Vec<Course>, RemoteError> {
        self.record("courses".to_string());
        Ok(self.courses.clone())
    }

    async fn course(&self, _cookie: &SessionCookie, course_id: &str) -> Result<Course, RemoteError> {
        self.record(format!("course:{}", course_id));
        self.courses
            .iter()
            .find(|course| course.id == course_id)
            .cloned()
            .ok_or_else(Self::not_found)
    }

    async fn create_course(
        &self,
        _cookie: &SessionCookie,
        new_course: &NewCourse,
    ) -> Result<Course, RemoteError> {
        self.record(format!("create_course:{}", new_course.name));
        Ok(Course {
            id: "RS999".to_string(),
            name: new_course.name.clone(),
            ..Course::default()
        })
    }

    async fn update_course(
        &self,
        _cookie: &SessionCookie,
        course_id: &str,
        update: &NewCourse,
    ) -> Result<Course, RemoteError> {
        self.record(format!("update_course:{}", course_id));
        Ok(Course {
            id: course_id.to_string(),
            name: update.name.clone(),
            ..Course::default()
        })
    }

    async fn delete_course(&self, _cookie: &SessionCookie, course_id: &str) -> Result<(), RemoteError> {
        self.record(format!("delete_course:{}", course_id));
        Ok(())
    }

    async fn enroll(&self, cookie: &SessionCookie, course_id: &str) -> Result<Enrollment, RemoteError> {
        self.record(format!("enroll:{}", course_id));
        let user = self.user_for(cookie)?;
        Ok(enrollment(&user.id, course_id))
    }

    async fn unenroll(&self, _cookie: &SessionCookie, course_id: &str) -> Result<(), RemoteError> {
        self.record(format!("unenroll:{}", course_id));
        Ok(())
    }

    async fn modules(&self, _cookie: &SessionCookie, course_id: &str) -> Result<Vec<Module>, RemoteError> {
        self.record(format!("modules:{}", course_id));
        Ok(self
            .modules
            .lock()
            .unwrap()
            .iter()
            .filter(|module| module.course == course_id)
            .cloned()
            .collect())
    }

    async fn module(&self, _cookie: &SessionCookie, module_id: &str) -> Result<Module, RemoteError> {
        self.record(format!("module:{}", module_id));
        self.modules
            .lock()
            .unwrap()
            .iter()
            .find(|module| module.id == module_id)
            .cloned()
            .ok_or_else(Self::not_found)
    }

    async fn create_module(
        &self,
        _cookie: &SessionCookie,
        course_id: &str,
        update: &ModuleUpdate,
    ) -> Result<Module, RemoteError> {
        self.record(format!("create_module:{}", course_id));
        let module = Module {
            id: "M-new".to_string(),
            name: update.name.clone(),
            course: course_id.to_string(),
            ..Module::default()
        };
        self.modules.lock().unwrap().push(module.clone());
        Ok(module)
    }

    async fn update_module(
        &self,
        _cookie: &SessionCookie,
        module_id: &str,
        update: &ModuleUpdate,
    ) -> Result<Module, RemoteError> {
        self.record(format!("update_module:{}", module_id));
        let mut modules = self.modules.lock().unwrap();
        let module = modules
            .iter_mut()
            .find(|module| module.id == module_id)
            .ok_or_else(Self::not_found)?;
        module.name = update.name.clone();
        Ok(module.clone())
    }

    async fn delete_module(&self, _cookie: &SessionCookie, module_id: &str) -> Result<(), RemoteError> {
        self.record(format!("delete_module:{}", module_id));
        self.mutation_failure()?;
        self.modules
            .lock()
            .unwrap()
            .retain(|module| module.id != module_id);
        Ok(())
    }

    async fn publish_module(
        &self,
        _cookie: &SessionCookie,
        module_id: &str,
        is_published: bool,
    ) -> Result<Module, RemoteError> {
        self.record(format!("publish_module:{}:{}", module_id, is_published));
        self.mutation_failure()?;
        let mut modules = self.modules.lock().unwrap();
        let module = modules
            .iter_mut()
            .find(|module| module.id == module_id)
            .ok_or_else(Self::not_found)?;
        module.is_published = self.publish_override.unwrap_or(is_published);
        Ok(module.clone())
    }

    async fn reorder_modules(
        &self,
        _cookie: &SessionCookie,
        course_id: &str,
        batch: &[OrderEntry],
    ) -> Result<Vec<Module>, RemoteError> {
        self.record(format!("reorder_modules:{}", course_id));
        self.mutation_failure()?;
        let mut modules = self.modules.lock().unwrap();
        for entry in batch {
            if let Some(module) = modules.iter_mut().find(|module| module.id == entry.id) {
                module.order = entry.order;
            }
        }
        let mut list: Vec<Module> = modules
            .iter()
            .filter(|module| module.course == course_id)
            .cloned()
            .collect();
        list.sort_by_key(|module| module.order);
        Ok(list)
    }

    async fn assignments(
        &self,
        _cookie: &SessionCookie,
        course_id: &str,
    ) -> Result<Vec<Assignment>, RemoteError> {
        self.record(format!("assignments:{}", course_id));
        Ok(self
            .assignments
            .lock()
            .unwrap()
            .iter()
            .filter(|assignment| assignment.course == course_id)
            .cloned()
            .collect())
    }

    async fn assignment(
        &self,
        _cookie: &SessionCookie,
        assignment_id: &str,
    ) -> Result<Assignment, RemoteError> {
        self.record(format!("assignment:{}", assignment_id));
        self.assignments
            .lock()
            .unwrap()
            .iter()
            .find(|assignment| assignment.id == assignment_id)
            .cloned()
            .ok_or_else(Self::not_found)
    }

    async fn create_assignment(
        &self,
        _cookie: &SessionCookie,
        course_id: &str,
        update: &AssignmentUpdate,
    ) -> Result<Assignment, RemoteError> {
        self.record(format!("create_assignment:{}", course_id));
        Ok(Assignment {
            id: "A-new".to_string(),
            title: update.title.clone(),
            course: course_id.to_string(),
            ..Assignment::default()
        })
    }

    async fn update_assignment(
        &self,
        _cookie: &SessionCookie,
        assignment_id: &str,
        update: &AssignmentUpdate,
    ) -> Result<Assignment, RemoteError> {
        self.record(format!("update_assignment:{}", assignment_id));
        Ok(Assignment {
            id: assignment_id.to_string(),
            title: update.title.clone(),
            ..Assignment::default()
        })
    }

    async fn delete_assignment(
        &self,
        _cookie: &SessionCookie,
        assignment_id: &str,
    ) -> Result<(), RemoteError> {
        self.record(format!("delete_assignment:{}", assignment_id));
        self.mutation_failure()?;
        self.assignments
            .lock()
            .unwrap()
            .retain(|assignment| assignment.id != assignment_id);
        Ok(())
    }

    async fn publish_assignment(
        &self,
        _cookie: &SessionCookie,
        assignment_id: &str,
        is_published: bool,
    ) -> Result<Assignment, RemoteError> {
        self.record(format!("publish_assignment:{}:{}", assignment_id, is_published));
        self.mutation_failure()?;
        let mut assignments = self.assignments.lock().unwrap();
        let assignment = assignments
            .iter_mut()
            .find(|assignment| assignment.id == assignment_id)
            .ok_or_else(Self::not_found)?;
        assignment.is_published = self.publish_override.unwrap_or(is_published);
        Ok(assignment.clone())
    }

    async fn reorder_assignments(
        &self,
        _cookie: &SessionCookie,
        course_id: &str,
        batch: &[OrderEntry],
    ) -> Result<Vec<Assignment>, RemoteError> {
        self.record(format!("reorder_assignments:{}", course_id));
        self.mutation_failure()?;
        let mut assignments = self.assignments.lock().unwrap();
        for entry in batch {
            if let Some(assignment) = assignments.iter_mut().find(|a| a.id == entry.id) {
                assignment.order = entry.order;
            }
        }
        let mut list: Vec<Assignment> = assignments
            .iter()
            .filter(|assignment| assignment.course == course_id)
            .cloned()
            .collect();
        list.sort_by_key(|assignment| assignment.order);
        Ok(list)
    }

    async fn submit(
        &self,
        cookie: &SessionCookie,
        assignment_id: &str,
        submission: &SubmissionRequest,
    ) -> Result<Submission, RemoteError> {
        self.record(format!("submit:{}", assignment_id));
        let user = self.user_for(cookie)?;
        Ok(Submission {
            id: "S1".to_string(),
            assignment: assignment_id.to_string(),
            user: user.id,
            content: submission.content.clone(),
            ..Submission::default()
        })
    }

    async fn update_submission(
        &self,
        _cookie: &SessionCookie,
        submission_id: &str,
        submission: &SubmissionRequest,
    ) -> Result<Submission, RemoteError> {
        self.record(format!("update_submission:{}", submission_id));
        Ok(Submission {
            id: submission_id.to_string(),
            content: submission.content.clone(),
            ..Submission::default()
        })
    }

    async fn grade_submission(
        &self,
        _cookie: &SessionCookie,
        submission_id: &str,
        grade: &GradeRequest,
    ) -> Result<Submission, RemoteError> {
        self.record(format!("grade_submission:{}", submission_id));
        Ok(Submission {
            id: submission_id.to_string(),
            grade: Some(grade.grade),
            feedback: Some(grade.feedback.clone()),
            ..Submission::default()
        })
    }
}

// --- TEST UTILITIES ---

pub const STUDENT_COOKIE: &str = "session=student";
pub const FACULTY_COOKIE: &str = "session=faculty";
pub const ADMIN_COOKIE: &str = "session=admin";
pub const TA_COOKIE: &str = "session=ta";

pub fn user(id: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        username: id.to_string(),
        role,
        ..User::default()
    }
}

pub fn enrollment(user_id: &str, course_id: &str) -> Enrollment {
    Enrollment {
        user_id: user_id.to_string(),
        course_id: course_id.to_string(),
    }
}

pub fn course(id: &str) -> Course {
    Course {
        id: id.to_string(),
        name: format!("Course {}", id),
        ..Course::default()
    }
}

pub fn module(id: &str, course: &str, order: i32, is_published: bool) -> Module {
    Module {
        id: id.to_string(),
        name: format!("Module {}", id),
        course: course.to_string(),
        order,
        is_published,
        lessons: vec![Lesson {
            id: format!("{}-L1", id),
            name: "Intro".to_string(),
            description: String::new(),
        }],
        ..Module::default()
    }
}

pub fn assignment(id: &str, course: &str, order: i32, is_published: bool) -> Assignment {
    Assignment {
        id: id.to_string(),
        title: format!("Assignment {}", id),
        course: course.to_string(),
        points: 100,
        order,
        is_published,
        ..Assignment::default()
    }
}

pub fn create_test_state(backend: MockBackend) -> (AppState, Arc<MockBackend>) {
    let backend = Arc::new(backend);
    let state = AppState::new(backend.clone(), AppConfig::default());
    (state, backend)
}
