/// Router Module Index
///
/// Splits the BFF's routes by how they are guarded. Public routes carry no guard. The other
/// two modules are wrapped in the access guard by `create_router`: authenticated routes only
/// need a session, course routes additionally need an enrollment for students.

/// Sign-in, sign-out and health. Reachable without a session.
pub mod public;

/// Dashboard, course catalogue and profile. Requires a session.
pub mod authenticated;

/// Everything under `/Kambaz/Courses/{cid}/`. Requires a session and, for students,
/// an enrollment in `{cid}`.
pub mod courses;
