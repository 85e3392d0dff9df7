use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
};

use crate::{
    api::{BackendState, SessionCookie},
    error::RemoteError,
    models::Session,
};

/// resolve_session
///
/// Resolves the caller's session by forwarding their cookie to `GET /api/users/profile`.
///
/// No cookie, or a 401/403 from the backend, is an ordinary "no session" (`Ok(None)`).
/// Any other failure means the backend could not answer and is returned as an error.
pub async fn resolve_session(
    backend: &BackendState,
    cookie: &SessionCookie,
) -> Result<Option<Session>, RemoteError> {
    if !cookie.is_present() {
        return Ok(None);
    }

    match backend.profile(cookie).await {
        Ok(user) => Ok(Some(Session::from(&user))),
        Err(e) if e.is_unauthenticated() => Ok(None),
        Err(e) => Err(e),
    }
}

/// SessionUser Extractor Result
///
/// The resolved identity of a request, together with the cookie that proved it. Handlers
/// take this as an argument and forward `cookie` on every backend call they make.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub session: Session,
    pub cookie: SessionCookie,
}

/// SessionUser Extractor Implementation
///
/// Behind the route guard the session is already in the request extensions and is reused.
/// Elsewhere it is resolved from the cookie.
///
/// Rejection: 401 when there is no session, 502 when the backend could not be asked.
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    BackendState: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookie = SessionCookie::from_headers(&parts.headers);

        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(SessionUser {
                session: session.clone(),
                cookie,
            });
        }

        let backend = BackendState::from_ref(state);
        match resolve_session(&backend, &cookie).await {
            Ok(Some(session)) => Ok(SessionUser { session, cookie }),
            Ok(None) => Err(StatusCode::UNAUTHORIZED),
            Err(e) => {
                tracing::error!("session resolution failed: {:?}", e);
                Err(StatusCode::BAD_GATEWAY)
            }
        }
    }
}
