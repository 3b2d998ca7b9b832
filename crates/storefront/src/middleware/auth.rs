//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a signed-in user (or an admin) in route
//! handlers. An expired access token is refreshed before the handler runs.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// If the visitor is not logged in, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireUser(user): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.greeting_name())
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

/// Extractor that requires a signed-in user with the admin role.
///
/// Anonymous visitors are sent to the login page; signed-in customers get 403.
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when a route needs a user the request does not have.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// The backend no longer accepts the user's tokens.
    SessionExpired,
    /// Signed in, but not allowed here.
    Forbidden,
    /// Session layer missing.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::SessionExpired => Redirect::to("/auth/login?error=session").into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Forbidden: this page is for store administrators",
            )
                .into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

async fn current_user(
    parts: &Parts,
    state: &AppState,
) -> Result<Option<CurrentUser>, AuthRejection> {
    // Get the session from extensions (set by SessionManagerLayer)
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;

    let Some(user) = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
    else {
        return Ok(None);
    };

    if !user.is_expired() {
        return Ok(Some(user));
    }
    refresh_user(state, session, user)
        .await
        .map(Some)
        .ok_or(AuthRejection::SessionExpired)
}

/// Swap the user's expired access token for a new one.
///
/// Returns `None` (and signs the user out) when the backend refuses the
/// refresh token. Transport failures keep the stale user.
async fn refresh_user(
    state: &AppState,
    session: &Session,
    mut user: CurrentUser,
) -> Option<CurrentUser> {
    let Some(refresh_token) = user.refresh_token() else {
        sign_out_expired(session, &user).await;
        return None;
    };

    let refreshed = state.backend().refresh_session(refresh_token).await;
    match refreshed {
        Ok(auth) => {
            user.apply_refresh(&auth);
            if let Err(e) = session.insert(session_keys::CURRENT_USER, &user).await {
                tracing::warn!(error = %e, "Failed to store refreshed token");
            }
            tracing::debug!(user_id = %user.id, "Access token refreshed");
            Some(user)
        }
        Err(e) if e.is_unauthorized() => {
            tracing::info!(user_id = %user.id, error = %e, "Refresh token refused");
            sign_out_expired(session, &user).await;
            None
        }
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "Token refresh failed");
            Some(user)
        }
    }
}

async fn sign_out_expired(session: &Session, user: &CurrentUser) {
    if let Err(e) = clear_current_user(session).await {
        tracing::warn!(user_id = %user.id, error = %e, "Failed to clear expired user");
    }
}

impl<S> FromRequestParts<S> for RequireUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        current_user(parts, &state)
            .await?
            .map(Self)
            .ok_or(AuthRejection::RedirectToLogin)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let user = current_user(parts, &state)
            .await?
            .ok_or(AuthRejection::RedirectToLogin)?;

        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Non-admin denied");
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireUser`, this does not reject the request if the visitor is
/// not logged in.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(Self(current_user(parts, &state).await.ok().flatten()))
    }
}

/// Helper to set the current user in the session.
///
/// Cycles the session id first so a pre-login session id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// The bag and wishlist stay with the visitor.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
