//! Authentication route handlers.
//!
//! Handles password login and registration, federated login through the
//! backend's identity provider (PKCE), and logout. Failures redirect back to
//! the form with `?error=<code>`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalUser, Page, clear_current_user, set_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::services::auth::Registration;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Query parameters of the identity provider's redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for a session.
    pub code: Option<String>,
    /// Error code if authorization failed.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

/// Text for an `?error=` code on the auth pages.
#[must_use]
pub fn error_message(code: &str) -> &'static str {
    match code {
        "invalid_email" => "Please enter a valid email address.",
        "invalid_credentials" => "Email or password is incorrect.",
        "email_not_confirmed" => "Please confirm your email address, then sign in.",
        "user_exists" => "An account with this email already exists.",
        "weak_password" => "Please choose a password of at least 8 characters.",
        "password_mismatch" => "The passwords do not match.",
        "provider" => "That sign-in option is not available.",
        "oauth_denied" => "Sign-in was cancelled.",
        "missing_code" | "session" => "Your sign-in session expired. Please try again.",
        "rate_limited" => "Too many attempts. Please wait a moment and try again.",
        _ => "Something went wrong. Please try again.",
    }
}

/// Text for a `?success=` code on the auth pages.
fn success_message(code: &str) -> Option<&'static str> {
    match code {
        "confirmed" => Some("Your email is confirmed. You can sign in now."),
        _ => None,
    }
}

// =============================================================================
// Templates
// =============================================================================

/// A federated login button.
#[derive(Clone)]
pub struct ProviderLink {
    pub href: String,
    pub label: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: Page,
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
    pub providers: Vec<ProviderLink>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: Page,
    pub error: Option<&'static str>,
    pub providers: Vec<ProviderLink>,
}

/// Registration pending-confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register_pending.html")]
pub struct RegisterPendingTemplate {
    pub page: Page,
    pub email: String,
}

fn provider_links(state: &AppState) -> Vec<ProviderLink> {
    state
        .config()
        .backend
        .oauth_providers
        .iter()
        .map(|provider| {
            let mut label = provider.clone();
            if let Some(first) = label.get_mut(..1) {
                first.make_ascii_uppercase();
            }
            ProviderLink {
                href: format!("/auth/oauth/{}", urlencoding::encode(provider)),
                label: format!("Continue with {label}"),
            }
        })
        .collect()
}

/// Where to land after signing in.
fn landing_page(user: &CurrentUser) -> &'static str {
    if user.is_admin() { "/admin" } else { "/account" }
}

/// Store the user in the session and redirect to their landing page.
async fn complete_login(session: &Session, user: &CurrentUser, error_page: &str) -> Response {
    if let Err(e) = set_current_user(session, user).await {
        tracing::error!("Failed to set session: {}", e);
        return Redirect::to(&format!("{error_page}?error=session")).into_response();
    }

    set_sentry_user(&user.id, user.email.as_ref().map(|e| e.as_str()));
    tracing::info!(user_id = %user.id, role = %user.role, "User signed in");
    Redirect::to(landing_page(user)).into_response()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    page: Page,
    Query(query): Query<MessageQuery>,
) -> Response {
    if let Some(user) = user {
        return Redirect::to(landing_page(&user)).into_response();
    }

    LoginTemplate {
        page,
        error: query.error.as_deref().map(error_message),
        success: query.success.as_deref().and_then(success_message),
        providers: provider_links(&state),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match state
        .auth()
        .login_with_password(&form.email, &form.password)
        .await
    {
        Ok(user) => complete_login(&session, &user, "/auth/login").await,
        Err(e) => {
            tracing::warn!("Login failed: {}", e);
            Redirect::to(&format!("/auth/login?error={}", e.code())).into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    State(state): State<AppState>,
    page: Page,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    RegisterTemplate {
        page,
        error: query.error.as_deref().map(error_message),
        providers: provider_links(&state),
    }
}

/// Handle registration form submission.
///
/// Depending on the identity provider's settings the new account is signed in
/// right away or has to confirm its email first.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    page: Page,
    Form(form): Form<RegisterForm>,
) -> Response {
    if form.password != form.password_confirm {
        return Redirect::to("/auth/register?error=password_mismatch").into_response();
    }

    match state
        .auth()
        .register_with_password(&form.email, &form.password)
        .await
    {
        Ok(Registration::SignedIn(user)) => complete_login(&session, &user, "/auth/register").await,
        Ok(Registration::PendingConfirmation(email)) => {
            tracing::info!("Registration pending email confirmation");
            RegisterPendingTemplate {
                page,
                email: email.into_inner(),
            }
            .into_response()
        }
        Err(e) => {
            tracing::warn!("Registration failed: {}", e);
            Redirect::to(&format!("/auth/register?error={}", e.code())).into_response()
        }
    }
}

// =============================================================================
// Federated Login Routes
// =============================================================================

/// Start a federated login.
///
/// Keeps the PKCE verifier in the session and redirects to the provider.
#[instrument(skip(state, session))]
pub async fn oauth_start(
    State(state): State<AppState>,
    session: Session,
    Path(provider): Path<String>,
) -> Response {
    let redirect_to = format!("{}/auth/callback", state.config().base_url);
    let start = match state
        .auth()
        .start_oauth(&state.config().backend, &provider, &redirect_to)
    {
        Ok(start) => start,
        Err(e) => {
            tracing::warn!("Federated login refused: {}", e);
            return Redirect::to(&format!("/auth/login?error={}", e.code())).into_response();
        }
    };

    if let Err(e) = session
        .insert(session_keys::PKCE_VERIFIER, &start.code_verifier)
        .await
    {
        tracing::error!("Failed to store PKCE verifier in session: {}", e);
        return Redirect::to("/auth/login?error=session").into_response();
    }
    if let Err(e) = session.insert(session_keys::OAUTH_PROVIDER, &provider).await {
        tracing::error!("Failed to store OAuth provider in session: {}", e);
        return Redirect::to("/auth/login?error=session").into_response();
    }

    Redirect::to(&start.authorize_url).into_response()
}

/// Finish a federated login.
///
/// Exchanges the authorization code and the stored verifier for a session.
#[instrument(skip_all)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!("Federated login error: {} - {}", error, description);
        return Redirect::to("/auth/login?error=oauth_denied").into_response();
    }

    let Some(code) = query.code else {
        tracing::warn!("Federated login callback missing code");
        return Redirect::to("/auth/login?error=missing_code").into_response();
    };

    // One-time use
    let verifier: Option<String> = session
        .remove(session_keys::PKCE_VERIFIER)
        .await
        .ok()
        .flatten();
    let provider: Option<String> = session
        .remove(session_keys::OAUTH_PROVIDER)
        .await
        .ok()
        .flatten();

    let Some(verifier) = verifier else {
        tracing::warn!("Federated login callback without a stored verifier");
        return Redirect::to("/auth/login?error=session").into_response();
    };

    match state.auth().finish_oauth(&code, &verifier).await {
        Ok(user) => {
            tracing::info!(provider = provider.as_deref().unwrap_or("unknown"), "Federated login complete");
            complete_login(&session, &user, "/auth/login").await
        }
        Err(e) => {
            tracing::error!("Failed to exchange authorization code: {}", e);
            Redirect::to(&format!("/auth/login?error={}", e.code())).into_response()
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// Revokes the backend session (best effort) and forgets the user. The bag
/// and wishlist stay with the visitor.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    session: Session,
) -> Response {
    if let Some(user) = user {
        state.auth().logout(&user).await;
    }

    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();

    Redirect::to("/?notice=logged_out").into_response()
}
