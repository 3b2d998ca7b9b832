//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;

use crate::filters;
use crate::middleware::{Page, RequireUser};

/// Profile display data for templates.
#[derive(Clone)]
pub struct ProfileView {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: String,
    pub provider: Option<String>,
    pub is_admin: bool,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub page: Page,
    pub profile: ProfileView,
}

/// Display the profile page.
///
/// The `RequireUser` extractor sends anonymous visitors to the login page.
pub async fn index(RequireUser(user): RequireUser, page: Page) -> impl IntoResponse {
    let profile = ProfileView {
        name: user.display_name.clone(),
        email: user.email.as_ref().map(ToString::to_string),
        role: user.role.to_string(),
        provider: user.provider.clone(),
        is_admin: user.is_admin(),
    };

    ProfileTemplate { page, profile }
}
