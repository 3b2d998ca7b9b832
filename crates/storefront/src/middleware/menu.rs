//! Extractor for the menu visibility cookie.

use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts},
};

use crate::models::MenuVisibility;

/// Hidden navigation labels read from the `hidden_menu` cookie.
#[derive(Debug, Clone, Default)]
pub struct HiddenMenu(pub MenuVisibility);

impl<S> FromRequestParts<S> for HiddenMenu
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok());
        Ok(Self(MenuVisibility::from_cookie_header(headers)))
    }
}
