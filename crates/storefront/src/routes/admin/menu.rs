//! Menu visibility settings.
//!
//! Hidden labels are kept in the `hidden_menu` cookie of the device the admin
//! toggles them on.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{HiddenMenu, Page, RequireAdmin};
use crate::models::{MenuLabel, MenuVisibility};
use crate::routes::bag::NoticeQuery;
use crate::routes::notice_message;
use crate::state::AppState;

/// One row of the menu settings table.
#[derive(Clone)]
pub struct MenuEntry {
    pub slug: &'static str,
    pub title: &'static str,
    pub hidden: bool,
}

/// Build the settings rows in menu order.
#[must_use]
pub fn menu_entries(visibility: &MenuVisibility) -> Vec<MenuEntry> {
    MenuLabel::ALL
        .into_iter()
        .map(|label| MenuEntry {
            slug: label.slug(),
            title: label.title(),
            hidden: visibility.is_hidden(label),
        })
        .collect()
}

/// Toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleMenuForm {
    pub label: String,
}

/// Menu settings template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/menu.html")]
pub struct MenuTemplate {
    pub page: Page,
    pub entries: Vec<MenuEntry>,
    pub notice: Option<&'static str>,
}

/// Menu settings page.
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    page: Page,
    HiddenMenu(visibility): HiddenMenu,
    Query(query): Query<NoticeQuery>,
) -> impl IntoResponse {
    MenuTemplate {
        page,
        entries: menu_entries(&visibility),
        notice: notice_message(query.notice.as_deref()),
    }
}

/// Hide or show one label on this device.
#[instrument(skip(state, _admin, visibility))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    HiddenMenu(mut visibility): HiddenMenu,
    Form(form): Form<ToggleMenuForm>,
) -> Result<Response> {
    let label = form
        .label
        .parse::<MenuLabel>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let hidden = visibility.toggle(label);
    tracing::info!(label = %label, hidden, "Menu label toggled");

    let cookie = visibility.to_cookie(state.config().is_secure());
    Ok((
        [(SET_COOKIE, cookie.to_string())],
        Redirect::to("/admin/menu?notice=menu_updated"),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_entries_mark_hidden_labels() {
        let visibility = MenuVisibility::parse("bag.print-catalog");
        let entries = menu_entries(&visibility);
        assert_eq!(entries.len(), MenuLabel::ALL.len());

        let hidden: Vec<&str> = entries.iter().filter(|e| e.hidden).map(|e| e.slug).collect();
        assert_eq!(hidden, vec!["bag", "print-catalog"]);
    }
}
