//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use boutique_core::ProductId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{Page, load_or_default, store};
use crate::models::{Bag, Wishlist, session_keys};
use crate::routes::bag::NoticeQuery;
use crate::routes::products::ProductView;
use crate::routes::{local_redirect, notice_message};
use crate::state::AppState;

/// Toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub product_id: ProductId,
    /// Page to return to; defaults to the wishlist.
    pub return_to: Option<String>,
}

/// Move-to-bag form data.
#[derive(Debug, Deserialize)]
pub struct MoveToBagForm {
    pub product_id: ProductId,
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/show.html")]
pub struct WishlistTemplate {
    pub page: Page,
    pub products: Vec<ProductView>,
    pub notice: Option<&'static str>,
}

/// Display the wishlist.
#[instrument(skip(state, session, page))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    page: Page,
    Query(query): Query<NoticeQuery>,
) -> impl IntoResponse {
    let products = state.catalog().products().await;
    let wishlist: Wishlist = load_or_default(&session, session_keys::WISHLIST).await;

    WishlistTemplate {
        page,
        products: wishlist
            .resolve(&products)
            .iter()
            .map(|p| ProductView::new(p, &wishlist))
            .collect(),
        notice: notice_message(query.notice.as_deref()),
    }
}

/// Save or unsave a product.
///
/// Unsaving always works; saving needs the product to exist.
#[instrument(skip(state, session))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ToggleForm>,
) -> Result<Response> {
    let mut wishlist: Wishlist = load_or_default(&session, session_keys::WISHLIST).await;
    if !wishlist.contains(form.product_id) && state.catalog().find(form.product_id).await.is_none()
    {
        return Err(AppError::NotFound(format!("product {}", form.product_id)));
    }

    let saved = wishlist.toggle(form.product_id);
    store(&session, session_keys::WISHLIST, &wishlist).await?;

    let notice = if saved { "saved" } else { "unsaved" };
    let target = local_redirect(form.return_to.as_deref()).unwrap_or("/wishlist");
    let separator = if target.contains('?') { '&' } else { '?' };
    Ok(Redirect::to(&format!("{target}{separator}notice={notice}")).into_response())
}

/// Move a saved product into the bag.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the product has sold; it stays saved.
#[instrument(skip(state, session))]
pub async fn move_to_bag(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<MoveToBagForm>,
) -> Result<Response> {
    let product = state
        .catalog()
        .find(form.product_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;
    if product.sold {
        return Err(AppError::BadRequest(format!(
            "{} is sold out",
            product.title
        )));
    }

    let mut wishlist: Wishlist = load_or_default(&session, session_keys::WISHLIST).await;
    let mut bag: Bag = load_or_default(&session, session_keys::BAG).await;
    wishlist.remove(product.id);
    bag.add(product.id, 1);
    store(&session, session_keys::WISHLIST, &wishlist).await?;
    store(&session, session_keys::BAG, &bag).await?;

    Ok(Redirect::to("/bag?notice=moved_to_bag").into_response())
}
