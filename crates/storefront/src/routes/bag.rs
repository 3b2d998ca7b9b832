//! Bag route handlers.
//!
//! The bag lives in the visitor session; every change redirects back to the
//! bag page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use boutique_core::ProductId;
use serde::{Deserialize, Deserializer};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{Page, load_or_default, store};
use crate::models::{Bag, ResolvedBag, session_keys};
use crate::routes::{local_redirect, notice_message};
use crate::state::AppState;

/// Bag line display data for templates.
#[derive(Clone)]
pub struct BagLineView {
    pub product_id: ProductId,
    pub title: String,
    pub image_url: Option<String>,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
    pub sold: bool,
}

/// Bag display data for templates.
#[derive(Clone)]
pub struct BagView {
    pub lines: Vec<BagLineView>,
    pub subtotal: String,
    pub item_count: u32,
    pub has_sold_items: bool,
}

impl From<&ResolvedBag> for BagView {
    fn from(bag: &ResolvedBag) -> Self {
        Self {
            lines: bag
                .lines
                .iter()
                .map(|line| BagLineView {
                    product_id: line.product.id,
                    title: line.product.title.clone(),
                    image_url: line.product.image_url.clone(),
                    unit_price: line.product.price.display(),
                    quantity: line.quantity,
                    line_total: line.line_total.display(),
                    sold: line.product.sold,
                })
                .collect(),
            subtotal: bag.subtotal.display(),
            item_count: bag.item_count(),
            has_sold_items: bag.has_sold_items(),
        }
    }
}

/// Deserialize an empty form field as `None`.
fn empty_string_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Add to bag form data.
#[derive(Debug, Deserialize)]
pub struct AddToBagForm {
    pub product_id: ProductId,
    /// Defaults to 1 when missing or empty.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub quantity: Option<u32>,
    pub return_to: Option<String>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateBagForm {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Remove from bag form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromBagForm {
    pub product_id: ProductId,
}

/// Notice query parameter.
#[derive(Debug, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

/// Bag page template.
#[derive(Template, WebTemplate)]
#[template(path = "bag/show.html")]
pub struct BagShowTemplate {
    pub page: Page,
    pub bag: BagView,
    pub notice: Option<&'static str>,
}

/// Checkout placeholder template.
#[derive(Template, WebTemplate)]
#[template(path = "bag/checkout.html")]
pub struct CheckoutTemplate {
    pub page: Page,
    pub bag: BagView,
}

/// Display bag page.
///
/// Lines whose product has been deleted are dropped from the session.
#[instrument(skip(state, session, page))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    page: Page,
    Query(query): Query<NoticeQuery>,
) -> Result<impl IntoResponse> {
    let products = state.catalog().products().await;
    let mut bag: Bag = load_or_default(&session, session_keys::BAG).await;
    // An empty product list usually means the backend is down, not that
    // every product was deleted.
    if !products.is_empty() && bag.retain_known(&products) {
        store(&session, session_keys::BAG, &bag).await?;
    }

    let resolved = bag.resolve(&products, state.config().store.currency);
    Ok(BagShowTemplate {
        page,
        bag: BagView::from(&resolved),
        notice: notice_message(query.notice.as_deref()),
    })
}

/// Add a product to the bag.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown product and
/// `AppError::BadRequest` for a sold one.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToBagForm>,
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

    let mut bag: Bag = load_or_default(&session, session_keys::BAG).await;
    bag.add(product.id, form.quantity.unwrap_or(1));
    store(&session, session_keys::BAG, &bag).await?;

    let product_id = product.id.to_string();
    add_breadcrumb("bag", "Added to bag", Some(&[("product_id", product_id.as_str())]));

    let target = local_redirect(form.return_to.as_deref()).unwrap_or("/bag");
    let separator = if target.contains('?') { '&' } else { '?' };
    Ok(Redirect::to(&format!("{target}{separator}notice=added_to_bag")).into_response())
}

/// Set the quantity of a bag line (0 removes it).
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateBagForm>) -> Result<Response> {
    let mut bag: Bag = load_or_default(&session, session_keys::BAG).await;
    if bag.set_quantity(form.product_id, form.quantity) {
        store(&session, session_keys::BAG, &bag).await?;
    }
    Ok(Redirect::to("/bag?notice=bag_updated").into_response())
}

/// Remove a line from the bag.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromBagForm>) -> Result<Response> {
    let mut bag: Bag = load_or_default(&session, session_keys::BAG).await;
    if bag.remove(form.product_id) {
        store(&session, session_keys::BAG, &bag).await?;
    }
    Ok(Redirect::to("/bag?notice=bag_updated").into_response())
}

/// Checkout placeholder.
///
/// Payment is not part of this storefront; the visitor sees a notice and the
/// bag is left as it was.
#[instrument(skip(state, session, page))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    page: Page,
) -> Response {
    let bag: Bag = load_or_default(&session, session_keys::BAG).await;
    if bag.is_empty() {
        return Redirect::to("/bag").into_response();
    }

    let products = state.catalog().products().await;
    let resolved = bag.resolve(&products, state.config().store.currency);
    tracing::info!(items = resolved.item_count(), "Checkout requested");

    CheckoutTemplate {
        page,
        bag: BagView::from(&resolved),
    }
    .into_response()
}
