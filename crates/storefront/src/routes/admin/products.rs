//! Admin product management: list, create, edit, mark sold, delete.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use boutique_core::{CurrencyCode, Price, ProductId};
use tracing::instrument;

use crate::backend::{ProductInput, object_path_for_upload};
use crate::catalog::Product;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{Page, RequireAdmin};
use crate::models::CurrentUser;
use crate::routes::bag::NoticeQuery;
use crate::routes::notice_message;
use crate::state::AppState;

/// Product row of the admin table.
#[derive(Clone)]
pub struct AdminProductView {
    pub id: ProductId,
    pub title: String,
    pub price: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub image_url: Option<String>,
    pub sold: bool,
}

impl From<&Product> for AdminProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price.display(),
            category: product.category.clone(),
            subcategory: product.subcategory.clone(),
            image_url: product.image_url.clone(),
            sold: product.sold,
        }
    }
}

/// Values of the product form, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFormView {
    pub title: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub subcategory: String,
    pub availability: String,
    pub sold: bool,
    /// Image currently stored for the product.
    pub image_url: Option<String>,
}

impl From<&Product> for ProductFormView {
    fn from(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price.amount.to_string(),
            category: product.category.clone(),
            subcategory: product.subcategory.clone().unwrap_or_default(),
            availability: product.availability.clone().unwrap_or_default(),
            sold: product.sold,
            image_url: product.image_url.clone(),
        }
    }
}

impl ProductFormView {
    /// Check the form and build the columns to write.
    ///
    /// The image is left out; the caller sets it after uploading.
    ///
    /// # Errors
    ///
    /// Returns a message for the first invalid field.
    pub fn validate(&self, currency: CurrencyCode) -> std::result::Result<ProductInput, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Title is required".to_string());
        }
        let category = self.category.trim();
        if category.is_empty() {
            return Err("Category is required".to_string());
        }
        let price = Price::parse_amount(&self.price, currency)
            .map_err(|e| format!("Invalid price: {e}"))?;

        Ok(ProductInput {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            price: price.amount,
            category: category.to_string(),
            subcategory: optional(&self.subcategory),
            availability: optional(&self.availability),
            image_url: None,
            sold: self.sold,
        })
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// An image file attached to the product form.
struct ImageUpload {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// Admin product table template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct ProductsTemplate {
    pub page: Page,
    pub products: Vec<AdminProductView>,
    pub notice: Option<&'static str>,
}

/// Create / edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/product_form.html")]
pub struct ProductFormTemplate {
    pub page: Page,
    pub heading: String,
    pub action: String,
    pub form: ProductFormView,
    pub error: Option<String>,
}

impl ProductFormTemplate {
    fn create(page: Page, form: ProductFormView, error: Option<String>) -> Self {
        Self {
            page,
            heading: "New product".to_string(),
            action: "/admin/products".to_string(),
            form,
            error,
        }
    }

    fn edit(page: Page, id: ProductId, form: ProductFormView, error: Option<String>) -> Self {
        Self {
            page,
            heading: format!("Edit {}", form.title),
            action: format!("/admin/products/{id}"),
            form,
            error,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Product table, newest first.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    page: Page,
    Query(query): Query<NoticeQuery>,
) -> impl IntoResponse {
    let products = state.catalog().products().await;
    ProductsTemplate {
        page,
        products: products.iter().map(AdminProductView::from).collect(),
        notice: notice_message(query.notice.as_deref()),
    }
}

/// Empty create form.
pub async fn new_form(RequireAdmin(_admin): RequireAdmin, page: Page) -> impl IntoResponse {
    ProductFormTemplate::create(page, ProductFormView::default(), None)
}

/// Create a product, uploading its image first when one is attached.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: Page,
    multipart: Multipart,
) -> Result<Response> {
    let (form, image) = read_product_form(multipart).await?;
    let mut input = match form.validate(state.config().store.currency) {
        Ok(input) => input,
        Err(message) => {
            return Ok(invalid(ProductFormTemplate::create(page, form, Some(message))));
        }
    };
    if let Some(image) = image {
        input.image_url = Some(upload_image(&state, &admin, image).await?);
    }

    let row = state
        .backend()
        .insert_product(admin.access_token(), &input)
        .await?;
    let product = state.catalog().product_from_row(row);
    tracing::info!(product_id = %product.id, title = %product.title, "Product created");
    audit("Product created", product.id);
    state.catalog().apply_insert(product).await;

    Ok(Redirect::to("/admin?notice=product_created").into_response())
}

/// Edit form filled with the stored product.
#[instrument(skip(state, _admin, page))]
pub async fn edit_form(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    page: Page,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = find(&state, id).await?;
    Ok(ProductFormTemplate::edit(
        page,
        id,
        ProductFormView::from(&product),
        None,
    ))
}

/// Save the edit form. Without a new image the stored one is kept.
#[instrument(skip(state, admin, page, multipart))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: Page,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    let existing = find(&state, id).await?;
    let (mut form, image) = read_product_form(multipart).await?;
    form.image_url = existing.image_url;

    let mut input = match form.validate(state.config().store.currency) {
        Ok(input) => input,
        Err(message) => {
            return Ok(invalid(ProductFormTemplate::edit(page, id, form, Some(message))));
        }
    };
    if let Some(image) = image {
        input.image_url = Some(upload_image(&state, &admin, image).await?);
    }

    let row = state
        .backend()
        .update_product(admin.access_token(), id, &input)
        .await?;
    let product = state.catalog().product_from_row(row);
    tracing::info!(product_id = %id, "Product updated");
    audit("Product updated", id);
    state.catalog().apply_update(product).await;

    Ok(Redirect::to("/admin?notice=product_updated").into_response())
}

/// Flip a product's sold flag.
#[instrument(skip(state, admin))]
pub async fn toggle_sold(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let existing = find(&state, id).await?;
    let row = state
        .backend()
        .set_product_sold(admin.access_token(), id, !existing.sold)
        .await?;
    let product = state.catalog().product_from_row(row);
    tracing::info!(product_id = %id, sold = product.sold, "Sold flag changed");
    audit("Sold flag changed", id);
    state.catalog().apply_update(product).await;

    Ok(Redirect::to("/admin?notice=sold_toggled").into_response())
}

/// Delete a product.
#[instrument(skip(state, admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    state
        .backend()
        .delete_product(admin.access_token(), id)
        .await?;
    tracing::info!(product_id = %id, "Product deleted");
    audit("Product deleted", id);
    state.catalog().apply_delete(id).await;

    Ok(Redirect::to("/admin?notice=product_deleted").into_response())
}

// =============================================================================
// Helpers
// =============================================================================

async fn find(state: &AppState, id: ProductId) -> Result<Product> {
    state
        .catalog()
        .find(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

fn invalid(template: ProductFormTemplate) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, template).into_response()
}

fn audit(message: &str, id: ProductId) {
    let id = id.to_string();
    add_breadcrumb("admin", message, Some(&[("product_id", id.as_str())]));
}

/// Read the multipart product form.
///
/// A file field with no name or no bytes means no image was chosen.
async fn read_product_form(
    mut multipart: Multipart,
) -> Result<(ProductFormView, Option<ImageUpload>)> {
    let mut form = ProductFormView::default();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid form: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid image upload: {e}")))?;
            if file_name.is_empty() || bytes.is_empty() {
                continue;
            }
            if !content_type.starts_with("image/") {
                return Err(AppError::BadRequest(
                    "Product images must be image files".to_string(),
                ));
            }
            image = Some(ImageUpload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid form field {name}: {e}")))?;
        match name.as_str() {
            "title" => form.title = value,
            "description" => form.description = value,
            "price" => form.price = value,
            "category" => form.category = value,
            "subcategory" => form.subcategory = value,
            "availability" => form.availability = value,
            "sold" => form.sold = true,
            _ => {}
        }
    }

    Ok((form, image))
}

/// Store an image in the bucket and return its public URL.
async fn upload_image(state: &AppState, admin: &CurrentUser, image: ImageUpload) -> Result<String> {
    let path = object_path_for_upload(Some(&image.file_name));
    state
        .backend()
        .upload_object(admin.access_token(), &path, &image.content_type, image.bytes)
        .await?;
    tracing::info!(path = %path, "Product image uploaded");
    Ok(state.backend().public_url(&path))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn filled() -> ProductFormView {
        ProductFormView {
            title: "  Silk Scarf ".to_string(),
            description: "Hand rolled edges".to_string(),
            price: "24.5".to_string(),
            category: "Accessories".to_string(),
            subcategory: "  ".to_string(),
            availability: "Ships in 2 days".to_string(),
            sold: false,
            image_url: None,
        }
    }

    #[test]
    fn test_validate_builds_trimmed_input() {
        let input = filled().validate(CurrencyCode::USD).unwrap();
        assert_eq!(input.title, "Silk Scarf");
        assert_eq!(input.price, Decimal::new(245, 1));
        assert_eq!(input.subcategory, None);
        assert_eq!(input.availability.as_deref(), Some("Ships in 2 days"));
        assert_eq!(input.image_url, None);
    }

    #[test]
    fn test_validate_requires_title_and_category() {
        let mut form = filled();
        form.title = " ".to_string();
        assert_eq!(form.validate(CurrencyCode::USD).unwrap_err(), "Title is required");

        let mut form = filled();
        form.category = String::new();
        assert_eq!(form.validate(CurrencyCode::USD).unwrap_err(), "Category is required");
    }

    #[test]
    fn test_validate_rejects_bad_prices() {
        let mut form = filled();
        form.price = "-1".to_string();
        assert_eq!(
            form.validate(CurrencyCode::USD).unwrap_err(),
            "Invalid price: price cannot be negative"
        );

        form.price = "twelve".to_string();
        assert_eq!(
            form.validate(CurrencyCode::USD).unwrap_err(),
            "Invalid price: price must be a number"
        );

        form.price = "0".to_string();
        assert!(form.validate(CurrencyCode::USD).is_ok());
    }

    #[test]
    fn test_form_view_from_product() {
        let mut product = crate::catalog::tests::product(4, "Belt", "Accessories", Some("Belts"));
        product.image_url = Some("https://cdn.test/belt.jpg".to_string());
        let form = ProductFormView::from(&product);
        assert_eq!(form.price, "10.04");
        assert_eq!(form.subcategory, "Belts");
        assert_eq!(form.image_url.as_deref(), Some("https://cdn.test/belt.jpg"));
        assert_eq!(form.validate(CurrencyCode::USD).unwrap().title, "Belt");
    }
}
