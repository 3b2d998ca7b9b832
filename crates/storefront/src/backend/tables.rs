//! Table endpoints (`/rest/v1`): products and profiles.

use boutique_core::{ProductId, UserId};
use reqwest::Method;
use tracing::instrument;

use super::types::{ProductInput, ProductRow, ProfileRow, SoldPatch};
use super::{BackendClient, BackendError};

/// Ask the table API to answer writes with the written rows.
const RETURN_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

impl BackendClient {
    fn products_path(&self, filter: &str) -> String {
        format!("/rest/v1/{}{filter}", self.inner.products_table)
    }

    /// List every product, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the rows cannot be parsed.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductRow>, BackendError> {
        let request = self.request(
            Method::GET,
            &self.products_path("?select=*&order=created_at.desc"),
            None,
        );
        self.send_json(request).await
    }

    /// Insert a product and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` if the caller may not write products.
    #[instrument(skip(self, access_token, input), fields(title = %input.title))]
    pub async fn insert_product(
        &self,
        access_token: &str,
        input: &ProductInput,
    ) -> Result<ProductRow, BackendError> {
        let request = self
            .request(Method::POST, &self.products_path(""), Some(access_token))
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(input);
        let rows: Vec<ProductRow> = self.send_json(request).await?;
        single_row(rows, "inserted product")
    }

    /// Replace a product's editable columns.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no row has this id.
    #[instrument(skip(self, access_token, input), fields(id = %id))]
    pub async fn update_product(
        &self,
        access_token: &str,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<ProductRow, BackendError> {
        let request = self
            .request(
                Method::PATCH,
                &self.products_path(&format!("?id=eq.{id}")),
                Some(access_token),
            )
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(input);
        let rows: Vec<ProductRow> = self.send_json(request).await?;
        single_row(rows, &format!("product {id}"))
    }

    /// Set a product's sold flag.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no row has this id.
    #[instrument(skip(self, access_token), fields(id = %id))]
    pub async fn set_product_sold(
        &self,
        access_token: &str,
        id: ProductId,
        sold: bool,
    ) -> Result<ProductRow, BackendError> {
        let request = self
            .request(
                Method::PATCH,
                &self.products_path(&format!("?id=eq.{id}")),
                Some(access_token),
            )
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(&SoldPatch { sold });
        let rows: Vec<ProductRow> = self.send_json(request).await?;
        single_row(rows, &format!("product {id}"))
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no row has this id.
    #[instrument(skip(self, access_token), fields(id = %id))]
    pub async fn delete_product(&self, access_token: &str, id: ProductId) -> Result<(), BackendError> {
        let request = self
            .request(
                Method::DELETE,
                &self.products_path(&format!("?id=eq.{id}")),
                Some(access_token),
            )
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1);
        let rows: Vec<ProductRow> = self.send_json(request).await?;
        single_row(rows, &format!("product {id}")).map(|_| ())
    }

    /// Look up the profile record of a user.
    ///
    /// Returns `None` when the user has no profile row yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, access_token), fields(user_id = %user_id))]
    pub async fn fetch_profile(
        &self,
        access_token: &str,
        user_id: UserId,
    ) -> Result<Option<ProfileRow>, BackendError> {
        let path = format!(
            "/rest/v1/{}?id=eq.{user_id}&select=role,full_name",
            self.inner.profiles_table
        );
        let request = self.request(Method::GET, &path, Some(access_token));
        let rows: Vec<ProfileRow> = self.send_json(request).await?;
        Ok(rows.into_iter().next())
    }
}

/// The table API answers writes with an array; an empty one means the filter
/// matched nothing (or row-level security hid the row).
fn single_row(rows: Vec<ProductRow>, what: &str) -> Result<ProductRow, BackendError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| BackendError::NotFound(what.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_row_empty_is_not_found() {
        let err = single_row(Vec::new(), "product 9").unwrap_err();
        assert_eq!(err.to_string(), "Not found: product 9");
    }
}
