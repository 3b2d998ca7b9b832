//! Object storage endpoints (`/storage/v1`) for product images.

use reqwest::Method;
use tracing::instrument;
use uuid::Uuid;

use super::{BackendClient, BackendError};

/// Longest file extension kept from an uploaded file name.
const MAX_EXTENSION_LEN: usize = 5;

/// Storage path for a newly uploaded product image.
///
/// The extension comes from the uploaded file name when it is short and
/// alphanumeric, `bin` otherwise.
#[must_use]
pub fn object_path_for_upload(file_name: Option<&str>) -> String {
    let extension = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| "bin".to_string());
    format!("products/{}.{extension}", Uuid::new_v4())
}

impl BackendClient {
    /// Upload an object into the image bucket, replacing any object at `path`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` if the caller may not write to the bucket.
    #[instrument(skip(self, access_token, bytes), fields(size = bytes.len()))]
    pub async fn upload_object(
        &self,
        access_token: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), BackendError> {
        let url_path = format!("/storage/v1/object/{}/{path}", self.inner.storage_bucket);
        let request = self
            .request(Method::POST, &url_path, Some(access_token))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes);
        self.send(request).await.map(|_| ())
    }

    /// Public URL of an object in the image bucket.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{path}",
            self.base_url(),
            self.inner.storage_bucket
        )
    }
}
