use cvt_core::Software;
use cvt_core::forms::SoftwareForm;
use reqwest::Method;

use crate::error::Result;
use crate::http::ApiClient;
use crate::query::QueryKey;

const LIST: &str = "software/ls";

/// Software catalog.
#[derive(Debug, Clone, Copy)]
pub struct SoftwareApi<'a> {
    pub(crate) client: &'a ApiClient,
}

impl SoftwareApi<'_> {
    /// Every entry, cached.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn list(&self) -> Result<Vec<Software>> {
        self.client.cached_list(QueryKey::Software, LIST).await
    }

    /// Every entry, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn refetch(&self) -> Result<Vec<Software>> {
        self.client.refetch_list(QueryKey::Software, LIST).await
    }

    /// Create an entry with its home-screen image.
    ///
    /// # Errors
    ///
    /// Returns validation failures before sending, or the request failure.
    pub async fn create(&self, form: &SoftwareForm) -> Result<()> {
        form.validate_create()?;
        self.client
            .post_multipart("software/new", form.create_parts())
            .await?;
        self.client.cache().invalidate(&QueryKey::Software);
        Ok(())
    }

    /// Update an entry. The image cannot change here.
    ///
    /// # Errors
    ///
    /// Returns validation failures before sending, or the request failure.
    pub async fn update(&self, id: &str, form: &SoftwareForm) -> Result<()> {
        form.validate_edit()?;
        self.client
            .send_json(Method::PUT, &format!("software/{id}"), &form.update_payload())
            .await?;
        self.client.cache().invalidate(&QueryKey::Software);
        Ok(())
    }

    /// Delete an entry.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .call(Method::DELETE, &format!("software/{id}"))
            .await?;
        self.client.cache().invalidate(&QueryKey::Software);
        Ok(())
    }
}
