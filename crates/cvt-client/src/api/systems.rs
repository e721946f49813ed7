use cvt_core::System;
use cvt_core::forms::SystemForm;
use reqwest::Method;

use crate::error::Result;
use crate::http::ApiClient;
use crate::query::QueryKey;

const LIST: &str = "system/ls";

/// Systems catalog.
#[derive(Debug, Clone, Copy)]
pub struct Systems<'a> {
    pub(crate) client: &'a ApiClient,
}

impl Systems<'_> {
    /// Every system, cached.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn list(&self) -> Result<Vec<System>> {
        self.client.cached_list(QueryKey::Systems, LIST).await
    }

    /// Every system, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn refetch(&self) -> Result<Vec<System>> {
        self.client.refetch_list(QueryKey::Systems, LIST).await
    }

    /// Create a system with its image.
    ///
    /// # Errors
    ///
    /// Returns validation failures before sending, or the request failure.
    pub async fn create(&self, form: &SystemForm) -> Result<()> {
        form.validate_create()?;
        self.client
            .post_multipart("system/new", form.create_parts())
            .await?;
        self.client.cache().invalidate(&QueryKey::Systems);
        Ok(())
    }

    /// Update a system. The image cannot change here.
    ///
    /// # Errors
    ///
    /// Returns validation failures before sending, or the request failure.
    pub async fn update(&self, id: &str, form: &SystemForm) -> Result<()> {
        form.validate_edit()?;
        self.client
            .send_json(Method::PUT, &format!("system/{id}"), &form.update_payload())
            .await?;
        self.client.cache().invalidate(&QueryKey::Systems);
        Ok(())
    }

    /// Delete a system.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.call(Method::DELETE, &format!("system/{id}")).await?;
        self.client.cache().invalidate(&QueryKey::Systems);
        Ok(())
    }
}
