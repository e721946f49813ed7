use bytes::Bytes;
use cvt_core::Guides;
use cvt_core::forms::GuideUpload;
use futures::future::try_join_all;
use reqwest::Method;
use tracing::info;
use url::Url;

use crate::error::Result;
use crate::http::ApiClient;
use crate::query::QueryKey;

/// Guide files.
#[derive(Debug, Clone, Copy)]
pub struct Files<'a> {
    pub(crate) client: &'a ApiClient,
}

impl Files<'_> {
    /// The guide directory listing, cached.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn guides(&self) -> Result<Guides> {
        let guides = self
            .client
            .cache()
            .fetch(QueryKey::Guides, || {
                self.client.get_json::<Guides>("files/guides")
            })
            .await?;
        Ok(guides.as_ref().clone())
    }

    /// Upload one or more guide files.
    ///
    /// # Errors
    ///
    /// Returns validation failures before sending, or the request failure.
    pub async fn upload(&self, upload: &GuideUpload) -> Result<()> {
        upload.validate()?;
        self.client
            .post_multipart("files/guides", upload.parts())
            .await?;
        info!(count = upload.files.len(), "guides uploaded");
        self.client.cache().invalidate(&QueryKey::Guides);
        Ok(())
    }

    /// Delete one file.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.call(Method::DELETE, &format!("files/{id}")).await?;
        self.client.cache().invalidate(&QueryKey::Guides);
        Ok(())
    }

    /// Delete several files concurrently. Fails on the first failure; files
    /// already deleted stay deleted.
    ///
    /// # Errors
    ///
    /// Returns the first request failure.
    pub async fn delete_many<S: AsRef<str>>(&self, ids: &[S]) -> Result<()> {
        let paths: Vec<String> = ids.iter().map(|id| format!("files/{}", id.as_ref())).collect();
        let result = try_join_all(
            paths
                .iter()
                .map(|path| self.client.call(Method::DELETE, path)),
        )
        .await;
        self.client.cache().invalidate(&QueryKey::Guides);
        result.map(drop)
    }

    /// Download one file.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn download(&self, id: &str) -> Result<Bytes> {
        self.client.get_bytes(&format!("files/download/{id}")).await
    }

    /// Address that renders a file inline.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::InvalidUrl`] if the id does not form a URL.
    pub fn view_url(&self, id: &str) -> Result<Url> {
        self.client.url(&format!("files/view/{id}"))
    }

    /// Address of the whole guide directory as one archive.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::InvalidUrl`] on a malformed base address.
    pub fn download_all_url(&self) -> Result<Url> {
        self.client.url("files/download/dir/guides")
    }

    /// Download the whole guide directory.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn download_all(&self) -> Result<Bytes> {
        self.client.get_bytes("files/download/dir/guides").await
    }
}
