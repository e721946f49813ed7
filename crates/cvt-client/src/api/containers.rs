use cvt_core::forms::ContainerForm;
use cvt_core::{Action, ContainerRecord};
use futures::stream::BoxStream;
use reqwest::Method;
use tracing::{debug, info};

use crate::error::Result;
use crate::http::ApiClient;
use crate::query::QueryKey;
use crate::sse::{self, SseEvent};

const LIST: &str = "docker/container/ls";

/// Container records, builds and lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct Containers<'a> {
    pub(crate) client: &'a ApiClient,
}

impl Containers<'_> {
    /// Every container record, cached.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn list(&self) -> Result<Vec<ContainerRecord>> {
        self.client.cached_list(QueryKey::Containers, LIST).await
    }

    /// Every container record, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn refetch(&self) -> Result<Vec<ContainerRecord>> {
        self.client.refetch_list(QueryKey::Containers, LIST).await
    }

    /// Create the record. The build content is uploaded by [`Self::build`].
    ///
    /// # Errors
    ///
    /// Returns validation failures before sending, or the request failure.
    pub async fn create(&self, form: &ContainerForm) -> Result<()> {
        form.validate()?;
        self.client
            .send_json(Method::POST, "docker/container/new", &form.create_payload())
            .await?;
        info!(name = %form.name, build_id = %form.build_id, "container record created");
        self.client.cache().invalidate(&QueryKey::Containers);
        Ok(())
    }

    /// Upload the build content for `form.build_id`.
    ///
    /// # Errors
    ///
    /// Returns validation failures before sending, or the request failure.
    pub async fn build(&self, form: &ContainerForm) -> Result<()> {
        form.validate()?;
        self.client
            .post_multipart(
                &format!("docker/container/new/build/{}", form.build_id),
                form.build_parts(),
            )
            .await?;
        info!(build_id = %form.build_id, "build content uploaded");
        self.client.cache().invalidate(&QueryKey::Containers);
        Ok(())
    }

    /// Create the record, then upload its content.
    ///
    /// # Errors
    ///
    /// Returns the first failure; a failed upload leaves the record in place.
    pub async fn create_and_build(&self, form: &ContainerForm) -> Result<()> {
        self.create(form).await?;
        self.build(form).await
    }

    /// Raw lifecycle state of a runtime container.
    ///
    /// # Errors
    ///
    /// Returns the request failure once retries are exhausted.
    pub async fn state(&self, runtime_id: &str) -> Result<String> {
        let path = format!("docker/container/state/{runtime_id}");
        let state = self
            .client
            .with_retry(&path, || self.client.get_text(&path))
            .await?;
        debug!(runtime_id, %state, "container state");
        Ok(state)
    }

    /// Run a lifecycle action. Never retried. A removed container's cached
    /// state is dropped.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn action(&self, action: Action, runtime_id: &str) -> Result<()> {
        self.client
            .call(
                Method::GET,
                &format!("docker/container/{}/{runtime_id}", action.segment()),
            )
            .await?;
        info!(%action, runtime_id, "container action done");
        let cache = self.client.cache();
        cache.invalidate(&QueryKey::Containers);
        if action == Action::Remove {
            cache.invalidate(&QueryKey::ContainerState(runtime_id.to_string()));
        }
        Ok(())
    }

    /// Subscribe to the build and runtime log of `build_id`.
    ///
    /// # Errors
    ///
    /// Returns the failure to open the stream.
    pub async fn logs(&self, build_id: &str) -> Result<BoxStream<'static, Result<SseEvent>>> {
        let response = self.client.open_stream(&logs_path(build_id)).await?;
        Ok(sse::events(response))
    }
}

/// Path of the log stream for `build_id`.
pub(crate) fn logs_path(build_id: &str) -> String {
    format!("docker/container/build-logs/{build_id}")
}
