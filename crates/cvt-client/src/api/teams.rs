use cvt_core::Team;
use cvt_core::forms::TeamForm;
use reqwest::Method;

use crate::error::Result;
use crate::http::ApiClient;
use crate::query::QueryKey;

const LIST: &str = "team/ls";

/// Teams.
#[derive(Debug, Clone, Copy)]
pub struct Teams<'a> {
    pub(crate) client: &'a ApiClient,
}

impl Teams<'_> {
    /// Every team, cached.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn list(&self) -> Result<Vec<Team>> {
        self.client.cached_list(QueryKey::Teams, LIST).await
    }

    /// Every team, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn refetch(&self) -> Result<Vec<Team>> {
        self.client.refetch_list(QueryKey::Teams, LIST).await
    }

    /// One team.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn get(&self, id: &str) -> Result<Team> {
        self.client.get_json(&format!("team/{id}")).await
    }

    /// Create a team.
    ///
    /// # Errors
    ///
    /// Returns validation failures before sending, or the request failure.
    pub async fn create(&self, form: &TeamForm) -> Result<()> {
        form.validate()?;
        self.client.send_json(Method::POST, "team/new", form).await?;
        self.client.cache().invalidate(&QueryKey::Teams);
        Ok(())
    }

    /// Rename a team or change its lead.
    ///
    /// # Errors
    ///
    /// Returns validation failures before sending, or the request failure.
    pub async fn update(&self, id: &str, form: &TeamForm) -> Result<()> {
        form.validate()?;
        self.client
            .send_json(Method::PUT, &format!("team/{id}"), form)
            .await?;
        self.client.cache().invalidate(&QueryKey::Teams);
        Ok(())
    }

    /// Delete a team. Members keep the stale team name.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.call(Method::DELETE, &format!("team/{id}")).await?;
        self.client.cache().invalidate(&QueryKey::Teams);
        Ok(())
    }
}
