use cvt_core::Member;
use cvt_core::forms::MemberForm;
use reqwest::Method;
use tracing::info;

use crate::error::Result;
use crate::http::ApiClient;
use crate::query::QueryKey;

const LIST: &str = "member/ls";

/// Personnel records.
#[derive(Debug, Clone, Copy)]
pub struct Members<'a> {
    pub(crate) client: &'a ApiClient,
}

impl Members<'_> {
    /// Every member, cached.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn list(&self) -> Result<Vec<Member>> {
        self.client.cached_list(QueryKey::Members, LIST).await
    }

    /// Every member, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn refetch(&self) -> Result<Vec<Member>> {
        self.client.refetch_list(QueryKey::Members, LIST).await
    }

    /// One member.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn get(&self, id: &str) -> Result<Member> {
        self.client.get_json(&format!("member/{id}")).await
    }

    /// Add a member.
    ///
    /// # Errors
    ///
    /// Returns validation failures before sending, or the request failure.
    pub async fn create(&self, form: &MemberForm) -> Result<()> {
        form.validate()?;
        self.client.send_json(Method::POST, "member/new", form).await?;
        info!(name = %form.name, "member created");
        self.client.cache().invalidate(&QueryKey::Members);
        Ok(())
    }

    /// Replace a member's fields.
    ///
    /// # Errors
    ///
    /// Returns validation failures before sending, or the request failure.
    pub async fn update(&self, id: &str, form: &MemberForm) -> Result<()> {
        form.validate()?;
        self.client
            .send_json(Method::PUT, &format!("member/{id}"), form)
            .await?;
        self.client.cache().invalidate(&QueryKey::Members);
        Ok(())
    }

    /// Remove a member.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.call(Method::DELETE, &format!("member/{id}")).await?;
        self.client.cache().invalidate(&QueryKey::Members);
        Ok(())
    }
}
