use cvt_core::forms::{EditUserForm, PasswordResetForm};
use cvt_core::{CoreError, User};
use reqwest::Method;
use tracing::info;

use crate::error::Result;
use crate::http::ApiClient;
use crate::query::QueryKey;

const LIST: &str = "users";

/// Console accounts.
#[derive(Debug, Clone, Copy)]
pub struct Users<'a> {
    pub(crate) client: &'a ApiClient,
}

impl Users<'_> {
    /// Every account, cached.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn list(&self) -> Result<Vec<User>> {
        self.client.cached_list(QueryKey::Users, LIST).await
    }

    /// Every account, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns the request failure.
    pub async fn refetch(&self) -> Result<Vec<User>> {
        self.client.refetch_list(QueryKey::Users, LIST).await
    }

    /// Edit an account. `editor` is the signed-in user; only admins may
    /// grant the admin role.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RoleEscalation`] before sending, or the request failure.
    pub async fn update(&self, id: &str, form: &EditUserForm, editor: Option<&User>) -> Result<()> {
        form.authorize(editor)?;
        self.client
            .send_json(Method::PUT, &format!("users/{id}"), form)
            .await?;
        info!(user = id, role = %form.role, "user updated");
        self.client.cache().invalidate(&QueryKey::Users);
        Ok(())
    }

    /// Delete an account other than the signed-in one.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SelfDeletion`] before sending, or the request failure.
    pub async fn delete(&self, id: &str, current: Option<&User>) -> Result<()> {
        if current.is_some_and(|me| me.id == id) {
            return Err(CoreError::SelfDeletion.into());
        }
        self.client.call(Method::DELETE, &format!("users/{id}")).await?;
        self.client.cache().invalidate(&QueryKey::Users);
        Ok(())
    }

    /// Set a new password for an account.
    ///
    /// # Errors
    ///
    /// Returns validation failures before sending, or the request failure.
    pub async fn reset_password(&self, id: &str, form: &PasswordResetForm) -> Result<()> {
        form.validate()?;
        self.client
            .send_json(Method::PUT, &format!("auth/password-reset/{id}"), form)
            .await?;
        info!(user = id, "password reset");
        Ok(())
    }
}
