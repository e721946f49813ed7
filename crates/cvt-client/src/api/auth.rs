use cvt_core::User;
use cvt_core::forms::{LoginForm, RegisterForm};
use reqwest::Method;

use crate::error::Result;
use crate::http::ApiClient;

/// Session endpoints. See [`crate::Session`] for the stateful wrapper.
#[derive(Debug, Clone, Copy)]
pub struct Auth<'a> {
    pub(crate) client: &'a ApiClient,
}

impl Auth<'_> {
    /// The signed-in identity. Never retried.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Status`] when no session is active.
    pub async fn me(&self) -> Result<User> {
        self.client.get_json_once("auth/me").await
    }

    /// Sign in; the backend answers with a session cookie.
    ///
    /// # Errors
    ///
    /// Returns validation failures before sending, or the request failure.
    pub async fn login(&self, form: &LoginForm) -> Result<()> {
        form.validate()?;
        self.client
            .send_json(Method::POST, "auth/login", form)
            .await?;
        Ok(())
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns validation failures before sending, or the request failure.
    pub async fn register(&self, form: &RegisterForm) -> Result<()> {
        form.validate()?;
        self.client
            .send_json(Method::POST, "auth/register", form)
            .await?;
        Ok(())
    }

    /// End the session and drop every cached list.
    ///
    /// # Errors
    ///
    /// Returns the request failure; the cache is cleared regardless.
    pub async fn logout(&self) -> Result<()> {
        let result = self.client.call(Method::GET, "auth/logout").await;
        self.client.cache().clear();
        result
    }
}
