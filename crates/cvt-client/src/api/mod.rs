//! Typed endpoint groups.
//!
//! Each group borrows the [`ApiClient`] and maps one backend resource.
//! Reads of whole lists go through the query cache; every mutation
//! validates its form first and invalidates the lists it changes.

mod auth;
mod containers;
mod files;
mod members;
mod software;
mod systems;
mod teams;
mod users;

use std::any::Any;

use serde::de::DeserializeOwned;

pub use auth::Auth;
pub use containers::Containers;
pub use files::Files;
pub use members::Members;
pub use software::SoftwareApi;
pub use systems::Systems;
pub use teams::Teams;
pub use users::Users;

use crate::error::Result;
use crate::http::ApiClient;
use crate::query::QueryKey;

impl ApiClient {
    /// Personnel endpoints.
    #[must_use]
    pub const fn members(&self) -> Members<'_> {
        Members { client: self }
    }

    /// Team endpoints.
    #[must_use]
    pub const fn teams(&self) -> Teams<'_> {
        Teams { client: self }
    }

    /// Software catalog endpoints.
    #[must_use]
    pub const fn software(&self) -> SoftwareApi<'_> {
        SoftwareApi { client: self }
    }

    /// Systems catalog endpoints.
    #[must_use]
    pub const fn systems(&self) -> Systems<'_> {
        Systems { client: self }
    }

    /// Console user endpoints.
    #[must_use]
    pub const fn users(&self) -> Users<'_> {
        Users { client: self }
    }

    /// Session endpoints.
    #[must_use]
    pub const fn auth(&self) -> Auth<'_> {
        Auth { client: self }
    }

    /// Guide file endpoints.
    #[must_use]
    pub const fn files(&self) -> Files<'_> {
        Files { client: self }
    }

    /// Container endpoints.
    #[must_use]
    pub const fn containers(&self) -> Containers<'_> {
        Containers { client: self }
    }

    /// A list from the cache, fetched on a miss.
    pub(crate) async fn cached_list<T>(&self, key: QueryKey, path: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Clone + Any + Send + Sync,
    {
        let list = self
            .cache()
            .fetch(key, || self.get_list::<T>(path))
            .await?;
        Ok(list.as_ref().clone())
    }

    /// Drop `key` and fetch the list again.
    pub(crate) async fn refetch_list<T>(&self, key: QueryKey, path: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Clone + Any + Send + Sync,
    {
        self.cache().invalidate(&key);
        self.cached_list(key, path).await
    }
}
