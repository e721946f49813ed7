//! Cookie-carrying HTTP wrapper around the backend.

use std::future::Future;
use std::sync::Arc;

use cvt_core::forms::FormPart;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, Response, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::query::QueryCache;

struct Inner {
    http: reqwest::Client,
    stream_http: reqwest::Client,
    jar: Arc<Jar>,
    cache: QueryCache,
    config: ClientConfig,
}

/// Shared handle to the backend. Cloning is cheap; clones share cookies and
/// the query cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Request`] if the HTTP stack cannot be initialised.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        // Streams stay open for as long as the build runs.
        let stream_http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                stream_http,
                jar,
                cache: QueryCache::new(),
                config,
            }),
        })
    }

    /// Client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Query cache shared by all clones.
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    /// Absolute URL of a backend path.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the path does not join.
    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(self
            .inner
            .config
            .base_url
            .join(path.trim_start_matches('/'))?)
    }

    /// Cookies currently held for the backend, as a `Cookie` header value.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        self.inner
            .jar
            .cookies(&self.inner.config.base_url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Seed the jar from a saved `Cookie` header value.
    pub fn restore_cookies(&self, header: &str) {
        for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.inner
                .jar
                .add_cookie_str(&format!("{pair}; Path=/"), &self.inner.config.base_url);
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Run a read, retrying transport failures and 5xx answers with
    /// exponential backoff.
    pub(crate) async fn with_retry<T, F, Fut>(&self, path: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.inner.config.read_retries => {
                    let delay = self.inner.config.retry_delay(attempt);
                    warn!(path, attempt, ?delay, error = %e, "read failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// GET a JSON document, with retries.
    ///
    /// # Errors
    ///
    /// Returns the last failure once retries are exhausted.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.with_retry(path, || self.get_json_once(path)).await
    }

    /// GET a JSON document once.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] on a non-2xx answer.
    pub async fn get_json_once<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(Method::GET, path, |r| r).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// GET a list. A 200 yields the body; any other 2xx yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] on a non-2xx answer.
    pub async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        self.with_retry(path, || async move {
            let response = self.send(Method::GET, path, |r| r).await?;
            if response.status() != StatusCode::OK {
                debug!(path, status = %response.status(), "list answered without body");
                return Ok(Vec::new());
            }
            let bytes = response.bytes().await?;
            Ok(serde_json::from_slice(&bytes)?)
        })
        .await
    }

    /// GET a plain value that may arrive as a JSON string or as raw text.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] on a non-2xx answer.
    pub async fn get_text(&self, path: &str) -> Result<String> {
        let response = self.send(Method::GET, path, |r| r).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str::<String>(&text).unwrap_or_else(|_| text.trim().to_string()))
    }

    /// GET raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] on a non-2xx answer.
    pub async fn get_bytes(&self, path: &str) -> Result<bytes::Bytes> {
        let response = self.send(Method::GET, path, |r| r).await?;
        Ok(response.bytes().await?)
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Send a request whose answer body is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] on a non-2xx answer.
    pub async fn call(&self, method: Method, path: &str) -> Result<()> {
        self.send(method, path, |r| r).await.map(drop)
    }

    /// Send a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] on a non-2xx answer.
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Response> {
        self.send(method, path, |r| r.json(body)).await
    }

    /// POST a multipart body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] on a non-2xx answer.
    pub async fn post_multipart(&self, path: &str, parts: Vec<FormPart>) -> Result<Response> {
        let form = to_form(parts)?;
        self.send(Method::POST, path, |r| r.multipart(form)).await
    }

    // ------------------------------------------------------------------
    // Streams
    // ------------------------------------------------------------------

    /// Open a server-sent event stream.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] on a non-2xx answer.
    pub async fn open_stream(&self, path: &str) -> Result<Response> {
        let url = self.url(path)?;
        debug!(%url, "opening event stream");
        let response = self
            .inner
            .stream_http
            .get(url)
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        check_status(path, response).await
    }

    async fn send<F>(&self, method: Method, path: &str, build: F) -> Result<Response>
    where
        F: FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    {
        let url = self.url(path)?;
        debug!(%method, %url, "request");
        let response = build(self.inner.http.request(method, url)).send().await?;
        check_status(path, response).await
    }
}

/// Turn a non-2xx response into [`ClientError::Status`].
async fn check_status(path: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!(path, %status, "request rejected");
    Err(ClientError::Status {
        status: status.as_u16(),
        endpoint: path.to_string(),
        body,
    })
}

fn to_form(parts: Vec<FormPart>) -> Result<Form> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File { name, file } => {
                let part = Part::bytes(file.content)
                    .file_name(file.file_name)
                    .mime_str(&file.mime_type)?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(ClientConfig::with_base_url("http://127.0.0.1:4000").expect("url"))
            .expect("client")
    }

    #[test]
    fn url_joins_relative_and_absolute_paths() {
        let c = client();
        assert_eq!(
            c.url("member/ls").expect("url").as_str(),
            "http://127.0.0.1:4000/member/ls"
        );
        assert_eq!(
            c.url("/docker/container/state/abc").expect("url").as_str(),
            "http://127.0.0.1:4000/docker/container/state/abc"
        );
    }

    #[test]
    fn cookies_round_trip_through_header() {
        let c = client();
        assert!(c.cookie_header().is_none());
        c.restore_cookies("session=abc123; theme=dark");
        let header = c.cookie_header().expect("cookies");
        assert!(header.contains("session=abc123"));
        assert!(header.contains("theme=dark"));
    }

    #[test]
    fn multipart_rejects_bad_mime() {
        let parts = vec![FormPart::File {
            name: "file",
            file: cvt_core::UploadFile {
                file_name: "a.tar".into(),
                mime_type: "not a mime".into(),
                content: vec![1],
            },
        }];
        assert!(to_form(parts).is_err());
    }
}
