//! Transports execute `HttpRequest` values.
//!
//! # Design
//! `PocketClient` is generic over `Transport` so callers can bring their own
//! HTTP stack or a test double. A transport reports only I/O failures as
//! errors; any status code, including 4xx/5xx, comes back as an
//! `HttpResponse` for the client to interpret.

use async_trait::async_trait;

use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};

/// Executes a single HTTP request.
///
/// ```ignore
/// use async_trait::async_trait;
/// use pocket_core::{HttpRequest, HttpResponse, Result, Transport};
///
/// struct MyTransport;
///
/// #[async_trait]
/// impl Transport for MyTransport {
///     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
///         // POST `request.body` to `request.url` with `request.headers`
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).execute(request).await
    }
}

#[cfg(feature = "reqwest-transport")]
pub use self::reqwest_impl::ReqwestTransport;

#[cfg(feature = "reqwest-transport")]
mod reqwest_impl {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::Transport;
    use crate::client::DEFAULT_TIMEOUT;
    use crate::error::{Error, Result};
    use crate::http::{HttpRequest, HttpResponse};

    /// Async transport backed by `reqwest`.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        /// Transport with the default 5 second request timeout.
        pub fn new() -> Result<Self> {
            Self::with_timeout(DEFAULT_TIMEOUT)
        }

        pub fn with_timeout(timeout: Duration) -> Result<Self> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
            Ok(Self { client })
        }

        /// Wrap a preconfigured `reqwest::Client`. Its timeout settings apply.
        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
            let mut builder = self.client.post(&request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }

            let response = builder
                .body(request.body)
                .send()
                .await
                .map_err(|e| Error::Transport(format!("failed to send http request: {e}")))?;

            let status = response.status().as_u16();
            let headers = header_pairs(response.headers());
            let body = response
                .text()
                .await
                .map_err(|e| Error::Transport(format!("failed to read response body: {e}")))?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }

    /// Header values are kept even when they are not visible ASCII; invalid
    /// UTF-8 is replaced rather than dropped.
    pub(super) fn header_pairs(headers: &reqwest::header::HeaderMap) -> Vec<(String, String)> {
        headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }
}
