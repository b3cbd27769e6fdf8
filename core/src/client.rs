//! Pocket API client: authorization flow and add-item.
//!
//! # Design
//! Each network operation is split three ways, following the host-does-IO
//! layout of the rest of the crate:
//! - `build_*` validates input and produces an `HttpRequest`,
//! - `parse_*` turns an `HttpResponse` into a typed result,
//! - the async method composes the two through the client's `Transport`.
//!
//! Callers that run their own HTTP stack can use the `build_*`/`parse_*`
//! pairs directly. All three endpoints share the same plumbing: JSON request
//! bodies, `X-Error` on failure and form-encoded success bodies (add-item
//! ignores its body).
//!
//! Nothing is retried. If parsing fails after the service has already acted
//! (for instance a request token was issued), the remote state stays as is;
//! the caller simply starts the flow again.

use std::collections::HashMap;
use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{AddInput, Authorization, AuthorizeRequest, RequestTokenRequest};

#[cfg(feature = "reqwest-transport")]
use crate::transport::ReqwestTransport;

pub const DEFAULT_HOST: &str = "https://getpocket.com";
pub const API_PREFIX: &str = "/v3";
pub const ENDPOINT_REQUEST_TOKEN: &str = "/oauth/request";
pub const ENDPOINT_AUTHORIZE: &str = "/oauth/authorize";
pub const ENDPOINT_ADD: &str = "/add";
pub const X_ERROR_HEADER: &str = "X-Error";
/// Sent verbatim; the service accepts this non-standard token.
pub const CONTENT_TYPE_VALUE: &str = "application-json; charset=UTF8";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the Pocket v3 API.
///
/// Holds only the consumer key, the service host and a transport, none of
/// which change after construction, so a client can be shared freely between
/// tasks (wrap it in an `Arc`).
#[derive(Debug, Clone)]
pub struct PocketClient<T> {
    transport: T,
    consumer_key: String,
    host: String,
}

/// Builder for `PocketClient` with a non-default host, timeout or transport.
#[derive(Debug, Clone)]
pub struct PocketClientBuilder {
    consumer_key: String,
    host: String,
    timeout: Duration,
}

impl PocketClientBuilder {
    pub fn new(consumer_key: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            host: DEFAULT_HOST.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Scheme and authority of the service, e.g. `http://127.0.0.1:3000`.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Request timeout of the bundled transport. Ignored by `build_with`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[cfg(feature = "reqwest-transport")]
    pub fn build(self) -> Result<PocketClient<ReqwestTransport>> {
        self.check()?;
        let transport = ReqwestTransport::with_timeout(self.timeout)?;
        self.build_with(transport)
    }

    pub fn build_with<T: Transport>(self, transport: T) -> Result<PocketClient<T>> {
        self.check()?;
        Ok(PocketClient {
            transport,
            consumer_key: self.consumer_key,
            host: self.host.trim_end_matches('/').to_string(),
        })
    }

    fn check(&self) -> Result<()> {
        if self.consumer_key.is_empty() {
            return Err(Error::Config("consumer key is empty".to_string()));
        }
        let host = self.host.trim_end_matches('/');
        if host.is_empty() {
            return Err(Error::Config("host is empty".to_string()));
        }
        url::Url::parse(host).map_err(|e| Error::Config(format!("invalid host {host:?}: {e}")))?;
        Ok(())
    }
}

#[cfg(feature = "reqwest-transport")]
impl PocketClient<ReqwestTransport> {
    /// Client for `getpocket.com` with the default 5 second timeout.
    pub fn new(consumer_key: impl Into<String>) -> Result<Self> {
        PocketClientBuilder::new(consumer_key).build()
    }

    pub fn builder(consumer_key: impl Into<String>) -> PocketClientBuilder {
        PocketClientBuilder::new(consumer_key)
    }
}

impl<T> PocketClient<T> {
    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// URL the user must visit to approve `request_token`.
    ///
    /// Both values are inserted verbatim: percent-encode `redirect_url`
    /// beforehand if it contains `&`, `?` or `#`.
    pub fn get_authorization_url(&self, request_token: &str, redirect_url: &str) -> Result<String> {
        if request_token.is_empty() || redirect_url.is_empty() {
            return Err(Error::Validation("empty params".to_string()));
        }
        Ok(format!(
            "{}/auth/authorize?request_token={request_token}&redirect_uri={redirect_url}",
            self.host
        ))
    }

    pub fn build_request_token(&self, redirect_url: &str) -> Result<HttpRequest> {
        self.build_post(
            ENDPOINT_REQUEST_TOKEN,
            &RequestTokenRequest {
                consumer_key: &self.consumer_key,
                redirect_uri: redirect_url,
            },
        )
    }

    pub fn parse_request_token(&self, response: HttpResponse) -> Result<String> {
        check_status(&response)?;
        let mut values = decode_values(&response.body)?;
        match values.remove("code") {
            Some(code) if !code.is_empty() => Ok(code),
            _ => Err(Error::missing_field("request token")),
        }
    }

    pub fn build_authorize(&self, request_token: &str) -> Result<HttpRequest> {
        if request_token.is_empty() {
            return Err(Error::Validation("empty request token".to_string()));
        }
        self.build_post(
            ENDPOINT_AUTHORIZE,
            &AuthorizeRequest {
                consumer_key: &self.consumer_key,
                code: request_token,
            },
        )
    }

    pub fn parse_authorize(&self, response: HttpResponse) -> Result<Authorization> {
        check_status(&response)?;
        let mut values = decode_values(&response.body)?;
        let access_token = match values.remove("access_token") {
            Some(token) if !token.is_empty() => token,
            _ => return Err(Error::missing_field("access token")),
        };
        Ok(Authorization {
            access_token,
            username: values.remove("username").unwrap_or_default(),
        })
    }

    pub fn build_add_item(&self, input: &AddInput) -> Result<HttpRequest> {
        input.validate()?;
        self.build_post(ENDPOINT_ADD, &input.to_request(&self.consumer_key))
    }

    /// Success is the status code alone; the response body is not inspected.
    pub fn parse_add_item(&self, response: HttpResponse) -> Result<()> {
        check_status(&response)
    }

    fn build_post<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<HttpRequest> {
        let body = serde_json::to_string(body)?;
        Ok(HttpRequest {
            url: format!("{}{API_PREFIX}{endpoint}", self.host),
            headers: vec![("Content-Type".to_string(), CONTENT_TYPE_VALUE.to_string())],
            body,
        })
    }
}

impl<T: Transport> PocketClient<T> {
    /// Client for `getpocket.com` using a caller-supplied transport.
    pub fn with_transport(consumer_key: impl Into<String>, transport: T) -> Result<Self> {
        PocketClientBuilder::new(consumer_key).build_with(transport)
    }

    /// Obtain a request token to start the authorization flow.
    ///
    /// `redirect_url` is forwarded as-is; the service decides whether it is
    /// acceptable.
    pub async fn get_request_token(&self, ctx: &Context, redirect_url: &str) -> Result<String> {
        let request = self.build_request_token(redirect_url)?;
        let response = self.send(ctx, request).await?;
        self.parse_request_token(response)
    }

    /// Exchange an approved request token for an access token.
    pub async fn authorize(&self, ctx: &Context, request_token: &str) -> Result<Authorization> {
        let request = self.build_authorize(request_token)?;
        let response = self.send(ctx, request).await?;
        self.parse_authorize(response)
    }

    /// Save a URL to the user's list.
    pub async fn add_item(&self, ctx: &Context, input: &AddInput) -> Result<()> {
        let request = self.build_add_item(input)?;
        let response = self.send(ctx, request).await?;
        self.parse_add_item(response)
    }

    async fn send(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse> {
        debug!("POST {}", request.url);
        let response = ctx
            .run(self.transport.execute(request))
            .await
            .inspect_err(|e| debug!("request failed: {e}"))?;
        debug!("response status {}", response.status);
        Ok(response)
    }
}

/// Map a non-200 response to `Error::Protocol` carrying the `X-Error` text.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.status == 200 {
        return Ok(());
    }
    let message = response.header(X_ERROR_HEADER).unwrap_or_default().to_string();
    warn!("API error: status {} {X_ERROR_HEADER}: {message}", response.status);
    Err(Error::Protocol {
        status: Some(response.status),
        message,
    })
}

/// Decode a form-encoded body; for repeated keys the last value wins.
///
/// Rejects malformed percent escapes and `;` separators rather than passing
/// mangled values on.
pub(crate) fn decode_values(body: &str) -> Result<HashMap<String, String>> {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b';' => {
                return Err(Error::Encoding(
                    "failed to parse response body: invalid semicolon separator".to_string(),
                ))
            }
            b'%' => {
                let valid = bytes.len() > i + 2
                    && bytes[i + 1].is_ascii_hexdigit()
                    && bytes[i + 2].is_ascii_hexdigit();
                if !valid {
                    let end = (i + 3).min(bytes.len());
                    return Err(Error::Encoding(format!(
                        "failed to parse response body: invalid URL escape {:?}",
                        String::from_utf8_lossy(&bytes[i..end])
                    )));
                }
                i += 3;
            }
            _ => i += 1,
        }
    }
    Ok(url::form_urlencoded::parse(bytes).into_owned().collect())
}
