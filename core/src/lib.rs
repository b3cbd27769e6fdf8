//! Async client for the Pocket (getpocket.com) v3 API.
//!
//! # Overview
//! Covers the three-legged authorization flow (request token, authorization
//! URL, access token) and adding items to a user's list.
//!
//! ```ignore
//! use pocket_core::{AddInput, Context, PocketClient};
//!
//! let client = PocketClient::new("1234-abcd1234abcd1234abcd1234")?;
//! let ctx = Context::background();
//! let code = client.get_request_token(&ctx, "myapp:authorized").await?;
//! let url = client.get_authorization_url(&code, "myapp:authorized")?;
//! // send the user to `url`, wait for the redirect ...
//! let auth = client.authorize(&ctx, &code).await?;
//! client
//!     .add_item(&ctx, &AddInput::new("https://example.com", &auth.access_token).tags(["rust"]))
//!     .await?;
//! ```
//!
//! # Design
//! - `PocketClient` holds only immutable configuration and a `Transport`.
//! - Each operation is split into `build_*` (produces request) and `parse_*`
//!   (consumes response); the async methods join them through the transport,
//!   and callers with their own HTTP stack can drive the halves directly.
//! - Every call takes a `Context` for cancellation and deadlines on top of
//!   the transport's own timeout.
//! - No retries, no token storage, no refresh. Those belong to the caller.

pub mod client;
pub mod context;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::{PocketClient, PocketClientBuilder};
pub use context::Context;
pub use error::{Error, ErrorKind, Result};
pub use http::{HttpRequest, HttpResponse};
#[cfg(feature = "reqwest-transport")]
pub use transport::ReqwestTransport;
pub use transport::Transport;
pub use types::{AddInput, Authorization};
