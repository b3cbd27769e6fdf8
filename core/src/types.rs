//! Caller-facing inputs/outputs and the JSON payloads sent to Pocket.
//!
//! # Design
//! The wire payloads are crate-private: callers hand over an `AddInput` and
//! the client stamps the consumer key onto the outgoing record itself, so a
//! request can never leave without it.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Result of a successful authorization exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub access_token: String,
    /// May be empty if the service did not report one.
    pub username: String,
}

/// Item to save to the user's list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddInput {
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Sent as one comma-separated string, in this order.
    #[serde(default)]
    pub tags: Vec<String>,
    pub access_token: String,
}

impl AddInput {
    pub fn new(url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: access_token.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(Error::Validation("required URL value is empty".to_string()));
        }
        if self.access_token.is_empty() {
            return Err(Error::Validation("empty access token".to_string()));
        }
        Ok(())
    }

    pub(crate) fn to_request<'a>(&'a self, consumer_key: &'a str) -> AddRequest<'a> {
        AddRequest {
            url: &self.url,
            title: &self.title,
            tags: self.tags.join(","),
            access_token: &self.access_token,
            consumer_key,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestTokenRequest<'a> {
    pub consumer_key: &'a str,
    pub redirect_uri: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct AuthorizeRequest<'a> {
    pub consumer_key: &'a str,
    pub code: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddRequest<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub title: &'a str,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tags: String,
    pub access_token: &'a str,
    pub consumer_key: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_url() {
        let err = AddInput::new("", "token").validate().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn validate_rejects_empty_access_token() {
        let err = AddInput::new("https://example.com", "").validate().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn tags_are_joined_in_order() {
        let input = AddInput::new("https://example.com", "token").tags(["c", "a", "b"]);
        let body = serde_json::to_value(input.to_request("key")).unwrap();
        assert_eq!(body["tags"], "c,a,b");
        assert_eq!(body["consumer_key"], "key");
    }

    #[test]
    fn empty_title_and_tags_are_omitted() {
        let input = AddInput::new("https://example.com", "token");
        let body = serde_json::to_value(input.to_request("key")).unwrap();
        assert!(body.get("title").is_none());
        assert!(body.get("tags").is_none());
        assert_eq!(body["url"], "https://example.com");
        assert_eq!(body["access_token"], "token");
    }

    #[test]
    fn add_input_deserializes_with_defaults() {
        let input: AddInput =
            serde_json::from_str(r#"{"url":"https://example.com","access_token":"t"}"#).unwrap();
        assert!(input.title.is_empty());
        assert!(input.tags.is_empty());
    }
}
