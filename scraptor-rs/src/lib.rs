//! # scraptor-rs
//!
//! Wire types and a Rust client for the scraptor link tracking API.
//!
//! The service keeps a list of links per chat. A chat is registered once and
//! afterwards links can be added, listed and removed. Every link route is
//! scoped to a chat through the [`CHAT_ID_HEADER`] header.
//!
//! ## Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), scraptor_rs::ScraptorApiError> {
//! use scraptor_rs::{LinkRequest, ScraptorApi};
//!
//! let api = ScraptorApi::new().with_url("http://localhost:8080");
//!
//! api.register_chat(42).await?;
//!
//! let link = api
//!     .add_link(42, &LinkRequest::new("https://example.com", "news"))
//!     .await?;
//! println!("tracking link #{}", link.id);
//! # Ok(())
//! # }
//! ```
//!

use reqwest::{Method, StatusCode, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Header carrying the chat identifier on all `/links` routes.
pub const CHAT_ID_HEADER: &str = "Tg-Chat-Id";

/// Request payload for adding a link to a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
    /// The target to track, usually a URL.
    pub link: String,
    /// Free-form label.
    #[serde(default)]
    pub tag: String,
    /// Optional token the link is bound to. Omitted, `null` or `0` means no token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<i64>,
}

impl LinkRequest {
    /// Creates a request without a token.
    pub fn new(link: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            tag: tag.into(),
            token_id: None,
        }
    }

    /// Binds the link to an existing token.
    pub fn with_token(mut self, token_id: i64) -> Self {
        self.token_id = Some(token_id);
        self
    }
}

/// Request payload for removing a link from a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteLinkRequest {
    /// The target that was previously added.
    pub link: String,
}

/// A link as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkResponse {
    pub id: i64,
    pub link: String,
    pub tag: String,
    /// `null` when the link carries no token.
    pub token_id: Option<i64>,
}

/// All links of a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListLinksResponse {
    pub links: Vec<LinkResponse>,
    pub size: usize,
}

impl From<Vec<LinkResponse>> for ListLinksResponse {
    fn from(links: Vec<LinkResponse>) -> Self {
        Self {
            size: links.len(),
            links,
        }
    }
}

/// Error body returned by the API for every non-success status.
///
/// Keys are camelCase on the wire (`exceptionName`, `exceptionMessage`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Human readable summary.
    pub description: String,
    /// HTTP status code as a string, e.g. `"404"`.
    pub code: String,
    /// Stable error kind, e.g. `"NotFound"` or `"Duplicate"`.
    pub exception_name: String,
    /// Underlying error message.
    pub exception_message: String,
}

/// Errors that can occur when interacting with the scraptor API.
#[derive(Debug, Error)]
pub enum ScraptorApiError {
    /// An error occurred during client configuration (e.g., invalid URL parsing).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    /// An error occurred while sending the HTTP request or receiving the response.
    #[error("Request error: {0}")]
    RequestError(String),
    /// An error occurred while deserializing the API response.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    /// The API answered with a non-success status.
    #[error("API error {status}: {}", .body.description)]
    ApiError {
        status: StatusCode,
        body: ApiErrorResponse,
    },
}

/// A client for the scraptor API.
///
/// # Example
///
/// ```rust,no_run
/// # async fn example() -> Result<(), scraptor_rs::ScraptorApiError> {
/// use scraptor_rs::ScraptorApi;
///
/// let api = ScraptorApi::new().with_url("http://scraptor.internal:8080");
/// let links = api.list_links(42).await?;
/// println!("{} links", links.size);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ScraptorApi {
    url: String,
    client: reqwest::Client,
}

impl Default for ScraptorApi {
    fn default() -> Self {
        Self::new()
    }
}

impl ScraptorApi {
    /// Creates a new client pointing at `http://localhost:8080`.
    pub fn new() -> Self {
        Self {
            url: String::from("http://localhost:8080"),
            client: reqwest::Client::new(),
        }
    }

    /// Sets a custom API endpoint URL.
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.trim_end_matches('/').into();
        self
    }

    /// Registers a chat. Fails with a `400` API error if it already exists.
    pub async fn register_chat(&self, chat_id: i64) -> Result<(), ScraptorApiError> {
        let req = self.request(Method::POST, &format!("tg-chat/{chat_id}"))?;
        Self::send(req).await.map(|_| ())
    }

    /// Removes a chat together with its links.
    pub async fn delete_chat(&self, chat_id: i64) -> Result<(), ScraptorApiError> {
        let req = self.request(Method::DELETE, &format!("tg-chat/{chat_id}"))?;
        Self::send(req).await.map(|_| ())
    }

    /// Adds a link to a chat and returns the stored record.
    pub async fn add_link(
        &self,
        chat_id: i64,
        request: &LinkRequest,
    ) -> Result<LinkResponse, ScraptorApiError> {
        let req = self
            .request(Method::POST, "links")?
            .header(CHAT_ID_HEADER, chat_id)
            .json(request);
        Self::json(Self::send(req).await?).await
    }

    /// Lists all links of a chat.
    pub async fn list_links(&self, chat_id: i64) -> Result<ListLinksResponse, ScraptorApiError> {
        let req = self
            .request(Method::GET, "links")?
            .header(CHAT_ID_HEADER, chat_id);
        Self::json(Self::send(req).await?).await
    }

    /// Removes a link from a chat and returns its last state.
    pub async fn delete_link(
        &self,
        chat_id: i64,
        link: &str,
    ) -> Result<LinkResponse, ScraptorApiError> {
        let req = self
            .request(Method::DELETE, "links")?
            .header(CHAT_ID_HEADER, chat_id)
            .json(&DeleteLinkRequest {
                link: link.to_string(),
            });
        Self::json(Self::send(req).await?).await
    }

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, ScraptorApiError> {
        let url: Url = Url::parse(&format!("{}/{}", self.url, path))
            .map_err(|e| ScraptorApiError::ConfigurationError(e.to_string()))?;

        Ok(self.client.request(method, url))
    }

    async fn send(req: reqwest::RequestBuilder) -> Result<reqwest::Response, ScraptorApiError> {
        let resp = req
            .send()
            .await
            .map_err(|e| ScraptorApiError::RequestError(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = Self::json::<ApiErrorResponse>(resp).await?;
        Err(ScraptorApiError::ApiError { status, body })
    }

    async fn json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ScraptorApiError> {
        resp.json::<T>()
            .await
            .map_err(|e| ScraptorApiError::DeserializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_request_without_token() {
        let req: LinkRequest = serde_json::from_str(r#"{"link":"https://a.example"}"#).unwrap();
        assert_eq!(req, LinkRequest::new("https://a.example", ""));

        let req: LinkRequest =
            serde_json::from_str(r#"{"link":"https://a.example","tag":"news","token_id":null}"#)
                .unwrap();
        assert_eq!(req.token_id, None);

        let json = serde_json::to_string(&LinkRequest::new("x", "y")).unwrap();
        assert_eq!(json, r#"{"link":"x","tag":"y"}"#);
    }

    #[test]
    fn test_link_response_absent_token_is_null() {
        let resp = LinkResponse {
            id: 1,
            link: "https://a.example".to_string(),
            tag: "news".to_string(),
            token_id: None,
        };

        let json = serde_json::to_value(&resp).unwrap();
        assert!(json["token_id"].is_null());
    }

    #[test]
    fn test_error_body_keys() {
        let body = ApiErrorResponse {
            description: String::from("not found"),
            code: String::from("404"),
            exception_name: String::from("NotFound"),
            exception_message: String::from("not found"),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["exceptionName"], "NotFound");
        assert_eq!(json["exceptionMessage"], "not found");
        assert!(json.get("exception_name").is_none());
    }

    #[test]
    fn test_list_size() {
        let list = ListLinksResponse::from(vec![LinkResponse {
            id: 3,
            link: "l".to_string(),
            tag: String::new(),
            token_id: Some(7),
        }]);
        assert_eq!(list.size, 1);
    }

    #[test]
    fn test_with_url_trims_slash() {
        let api = ScraptorApi::new().with_url("http://host:1/");
        assert!(api.request(Method::GET, "links").is_ok());
        assert_eq!(api.url, "http://host:1");
    }
}
