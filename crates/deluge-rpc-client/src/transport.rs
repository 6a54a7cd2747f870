//! HTTP seam between the RPC layer and the network.
//!
//! The [`Transport`] trait is the only place the client touches HTTP, which keeps the session and
//! envelope logic testable against mocks and in-process fakes.

use std::time::Duration;

use reqwest::{
    Client,
    header::{COOKIE, SET_COOKIE},
    multipart::{Form, Part},
};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Content type Deluge expects for uploaded metainfo files.
const TORRENT_MIME: &str = "application/x-bittorrent";

/// Errors raised by a [`Transport`] before any envelope is looked at.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, DNS failure, timeout and the like.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success HTTP status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The response body was not JSON.
    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    Request(String),
}

/// A JSON POST to the RPC endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRequest {
    /// Endpoint URL.
    pub url: Url,
    /// Serialized envelope.
    pub body: Value,
    /// `name=value` session cookie to replay, if any.
    pub cookie: Option<String>,
}

/// A multipart POST carrying one torrent file.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartRequest {
    /// Endpoint URL.
    pub url: Url,
    /// Form field name.
    pub field: String,
    /// File name sent with the part.
    pub file_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
    /// `name=value` session cookie to replay, if any.
    pub cookie: Option<String>,
}

/// A decoded JSON response plus its cookie metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonResponse {
    /// Response body.
    pub body: Value,
    /// Raw `Set-Cookie` header values, in the order received.
    pub set_cookies: Vec<String>,
}

/// Trait that abstracts the HTTP operations the client needs.
/// This allows for mocking in tests and for plugging in another HTTP stack.
#[cfg_attr(test, mockall::automock)]
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// POST a JSON body and return the JSON response.
    async fn post_json(&self, request: JsonRequest) -> Result<JsonResponse, TransportError>;
    /// POST a multipart form with a single file part and return the JSON response.
    async fn post_multipart(
        &self,
        request: MultipartRequest,
    ) -> Result<JsonResponse, TransportError>;
}

/// [`Transport`] backed by a [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport whose requests give up after `timeout`.
    pub fn try_new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing [`reqwest::Client`].
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    async fn post_json(&self, request: JsonRequest) -> Result<JsonResponse, TransportError> {
        let mut builder = self.client.post(request.url).json(&request.body);
        if let Some(cookie) = request.cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let response = builder.send().await.map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn post_multipart(
        &self,
        request: MultipartRequest,
    ) -> Result<JsonResponse, TransportError> {
        let part = Part::bytes(request.bytes)
            .file_name(request.file_name)
            .mime_str(TORRENT_MIME)
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let form = Form::new().part(request.field, part);

        let mut builder = self.client.post(request.url).multipart(form);
        if let Some(cookie) = request.cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let response = builder.send().await.map_err(map_reqwest_error)?;
        read_json(response).await
    }
}

async fn read_json(response: reqwest::Response) -> Result<JsonResponse, TransportError> {
    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status(status.as_u16()));
    }

    let set_cookies = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
        .collect();
    let body = response
        .json::<Value>()
        .await
        .map_err(|e| TransportError::Decode(e.to_string()))?;

    Ok(JsonResponse { body, set_cookies })
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    match err.status() {
        Some(status) => TransportError::Status(status.as_u16()),
        None => TransportError::Network(err.to_string()),
    }
}

/// Returns `base` with `path` appended as a final segment, keeping any path prefix of `base`
/// (e.g. a reverse proxy mount such as `/deluge`).
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    if base.path().ends_with('/') {
        base.join(path)
    } else {
        let mut base = base.clone();
        base.set_path(&format!("{}/", base.path()));
        base.join(path)
    }
}
