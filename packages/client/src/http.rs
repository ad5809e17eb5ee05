//! `reqwest`-backed implementation of [`DashboardApi`].

use async_trait::async_trait;
use serde_json::Value;

use crate::{ClientError, DashboardApi, Method, RequestDescriptor, decode::backend_error};

/// Maximum body length included in parse-failure logs.
const BODY_PREVIEW_LEN: usize = 300;

const USER_AGENT: &str = concat!("tick-monitor/", env!("CARGO_PKG_VERSION"));

/// HTTP client for one backend instance.
///
/// The underlying [`reqwest::Client`] is built without a timeout: a request
/// that never answers leaves its view in the loading state, matching the
/// browser dashboard.
#[derive(Debug, Clone)]
pub struct HttpDashboardClient {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl HttpDashboardClient {
    /// Creates a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// * [`ClientError::InvalidUrl`] if `base_url` is not an absolute URL or
    ///   carries a query or fragment
    /// * [`ClientError::Http`] if the HTTP client cannot be built
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = reqwest::Url::parse(base_url).map_err(|e| ClientError::InvalidUrl {
            message: format!("{base_url}: {e}"),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                message: format!("{base_url}: not a base URL"),
            });
        }
        if base_url.query().is_some() || base_url.fragment().is_some() {
            return Err(ClientError::InvalidUrl {
                message: format!("{base_url}: base URL must not have a query or fragment"),
            });
        }
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, base_url })
    }

    fn request(&self, request: &RequestDescriptor) -> Result<reqwest::RequestBuilder, ClientError> {
        let url = request.url(&self.base_url)?;
        Ok(match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        })
    }

    /// Fetches a binary document (used for exports).
    ///
    /// # Errors
    ///
    /// * [`ClientError::Status`] if the backend answers with a non-success
    ///   status; the `error` field of a JSON body becomes the message
    /// * [`ClientError::Http`] on transport failures
    pub async fn download(&self, request: &RequestDescriptor) -> Result<Vec<u8>, ClientError> {
        log::debug!("download: {:?} {}", request.method, request.path);
        let response = self.request(request)?.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .as_ref()
                .and_then(backend_error);
            log::warn!("download {} failed with {status}", request.path);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        log::debug!("download {}: {} bytes", request.path, bytes.len());
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardClient {
    async fn send(&self, request: &RequestDescriptor) -> Result<Value, ClientError> {
        log::debug!("send: {:?} {} {:?}", request.method, request.path, request.query);
        let response = self.request(request)?.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .as_ref()
                .and_then(backend_error);
            log::warn!("{} answered {status}: {message:?}", request.path);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        serde_json::from_str(&text).map_err(|e| {
            log::error!(
                "JSON parse failed for {}: {e}\n  body preview: {}",
                request.path,
                preview(&text),
            );
            ClientError::Json(e)
        })
    }

    fn base_url(&self) -> &reqwest::Url {
        &self.base_url
    }
}

fn preview(text: &str) -> &str {
    if text.len() <= BODY_PREVIEW_LEN {
        return text;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
