#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Access to the tick monitor backend API.
//!
//! Requests are described declaratively by [`RequestDescriptor`]s built in
//! [`query`], sent through the [`DashboardApi`] trait, and decoded into the
//! typed responses of `tick_monitor_dashboard_models` by [`decode`].
//!
//! Every request is single-shot: there are no retries, no backoff and no
//! client-side timeouts. A failed request stays failed until the caller
//! asks again.

pub mod decode;
pub mod http;
pub mod query;

use async_trait::async_trait;

pub use http::HttpDashboardClient;
pub use query::{Method, QueryBuilder, RequestDescriptor};

/// Errors that can occur while talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (connection refused, reset, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the JSON shape we expected.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configured base URL or a derived request URL is unusable.
    #[error("Invalid URL: {message}")]
    InvalidUrl {
        /// Description of what went wrong.
        message: String,
    },

    /// The backend answered with a non-success status code.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Status {
        /// Numeric HTTP status.
        status: u16,
        /// The `error` field of the response body, when there was one.
        message: Option<String>,
    },

    /// The backend answered successfully but reported an application error
    /// (`{"error": "..."}`).
    #[error("Backend error: {message}")]
    Backend {
        /// Message provided by the backend.
        message: String,
    },
}

impl ClientError {
    /// The message the backend itself supplied, if any.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Backend { message } => Some(message),
            Self::Status { message, .. } => message.as_deref(),
            Self::Http(_) | Self::Json(_) | Self::InvalidUrl { .. } => None,
        }
    }
}

/// Transport seam between the dashboard and the backend.
///
/// [`HttpDashboardClient`] is the production implementation; tests provide
/// in-memory fakes that answer from scripted payloads.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// Sends a request and returns the parsed JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failures, non-success statuses,
    /// or bodies that are not JSON.
    async fn send(&self, request: &RequestDescriptor) -> Result<serde_json::Value, ClientError>;

    /// Base URL that request paths are resolved against.
    fn base_url(&self) -> &reqwest::Url;

    /// Absolute URL of a request, for navigation-style endpoints such as
    /// exports.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL cannot be built.
    fn url_for(&self, request: &RequestDescriptor) -> Result<reqwest::Url, ClientError> {
        request.url(self.base_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_only_for_backend_supplied_errors() {
        let backend = ClientError::Backend {
            message: "Модель не обучена".to_string(),
        };
        assert_eq!(backend.backend_message(), Some("Модель не обучена"));

        let status = ClientError::Status {
            status: 500,
            message: Some("db down".to_string()),
        };
        assert_eq!(status.backend_message(), Some("db down"));
        assert_eq!(status.to_string(), "HTTP 500: db down");

        let bare = ClientError::Status {
            status: 502,
            message: None,
        };
        assert_eq!(bare.backend_message(), None);
        assert_eq!(bare.to_string(), "HTTP 502: no details");

        let url = ClientError::InvalidUrl {
            message: "bad".to_string(),
        };
        assert_eq!(url.backend_message(), None);
    }
}
