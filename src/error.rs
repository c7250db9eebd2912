//! Backend call errors and the one place they get reported.
//!
//! Every failed call ends up in [`report`]: it is logged and turned into a
//! single status-bar line.  Nothing is retried and nothing is fatal; the
//! visible symptom of a failure is that the expected update did not happen.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured backend URL can't carry request paths.
    #[error("invalid backend URL {url:?}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client itself could not be set up.
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request never produced a response (connection refused, reset, ...).
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-2xx status.
    #[error("{path} returned HTTP {status}")]
    Status { path: String, status: u16 },

    /// The body did not have the expected shape.
    #[error("unexpected response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Log a failed call and return the line to show in the status bar.
pub fn report(context: &str, err: &ApiError) -> String {
    log::error!("{context}: {err}");
    format!("{context} failed: {err}")
}
