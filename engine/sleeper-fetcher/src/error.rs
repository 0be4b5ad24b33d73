use std::path::PathBuf;
use thiserror::Error;
use weekly_report::PayloadError;

/// Failures talking to the Sleeper API or writing what it returned
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode brief: {0}")]
    Payload(#[from] PayloadError),

    #[error("failed to encode upcoming matchups: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;
