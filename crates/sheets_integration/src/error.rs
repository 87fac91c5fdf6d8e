use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("invalid service account key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
    #[error("token exchange with {token_uri} failed ({status}): {body}")]
    TokenExchange {
        token_uri: String,
        status: u16,
        body: String,
    },
    #[error("sheets api {method} {url} failed ({status}): {body}")]
    Api {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("invalid sheets api url: {0}")]
    Url(#[from] url::ParseError),
    #[error("failed to encode row: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{0}")]
    Rejected(String),
}

/// Configuration the form needs before it can write anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissingConfig {
    #[error("credentials are not configured: `gcp_service_account` is missing from the secrets")]
    Credentials,
    #[error("`SPREADSHEET_ID` is not configured")]
    SpreadsheetId,
}
