use thiserror::Error;

/// Problems building a client, before any request is made
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("'{0}' is neither a URL nor an owner/name Space id")]
    InvalidSpace(String),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
