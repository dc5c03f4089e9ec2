//! Error types for API Clients

use bytes::Bytes;
use thiserror::Error;

/// A boxed, thread-safe error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error occured while building or sending an HTTP request
#[derive(Debug, Error)]
pub enum Error {
    /// An error occured while sending the request
    #[error(transparent)]
    Request(hyperdriver::client::Error),

    /// The request could not be assembled
    #[error("Invalid request: {0}")]
    Build(#[from] http::Error),

    /// A request body or query string could not be encoded
    #[error("Encoding request: {0}")]
    Encode(#[source] BoxError),
}

impl From<hyperdriver::client::Error> for Error {
    fn from(error: hyperdriver::client::Error) -> Self {
        Error::Request(error)
    }
}

/// A response body as text, replacing invalid UTF-8, for error messages.
pub fn lossy(body: &Bytes) -> String {
    String::from_utf8_lossy(body).into_owned()
}
