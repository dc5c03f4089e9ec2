//! Errors returned by the service registry client.

use http::header::InvalidHeaderValue;
use http::{StatusCode, Uri};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Any failure of a registry client operation.
#[derive(Debug, Error)]
pub enum RegistryClientError {
    /// No access token could be obtained from the token endpoint.
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    /// An authenticated operation was called before an access token was requested.
    #[error("not authenticated: request an access token first")]
    NotAuthenticated,

    /// A registry endpoint answered with an error or with an unreadable body.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The status endpoint answered with a code other than 200 or 410.
    #[error("unexpected status {status} from {uri}: {body}")]
    UnexpectedStatus {
        /// Request URI
        uri: Uri,
        /// Status returned by the registry
        status: StatusCode,
        /// Response body
        body: String,
    },

    /// The request could not be delivered (network, TLS or timeout).
    #[error("transport: {0}")]
    Transport(#[source] hyperdriver::client::Error),
}

impl RegistryClientError {
    /// Whether the registry reported that a service does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Registry(RegistryError::NotFound { .. }))
    }

    /// Whether this is a [RegistryError], including [RegistryError::NotFound].
    pub fn is_registry_error(&self) -> bool {
        matches!(self, Self::Registry(_))
    }
}

impl From<api_client::Error> for RegistryClientError {
    fn from(error: api_client::Error) -> Self {
        match error {
            api_client::Error::Request(error) => RegistryClientError::Transport(error),
            error @ (api_client::Error::Build(_) | api_client::Error::Encode(_)) => {
                RegistryClientError::Registry(RegistryError::Request(error))
            }
        }
    }
}

/// A registry endpoint did not produce the expected JSON document.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry answered with a non-success status.
    #[error("registry returned {status} for {uri}: {body}")]
    Status {
        /// Request URI
        uri: Uri,
        /// Status returned by the registry
        status: StatusCode,
        /// Response body
        body: String,
    },

    /// The requested service does not exist (HTTP 404).
    #[error("service {service_id} not found: {body}")]
    NotFound {
        /// The service which was looked up
        service_id: String,
        /// Response body
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("invalid JSON from {uri}: {source}")]
    Deserialization {
        /// Request URI
        uri: Uri,
        /// Raw response body
        body: String,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },

    /// The response body could not be read.
    #[error("reading response body: {0}")]
    Body(#[source] BoxError),

    /// The service id cannot name a single service.
    #[error("invalid service id {service_id:?}")]
    InvalidServiceId {
        /// The rejected id
        service_id: String,
    },

    /// The supplied URL is not an absolute http(s) URL.
    #[error("invalid URL {url:?}: {source}")]
    InvalidUri {
        /// The rejected URL
        url: String,
        /// Why it was rejected
        #[source]
        source: api_client::uri::ParseUriError,
    },

    /// The request could not be built.
    #[error("building request: {0}")]
    Request(#[source] api_client::Error),
}

/// Why a token request failed.
#[derive(Debug, Error)]
pub enum AuthenticationErrorKind {
    /// The token endpoint could not be reached.
    #[error("token endpoint unreachable: {0}")]
    Transport(#[source] hyperdriver::client::Error),

    /// The token request could not be built.
    #[error("building token request: {0}")]
    Request(#[source] api_client::Error),

    /// The token endpoint answered with a non-success status.
    #[error("token endpoint returned {status}: {body}")]
    Status {
        /// Status returned by the token endpoint
        status: StatusCode,
        /// Response body
        body: String,
    },

    /// The token response body could not be read.
    #[error("reading token response: {0}")]
    Body(#[source] BoxError),

    /// The token response was not JSON or lacked a required field.
    #[error("invalid token response: {0}; body: {1}")]
    Deserialization(#[source] serde_json::Error, String),

    /// The access token cannot be sent in an HTTP header.
    #[error("access token is not a valid header value")]
    InvalidToken(#[source] InvalidHeaderValue),
}

/// The client-credentials grant failed.
#[derive(Debug, Error)]
#[error("authentication failed: {kind}")]
pub struct AuthenticationError {
    #[from]
    kind: AuthenticationErrorKind,
}

impl AuthenticationError {
    /// The reason authentication failed.
    pub fn kind(&self) -> &AuthenticationErrorKind {
        &self.kind
    }

    /// Status returned by the token endpoint, if it answered.
    pub fn status(&self) -> Option<StatusCode> {
        match &self.kind {
            AuthenticationErrorKind::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<AuthenticationErrorKind> for RegistryClientError {
    fn from(kind: AuthenticationErrorKind) -> Self {
        RegistryClientError::Authentication(kind.into())
    }
}
