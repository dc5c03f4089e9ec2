//! OAuth2 client-credentials tokens.

use api_client::{Authentication, Secret};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthenticationErrorKind;

pub(crate) const CLIENT_CREDENTIALS: &str = "client_credentials";

/// Form body of a client-credentials grant.
#[derive(Debug, Serialize)]
pub(crate) struct ClientCredentialsGrant<'a> {
    pub(crate) grant_type: &'static str,
    pub(crate) client_id: &'a str,
    pub(crate) client_secret: &'a str,
}

/// The fields of a token response the client depends on. Others are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: Secret,
    expires_in: u64,
    refresh_token: Secret,
    refresh_expires_in: u64,
}

/// Tokens issued by the last successful client-credentials grant.
///
/// Lifetimes are reported by the token endpoint in seconds. The client never
/// refreshes or expires a token on its own; [TokenState::is_expired] is there
/// for callers who want to decide when to request a new one.
#[derive(Debug, Clone)]
pub struct TokenState {
    access_token: Secret,
    expires_in: u64,
    refresh_token: Secret,
    refresh_expires_in: u64,
    acquired_at: DateTime<Utc>,
}

impl TokenState {
    pub(crate) fn from_response(
        response: TokenResponse,
        acquired_at: DateTime<Utc>,
    ) -> Result<Self, AuthenticationErrorKind> {
        response
            .access_token
            .bearer()
            .map_err(AuthenticationErrorKind::InvalidToken)?;

        Ok(Self {
            access_token: response.access_token,
            expires_in: response.expires_in,
            refresh_token: response.refresh_token,
            refresh_expires_in: response.refresh_expires_in,
            acquired_at,
        })
    }

    /// Token state as issued at `acquired_at`, for implementations of
    /// [ServiceRegistry](crate::ServiceRegistry) which obtain tokens elsewhere.
    pub fn new(
        access_token: Secret,
        expires_in: u64,
        refresh_token: Secret,
        refresh_expires_in: u64,
        acquired_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            expires_in,
            refresh_token,
            refresh_expires_in,
            acquired_at,
        }
    }

    /// The bearer token sent with registry requests.
    pub fn access_token(&self) -> &Secret {
        &self.access_token
    }

    /// Lifetime of the access token in seconds.
    pub fn expires_in(&self) -> u64 {
        self.expires_in
    }

    /// The refresh token issued alongside the access token.
    pub fn refresh_token(&self) -> &Secret {
        &self.refresh_token
    }

    /// Lifetime of the refresh token in seconds.
    pub fn refresh_expires_in(&self) -> u64 {
        self.refresh_expires_in
    }

    /// When the token response was received.
    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// When the access token stops being valid.
    pub fn expires_at(&self) -> DateTime<Utc> {
        offset(self.acquired_at, self.expires_in)
    }

    /// When the refresh token stops being valid.
    pub fn refresh_expires_at(&self) -> DateTime<Utc> {
        offset(self.acquired_at, self.refresh_expires_in)
    }

    /// Whether the access token has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether the access token has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

fn offset(start: DateTime<Utc>, seconds: u64) -> DateTime<Utc> {
    i64::try_from(seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| start.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// The token held by a client, applied as `Authorization: Bearer` to every
/// authenticated request. Empty until the first grant succeeds.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionToken(Option<TokenState>);

impl SessionToken {
    pub(crate) fn token(&self) -> Option<&TokenState> {
        self.0.as_ref()
    }
}

impl From<TokenState> for SessionToken {
    fn from(token: TokenState) -> Self {
        SessionToken(Some(token))
    }
}

impl Authentication for SessionToken {
    fn authenticate<B>(&self, mut req: http::Request<B>) -> http::Request<B> {
        let Some(token) = &self.0 else {
            return req;
        };

        if req.headers().contains_key(http::header::AUTHORIZATION) {
            tracing::warn!("{} header already set", http::header::AUTHORIZATION);
            return req;
        }

        // Tokens are checked for header validity when they are stored.
        if let Ok(value) = token.access_token.bearer() {
            req.headers_mut().insert(http::header::AUTHORIZATION, value);
        }
        req
    }
}
