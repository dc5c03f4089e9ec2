//! Secret values such as client secrets and access tokens.

use std::borrow::Cow;
use std::fmt;

use http::header::InvalidHeaderValue;
use http::HeaderValue;
use serde::Deserialize;
use zeroize::Zeroize;

/// A credential or token which must not leak into logs.
///
/// `Debug` prints `Secret(****)`, owned values are zeroized on drop, and
/// header values built from a secret are marked sensitive.
///
/// Use [Secret::revealed] to get the underlying value.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(from = "String")]
pub struct Secret(Cow<'static, str>);

impl Secret {
    /// Expose the underlying value.
    pub fn revealed(&self) -> &str {
        &self.0
    }

    /// Build a sensitive `Authorization: Bearer <secret>` header value.
    pub fn bearer(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut header = HeaderValue::try_from(format!("Bearer {}", self.revealed()))?;
        header.set_sensitive(true);
        Ok(header)
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        if let Cow::Owned(ref mut s) = self.0 {
            s.zeroize()
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret(value.into())
    }
}

impl From<&'static str> for Secret {
    fn from(value: &'static str) -> Self {
        Secret(value.into())
    }
}

impl From<Cow<'static, str>> for Secret {
    fn from(value: Cow<'static, str>) -> Self {
        Secret(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_value() {
        let secret = Secret::from(String::from("client-secret-value"));

        assert_eq!(format!("{secret:?}"), "Secret(****)");
        assert_eq!(secret.revealed(), "client-secret-value");
    }

    #[test]
    fn bearer_header_is_sensitive() {
        let secret = Secret::from("token-123");
        let header = secret.bearer().unwrap();

        assert_eq!(header.to_str().unwrap(), "Bearer token-123");
        assert!(header.is_sensitive());
    }

    #[test]
    fn bearer_rejects_invalid_header_characters() {
        let secret = Secret::from("bad\ntoken");
        assert!(secret.bearer().is_err());
    }

    #[test]
    fn deserializes_from_string() {
        let secret: Secret = serde_json::from_str("\"s3cr3t\"").unwrap();
        assert_eq!(secret.revealed(), "s3cr3t");
    }
}
