//! URI utilities.

use std::borrow::Cow;

use camino::Utf8Path;
use http::uri::PathAndQuery;
use http::Uri;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use ::serde::Serialize;
use thiserror::Error;
use url::Url;

/// Characters escaped when a value is embedded as a single path segment.
///
/// Everything outside the RFC 3986 `pchar` set is escaped, plus `/` so that the value
/// cannot introduce extra segments.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Percent-encode a value for use as exactly one path segment.
///
/// The dot segments `.` and `..` are escaped as well, so that path normalization
/// cannot remove the segment or climb out of it. An empty value stays empty and
/// must be rejected by the caller where an empty segment would be ambiguous.
pub fn encode_path_segment(segment: &str) -> Cow<'_, str> {
    match segment {
        "." => Cow::Borrowed("%2E"),
        ".." => Cow::Borrowed("%2E%2E"),
        _ => utf8_percent_encode(segment, PATH_SEGMENT).into(),
    }
}

/// Errors that can occur when parsing a URI.
#[derive(Debug, Error)]
pub enum ParseUriError {
    /// An error occurred while parsing the URL.
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// The URL is relative, or is not an http(s) URL with a host.
    #[error("not an absolute http(s) URL: {0}")]
    NotAbsolute(String),

    /// The URI is invalid, but URL parsing succeded.
    #[error("invalid URI: {0}")]
    Invalid(#[from] http::uri::InvalidUri),

    /// The URI parts could not be reassembled.
    #[error("invalid URI parts: {0}")]
    InvalidParts(#[from] http::uri::InvalidUriParts),

    /// Query parameters could not be encoded.
    #[error("encoding query: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),
}

/// Parse an absolute `http` or `https` URL into a [Uri].
pub fn parse_absolute(input: &str) -> Result<Uri, ParseUriError> {
    let url = Url::parse(input)?;
    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(ParseUriError::NotAbsolute(input.to_owned()));
    }

    Ok(url.as_str().parse()?)
}

/// Serialize and Deserialize a URI to and from a string.
pub mod serde {
    use http::Uri;
    use serde::{Deserialize as _, Deserializer};

    /// Deserialize a URI from a string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Uri, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }

    /// Serialize a URI as a string
    pub fn serialize<S>(uri: &Uri, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(uri)
    }
}

/// Extension trait for URIs.
pub trait UriExtension {
    /// Join a relative path onto the path of this URI, dropping any query.
    ///
    /// A path starting with `/` replaces the existing path.
    fn join<P: AsRef<str>>(self, path: P) -> Uri;

    /// Replace the query string with the form-encoded `query`.
    fn with_query<Q: Serialize + ?Sized>(self, query: &Q) -> Result<Uri, ParseUriError>;
}

impl UriExtension for Uri {
    fn join<P: AsRef<str>>(self, path: P) -> Uri {
        let mut parts = self.into_parts();

        let base = parts
            .path_and_query
            .as_ref()
            .map(PathAndQuery::path)
            .unwrap_or("/");
        let joined = Utf8Path::new(base).join(path.as_ref());
        parts.path_and_query = Some(
            PathAndQuery::from_maybe_shared(joined.into_string())
                .expect("joined path is a valid URI path"),
        );

        Uri::from_parts(parts).expect("joined URI is valid")
    }

    fn with_query<Q: Serialize + ?Sized>(self, query: &Q) -> Result<Uri, ParseUriError> {
        let query = serde_urlencoded::to_string(query)?;
        let mut parts = self.into_parts();

        let path = parts
            .path_and_query
            .as_ref()
            .map(PathAndQuery::path)
            .unwrap_or("/");
        let path_and_query = if query.is_empty() {
            path.to_owned()
        } else {
            format!("{path}?{query}")
        };
        parts.path_and_query = Some(PathAndQuery::from_maybe_shared(path_and_query)?);

        Ok(Uri::from_parts(parts)?)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn join_appends_segments() {
        let uri = "https://example.com/api".parse::<Uri>().unwrap();
        assert_eq!(
            uri.join("services").to_string(),
            "https://example.com/api/services"
        );

        let uri = "https://example.com/api/".parse::<Uri>().unwrap();
        assert_eq!(
            uri.join("services/svc1/register").to_string(),
            "https://example.com/api/services/svc1/register"
        );

        let uri = "https://example.com".parse::<Uri>().unwrap();
        assert_eq!(uri.join("api").to_string(), "https://example.com/api");
    }

    #[test]
    fn join_absolute_path_replaces() {
        let uri = "https://example.com/api/services".parse::<Uri>().unwrap();
        assert_eq!(
            uri.join("/resource").to_string(),
            "https://example.com/resource"
        );
    }

    #[test]
    fn with_query_encodes_values() {
        let uri = "https://example.com/api/services".parse::<Uri>().unwrap();
        let uri = uri.with_query(&[("template_name", "sensor")]).unwrap();
        assert_eq!(
            uri.to_string(),
            "https://example.com/api/services?template_name=sensor"
        );

        let uri = uri.with_query(&[("template_name", "a b&c")]).unwrap();
        assert_eq!(uri.query(), Some("template_name=a+b%26c"));
    }

    #[test]
    fn path_segment_encoding() {
        assert_eq!(encode_path_segment("svc1"), "svc1");
        assert_eq!(encode_path_segment("a/b"), "a%2Fb");
        assert_eq!(encode_path_segment("x?y#z"), "x%3Fy%23z");
        assert_eq!(encode_path_segment("50%"), "50%25");
        assert_eq!(encode_path_segment("urn:svc@host"), "urn:svc@host");
        assert_eq!(encode_path_segment("."), "%2E");
        assert_eq!(encode_path_segment(".."), "%2E%2E");
        assert_eq!(encode_path_segment("..."), "...");
        assert_eq!(encode_path_segment("v1.2"), "v1.2");
        assert_eq!(encode_path_segment(""), "");
    }

    #[test]
    fn parse_absolute_urls() {
        let uri = parse_absolute("https://pairing.example/services/svc1?x=1").unwrap();
        assert_eq!(uri.host(), Some("pairing.example"));
        assert_eq!(uri.query(), Some("x=1"));

        assert!(matches!(
            parse_absolute("/relative/path"),
            Err(ParseUriError::Url(_))
        ));
        assert!(matches!(
            parse_absolute("mailto:someone@example.com"),
            Err(ParseUriError::NotAbsolute(_))
        ));
    }
}
