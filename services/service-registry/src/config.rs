//! Client configuration.

use std::time::Duration;

use api_client::{Secret, TransportOptions};
use http::Uri;
use serde::{Deserialize, Deserializer};

/// Root of the registry API; services live under `services/`.
pub const REGISTRY_API_BASE: &str = "https://sensorsystems.iais.fraunhofer.de/api";

fn default_api_base() -> Uri {
    Uri::from_static(REGISTRY_API_BASE)
}

/// Deserialize an optional, possibly fractional, number of seconds.
fn seconds<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)?
        .map(|seconds| Duration::try_from_secs_f64(seconds).map_err(serde::de::Error::custom))
        .transpose()
}

/// Service registry client configuration.
///
/// Supplied by the embedding application, either built in code or deserialized
/// from whatever configuration source it uses.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfiguration {
    /// OAuth2 client ID
    pub client_id: String,

    /// OAuth2 client secret
    pub client_secret: Secret,

    /// Token endpoint for the client-credentials grant
    #[serde(deserialize_with = "api_client::uri::serde::deserialize")]
    pub token_url: Uri,

    /// Root of the registry API
    #[serde(
        default = "default_api_base",
        deserialize_with = "api_client::uri::serde::deserialize"
    )]
    pub api_base: Uri,

    /// Bound on each request. Unbounded when absent.
    ///
    /// Read from `timeout_seconds`, which may be fractional.
    #[serde(default, rename = "timeout_seconds", deserialize_with = "seconds")]
    pub timeout: Option<Duration>,

    /// Bound on establishing each connection.
    ///
    /// Read from `connect_timeout_seconds`, which may be fractional.
    #[serde(default, rename = "connect_timeout_seconds", deserialize_with = "seconds")]
    pub connect_timeout: Option<Duration>,
}

impl RegistryConfiguration {
    /// Configuration for the default registry with no timeouts.
    pub fn new<I, S>(client_id: I, client_secret: S, token_url: Uri) -> Self
    where
        I: Into<String>,
        S: Into<Secret>,
    {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url,
            api_base: default_api_base(),
            timeout: None,
            connect_timeout: None,
        }
    }

    /// Point the client at a different registry API root.
    pub fn with_api_base(self, api_base: Uri) -> Self {
        Self { api_base, ..self }
    }

    /// Bound each request by `timeout`.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    /// Bound each connection attempt by `timeout`.
    pub fn with_connect_timeout(self, timeout: Duration) -> Self {
        Self {
            connect_timeout: Some(timeout),
            ..self
        }
    }

    pub(crate) fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_with_defaults() {
        let config: RegistryConfiguration = serde_json::from_value(serde_json::json!({
            "client_id": "atlas-client",
            "client_secret": "hunter2",
            "token_url": "https://auth.example/realms/atlas/protocol/openid-connect/token",
        }))
        .unwrap();

        assert_eq!(config.client_id, "atlas-client");
        assert_eq!(config.client_secret.revealed(), "hunter2");
        assert_eq!(config.api_base, Uri::from_static(REGISTRY_API_BASE));
        assert_eq!(config.timeout, None);
        assert_eq!(config.connect_timeout, None);
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn builder_sets_timeouts() {
        let config = RegistryConfiguration::new(
            "id",
            "secret",
            Uri::from_static("https://auth.example/token"),
        )
        .with_api_base(Uri::from_static("https://registry.example/api"))
        .with_timeout(Duration::from_secs(30))
        .with_connect_timeout(Duration::from_secs(5));

        let options = config.transport_options();
        assert_eq!(options.timeout, Some(Duration::from_secs(30)));
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.api_base.host(), Some("registry.example"));
    }

    #[test]
    fn sub_second_timeouts_are_kept() {
        let config = RegistryConfiguration::new(
            "id",
            "secret",
            Uri::from_static("https://auth.example/token"),
        )
        .with_timeout(Duration::from_millis(500))
        .with_connect_timeout(Duration::from_millis(1500));

        let options = config.transport_options();
        assert_eq!(options.timeout, Some(Duration::from_millis(500)));
        assert_eq!(options.connect_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn deserialize_fractional_seconds() {
        let config: RegistryConfiguration = serde_json::from_value(serde_json::json!({
            "client_id": "atlas-client",
            "client_secret": "hunter2",
            "token_url": "https://auth.example/token",
            "timeout_seconds": 0.25,
            "connect_timeout_seconds": 3,
        }))
        .unwrap();

        assert_eq!(config.timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(3)));

        let negative = serde_json::from_value::<RegistryConfiguration>(serde_json::json!({
            "client_id": "atlas-client",
            "client_secret": "hunter2",
            "token_url": "https://auth.example/token",
            "timeout_seconds": -1.0,
        }));
        assert!(negative.is_err());
    }
}
