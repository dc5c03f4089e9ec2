//! Client for a service registry.
//!
//! The registry keeps descriptors for registered services, the templates they
//! implement, their APIs and how to pair with them. Access is authorized with an
//! OAuth2 client-credentials grant: call
//! [ServiceRegistry::request_access_token] once, and the token is attached as
//! `Authorization: Bearer` to every following request.
//!
//! Responses are returned as untyped JSON ([serde_json::Value]) exactly as the
//! registry sent them.
//!
//! ```no_run
//! use service_registry::{ServiceRegistry, ServiceRegistryClient};
//!
//! # async fn run() -> Result<(), service_registry::RegistryClientError> {
//! let client = ServiceRegistryClient::new(
//!     "my-client",
//!     String::from("my-secret"),
//!     "https://auth.example/token".parse().unwrap(),
//! );
//! client.request_access_token().await?;
//! let sensors = client.get_services_implementing_template("sensor").await?;
//! println!("{sensors:#}");
//! # Ok(()) }
//! ```
//!
//! A blocking wrapper is available in [blocking].

use serde_json::Value;

pub mod blocking;
mod client;
mod config;
mod error;
mod pairing;
mod token;

pub use self::client::ServiceRegistryClient;
pub use self::config::{RegistryConfiguration, REGISTRY_API_BASE};
pub use self::error::{
    AuthenticationError, AuthenticationErrorKind, RegistryClientError, RegistryError,
};
pub use self::pairing::PairingResponse;
pub use self::token::TokenState;
pub use api_client::Secret;

/// Operations offered by the service registry.
///
/// Every operation except [ServiceRegistry::request_access_token] requires a
/// token and fails with [RegistryClientError::NotAuthenticated] without sending
/// anything when none is held.
#[async_trait::async_trait]
pub trait ServiceRegistry {
    /// Obtain an access token with the client-credentials grant, replacing any held token.
    async fn request_access_token(&self) -> Result<TokenState, RegistryClientError>;

    /// Register `service_id` with the given OAuth redirect URIs.
    async fn register_service(
        &self,
        service_id: &str,
        redirect_uris: &[String],
    ) -> Result<Value, RegistryClientError>;

    /// List the services implementing `template_name`.
    async fn get_services_implementing_template(
        &self,
        template_name: &str,
    ) -> Result<Value, RegistryClientError>;

    /// Fetch the descriptor of a service.
    async fn get_service(&self, service_id: &str) -> Result<Value, RegistryClientError>;

    /// Fetch the registry's pairing descriptor for a service.
    async fn get_service_pairing_info(
        &self,
        service_id: &str,
    ) -> Result<Value, RegistryClientError>;

    /// Fetch the API descriptor of a service.
    async fn get_service_api(&self, service_id: &str) -> Result<Value, RegistryClientError>;

    /// Whether a service is active (`true`) or gone (`false`).
    async fn get_service_status(&self, service_id: &str) -> Result<bool, RegistryClientError>;

    /// Fetch pairing info from an absolute URL, possibly on another host.
    ///
    /// The response is also kept as the client's last pairing info.
    async fn fetch_pairing_info(
        &self,
        service_pairing_url: &str,
    ) -> Result<PairingResponse, RegistryClientError>;

    /// List the templates known to the registry.
    ///
    /// Always requests a fresh access token first.
    async fn get_service_templates(&self) -> Result<Value, RegistryClientError>;
}
