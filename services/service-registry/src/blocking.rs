//! A blocking service registry client.
//!
//! Each method runs the matching [ServiceRegistry] operation to completion on a
//! private single-threaded runtime, blocking the calling thread. These methods
//! must not be called from within an async runtime.

use std::io;
use std::sync::Arc;

use http::Uri;
use serde_json::Value;

use crate::{
    PairingResponse, RegistryClientError, RegistryConfiguration, Secret, ServiceRegistry,
    TokenState,
};

/// Blocking wrapper around [crate::ServiceRegistryClient].
#[derive(Debug, Clone)]
pub struct ServiceRegistryClient {
    inner: crate::ServiceRegistryClient,
    runtime: Arc<tokio::runtime::Runtime>,
}

impl ServiceRegistryClient {
    /// Create a blocking client for the default registry.
    pub fn new<I, S>(client_id: I, client_secret: S, token_url: Uri) -> io::Result<Self>
    where
        I: Into<String>,
        S: Into<Secret>,
    {
        Self::from_config(&RegistryConfiguration::new(
            client_id,
            client_secret,
            token_url,
        ))
    }

    /// Create a blocking client from a configuration.
    pub fn from_config(config: &RegistryConfiguration) -> io::Result<Self> {
        // The transport is created inside the runtime so its connections are driven by it.
        let runtime = runtime()?;
        let inner = {
            let _guard = runtime.enter();
            crate::ServiceRegistryClient::from_config(config)
        };
        Ok(Self {
            inner,
            runtime: Arc::new(runtime),
        })
    }

    /// Wrap an existing async client.
    pub fn from_client(inner: crate::ServiceRegistryClient) -> io::Result<Self> {
        Ok(Self {
            inner,
            runtime: Arc::new(runtime()?),
        })
    }

    /// The wrapped async client.
    pub fn client(&self) -> &crate::ServiceRegistryClient {
        &self.inner
    }

    /// See [crate::ServiceRegistryClient::token].
    pub fn token(&self) -> Option<TokenState> {
        self.inner.token()
    }

    /// See [crate::ServiceRegistryClient::last_pairing_info].
    pub fn last_pairing_info(&self) -> Option<PairingResponse> {
        self.inner.last_pairing_info()
    }

    /// See [ServiceRegistry::request_access_token].
    pub fn request_access_token(&self) -> Result<TokenState, RegistryClientError> {
        self.runtime.block_on(self.inner.request_access_token())
    }

    /// See [ServiceRegistry::register_service].
    pub fn register_service(
        &self,
        service_id: &str,
        redirect_uris: &[String],
    ) -> Result<Value, RegistryClientError> {
        self.runtime
            .block_on(self.inner.register_service(service_id, redirect_uris))
    }

    /// See [ServiceRegistry::get_services_implementing_template].
    pub fn get_services_implementing_template(
        &self,
        template_name: &str,
    ) -> Result<Value, RegistryClientError> {
        self.runtime
            .block_on(self.inner.get_services_implementing_template(template_name))
    }

    /// See [ServiceRegistry::get_service].
    pub fn get_service(&self, service_id: &str) -> Result<Value, RegistryClientError> {
        self.runtime.block_on(self.inner.get_service(service_id))
    }

    /// See [ServiceRegistry::get_service_pairing_info].
    pub fn get_service_pairing_info(&self, service_id: &str) -> Result<Value, RegistryClientError> {
        self.runtime
            .block_on(self.inner.get_service_pairing_info(service_id))
    }

    /// See [ServiceRegistry::get_service_api].
    pub fn get_service_api(&self, service_id: &str) -> Result<Value, RegistryClientError> {
        self.runtime
            .block_on(self.inner.get_service_api(service_id))
    }

    /// See [ServiceRegistry::get_service_status].
    pub fn get_service_status(&self, service_id: &str) -> Result<bool, RegistryClientError> {
        self.runtime
            .block_on(self.inner.get_service_status(service_id))
    }

    /// See [ServiceRegistry::fetch_pairing_info].
    pub fn fetch_pairing_info(
        &self,
        service_pairing_url: &str,
    ) -> Result<PairingResponse, RegistryClientError> {
        self.runtime
            .block_on(self.inner.fetch_pairing_info(service_pairing_url))
    }

    /// See [ServiceRegistry::get_service_templates].
    pub fn get_service_templates(&self) -> Result<Value, RegistryClientError> {
        self.runtime.block_on(self.inner.get_service_templates())
    }
}

fn runtime() -> io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}
