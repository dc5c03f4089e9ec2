//! The async registry client.

use std::sync::Arc;

use api_client::error::lossy;
use api_client::uri::{encode_path_segment, parse_absolute};
use api_client::{ApiClient, ApiResponse, RequestBuilder, Secret};
use arc_swap::ArcSwapOption;
use bytes::Bytes;
use http::header::{HeaderValue, ACCEPT};
use http::{Method, StatusCode, Uri};
use serde::Serialize;
use serde_json::Value;

use crate::config::RegistryConfiguration;
use crate::error::{AuthenticationErrorKind, RegistryClientError, RegistryError};
use crate::pairing::PairingResponse;
use crate::token::{
    ClientCredentialsGrant, SessionToken, TokenResponse, TokenState, CLIENT_CREDENTIALS,
};
use crate::ServiceRegistry;

const SERVICES: &str = "services";
const TEMPLATES: &str = "resource/templates";
const APPLICATION_JSON: &str = "application/json";

#[derive(Debug)]
struct Credentials {
    client_id: String,
    client_secret: Secret,
    token_url: Uri,
}

#[derive(Debug, Serialize)]
struct Registration<'a> {
    redirect_uris: &'a [String],
}

/// The endpoint of a service, or of one of its resources, relative to the API root.
///
/// The id always occupies exactly one path segment. An empty id would address the
/// collection itself, so it is rejected.
fn service_endpoint(service_id: &str, resource: Option<&str>) -> Result<String, RegistryError> {
    if service_id.is_empty() {
        return Err(RegistryError::InvalidServiceId {
            service_id: service_id.to_owned(),
        });
    }

    let service_id = encode_path_segment(service_id);
    Ok(match resource {
        Some(resource) => format!("{SERVICES}/{service_id}/{resource}"),
        None => format!("{SERVICES}/{service_id}"),
    })
}

/// Client for the service registry.
///
/// Clones share the held access token, the last pairing response and the
/// transport. Replacing the token is atomic, but nothing makes a sequence of
/// calls atomic: another clone may request a new token between two requests.
#[derive(Debug, Clone)]
pub struct ServiceRegistryClient {
    client: ApiClient<SessionToken>,
    credentials: Arc<Credentials>,
    pairing: Arc<ArcSwapOption<PairingResponse>>,
}

impl ServiceRegistryClient {
    /// Create a client for the default registry.
    pub fn new<I, S>(client_id: I, client_secret: S, token_url: Uri) -> Self
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

    /// Create a client from a configuration.
    pub fn from_config(config: &RegistryConfiguration) -> Self {
        let client = ApiClient::with_options(
            config.api_base.clone(),
            SessionToken::default(),
            config.transport_options(),
        );
        Self::from_api_client(config, client)
    }

    /// Create a client which sends its requests through `transport`.
    pub fn with_transport<S>(config: &RegistryConfiguration, transport: S) -> Self
    where
        S: tower::Service<
                http::Request<hyperdriver::Body>,
                Response = http::Response<hyperdriver::Body>,
                Error = hyperdriver::client::Error,
            > + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        let client = ApiClient::new_with_inner_service(
            config.api_base.clone(),
            SessionToken::default(),
            transport,
            config.timeout,
        );
        Self::from_api_client(config, client)
    }

    fn from_api_client(config: &RegistryConfiguration, client: ApiClient<SessionToken>) -> Self {
        Self {
            client,
            credentials: Arc::new(Credentials {
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                token_url: config.token_url.clone(),
            }),
            pairing: Default::default(),
        }
    }

    /// The token obtained by the last successful [ServiceRegistry::request_access_token].
    pub fn token(&self) -> Option<TokenState> {
        self.client.auth().token().cloned()
    }

    /// Whether an access token is held.
    pub fn is_authenticated(&self) -> bool {
        self.client.auth().token().is_some()
    }

    /// The response of the last successful [ServiceRegistry::fetch_pairing_info].
    pub fn last_pairing_info(&self) -> Option<PairingResponse> {
        self.pairing.load_full().map(|pairing| (*pairing).clone())
    }

    /// The registry API root.
    pub fn api_base(&self) -> &Uri {
        self.client.base()
    }

    fn authenticated(&self) -> Result<(), RegistryClientError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            tracing::debug!("registry request attempted before authentication");
            Err(RegistryClientError::NotAuthenticated)
        }
    }

    async fn collect(response: ApiResponse) -> Result<(StatusCode, Uri, Bytes), RegistryError> {
        let status = response.status();
        let uri = response.uri().clone();
        let body = response.bytes().await.map_err(RegistryError::Body)?;
        Ok((status, uri, body))
    }

    /// Send a registry request and decode its JSON response.
    ///
    /// A 404 becomes [RegistryError::NotFound] when `service_id` names the looked-up service.
    async fn send_json(
        &self,
        request: RequestBuilder<SessionToken>,
        service_id: Option<&str>,
    ) -> Result<Value, RegistryClientError> {
        self.authenticated()?;

        let response = request
            .header(ACCEPT, HeaderValue::from_static(APPLICATION_JSON))
            .send()
            .await?;
        let (status, uri, body) = Self::collect(response).await?;

        if !status.is_success() {
            tracing::error!(%status, %uri, "error response from registry");

            let body = lossy(&body);
            return Err(match (status, service_id) {
                (StatusCode::NOT_FOUND, Some(service_id)) => RegistryError::NotFound {
                    service_id: service_id.to_owned(),
                    body,
                },
                _ => RegistryError::Status { uri, status, body },
            }
            .into());
        }

        tracing::trace!(%uri, "registry response: {}", String::from_utf8_lossy(&body));
        serde_json::from_slice(&body).map_err(|source| {
            RegistryError::Deserialization {
                uri,
                body: lossy(&body),
                source,
            }
            .into()
        })
    }

    async fn fetch_token(&self) -> Result<TokenState, AuthenticationErrorKind> {
        let grant = ClientCredentialsGrant {
            grant_type: CLIENT_CREDENTIALS,
            client_id: &self.credentials.client_id,
            client_secret: self.credentials.client_secret.revealed(),
        };

        let response = self
            .client
            .request(Method::POST, self.credentials.token_url.clone())
            .without_authentication()
            .header(ACCEPT, HeaderValue::from_static(APPLICATION_JSON))
            .form(&grant)
            .map_err(AuthenticationErrorKind::Request)?
            .send()
            .await
            .map_err(|error| match error {
                api_client::Error::Request(error) => AuthenticationErrorKind::Transport(error),
                other => AuthenticationErrorKind::Request(other),
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(AuthenticationErrorKind::Body)?;

        if !status.is_success() {
            tracing::error!(%status, "error response from token endpoint");
            return Err(AuthenticationErrorKind::Status {
                status,
                body: lossy(&body),
            });
        }

        let token: TokenResponse = serde_json::from_slice(&body)
            .map_err(|error| AuthenticationErrorKind::Deserialization(error, lossy(&body)))?;
        TokenState::from_response(token, chrono::Utc::now())
    }
}

#[async_trait::async_trait]
impl ServiceRegistry for ServiceRegistryClient {
    #[tracing::instrument(skip(self), fields(client_id = %self.credentials.client_id))]
    async fn request_access_token(&self) -> Result<TokenState, RegistryClientError> {
        let token = self.fetch_token().await?;
        self.client.refresh_auth(SessionToken::from(token.clone()));

        tracing::debug!(
            expires_in = token.expires_in(),
            refresh_expires_in = token.refresh_expires_in(),
            "Acquired registry access token"
        );
        Ok(token)
    }

    #[tracing::instrument(skip(self))]
    async fn register_service(
        &self,
        service_id: &str,
        redirect_uris: &[String],
    ) -> Result<Value, RegistryClientError> {
        let request = self
            .client
            .post(&service_endpoint(service_id, Some("register"))?)
            .json(&Registration { redirect_uris })?;
        tracing::trace!(uri = %request.uri(), "registering service");

        let confirmation = self.send_json(request, None).await?;
        tracing::debug!("Registered service {service_id}");
        Ok(confirmation)
    }

    #[tracing::instrument(skip(self))]
    async fn get_services_implementing_template(
        &self,
        template_name: &str,
    ) -> Result<Value, RegistryClientError> {
        let request = self
            .client
            .get(SERVICES)
            .query(&[("template_name", template_name)])?;
        self.send_json(request, None).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_service(&self, service_id: &str) -> Result<Value, RegistryClientError> {
        let request = self.client.get(&service_endpoint(service_id, None)?);
        self.send_json(request, Some(service_id)).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_service_pairing_info(
        &self,
        service_id: &str,
    ) -> Result<Value, RegistryClientError> {
        let request = self.client.get(&service_endpoint(service_id, Some("pairing"))?);
        self.send_json(request, None).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_service_api(&self, service_id: &str) -> Result<Value, RegistryClientError> {
        let request = self.client.get(&service_endpoint(service_id, Some("api"))?);
        self.send_json(request, None).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_service_status(&self, service_id: &str) -> Result<bool, RegistryClientError> {
        self.authenticated()?;

        let response = self
            .client
            .get(&service_endpoint(service_id, Some("status"))?)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                tracing::debug!("Service {service_id} is active");
                Ok(true)
            }
            StatusCode::GONE => {
                tracing::debug!("Service {service_id} is gone");
                Ok(false)
            }
            _ => {
                let (status, uri, body) = Self::collect(response).await?;
                tracing::error!(%status, %uri, "unexpected status from registry");
                Err(RegistryClientError::UnexpectedStatus {
                    uri,
                    status,
                    body: lossy(&body),
                })
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_pairing_info(
        &self,
        service_pairing_url: &str,
    ) -> Result<PairingResponse, RegistryClientError> {
        self.authenticated()?;

        let uri = parse_absolute(service_pairing_url).map_err(|source| RegistryError::InvalidUri {
            url: service_pairing_url.to_owned(),
            source,
        })?;

        let response = self.client.request(Method::GET, uri).send().await?;
        let headers = response.headers().clone();
        let (status, uri, body) = Self::collect(response).await?;

        if !status.is_success() {
            tracing::error!(%status, %uri, "error response from pairing endpoint");
            return Err(RegistryError::Status {
                uri,
                status,
                body: lossy(&body),
            }
            .into());
        }

        let pairing = PairingResponse::new(uri, status, headers, body);
        self.pairing.store(Some(Arc::new(pairing.clone())));
        tracing::debug!(bytes = pairing.body().len(), "Fetched pairing info");
        Ok(pairing)
    }

    #[tracing::instrument(skip(self))]
    async fn get_service_templates(&self) -> Result<Value, RegistryClientError> {
        self.request_access_token().await?;

        let request = self.client.get(TEMPLATES);
        self.send_json(request, None).await
    }
}
