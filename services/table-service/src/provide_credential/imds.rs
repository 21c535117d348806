use crate::constants::*;
use crate::token::parse_token_response;
use crate::Credential;
use async_trait::async_trait;
use aztables_core::{Context, ProvideCredential, Result};
use bytes::Bytes;
use http::StatusCode;
use std::time::Duration;

/// Load credential from a managed identity.
///
/// Two hosting environments are supported:
///
/// - App Service / Functions / Container Apps, detected by `IDENTITY_ENDPOINT`
///   and `IDENTITY_HEADER`.
/// - Azure VMs and scale sets through the Instance Metadata Service (IMDS).
///
/// A user assigned identity can be selected on the builder or with
/// `AZURE_OBJECT_ID`, `AZURE_CLIENT_ID` or `AZURE_MSI_RES_ID`. Any identity
/// set on the builder takes precedence over the environment.
///
/// An unreachable endpoint means we're not running on Azure, and the provider
/// returns `None` so the chain can move on.
///
/// Reference: <https://learn.microsoft.com/en-us/entra/identity/managed-identities-azure-resources/how-to-use-vm-token>
#[derive(Debug, Clone)]
pub struct ImdsCredentialProvider {
    client_id: Option<String>,
    object_id: Option<String>,
    msi_res_id: Option<String>,
    endpoint: Option<String>,
    timeout: Duration,
}

impl Default for ImdsCredentialProvider {
    fn default() -> Self {
        Self {
            client_id: None,
            object_id: None,
            msi_res_id: None,
            endpoint: None,
            timeout: Duration::from_secs(2),
        }
    }
}

impl ImdsCredentialProvider {
    /// Create a new managed identity loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a user assigned identity by client id.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Select a user assigned identity by object id.
    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    /// Select a user assigned identity by ARM resource id.
    pub fn with_msi_res_id(mut self, msi_res_id: impl Into<String>) -> Self {
        self.msi_res_id = Some(msi_res_id.into());
        self
    }

    /// Override the IMDS token endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set how long to wait for the IMDS endpoint before giving up.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn identity(&self, ctx: &Context) -> Option<(&'static str, String)> {
        // Values set on the builder win over anything in the environment.
        let explicit = [
            ("object_id", &self.object_id),
            ("client_id", &self.client_id),
            ("msi_res_id", &self.msi_res_id),
        ];
        if let Some((key, value)) = explicit
            .into_iter()
            .find_map(|(key, value)| value.clone().map(|v| (key, v)))
        {
            return Some((key, value));
        }

        [
            ("object_id", AZURE_OBJECT_ID),
            ("client_id", AZURE_CLIENT_ID),
            ("msi_res_id", AZURE_MSI_RES_ID),
        ]
        .into_iter()
        .find_map(|(key, env)| ctx.env_var_non_empty(env).map(|v| (key, v)))
    }

    fn build_request(&self, ctx: &Context) -> Result<http::Request<Bytes>> {
        let identity = self.identity(ctx);
        let mut query = form_urlencoded::Serializer::new(String::new());

        let app_service = ctx
            .env_var_non_empty(IDENTITY_ENDPOINT)
            .zip(ctx.env_var_non_empty(IDENTITY_HEADER));

        let req = match app_service {
            Some((endpoint, header)) => {
                query
                    .append_pair("api-version", APP_SERVICE_API_VERSION)
                    .append_pair("resource", STORAGE_RESOURCE);
                if let Some((key, value)) = identity {
                    // App Service names these differently from IMDS.
                    let key = match key {
                        "object_id" => "principal_id",
                        "msi_res_id" => "mi_res_id",
                        other => other,
                    };
                    query.append_pair(key, &value);
                }
                http::Request::get(format!("{endpoint}?{}", query.finish()))
                    .header("X-IDENTITY-HEADER", header)
            }
            None => {
                let endpoint = self
                    .endpoint
                    .clone()
                    .or_else(|| ctx.env_var_non_empty(AZURE_IMDS_ENDPOINT))
                    .unwrap_or_else(|| IMDS_ENDPOINT.to_string());
                query
                    .append_pair("api-version", IMDS_API_VERSION)
                    .append_pair("resource", STORAGE_RESOURCE);
                if let Some((key, value)) = identity {
                    query.append_pair(key, &value);
                }
                http::Request::get(format!("{endpoint}?{}", query.finish()))
                    .header("Metadata", "true")
            }
        };

        Ok(req.body(Bytes::new())?)
    }
}

#[async_trait]
impl ProvideCredential for ImdsCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let req = self.build_request(ctx)?;
        let uri = req.uri().clone();

        let resp = match tokio::time::timeout(self.timeout, ctx.http_send(req)).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(err)) => {
                log::debug!("managed identity endpoint {uri} is not reachable: {err}");
                return Ok(None);
            }
            Err(_) => {
                log::debug!(
                    "managed identity endpoint {uri} did not answer within {:?}",
                    self.timeout
                );
                return Ok(None);
            }
        };

        // IMDS answers 400 when no identity is assigned and 404 when it is not available.
        if matches!(resp.status(), StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND) {
            log::debug!(
                "managed identity is not available: {}",
                String::from_utf8_lossy(resp.body())
            );
            return Ok(None);
        }

        parse_token_response("managed identity", resp.status(), resp.body()).map(Some)
    }
}
