use crate::constants::*;
use crate::token::{authority_url, parse_token_response, post_form, token_error, OAuthErrorResponse};
use crate::Credential;
use async_trait::async_trait;
use aztables_core::{Context, Error, ProvideCredential, Result};
use serde::Deserialize;
use std::time::Duration;

/// Interactive sign-in through the OAuth2 device authorization grant.
///
/// The provider asks Entra ID for a device code, prints the sign-in
/// instructions to stderr and polls the token endpoint until the user has
/// completed the login in a browser or the code expires.
///
/// This is the last resort of the default chain and only runs when enabled.
///
/// Reference: <https://learn.microsoft.com/en-us/entra/identity-platform/v2-oauth2-device-code>
#[derive(Debug, Clone, Default)]
pub struct DeviceCodeCredentialProvider {
    tenant_id: Option<String>,
    client_id: Option<String>,
}

impl DeviceCodeCredentialProvider {
    /// Create a new device code provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tenant ID, `organizations` is used if unset.
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the public client ID, the Azure CLI application is used if unset.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    expires_in: u64,
    #[serde(default = "default_interval")]
    interval: u64,
    message: String,
}

fn default_interval() -> u64 {
    5
}

#[async_trait]
impl ProvideCredential for DeviceCodeCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let tenant_id = self
            .tenant_id
            .clone()
            .or_else(|| ctx.env_var_non_empty(AZURE_TENANT_ID))
            .unwrap_or_else(|| "organizations".to_string());
        let client_id = self
            .client_id
            .clone()
            .unwrap_or_else(|| DEVELOPER_SIGN_ON_CLIENT_ID.to_string());
        let authority_host = ctx
            .env_var_non_empty(AZURE_AUTHORITY_HOST)
            .unwrap_or_else(|| AZURE_PUBLIC_CLOUD.to_string());

        let resp = post_form(
            ctx,
            &authority_url(&authority_host, &tenant_id, "devicecode"),
            &[("client_id", client_id.as_str()), ("scope", STORAGE_SCOPE)],
        )
        .await?;
        if !resp.status().is_success() {
            return Err(token_error("device code", resp.status(), resp.body()));
        }
        let code: DeviceCodeResponse = serde_json::from_slice(resp.body()).map_err(|e| {
            Error::unexpected("failed to parse device code response").with_source(e)
        })?;

        eprintln!("{}", code.message);

        let token_url = authority_url(&authority_host, &tenant_id, "token");
        let deadline = tokio::time::Instant::now() + Duration::from_secs(code.expires_in);
        let mut interval = Duration::from_secs(code.interval);

        loop {
            tokio::time::sleep(interval).await;
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::credential_denied(
                    "device code expired before sign-in completed",
                ));
            }

            let resp = post_form(
                ctx,
                &token_url,
                &[
                    ("grant_type", DEVICE_CODE_GRANT_TYPE),
                    ("client_id", client_id.as_str()),
                    ("device_code", code.device_code.as_str()),
                ],
            )
            .await?;
            if resp.status().is_success() {
                return parse_token_response("device code", resp.status(), resp.body()).map(Some);
            }

            match OAuthErrorResponse::parse(resp.body()).error.as_str() {
                "authorization_pending" => log::debug!("waiting for device code sign-in"),
                "slow_down" => interval += Duration::from_secs(5),
                _ => return Err(token_error("device code", resp.status(), resp.body())),
            }
        }
    }
}
