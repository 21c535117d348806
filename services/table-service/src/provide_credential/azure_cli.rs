use async_trait::async_trait;
use aztables_core::time::{from_unix_seconds, DateTime};
use aztables_core::{Context, Error, ProvideCredential, Result};
use serde::Deserialize;

use crate::constants::STORAGE_RESOURCE;
use crate::credential::Credential;

#[cfg(windows)]
const AZ_PROGRAM: &str = "az.cmd";
#[cfg(not(windows))]
const AZ_PROGRAM: &str = "az";

/// AzureCliCredentialProvider provides credentials from the Azure CLI.
///
/// It invokes `az account get-access-token` and reuses the login cached by
/// `az login`. A missing CLI or a CLI without a login is reported as `None`.
#[derive(Clone, Debug, Default)]
pub struct AzureCliCredentialProvider {
    tenant_id: Option<String>,
}

impl AzureCliCredentialProvider {
    /// Create a new Azure CLI provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the token for a specific tenant.
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureCliToken {
    access_token: String,
    /// Local time, e.g. `2023-10-31 21:59:10.000000`.
    expires_on: Option<String>,
    /// Unix seconds, only printed by azure-cli 2.54 and later.
    #[serde(rename = "expires_on")]
    expires_on_timestamp: Option<i64>,
}

impl AzureCliToken {
    fn expires_at(&self) -> Result<Option<DateTime>> {
        if let Some(ts) = self.expires_on_timestamp {
            return from_unix_seconds(ts).map(Some);
        }
        let Some(local) = &self.expires_on else {
            return Ok(None);
        };

        let naive = chrono::NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M:%S%.f")
            .map_err(|e| {
                Error::unexpected(format!("invalid expiresOn in Azure CLI output: {local}"))
                    .with_source(e)
            })?;
        Ok(naive
            .and_local_timezone(chrono::Local)
            .earliest()
            .map(|t| t.with_timezone(&chrono::Utc)))
    }
}

#[async_trait]
impl ProvideCredential for AzureCliCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let mut args = vec![
            "account",
            "get-access-token",
            "--resource",
            STORAGE_RESOURCE,
            "--output",
            "json",
        ];
        if let Some(tenant_id) = &self.tenant_id {
            args.extend(["--tenant", tenant_id.as_str()]);
        }

        let output = match ctx.command_execute(AZ_PROGRAM, &args).await {
            Ok(output) => output,
            Err(err) => {
                log::debug!("Azure CLI is not available: {err}");
                return Ok(None);
            }
        };

        if !output.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("az login") || stderr.contains("az account set") {
                log::debug!("Azure CLI is not logged in: {}", stderr.trim());
                return Ok(None);
            }
            return Err(Error::credential_invalid(format!(
                "Azure CLI command failed: {}",
                stderr.trim()
            )));
        }

        let token: AzureCliToken = serde_json::from_slice(&output.stdout).map_err(|e| {
            Error::unexpected("failed to parse Azure CLI output").with_source(e)
        })?;
        let expires_on = token.expires_at()?;

        Ok(Some(Credential::with_bearer_token(
            &token.access_token,
            expires_on,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockCommandExecute;
    use aztables_core::ErrorKind;

    const CLI_OUTPUT: &str = r#"{
        "accessToken": "cli-token",
        "expiresOn": "2030-10-31 21:59:10.000000",
        "expires_on": 1919714350,
        "subscription": "0b1f6471-1bf0-4dda-aec3-cb9272f09590",
        "tenant": "54826b22-38d6-4fb2-bad9-b7b93a3e9c5a",
        "tokenType": "Bearer"
    }"#;

    #[tokio::test]
    async fn test_azure_cli_success() {
        let cmd = MockCommandExecute::new(0, CLI_OUTPUT, "");
        let ctx = Context::new().with_command_execute(cmd.clone());

        let cred = AzureCliCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(cred.token, "cli-token");
        assert_eq!(cred.expires_on.unwrap().timestamp(), 1919714350);

        let (program, args) = &cmd.calls()[0];
        assert_eq!(program, AZ_PROGRAM);
        assert_eq!(
            args,
            &[
                "account",
                "get-access-token",
                "--resource",
                "https://storage.azure.com/",
                "--output",
                "json"
            ]
        );
    }

    #[tokio::test]
    async fn test_azure_cli_with_tenant() {
        let cmd = MockCommandExecute::new(0, CLI_OUTPUT, "");
        let ctx = Context::new().with_command_execute(cmd.clone());

        AzureCliCredentialProvider::new()
            .with_tenant_id("my-tenant")
            .provide_credential(&ctx)
            .await
            .unwrap()
            .unwrap();

        let (_, args) = &cmd.calls()[0];
        assert_eq!(&args[6..], &["--tenant", "my-tenant"]);
    }

    #[test]
    fn test_parse_local_expires_on() {
        let token: AzureCliToken = serde_json::from_str(
            r#"{"accessToken":"t","expiresOn":"2030-10-31 21:59:10.000000","tokenType":"Bearer"}"#,
        )
        .unwrap();

        let expires = token.expires_at().unwrap().unwrap();
        let local = expires.with_timezone(&chrono::Local);
        assert_eq!(
            local.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2030-10-31 21:59:10"
        );
    }

    #[tokio::test]
    async fn test_azure_cli_not_installed() {
        let ctx = Context::new().with_command_execute(MockCommandExecute::missing());

        let cred = AzureCliCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap();
        assert!(cred.is_none());
    }

    #[tokio::test]
    async fn test_azure_cli_not_logged_in() {
        let cmd = MockCommandExecute::new(1, "", "ERROR: Please run 'az login' to setup account.");
        let ctx = Context::new().with_command_execute(cmd);

        let cred = AzureCliCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap();
        assert!(cred.is_none());
    }

    #[tokio::test]
    async fn test_azure_cli_failure() {
        let cmd = MockCommandExecute::new(1, "", "ERROR: AADSTS50173: The provided grant has expired.");
        let ctx = Context::new().with_command_execute(cmd);

        let err = AzureCliCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
        assert!(err.to_string().contains("AADSTS50173"));
    }
}
