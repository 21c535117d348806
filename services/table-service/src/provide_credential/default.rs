use crate::provide_credential::{
    AzureCliCredentialProvider, ClientSecretCredentialProvider, DeviceCodeCredentialProvider,
    EnvCredentialProvider, ImdsCredentialProvider, WorkloadIdentityCredentialProvider,
};
use crate::Credential;
use async_trait::async_trait;
use aztables_core::{Context, ProvideCredential, ProvideCredentialChain, Result};

/// Default loader that will try to load credentials from a fixed list of
/// sources, in order:
///
/// 1. `AZURE_STORAGE_BEARER_TOKEN`
/// 2. Service principal client secret
/// 3. Workload identity
/// 4. Managed identity (App Service or IMDS), unless disabled with
///    [`DefaultCredentialProvider::with_managed_identity`]
/// 5. Azure CLI
/// 6. Device code sign-in, only with [`DefaultCredentialProvider::with_interactive`]
#[derive(Debug)]
pub struct DefaultCredentialProvider {
    managed_identity: bool,
    interactive: bool,
    chain: ProvideCredentialChain<Credential>,
}

impl Default for DefaultCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultCredentialProvider {
    /// Create a new default loader with managed identity and without the
    /// interactive fallback.
    pub fn new() -> Self {
        Self::build(true, false)
    }

    fn build(managed_identity: bool, interactive: bool) -> Self {
        let mut chain = ProvideCredentialChain::new()
            .push(EnvCredentialProvider::new())
            .push(ClientSecretCredentialProvider::new())
            .push(WorkloadIdentityCredentialProvider::new());
        if managed_identity {
            chain = chain.push(ImdsCredentialProvider::new());
        }
        chain = chain.push(AzureCliCredentialProvider::new());
        if interactive {
            chain = chain.push(DeviceCodeCredentialProvider::new());
        }

        Self {
            managed_identity,
            interactive,
            chain,
        }
    }

    /// Include or skip the managed identity source.
    ///
    /// Skipping it avoids the IMDS request and its timeout on machines that
    /// are not hosted in Azure.
    pub fn with_managed_identity(self, managed_identity: bool) -> Self {
        Self::build(managed_identity, self.interactive)
    }

    /// Allow falling back to device code sign-in when every other source is absent.
    pub fn with_interactive(self, interactive: bool) -> Self {
        Self::build(self.managed_identity, interactive)
    }
}

#[async_trait]
impl ProvideCredential for DefaultCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        self.chain.provide_credential(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use crate::testing::{MockCommandExecute, MockHttpSend};
    use aztables_core::{ErrorKind, HttpSend, StaticEnv};
    use bytes::Bytes;

    #[derive(Debug)]
    struct HangingHttpSend;

    #[async_trait]
    impl HttpSend for HangingHttpSend {
        async fn http_send(&self, _req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
            std::future::pending().await
        }
    }

    #[test]
    fn test_chain_length() {
        assert_eq!(DefaultCredentialProvider::new().chain.len(), 5);
        assert_eq!(
            DefaultCredentialProvider::new()
                .with_interactive(false)
                .chain
                .len(),
            5
        );
        assert_eq!(
            DefaultCredentialProvider::new()
                .with_interactive(true)
                .chain
                .len(),
            6
        );
        assert_eq!(
            DefaultCredentialProvider::new()
                .with_managed_identity(false)
                .chain
                .len(),
            4
        );
        assert_eq!(
            DefaultCredentialProvider::new()
                .with_interactive(true)
                .with_managed_identity(false)
                .chain
                .len(),
            5
        );
    }

    #[tokio::test]
    async fn test_env_token_wins() {
        let mock = MockHttpSend::new();
        let cmd = MockCommandExecute::new(0, r#"{"accessToken":"cli-token"}"#, "");
        let ctx = Context::new()
            .with_http_send(mock.clone())
            .with_command_execute(cmd.clone())
            .with_env(StaticEnv::from_pairs([(AZURE_STORAGE_BEARER_TOKEN, "env-token")]));

        let cred = DefaultCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(cred.token, "env-token");
        assert!(mock.requests().is_empty());
        assert!(cmd.calls().is_empty());
    }

    #[tokio::test]
    async fn test_falls_through_to_azure_cli() {
        let mock = MockHttpSend::new().fail(aztables_core::Error::service("connection refused"));
        let cmd = MockCommandExecute::new(0, r#"{"accessToken":"cli-token"}"#, "");
        let ctx = Context::new()
            .with_http_send(mock.clone())
            .with_command_execute(cmd.clone());

        let cred = DefaultCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(cred.token, "cli-token");
        // Only the managed identity request reached the network.
        assert_eq!(mock.requests().len(), 1);
        assert_eq!(cmd.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_configured() {
        let ctx = Context::new()
            .with_http_send(MockHttpSend::new())
            .with_command_execute(MockCommandExecute::missing());

        let cred = DefaultCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap();
        assert!(cred.is_none());
    }

    #[tokio::test]
    async fn test_interactive_failure_is_reported() {
        let ctx = Context::new()
            .with_http_send(MockHttpSend::new())
            .with_command_execute(MockCommandExecute::missing());

        let err = DefaultCredentialProvider::new()
            .with_interactive(true)
            .provide_credential(&ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CredentialUnavailable);
        assert!(err.to_string().contains("DeviceCodeCredentialProvider"));
    }

    #[tokio::test]
    async fn test_managed_identity_excluded() {
        let mock = MockHttpSend::new();
        let cmd = MockCommandExecute::new(0, r#"{"accessToken":"cli-token"}"#, "");
        let ctx = Context::new()
            .with_http_send(mock.clone())
            .with_command_execute(cmd.clone());

        let cred = DefaultCredentialProvider::new()
            .with_managed_identity(false)
            .provide_credential(&ctx)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(cred.token, "cli-token");
        assert!(mock.requests().is_empty());
        assert_eq!(cmd.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_managed_identity_excluded_skips_imds_timeout() {
        let cmd = MockCommandExecute::new(0, r#"{"accessToken":"cli-token"}"#, "");
        let ctx = Context::new()
            .with_http_send(HangingHttpSend)
            .with_command_execute(cmd);

        let started = tokio::time::Instant::now();
        let cred = DefaultCredentialProvider::new()
            .with_managed_identity(false)
            .provide_credential(&ctx)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(cred.token, "cli-token");
        assert_eq!(started.elapsed(), std::time::Duration::ZERO);
    }
}
