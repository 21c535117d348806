use async_trait::async_trait;
use aztables_core::{Context, ProvideCredential, Result};

use crate::constants::AZURE_STORAGE_BEARER_TOKEN;
use crate::credential::Credential;

/// Load a pre-issued bearer token from `AZURE_STORAGE_BEARER_TOKEN`.
///
/// The token's expiry is unknown, so it is never refreshed.
#[derive(Clone, Debug, Default)]
pub struct EnvCredentialProvider {}

impl EnvCredentialProvider {
    /// Create a new env provider.
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        Ok(ctx
            .env_var_non_empty(AZURE_STORAGE_BEARER_TOKEN)
            .map(|token| Credential::with_bearer_token(token.trim(), None)))
    }
}
