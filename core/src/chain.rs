use crate::{Context, Error, ProvideCredential, Result};
use async_trait::async_trait;
use std::fmt::{self, Debug};

/// A chain of credential providers that will be tried in order.
///
/// The first provider returning a credential wins. Providers returning `None`
/// are skipped silently; providers returning an error are logged and skipped.
/// If the chain is exhausted and at least one provider failed, the collected
/// failures are returned as a [`crate::ErrorKind::CredentialUnavailable`] error.
///
/// # Example
///
/// ```no_run
/// use aztables_core::{Context, ProvideCredential, ProvideCredentialChain, Result};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct NeverProvider;
///
/// #[async_trait]
/// impl ProvideCredential for NeverProvider {
///     type Credential = String;
///
///     async fn provide_credential(&self, _: &Context) -> Result<Option<String>> {
///         Ok(None)
///     }
/// }
///
/// let chain = ProvideCredentialChain::new()
///     .push(NeverProvider)
///     .push(NeverProvider);
/// assert_eq!(chain.len(), 2);
/// ```
pub struct ProvideCredentialChain<C> {
    providers: Vec<Box<dyn ProvideCredential<Credential = C>>>,
}

impl<C> ProvideCredentialChain<C>
where
    C: Send + Sync + Unpin + 'static,
{
    /// Create a new empty credential provider chain.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Add a credential provider to the end of the chain.
    pub fn push(mut self, provider: impl ProvideCredential<Credential = C> + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Add a credential provider to the front of the chain.
    pub fn push_front(
        mut self,
        provider: impl ProvideCredential<Credential = C> + 'static,
    ) -> Self {
        self.providers.insert(0, Box::new(provider));
        self
    }

    /// Number of providers in the chain.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if the chain has no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl<C> Default for ProvideCredentialChain<C>
where
    C: Send + Sync + Unpin + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Debug for ProvideCredentialChain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvideCredentialChain")
            .field("providers", &self.providers)
            .finish()
    }
}

#[async_trait]
impl<C> ProvideCredential for ProvideCredentialChain<C>
where
    C: Send + Sync + Unpin + 'static,
{
    type Credential = C;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let mut failures = Vec::new();

        for provider in &self.providers {
            log::debug!("trying credential provider: {provider:?}");

            match provider.provide_credential(ctx).await {
                Ok(Some(cred)) => {
                    log::debug!("loaded credential from provider: {provider:?}");
                    return Ok(Some(cred));
                }
                Ok(None) => {
                    log::debug!("no credential found in provider: {provider:?}");
                }
                Err(err) => {
                    log::warn!("failed to load credential from provider {provider:?}: {err}");
                    failures.push(format!("{provider:?}: {err}"));
                }
            }
        }

        if failures.is_empty() {
            return Ok(None);
        }

        Err(Error::credential_unavailable(format!(
            "no credential source in the chain produced a credential: {}",
            failures.join("; ")
        )))
    }
}
