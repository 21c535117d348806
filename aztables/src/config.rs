use aztables_core::{Context, Error, Result};
use aztables_table_service::table_endpoint;

/// Subscription the storage account belongs to.
pub const AZURE_SUBSCRIPTION_ID: &str = "AZURE_SUBSCRIPTION_ID";
/// Name of the storage account to list.
pub const STORAGE_ACCOUNT_NAME: &str = "STORAGE_ACCOUNT_NAME";
/// Overrides the table endpoint, e.g. for Azurite.
pub const AZURE_TABLES_ENDPOINT: &str = "AZURE_TABLES_ENDPOINT";
/// Enables device code sign-in as last credential source.
pub const AZURE_TABLES_INTERACTIVE: &str = "AZURE_TABLES_INTERACTIVE";
/// Leaves managed identity out of the credential chain.
pub const AZURE_TABLES_EXCLUDE_MANAGED_IDENTITY: &str = "AZURE_TABLES_EXCLUDE_MANAGED_IDENTITY";

/// Merge `.env` from the current directory or its parents into the process
/// environment.
///
/// A missing `.env` is fine, a malformed one is a config error.
pub fn load_dotenv() -> Result<()> {
    check_dotenv(dotenv::dotenv().map(|_| ()))
}

fn check_dotenv(res: std::result::Result<(), dotenv::Error>) -> Result<()> {
    match res {
        Ok(()) => Ok(()),
        Err(err) if err.not_found() => {
            log::debug!("no .env file found, using the process environment only");
            Ok(())
        }
        Err(err) => Err(Error::config_invalid("failed to load .env file").with_source(err)),
    }
}

fn env_flag(ctx: &Context, key: &str) -> bool {
    ctx.env_var_non_empty(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1"))
        .unwrap_or_default()
}

/// Settings of a listing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub subscription_id: String,
    pub storage_account_name: String,
    pub endpoint: Option<String>,
    pub interactive: bool,
    pub exclude_managed_identity: bool,
}

impl Config {
    /// Load the config through the env of `ctx`.
    ///
    /// `.env` is expected to be merged into the process environment already.
    pub fn from_env(ctx: &Context) -> Result<Self> {
        let subscription_id = ctx.env_var_non_empty(AZURE_SUBSCRIPTION_ID);
        let storage_account_name = ctx.env_var_non_empty(STORAGE_ACCOUNT_NAME);

        let (subscription_id, storage_account_name) = match (subscription_id, storage_account_name)
        {
            (Some(sub), Some(account)) => (sub.trim().to_string(), account.trim().to_string()),
            (sub, account) => {
                let missing: Vec<&str> = [
                    (AZURE_SUBSCRIPTION_ID, sub.is_none()),
                    (STORAGE_ACCOUNT_NAME, account.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, missing)| missing.then_some(name))
                .collect();

                return Err(Error::config_invalid(format!(
                    "Please set AZURE_SUBSCRIPTION_ID and STORAGE_ACCOUNT_NAME in .env file (missing: {})",
                    missing.join(", ")
                )));
            }
        };

        Ok(Self {
            subscription_id,
            storage_account_name,
            endpoint: ctx.env_var_non_empty(AZURE_TABLES_ENDPOINT),
            interactive: env_flag(ctx, AZURE_TABLES_INTERACTIVE),
            exclude_managed_identity: env_flag(ctx, AZURE_TABLES_EXCLUDE_MANAGED_IDENTITY),
        })
    }

    /// The table endpoint to talk to.
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim().to_string(),
            None => table_endpoint(&self.storage_account_name),
        }
    }
}
