//! List the tables of an Azure Storage account.
//!
//! The `list-tables` binary reads `AZURE_SUBSCRIPTION_ID` and
//! `STORAGE_ACCOUNT_NAME` from `.env` or the environment, authenticates with
//! the default credential chain and prints every table name of the account.
//!
//! ```text
//! Listing tables in myaccount:
//! ----------------------------------------
//! Orders
//! Customers
//! ```

mod config;
pub use config::*;

mod context;
pub use context::default_context;

mod printer;
pub use printer::print_tables;

#[cfg(test)]
mod testing;

use aztables_core::{Context, Result, Signer};
use aztables_table_service::{DefaultCredentialProvider, RequestSigner, TableServiceClient};
use std::io::Write;

/// Load the config, authenticate and print all tables to `out`.
///
/// Nothing is written before a credential has been obtained, so config and
/// authentication failures leave `out` untouched.
pub async fn run<W: Write>(ctx: Context, out: &mut W) -> Result<usize> {
    let config = Config::from_env(&ctx)?;
    log::debug!(
        "listing tables of storage account {} in subscription {}",
        config.storage_account_name,
        config.subscription_id
    );

    log::info!(
        "excluding managed identity authentication: {}",
        config.exclude_managed_identity
    );
    let loader = DefaultCredentialProvider::new()
        .with_managed_identity(!config.exclude_managed_identity)
        .with_interactive(config.interactive);
    let signer = Signer::new(ctx, loader, RequestSigner::new());
    signer.credential().await?;

    let client = TableServiceClient::new(config.endpoint(), signer);
    let mut tables = client.list_tables();
    print_tables(&config.storage_account_name, &mut tables, out).await
}
