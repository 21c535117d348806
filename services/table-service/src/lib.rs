//! Azure Storage Table service client.
//!
//! This crate provides:
//!
//! - An ordered default credential chain producing bearer tokens for the
//!   storage audience (environment, workload identity, managed identity,
//!   Azure CLI, and an opt-in device code fallback)
//! - A request signer applying the bearer token to table service requests
//! - [`TableServiceClient`], which enumerates the tables of an account as a
//!   lazy, forward-only sequence
//!
//! # Example
//!
//! ```rust,no_run
//! use aztables_core::{Context, OsEnv, Result, Signer};
//! use aztables_table_service::{
//!     table_endpoint, DefaultCredentialProvider, RequestSigner, TableServiceClient,
//! };
//!
//! # async fn example(ctx: Context) -> Result<()> {
//! let signer = Signer::new(ctx, DefaultCredentialProvider::new(), RequestSigner::new());
//! let client = TableServiceClient::new(table_endpoint("myaccount"), signer);
//!
//! let mut tables = client.list_tables();
//! while let Some(table) = tables.next().await? {
//!     println!("{}", table.name);
//! }
//! # Ok(())
//! # }
//! ```

mod constants;

mod credential;
pub use credential::Credential;

mod endpoint;
pub use endpoint::{table_endpoint, TABLE_ENDPOINT_SUFFIX};

mod sign_request;
pub use sign_request::RequestSigner;

mod token;

mod provide_credential;
pub use provide_credential::*;

mod client;
pub use client::{ListTables, TableItem, TableServiceClient, TablesPage};

#[cfg(test)]
mod testing;
