//! Core components for aztables.
//!
//! This crate provides the foundational types and traits shared by the table
//! service client and the `list-tables` binary.
//!
//! ## Overview
//!
//! - **Context**: A container that holds implementations for file reading, HTTP sending,
//!   command execution and environment access
//! - **Traits**: Abstract interfaces for credential loading (`ProvideCredential`) and
//!   request signing (`SignRequest`)
//! - **Chain**: [`ProvideCredentialChain`] tries an ordered list of credential providers
//! - **Signer**: Coordinates credential loading, caching and request signing
//!
//! ## Example
//!
//! ```no_run
//! use aztables_core::{Context, ProvideCredential, Result, SignRequest, Signer, SigningCredential};
//! use async_trait::async_trait;
//! use http::request::Parts;
//!
//! #[derive(Clone, Debug)]
//! struct MyToken(String);
//!
//! impl SigningCredential for MyToken {
//!     fn is_valid(&self) -> bool {
//!         !self.0.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MyProvider;
//!
//! #[async_trait]
//! impl ProvideCredential for MyProvider {
//!     type Credential = MyToken;
//!
//!     async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
//!         Ok(Some(MyToken("token".to_string())))
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MySigner;
//!
//! #[async_trait]
//! impl SignRequest for MySigner {
//!     type Credential = MyToken;
//!
//!     async fn sign_request(&self, _: &Context, req: &mut Parts, cred: &MyToken) -> Result<()> {
//!         req.headers.insert("authorization", format!("Bearer {}", cred.0).parse()?);
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let signer = Signer::new(Context::new(), MyProvider, MySigner);
//! let mut parts = http::Request::get("https://example.com").body(())?.into_parts().0;
//! signer.sign(&mut parts).await?;
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod time;
pub mod utils;

mod context;
pub use context::CommandExecute;
pub use context::CommandOutput;
pub use context::Context;
pub use context::Env;
pub use context::FileRead;
pub use context::HttpSend;
pub use context::OsEnv;
pub use context::StaticEnv;

mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{ProvideCredential, SignRequest, SigningCredential};
mod chain;
pub use chain::ProvideCredentialChain;
mod signer;
pub use signer::Signer;
