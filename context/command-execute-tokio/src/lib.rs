//! Tokio-based command execution implementation for aztables.
//!
//! `TokioCommandExecute` implements the `CommandExecute` trait from
//! `aztables_core` using Tokio's process spawning. The Azure CLI credential
//! provider uses it to run `az account get-access-token`.
//!
//! ## Example
//!
//! ```no_run
//! use aztables_core::Context;
//! use aztables_command_execute_tokio::TokioCommandExecute;
//!
//! #[tokio::main]
//! async fn main() {
//!     let ctx = Context::new().with_command_execute(TokioCommandExecute);
//!
//!     match ctx.command_execute("az", &["--version"]).await {
//!         Ok(output) if output.success() => {
//!             println!("{}", String::from_utf8_lossy(&output.stdout));
//!         }
//!         Ok(output) => eprintln!("az exited with {}", output.status),
//!         Err(e) => eprintln!("Failed to execute command: {}", e),
//!     }
//! }
//! ```

use async_trait::async_trait;
use aztables_core::{CommandExecute, CommandOutput, Error, Result};
use std::process::Stdio;
use tokio::process::Command;

/// Tokio-based implementation of the `CommandExecute` trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandExecute;

#[async_trait]
impl CommandExecute for TokioCommandExecute {
    async fn command_execute(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                Error::unexpected(format!("failed to execute command '{program}'")).with_source(e)
            })?;

        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
