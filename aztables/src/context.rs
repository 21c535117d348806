use aztables_command_execute_tokio::TokioCommandExecute;
use aztables_core::{Context, OsEnv};
use aztables_file_read_tokio::TokioFileRead;
use aztables_http_send_reqwest::ReqwestHttpSend;

/// Build a [`Context`] backed by tokio, reqwest and the process environment.
pub fn default_context() -> Context {
    Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv)
        .with_command_execute(TokioCommandExecute)
}
