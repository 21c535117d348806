use async_trait::async_trait;
use aztables_core::{CommandExecute, CommandOutput, Context, Error, HttpSend, Result, Signer};
use aztables_table_service::{RequestSigner, StaticCredentialProvider, TableServiceClient};
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Answers table listing requests with scripted pages and records the uris.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHttpSend {
    responses: Arc<Mutex<VecDeque<Result<http::Response<Bytes>>>>>,
    uris: Arc<Mutex<Vec<String>>>,
}

impl ScriptedHttpSend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, body: &str, next_table_name: Option<&str>) -> Self {
        let mut builder = http::Response::builder().status(200);
        if let Some(next) = next_table_name {
            builder = builder.header("x-ms-continuation-NextTableName", next);
        }
        let resp = builder.body(Bytes::from(body.to_string())).unwrap();
        self.responses.lock().unwrap().push_back(Ok(resp));
        self
    }

    pub fn fail(self, err: Error) -> Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn uris(&self) -> Vec<String> {
        self.uris.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpSend for ScriptedHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        self.uris.lock().unwrap().push(req.uri().to_string());

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::service("connection refused")))
    }
}

/// Behaves like a machine without the Azure CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAzureCli;

#[async_trait]
impl CommandExecute for NoAzureCli {
    async fn command_execute(&self, program: &str, _: &[&str]) -> Result<CommandOutput> {
        Err(Error::unexpected(format!("failed to execute command '{program}'")))
    }
}

/// An Azure CLI that is signed in and hands out a fixed token.
#[derive(Debug, Clone, Copy)]
pub struct SignedInAzureCli(pub &'static str);

#[async_trait]
impl CommandExecute for SignedInAzureCli {
    async fn command_execute(&self, _: &str, _: &[&str]) -> Result<CommandOutput> {
        Ok(CommandOutput {
            status: 0,
            stdout: format!(r#"{{"accessToken":"{}","tokenType":"Bearer"}}"#, self.0).into_bytes(),
            stderr: Vec::new(),
        })
    }
}

/// A client for `myaccount` signing with a fixed token.
pub fn client(mock: &ScriptedHttpSend) -> TableServiceClient {
    let ctx = Context::new().with_http_send(mock.clone());
    let signer = Signer::new(
        ctx,
        StaticCredentialProvider::new("table-token"),
        RequestSigner::new(),
    );
    TableServiceClient::new("https://myaccount.table.core.windows.net", signer)
}
