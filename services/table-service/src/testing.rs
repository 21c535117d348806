//! Mock context components for unit tests.

use async_trait::async_trait;
use aztables_core::{CommandExecute, CommandOutput, Error, HttpSend, Result};
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A request captured by [`MockHttpSend`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: http::Method,
    pub uri: String,
    pub headers: http::HeaderMap,
    pub body: String,
}

/// Replays scripted responses in order and records every request.
#[derive(Debug, Clone, Default)]
pub struct MockHttpSend {
    responses: Arc<Mutex<VecDeque<Result<http::Response<Bytes>>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpSend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.respond_with_headers(status, &[], body)
    }

    pub fn respond_with_headers(self, status: u16, headers: &[(&str, &str)], body: &str) -> Self {
        let mut builder = http::Response::builder().status(status);
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        let resp = builder.body(Bytes::from(body.to_string())).unwrap();
        self.responses.lock().unwrap().push_back(Ok(resp));
        self
    }

    pub fn fail(self, err: Error) -> Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let (parts, body) = req.into_parts();
        self.requests.lock().unwrap().push(RecordedRequest {
            method: parts.method,
            uri: parts.uri.to_string(),
            headers: parts.headers,
            body: String::from_utf8_lossy(&body).to_string(),
        });

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::service("connection refused")))
    }
}

/// Returns a fixed command output and records invocations.
#[derive(Debug, Clone, Default)]
pub struct MockCommandExecute {
    output: Option<CommandOutput>,
    calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl MockCommandExecute {
    pub fn new(status: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            output: Some(CommandOutput {
                status,
                stdout: stdout.as_bytes().to_vec(),
                stderr: stderr.as_bytes().to_vec(),
            }),
            calls: Arc::default(),
        }
    }

    /// Simulate a program that is not installed.
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecute for MockCommandExecute {
    async fn command_execute(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push((
            program.to_string(),
            args.iter().map(|s| s.to_string()).collect(),
        ));

        self.output
            .clone()
            .ok_or_else(|| Error::unexpected(format!("failed to execute command '{program}'")))
    }
}
