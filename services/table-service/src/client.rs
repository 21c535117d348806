use crate::constants::*;
use crate::Credential;
use aztables_core::{Error, Result, Signer};
use bytes::Bytes;
use http::header::ACCEPT;
use http::StatusCode;
use serde::Deserialize;
use std::collections::VecDeque;

/// A table returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableItem {
    /// Name of the table.
    #[serde(rename = "TableName")]
    pub name: String,
}

/// One page of a table listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TablesPage {
    /// Tables in service order.
    pub tables: Vec<TableItem>,
    /// Continuation token for the next page, `None` on the last page.
    pub next_table_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryTablesResponse {
    #[serde(default)]
    value: Vec<TableItem>,
}

#[derive(Debug, Default, Deserialize)]
struct ODataErrorResponse {
    #[serde(rename = "odata.error")]
    error: Option<ODataError>,
}

#[derive(Debug, Default, Deserialize)]
struct ODataError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: ODataErrorMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ODataErrorMessage {
    #[serde(default)]
    value: String,
}

/// Client for the table service of one storage account.
///
/// Every request is signed through the [`Signer`], so the credential chain
/// runs at most once per token lifetime.
#[derive(Debug, Clone)]
pub struct TableServiceClient {
    endpoint: String,
    signer: Signer<Credential>,
    page_size: Option<u32>,
}

impl TableServiceClient {
    /// Create a client for `endpoint`, e.g. `https://myaccount.table.core.windows.net`.
    pub fn new(endpoint: impl Into<String>, signer: Signer<Credential>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            endpoint,
            signer,
            page_size: None,
        }
    }

    /// Ask the service for at most `page_size` tables per page.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// The service endpoint without trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Enumerate all tables of the account.
    ///
    /// Nothing is sent until [`ListTables::next`] is called.
    pub fn list_tables(&self) -> ListTables {
        ListTables {
            client: self.clone(),
            state: ListState::Start,
            buffer: VecDeque::new(),
        }
    }

    /// Fetch a single page of tables, starting after `next_table_name` if given.
    pub async fn list_tables_page(&self, next_table_name: Option<&str>) -> Result<TablesPage> {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(top) = self.page_size {
            query.append_pair("$top", &top.to_string());
        }
        if let Some(next) = next_table_name {
            query.append_pair(NEXT_TABLE_NAME, next);
        }
        let query = query.finish();

        let url = if query.is_empty() {
            format!("{}/Tables", self.endpoint)
        } else {
            format!("{}/Tables?{query}", self.endpoint)
        };

        let req = http::Request::get(&url)
            .header(ACCEPT, ODATA_NO_METADATA)
            .header(DATA_SERVICE_VERSION, "3.0")
            .header(MAX_DATA_SERVICE_VERSION, "3.0;NetFx")
            .body(Bytes::new())?;
        let (mut parts, body) = req.into_parts();
        self.signer.sign(&mut parts).await?;
        let req = http::Request::from_parts(parts, body);

        log::debug!("listing tables: GET {url}");
        let resp = self
            .signer
            .context()
            .http_send(req)
            .await
            .map_err(|e| {
                Error::service(format!("failed to send list tables request to {url}")).with_source(e)
            })?;

        if !resp.status().is_success() {
            return Err(service_error(resp.status(), resp.headers(), resp.body()));
        }

        let next_table_name = resp
            .headers()
            .get(X_MS_CONTINUATION_NEXT_TABLE_NAME)
            .map(|v| v.to_str())
            .transpose()?
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string());
        let body: QueryTablesResponse = serde_json::from_slice(resp.body()).map_err(|e| {
            Error::unexpected("failed to parse list tables response").with_source(e)
        })?;

        log::debug!(
            "received {} tables, continuation: {next_table_name:?}",
            body.value.len()
        );
        Ok(TablesPage {
            tables: body.value,
            next_table_name,
        })
    }
}

fn service_error(status: StatusCode, headers: &http::HeaderMap, body: &[u8]) -> Error {
    let odata = serde_json::from_slice::<ODataErrorResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .unwrap_or_default();

    let code = headers
        .get(X_MS_ERROR_CODE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .unwrap_or(odata.code);
    let detail = if !odata.message.value.is_empty() {
        odata.message.value
    } else {
        String::from_utf8_lossy(body).trim().to_string()
    };

    let mut message = format!("list tables failed with status {status}");
    if !code.is_empty() {
        message.push_str(&format!(" ({code})"));
    }
    if !detail.is_empty() {
        message.push_str(&format!(": {detail}"));
    }
    Error::service(message).with_status(status)
}

#[derive(Debug)]
enum ListState {
    Start,
    HasMore(String),
    Done,
}

/// Lazy, forward-only listing of the tables of an account.
///
/// Pages are fetched only when the buffered page is drained. Once the last
/// page is consumed or a request fails, the listing is finished.
#[derive(Debug)]
pub struct ListTables {
    client: TableServiceClient,
    state: ListState,
    buffer: VecDeque<TableItem>,
}

impl ListTables {
    /// Return the next table, fetching the next page if needed.
    pub async fn next(&mut self) -> Result<Option<TableItem>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Ok(Some(item));
            }

            let next_table_name = match std::mem::replace(&mut self.state, ListState::Done) {
                ListState::Start => None,
                ListState::HasMore(next) => Some(next),
                ListState::Done => return Ok(None),
            };

            let page = self
                .client
                .list_tables_page(next_table_name.as_deref())
                .await?;
            self.buffer.extend(page.tables);
            if let Some(next) = page.next_table_name {
                self.state = ListState::HasMore(next);
            }
        }
    }
}
