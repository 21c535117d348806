//! Live tests against a real storage account.
//!
//! Set `AZTABLES_TEST=on` and `STORAGE_ACCOUNT_NAME`, and make sure one of the
//! default credential sources is available (for example `az login`).

use std::env;

use anyhow::Result;
use aztables_command_execute_tokio::TokioCommandExecute;
use aztables_core::{Context, ErrorKind, OsEnv, Signer};
use aztables_file_read_tokio::TokioFileRead;
use aztables_http_send_reqwest::ReqwestHttpSend;
use aztables_table_service::{
    table_endpoint, Credential, DefaultCredentialProvider, RequestSigner,
    StaticCredentialProvider, TableServiceClient,
};
use log::{debug, warn};

fn init_client() -> Option<TableServiceClient> {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = dotenv::dotenv();

    if env::var("AZTABLES_TEST").ok().as_deref() != Some("on") {
        return None;
    }

    let ctx = Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv)
        .with_command_execute(TokioCommandExecute);

    let account =
        env::var("STORAGE_ACCOUNT_NAME").expect("env STORAGE_ACCOUNT_NAME must set");
    let signer: Signer<Credential> =
        Signer::new(ctx, DefaultCredentialProvider::new(), RequestSigner::new());

    Some(TableServiceClient::new(table_endpoint(&account), signer))
}

#[tokio::test]
async fn test_list_tables() -> Result<()> {
    let Some(client) = init_client() else {
        warn!("AZTABLES_TEST is not set, skipped");
        return Ok(());
    };

    let mut tables = client.list_tables();
    let mut count = 0;
    while let Some(table) = tables.next().await? {
        debug!("found table: {}", table.name);
        assert!(!table.name.is_empty());
        count += 1;
    }
    debug!("listed {count} tables from {}", client.endpoint());

    Ok(())
}

#[tokio::test]
async fn test_list_tables_small_pages() -> Result<()> {
    let Some(client) = init_client() else {
        warn!("AZTABLES_TEST is not set, skipped");
        return Ok(());
    };

    let mut all = Vec::new();
    let mut tables = client.list_tables();
    while let Some(table) = tables.next().await? {
        all.push(table.name);
    }

    let mut paged = Vec::new();
    let mut tables = client.clone().with_page_size(1).list_tables();
    while let Some(table) = tables.next().await? {
        paged.push(table.name);
    }

    assert_eq!(all, paged);
    Ok(())
}

#[tokio::test]
async fn test_list_tables_unknown_account() -> Result<()> {
    let Some(client) = init_client() else {
        warn!("AZTABLES_TEST is not set, skipped");
        return Ok(());
    };

    let signer = Signer::new(
        Context::new().with_http_send(ReqwestHttpSend::default()),
        StaticCredentialProvider::new("invalid-token"),
        RequestSigner::new(),
    );
    let bad = TableServiceClient::new(table_endpoint("aztablesnosuchaccount0"), signer);
    assert_ne!(bad.endpoint(), client.endpoint());

    let err = bad.list_tables().next().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceError);
    Ok(())
}
