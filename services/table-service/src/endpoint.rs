/// DNS suffix of the public cloud table service.
pub const TABLE_ENDPOINT_SUFFIX: &str = "table.core.windows.net";

/// Build the table service endpoint of a storage account.
///
/// The account name must be non-empty; the config loader enforces this.
///
/// ```
/// use aztables_table_service::table_endpoint;
///
/// assert_eq!(table_endpoint("myaccount"), "https://myaccount.table.core.windows.net");
/// ```
pub fn table_endpoint(account_name: &str) -> String {
    format!("https://{account_name}.{TABLE_ENDPOINT_SUFFIX}")
}
