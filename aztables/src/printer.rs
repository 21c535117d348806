use aztables_core::Result;
use aztables_table_service::ListTables;
use std::io::Write;

const SEPARATOR_WIDTH: usize = 40;

/// Write the listing header followed by one line per table.
///
/// Lines are flushed as soon as each table arrives. On failure the lines
/// already written stay in `out` and the error is returned.
///
/// Returns the number of tables printed.
pub async fn print_tables<W: Write>(
    account: &str,
    tables: &mut ListTables,
    out: &mut W,
) -> Result<usize> {
    writeln!(out, "Listing tables in {account}:")?;
    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
    out.flush()?;

    let mut count = 0;
    while let Some(table) = tables.next().await? {
        writeln!(out, "{}", table.name)?;
        out.flush()?;
        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client, ScriptedHttpSend};
    use aztables_core::{Error, ErrorKind};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_print_tables() {
        let mock = ScriptedHttpSend::new().page(
            r#"{"value":[{"TableName":"Orders"},{"TableName":"Customers"}]}"#,
            None,
        );
        let mut out = Vec::new();

        let count = print_tables("myaccount", &mut client(&mock).list_tables(), &mut out)
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Listing tables in myaccount:\n----------------------------------------\nOrders\nCustomers\n"
        );
    }

    #[tokio::test]
    async fn test_print_no_tables() {
        let mock = ScriptedHttpSend::new().page(r#"{"value":[]}"#, None);
        let mut out = Vec::new();

        let count = print_tables("myaccount", &mut client(&mock).list_tables(), &mut out)
            .await
            .unwrap();

        assert_eq!(count, 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("Listing tables in myaccount:\n{}\n", "-".repeat(40))
        );
    }

    #[tokio::test]
    async fn test_print_keeps_lines_before_failure() {
        let mock = ScriptedHttpSend::new()
            .page(r#"{"value":[{"TableName":"Orders"}]}"#, Some("Q3VzdG9tZXJz"))
            .fail(Error::service("connection reset by peer"));
        let mut out = Vec::new();

        let err = print_tables("myaccount", &mut client(&mock).list_tables(), &mut out)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ServiceError);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("Listing tables in myaccount:\n{}\nOrders\n", "-".repeat(40))
        );
    }
}
