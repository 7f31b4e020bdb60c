use invoice_core::api::InvoiceApi;
use invoice_core::models::HistoryRow;

use crate::commands::common::{format_record_lines, print_history, ClientContext};
use crate::error::CliError;

pub async fn run_show(context: &ClientContext, id: &str, as_json: bool) -> Result<(), CliError> {
    context.require_session()?;
    let record = context.history().show(id.trim()).await?;

    if as_json {
        let row = HistoryRow::new(&record, context.api.endpoints());
        let item = serde_json::json!({
            "record": record,
            "affordance": row.affordance,
            "link": row.link,
        });
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        for line in format_record_lines(&record, context.api.endpoints()) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_delete(context: &ClientContext, id: &str) -> Result<(), CliError> {
    context.require_session()?;
    let id = id.trim();
    let view = context.history().delete(id).await?;
    println!("Deleted invoice {id}");
    print_history(&view, false)
}
