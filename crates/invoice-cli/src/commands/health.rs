use invoice_core::api::InvoiceApi;
use serde_json::Value;

use crate::commands::common::ClientContext;
use crate::error::CliError;

pub async fn run_health(context: &ClientContext) -> Result<(), CliError> {
    let response = context.api.health().await?;
    if !response.is_success() {
        return Err(CliError::Unhealthy(
            response.error_message(&format!("HTTP {}", response.status)),
        ));
    }

    let status = response
        .json::<Value>()
        .ok()
        .and_then(|payload| payload.get("status").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| "ok".to_string());
    println!("{} is up (status: {status})", context.config.base_url());
    Ok(())
}
