use crate::commands::common::{print_history, ClientContext};
use crate::error::CliError;

pub async fn run_history(context: &ClientContext, as_json: bool) -> Result<(), CliError> {
    context.require_session()?;
    let view = context.history().refresh().await;
    print_history(&view, as_json)
}
