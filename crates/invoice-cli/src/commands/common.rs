use std::env;
use std::sync::Arc;

use invoice_core::api::HttpInvoiceApi;
use invoice_core::auth::AuthFlow;
use invoice_core::config::{ClientConfig, Endpoints, API_URL_ENV};
use invoice_core::history::{HistoryEngine, HistoryView, EMPTY_PLACEHOLDER, LOAD_FAILED_PLACEHOLDER};
use invoice_core::models::{ExportAffordance, HistoryRow, InvoiceRecord};
use invoice_core::session::{AuthStatus, Gate, SessionState};
use invoice_core::state::{StatusKind, StatusMessage};
use serde::Serialize;

use crate::config_profiles::{client_config, CliProfilesConfig};
use crate::error::CliError;
use crate::session_store::KeyringSessionStore;

pub type CliSession = SessionState<KeyringSessionStore>;
pub type CliHistory = HistoryEngine<HttpInvoiceApi, KeyringSessionStore>;

const TABLE_HEADERS: [&str; 6] = ["ID", "NUMBER", "VENDOR", "DATE", "FORMAT", "ACTION"];

/// Everything a network command needs for one profile.
pub struct ClientContext {
    pub profile_name: String,
    pub config: ClientConfig,
    pub api: Arc<HttpInvoiceApi>,
    pub session: Arc<CliSession>,
}

impl ClientContext {
    pub fn load(global_profile: Option<&str>, api_url: Option<String>) -> Result<Self, CliError> {
        let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
        let profile_name = profiles.resolve_profile_name(global_profile);
        let config = client_config(
            profiles.profile(&profile_name),
            api_url,
            env::var(API_URL_ENV).ok(),
        )?;
        let api = Arc::new(HttpInvoiceApi::new(&config)?);
        let session = Arc::new(SessionState::restore(KeyringSessionStore::new(
            &profile_name,
        )));
        tracing::debug!(
            profile = %profile_name,
            base_url = config.base_url(),
            "Client context ready"
        );

        Ok(Self {
            profile_name,
            config,
            api,
            session,
        })
    }

    pub fn auth_flow(&self) -> AuthFlow<HttpInvoiceApi, KeyringSessionStore> {
        AuthFlow::new(self.api.clone(), self.session.clone())
            .with_redirect_delay(self.config.dashboard_redirect_delay)
    }

    pub fn history(&self) -> Arc<CliHistory> {
        Arc::new(HistoryEngine::new(self.api.clone(), self.session.clone()))
    }

    /// Gated views: without a session the stored credential is cleared and
    /// the user is sent to sign in.
    pub fn require_session(&self) -> Result<(), CliError> {
        match self.session.gate() {
            Gate::Allowed => Ok(()),
            Gate::Redirect(_) => Err(CliError::NotSignedIn),
        }
    }
}

pub fn format_status_line(status: &StatusMessage) -> String {
    let prefix = match status.kind {
        StatusKind::Idle => return status.text.clone(),
        StatusKind::Processing => "…",
        StatusKind::Success => "✓",
        StatusKind::Error => "✗",
    };
    format!("{prefix} {}", status.text)
}

pub fn format_nav_line(status: AuthStatus) -> String {
    let nav = status.nav();
    let mut links = Vec::new();
    if nav.show_dashboard {
        links.push("history");
        links.push("upload");
    }
    if nav.show_logout {
        links.push("auth logout");
    }
    if !nav.show_dashboard {
        links.push("auth login");
    }
    if nav.show_sign_up {
        links.push("auth signup");
    }
    format!("Available: {}", links.join(", "))
}

pub fn action_cell(row: &HistoryRow) -> String {
    match (&row.affordance, &row.link) {
        (ExportAffordance::Download { .. }, Some(link)) => format!("download: {}", link.href),
        (ExportAffordance::OpenExternal { .. }, Some(link)) => {
            format!("open: {} (new window)", link.href)
        }
        _ => String::new(),
    }
}

pub fn format_history_lines(view: &HistoryView) -> Vec<String> {
    match view {
        HistoryView::Idle => Vec::new(),
        HistoryView::Loading => vec!["Loading invoices...".to_string()],
        HistoryView::Empty => vec![EMPTY_PLACEHOLDER.to_string()],
        HistoryView::Failed { .. } => vec![LOAD_FAILED_PLACEHOLDER.to_string()],
        HistoryView::Rows(rows) => format_history_table(rows),
    }
}

fn format_history_table(rows: &[HistoryRow]) -> Vec<String> {
    let cells = rows
        .iter()
        .map(|row| {
            [
                row.invoice_id.clone(),
                row.invoice_number.clone(),
                row.vendor.clone(),
                row.date.clone(),
                row.export_format.clone(),
                action_cell(row),
            ]
        })
        .collect::<Vec<_>>();

    let mut widths = TABLE_HEADERS.map(|header| header.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header = TABLE_HEADERS.map(str::to_string);
    std::iter::once(&header)
        .chain(&cells)
        .map(|row| format_table_row(row, &widths))
        .collect()
}

fn format_table_row(cells: &[String; 6], widths: &[usize; 6]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum HistoryJson<'a> {
    Rows(&'a [HistoryRow]),
    Failed { error: &'static str, reason: &'a str },
}

pub fn history_json(view: &HistoryView) -> HistoryJson<'_> {
    match view {
        HistoryView::Rows(rows) => HistoryJson::Rows(rows),
        HistoryView::Failed { reason } => HistoryJson::Failed {
            error: LOAD_FAILED_PLACEHOLDER,
            reason: reason.as_str(),
        },
        HistoryView::Idle | HistoryView::Loading | HistoryView::Empty => HistoryJson::Rows(&[]),
    }
}

pub fn print_history(view: &HistoryView, as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&history_json(view))?);
    } else {
        for line in format_history_lines(view) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn format_record_lines(record: &InvoiceRecord, endpoints: &Endpoints) -> Vec<String> {
    let row = HistoryRow::new(record, endpoints);
    let field = |label: &str, value: &str| format!("{label:<10}{value}");
    vec![
        field("ID", &row.invoice_id),
        field("Number", &row.invoice_number),
        field("Vendor", &row.vendor),
        field("Date", &row.date),
        field("Format", &row.export_format),
        field("Action", &action_cell(&row)),
    ]
}
