//! Invoice history: fetch, reconcile and publish the dashboard list.

mod reconcile;

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::{watch, Mutex};

use crate::api::InvoiceApi;
use crate::models::{HistoryRow, InvoiceRecord};
use crate::session::{SessionPersistence, SessionState};

pub use reconcile::reconcile;

/// Placeholder shown when the list cannot be fetched or decoded.
pub const LOAD_FAILED_PLACEHOLDER: &str = "Failed to load invoices.";
/// Placeholder shown when the list is empty or absent.
pub const EMPTY_PLACEHOLDER: &str = "No invoices processed yet.";

/// What the history panel currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HistoryView {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Rows cleared and placeholders hidden while a request is out.
    Loading,
    Empty,
    Failed { reason: String },
    Rows(Vec<HistoryRow>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Could not reach the invoice service")]
    Transport,
    #[error("Unreadable invoice response: {0}")]
    Decode(String),
}

pub struct HistoryEngine<A: InvoiceApi, P: SessionPersistence> {
    api: Arc<A>,
    session: Arc<SessionState<P>>,
    view: watch::Sender<HistoryView>,
    loading: Mutex<()>,
}

impl<A: InvoiceApi, P: SessionPersistence> HistoryEngine<A, P> {
    pub fn new(api: Arc<A>, session: Arc<SessionState<P>>) -> Self {
        let (view, _) = watch::channel(HistoryView::Idle);
        Self {
            api,
            session,
            view,
            loading: Mutex::new(()),
        }
    }

    pub fn view(&self) -> HistoryView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<HistoryView> {
        self.view.subscribe()
    }

    /// Reload the list. Never fails: every failure becomes
    /// [`HistoryView::Failed`]. A refresh issued while one is running
    /// returns the current view without sending a request.
    pub async fn refresh(&self) -> HistoryView {
        let Ok(_loading) = self.loading.try_lock() else {
            tracing::debug!("History refresh already in flight; skipping");
            return self.view();
        };
        self.load().await
    }

    /// Reload the list after whatever refresh is running has finished.
    /// Always sends its own request, so the result reflects changes made
    /// before the call.
    pub async fn refresh_after_current(&self) -> HistoryView {
        let _loading = self.loading.lock().await;
        self.load().await
    }

    async fn load(&self) -> HistoryView {
        self.view.send_replace(HistoryView::Loading);

        let view = match self.api.list_invoices(self.session.auth_header()).await {
            Err(error) => {
                tracing::warn!("Invoice history request failed: {}", error);
                HistoryView::Failed {
                    reason: error.to_string(),
                }
            }
            Ok(response) if !response.is_success() => {
                let reason = response.error_message(LOAD_FAILED_PLACEHOLDER);
                tracing::warn!(status = response.status, "Invoice history rejected: {}", reason);
                HistoryView::Failed { reason }
            }
            Ok(response) => match decode_invoice_list(&response.body) {
                Err(reason) => {
                    tracing::warn!("Invoice history undecodable: {}", reason);
                    HistoryView::Failed { reason }
                }
                Ok(records) if records.is_empty() => HistoryView::Empty,
                Ok(records) => {
                    let endpoints = self.api.endpoints();
                    let rows = records
                        .iter()
                        .map(|raw| HistoryRow::new(&reconcile(raw), endpoints))
                        .collect::<Vec<_>>();
                    tracing::debug!(count = rows.len(), "Invoice history loaded");
                    HistoryView::Rows(rows)
                }
            },
        };

        self.view.send_replace(view.clone());
        view
    }

    /// Fetch and reconcile a single invoice.
    pub async fn show(&self, invoice_id: &str) -> Result<InvoiceRecord, HistoryError> {
        let response = self
            .api
            .get_invoice(self.session.auth_header(), invoice_id)
            .await
            .map_err(|error| {
                tracing::warn!("Invoice lookup failed: {}", error);
                HistoryError::Transport
            })?;
        if !response.is_success() {
            return Err(HistoryError::Rejected {
                status: response.status,
                message: response.error_message("Invoice not found"),
            });
        }
        let raw = response
            .json::<Value>()
            .map_err(|error| HistoryError::Decode(error.to_string()))?;
        Ok(reconcile(&raw))
    }

    /// Delete an invoice, then reload the list.
    pub async fn delete(&self, invoice_id: &str) -> Result<HistoryView, HistoryError> {
        let response = self
            .api
            .delete_invoice(self.session.auth_header(), invoice_id)
            .await
            .map_err(|error| {
                tracing::warn!("Invoice deletion failed: {}", error);
                HistoryError::Transport
            })?;
        if !response.is_success() {
            return Err(HistoryError::Rejected {
                status: response.status,
                message: response.error_message("Failed to delete invoice"),
            });
        }
        tracing::info!(invoice_id, "Invoice deleted");
        Ok(self.refresh_after_current().await)
    }
}

/// Accept `{invoices: [...]}` or a bare list. A missing or null list is
/// empty; any other shape is a decode failure.
fn decode_invoice_list(body: &str) -> Result<Vec<Value>, String> {
    let payload =
        serde_json::from_str::<Value>(body).map_err(|error| format!("invalid JSON: {error}"))?;
    let list = match payload {
        Value::Object(mut object) => object.remove("invoices").unwrap_or(Value::Null),
        other => other,
    };
    match list {
        Value::Array(records) => Ok(records),
        Value::Null => Ok(Vec::new()),
        other => Err(format!("expected an invoice list, got {}", json_kind(&other))),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
