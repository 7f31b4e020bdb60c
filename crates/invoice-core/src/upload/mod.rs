//! Upload coordination: file selection, multipart submit, history refresh.
//!
//! The selected file is transient UI state reached from three triggers
//! (picker, drag-and-drop, direct change) that all land in one
//! [`FileSelection`]. `submit` sends it with the chosen export format and,
//! whatever the server says, refreshes the history exactly once afterwards.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;

use crate::api::{ApiResponse, InvoiceApi};
use crate::history::{HistoryEngine, HistoryView};
use crate::models::ExportFormat;
use crate::session::{SessionPersistence, SessionState};
use crate::state::{InFlight, StatusMessage};
use crate::util::{compact_text, normalize_text_option};

const FALLBACK_FILE_NAME: &str = "uploaded_invoice";
const UPLOAD_FAILED: &str = "Upload failed.";
const UPLOAD_TRANSPORT_FAILED: &str = "Upload error: could not reach the invoice service.";
const NO_FILE_SELECTED: &str = "Please select a file to upload.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("Please select a file to upload")]
    NoFileSelected,
    #[error("An upload is already in progress")]
    InFlight,
    #[error("Could not read {path}: {reason}")]
    UnreadableFile { path: String, reason: String },
}

/// A file picked by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    /// Content type is guessed from the file name.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = normalize_text_option(Some(name.into()))
            .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
        let mime_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            name,
            mime_type,
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let bytes = std::fs::read(path).map_err(|error| UploadError::UnreadableFile {
            path: path.display().to_string(),
            reason: error.to_string(),
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// The file currently chosen for upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    current: Option<SelectedFile>,
}

impl FileSelection {
    /// Click-to-browse picker.
    pub fn pick(&mut self, file: SelectedFile) {
        self.current = Some(file);
    }

    /// Drag-and-drop. Only the first dropped file is kept; an empty drop
    /// leaves the selection alone. Returns how many files were ignored.
    pub fn drop_files(&mut self, files: impl IntoIterator<Item = SelectedFile>) -> usize {
        let mut files = files.into_iter();
        let Some(first) = files.next() else {
            return 0;
        };
        self.current = Some(first);
        files.count()
    }

    /// Direct change of the underlying input; `None` clears it.
    pub fn change(&mut self, file: Option<SelectedFile>) {
        self.current = file;
    }

    pub fn current(&self) -> Option<&SelectedFile> {
        self.current.as_ref()
    }

    /// Name shown next to the picker.
    pub fn label(&self) -> Option<&str> {
        self.current.as_ref().map(|file| file.name.as_str())
    }
}

/// One multipart submission: the file and the requested export format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file: SelectedFile,
    pub export_format: ExportFormat,
}

/// Outcome of a submit that reached the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub status: StatusMessage,
    /// History as reloaded after the upload.
    pub history: HistoryView,
}

pub struct UploadCoordinator<A: InvoiceApi, P: SessionPersistence> {
    api: Arc<A>,
    session: Arc<SessionState<P>>,
    history: Arc<HistoryEngine<A, P>>,
    selection: Mutex<FileSelection>,
    status: watch::Sender<StatusMessage>,
    in_flight: InFlight,
}

impl<A: InvoiceApi, P: SessionPersistence> UploadCoordinator<A, P> {
    pub fn new(
        api: Arc<A>,
        session: Arc<SessionState<P>>,
        history: Arc<HistoryEngine<A, P>>,
    ) -> Self {
        let (status, _) = watch::channel(StatusMessage::default());
        Self {
            api,
            session,
            history,
            selection: Mutex::new(FileSelection::default()),
            status,
            in_flight: InFlight::default(),
        }
    }

    pub fn pick(&self, file: SelectedFile) {
        self.with_selection(|selection| selection.pick(file));
    }

    pub fn drop_files(&self, files: impl IntoIterator<Item = SelectedFile>) -> usize {
        self.with_selection(|selection| selection.drop_files(files))
    }

    pub fn change(&self, file: Option<SelectedFile>) {
        self.with_selection(|selection| selection.change(file));
    }

    pub fn selected_name(&self) -> Option<String> {
        self.with_selection(|selection| selection.label().map(str::to_string))
    }

    pub fn status(&self) -> StatusMessage {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<StatusMessage> {
        self.status.subscribe()
    }

    pub fn is_uploading(&self) -> bool {
        self.in_flight.is_active()
    }

    /// Upload the selected file.
    ///
    /// Local precondition failures return `Err` without any request. Once
    /// the request is issued, every outcome (success, rejection, transport
    /// failure) is reported in the returned status and followed by exactly
    /// one history refresh.
    pub async fn submit(&self, export_format: ExportFormat) -> Result<UploadReport, UploadError> {
        let Some(_guard) = self.in_flight.try_begin() else {
            tracing::debug!("Upload already in flight; ignoring submit");
            return Err(UploadError::InFlight);
        };

        let Some(file) = self.with_selection(|selection| selection.current().cloned()) else {
            self.status.send_replace(StatusMessage::error(NO_FILE_SELECTED));
            return Err(UploadError::NoFileSelected);
        };

        self.status
            .send_replace(StatusMessage::processing(format!("Processing {}...", file.name)));
        tracing::info!(
            file = %file.name,
            size = file.size(),
            format = %export_format,
            "Uploading invoice"
        );

        let request = UploadRequest {
            file,
            export_format,
        };
        let status = match self
            .api
            .process_invoice(self.session.auth_header(), request)
            .await
        {
            Err(error) => {
                tracing::warn!("Upload request failed: {}", error);
                StatusMessage::error(UPLOAD_TRANSPORT_FAILED)
            }
            Ok(response) if !response.is_success() => {
                let message = response.error_message(UPLOAD_FAILED);
                tracing::warn!(status = response.status, "Upload rejected: {}", message);
                StatusMessage::error(message)
            }
            Ok(response) => {
                tracing::info!("Invoice processed");
                StatusMessage::success(success_message(&response))
            }
        };
        self.status.send_replace(status.clone());

        let history = self.history.refresh_after_current().await;
        Ok(UploadReport { status, history })
    }

    fn with_selection<T>(&self, apply: impl FnOnce(&mut FileSelection) -> T) -> T {
        let mut selection = self
            .selection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        apply(&mut selection)
    }
}

/// Success text naming the produced export when the body says where it went.
///
/// Looks at `export.file`, `export.url`, then a top-level `export_path`;
/// otherwise echoes the raw body.
fn success_message(response: &ApiResponse) -> String {
    let location = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|payload| export_location(&payload));
    match location {
        Some(location) => format!("Invoice processed. Export: {location}"),
        None => {
            let raw = compact_text(&response.body);
            if raw.is_empty() {
                "Invoice processed.".to_string()
            } else {
                format!("Invoice processed: {raw}")
            }
        }
    }
}

fn export_location(payload: &Value) -> Option<String> {
    let text = |value: Option<&Value>| {
        value
            .and_then(Value::as_str)
            .and_then(|text| normalize_text_option(Some(text.to_string())))
    };
    let export = payload.get("export");
    text(export.and_then(|export| export.get("file")))
        .or_else(|| text(export.and_then(|export| export.get("url"))))
        .or_else(|| text(payload.get("export_path")))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::session::MemorySessionStore;
    use crate::state::StatusKind;
    use crate::testing::{Endpoint, FakeApi};

    type Coordinator = UploadCoordinator<FakeApi, MemorySessionStore>;

    fn coordinator(api: FakeApi) -> (Arc<FakeApi>, Coordinator) {
        let api = Arc::new(api);
        let session = Arc::new(SessionState::restore(MemorySessionStore::with_credential(
            "T",
        )));
        let history = Arc::new(HistoryEngine::new(api.clone(), session.clone()));
        (api.clone(), UploadCoordinator::new(api, session, history))
    }

    fn invoice_pdf() -> SelectedFile {
        SelectedFile::new("invoice.pdf", b"%PDF-1.4".to_vec())
    }

    #[test]
    fn selected_file_guesses_content_type() {
        assert_eq!(invoice_pdf().mime_type, "application/pdf");
        assert_eq!(
            SelectedFile::new("scan.unknownext", vec![]).mime_type,
            "application/octet-stream"
        );
        assert_eq!(SelectedFile::new("  ", vec![]).name, "uploaded_invoice");
    }

    #[test]
    fn missing_file_is_unreadable() {
        let result = SelectedFile::from_path(Path::new("/nonexistent/invoice.pdf"));
        assert!(matches!(result, Err(UploadError::UnreadableFile { .. })));
    }

    #[test]
    fn selection_triggers_converge() {
        let mut selection = FileSelection::default();
        selection.pick(invoice_pdf());
        assert_eq!(selection.label(), Some("invoice.pdf"));

        let ignored = selection.drop_files([
            SelectedFile::new("a.png", vec![1]),
            SelectedFile::new("b.png", vec![2]),
        ]);
        assert_eq!(ignored, 1);
        assert_eq!(selection.label(), Some("a.png"));

        assert_eq!(selection.drop_files(Vec::new()), 0);
        assert_eq!(selection.label(), Some("a.png"));

        selection.change(Some(SelectedFile::new("c.txt", vec![3])));
        assert_eq!(selection.label(), Some("c.txt"));
        selection.change(None);
        assert_eq!(selection.label(), None);
    }

    #[tokio::test]
    async fn submit_without_file_makes_no_request() {
        let (api, coordinator) = coordinator(FakeApi::new());

        let result = coordinator.submit(ExportFormat::Csv).await;

        assert_eq!(result, Err(UploadError::NoFileSelected));
        assert!(api.calls().is_empty());
        assert_eq!(coordinator.status().kind, StatusKind::Error);
    }

    #[tokio::test]
    async fn successful_upload_names_export_and_refreshes() {
        let (api, coordinator) = coordinator(
            FakeApi::new()
                .reply(
                    Endpoint::ProcessInvoice,
                    200,
                    r#"{"status": "OK", "export": {"status": "PASS", "file": "data/output/invoice_1.csv", "format": "csv"}}"#,
                )
                .reply(Endpoint::ListInvoices, 200, r#"{"invoices": [{"id": 1}]}"#),
        );
        coordinator.pick(invoice_pdf());

        let report = coordinator.submit(ExportFormat::Csv).await.unwrap();

        assert_eq!(
            report.status,
            StatusMessage::success("Invoice processed. Export: data/output/invoice_1.csv")
        );
        assert!(matches!(report.history, HistoryView::Rows(ref rows) if rows.len() == 1));

        let calls = api.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].endpoint, Endpoint::ProcessInvoice);
        assert_eq!(calls[0].authorization.as_deref(), Some("Bearer T"));
        assert_eq!(calls[0].file_name.as_deref(), Some("invoice.pdf"));
        assert_eq!(calls[0].export_format.as_deref(), Some("csv"));
        assert_eq!(calls[1].endpoint, Endpoint::ListInvoices);
    }

    #[tokio::test]
    async fn failed_upload_still_refreshes_once() {
        let (api, coordinator) = coordinator(
            FakeApi::new()
                .reply(
                    Endpoint::ProcessInvoice,
                    500,
                    r#"{"status": "FAIL", "stage": "export", "error": "Unsupported format pdf"}"#,
                )
                .reply(Endpoint::ListInvoices, 200, "[]"),
        );
        coordinator.pick(invoice_pdf());

        let report = coordinator.submit(ExportFormat::Pdf).await.unwrap();

        assert_eq!(
            report.status,
            StatusMessage::error("export: Unsupported format pdf")
        );
        assert_eq!(report.history, HistoryView::Empty);
        assert_eq!(api.calls_to(Endpoint::ListInvoices), 1);
    }

    #[tokio::test]
    async fn undecodable_failure_uses_generic_message() {
        let (_, coordinator) = coordinator(
            FakeApi::new()
                .reply(Endpoint::ProcessInvoice, 502, "Bad Gateway")
                .reply(Endpoint::ListInvoices, 200, "[]"),
        );
        coordinator.pick(invoice_pdf());

        let report = coordinator.submit(ExportFormat::Csv).await.unwrap();

        assert_eq!(report.status, StatusMessage::error("Upload failed."));
    }

    #[tokio::test]
    async fn transport_failure_is_reported_not_raised() {
        let (api, coordinator) = coordinator(
            FakeApi::new()
                .fail(Endpoint::ProcessInvoice, "connection reset")
                .reply(Endpoint::ListInvoices, 200, "[]"),
        );
        coordinator.pick(invoice_pdf());

        let report = coordinator.submit(ExportFormat::Csv).await.unwrap();

        assert_eq!(report.status, StatusMessage::error(UPLOAD_TRANSPORT_FAILED));
        assert_eq!(api.calls_to(Endpoint::ListInvoices), 1);
        assert!(!coordinator.is_uploading());
    }

    #[tokio::test]
    async fn repeated_submits_are_independent_requests() {
        let (api, coordinator) = coordinator(
            FakeApi::new()
                .reply(Endpoint::ProcessInvoice, 200, r#"{"status": "OK"}"#)
                .reply(Endpoint::ListInvoices, 200, "[]"),
        );
        coordinator.pick(invoice_pdf());

        coordinator.submit(ExportFormat::Csv).await.unwrap();
        coordinator.submit(ExportFormat::Csv).await.unwrap();

        assert_eq!(api.calls_to(Endpoint::ProcessInvoice), 2);
        assert_eq!(api.calls_to(Endpoint::ListInvoices), 2);
    }

    #[tokio::test]
    async fn submit_while_in_flight_is_rejected() {
        let (api, release) = FakeApi::new()
            .reply(Endpoint::ProcessInvoice, 200, r#"{"status": "OK"}"#)
            .reply(Endpoint::ListInvoices, 200, "[]")
            .hold(Endpoint::ProcessInvoice);
        let (api, coordinator) = coordinator(api);
        let coordinator = Arc::new(coordinator);
        coordinator.pick(invoice_pdf());
        let mut status = coordinator.subscribe_status();

        let first = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.submit(ExportFormat::Csv).await }
        });
        status
            .wait_for(|status| status.kind == StatusKind::Processing)
            .await
            .unwrap();

        assert_eq!(
            coordinator.submit(ExportFormat::Csv).await,
            Err(UploadError::InFlight)
        );

        release.notify_one();
        assert!(first.await.unwrap().is_ok());
        assert_eq!(api.calls_to(Endpoint::ProcessInvoice), 1);
    }

    #[tokio::test]
    async fn upload_during_refresh_still_gets_its_own_refresh() {
        let (api, release) = FakeApi::new()
            .reply(Endpoint::ProcessInvoice, 200, r#"{"status": "OK"}"#)
            .reply(Endpoint::ListInvoices, 200, "[]")
            .reply(Endpoint::ListInvoices, 200, r#"{"invoices": [{"id": 9}]}"#)
            .hold(Endpoint::ListInvoices);
        let api = Arc::new(api);
        let session = Arc::new(SessionState::restore(MemorySessionStore::with_credential(
            "T",
        )));
        let history = Arc::new(HistoryEngine::new(api.clone(), session.clone()));
        let coordinator = Arc::new(UploadCoordinator::new(
            api.clone(),
            session,
            history.clone(),
        ));
        coordinator.pick(invoice_pdf());
        let mut views = history.subscribe();
        let mut status = coordinator.subscribe_status();

        let running = tokio::spawn({
            let history = history.clone();
            async move { history.refresh().await }
        });
        views
            .wait_for(|view| *view == HistoryView::Loading)
            .await
            .unwrap();
        let upload = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.submit(ExportFormat::Csv).await }
        });
        status
            .wait_for(|status| status.kind == StatusKind::Success)
            .await
            .unwrap();

        release.notify_one();
        assert_eq!(running.await.unwrap(), HistoryView::Empty);
        release.notify_one();
        let report = upload.await.unwrap().unwrap();

        assert!(matches!(
            report.history,
            HistoryView::Rows(ref rows) if rows[0].invoice_id == "9"
        ));
        assert_eq!(api.calls_to(Endpoint::ListInvoices), 2);
    }

    #[test]
    fn success_message_variants() {
        let message = |body: &str| success_message(&ApiResponse::new(200, body));
        assert_eq!(
            message(r#"{"export": {"url": "https://docs.google.com/s/1", "format": "gsheets"}}"#),
            "Invoice processed. Export: https://docs.google.com/s/1"
        );
        assert_eq!(
            message(r#"{"status": "OK", "invoice_id": 4, "export_path": "/out/4.xlsx"}"#),
            "Invoice processed. Export: /out/4.xlsx"
        );
        assert_eq!(message(r#"{"status": "OK"}"#), r#"Invoice processed: {"status": "OK"}"#);
        assert_eq!(message(""), "Invoice processed.");
    }
}
