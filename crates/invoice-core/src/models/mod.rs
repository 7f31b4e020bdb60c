//! Data models for the invoice client

mod export_format;
mod invoice;

pub use export_format::{ExportFormat, UnknownExportFormat};
pub use invoice::{ExportAffordance, ExportLink, HistoryRow, InvoiceRecord};
