//! Canonical invoice history record and its display row.

use serde::Serialize;

use crate::config::Endpoints;
use crate::models::ExportFormat;

/// Shape-independent view of one invoice history entry.
///
/// Every field is optional on the wire; a missing one stays `None` (or an
/// empty `invoice_id`) instead of failing the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvoiceRecord {
    pub invoice_id: String,
    pub invoice_number: Option<String>,
    pub vendor: Option<String>,
    pub date: Option<String>,
    pub export_format: Option<String>,
    pub export_id: Option<String>,
    pub export_path: Option<String>,
}

/// What the user can do with a record's current export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportAffordance {
    #[default]
    None,
    /// Fetch through the service's download route; the raw path is
    /// server-local and not browser-fetchable.
    Download { export_id: String },
    /// Open the externally hosted export as-is.
    OpenExternal { url: String },
}

impl ExportAffordance {
    /// Affordance rule:
    /// non-external format + path + export id: download;
    /// external-sheet format + path: open externally;
    /// anything else: no action.
    pub fn for_record(record: &InvoiceRecord) -> Self {
        let (Some(format), Some(path)) = (&record.export_format, &record.export_path) else {
            return Self::None;
        };

        if ExportFormat::is_external_label(format) {
            return Self::OpenExternal { url: path.clone() };
        }

        record
            .export_id
            .as_ref()
            .map_or(Self::None, |export_id| Self::Download {
                export_id: export_id.clone(),
            })
    }

    pub fn link(&self, endpoints: &Endpoints) -> Option<ExportLink> {
        match self {
            Self::None => None,
            Self::Download { export_id } => Some(ExportLink {
                href: endpoints.download(export_id),
                label: "Download",
                new_window: false,
            }),
            Self::OpenExternal { url } => Some(ExportLink {
                href: url.clone(),
                label: "Open Sheet",
                new_window: true,
            }),
        }
    }
}

/// A rendered action link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportLink {
    pub href: String,
    pub label: &'static str,
    /// Open in a new browsing context.
    pub new_window: bool,
}

/// One history table row; absent fields render as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub invoice_id: String,
    pub invoice_number: String,
    pub vendor: String,
    pub date: String,
    pub export_format: String,
    pub affordance: ExportAffordance,
    pub link: Option<ExportLink>,
}

impl HistoryRow {
    pub fn new(record: &InvoiceRecord, endpoints: &Endpoints) -> Self {
        let affordance = ExportAffordance::for_record(record);
        let link = affordance.link(endpoints);
        Self {
            invoice_id: record.invoice_id.clone(),
            invoice_number: record.invoice_number.clone().unwrap_or_default(),
            vendor: record.vendor.clone().unwrap_or_default(),
            date: record.date.clone().unwrap_or_default(),
            export_format: record.export_format.clone().unwrap_or_default(),
            affordance,
            link,
        }
    }
}
