//! Export format model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Output the service produces for a processed invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
    Pdf,
    /// Google Sheets: the export lives outside the service and is opened by URL.
    Gsheets,
}

impl ExportFormat {
    pub const ALL: [Self; 4] = [Self::Csv, Self::Xlsx, Self::Pdf, Self::Gsheets];

    /// Wire value of the `export_format` form field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
            Self::Gsheets => "gsheets",
        }
    }

    /// Whether exports of this format are hosted externally.
    #[must_use]
    pub const fn is_external(self) -> bool {
        matches!(self, Self::Gsheets)
    }

    /// True when a raw format label names the external-sheet kind.
    pub fn is_external_label(label: &str) -> bool {
        label.parse::<Self>().is_ok_and(Self::is_external)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported export format '{0}' (expected csv, xlsx, pdf or gsheets)")]
pub struct UnknownExportFormat(pub String);

impl FromStr for ExportFormat {
    type Err = UnknownExportFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownExportFormat(wanted.to_string()))
    }
}
