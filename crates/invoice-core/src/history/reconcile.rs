//! Record reconciliation: raw history JSON in, [`InvoiceRecord`] out.
//!
//! Records have shipped in several shapes over time:
//! - a `normalized` (or `normalized_json`) field holding a JSON-encoded object;
//! - flat top-level fields;
//! - fields nested under `data`.
//!
//! Each display field is looked up in those sources in that order, and each
//! lookup fails on its own. A field nobody provides is `None`; a source that
//! does not decode is skipped.

use serde_json::{Map, Value};

use crate::models::InvoiceRecord;
use crate::util::normalize_text_option;

type Object = Map<String, Value>;

/// Where a field may come from, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Normalized,
    Flat,
    Nested,
}

const FIELD_SOURCES: [Source; 3] = [Source::Normalized, Source::Flat, Source::Nested];

const NORMALIZED_KEYS: [&str; 2] = ["normalized", "normalized_json"];
const NESTED_KEY: &str = "data";

const INVOICE_ID_KEYS: [&str; 2] = ["id", "invoice_id"];
const INVOICE_NUMBER_KEYS: [&str; 1] = ["invoice_number"];
const VENDOR_KEYS: [&str; 1] = ["vendor"];
const DATE_KEYS: [&str; 2] = ["date", "invoice_date"];

const EXPORT_FORMAT_KEYS: [&str; 2] = ["format", "export_format"];
const EXPORT_PATH_KEYS: [&str; 3] = ["path", "export_path", "url"];
const EXPORT_ID_KEYS: [&str; 2] = ["id", "export_id"];

/// Decoded views of one raw record.
struct RecordSources<'a> {
    normalized: Option<Object>,
    flat: Option<&'a Object>,
    nested: Option<Object>,
}

impl<'a> RecordSources<'a> {
    fn new(raw: &'a Value) -> Self {
        let flat = raw.as_object();
        let normalized = flat.and_then(|object| {
            NORMALIZED_KEYS
                .iter()
                .find_map(|key| object.get(*key).and_then(embedded_object))
        });
        let nested = flat.and_then(|object| object.get(NESTED_KEY).and_then(embedded_object));
        Self {
            normalized,
            flat,
            nested,
        }
    }

    fn source(&self, source: Source) -> Option<&Object> {
        match source {
            Source::Normalized => self.normalized.as_ref(),
            Source::Flat => self.flat,
            Source::Nested => self.nested.as_ref(),
        }
    }

    fn lookup(&self, sources: &[Source], keys: &[&str]) -> Option<String> {
        sources
            .iter()
            .filter_map(|source| self.source(*source))
            .find_map(|object| first_text(object, keys))
    }
}

/// Reconcile one raw history entry. Never fails: a non-object entry yields
/// an empty record.
pub fn reconcile(raw: &Value) -> InvoiceRecord {
    let sources = RecordSources::new(raw);
    let export = current_export(raw);

    InvoiceRecord {
        invoice_id: sources
            .lookup(&[Source::Flat, Source::Nested], &INVOICE_ID_KEYS)
            .unwrap_or_default(),
        invoice_number: sources.lookup(&FIELD_SOURCES, &INVOICE_NUMBER_KEYS),
        vendor: sources.lookup(&FIELD_SOURCES, &VENDOR_KEYS),
        date: sources.lookup(&FIELD_SOURCES, &DATE_KEYS),
        export_format: export.and_then(|export| first_text(export, &EXPORT_FORMAT_KEYS)),
        export_id: export.and_then(|export| first_text(export, &EXPORT_ID_KEYS)),
        export_path: export.and_then(|export| first_text(export, &EXPORT_PATH_KEYS)),
    }
}

/// The export a record currently points at: `export`, else the last entry
/// of `exports`, else none.
fn current_export(raw: &Value) -> Option<&Object> {
    let object = raw.as_object()?;
    if let Some(export) = object.get("export").and_then(Value::as_object) {
        return Some(export);
    }
    object
        .get("exports")
        .and_then(Value::as_array)
        .and_then(|exports| exports.last())
        .and_then(Value::as_object)
}

/// An object stored inline or as a JSON-encoded string.
fn embedded_object(value: &Value) -> Option<Object> {
    match value {
        Value::Object(object) => Some(object.clone()),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Object(object)) => Some(object),
            Ok(_) => None,
            Err(error) => {
                tracing::debug!("Skipping undecodable embedded invoice data: {}", error);
                None
            }
        },
        _ => None,
    }
}

fn first_text(object: &Object, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(display_text))
}

fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => normalize_text_option(Some(text.clone())),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
