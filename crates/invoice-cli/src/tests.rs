use std::collections::BTreeMap;

use clap::Parser;
use invoice_core::config::ClientConfig;
use invoice_core::history::HistoryView;
use invoice_core::models::{ExportFormat, HistoryRow, InvoiceRecord};
use invoice_core::session::AuthStatus;
use invoice_core::state::StatusMessage;
use invoice_core::upload::UploadError;
use pretty_assertions::assert_eq;

use crate::cli::{AuthCommands, Cli, Commands, CompletionShell, ExportFormatArg};
use crate::commands::common::{
    action_cell, format_history_lines, format_nav_line, format_record_lines, format_status_line,
    history_json,
};
use crate::commands::completions::{render_completions, run_completions};
use crate::commands::config::apply_profile_init;
use crate::commands::upload::read_selection;
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

fn record(
    id: &str,
    format: Option<&str>,
    path: Option<&str>,
    export_id: Option<&str>,
) -> InvoiceRecord {
    InvoiceRecord {
        invoice_id: id.to_string(),
        invoice_number: Some(format!("INV-{id}")),
        vendor: Some("Acme".to_string()),
        date: Some("2024-01-05".to_string()),
        export_format: format.map(str::to_string),
        export_id: export_id.map(str::to_string),
        export_path: path.map(str::to_string),
    }
}

fn rows(records: &[InvoiceRecord]) -> Vec<HistoryRow> {
    let endpoints = ClientConfig::default().endpoints();
    records
        .iter()
        .map(|record| HistoryRow::new(record, &endpoints))
        .collect()
}

#[test]
fn status_lines_are_prefixed_by_kind() {
    assert_eq!(
        format_status_line(&StatusMessage::processing("Processing invoice.pdf...")),
        "… Processing invoice.pdf..."
    );
    assert_eq!(format_status_line(&StatusMessage::success("done")), "✓ done");
    assert_eq!(format_status_line(&StatusMessage::error("nope")), "✗ nope");
    assert_eq!(format_status_line(&StatusMessage::default()), "");
}

#[test]
fn nav_line_follows_auth_status() {
    assert_eq!(
        format_nav_line(AuthStatus::SignedIn),
        "Available: history, upload, auth logout"
    );
    assert_eq!(
        format_nav_line(AuthStatus::SignedOut),
        "Available: auth login, auth signup"
    );
}

#[test]
fn action_cells_describe_affordance() {
    let rows = rows(&[
        record("1", Some("csv"), Some("/f.csv"), Some("7")),
        record("2", Some("gsheets"), Some("https://sheet"), None),
        record("3", None, None, None),
    ]);
    assert_eq!(action_cell(&rows[0]), "download: http://127.0.0.1:8000/download/7");
    assert_eq!(action_cell(&rows[1]), "open: https://sheet (new window)");
    assert_eq!(action_cell(&rows[2]), "");
}

#[test]
fn history_table_aligns_columns() {
    let lines = format_history_lines(&HistoryView::Rows(rows(&[
        record("1", Some("csv"), Some("/f.csv"), Some("7")),
        record("22", None, None, None),
    ])));

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("ID  NUMBER  VENDOR  DATE        FORMAT  ACTION"));
    assert!(lines[1].starts_with("1   INV-1   Acme    2024-01-05  csv     download: "));
    assert_eq!(lines[2], "22  INV-22  Acme    2024-01-05");
}

#[test]
fn history_placeholders() {
    assert_eq!(
        format_history_lines(&HistoryView::Empty),
        vec!["No invoices processed yet.".to_string()]
    );
    assert_eq!(
        format_history_lines(&HistoryView::Failed {
            reason: "HTTP 500".to_string()
        }),
        vec!["Failed to load invoices.".to_string()]
    );
    assert!(format_history_lines(&HistoryView::Idle).is_empty());
}

#[test]
fn history_json_serializes_rows_or_failure() {
    let view = HistoryView::Rows(rows(&[record("1", Some("csv"), Some("/f.csv"), Some("7"))]));
    let value = serde_json::to_value(history_json(&view)).unwrap();
    assert_eq!(value[0]["invoice_id"], "1");
    assert_eq!(value[0]["affordance"]["kind"], "download");
    assert_eq!(value[0]["link"]["href"], "http://127.0.0.1:8000/download/7");

    let value = serde_json::to_value(history_json(&HistoryView::Empty)).unwrap();
    assert_eq!(value, serde_json::json!([]));

    let value = serde_json::to_value(history_json(&HistoryView::Failed {
        reason: "HTTP 500".to_string(),
    }))
    .unwrap();
    assert_eq!(value["reason"], "HTTP 500");
}

#[test]
fn record_lines_render_every_field() {
    let lines = format_record_lines(
        &record("4", Some("gsheets"), Some("https://sheet"), None),
        &ClientConfig::default().endpoints(),
    );
    assert_eq!(
        lines,
        vec![
            "ID        4",
            "Number    INV-4",
            "Vendor    Acme",
            "Date      2024-01-05",
            "Format    gsheets",
            "Action    open: https://sheet (new window)",
        ]
    );
}

#[test]
fn export_format_arg_maps_to_core_format() {
    assert_eq!(ExportFormat::from(ExportFormatArg::Csv), ExportFormat::Csv);
    assert_eq!(ExportFormat::from(ExportFormatArg::Xlsx), ExportFormat::Xlsx);
    assert_eq!(ExportFormat::from(ExportFormatArg::Pdf), ExportFormat::Pdf);
    assert_eq!(
        ExportFormat::from(ExportFormatArg::Gsheets),
        ExportFormat::Gsheets
    );
}

#[test]
fn upload_accepts_several_files_and_defaults_to_csv() {
    let cli = Cli::try_parse_from(["invoice", "upload", "a.pdf", "b.pdf"]).unwrap();
    let Commands::Upload { files, format } = cli.command else {
        panic!("expected upload command");
    };
    assert_eq!(files.len(), 2);
    assert_eq!(format, ExportFormatArg::Csv);

    assert!(Cli::try_parse_from(["invoice", "upload"]).is_err());
    assert!(Cli::try_parse_from(["invoice", "upload", "a.pdf", "--format", "docx"]).is_err());
}

#[test]
fn dropped_files_only_read_the_first() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("good.pdf");
    std::fs::write(&first, b"%PDF-1.4").unwrap();

    let (file, ignored) =
        read_selection(&[first.clone(), dir.path().join("missing.pdf")]).unwrap();
    assert_eq!(file.name, "good.pdf");
    assert_eq!(file.bytes, b"%PDF-1.4".to_vec());
    assert_eq!(ignored, 1);

    let (file, ignored) = read_selection(&[first]).unwrap();
    assert_eq!(file.mime_type, "application/pdf");
    assert_eq!(ignored, 0);

    assert!(matches!(
        read_selection(&[dir.path().join("missing.pdf")]),
        Err(UploadError::UnreadableFile { .. })
    ));
    assert!(matches!(read_selection(&[]), Err(UploadError::NoFileSelected)));
}

#[test]
fn global_flags_parse_after_subcommand() {
    let cli = Cli::try_parse_from([
        "invoice",
        "auth",
        "login",
        "--identifier",
        "alice",
        "--password",
        "x",
        "--profile",
        "work",
        "--api-url",
        "https://invoices.example.com",
    ])
    .unwrap();
    assert_eq!(cli.profile.as_deref(), Some("work"));
    assert_eq!(cli.api_url.as_deref(), Some("https://invoices.example.com"));
    assert!(matches!(
        cli.command,
        Commands::Auth {
            command: AuthCommands::Login { .. }
        }
    ));
}

#[test]
fn profile_init_merges_and_activates() {
    let mut config = CliProfilesConfig {
        version: 1,
        active_profile: Some("default".to_string()),
        profiles: BTreeMap::new(),
    };

    apply_profile_init(
        &mut config,
        "work",
        Some(" https://invoices.example.com/ ".to_string()),
        Some(30),
        false,
    )
    .unwrap();
    assert_eq!(config.active_profile.as_deref(), Some("work"));
    assert_eq!(
        config.profile("work"),
        Some(&CliProfile {
            api_base_url: Some("https://invoices.example.com".to_string()),
            request_timeout_secs: Some(30),
        })
    );

    apply_profile_init(&mut config, "work", None, Some(0), true).unwrap();
    assert_eq!(
        config.profile("work"),
        Some(&CliProfile {
            api_base_url: Some("https://invoices.example.com".to_string()),
            request_timeout_secs: None,
        })
    );
}

#[test]
fn profile_init_rejects_non_http_url() {
    let mut config = CliProfilesConfig::default();
    let result = apply_profile_init(
        &mut config,
        "default",
        Some("invoices.example.com".to_string()),
        None,
        false,
    );
    assert!(matches!(result, Err(CliError::Core(_))));
    assert!(config.profiles.is_empty());
}

#[test]
fn not_signed_in_points_at_login() {
    assert!(CliError::NotSignedIn
        .to_string()
        .contains("invoice auth login"));
}

#[test]
fn completions_name_the_binary() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("invoice"));
}

#[test]
fn run_completions_writes_bash_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invoice.bash");

    run_completions(CompletionShell::Bash, Some(&path)).unwrap();

    let script = std::fs::read_to_string(&path).unwrap();
    assert!(script.contains("upload"));
}
