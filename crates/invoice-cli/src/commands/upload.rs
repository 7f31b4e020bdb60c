use std::path::PathBuf;

use invoice_core::models::ExportFormat;
use invoice_core::state::StatusKind;
use invoice_core::upload::{SelectedFile, UploadCoordinator, UploadError};

use crate::commands::common::{format_status_line, print_history, ClientContext};
use crate::error::CliError;

pub async fn run_upload(
    context: &ClientContext,
    files: &[PathBuf],
    export_format: ExportFormat,
) -> Result<(), CliError> {
    context.require_session()?;

    let coordinator = UploadCoordinator::new(
        context.api.clone(),
        context.session.clone(),
        context.history(),
    );
    let (file, ignored) = read_selection(files)?;
    if ignored == 0 {
        coordinator.pick(file);
    } else {
        coordinator.drop_files([file]);
        eprintln!("Only the first dropped file is uploaded; ignoring {ignored} more.");
    }
    if let Some(name) = coordinator.selected_name() {
        println!("Selected {name}");
    }

    let mut status = coordinator.subscribe_status();
    let submit = coordinator.submit(export_format);
    tokio::pin!(submit);
    let report = loop {
        tokio::select! {
            report = &mut submit => break report?,
            Ok(()) = status.changed() => {
                let current = status.borrow_and_update().clone();
                if current.kind == StatusKind::Processing {
                    println!("{}", format_status_line(&current));
                }
            }
        }
    };

    println!("{}", format_status_line(&report.status));
    print_history(&report.history, false)?;

    if report.status.kind == StatusKind::Error {
        return Err(CliError::UploadFailed);
    }
    Ok(())
}

/// Several paths behave like a drop: only the first is read, the rest are
/// counted as ignored.
pub fn read_selection(files: &[PathBuf]) -> Result<(SelectedFile, usize), UploadError> {
    let Some((first, rest)) = files.split_first() else {
        return Err(UploadError::NoFileSelected);
    };
    Ok((SelectedFile::from_path(first)?, rest.len()))
}
