// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the notification surface.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the front end presents the failure.

use crate::error::FilewerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user can fix it by choosing different files or settings.
    ActionRequired,
    /// Something went wrong inside the engine; re-running will not help.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as the toast heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level.
    pub severity: Severity,
}

/// Convert a `FilewerkError` into a `HumanError` suitable for a toast.
pub fn humanize_error(err: &FilewerkError) -> HumanError {
    match err {
        FilewerkError::NoInput(operation) => HumanError {
            message: "No files selected.".into(),
            suggestion: format!("Add at least one file before running {operation}."),
            severity: Severity::ActionRequired,
        },

        FilewerkError::UnsupportedFile(detail) => HumanError {
            message: "This type of file isn't supported here.".into(),
            suggestion: format!("Use CSV files for cleaning, PDFs for merging, and images for compression. ({detail})"),
            severity: Severity::ActionRequired,
        },

        FilewerkError::InvalidConfig(detail) => HumanError {
            message: "The settings don't make sense.".into(),
            suggestion: format!("Check the configuration file. ({detail})"),
            severity: Severity::ActionRequired,
        },

        // -- Tabular --
        FilewerkError::Parse { file, .. } => HumanError {
            message: format!("We couldn't read {file}."),
            suggestion: "Make sure the file is a CSV with a header row, saved as UTF-8.".into(),
            severity: Severity::ActionRequired,
        },

        FilewerkError::EmptyResult => HumanError {
            message: "No valid rows found after processing.".into(),
            suggestion: "Every row was skipped because its phone number was empty. Check that the files have a phone or mobile column.".into(),
            severity: Severity::ActionRequired,
        },

        FilewerkError::Csv(_) => HumanError {
            message: "We couldn't write the CSV export.".into(),
            suggestion: "Try again with fewer files, or report the problem.".into(),
            severity: Severity::Permanent,
        },

        // -- Documents --
        FilewerkError::Load { index, file, .. } => HumanError {
            message: format!("PDF #{index} ({file}) couldn't be opened."),
            suggestion: "The file may be damaged or not really a PDF. Remove it and merge the rest.".into(),
            severity: Severity::ActionRequired,
        },

        FilewerkError::Pdf(_) => HumanError {
            message: "PDF merging failed.".into(),
            suggestion: "One of the documents has an unusual structure. Try re-saving it with another PDF tool first.".into(),
            severity: Severity::Permanent,
        },

        // -- Images --
        FilewerkError::Decode { file, .. } => HumanError {
            message: format!("We couldn't open the image {file}."),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            severity: Severity::ActionRequired,
        },

        FilewerkError::Encode { format, .. } => HumanError {
            message: format!("Converting to {format} failed."),
            suggestion: "Try a different output format.".into(),
            severity: Severity::Permanent,
        },

        // -- Runtime --
        FilewerkError::Task(_) => HumanError {
            message: "Image, PDF, or CSV processing stopped unexpectedly.".into(),
            suggestion: "Run the conversion again. If it keeps failing, report the problem.".into(),
            severity: Severity::Permanent,
        },

        FilewerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "A file could not be found.".into(),
                suggestion: "Check that the file still exists and try again.".into(),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission denied.".into(),
                suggestion: "Choose a folder you are allowed to read from and write to.".into(),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "Reading or writing a file failed.".into(),
                suggestion: format!("Check the disk and try again. ({io_err})"),
                severity: Severity::Permanent,
            },
        },

        FilewerkError::Serialization(_) => HumanError {
            message: "The settings or rules file is not valid JSON.".into(),
            suggestion: "Fix the file, or run without it to use the defaults.".into(),
            severity: Severity::ActionRequired,
        },
    }
}
