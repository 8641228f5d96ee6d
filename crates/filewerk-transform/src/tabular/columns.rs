// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Column sniffing and alias-based role resolution.

use filewerk_core::error::{FilewerkError, Result};
use filewerk_core::types::{ColumnRole, InputFile};
use tracing::{debug, instrument};

/// Build a CSV reader over an in-memory file.
///
/// Records may be shorter or longer than the header row; missing cells read
/// as empty.
pub(crate) fn csv_reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes)
}

/// Decode one record cell by cell. Bytes that are not UTF-8 (a Windows-1252
/// export, say) become U+FFFD instead of failing the file.
pub(crate) fn decode_record(record: &csv::ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect()
}

/// Read just the header row of `file`.
///
/// A file with no header row at all is a parse failure.
pub(crate) fn read_headers(reader: &mut csv::Reader<&[u8]>, file: &InputFile) -> Result<Vec<String>> {
    let record = reader.byte_headers().map_err(|err| FilewerkError::Parse {
        file: file.name.clone(),
        detail: err.to_string(),
    })?;
    if record.is_empty() {
        return Err(FilewerkError::Parse {
            file: file.name.clone(),
            detail: "missing header row".into(),
        });
    }

    let mut headers = decode_record(record);
    if let Some(first) = headers.first_mut() {
        *first = first.trim_start_matches('\u{feff}').to_string();
    }
    Ok(headers)
}

/// Headers of the first supplied file, in file order.
///
/// Only the header record is parsed. Returns an empty list when no files are
/// given.
#[instrument(skip_all, fields(files = files.len()))]
pub fn sniff_headers(files: &[InputFile]) -> Result<Vec<String>> {
    let Some(file) = files.first() else {
        return Ok(Vec::new());
    };

    let mut reader = csv_reader(&file.bytes);
    let headers = read_headers(&mut reader, file)?;
    debug!(file = %file.name, columns = headers.len(), "Headers sniffed");
    Ok(headers)
}

/// Headers of the first file paired with the role each header resolves to.
pub fn sniff_roles(files: &[InputFile]) -> Result<(Vec<String>, ResolvedColumns)> {
    let headers = sniff_headers(files)?;
    let resolved = ResolvedColumns::resolve(&headers);
    Ok((headers, resolved))
}

/// Find the header matching the first alias, in alias order.
///
/// Headers are compared trimmed and lower-cased; the header is returned as
/// stored so it can index a row.
pub fn resolve_column<'h>(headers: &'h [String], aliases: &[&str]) -> Option<&'h str> {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    aliases.iter().find_map(|alias| {
        let alias = alias.to_lowercase();
        lowered
            .iter()
            .position(|h| *h == alias)
            .map(|idx| headers[idx].as_str())
    })
}

/// The header chosen for each role in one file, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ResolvedColumns {
    pub fn resolve(headers: &[String]) -> Self {
        let find = |role: ColumnRole| resolve_column(headers, role.aliases()).map(str::to_owned);
        Self {
            user_id: find(ColumnRole::UserId),
            first_name: find(ColumnRole::FirstName),
            last_name: find(ColumnRole::LastName),
            email: find(ColumnRole::Email),
            phone: find(ColumnRole::Phone),
        }
    }

    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        match role {
            ColumnRole::UserId => self.user_id.as_deref(),
            ColumnRole::FirstName => self.first_name.as_deref(),
            ColumnRole::LastName => self.last_name.as_deref(),
            ColumnRole::Email => self.email.as_deref(),
            ColumnRole::Phone => self.phone.as_deref(),
        }
    }
}
