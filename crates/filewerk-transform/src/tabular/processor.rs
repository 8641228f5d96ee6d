// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CSV normaliser/tagger — parses one or more CSV files, keeps rows that carry
// a phone number, canonicalises them, applies tag rules, and writes a single
// combined export.

use std::sync::Arc;

use filewerk_core::TransformConfig;
use filewerk_core::error::{FilewerkError, Result};
use filewerk_core::types::{InputFile, OutputFile, ProcessedRow, RawRow, TagRule};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument};

use super::columns::{ResolvedColumns, csv_reader, decode_record, read_headers};
use super::phone::normalize_phone;
use super::rules::evaluate;

/// Turns a batch of CSV files into one normalised, tagged export.
pub struct TabularProcessor {
    /// File name given to the combined export.
    output_name: String,
}

impl TabularProcessor {
    pub fn new(config: &TransformConfig) -> Self {
        Self {
            output_name: config.tabular_output_name.clone(),
        }
    }

    /// Process every file and serialise the surviving rows into one CSV.
    ///
    /// Files are parsed concurrently on blocking workers. Each worker fills
    /// the slot of its own file index, so the export follows submission
    /// order regardless of which file finishes first.
    #[instrument(skip_all, fields(files = files.len(), rules = rules.len()))]
    pub async fn process(&self, files: Vec<InputFile>, rules: &[TagRule]) -> Result<OutputFile> {
        if files.is_empty() {
            return Err(FilewerkError::NoInput("CSV processing"));
        }

        let file_count = files.len();
        let rules: Arc<[TagRule]> = Arc::from(rules);
        let mut tasks = JoinSet::new();

        for (index, file) in files.into_iter().enumerate() {
            let rules = Arc::clone(&rules);
            tasks.spawn_blocking(move || (index, process_file(&file, &rules)));
        }

        let mut slots: Vec<Option<Vec<ProcessedRow>>> = (0..file_count).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, rows) =
                joined.map_err(|err| FilewerkError::Task(format!("CSV worker: {err}")))?;
            // First failure aborts the batch; dropping the set discards the rest.
            slots[index] = Some(rows?);
        }

        let rows: Vec<ProcessedRow> = slots.into_iter().flatten().flatten().collect();
        let output = self.write_rows(&rows)?;
        info!(rows = rows.len(), bytes = output.bytes.len(), "CSV export ready");
        Ok(output)
    }

    /// Serialise `rows` under the fixed export header.
    ///
    /// Fails with [`FilewerkError::EmptyResult`] when there is nothing to write.
    pub fn write_rows(&self, rows: &[ProcessedRow]) -> Result<OutputFile> {
        if rows.is_empty() {
            return Err(FilewerkError::EmptyResult);
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer
                .serialize(row)
                .map_err(|err| FilewerkError::Csv(err.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| FilewerkError::Csv(err.to_string()))?;

        Ok(OutputFile::new(self.output_name.clone(), bytes))
    }
}

impl Default for TabularProcessor {
    fn default() -> Self {
        Self::new(&TransformConfig::default())
    }
}

/// Parse and normalise a single CSV file.
///
/// Rows whose phone cell is blank (or whose file has no phone column) are
/// dropped. Returns the surviving rows in file order.
#[instrument(skip_all, fields(file = %file.name, bytes = file.size()))]
pub fn process_file(file: &InputFile, rules: &[TagRule]) -> Result<Vec<ProcessedRow>> {
    let mut reader = csv_reader(&file.bytes);
    let headers = read_headers(&mut reader, file)?;
    let columns = ResolvedColumns::resolve(&headers);
    debug!(?columns, "Column roles resolved");

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for record in reader.byte_records() {
        let record = record.map_err(|err| FilewerkError::Parse {
            file: file.name.clone(),
            detail: err.to_string(),
        })?;
        let fields = decode_record(&record);

        if fields.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let mut raw = RawRow::with_capacity(headers.len());
        for (header, value) in headers.iter().zip(fields) {
            raw.entry(header.clone()).or_insert(value);
        }

        let read = |column: &Option<String>| -> String {
            column
                .as_deref()
                .and_then(|name| raw.get(name))
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };

        let phone_cell = read(&columns.phone);
        if phone_cell.is_empty() {
            skipped += 1;
            continue;
        }

        let phone = normalize_phone(&phone_cell);
        rows.push(ProcessedRow {
            user_id: phone.clone(),
            first_name: read(&columns.first_name),
            last_name: read(&columns.last_name),
            email: read(&columns.email),
            phone,
            tags: evaluate(&raw, rules),
        });
    }

    debug!(kept = rows.len(), skipped, "CSV file processed");
    Ok(rows)
}
