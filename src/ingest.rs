//! One-shot bulk load of dataset tables into the catalog.
//!
//! Every file in the source directory is one dataset. Rows are normalized,
//! exact duplicates within a file are dropped, names not yet catalogued become
//! new proteins (first file wins), and every surviving row is recorded as a
//! provenance row tagged with the file's dataset id.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::time::Instant;

use camino::Utf8Path;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::app::{ProgressEvent, ProgressSink};
use crate::config::TableLayout;
use crate::domain::{DatasetId, SourceRow, normalize_id, normalize_name};
use crate::error::CatalogError;
use crate::fs_util::list_dataset_files;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct DatasetTable {
    pub dataset_id: DatasetId,
    pub rows: Vec<SourceRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub started_at: String,
    pub files: Vec<FileReport>,
    pub total_rows: usize,
    pub total_inserted: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub dataset_id: String,
    pub rows: usize,
    pub inserted: usize,
}

pub fn read_dataset(path: &Utf8Path, layout: &TableLayout) -> Result<DatasetTable, CatalogError> {
    let dataset_id = DatasetId::from_path(path)?;
    let file = File::open(path.as_std_path())
        .map_err(|err| CatalogError::Filesystem(format!("open {path}: {err}")))?;
    let rows = read_table(file, layout, path.as_str())?;
    Ok(DatasetTable { dataset_id, rows })
}

/// Parses a delimited table into normalized rows with exact duplicates
/// removed. `label` names the source in errors.
pub fn read_table<R: Read>(
    reader: R,
    layout: &TableLayout,
    label: &str,
) -> Result<Vec<SourceRow>, CatalogError> {
    let malformed = |message: String| CatalogError::IngestionFormat {
        path: label.to_string(),
        message,
    };

    let mut table = csv::ReaderBuilder::new()
        .delimiter(layout.delimiter)
        .has_headers(true)
        .from_reader(reader);
    let headers = table
        .headers()
        .map_err(|err| malformed(format!("header: {err}")))?
        .clone();

    let skip = usize::from(layout.index_column);
    let columns = headers.iter().skip(skip).map(str::trim).collect::<Vec<_>>();
    let column = |wanted: &str| {
        columns
            .iter()
            .position(|header| *header == wanted.trim())
            .ok_or_else(|| malformed(format!("missing column {wanted:?}")))
    };
    let name_at = column(&layout.name_column)?;
    let id_at = column(&layout.id_column)?;

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for (index, record) in table.records().enumerate() {
        // header is line 1
        let line = index + 2;
        let record = record.map_err(|err| malformed(format!("line {line}: {err}")))?;
        let mut values = record
            .iter()
            .skip(skip)
            .map(str::to_string)
            .collect::<Vec<_>>();
        if values.len() != columns.len() {
            return Err(malformed(format!(
                "line {line}: expected {} fields, found {}",
                columns.len(),
                values.len()
            )));
        }
        values[id_at] = normalize_id(&values[id_at]);
        values[name_at] = normalize_name(&values[name_at]);
        if values[id_at].is_empty() || values[name_at].is_empty() {
            return Err(malformed(format!("line {line}: empty id or name")));
        }

        let row = SourceRow {
            id: values[id_at].clone(),
            name: values[name_at].clone(),
        };
        if seen.insert(values) {
            rows.push(row);
        }
    }
    Ok(rows)
}

pub struct Ingestor<'a> {
    store: &'a Store,
    layout: &'a TableLayout,
}

impl<'a> Ingestor<'a> {
    pub fn new(store: &'a Store, layout: &'a TableLayout) -> Self {
        Self { store, layout }
    }

    /// Loads every dataset file in `source_dir`, in file name order. Stops at
    /// the first malformed file; earlier files stay loaded.
    pub fn run(
        &self,
        source_dir: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<IngestReport, CatalogError> {
        let started_at = Utc::now().to_rfc3339();
        let files = list_dataset_files(source_dir)?;
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; {} dataset file(s) in {source_dir}", files.len()),
            elapsed: None,
        });

        let mut reports = Vec::with_capacity(files.len());
        for path in &files {
            let start = Instant::now();
            let table = read_dataset(path, self.layout)?;
            let report = self.ingest_table(&table)?;
            sink.event(ProgressEvent {
                message: format!(
                    "phase=Ingest; dataset={} rows={} inserted={}",
                    report.dataset_id, report.rows, report.inserted
                ),
                elapsed: Some(start.elapsed()),
            });
            reports.push(report);
        }

        let total_rows = reports.iter().map(|report| report.rows).sum();
        let total_inserted = reports.iter().map(|report| report.inserted).sum();
        info!(
            datasets = reports.len(),
            rows = total_rows,
            inserted = total_inserted,
            "ingestion complete"
        );
        Ok(IngestReport {
            started_at,
            files: reports,
            total_rows,
            total_inserted,
        })
    }

    pub fn ingest_table(&self, table: &DatasetTable) -> Result<FileReport, CatalogError> {
        let existing = self.store.existing_names()?;
        let mut claimed = HashSet::new();
        let fresh = table
            .rows
            .iter()
            .filter(|&row| !existing.contains(&row.name) && claimed.insert(row.name.as_str()))
            .cloned()
            .collect::<Vec<_>>();

        let inserted = self.store.insert_proteins(&fresh)?;
        let rows = self.store.append_provenance(&table.dataset_id, &table.rows)?;
        info!(dataset = %table.dataset_id, rows, inserted, "dataset ingested");

        Ok(FileReport {
            dataset_id: table.dataset_id.to_string(),
            rows,
            inserted,
        })
    }
}
