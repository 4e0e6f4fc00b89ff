// src/load/mod.rs
pub mod identifier;
pub mod raw_table;

use arrow::{
    array::{new_null_array, ArrayRef, Int32Array, StringArray},
    compute::concat_batches,
    datatypes::{DataType, SchemaRef},
    record_batch::RecordBatch,
};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use rayon::prelude::*;
use std::{
    collections::HashSet,
    fs::File,
    io::{BufReader, ErrorKind, Read},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info};

use crate::config::{latest_year, Config, MalformedIdPolicy, SurveyFile};
use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::schema::{build_unified_schema, merge_columns, missing_required};

pub use identifier::{key_rows, numeric_segment, KeyedTable};
pub use raw_table::RawTable;

/// Per-file row accounting from one load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyCounts {
    pub year: i32,
    pub path: PathBuf,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub surveys: Vec<SurveyCounts>,
}

impl LoadReport {
    pub fn rows_read(&self) -> usize {
        self.surveys.iter().map(|s| s.rows_read).sum()
    }

    pub fn rows_skipped(&self) -> usize {
        self.surveys.iter().map(|s| s.rows_skipped).sum()
    }
}

/// Load every configured survey into one unified dataset.
pub fn load(config: &Config) -> Result<Dataset> {
    load_with_report(config).map(|(dataset, _)| dataset)
}

pub fn load_with_report(config: &Config) -> Result<(Dataset, LoadReport)> {
    let surveys = config.resolved_surveys()?;
    load_surveys(&surveys, config.malformed_ids)
}

/// Read, key and concatenate `surveys` in the given order.
///
/// Any missing, corrupt or unparseable file fails the whole load.
#[tracing::instrument(level = "info", skip_all, fields(files = surveys.len()))]
pub fn load_surveys(
    surveys: &[SurveyFile],
    policy: MalformedIdPolicy,
) -> Result<(Dataset, LoadReport)> {
    let latest = latest_year(surveys)
        .ok_or_else(|| PipelineError::Config("no survey files to load".into()))?;

    // files decode independently; collect keeps configured order
    let tables: Vec<(KeyedTable, usize)> = surveys
        .par_iter()
        .map(|survey| -> Result<(KeyedTable, usize)> {
            let raw = read_survey(&survey.file, survey.year)?;
            let read = raw.len();
            Ok((key_rows(raw, policy)?, read))
        })
        .collect::<Result<_>>()?;

    let mut union = Vec::new();
    for (t, _) in &tables {
        merge_columns(&mut union, &t.raw.headers);
    }
    let schema = build_unified_schema(&union);

    let mut batches = Vec::with_capacity(tables.len());
    let mut report = LoadReport::default();
    for (table, rows_read) in &tables {
        batches.push(table_to_batch(table, &schema)?);
        report.surveys.push(SurveyCounts {
            year: table.raw.year,
            path: table.raw.source.clone(),
            rows_read: *rows_read,
            rows_kept: table.ids.len(),
            rows_skipped: table.skipped,
        });
    }

    let batch = concat_batches(&schema, &batches)?;
    info!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        skipped = report.rows_skipped(),
        latest_year = latest,
        "loaded unified survey dataset"
    );
    Ok((Dataset::new(batch, latest)?, report))
}

/// Decompress and parse one pipe-delimited survey file.
pub fn read_survey(path: &Path, year: i32) -> Result<RawTable> {
    let text = decompress(path)?;
    let table = parse_table(&text, path, year)?;
    debug!(
        file = %path.display(),
        year,
        rows = table.len(),
        columns = table.headers.len(),
        "parsed survey file"
    );
    Ok(table)
}

fn decompress(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PipelineError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => PipelineError::Io(e),
    })?;

    let mut buf = Vec::new();
    GzDecoder::new(BufReader::new(file))
        .read_to_end(&mut buf)
        .map_err(|source| PipelineError::Decompression {
            path: path.to_path_buf(),
            source,
        })?;

    let text = String::from_utf8(buf)
        .map_err(|e| PipelineError::parse(path, format!("invalid UTF-8: {}", e)))?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

fn parse_table(text: &str, path: &Path, year: i32) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| PipelineError::parse(path, format!("header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut seen = HashSet::new();
    if let Some(dup) = headers.iter().find(|h| !seen.insert(h.as_str())) {
        return Err(PipelineError::parse(path, format!("duplicate column {}", dup)));
    }
    let missing = missing_required(&headers);
    if !missing.is_empty() {
        return Err(PipelineError::parse(
            path,
            format!("missing required columns: {}", missing.join(", ")),
        ));
    }

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result
            .map_err(|e| PipelineError::parse(path, format!("record {}: {}", idx + 1, e)))?;
        if record.len() > headers.len() {
            return Err(PipelineError::parse(
                path,
                format!(
                    "record {} has {} fields, header has {}",
                    idx + 1,
                    record.len(),
                    headers.len()
                ),
            ));
        }
        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|f| (!f.is_empty()).then(|| f.to_string()))
            .collect();
        row.resize(headers.len(), None);
        rows.push(row);
    }

    Ok(RawTable {
        headers,
        rows,
        year,
        source: path.to_path_buf(),
    })
}

/// Lay one keyed table out in the unified schema; columns it lacks become all-null.
fn table_to_batch(table: &KeyedTable, schema: &SchemaRef) -> Result<RecordBatch> {
    let n = table.raw.len();
    let source_fields = schema.fields().len() - 2;

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields().iter().take(source_fields) {
        let col: ArrayRef = match table.raw.column_index(field.name()) {
            Some(j) => Arc::new(
                table
                    .raw
                    .rows
                    .iter()
                    .map(|r| r[j].as_deref())
                    .collect::<StringArray>(),
            ),
            None => new_null_array(&DataType::Utf8, n),
        };
        columns.push(col);
    }
    columns.push(Arc::new(StringArray::from(table.ids.clone())));
    columns.push(Arc::new(Int32Array::from(vec![table.raw.year; n])));

    RecordBatch::try_new(schema.clone(), columns).map_err(Into::into)
}
