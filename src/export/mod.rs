// src/export/mod.rs

use arrow::{
    array::{Array, BooleanArray, Int32Array, StringArray},
    csv::WriterBuilder,
    record_batch::RecordBatch,
    util::display::{ArrayFormatter, FormatOptions},
};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_xlsxwriter::{Format, Workbook};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::schema::columns::EXPORT_LEADING;

/// Where one export run put its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub rows: usize,
    pub csv: PathBuf,
    pub xlsx: PathBuf,
    pub parquet: PathBuf,
}

/// Project `dataset` into export order: id, year, status and the four flags
/// first, then every other column in its existing order.
pub fn export_order(dataset: &Dataset) -> Result<RecordBatch> {
    let schema = dataset.schema();
    let mut indices = Vec::with_capacity(schema.fields().len());
    for name in EXPORT_LEADING {
        let idx = schema
            .index_of(name)
            .map_err(|_| PipelineError::MissingColumn(name.to_string()))?;
        indices.push(idx);
    }
    for (i, field) in schema.fields().iter().enumerate() {
        if !EXPORT_LEADING.contains(&field.name().as_str()) {
            indices.push(i);
        }
    }
    Ok(dataset.batch().project(&indices)?)
}

/// `STIP_Survey_filtered_<keyword>`, keyword reduced to `[A-Za-z0-9_-]`.
pub fn export_file_stem(keyword: &str) -> String {
    let safe: String = keyword
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("STIP_Survey_filtered_{}", safe)
}

/// Pipe-delimited CSV with a header row. Returns bytes written.
pub fn write_csv(batch: &RecordBatch, path: &Path) -> Result<u64> {
    write_atomically(path, |file| {
        let mut writer = WriterBuilder::new()
            .with_delimiter(b'|')
            .with_header(true)
            .build(file);
        writer.write(batch)?;
        writer.into_inner().flush()?;
        Ok(())
    })
}

/// Single-sheet workbook: bold header row, then one row per record.
/// Strings stay text, the year is a number, flags are real booleans and
/// nulls are left as blank cells. Returns bytes written.
pub fn write_xlsx(batch: &RecordBatch, path: &Path) -> Result<u64> {
    write_atomically(path, |file| {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let bold = Format::new().set_bold();

        for (col, field) in batch.schema().fields().iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, field.name(), &bold)?;
        }
        for (col, array) in batch.columns().iter().enumerate() {
            let col = col as u16;
            let any = array.as_any();
            if let Some(values) = any.downcast_ref::<StringArray>() {
                for (i, v) in values.iter().enumerate() {
                    if let Some(v) = v {
                        sheet.write_string(i as u32 + 1, col, v)?;
                    }
                }
            } else if let Some(values) = any.downcast_ref::<BooleanArray>() {
                for (i, v) in values.iter().enumerate() {
                    if let Some(v) = v {
                        sheet.write_boolean(i as u32 + 1, col, v)?;
                    }
                }
            } else if let Some(values) = any.downcast_ref::<Int32Array>() {
                for (i, v) in values.iter().enumerate() {
                    if let Some(v) = v {
                        sheet.write_number(i as u32 + 1, col, f64::from(v))?;
                    }
                }
            } else {
                let field = batch.schema().field(col as usize).clone();
                return Err(PipelineError::ColumnType {
                    name: field.name().clone(),
                    found: field.data_type().to_string(),
                    expected: "Utf8, Int32 or Boolean".to_string(),
                });
            }
        }
        workbook.save_to_writer(file)?;
        Ok(())
    })
}

/// Snappy-compressed Parquet. Returns bytes written.
pub fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<u64> {
    write_atomically(path, |file| {
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
        writer.write(batch)?;
        writer.close()?;
        Ok(())
    })
}

/// First `limit` rows rendered as `a | b | c` lines, nulls shown empty.
pub fn preview_rows(batch: &RecordBatch, limit: usize) -> Result<Vec<String>> {
    let options = FormatOptions::default();
    let formatters = batch
        .columns()
        .iter()
        .map(|c| ArrayFormatter::try_new(c.as_ref(), &options))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((0..batch.num_rows().min(limit))
        .map(|row| {
            formatters
                .iter()
                .map(|f| f.value(row).to_string())
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect())
}

/// Write the selected rows as CSV, XLSX and Parquet under `out_dir`.
pub fn export_all(dataset: &Dataset, out_dir: &Path, keyword: &str) -> Result<ExportSummary> {
    fs::create_dir_all(out_dir)?;
    let batch = export_order(dataset)?;
    let stem = export_file_stem(keyword);

    let csv = out_dir.join(format!("{}.csv", stem));
    let csv_bytes = write_csv(&batch, &csv)?;
    let xlsx = out_dir.join(format!("{}.xlsx", stem));
    let xlsx_bytes = write_xlsx(&batch, &xlsx)?;
    let parquet = out_dir.join(format!("{}.parquet", stem));
    let parquet_bytes = write_parquet(&batch, &parquet)?;

    info!(
        rows = batch.num_rows(),
        csv = %csv.display(),
        csv_bytes,
        xlsx = %xlsx.display(),
        xlsx_bytes,
        parquet = %parquet.display(),
        parquet_bytes,
        "exported filtered survey"
    );
    Ok(ExportSummary {
        rows: batch.num_rows(),
        csv,
        xlsx,
        parquet,
    })
}

/// Write to `<path>.tmp`, then rename over `path`.
fn write_atomically<F>(path: &Path, write: F) -> Result<u64>
where
    F: FnOnce(File) -> Result<()>,
{
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let file = File::create(&tmp_path)?;
    if let Err(e) = write(file) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    let size = fs::metadata(&tmp_path)?.len();
    fs::rename(&tmp_path, path)?;
    debug!(path = %path.display(), size, "wrote export file");
    Ok(size)
}
