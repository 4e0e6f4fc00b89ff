// src/dataset.rs

use arrow::{
    array::{Array, ArrayRef, BooleanArray, Int32Array, StringArray},
    datatypes::{DataType, Field, FieldRef, Schema, SchemaRef},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use crate::error::{PipelineError, Result};
use crate::schema::columns::{INITIATIVE_ID_NUMERIC, YEAR_SOURCE};

/// Immutable snapshot of survey rows.
///
/// Cloning is cheap: arrow columns are reference counted, so each pipeline step
/// derives a new `Dataset` without touching the one it was given.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    batch: RecordBatch,
    latest_year: i32,
}

impl Dataset {
    /// Wrap `batch`, checking the two derived columns every step depends on.
    pub fn new(batch: RecordBatch, latest_year: i32) -> Result<Self> {
        let schema = batch.schema();
        let id = schema
            .field_with_name(INITIATIVE_ID_NUMERIC)
            .map_err(|_| PipelineError::MissingColumn(INITIATIVE_ID_NUMERIC.into()))?;
        let year = schema
            .field_with_name(YEAR_SOURCE)
            .map_err(|_| PipelineError::MissingColumn(YEAR_SOURCE.into()))?;
        if id.data_type() != &DataType::Utf8 {
            return Err(type_mismatch(INITIATIVE_ID_NUMERIC, id.data_type(), "Utf8"));
        }
        if year.data_type() != &DataType::Int32 {
            return Err(type_mismatch(YEAR_SOURCE, year.data_type(), "Int32"));
        }
        Ok(Dataset { batch, latest_year })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// Most recent survey year; rows from it are "ongoing".
    pub fn latest_year(&self) -> i32 {
        self.latest_year
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema().index_of(name).is_ok()
    }

    /// A Utf8 column, or `None` if the dataset has no column by that name.
    pub fn strings(&self, name: &str) -> Result<Option<&StringArray>> {
        match self.batch.column_by_name(name) {
            None => Ok(None),
            Some(col) => col
                .as_any()
                .downcast_ref::<StringArray>()
                .map(Some)
                .ok_or_else(|| type_mismatch(name, col.data_type(), "Utf8")),
        }
    }

    pub fn ids(&self) -> Result<&StringArray> {
        self.strings(INITIATIVE_ID_NUMERIC)?
            .ok_or_else(|| PipelineError::MissingColumn(INITIATIVE_ID_NUMERIC.into()))
    }

    pub fn years(&self) -> Result<&Int32Array> {
        let col = self
            .batch
            .column_by_name(YEAR_SOURCE)
            .ok_or_else(|| PipelineError::MissingColumn(YEAR_SOURCE.into()))?;
        col.as_any()
            .downcast_ref::<Int32Array>()
            .ok_or_else(|| type_mismatch(YEAR_SOURCE, col.data_type(), "Int32"))
    }

    pub fn flags(&self, name: &str) -> Result<&BooleanArray> {
        let col = self
            .batch
            .column_by_name(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.into()))?;
        col.as_any()
            .downcast_ref::<BooleanArray>()
            .ok_or_else(|| type_mismatch(name, col.data_type(), "Boolean"))
    }

    /// Same snapshot lineage, new rows/columns.
    pub(crate) fn derive(&self, batch: RecordBatch) -> Self {
        Dataset {
            batch,
            latest_year: self.latest_year,
        }
    }

    /// Attach derived columns. A column whose name already exists is replaced
    /// in place; new names are appended in the order given.
    pub(crate) fn with_columns(&self, derived: Vec<(Field, ArrayRef)>) -> Result<Self> {
        let schema = self.batch.schema();
        let mut fields: Vec<FieldRef> = schema.fields().iter().cloned().collect();
        let mut columns: Vec<ArrayRef> = self.batch.columns().to_vec();

        for (field, array) in derived {
            match schema.index_of(field.name()) {
                Ok(i) => {
                    fields[i] = Arc::new(field);
                    columns[i] = array;
                }
                Err(_) => {
                    fields.push(Arc::new(field));
                    columns.push(array);
                }
            }
        }

        let schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
        Ok(self.derive(RecordBatch::try_new(schema, columns)?))
    }
}

fn type_mismatch(name: &str, got: &DataType, want: &str) -> PipelineError {
    PipelineError::ColumnType {
        name: name.to_string(),
        found: got.to_string(),
        expected: want.to_string(),
    }
}
