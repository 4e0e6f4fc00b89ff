// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema, SchemaRef};
use std::sync::Arc;

use super::columns::{INITIATIVE_ID_NUMERIC, YEAR_SOURCE};

/// Build the unified schema from the union of source headers.
///
/// - every source column → nullable Utf8, in first-seen order
/// - `InitiativeID_numeric` → non-null Utf8
/// - `year_source`          → non-null Int32
pub fn build_unified_schema(source_columns: &[String]) -> SchemaRef {
    let mut fields: Vec<ArrowField> = source_columns
        .iter()
        .filter(|name| name.as_str() != INITIATIVE_ID_NUMERIC && name.as_str() != YEAR_SOURCE)
        .map(|name| ArrowField::new(name, DataType::Utf8, /* nullable = */ true))
        .collect();
    fields.push(ArrowField::new(INITIATIVE_ID_NUMERIC, DataType::Utf8, false));
    fields.push(ArrowField::new(YEAR_SOURCE, DataType::Int32, false));

    Arc::new(ArrowSchema::new(fields))
}

/// Merge `headers` into `union`, keeping first-seen order and skipping names already present.
pub fn merge_columns(union: &mut Vec<String>, headers: &[String]) {
    for h in headers {
        if !union.iter().any(|u| u == h) {
            union.push(h.clone());
        }
    }
}
