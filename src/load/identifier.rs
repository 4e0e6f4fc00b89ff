use tracing::warn;

use super::raw_table::RawTable;
use crate::config::MalformedIdPolicy;
use crate::error::{PipelineError, Result};
use crate::schema::columns::INITIATIVE_ID;

/// Last `/`-separated segment of an `InitiativeID` URL,
/// e.g. `https://stip.oecd.org/2023/data/policyInitiatives/26680` → `26680`.
/// `None` when the segment is empty (trailing slash, empty value).
pub fn numeric_segment(initiative_id: &str) -> Option<&str> {
    initiative_id.rsplit('/').next().filter(|seg| !seg.is_empty())
}

/// A survey table whose rows each carry a derived `InitiativeID_numeric`.
#[derive(Debug)]
pub struct KeyedTable {
    pub raw: RawTable,
    /// Parallel to `raw.rows`.
    pub ids: Vec<String>,
    /// Rows dropped for lacking an extractable id.
    pub skipped: usize,
}

/// Derive the numeric id for every row in `raw`.
///
/// Rows without one are dropped with a warning under `Skip`, or fail the load under `Abort`.
pub fn key_rows(mut raw: RawTable, policy: MalformedIdPolicy) -> Result<KeyedTable> {
    let id_col = raw.column_index(INITIATIVE_ID).ok_or_else(|| {
        PipelineError::parse(&raw.source, format!("missing column {}", INITIATIVE_ID))
    })?;

    let mut ids = Vec::with_capacity(raw.rows.len());
    let mut kept = Vec::with_capacity(raw.rows.len());
    let mut skipped = 0;

    for (idx, row) in std::mem::take(&mut raw.rows).into_iter().enumerate() {
        let value = row[id_col].as_deref();
        match value.and_then(numeric_segment) {
            Some(id) => {
                ids.push(id.to_string());
                kept.push(row);
            }
            None => match policy {
                MalformedIdPolicy::Abort => {
                    return Err(PipelineError::MalformedIdentifier {
                        path: raw.source.clone(),
                        row: idx + 1,
                        value: value.map(String::from),
                    });
                }
                MalformedIdPolicy::Skip => {
                    warn!(
                        file = %raw.source.display(),
                        row = idx + 1,
                        value = ?value,
                        "skipping row with malformed InitiativeID"
                    );
                    skipped += 1;
                }
            },
        }
    }

    raw.rows = kept;
    Ok(KeyedTable { raw, ids, skipped })
}
