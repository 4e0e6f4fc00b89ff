// src/filter/mod.rs
pub mod policy;

use arrow::{
    array::{ArrayRef, StringArray, UInt32Array},
    compute::take_record_batch,
    datatypes::{DataType, Field},
};
use std::{cmp::Reverse, collections::HashSet, sync::Arc};
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::schema::columns::{STATUS, STATUS_ONGOING, STATUS_PAST};

pub use policy::Policy;

/// "ongoing" for the most recent survey year, "past" for anything older.
pub fn status_for(year: i32, latest_year: i32) -> &'static str {
    if year == latest_year {
        STATUS_ONGOING
    } else {
        STATUS_PAST
    }
}

/// Row positions that survive `policy`, newest year first.
///
/// Rows are stably sorted by `year_source` descending, so equal years keep load order.
/// - `UniqueInitiatives`: first row per id.
/// - `MultipleInstruments`: every latest-year row, plus the first older row per id.
pub fn surviving_rows(dataset: &Dataset, policy: Policy) -> Result<Vec<u32>> {
    let ids = dataset.ids()?;
    let years = dataset.years()?;
    let latest = dataset.latest_year();

    let mut order: Vec<u32> = (0..dataset.num_rows() as u32).collect();
    order.sort_by_key(|&i| Reverse(years.value(i as usize)));

    let mut seen: HashSet<&str> = HashSet::new();
    let keep = order
        .into_iter()
        .filter(|&i| {
            let i = i as usize;
            match policy {
                Policy::UniqueInitiatives => seen.insert(ids.value(i)),
                // latest-year rows never count as "seen"
                Policy::MultipleInstruments => {
                    years.value(i) == latest || seen.insert(ids.value(i))
                }
            }
        })
        .collect();
    Ok(keep)
}

/// Apply a dedup policy and label each surviving row's `status`.
///
/// Returns a fresh dataset in sorted order; `dataset` itself is untouched.
pub fn filter(dataset: &Dataset, policy: Policy) -> Result<Dataset> {
    let keep = surviving_rows(dataset, policy)?;
    let batch = take_record_batch(dataset.batch(), &UInt32Array::from(keep))?;
    let deduped = dataset.derive(batch);

    let latest = deduped.latest_year();
    let status: StringArray = deduped
        .years()?
        .values()
        .iter()
        .map(|&y| Some(status_for(y, latest)))
        .collect();

    let out = deduped.with_columns(vec![(
        Field::new(STATUS, DataType::Utf8, false),
        Arc::new(status) as ArrayRef,
    )])?;
    debug!(
        policy = policy.as_str(),
        rows_in = dataset.num_rows(),
        rows_out = out.num_rows(),
        "deduplicated survey rows"
    );
    Ok(out)
}
