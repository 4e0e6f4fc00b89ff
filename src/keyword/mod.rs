// src/keyword/mod.rs

use arrow::{
    array::{ArrayRef, BooleanArray},
    compute::{filter_record_batch, or},
    datatypes::{DataType, Field},
};
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::schema::columns::{
    BACKGROUND, FLAG_BACKGROUND, FLAG_COLUMNS, FLAG_OBJECTIVES, FLAG_SHORT_DESCRIPTION,
    FLAG_TITLE, NAME_ENGLISH, OBJECTIVES, SHORT_DESCRIPTION,
};

/// Trim and lowercase user input; an empty result is `EmptyKeyword`.
pub fn normalize_keyword(raw: &str) -> Result<String> {
    let keyword = raw.trim().to_lowercase();
    if keyword.is_empty() {
        return Err(PipelineError::EmptyKeyword);
    }
    Ok(keyword)
}

/// Literal, Unicode case-insensitive matcher for `keyword`. Simple case
/// folding makes `Σ`, `σ` and `ς` interchangeable, which lowercasing both
/// sides does not. An empty keyword matches any text.
fn keyword_matcher(keyword: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(&regex::escape(keyword))
        .case_insensitive(true)
        .build()?)
}

/// Per-row match flags. Null cells, and a column the dataset lacks
/// entirely, never match.
fn contains_flags(dataset: &Dataset, column: &str, needle: &Regex) -> Result<BooleanArray> {
    let n = dataset.num_rows();
    let Some(values) = dataset.strings(column)? else {
        return Ok(BooleanArray::from(vec![false; n]));
    };
    Ok(values
        .iter()
        .map(|cell| Some(cell.is_some_and(|text| needle.is_match(text))))
        .collect())
}

/// Add the four `Keyword_appears_*` flags. Rows are neither added nor removed.
pub fn annotate(dataset: &Dataset, keyword: &str) -> Result<Dataset> {
    let needle = keyword_matcher(keyword)?;

    let title = contains_flags(dataset, NAME_ENGLISH, &needle)?;
    let short = contains_flags(dataset, SHORT_DESCRIPTION, &needle)?;
    let background = contains_flags(dataset, BACKGROUND, &needle)?;

    let mut objectives = BooleanArray::from(vec![false; dataset.num_rows()]);
    for col in OBJECTIVES {
        objectives = or(&objectives, &contains_flags(dataset, col, &needle)?)?;
    }

    let flag = |name: &str, values: BooleanArray| {
        (
            Field::new(name, DataType::Boolean, false),
            Arc::new(values) as ArrayRef,
        )
    };
    let out = dataset.with_columns(vec![
        flag(FLAG_TITLE, title),
        flag(FLAG_SHORT_DESCRIPTION, short),
        flag(FLAG_BACKGROUND, background),
        flag(FLAG_OBJECTIVES, objectives),
    ])?;
    debug!(keyword = %keyword, rows = out.num_rows(), "annotated keyword flags");
    Ok(out)
}

/// Rows where the keyword appears in at least one field group.
pub fn select_matches(annotated: &Dataset) -> Result<Dataset> {
    let mut any = BooleanArray::from(vec![false; annotated.num_rows()]);
    for name in FLAG_COLUMNS {
        any = or(&any, annotated.flags(name)?)?;
    }
    let hits = any.true_count();
    let batch = filter_record_batch(annotated.batch(), &any)?;
    debug!(rows_in = annotated.num_rows(), hits, "selected keyword matches");
    Ok(annotated.derive(batch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{dataset, init_test_logging, Row};

    fn flags(ds: &Dataset) -> Vec<[bool; 4]> {
        let cols: Vec<&BooleanArray> = [
            FLAG_TITLE,
            FLAG_SHORT_DESCRIPTION,
            FLAG_BACKGROUND,
            FLAG_OBJECTIVES,
        ]
        .iter()
        .map(|c| ds.flags(c).unwrap())
        .collect();
        (0..ds.num_rows())
            .map(|i| [cols[0].value(i), cols[1].value(i), cols[2].value(i), cols[3].value(i)])
            .collect()
    }

    fn sample() -> Dataset {
        dataset(
            &[
                Row::new("1", 2023)
                    .name("Green Grant Initiative")
                    .background("funding for green tech")
                    .objective(1, "reduce emissions"),
                Row::new("2", 2023)
                    .name("Digital skills")
                    .short("Research GRANTS for universities")
                    .objective(6, "Grant-making capacity"),
                Row::new("3", 2021).name("Tax credit"),
            ],
            2023,
        )
    }

    #[test]
    fn green_grant_scenario() {
        let out = annotate(&sample(), "green").unwrap();
        // title, short description, background, objectives
        assert_eq!(flags(&out)[0], [true, false, true, false]);
    }

    #[test]
    fn objectives_are_or_ed_across_all_six() {
        let out = annotate(&sample(), "grant").unwrap();
        assert_eq!(
            flags(&out),
            vec![
                [true, false, false, false],
                [false, true, false, true],
                [false, false, false, false],
            ]
        );
    }

    #[test]
    fn matching_ignores_case() {
        let lower = annotate(&sample(), "grant").unwrap();
        let upper = annotate(&sample(), "GRANT").unwrap();
        assert_eq!(flags(&lower), flags(&upper));
    }

    #[test]
    fn final_sigma_matches_capital_and_small() {
        init_test_logging();
        let ds = dataset(
            &[
                Row::new("1", 2023).name("ΟΔΟΣ"),
                Row::new("2", 2023).name("οδος"),
                Row::new("3", 2023).name("Δρόμος"),
            ],
            2023,
        );
        for keyword in ["Σ", "σ", "ς"] {
            let out = annotate(&ds, keyword).unwrap();
            let titles: Vec<bool> = flags(&out).iter().map(|f| f[0]).collect();
            assert_eq!(titles, vec![true, true, true], "keyword {:?}", keyword);
        }
        let out = annotate(&ds, "ΟΔΟΣ").unwrap();
        assert!(flags(&out)[1][0]);
    }

    #[test]
    fn keyword_is_matched_literally() {
        let ds = dataset(
            &[
                Row::new("1", 2023).name("C++ toolchains (R&D)"),
                Row::new("2", 2023).name("Cxx"),
            ],
            2023,
        );
        let out = annotate(&ds, "c++").unwrap();
        assert!(flags(&out)[0][0]);
        assert!(!flags(&out)[1][0]);
        let out = annotate(&ds, "(r&d)").unwrap();
        assert!(flags(&out)[0][0]);
    }

    #[test]
    fn null_background_is_false() {
        let ds = dataset(&[Row::new("1", 2023).name("x")], 2023);
        let out = annotate(&ds, "x").unwrap();
        assert!(!out.flags(FLAG_BACKGROUND).unwrap().value(0));
    }

    #[test]
    fn empty_keyword_matches_every_present_field() {
        let out = annotate(&sample(), "").unwrap();
        // row 3 only has a title
        assert_eq!(flags(&out)[2], [true, false, false, false]);
    }

    #[test]
    fn reannotating_replaces_flags() {
        let once = annotate(&sample(), "green").unwrap();
        let twice = annotate(&once, "tax").unwrap();
        assert_eq!(twice.batch().num_columns(), once.batch().num_columns());
        assert_eq!(flags(&twice)[2], [true, false, false, false]);
        assert_eq!(flags(&twice)[0], [false, false, false, false]);
    }

    #[test]
    fn select_keeps_rows_with_any_flag() {
        let out = select_matches(&annotate(&sample(), "grant").unwrap()).unwrap();
        let ids: Vec<&str> = out.ids().unwrap().iter().map(|v| v.unwrap()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn select_requires_flags() {
        assert!(matches!(
            select_matches(&sample()),
            Err(PipelineError::MissingColumn(_))
        ));
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_keyword("  Green ").unwrap(), "green");
        assert!(matches!(normalize_keyword("   "), Err(PipelineError::EmptyKeyword)));
    }
}
