// src/schema/columns.rs

//! Column names the pipeline reads or derives. Every other column in a
//! survey file is passed through untouched.

pub const INITIATIVE_ID: &str = "InitiativeID";
pub const NAME_ENGLISH: &str = "NameEnglish";
pub const SHORT_DESCRIPTION: &str = "ShortDescription";
pub const BACKGROUND: &str = "Background";

pub const OBJECTIVES: [&str; 6] = [
    "Objectives1",
    "Objectives2",
    "Objectives3",
    "Objectives4",
    "Objectives5",
    "Objectives6",
];

pub const INITIATIVE_ID_NUMERIC: &str = "InitiativeID_numeric";
pub const YEAR_SOURCE: &str = "year_source";
pub const STATUS: &str = "status";

pub const FLAG_TITLE: &str = "Keyword_appears_Title";
pub const FLAG_SHORT_DESCRIPTION: &str = "Keyword_appears_ShortDescription";
pub const FLAG_BACKGROUND: &str = "Keyword_appears_Background";
pub const FLAG_OBJECTIVES: &str = "Keyword_appears_Objectives";

pub const FLAG_COLUMNS: [&str; 4] = [
    FLAG_TITLE,
    FLAG_SHORT_DESCRIPTION,
    FLAG_BACKGROUND,
    FLAG_OBJECTIVES,
];

/// Leading column order of every export; the rest follow in dataset order.
pub const EXPORT_LEADING: [&str; 7] = [
    INITIATIVE_ID_NUMERIC,
    YEAR_SOURCE,
    STATUS,
    FLAG_TITLE,
    FLAG_SHORT_DESCRIPTION,
    FLAG_OBJECTIVES,
    FLAG_BACKGROUND,
];

pub const STATUS_ONGOING: &str = "ongoing";
pub const STATUS_PAST: &str = "past";

/// Columns every survey file must carry in its header.
pub fn required_source_columns() -> impl Iterator<Item = &'static str> {
    [INITIATIVE_ID, NAME_ENGLISH, SHORT_DESCRIPTION, BACKGROUND]
        .into_iter()
        .chain(OBJECTIVES)
}

/// Returns the required columns absent from `headers`, in declaration order.
pub fn missing_required(headers: &[String]) -> Vec<&'static str> {
    required_source_columns()
        .filter(|req| !headers.iter().any(|h| h == req))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_missing_columns_in_order() {
        let headers: Vec<String> = ["InitiativeID", "NameEnglish", "Background", "Objectives1"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let missing = missing_required(&headers);
        assert_eq!(
            missing,
            vec![
                "ShortDescription",
                "Objectives2",
                "Objectives3",
                "Objectives4",
                "Objectives5",
                "Objectives6"
            ]
        );
    }

    #[test]
    fn complete_header_has_nothing_missing() {
        let headers: Vec<String> = required_source_columns()
            .chain(["CountryLabel", "StartDateYear"])
            .map(String::from)
            .collect();
        assert!(missing_required(&headers).is_empty());
    }
}
