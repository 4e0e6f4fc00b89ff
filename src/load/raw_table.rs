use std::path::PathBuf;

#[derive(Debug)]
pub struct RawTable {
    /// Column names from the header row of the survey file.
    pub headers: Vec<String>,
    /// Each data row, padded to `headers.len()`; empty fields are `None`.
    pub rows: Vec<Vec<Option<String>>>,
    /// Survey year this snapshot represents.
    pub year: i32,
    pub source: PathBuf,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
