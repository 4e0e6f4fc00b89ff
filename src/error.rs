use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("survey file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to decompress {}: {source}", path.display())]
    Decompression {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("malformed InitiativeID {value:?} in {} at row {row}", path.display())]
    MalformedIdentifier {
        path: PathBuf,
        row: usize,
        value: Option<String>,
    },

    #[error("keyword must not be empty")]
    EmptyKeyword,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("dataset is missing column `{0}`")]
    MissingColumn(String),

    #[error("column `{name}` is {found}, expected {expected}")]
    ColumnType {
        name: String,
        found: String,
        expected: String,
    },

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("invalid keyword pattern: {0}")]
    Keyword(#[from] regex::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PipelineError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
