//! Fixtures shared by the unit tests.

use arrow::{
    array::{ArrayRef, Int32Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use flate2::{write::GzEncoder, Compression};
use std::{fs::File, io::Write, path::Path, sync::Arc};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::dataset::Dataset;

pub const HEADER: &str = "InitiativeID|NameEnglish|ShortDescription|Background|Objectives1|Objectives2|Objectives3|Objectives4|Objectives5|Objectives6|CountryLabel";

pub fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,stipfilter=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Write `content` gzip-compressed to `path`.
pub fn write_gz(path: &Path, content: &str) {
    let file = File::create(path).unwrap();
    let mut enc = GzEncoder::new(file, Compression::default());
    enc.write_all(content.as_bytes()).unwrap();
    enc.finish().unwrap();
}

/// One survey row in `HEADER` order; `id` is the numeric suffix of the InitiativeID URL.
pub fn survey_line(id: &str, name: &str, background: &str, objectives1: &str) -> String {
    format!(
        "https://stip.oecd.org/data/policyInitiatives/{}|{}|Short {}|{}|{}||||||Norway",
        id, name, name, background, objectives1
    )
}

/// A minimal in-memory row for building datasets without touching disk.
pub struct Row<'a> {
    pub id: &'a str,
    pub year: i32,
    pub name: Option<&'a str>,
    pub short: Option<&'a str>,
    pub background: Option<&'a str>,
    pub objectives: [Option<&'a str>; 6],
}

impl<'a> Row<'a> {
    pub fn new(id: &'a str, year: i32) -> Self {
        Row {
            id,
            year,
            name: None,
            short: None,
            background: None,
            objectives: [None; 6],
        }
    }

    pub fn name(mut self, v: &'a str) -> Self {
        self.name = Some(v);
        self
    }

    pub fn short(mut self, v: &'a str) -> Self {
        self.short = Some(v);
        self
    }

    pub fn background(mut self, v: &'a str) -> Self {
        self.background = Some(v);
        self
    }

    pub fn objective(mut self, n: usize, v: &'a str) -> Self {
        self.objectives[n - 1] = Some(v);
        self
    }
}

fn text<F>(rows: &[Row<'_>], f: F) -> ArrayRef
where
    F: Fn(&Row<'_>) -> Option<String>,
{
    Arc::new(rows.iter().map(f).collect::<StringArray>())
}

/// Build a dataset shaped like a loaded one: source columns, then id and year.
pub fn dataset(rows: &[Row<'_>], latest_year: i32) -> Dataset {
    let mut fields = vec![
        Field::new("InitiativeID", DataType::Utf8, true),
        Field::new("NameEnglish", DataType::Utf8, true),
        Field::new("ShortDescription", DataType::Utf8, true),
        Field::new("Background", DataType::Utf8, true),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        text(rows, |r| Some(format!("https://stip.oecd.org/data/policyInitiatives/{}", r.id))),
        text(rows, |r| r.name.map(String::from)),
        text(rows, |r| r.short.map(String::from)),
        text(rows, |r| r.background.map(String::from)),
    ];
    for n in 0..6 {
        fields.push(Field::new(format!("Objectives{}", n + 1), DataType::Utf8, true));
        columns.push(text(rows, |r| r.objectives[n].map(String::from)));
    }
    fields.push(Field::new("InitiativeID_numeric", DataType::Utf8, false));
    columns.push(text(rows, |r| Some(r.id.to_string())));
    fields.push(Field::new("year_source", DataType::Int32, false));
    columns.push(Arc::new(Int32Array::from(
        rows.iter().map(|r| r.year).collect::<Vec<_>>(),
    )));

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap();
    Dataset::new(batch, latest_year).unwrap()
}
