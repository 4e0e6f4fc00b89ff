// src/config.rs

use glob::glob;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};

static YEAR_IN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\D)((?:19|20)\d{2})(?:\D|$)").expect("year regex is valid"));

/// One yearly snapshot: a gzip'd, pipe-delimited survey export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SurveyFile {
    pub year: i32,
    pub file: PathBuf,
}

/// What to do with a row whose `InitiativeID` yields no numeric segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedIdPolicy {
    /// Drop the row, log it, keep loading.
    #[default]
    Skip,
    /// Fail the whole load.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Load order matters: it is the tie-break between rows of equal year.
    /// Empty means "discover `*.csv.gz` under `data_dir`".
    pub surveys: Vec<SurveyFile>,
    pub malformed_ids: MalformedIdPolicy,
}

impl Default for Config {
    fn default() -> Self {
        let survey = |year: i32, file: &str| SurveyFile {
            year,
            file: PathBuf::from(file),
        };
        Config {
            data_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            surveys: vec![
                survey(2023, "STIP_Survey.csv.gz"),
                survey(2017, "STIP_Survey-2017.csv.gz"),
                survey(2019, "STIP_Survey-2019.csv.gz"),
                survey(2021, "STIP_Survey-2021.csv.gz"),
            ],
            malformed_ids: MalformedIdPolicy::Skip,
        }
    }
}

impl Config {
    /// Parse a YAML config file. Fields left out fall back to `Config::default()`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("reading {}: {}", path.display(), e))
        })?;
        let cfg: Config = serde_yaml::from_str(&text)
            .map_err(|e| PipelineError::Config(format!("parsing {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), surveys = cfg.surveys.len(), "loaded config");
        Ok(cfg)
    }

    /// `path` if the file exists, otherwise the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Config::load(path)
        } else {
            info!(path = %path.display(), "no config file; using defaults");
            Ok(Config::default())
        }
    }

    /// Replace whichever directories are given.
    pub fn with_dirs(mut self, data_dir: Option<PathBuf>, output_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        self
    }

    /// Resolve the survey list against `data_dir`, discovering files if none are configured,
    /// and validate it.
    pub fn resolved_surveys(&self) -> Result<Vec<SurveyFile>> {
        let surveys = if self.surveys.is_empty() {
            discover_surveys(&self.data_dir)?
        } else {
            self.surveys
                .iter()
                .map(|s| SurveyFile {
                    year: s.year,
                    file: self.data_dir.join(&s.file),
                })
                .collect()
        };

        if surveys.is_empty() {
            return Err(PipelineError::Config(format!(
                "no survey files configured or found under {}",
                self.data_dir.display()
            )));
        }
        let mut seen = HashSet::new();
        for s in &surveys {
            if !seen.insert(s.year) {
                return Err(PipelineError::Config(format!(
                    "survey year {} is listed more than once",
                    s.year
                )));
            }
        }
        Ok(surveys)
    }
}

/// Most recent survey year in the list: the one whose rows are "ongoing".
pub fn latest_year(surveys: &[SurveyFile]) -> Option<i32> {
    surveys.iter().map(|s| s.year).max()
}

/// Find every `*.csv.gz` under `dir` and take its year from the file name.
/// Sorted newest first, so the default tie-break favours the latest snapshot.
pub fn discover_surveys(dir: &Path) -> Result<Vec<SurveyFile>> {
    let pattern = format!("{}/*.csv.gz", dir.display());
    let paths = glob(&pattern)
        .map_err(|e| PipelineError::Config(format!("bad glob pattern {}: {}", pattern, e)))?;

    let mut found = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| PipelineError::Config(e.to_string()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let year = year_from_filename(&name).ok_or_else(|| {
            PipelineError::Config(format!("cannot tell survey year from file name {}", name))
        })?;
        found.push(SurveyFile { year, file: path });
    }
    found.sort_by(|a, b| b.year.cmp(&a.year));
    info!(dir = %dir.display(), count = found.len(), "discovered survey files");
    Ok(found)
}

/// Pull a `19xx`/`20xx` token out of a file name, e.g. `STIP_Survey-2019.csv.gz` → 2019.
pub fn year_from_filename(name: &str) -> Option<i32> {
    YEAR_IN_NAME
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
