pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod filter;
pub mod keyword;
pub mod load;
pub mod schema;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::Config;
pub use dataset::Dataset;
pub use error::{PipelineError, Result};
pub use filter::{filter, Policy};
pub use keyword::{annotate, normalize_keyword, select_matches};
pub use load::load;
