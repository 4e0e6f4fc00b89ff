// src/bin/survey_stats.rs

use anyhow::{Context, Result};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    env,
    path::PathBuf,
};
use stipfilter::{config::Config, load::load_with_report};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder().with_env_filter(env_filter).init();

    let config = config_from_env().context("reading configuration")?;
    let (dataset, report) = load_with_report(&config).context("loading survey files")?;

    println!("=== Survey files ===");
    for s in &report.surveys {
        println!(
            "{:<6} {:<40} read {:>7}  kept {:>7}  skipped {:>5}",
            s.year,
            s.path.display(),
            s.rows_read,
            s.rows_kept,
            s.rows_skipped
        );
    }
    println!();

    // year → distinct ids, id → years seen
    let ids = dataset.ids()?;
    let years = dataset.years()?;
    let mut per_year: BTreeMap<i32, (usize, HashSet<&str>)> = BTreeMap::new();
    let mut years_per_id: HashMap<&str, HashSet<i32>> = HashMap::new();
    for i in 0..dataset.num_rows() {
        let (id, year) = (ids.value(i), years.value(i));
        let entry = per_year.entry(year).or_default();
        entry.0 += 1;
        entry.1.insert(id);
        years_per_id.entry(id).or_default().insert(year);
    }

    println!("=== Per year (latest = {}) ===", dataset.latest_year());
    for (year, (rows, distinct)) in per_year.iter().rev() {
        println!("{:<6} rows {:>7}  distinct ids {:>7}", year, rows, distinct.len());
    }
    println!();

    let multi_year = years_per_id.values().filter(|ys| ys.len() > 1).count();
    println!("Distinct initiatives:        {}", years_per_id.len());
    println!("Seen in more than one year:  {}", multi_year);
    println!("Total rows:                  {}", dataset.num_rows());
    Ok(())
}

/// Same resolution as the main binary: config file, then directory overrides.
fn config_from_env() -> stipfilter::Result<Config> {
    let path = env::var_os("STIP_CONFIG").unwrap_or_else(|| "stip.yaml".into());
    Ok(Config::load_or_default(PathBuf::from(path))?.with_dirs(
        env::var_os("STIP_DATA_DIR").map(PathBuf::from),
        env::var_os("STIP_OUTPUT_DIR").map(PathBuf::from),
    ))
}
