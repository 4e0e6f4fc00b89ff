use anyhow::{anyhow, Context, Result};
use std::{
    env,
    io::{self, BufRead, Write},
    path::PathBuf,
};
use stipfilter::{
    annotate,
    config::Config,
    export, filter,
    load::load_with_report,
    normalize_keyword, select_matches, Policy, PipelineError,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const EMPTY_KEYWORD_MSG: &str = "Please enter a keyword to filter policies.";
const PREVIEW_ROWS: usize = 5;

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) arguments: [POLICY] [KEYWORD] ────────────────────────────
    let args: Vec<String> = env::args().collect();
    let policy = match args.get(1) {
        Some(p) => Policy::from_str(p).ok_or_else(|| {
            anyhow!(
                "unknown policy {:?}; usage: {} [unique|multiple] [KEYWORD]",
                p,
                args[0]
            )
        })?,
        None => Policy::UniqueInitiatives,
    };
    let keyword = match args.get(2).map(|k| normalize_keyword(k)) {
        Some(Ok(k)) => k,
        Some(Err(PipelineError::EmptyKeyword)) | None => prompt_keyword()?,
        Some(Err(e)) => return Err(e.into()),
    };

    // ─── 3) load once ────────────────────────────────────────────────
    let config = config_from_env().context("reading configuration")?;
    let (dataset, report) = load_with_report(&config).context("loading survey files")?;
    for s in &report.surveys {
        info!(
            year = s.year,
            file = %s.path.display(),
            read = s.rows_read,
            kept = s.rows_kept,
            skipped = s.rows_skipped,
            "survey loaded"
        );
    }

    // ─── 4) dedup → flags → select ───────────────────────────────────
    info!(policy = policy.label(), keyword = %keyword, "filtering");
    let deduped = filter(&dataset, policy)?;
    let annotated = annotate(&deduped, &keyword)?;
    let selected = select_matches(&annotated)?;
    if selected.is_empty() {
        warn!(keyword = %keyword, "no initiatives mention the keyword");
    }
    info!(
        "Filtered dataframe for keyword '{}' created successfully! {} of {} rows",
        keyword,
        selected.num_rows(),
        deduped.num_rows()
    );

    if tracing::enabled!(tracing::Level::DEBUG) {
        let ordered = export::export_order(&selected)?;
        for line in export::preview_rows(&ordered, PREVIEW_ROWS)? {
            debug!("{}", line);
        }
    }

    // ─── 5) export ───────────────────────────────────────────────────
    let summary = export::export_all(&selected, &config.output_dir, &keyword)
        .context("writing exports")?;
    println!("{}", summary.csv.display());
    println!("{}", summary.xlsx.display());
    println!("{}", summary.parquet.display());
    Ok(())
}

/// `STIP_CONFIG` (default `stip.yaml`), then `STIP_DATA_DIR` / `STIP_OUTPUT_DIR`.
fn config_from_env() -> stipfilter::Result<Config> {
    let path = env::var_os("STIP_CONFIG").unwrap_or_else(|| "stip.yaml".into());
    Ok(Config::load_or_default(PathBuf::from(path))?.with_dirs(
        env::var_os("STIP_DATA_DIR").map(PathBuf::from),
        env::var_os("STIP_OUTPUT_DIR").map(PathBuf::from),
    ))
}

/// Ask on stdin until a non-empty keyword arrives.
fn prompt_keyword() -> Result<String> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        eprint!("Enter the keyword to filter policies: ");
        io::stderr().flush()?;
        let line = lines
            .next()
            .ok_or_else(|| anyhow!("no keyword given"))?
            .context("reading keyword")?;
        match normalize_keyword(&line) {
            Ok(k) => return Ok(k),
            Err(PipelineError::EmptyKeyword) => eprintln!("{}", EMPTY_KEYWORD_MSG),
            Err(e) => return Err(e.into()),
        }
    }
}
