// Transfer-list scout entry point.
//
// 1. Initialize tracing (stderr, so stdout stays a clean report)
// 2. Load scoring config and apply command-line filter overrides
// 3. Load tooltip records and the optional listing, join by player id
// 4. Run one refresh and print the batch sorted by value

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use tlscout_core::config::{self, ScoringConfig};
use tlscout_core::pipeline::{refresh, sort_by_value};
use tlscout_core::records;
use tlscout_core::scoring::ScoredCandidate;

#[derive(Parser)]
#[command(
    name = "tlscout",
    about = "Score transfer-list candidates by rating, training, projection, and price"
)]
struct Cli {
    /// JSON array of tooltip player payloads.
    tooltips: PathBuf,

    /// Listing CSV with player_id, price, prior_si columns.
    #[arg(long)]
    listing: Option<PathBuf>,

    /// Scoring config file. Defaults to config/scoring.toml, copied from
    /// defaults/ on first run.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Clock for the training calendar (RFC 3339). Defaults to now.
    #[arg(long)]
    now: Option<String>,

    /// Keep candidates with any rating at or above this.
    #[arg(long)]
    min_rating: Option<f64>,

    /// Keep candidates whose effective TI is at or above this.
    #[arg(long)]
    min_ti: Option<f64>,

    /// Rate every candidate as this position (e.g. mc, gk).
    #[arg(long)]
    position: Option<String>,

    /// Print only the first N rows.
    #[arg(long)]
    limit: Option<usize>,

    /// Emit JSON instead of a table.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let config = load_scoring_config(&cli)?;
    let now = match &cli.now {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("invalid --now timestamp '{s}'"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let candidates = records::load_candidates(&cli.tooltips, cli.listing.as_deref())
        .context("failed to load candidate records")?;

    let mut scored = refresh(&candidates, &config, now);
    sort_by_value(&mut scored);
    if let Some(limit) = cli.limit {
        scored.truncate(limit);
    }
    info!("reporting {} candidates", scored.len());

    if cli.json {
        let out = serde_json::to_string_pretty(&scored).context("failed to encode report")?;
        println!("{out}");
    } else {
        print_table(&scored);
    }
    Ok(())
}

fn load_scoring_config(cli: &Cli) -> Result<ScoringConfig> {
    let mut config = match &cli.config {
        Some(path) => config::load_config_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => config::load_config().context("failed to load configuration")?,
    };

    if cli.min_rating.is_some() {
        config.filter.min_rating = cli.min_rating;
    }
    if cli.min_ti.is_some() {
        config.filter.min_ti = cli.min_ti;
    }
    if cli.position.is_some() {
        config.filter.position_override = cli.position.clone();
    }
    config::validate(&config).context("invalid command-line filter")?;
    Ok(config)
}

fn init_tracing() -> Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tlscout=info,tlscout_core=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Table output
// ---------------------------------------------------------------------------

fn cell(v: Option<f64>, precision: usize) -> String {
    v.map_or_else(|| "-".to_string(), |x| format!("{x:.precision$}"))
}

fn ratings_cell(s: &ScoredCandidate) -> String {
    if s.metrics.ratings.is_empty() {
        return "-".into();
    }
    s.metrics
        .ratings
        .iter()
        .map(|r| format!("{:.2}", r.rating))
        .collect::<Vec<_>>()
        .join(" - ")
}

/// `*` marks elite candidates, `!` those flagged with outlier cells.
fn marker(s: &ScoredCandidate) -> &'static str {
    match (s.elite, s.is_flagged()) {
        (_, true) => "!",
        (true, false) => "*",
        _ => "",
    }
}

fn print_table(scored: &[ScoredCandidate]) {
    println!(
        "{:<1} {:>10} {:<22} {:>5} {:>7} {:>6} {:>6} {:>6} {:>7} {:>5} {:<15} {:>5} {:>11} {:>8}",
        "", "ID", "Name", "Age", "SI", "TI", "STI", "TIeff", "SI@.11", "XP", "Rating", "REC",
        "Price", "Value"
    );
    for s in scored {
        let m = &s.metrics;
        let name: String = m.name.chars().take(22).collect();
        println!(
            "{:<1} {:>10} {:<22} {:>5} {:>7} {:>6} {:>6} {:>6} {:>7} {:>5} {:<15} {:>5} {:>11} {:>8}",
            marker(s),
            m.player_id,
            name,
            m.age_display.map_or_else(|| "-".to_string(), |a| a.to_string()),
            cell(m.si_now, 0),
            cell(m.ti, 1),
            cell(m.season_ti, 2),
            cell(m.ti_eff, 2),
            cell(m.si11, 0),
            cell(m.conditioning, 1),
            ratings_cell(s),
            cell(m.rec, 2),
            cell(m.price, 0),
            cell(s.value, 1),
        );
    }
}
