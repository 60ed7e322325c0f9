//! ReviewPulse - guest review dashboard for rental properties
//!
//! Fetches reviews from the provider (falling back to built-in sample data),
//! normalizes them and writes a dashboard report.
//!
//! Exit codes:
//!   0 - Success (no alerts above threshold, or no --fail-on set)
//!   1 - Runtime error, or sample data served while --require-live is set
//!   2 - Alerts raised at or above the --fail-on threshold

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use reviewpulse::analysis::{self, AlertThresholds, DashboardOptions, FilterCriteria, ReviewCollection};
use reviewpulse::cli::{Args, OutputFormat};
use reviewpulse::config::{Config, CONFIG_FILE_NAME};
use reviewpulse::models::{AlertSeverity, Dashboard};
use reviewpulse::report::{self, DashboardReport, ReportMetadata};
use reviewpulse::source::{self, ClientConfig, HostawayClient};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("ReviewPulse v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_dashboard(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default config file.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set your provider account, thresholds and report options.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the fetch, filter and report workflow. Returns the exit code.
async fn run_dashboard(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Step 1: Fetch reviews
    let client = HostawayClient::new(
        ClientConfig::from(&config.provider),
        source::fallback_reviews(),
    )?;

    println!("📥 Fetching reviews from {}", client.config().reviews_url());
    let spinner = fetch_spinner(args.quiet);
    let outcome = client.fetch_with_origin().await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let data_source = outcome.origin.describe();
    println!("   Source: {}", data_source);

    if args.require_live && !outcome.origin.is_live() {
        eprintln!("\n⛔ Live reviews required but {} was served.", data_source);
        return Ok(1);
    }

    // Step 2: Normalize and apply moderation changes
    let mut collection = ReviewCollection::new(source::normalize_all(&outcome.records));
    info!("Normalized {} reviews", collection.len());

    if !args.show.is_empty() && !collection.set_visibility(&args.show, true) {
        warn!("Some of {:?} are unknown review ids; no visibility changed", args.show);
    }
    if !args.hide.is_empty() && !collection.set_visibility(&args.hide, false) {
        warn!("Some of {:?} are unknown review ids; no visibility changed", args.hide);
    }

    // Step 3: Filter and aggregate
    let criteria = FilterCriteria {
        search: args.search.clone(),
        min_rating: args.min_rating,
        channel: args.channel.clone(),
        property: args.property.clone(),
        status: args.status,
        date_from: args.from,
        date_to: args.date_to(),
        sort: args.sort,
    };
    let filtered = collection.apply(&criteria);

    let now = args.as_of.unwrap_or_else(Utc::now);
    let range = config.dashboard.range;
    println!(
        "\n🔬 Building {} dashboard from {} of {} reviews...",
        range.label(),
        filtered.len(),
        collection.len()
    );

    let options = DashboardOptions {
        trend_fill: config.dashboard.trend_fill,
        thresholds: AlertThresholds::from(&config.dashboard),
    };
    let dashboard = analysis::build_dashboard(&filtered, range, now, &options);

    // Step 4: Build and save the report
    println!("\n📝 Generating report...");

    let duration = start_time.elapsed().as_secs_f64();
    let listed = if config.report.include_reviews {
        filtered
            .iter()
            .take(config.report.max_reviews)
            .cloned()
            .collect()
    } else {
        Vec::new()
    };

    let report = DashboardReport {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            as_of: now,
            data_source,
            live: outcome.origin.is_live(),
            range,
            total_reviews: collection.len(),
            filtered_reviews: filtered.len(),
            duration_seconds: duration,
        },
        criteria,
        dashboard,
        reviews: listed,
    };

    let output_path = output_path(&args, &config);
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    print_summary(&report.dashboard, duration);
    println!(
        "\n✅ Dashboard complete! Report saved to: {}",
        output_path.display()
    );

    // Check --fail-on threshold
    if let Some(fail_level) = args.fail_on {
        let threshold = AlertSeverity::from(fail_level);
        let has_alerts_above = report
            .dashboard
            .alerts
            .iter()
            .any(|alert| alert.severity >= threshold);

        if has_alerts_above {
            eprintln!(
                "\n⛔ Alerts raised at or above {} severity. Failing (exit code 2).",
                threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

fn fetch_spinner(quiet: bool) -> Option<ProgressBar> {
    if quiet {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message("waiting for provider");
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

fn print_summary(dashboard: &Dashboard, duration: f64) {
    let stats = &dashboard.stats;
    let fmt = |value: Option<f64>, suffix: &str| {
        value
            .map(|v| format!("{:.1}{}", v, suffix))
            .unwrap_or_else(|| "n/a".to_string())
    };

    println!("\n📊 Dashboard Summary ({}):", dashboard.range.label());
    println!(
        "   Reviews: {} | ✅ Approved: {} | ⏳ Pending: {} | 🚫 Rejected: {}",
        stats.total, stats.approved, stats.pending, stats.rejected
    );
    println!(
        "   Average rating: {} | Approval rate: {}",
        fmt(stats.average_rating, ""),
        fmt(stats.approval_rate, "%")
    );
    println!("   Properties: {}", dashboard.properties.len());

    let count = |severity: AlertSeverity| {
        dashboard
            .alerts
            .iter()
            .filter(|a| a.severity == severity)
            .count()
    };
    println!(
        "   Alerts: {} {} | {} {} | {} {}",
        AlertSeverity::Critical.emoji(),
        count(AlertSeverity::Critical),
        AlertSeverity::Warning.emoji(),
        count(AlertSeverity::Warning),
        AlertSeverity::Info.emoji(),
        count(AlertSeverity::Info)
    );
    if let Some(ref forecast) = dashboard.forecast {
        println!(
            "   Forecast: {:.2} {}",
            forecast.projected_rating,
            forecast.direction.arrow()
        );
    }
    println!("   Duration: {:.1}s", duration);
}

/// Report path; JSON output swaps the configured extension when none was given.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    if let Some(ref output) = args.output {
        return output.clone();
    }
    let path = PathBuf::from(&config.report.output);
    match args.format {
        OutputFormat::Json => path.with_extension("json"),
        OutputFormat::Markdown => path,
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
