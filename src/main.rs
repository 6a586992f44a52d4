//! SalesReport - CSV sales data to summary report
//!
//! A CLI tool that loads transaction records from a CSV file, computes
//! aggregate sales metrics, and writes a paginated report.
//!
//! Exit codes:
//!   0 - Success (report written, or dry run completed)
//!   1 - Runtime error (unreadable input, no valid data, render failure, bad config)

mod analysis;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Local;
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use error::ReportError;
use loader::{LoadConfig, RecordLoader};
use models::{Report, ReportMetadata, SalesSummary};
use report::layout::format_currency;
use report::LayoutOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Input path that selects standard input.
const STDIN_INPUT: &str = "-";

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Resolve configuration first so `[general] verbose` reaches the logger
    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&args, &config);

    info!("SalesReport v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    if let Err(e) = run_report(&args, &config) {
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Handle --init-config: generate a default .salesreport.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize columns, tie-break rule, and report text.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);

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

/// Load the config file, apply CLI overrides and validate the result.
fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    config.validate()?;
    Ok(config)
}

/// Run the complete report workflow.
fn run_report(args: &Args, config: &Config) -> Result<()> {
    if args.dry_run {
        let summary = summarize(config)?;
        print_summary(&summary, &config.report.currency_symbol);
        println!("\n✅ Dry run complete. No report was written.");
        return Ok(());
    }

    let output = generate_report(config)?;
    println!("\n✅ Report '{}' generated successfully!", output.display());
    Ok(())
}

/// Load and aggregate the configured input.
fn summarize(config: &Config) -> Result<SalesSummary, ReportError> {
    Ok(load_and_aggregate(config)?.1)
}

fn load_and_aggregate(config: &Config) -> Result<(ReportMetadata, SalesSummary), ReportError> {
    let input = PathBuf::from(&config.general.input);

    // Step 1: Load records
    let loader = RecordLoader::new(LoadConfig::from(&config.loader));
    let loaded = if input.as_os_str() == STDIN_INPUT {
        println!("📥 Loading sales data from standard input");
        loader.load_from_reader(std::io::stdin().lock(), Path::new("<stdin>"))?
    } else {
        println!("📥 Loading sales data: {}", input.display());
        loader.load(&input)?
    };

    if !loaded.row_errors.is_empty() {
        warn!(
            "Skipped {} of {} row(s) with invalid data",
            loaded.row_errors.len(),
            loaded.rows_read
        );
    }
    info!("Loaded {} valid record(s)", loaded.records.len());
    for record in loaded.records.iter().filter(|r| r.sales_amount < 0.0) {
        debug!(
            "Line {}: negative sales amount {} kept",
            record.line, record.sales_amount
        );
    }

    // Step 2: Aggregate
    let summary = analysis::aggregate(&loaded.records, config.analysis.tie_break);
    debug!(
        "Summary: total={}, count={}, regions={}, products={}",
        summary.total_sales,
        summary.transaction_count,
        summary.sales_by_region.len(),
        summary.product_counts.len()
    );

    let metadata = ReportMetadata {
        input_path: input.display().to_string(),
        generated_at: Local::now(),
        rows_read: loaded.rows_read,
        rows_skipped: loaded.row_errors.len(),
    };

    Ok((metadata, summary))
}

/// Load, aggregate, render and write the report. Returns the output path.
///
/// Nothing is written unless every earlier stage succeeded.
fn generate_report(config: &Config) -> Result<PathBuf, ReportError> {
    let (metadata, summary) = load_and_aggregate(config)?;
    let output = PathBuf::from(&config.general.output);

    // Step 3: Render
    println!("📝 Generating report...");
    let sales_report = Report { metadata, summary };
    let content = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&sales_report)?,
        OutputFormat::Markdown => report::generate_markdown_report(
            &sales_report,
            &LayoutOptions::from(&config.report),
            config.report.lines_per_page,
        )?,
    };

    // Step 4: Write
    report::write_document(&output, &content)?;
    info!("Wrote {} bytes to {}", content.len(), output.display());

    Ok(output)
}

/// Print the summary for --dry-run.
fn print_summary(summary: &SalesSummary, currency_symbol: &str) {
    let money = |amount: f64| format_currency(amount, currency_symbol);

    println!("\n📊 Sales Summary:");
    println!("   Total sales: {}", money(summary.total_sales));
    println!("   Transactions: {}", summary.transaction_count);
    println!(
        "   Average per transaction: {}",
        money(summary.average_per_transaction)
    );
    if let Some(ref top) = summary.top_product {
        println!("   Most popular product: {} ({} sales)", top.key, top.value);
    }
    if let Some(ref top) = summary.top_region {
        println!("   Top region: {} ({})", top.key, money(top.value));
    }
    println!("   Ties resolved by: {}", summary.tie_break);

    if summary.sales_by_region.is_empty() {
        return;
    }
    println!("\n   Sales by region:");
    for (region, total) in summary.regions_sorted() {
        println!("     {:<20} {:>16}", region, money(total));
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before the logger exists, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load config, using defaults: {:#}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir, input: &str, output: &str) -> Config {
        let mut config = Config::default();
        config.general.input = dir.path().join(input).display().to_string();
        config.general.output = dir.path().join(output).display().to_string();
        config
    }

    #[test]
    fn test_generate_report_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("sales.csv"),
            "Region,Product,Sales\nA,X,10\nB,Y,not-a-number\nB,Y,5\nA,X,3\n",
        )
        .unwrap();
        let config = config_for(&dir, "sales.csv", "report.md");

        let output = generate_report(&config).unwrap();
        let content = std::fs::read_to_string(&output).unwrap();

        assert!(content.contains("**Total Sales:** $18.00"));
        assert!(content.contains("**Number of Transactions:** 3"));
        assert!(content.contains("**Average Sales per Transaction:** $6.00"));
        assert!(content.contains("X (sold 2 times)"));
        assert!(content.contains("A (Total Sales: $13.00)"));
        assert!(content.contains("| A | $13.00 |"));
        assert!(content.contains("Report Generated on "));
    }

    #[test]
    fn test_generate_json_report_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("sales.csv"),
            "Region,Product,Sales\nA,X,10\nB,Y,oops\n",
        )
        .unwrap();
        let mut config = config_for(&dir, "sales.csv", "report.json");
        config.general.format = OutputFormat::Json;

        let output = generate_report(&config).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();

        assert_eq!(json["summary"]["total_sales"], 10.0);
        assert_eq!(json["summary"]["transaction_count"], 1);
        assert_eq!(json["metadata"]["rows_read"], 2);
        assert_eq!(json["metadata"]["rows_skipped"], 1);
        assert_eq!(json["summary"]["top_region"]["key"], "A");
    }

    #[test]
    fn test_missing_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir, "nope.csv", "report.md");

        let err = generate_report(&config).unwrap_err();
        assert!(matches!(err, ReportError::SourceUnavailable { .. }));
        assert!(!dir.path().join("report.md").exists());
    }

    #[test]
    fn test_header_only_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sales.csv"), "Region,Product,Sales\n").unwrap();
        let config = config_for(&dir, "sales.csv", "report.md");

        let err = generate_report(&config).unwrap_err();
        assert!(matches!(err, ReportError::NoValidData { .. }));
        assert!(!dir.path().join("report.md").exists());
    }

    #[test]
    fn test_unwritable_output_is_render_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sales.csv"), "Region,Product,Sales\nA,X,1\n").unwrap();
        let config = config_for(&dir, "sales.csv", "no_such_dir/report.md");

        let err = generate_report(&config).unwrap_err();
        assert!(matches!(err, ReportError::RenderFailure(_)));
    }

    #[test]
    fn test_config_file_verbose_sets_debug_level() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("report.toml");
        std::fs::write(&config_path, "[general]\nverbose = true\n").unwrap();

        let mut args = cli::tests::make_args();
        args.config = Some(config_path);

        let config = resolve_config(&args).unwrap();
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::ERROR);
    }

    #[test]
    fn test_resolve_config_rejects_unreadable_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = cli::tests::make_args();
        args.config = Some(dir.path().join("missing.toml"));

        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn test_summarize_uses_tie_break() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("sales.csv"),
            "Region,Product,Sales\nWest,Widget,5\nEast,Gadget,5\n",
        )
        .unwrap();
        let mut config = config_for(&dir, "sales.csv", "unused.md");
        config.analysis.tie_break = models::TieBreak::Lexicographic;

        let summary = summarize(&config).unwrap();
        assert_eq!(summary.top_region.unwrap().key, "East");
        assert_eq!(summary.top_product.unwrap().key, "Gadget");
        assert!(!dir.path().join("unused.md").exists());
    }
}
