//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::parse_delimiter;
use crate::models::TieBreak;
use crate::report::generator::MIN_LINES_PER_PAGE;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// SalesReport - turn a CSV of sales transactions into a summary report
///
/// Reads Region/Product/Sales rows, skips malformed ones, and writes a
/// paginated report with key metrics and a sales-by-region table.
///
/// Examples:
///   salesreport
///   salesreport --input q3.csv --output q3_report.md
///   salesreport --input q3.csv --format json --output q3.json
///   salesreport --input q3.csv --tie-break lexicographic --dry-run
///   salesreport --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// CSV file with Region, Product and Sales columns
    ///
    /// Defaults to sales_data.csv, or the value from .salesreport.toml.
    #[arg(short, long, value_name = "FILE", env = "SALESREPORT_INPUT")]
    pub input: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to Sales_Performance_Report.md.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .salesreport.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Field delimiter of the input file (single character)
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<String>,

    /// Rule for picking the top product/region when values tie
    #[arg(long, value_name = "RULE")]
    pub tie_break: Option<TieBreak>,

    /// Page height of the Markdown report, in lines
    #[arg(long, value_name = "LINES")]
    pub lines_per_page: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: load and summarize the data without writing a report
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .salesreport.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Paginated Markdown document (default)
    #[default]
    Markdown,
    /// JSON summary
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref delimiter) = self.delimiter {
            if parse_delimiter(delimiter).is_none() {
                return Err(format!(
                    "Delimiter must be a single ASCII character, got {:?}",
                    delimiter
                ));
            }
        }

        if let Some(lines) = self.lines_per_page {
            if lines < MIN_LINES_PER_PAGE {
                return Err(format!(
                    "Lines per page must be at least {}",
                    MIN_LINES_PER_PAGE
                ));
            }
        }

        if let (Some(input), Some(output)) = (&self.input, &self.output) {
            if input == output {
                return Err("Output path must differ from the input path".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting; `--quiet` wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
