//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.salesreport.toml` files.

use crate::cli::OutputFormat;
use crate::models::TieBreak;
use crate::report::generator::MIN_LINES_PER_PAGE;
use crate::report::layout::Alignment;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".salesreport.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input parsing settings.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default input CSV path.
    #[serde(default = "default_input")]
    pub input: String,

    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Default output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            format: OutputFormat::default(),
            verbose: false,
        }
    }
}

fn default_input() -> String {
    "sales_data.csv".to_string()
}

fn default_output() -> String {
    "Sales_Performance_Report.md".to_string()
}

/// CSV input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Field delimiter (a single ASCII character).
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Header of the region column.
    #[serde(default = "default_region_column")]
    pub region_column: String,

    /// Header of the product column.
    #[serde(default = "default_product_column")]
    pub product_column: String,

    /// Header of the sales amount column.
    #[serde(default = "default_sales_column")]
    pub sales_column: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            region_column: default_region_column(),
            product_column: default_product_column(),
            sales_column: default_sales_column(),
        }
    }
}

impl LoaderConfig {
    /// The delimiter as a byte. Falls back to `,` for invalid values.
    pub fn delimiter_byte(&self) -> u8 {
        parse_delimiter(&self.delimiter).unwrap_or(b',')
    }
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_region_column() -> String {
    "Region".to_string()
}

fn default_product_column() -> String {
    "Product".to_string()
}

fn default_sales_column() -> String {
    "Sales".to_string()
}

/// Aggregation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// How ties for top product / top region are resolved.
    #[serde(default)]
    pub tie_break: TieBreak,
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Document title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Introductory sentence below the title.
    #[serde(default = "default_intro")]
    pub intro: String,

    /// Symbol prefixed to currency amounts.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Page height of the Markdown output, in lines.
    #[serde(default = "default_lines_per_page")]
    pub lines_per_page: usize,

    /// Cell alignment of the sales-by-region table (`center` or `left`).
    #[serde(default = "default_table_alignment")]
    pub table_alignment: Alignment,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            intro: default_intro(),
            currency_symbol: default_currency_symbol(),
            lines_per_page: default_lines_per_page(),
            table_alignment: default_table_alignment(),
        }
    }
}

fn default_title() -> String {
    "Sales Performance Report".to_string()
}

fn default_intro() -> String {
    "This report provides an overview of recent sales data.".to_string()
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_lines_per_page() -> usize {
    54
}

fn default_table_alignment() -> Alignment {
    Alignment::Center
}

/// Parse a delimiter given as a single ASCII character.
pub fn parse_delimiter(value: &str) -> Option<u8> {
    match value.as_bytes() {
        [b] if b.is_ascii() && *b != b'"' && *b != b'\n' && *b != b'\r' => Some(*b),
        _ => None,
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.general.input = input.display().to_string();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }

        if let Some(ref delimiter) = args.delimiter {
            self.loader.delimiter = delimiter.clone();
        }

        if let Some(tie_break) = args.tie_break {
            self.analysis.tie_break = tie_break;
        }

        if let Some(lines) = args.lines_per_page {
            self.report.lines_per_page = lines;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values that the CLI cannot validate on its own.
    pub fn validate(&self) -> Result<()> {
        if parse_delimiter(&self.loader.delimiter).is_none() {
            bail!(
                "Delimiter must be a single ASCII character, got {:?}",
                self.loader.delimiter
            );
        }

        let columns = [
            &self.loader.region_column,
            &self.loader.product_column,
            &self.loader.sales_column,
        ];
        if columns.iter().any(|c| c.trim().is_empty()) {
            bail!("Column names must not be empty");
        }

        if self.report.lines_per_page < MIN_LINES_PER_PAGE {
            bail!(
                "Lines per page must be at least {}, got {}",
                MIN_LINES_PER_PAGE,
                self.report.lines_per_page
            );
        }

        if self.general.input == self.general.output {
            bail!("Output path must differ from the input path");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.input, "sales_data.csv");
        assert_eq!(config.general.output, "Sales_Performance_Report.md");
        assert_eq!(config.loader.delimiter_byte(), b',');
        assert_eq!(config.analysis.tie_break, TieBreak::FirstSeen);
        assert_eq!(config.report.lines_per_page, 54);
        assert_eq!(config.report.table_alignment, Alignment::Center);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "q3.json"
format = "json"

[loader]
delimiter = ";"
sales_column = "Revenue"

[analysis]
tie_break = "lexicographic"

[report]
currency_symbol = "€"
table_alignment = "left"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "q3.json");
        assert_eq!(config.general.input, "sales_data.csv");
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.loader.delimiter_byte(), b';');
        assert_eq!(config.loader.sales_column, "Revenue");
        assert_eq!(config.loader.region_column, "Region");
        assert_eq!(config.analysis.tie_break, TieBreak::Lexicographic);
        assert_eq!(config.report.currency_symbol, "€");
        assert_eq!(config.report.title, "Sales Performance Report");
        assert_eq!(config.report.table_alignment, Alignment::Left);
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let mut args = make_args();
        args.input = Some(PathBuf::from("q3.csv"));
        args.tie_break = Some(TieBreak::Lexicographic);
        args.lines_per_page = Some(40);
        args.delimiter = Some("\t".to_string());

        config.merge_with_args(&args);
        assert_eq!(config.general.input, "q3.csv");
        assert_eq!(config.general.output, "Sales_Performance_Report.md");
        assert_eq!(config.analysis.tie_break, TieBreak::Lexicographic);
        assert_eq!(config.report.lines_per_page, 40);
        assert_eq!(config.loader.delimiter_byte(), b'\t');
    }

    #[test]
    fn test_config_verbose_enables_debug_logging() {
        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        let args = make_args();

        config.merge_with_args(&args);
        assert!(config.general.verbose);
        assert_eq!(
            args.log_level(config.general.verbose),
            tracing::Level::DEBUG
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.loader.delimiter = ";;".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.report.lines_per_page = 3;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.general.output = config.general.input.clone();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.loader.sales_column = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(","), Some(b','));
        assert_eq!(parse_delimiter("|"), Some(b'|'));
        assert_eq!(parse_delimiter(""), None);
        assert_eq!(parse_delimiter("\""), None);
        assert_eq!(parse_delimiter("é"), None);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[loader]"));
        assert!(toml_str.contains("[analysis]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.report.lines_per_page, 54);
    }
}
