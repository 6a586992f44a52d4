//! Document layout for the sales report.
//!
//! Turns a [`SalesSummary`] into the ordered list of layout blocks the
//! renderer consumes, and owns the display formatting for amounts.

use crate::models::SalesSummary;
use serde::{Deserialize, Serialize};

/// Horizontal alignment of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
}

/// A run of inline text with optional emphasis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub underline: bool,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            underline: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            underline: false,
        }
    }

    /// Bold and underlined, used for section headings.
    pub fn emphasized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            underline: true,
        }
    }
}

/// Styling for a table block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStyle {
    /// Render header cells in bold.
    pub header_bold: bool,
    /// Cell alignment for every column.
    pub alignment: Alignment,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            header_bold: true,
            alignment: Alignment::Center,
        }
    }
}

/// A table with one header row and any number of body rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub style: TableStyle,
}

/// One unit of document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Document title.
    Title { text: String, align: Alignment },
    /// Section heading (level 2 and below).
    Heading { level: u8, spans: Vec<Span> },
    /// Body paragraph.
    Paragraph { spans: Vec<Span> },
    /// Vertical space, measured in lines.
    Spacer { lines: usize },
    Table(Table),
}

impl Block {
    fn paragraph(spans: Vec<Span>) -> Self {
        Block::Paragraph { spans }
    }

    fn spacer(lines: usize) -> Self {
        Block::Spacer { lines }
    }

    /// Plain text content of the block, without markup.
    #[cfg(test)]
    pub fn text(&self) -> String {
        match self {
            Block::Title { text, .. } => text.clone(),
            Block::Heading { spans, .. } | Block::Paragraph { spans } => {
                spans.iter().map(|s| s.text.as_str()).collect()
            }
            Block::Spacer { .. } => String::new(),
            Block::Table(table) => {
                let mut lines = vec![table.header.join(" | ")];
                lines.extend(table.rows.iter().map(|row| row.join(" | ")));
                lines.join("\n")
            }
        }
    }
}

/// Text and formatting options for the document.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    pub title: String,
    pub intro: String,
    pub currency_symbol: String,
    pub table_alignment: Alignment,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            title: "Sales Performance Report".to_string(),
            intro: "This report provides an overview of recent sales data.".to_string(),
            currency_symbol: "$".to_string(),
            table_alignment: Alignment::Center,
        }
    }
}

impl From<&crate::config::ReportConfig> for LayoutOptions {
    fn from(config: &crate::config::ReportConfig) -> Self {
        Self {
            title: config.title.clone(),
            intro: config.intro.clone(),
            currency_symbol: config.currency_symbol.clone(),
            table_alignment: config.table_alignment,
        }
    }
}

/// Build the document blocks for a summary.
pub fn build_document(summary: &SalesSummary, options: &LayoutOptions) -> Vec<Block> {
    let money = |amount: f64| format_currency(amount, &options.currency_symbol);

    let mut blocks = vec![
        Block::Title {
            text: options.title.clone(),
            align: Alignment::Center,
        },
        Block::spacer(2),
        Block::paragraph(vec![Span::plain(options.intro.clone())]),
        Block::spacer(1),
    ];

    // Key metrics
    blocks.push(Block::Heading {
        level: 2,
        spans: vec![Span::emphasized("Summary of Key Metrics:")],
    });
    blocks.push(Block::spacer(1));

    let (top_product, top_product_count) = summary
        .top_product
        .as_ref()
        .map(|t| (t.key.as_str(), t.value))
        .unwrap_or(("N/A", 0));
    let (top_region, top_region_total) = summary
        .top_region
        .as_ref()
        .map(|t| (t.key.as_str(), t.value))
        .unwrap_or(("N/A", 0.0));

    let metrics = [
        ("Total Sales:", money(summary.total_sales)),
        (
            "Number of Transactions:",
            format_count(summary.transaction_count),
        ),
        (
            "Average Sales per Transaction:",
            money(summary.average_per_transaction),
        ),
        (
            "Most Popular Product:",
            format!(
                "{} (sold {} times)",
                top_product,
                format_count(top_product_count)
            ),
        ),
        (
            "Region with Highest Sales:",
            format!("{} (Total Sales: {})", top_region, money(top_region_total)),
        ),
    ];

    for (label, value) in metrics {
        blocks.push(Block::paragraph(vec![
            Span::bold(label),
            Span::plain(format!(" {}", value)),
        ]));
    }
    blocks.push(Block::spacer(2));

    // Region table
    blocks.push(Block::Heading {
        level: 2,
        spans: vec![Span::emphasized("Sales by Region:")],
    });
    blocks.push(Block::spacer(1));
    blocks.push(Block::Table(region_table(summary, options)));
    blocks.push(Block::spacer(2));

    blocks
}

/// Region totals as a table, one row per region in alphabetical order.
pub fn region_table(summary: &SalesSummary, options: &LayoutOptions) -> Table {
    let currency_symbol = options.currency_symbol.as_str();
    Table {
        header: vec!["Region".to_string(), "Total Sales".to_string()],
        rows: summary
            .regions_sorted()
            .into_iter()
            .map(|(region, total)| {
                vec![region.to_string(), format_currency(total, currency_symbol)]
            })
            .collect(),
        style: TableStyle {
            alignment: options.table_alignment,
            ..TableStyle::default()
        },
    }
}

/// Format an amount with two decimals and thousands separators.
///
/// The sign follows the symbol: `$-1,234.50`. Sums that overflowed to
/// infinity print as `$inf` / `$-inf`.
pub fn format_currency(amount: f64, symbol: &str) -> String {
    if !amount.is_finite() {
        return format!("{}{}", symbol, amount);
    }

    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    // "-0.00" is not worth a sign
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };

    format!(
        "{}{}{}.{}",
        symbol,
        sign,
        group_thousands(int_part),
        frac_part
    )
}

/// Format a count as a plain integer.
pub fn format_count(count: usize) -> String {
    count.to_string()
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}
