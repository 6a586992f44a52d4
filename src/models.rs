//! Data models for the sales report.
//!
//! This module contains the core data structures shared by the loader,
//! the aggregator and the report generator.

use chrono::{DateTime, Local};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::ops::AddAssign;

/// A single validated transaction row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Sales region (grouping key, never empty).
    pub region: String,
    /// Product name (grouping key, never empty).
    pub product: String,
    /// Transaction amount. Sign is not validated.
    pub sales_amount: f64,
    /// 1-based line in the source file this record was read from.
    pub line: usize,
}

impl Record {
    /// Creates a record that did not come from a file (line 0).
    #[cfg(test)]
    pub fn new(region: &str, product: &str, sales_amount: f64) -> Self {
        Self {
            region: region.to_string(),
            product: product.to_string(),
            sales_amount,
            line: 0,
        }
    }
}

/// Rule used to pick a winner when several keys share the maximum value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// The key that appeared earliest in the input wins.
    #[default]
    FirstSeen,
    /// The alphabetically smallest key wins.
    Lexicographic,
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreak::FirstSeen => write!(f, "first-seen"),
            TieBreak::Lexicographic => write!(f, "lexicographic"),
        }
    }
}

/// Per-key accumulator that remembers first-seen key order.
///
/// Serializes as a map in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedTotals<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for GroupedTotals<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V: Copy + AddAssign> GroupedTotals<V> {
    /// Adds `amount` to the accumulator for `key`, creating it on first use.
    pub fn add(&mut self, key: &str, amount: V) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += amount,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), amount));
            }
        }
    }
}

impl<V> GroupedTotals<V> {
    /// Returns the accumulated value for `key`.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the entries sorted alphabetically by key.
    pub fn sorted(&self) -> Vec<(&str, &V)> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        sorted
    }
}

impl<V: Serialize> Serialize for GroupedTotals<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// The winning key of a maximum lookup together with its value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopEntry<V> {
    pub key: String,
    pub value: V,
}

/// Aggregate sales metrics computed from the full record sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummary {
    /// Sum of all sales amounts.
    pub total_sales: f64,
    /// Number of valid records.
    pub transaction_count: usize,
    /// `total_sales / transaction_count`, or 0 for an empty input.
    pub average_per_transaction: f64,
    /// Summed sales per region.
    pub sales_by_region: GroupedTotals<f64>,
    /// Number of transactions per product.
    pub product_counts: GroupedTotals<usize>,
    /// Product with the most transactions.
    pub top_product: Option<TopEntry<usize>>,
    /// Region with the highest summed sales.
    pub top_region: Option<TopEntry<f64>>,
    /// Rule used to resolve ties for the two `top_*` fields.
    pub tie_break: TieBreak,
}

impl SalesSummary {
    /// Region totals sorted alphabetically by region name.
    pub fn regions_sorted(&self) -> Vec<(&str, f64)> {
        self.sales_by_region
            .sorted()
            .into_iter()
            .map(|(region, total)| (region, *total))
            .collect()
    }
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Path of the input file.
    pub input_path: String,
    /// Local time the report was generated.
    pub generated_at: DateTime<Local>,
    /// Data rows read from the input (header excluded).
    pub rows_read: usize,
    /// Rows dropped during validation.
    pub rows_skipped: usize,
}

/// The complete sales report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: SalesSummary,
}
