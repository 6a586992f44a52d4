//! Record loader for delimited sales data.
//!
//! This module reads a CSV source with a header row, matches the required
//! columns by name, and turns every well-formed data row into a [`Record`].
//! Rows that fail validation are skipped with a diagnostic; the run only
//! aborts when the source itself is unusable or nothing valid remains.

use crate::error::{ReportError, Result, RowError};
use crate::models::Record;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Configuration for record loading.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Header name of the region column.
    pub region_column: String,
    /// Header name of the product column.
    pub product_column: String,
    /// Header name of the sales amount column.
    pub sales_column: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            region_column: "Region".to_string(),
            product_column: "Product".to_string(),
            sales_column: "Sales".to_string(),
        }
    }
}

impl From<&crate::config::LoaderConfig> for LoadConfig {
    fn from(config: &crate::config::LoaderConfig) -> Self {
        Self {
            delimiter: config.delimiter_byte(),
            region_column: config.region_column.clone(),
            product_column: config.product_column.clone(),
            sales_column: config.sales_column.clone(),
        }
    }
}

/// Output of a successful load.
#[derive(Debug, Clone)]
pub struct LoadedRecords {
    /// Valid records in input order.
    pub records: Vec<Record>,
    /// One entry per skipped row.
    pub row_errors: Vec<RowError>,
    /// Number of data rows read (header excluded).
    pub rows_read: usize,
}

/// Positions of the required columns within a row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    region: usize,
    product: usize,
    sales: usize,
}

/// Loader turning tabular input into validated records.
pub struct RecordLoader {
    config: LoadConfig,
}

impl RecordLoader {
    /// Create a new record loader.
    pub fn new(config: LoadConfig) -> Self {
        Self { config }
    }

    /// Load all records from the file at `path`.
    pub fn load(&self, path: &Path) -> Result<LoadedRecords> {
        let reader = self
            .reader_builder()
            .from_path(path)
            .map_err(|source| ReportError::SourceUnavailable {
                path: path.to_path_buf(),
                source,
            })?;

        self.read_records(reader, path)
    }

    /// Load all records from an already opened source.
    ///
    /// `source_name` is only used in error messages.
    pub fn load_from_reader<R: Read>(&self, rdr: R, source_name: &Path) -> Result<LoadedRecords> {
        let reader = self.reader_builder().from_reader(rdr);
        self.read_records(reader, source_name)
    }

    fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(self.config.delimiter);
        builder
    }

    fn read_records<R: Read>(&self, mut reader: csv::Reader<R>, path: &Path) -> Result<LoadedRecords> {
        let headers = reader
            .headers()
            .map_err(|source| ReportError::SourceUnavailable {
                path: path.to_path_buf(),
                source,
            })?
            .clone();

        // A completely empty file has no header and no data.
        if headers.iter().all(|h| h.is_empty()) {
            return Err(ReportError::NoValidData {
                path: path.to_path_buf(),
            });
        }

        let columns = self.resolve_columns(&headers, path)?;
        debug!(
            "Columns resolved: region={}, product={}, sales={}",
            columns.region, columns.product, columns.sales
        );

        let mut records = Vec::new();
        let mut row_errors = Vec::new();
        let mut rows_read = 0usize;

        for (idx, result) in reader.records().enumerate() {
            rows_read += 1;
            // records() starts right after the header, lines are 1-based
            let fallback_line = idx + 2;

            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    let line = e
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(fallback_line);
                    skip_row(&mut row_errors, line, format!("unreadable row: {}", e));
                    continue;
                }
            };

            let line = row
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(fallback_line);

            match self.parse_row(&row, columns, line) {
                Ok(record) => records.push(record),
                Err(message) => skip_row(&mut row_errors, line, message),
            }
        }

        debug!(
            "Read {} rows: {} valid, {} skipped",
            rows_read,
            records.len(),
            row_errors.len()
        );

        if records.is_empty() {
            return Err(ReportError::NoValidData {
                path: path.to_path_buf(),
            });
        }

        Ok(LoadedRecords {
            records,
            row_errors,
            rows_read,
        })
    }

    /// Map the required column names to their positions in the header.
    fn resolve_columns(&self, headers: &StringRecord, path: &Path) -> Result<ColumnIndex> {
        // Later duplicates win, matching how keyed row readers behave.
        let header_map: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (normalize_header_name(name), idx))
            .collect();

        let required = [
            &self.config.region_column,
            &self.config.product_column,
            &self.config.sales_column,
        ];

        let missing: Vec<String> = required
            .iter()
            .filter(|name| !header_map.contains_key(name.as_str()))
            .map(|name| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(ReportError::MissingColumns {
                path: path.to_path_buf(),
                missing,
            });
        }

        Ok(ColumnIndex {
            region: header_map[&self.config.region_column],
            product: header_map[&self.config.product_column],
            sales: header_map[&self.config.sales_column],
        })
    }

    /// Validate one data row and build a record from it.
    fn parse_row(
        &self,
        row: &StringRecord,
        columns: ColumnIndex,
        line: usize,
    ) -> std::result::Result<Record, String> {
        let region = required_field(row, columns.region, &self.config.region_column)?;
        let product = required_field(row, columns.product, &self.config.product_column)?;
        let sales = required_field(row, columns.sales, &self.config.sales_column)?;

        let sales_amount = parse_amount(sales)
            .ok_or_else(|| format!("invalid '{}' value {:?}", self.config.sales_column, sales))?;

        if region.is_empty() {
            return Err(format!("empty '{}' value", self.config.region_column));
        }
        if product.is_empty() {
            return Err(format!("empty '{}' value", self.config.product_column));
        }

        Ok(Record {
            region: region.to_string(),
            product: product.to_string(),
            sales_amount,
            line,
        })
    }
}

fn required_field<'r>(
    row: &'r StringRecord,
    idx: usize,
    name: &str,
) -> std::result::Result<&'r str, String> {
    row.get(idx)
        .ok_or_else(|| format!("missing '{}' field", name))
}

/// Record a skipped row and emit its diagnostic.
fn skip_row(row_errors: &mut Vec<RowError>, line: usize, message: String) {
    warn!("Skipping row at line {}: {}", line, message);
    row_errors.push(RowError { line, message });
}

/// Parse a sales amount, rejecting values that are not finite real numbers.
fn parse_amount(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    name.trim_start_matches('\u{feff}').trim().to_string()
}
