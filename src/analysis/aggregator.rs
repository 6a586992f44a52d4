//! Sales aggregation and statistics.
//!
//! This module folds the validated records into a [`SalesSummary`]:
//! totals, per-region sums, per-product counts and the top entries.

use crate::models::{GroupedTotals, Record, SalesSummary, TieBreak, TopEntry};
use std::cmp::Ordering;

/// Compute the summary for a record sequence.
pub fn aggregate(records: &[Record], tie_break: TieBreak) -> SalesSummary {
    let total_sales: f64 = records.iter().map(|r| r.sales_amount).sum();
    let transaction_count = records.len();

    let sales_by_region = sales_by_region(records);
    let product_counts = product_counts(records);

    let top_product = top_entry(&product_counts, tie_break);
    let top_region = top_entry(&sales_by_region, tie_break);

    SalesSummary {
        total_sales,
        transaction_count,
        average_per_transaction: average(total_sales, transaction_count),
        sales_by_region,
        product_counts,
        top_product,
        top_region,
        tie_break,
    }
}

/// Mean amount per transaction, 0 for an empty input.
pub fn average(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Sum sales amounts by region.
pub fn sales_by_region(records: &[Record]) -> GroupedTotals<f64> {
    let mut totals = GroupedTotals::default();

    for record in records {
        totals.add(&record.region, record.sales_amount);
    }

    totals
}

/// Count transactions by product.
pub fn product_counts(records: &[Record]) -> GroupedTotals<usize> {
    let mut counts = GroupedTotals::default();

    for record in records {
        counts.add(&record.product, 1);
    }

    counts
}

/// Find the key with the largest value.
///
/// Ties go to the earliest key for [`TieBreak::FirstSeen`] and to the
/// smallest key for [`TieBreak::Lexicographic`].
pub fn top_entry<V>(totals: &GroupedTotals<V>, tie_break: TieBreak) -> Option<TopEntry<V>>
where
    V: Copy + PartialOrd,
{
    let mut best: Option<(&str, V)> = None;

    for (key, &value) in totals.iter() {
        best = match best {
            None => Some((key, value)),
            Some((best_key, best_value)) => {
                let replace = match value.partial_cmp(&best_value) {
                    Some(Ordering::Greater) => true,
                    Some(Ordering::Equal) => {
                        tie_break == TieBreak::Lexicographic && key < best_key
                    }
                    _ => false,
                };
                if replace {
                    Some((key, value))
                } else {
                    Some((best_key, best_value))
                }
            }
        };
    }

    best.map(|(key, value)| TopEntry {
        key: key.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<Record> {
        vec![
            Record::new("A", "X", 10.0),
            Record::new("B", "Y", 5.0),
            Record::new("A", "X", 3.0),
        ]
    }

    #[test]
    fn test_aggregate_reference_example() {
        let summary = aggregate(&sample_records(), TieBreak::FirstSeen);

        assert_eq!(summary.total_sales, 18.0);
        assert_eq!(summary.transaction_count, 3);
        assert_eq!(summary.average_per_transaction, 6.0);
        assert_eq!(summary.sales_by_region.get("A"), Some(&13.0));
        assert_eq!(summary.sales_by_region.get("B"), Some(&5.0));
        assert_eq!(summary.sales_by_region.len(), 2);
        assert_eq!(summary.product_counts.get("X"), Some(&2));
        assert_eq!(summary.product_counts.get("Y"), Some(&1));

        let top_product = summary.top_product.unwrap();
        assert_eq!(top_product.key, "X");
        assert_eq!(top_product.value, 2);
        let top_region = summary.top_region.unwrap();
        assert_eq!(top_region.key, "A");
        assert_eq!(top_region.value, 13.0);
    }

    #[test]
    fn test_aggregate_empty() {
        let summary = aggregate(&[], TieBreak::FirstSeen);

        assert_eq!(summary.total_sales, 0.0);
        assert_eq!(summary.transaction_count, 0);
        assert_eq!(summary.average_per_transaction, 0.0);
        assert!(summary.sales_by_region.is_empty());
        assert!(summary.product_counts.is_empty());
        assert!(summary.top_product.is_none());
        assert!(summary.top_region.is_none());
    }

    #[test]
    fn test_total_is_order_independent() {
        let mut records = vec![
            Record::new("North", "Lamp", 0.25),
            Record::new("South", "Desk", 150.0),
            Record::new("East", "Chair", 42.5),
            Record::new("North", "Desk", 7.75),
        ];
        let forward = aggregate(&records, TieBreak::FirstSeen);
        records.reverse();
        let backward = aggregate(&records, TieBreak::FirstSeen);

        assert!((forward.total_sales - backward.total_sales).abs() < 1e-9);
        assert_eq!(forward.transaction_count, backward.transaction_count);
    }

    #[test]
    fn test_average_times_count_matches_total() {
        let records = vec![
            Record::new("A", "X", 10.1),
            Record::new("B", "Y", 20.2),
            Record::new("C", "Z", 30.3),
        ];
        let summary = aggregate(&records, TieBreak::FirstSeen);

        let rebuilt = summary.average_per_transaction * summary.transaction_count as f64;
        assert!((rebuilt - summary.total_sales).abs() < 1e-9);
    }

    #[test]
    fn test_product_counts_sum_to_transaction_count() {
        let records = vec![
            Record::new("A", "X", 1.0),
            Record::new("A", "Y", 1.0),
            Record::new("B", "X", 1.0),
            Record::new("C", "Z", 1.0),
        ];
        let summary = aggregate(&records, TieBreak::FirstSeen);

        let total: usize = summary.product_counts.iter().map(|(_, c)| *c).sum();
        assert_eq!(total, summary.transaction_count);
    }

    #[test]
    fn test_top_entry_first_seen_tie() {
        let records = vec![
            Record::new("West", "Widget", 5.0),
            Record::new("East", "Gadget", 5.0),
            Record::new("West", "Gadget", 1.0),
            Record::new("East", "Widget", 1.0),
        ];
        let summary = aggregate(&records, TieBreak::FirstSeen);

        assert_eq!(summary.top_product.unwrap().key, "Widget");
        assert_eq!(summary.top_region.unwrap().key, "West");
    }

    #[test]
    fn test_top_entry_lexicographic_tie() {
        let records = vec![
            Record::new("West", "Widget", 5.0),
            Record::new("East", "Gadget", 5.0),
            Record::new("West", "Gadget", 1.0),
            Record::new("East", "Widget", 1.0),
        ];
        let summary = aggregate(&records, TieBreak::Lexicographic);

        assert_eq!(summary.top_product.unwrap().key, "Gadget");
        assert_eq!(summary.top_region.unwrap().key, "East");
    }

    #[test]
    fn test_top_entry_clear_winner_ignores_tie_break() {
        let mut counts = GroupedTotals::default();
        counts.add("b", 1usize);
        counts.add("z", 3);
        counts.add("a", 2);

        for rule in [TieBreak::FirstSeen, TieBreak::Lexicographic] {
            let top = top_entry(&counts, rule).unwrap();
            assert_eq!(top.key, "z");
            assert_eq!(top.value, 3);
        }
    }

    #[test]
    fn test_negative_totals() {
        let records = vec![
            Record::new("Returns", "X", -50.0),
            Record::new("Outlet", "X", -10.0),
        ];
        let summary = aggregate(&records, TieBreak::FirstSeen);

        assert_eq!(summary.total_sales, -60.0);
        assert_eq!(summary.top_region.unwrap().key, "Outlet");
    }

    #[test]
    fn test_regions_sorted_alphabetically() {
        let records = vec![
            Record::new("West", "X", 1.0),
            Record::new("Central", "X", 2.0),
            Record::new("North", "X", 3.0),
            Record::new("East", "X", 4.0),
        ];
        let summary = aggregate(&records, TieBreak::FirstSeen);

        let regions: Vec<_> = summary
            .regions_sorted()
            .into_iter()
            .map(|(region, _)| region)
            .collect();
        assert_eq!(regions, vec!["Central", "East", "North", "West"]);
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let records = sample_records();
        assert_eq!(
            aggregate(&records, TieBreak::FirstSeen),
            aggregate(&records, TieBreak::FirstSeen)
        );
    }
}
