//! Ordering of records into a time series.
//!
//! This is the only cross-document step. It runs after every record exists.
//! Undated records are kept, not dropped: they sort after all dated records,
//! in their original input order.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use labrec_model::ExtractionRecord;

/// Sort records for trend display.
///
/// Dated records come first in ascending date order; undated records follow.
/// The sort is stable, so ties keep their input order.
pub fn sort_for_trend(mut records: Vec<ExtractionRecord>) -> Vec<ExtractionRecord> {
    records.sort_by_key(|record| {
        let date = record.observed_date();
        (date.is_none(), date)
    });
    records
}

/// Records ordered for trend display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendSeries {
    records: Vec<ExtractionRecord>,
}

impl TrendSeries {
    /// Builds a series, sorting the records with [`sort_for_trend`].
    pub fn new(records: Vec<ExtractionRecord>) -> Self {
        Self {
            records: sort_for_trend(records),
        }
    }

    /// Records in trend order.
    pub fn records(&self) -> &[ExtractionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Names of all fields with at least one numeric reading, sorted.
    pub fn numeric_fields(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .flat_map(|record| record.fields().iter())
            .filter(|(_, value)| value.is_numeric())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Numeric readings of one field in trend order.
    pub fn values(&self, field: &str) -> Vec<(Option<NaiveDate>, f64)> {
        self.records
            .iter()
            .filter_map(|record| {
                record
                    .numeric(field)
                    .map(|value| (record.observed_date(), value))
            })
            .collect()
    }

    /// Change between the two most recent dated records.
    ///
    /// Only fields with a numeric reading in both records are included.
    /// Empty when fewer than two records carry a date.
    pub fn latest_change(&self) -> BTreeMap<String, f64> {
        let mut dated = self
            .records
            .iter()
            .rev()
            .filter(|record| record.observed_date().is_some());
        let (Some(last), Some(previous)) = (dated.next(), dated.next()) else {
            return BTreeMap::new();
        };
        last.fields()
            .iter()
            .filter_map(|(name, value)| {
                let current = value.as_f64()?;
                let before = previous.numeric(name)?;
                Some((name.clone(), current - before))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labrec_model::FieldValue;

    fn record(id: &str, date: Option<(i32, u32, u32)>, values: &[(&str, f64)]) -> ExtractionRecord {
        let fields = values
            .iter()
            .map(|(name, value)| ((*name).to_string(), FieldValue::Numeric(*value)))
            .collect();
        let date = date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        ExtractionRecord::new(id, date, fields)
    }

    #[test]
    fn test_dated_then_undated() {
        let records = vec![
            record("undated", None, &[]),
            record("september", Some((2025, 9, 1)), &[]),
            record("august", Some((2025, 8, 1)), &[]),
        ];
        let sorted = sort_for_trend(records);
        let ids: Vec<&str> = sorted.iter().map(ExtractionRecord::source_id).collect();
        assert_eq!(ids, vec!["august", "september", "undated"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let records = vec![
            record("b-undated", None, &[]),
            record("same-1", Some((2025, 1, 1)), &[]),
            record("a-undated", None, &[]),
            record("same-2", Some((2025, 1, 1)), &[]),
        ];
        let sorted = sort_for_trend(records);
        let ids: Vec<&str> = sorted.iter().map(ExtractionRecord::source_id).collect();
        assert_eq!(ids, vec!["same-1", "same-2", "b-undated", "a-undated"]);
    }

    #[test]
    fn test_latest_change_uses_shared_numeric_fields() {
        let series = TrendSeries::new(vec![
            record("oct", Some((2025, 10, 1)), &[("HbA1c", 6.8), ("Glucose", 140.0)]),
            record("sep", Some((2025, 9, 1)), &[("HbA1c", 6.1), ("Hb", 13.8)]),
            record("none", None, &[("HbA1c", 9.9)]),
        ]);
        let change = series.latest_change();
        assert_eq!(change.len(), 1);
        let delta = change["HbA1c"];
        assert!((delta - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_latest_change_needs_two_dated_records() {
        let series = TrendSeries::new(vec![
            record("sep", Some((2025, 9, 1)), &[("HbA1c", 6.1)]),
            record("none", None, &[("HbA1c", 6.9)]),
        ]);
        assert!(series.latest_change().is_empty());
    }

    #[test]
    fn test_values_and_fields() {
        let series = TrendSeries::new(vec![
            record("oct", Some((2025, 10, 1)), &[("Hb", 12.9)]),
            record("sep", Some((2025, 9, 1)), &[("Hb", 13.8), ("ESR", 12.0)]),
        ]);
        assert_eq!(
            series.values("Hb"),
            vec![
                (NaiveDate::from_ymd_opt(2025, 9, 1), 13.8),
                (NaiveDate::from_ymd_opt(2025, 10, 1), 12.9)
            ]
        );
        let fields: Vec<&str> = series.numeric_fields().into_iter().collect();
        assert_eq!(fields, vec!["ESR", "Hb"]);
        assert_eq!(series.len(), 2);
    }
}
