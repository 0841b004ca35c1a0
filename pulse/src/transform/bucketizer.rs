//! Group normalized rows into aggregation buckets.
//!
//! ```text
//! Normalized rows                         →  Buckets
//! ┌──────────────────────────────────┐       ┌───────────────────────────┐
//! │ 2024-05-01 LA F  (lead, union)   │       │ 2024-05-01/LA/F  2 rows   │
//! │ 2024-05-01 NY T  (supporting)    │  →    ├───────────────────────────┤
//! │ 2024-05-01 LA F  (background)    │       │ 2024-05-01/NY/T  1 row    │
//! └──────────────────────────────────┘       └───────────────────────────┘
//! ```
//!
//! Buckets are keyed in a `BTreeMap`, so iteration is in output order and
//! membership depends only on each row's key, never on input order.

use std::collections::BTreeMap;

use crate::models::{BucketKey, NormalizedRow};

/// The rows sharing one bucket key. Never empty.
#[derive(Debug, Clone)]
pub struct Bucket<'a> {
    pub key: BucketKey,
    pub rows: Vec<&'a NormalizedRow>,
}

impl<'a> Bucket<'a> {
    fn new(key: BucketKey) -> Self {
        Self { key, rows: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Partition rows by bucket key in a single pass.
pub fn bucketize(rows: &[NormalizedRow]) -> BTreeMap<BucketKey, Bucket<'_>> {
    let mut buckets: BTreeMap<BucketKey, Bucket<'_>> = BTreeMap::new();

    for row in rows {
        buckets
            .entry(row.key.clone())
            .or_insert_with(|| Bucket::new(row.key.clone()))
            .rows
            .push(row);
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjTypeCode;
    use chrono::NaiveDate;

    fn row(day: u32, region: &str, code: ProjTypeCode, rate: f64) -> NormalizedRow {
        NormalizedRow {
            key: BucketKey {
                date_utc: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
                region_code: region.into(),
                proj_type_code: code,
            },
            lead_tier: false,
            union_member: false,
            rate: Some(rate),
            description: None,
        }
    }

    fn fixture() -> Vec<NormalizedRow> {
        vec![
            row(1, "LA", ProjTypeCode::Film, 100.0),
            row(1, "NY", ProjTypeCode::Television, 200.0),
            row(1, "LA", ProjTypeCode::Film, 300.0),
            row(2, "LA", ProjTypeCode::Film, 400.0),
            row(1, "LA", ProjTypeCode::Commercial, 500.0),
        ]
    }

    fn membership(buckets: &BTreeMap<BucketKey, Bucket<'_>>) -> Vec<(String, Vec<i64>)> {
        buckets
            .values()
            .map(|b| {
                let mut rates: Vec<i64> =
                    b.rows.iter().filter_map(|r| r.rate).map(|r| r as i64).collect();
                rates.sort();
                (b.key.to_string(), rates)
            })
            .collect()
    }

    #[test]
    fn test_groups_by_composite_key() {
        let rows = fixture();
        let buckets = bucketize(&rows);

        assert_eq!(buckets.len(), 4);
        assert_eq!(
            membership(&buckets),
            vec![
                ("2024-05-01/LA/C".to_string(), vec![500]),
                ("2024-05-01/LA/F".to_string(), vec![100, 300]),
                ("2024-05-01/NY/T".to_string(), vec![200]),
                ("2024-05-02/LA/F".to_string(), vec![400]),
            ]
        );
    }

    #[test]
    fn test_partition_covers_every_row_once() {
        let rows = fixture();
        let buckets = bucketize(&rows);

        let total: usize = buckets.values().map(Bucket::len).sum();
        assert_eq!(total, rows.len());
        assert!(buckets.values().all(|b| !b.is_empty()));
        assert!(buckets.iter().all(|(k, b)| b.rows.iter().all(|r| &r.key == k)));
    }

    #[test]
    fn test_membership_is_order_independent() {
        let rows = fixture();
        let mut reversed = rows.clone();
        reversed.reverse();
        let mut rotated = rows.clone();
        rotated.rotate_left(2);

        let expected = membership(&bucketize(&rows));
        assert_eq!(membership(&bucketize(&reversed)), expected);
        assert_eq!(membership(&bucketize(&rotated)), expected);
    }

    #[test]
    fn test_empty_input() {
        assert!(bucketize(&[]).is_empty());
    }
}
