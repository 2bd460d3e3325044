use crate::error::{MapError, Result};
use crate::types::{AggregationBucket, RawRow, RegionSummary};
use crate::util::normalize;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Key of the synthetic country-wide bucket.
pub const ALL_STATES: &str = "all-states";

/// Aggregated buckets keyed by normalized region key.
///
/// Built in one pass by [`aggregate`] and read-only afterwards; a new data
/// load builds a new store instead of touching this one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregationStore {
    country: String,
    buckets: HashMap<String, AggregationBucket>,
}

impl AggregationStore {
    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn get(&self, key: &str) -> Option<&AggregationBucket> {
        self.buckets.get(key)
    }

    pub fn bucket(&self, key: &str) -> Result<&AggregationBucket> {
        self.get(key)
            .ok_or_else(|| MapError::UnknownRegion(key.to_string()))
    }

    pub fn all_states(&self) -> Option<&AggregationBucket> {
        self.get(ALL_STATES)
    }

    /// Per-state buckets, excluding the country-wide rollup.
    pub fn states(&self) -> impl Iterator<Item = (&str, &AggregationBucket)> {
        self.buckets
            .iter()
            .filter(|(k, _)| k.as_str() != ALL_STATES)
            .map(|(k, b)| (k.as_str(), b))
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.buckets.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Group `rows` of one country into per-state buckets plus the
/// [`ALL_STATES`] rollup.
///
/// Rows whose state normalizes to `ALL_STATES` are dropped so they cannot
/// shadow the rollup. Returns `DataUnavailable` when no usable row matches
/// `country`.
pub fn aggregate(rows: &[RawRow], country: &str) -> Result<AggregationStore> {
    let mut buckets: HashMap<String, AggregationBucket> = HashMap::new();
    // First-seen order of state keys, used to lay out the rollup's regions.
    let mut state_order: Vec<String> = Vec::new();
    let mut rollup = RegionSummary::new(country, Default::default());
    let mut skipped = 0usize;
    let mut reserved = 0usize;

    for row in rows {
        if row.country != country {
            skipped += 1;
            continue;
        }
        let key = normalize(&row.state);
        if key == ALL_STATES {
            reserved += 1;
            continue;
        }
        let stats = row.stats();
        let county = RegionSummary::new(row.county.clone(), stats);

        match buckets.get_mut(&key) {
            Some(bucket) => {
                bucket.info.accumulate(stats);
                bucket.regions.push(county);
            }
            None => {
                state_order.push(key.clone());
                buckets.insert(
                    key,
                    AggregationBucket {
                        info: RegionSummary::new(row.state.clone(), stats),
                        regions: vec![county],
                    },
                );
            }
        }
        rollup.accumulate(stats);
    }

    if state_order.is_empty() {
        return Err(MapError::DataUnavailable {
            country: country.to_string(),
        });
    }

    let regions: Vec<RegionSummary> = state_order
        .iter()
        .filter_map(|k| buckets.get(k).map(|b| b.info.clone()))
        .collect();
    buckets.insert(
        ALL_STATES.to_string(),
        AggregationBucket {
            info: rollup,
            regions,
        },
    );

    if reserved > 0 {
        warn!(rows = reserved, key = ALL_STATES, "dropped rows whose state name is reserved");
    }
    debug!(skipped, "rows outside the country filter");
    info!(
        country,
        states = state_order.len(),
        "aggregated daily report"
    );

    Ok(AggregationStore {
        country: country.to_string(),
        buckets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StatKind;

    fn row(country: &str, state: &str, county: &str, c: u64, d: u64, r: u64) -> RawRow {
        RawRow {
            country: country.into(),
            state: state.into(),
            county: county.into(),
            confirmed: c,
            deaths: d,
            recovered: r,
        }
    }

    fn sample() -> Vec<RawRow> {
        vec![
            row("US", "Texas", "Harris", 10, 1, 2),
            row("US", "New York", "Kings", 40, 4, 0),
            row("US", "Texas", "Travis", 5, 0, 1),
            row("CA", "Ontario", "", 99, 9, 9),
            row("US", "New York", "Queens", 30, 3, 1),
        ]
    }

    #[test]
    fn builds_state_buckets() {
        let store = aggregate(&sample(), "US").unwrap();
        let texas = store.bucket("texas").unwrap();
        assert_eq!(texas.info.name, "Texas");
        assert_eq!((texas.info.confirmed, texas.info.deaths, texas.info.recovered), (15, 1, 3));
        assert_eq!(texas.regions.len(), 2);
        assert_eq!(texas.regions[1].name, "Travis");
        assert!(store.get("new-york").is_some());
    }

    #[test]
    fn bucket_info_equals_sum_of_regions() {
        let store = aggregate(&sample(), "US").unwrap();
        for key in store.keys() {
            let b = store.bucket(key).unwrap();
            for kind in StatKind::ALL {
                let sum: u64 = b.regions.iter().map(|r| r.value(kind)).sum();
                assert_eq!(b.info.value(kind), sum, "{} {}", key, kind);
            }
        }
    }

    #[test]
    fn rollup_holds_one_entry_per_state() {
        let store = aggregate(&sample(), "US").unwrap();
        let all = store.all_states().unwrap();
        assert_eq!(all.info.name, "US");
        assert_eq!(all.info.confirmed, 85);
        let names: Vec<&str> = all.regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Texas", "New York"]);
        // copies reflect the final state totals, not the first row
        assert_eq!(all.regions[1].confirmed, 70);
    }

    #[test]
    fn first_state_is_not_double_counted() {
        let rows = vec![row("US", "Texas", "Harris", 10, 1, 2)];
        let store = aggregate(&rows, "US").unwrap();
        assert_eq!(store.all_states().unwrap().info.confirmed, 10);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn other_countries_are_ignored() {
        let store = aggregate(&sample(), "US").unwrap();
        assert!(store.get("ontario").is_none());
        assert_eq!(store.states().count(), 2);
    }

    #[test]
    fn reserved_state_name_does_not_replace_rollup() {
        let mut rows = sample();
        rows.push(row("US", "All States", "", 1000, 100, 10));
        let store = aggregate(&rows, "US").unwrap();
        let all = store.all_states().unwrap();
        assert_eq!(all.info.name, "US");
        assert_eq!(all.info.confirmed, 85);
        let sum: u64 = store.states().map(|(_, b)| b.info.confirmed).sum();
        assert_eq!(sum, all.info.confirmed);
        assert_eq!(all.regions.len(), 2);

        let only_reserved = vec![row("US", "all states", "", 1, 0, 0)];
        assert!(matches!(
            aggregate(&only_reserved, "US"),
            Err(MapError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let rows = vec![
            row("US", "Texas", "Harris", u64::MAX - 1, 0, 0),
            row("US", "Texas", "Travis", 5, 1, 0),
        ];
        let store = aggregate(&rows, "US").unwrap();
        let texas = store.bucket("texas").unwrap();
        assert_eq!(texas.info.confirmed, u64::MAX);
        assert_eq!(texas.info.deaths, 1);
        assert_eq!(store.all_states().unwrap().info.confirmed, u64::MAX);
    }

    #[test]
    fn empty_selection_is_data_unavailable() {
        let rows = vec![row("CA", "Ontario", "", 1, 0, 0)];
        assert!(matches!(
            aggregate(&rows, "US"),
            Err(MapError::DataUnavailable { .. })
        ));
        assert!(matches!(aggregate(&[], "US"), Err(MapError::DataUnavailable { .. })));
    }
}
