//! Combining day snapshots into a window summary.
//!
//! The source quantities are normalized differently, so each field family has
//! its own combination rule:
//!
//! - share maps (`import`, `export`, `mention`) use a sparse mean: a country's
//!   values are averaged over the days it appears in, not the window length
//! - entity lists merge raw counts per entity, keep the top N by count and
//!   recompute shares over what is kept
//! - foreign press totals use the sparse mean; contributor shares are summed
//!   raw across days and then renormalized to 1

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use coverage_core::{
    CountryCode, CoverageRelation, DayKey, EntityCount, ForeignPress, PerDaySnapshot, ShareMap,
    WindowedAggregate,
};
use tracing::debug;

/// Default number of entities kept per country.
pub const DEFAULT_TOP_ENTITIES: usize = 10;

/// Running mean and appearance count for one country.
///
/// Updated incrementally so the mean of values near `f64::MAX` stays finite.
#[derive(Debug, Default, Clone, Copy)]
struct SparseMean {
    mean: f64,
    days: usize,
}

impl SparseMean {
    fn add(&mut self, value: f64) {
        self.days += 1;
        self.mean += (value - self.mean) / self.days as f64;
    }

    const fn mean(self) -> f64 {
        self.mean
    }
}

/// Merged mentions of one entity.
///
/// `count` is the raw sum reported to callers, saturating at `f64::MAX`.
/// `weight` is the same sum divided by the number of entity entries in the
/// window, which cannot overflow and is what shares are computed from.
#[derive(Debug, Default, Clone, Copy)]
struct EntityTally {
    count: f64,
    weight: f64,
}

/// Per-country accumulator for one foreign press direction.
///
/// Contributor values are stored divided by the window's day count.
#[derive(Debug, Default)]
struct RelationSum {
    total: SparseMean,
    contributors: ShareMap,
}

/// Combines ordered day snapshots into a [`WindowedAggregate`].
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    top_entities_limit: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_ENTITIES)
    }
}

impl Aggregator {
    /// Create an aggregator keeping `top_entities_limit` entities per country.
    #[must_use]
    pub const fn new(top_entities_limit: usize) -> Self {
        Self { top_entities_limit }
    }

    /// Returns the number of entities kept per country.
    #[must_use]
    pub const fn top_entities_limit(&self) -> usize {
        self.top_entities_limit
    }

    /// Combine `snapshots` (oldest first) into one summary for `date_range`.
    ///
    /// `date_range` is carried through untouched, including days that
    /// contributed nothing. An empty input yields an empty aggregate.
    #[must_use]
    pub fn aggregate(
        &self,
        snapshots: &[Arc<PerDaySnapshot>],
        date_range: Vec<DayKey>,
    ) -> WindowedAggregate {
        if snapshots.is_empty() {
            debug!(days = date_range.len(), "No snapshots to aggregate");
            return WindowedAggregate::empty(date_range);
        }

        let days = snapshots.len() as f64;
        let featured =
            merge_relations(snapshots.iter().map(|s| &s.foreign_press.featured), days);
        let covering =
            merge_relations(snapshots.iter().map(|s| &s.foreign_press.covering), days);

        let aggregate = WindowedAggregate {
            days_used: snapshots.len(),
            import_share: sparse_average(snapshots.iter().map(|s| &s.import_share)),
            export_share: sparse_average(snapshots.iter().map(|s| &s.export_share)),
            mention_share: sparse_average(snapshots.iter().map(|s| &s.mention_share)),
            top_entities_by_country: self.merge_entities(snapshots),
            top_entity_of_day: snapshots
                .iter()
                .rev()
                .find_map(|s| s.top_entity_of_day.clone()),
            top_entities: snapshots
                .iter()
                .filter_map(|s| s.top_entity_of_day.clone())
                .collect::<BTreeSet<_>>(),
            foreign_press: ForeignPress::from_relations(featured, covering),
            date_range,
        };

        debug!(
            days_used = aggregate.days_used,
            days = aggregate.date_range.len(),
            countries = aggregate.import_share.len(),
            "Aggregated window"
        );
        aggregate
    }

    /// Sum counts per entity, keep the top N and recompute shares over them.
    fn merge_entities(
        &self,
        snapshots: &[Arc<PerDaySnapshot>],
    ) -> BTreeMap<CountryCode, Vec<EntityCount>> {
        let entries = snapshots
            .iter()
            .flat_map(|s| s.top_entities_by_country.values())
            .map(Vec::len)
            .sum::<usize>()
            .max(1) as f64;
        let mut merged: BTreeMap<&CountryCode, HashMap<&str, EntityTally>> = BTreeMap::new();
        for snapshot in snapshots {
            for (country, entities) in &snapshot.top_entities_by_country {
                let tallies = merged.entry(country).or_default();
                for e in entities {
                    let tally = tallies.entry(e.entity.as_str()).or_default();
                    tally.count += e.count;
                    tally.weight += e.count / entries;
                }
            }
        }

        let mut result = BTreeMap::new();
        for (country, tallies) in merged {
            let mut ranked: Vec<(&str, f64, f64)> = tallies
                .into_iter()
                .map(|(entity, t)| (entity, t.count.min(f64::MAX), t.weight))
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            ranked.truncate(self.top_entities_limit);

            let weights: Vec<f64> = ranked.iter().map(|(_, _, weight)| *weight).collect();
            let Some(shares) = unit_shares(&weights) else {
                continue;
            };

            let entities = ranked
                .into_iter()
                .zip(shares)
                .map(|((entity, count, _), share)| EntityCount::new(entity, count, share))
                .collect();
            result.insert(country.clone(), entities);
        }
        result
    }
}

/// Average each country over the maps it appears in.
fn sparse_average<'a>(maps: impl Iterator<Item = &'a ShareMap>) -> ShareMap {
    let mut acc: BTreeMap<&CountryCode, SparseMean> = BTreeMap::new();
    for map in maps {
        for (country, value) in map {
            acc.entry(country).or_default().add(*value);
        }
    }
    acc.into_iter()
        .map(|(country, mean)| (country.clone(), mean.mean()))
        .collect()
}

/// Sparse-average the totals and renormalize the summed contributor shares.
fn merge_relations<'a>(
    per_day: impl Iterator<Item = &'a BTreeMap<CountryCode, CoverageRelation>>,
    days: f64,
) -> BTreeMap<CountryCode, CoverageRelation> {
    let mut acc: BTreeMap<&CountryCode, RelationSum> = BTreeMap::new();
    for relations in per_day {
        for (country, relation) in relations {
            let sum = acc.entry(country).or_default();
            sum.total.add(relation.total);
            for (contributor, value) in &relation.contributors {
                *sum.contributors.entry(contributor.clone()).or_insert(0.0) += value / days;
            }
        }
    }

    acc.into_iter()
        .map(|(country, sum)| {
            let relation = CoverageRelation::new(renormalize(sum.contributors), sum.total.mean());
            (country.clone(), relation)
        })
        .collect()
}

/// Scale values so they sum to 1; an all-zero map becomes empty.
fn renormalize(values: ShareMap) -> ShareMap {
    let weights: Vec<f64> = values.values().copied().collect();
    match unit_shares(&weights) {
        Some(shares) => values.into_keys().zip(shares).collect(),
        None => ShareMap::new(),
    }
}

/// Scales non-negative finite values to sum to 1, or `None` if all are zero.
///
/// Dividing by the largest value first keeps the sum finite.
fn unit_shares(values: &[f64]) -> Option<Vec<f64>> {
    let max = values.iter().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        return None;
    }
    let scaled: Vec<f64> = values.iter().map(|v| v / max).collect();
    let total: f64 = scaled.iter().sum();
    Some(scaled.into_iter().map(|v| v / total).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn code(s: &str) -> CountryCode {
        CountryCode::new(s)
    }

    fn day(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    fn shares(pairs: &[(&str, f64)]) -> ShareMap {
        pairs.iter().map(|(c, v)| (code(c), *v)).collect()
    }

    fn range(n: u32) -> Vec<DayKey> {
        (1..=n).map(|d| day(&format!("2025-01-{d:02}"))).collect()
    }

    fn with_imports(pairs: &[(&str, f64)]) -> Arc<PerDaySnapshot> {
        Arc::new(PerDaySnapshot {
            import_share: shares(pairs),
            ..Default::default()
        })
    }

    fn with_featured(country: &str, contributors: &[(&str, f64)], total: f64) -> PerDaySnapshot {
        let mut featured = BTreeMap::new();
        featured.insert(code(country), CoverageRelation::new(shares(contributors), total));
        PerDaySnapshot {
            foreign_press: ForeignPress::from_relations(featured, BTreeMap::new()),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_input_keeps_date_range() {
        let aggregate = Aggregator::default().aggregate(&[], range(7));
        assert!(aggregate.is_empty());
        assert_eq!(aggregate.date_range, range(7));
        assert_eq!(aggregate.days_used, 0);
    }

    #[test]
    fn test_sparse_average_divides_by_appearances() {
        // USA on days 1 and 3 only; GBR every day
        let snapshots = vec![
            with_imports(&[("USA", 0.8), ("GBR", 0.2)]),
            with_imports(&[("GBR", 0.4)]),
            with_imports(&[("USA", 0.6), ("GBR", 0.6)]),
        ];

        let aggregate = Aggregator::default().aggregate(&snapshots, range(3));
        assert!((aggregate.import_share[&code("USA")] - 0.7).abs() < EPS);
        assert!((aggregate.import_share[&code("GBR")] - 0.4).abs() < EPS);
        assert_eq!(aggregate.days_used, 3);
    }

    #[test]
    fn test_absent_countries_are_omitted() {
        let snapshots = vec![with_imports(&[("USA", 0.5)])];
        let aggregate = Aggregator::default().aggregate(&snapshots, range(1));
        assert_eq!(aggregate.import_share.len(), 1);
        assert!(!aggregate.import_share.contains_key(&code("FRA")));
        assert!(aggregate.export_share.is_empty());
    }

    #[test]
    fn test_entities_merge_rank_and_renormalize() {
        let mut day1 = PerDaySnapshot::default();
        day1.top_entities_by_country.insert(
            code("USA"),
            vec![
                EntityCount::new("NATO", 4.0, 0.8),
                EntityCount::new("Biden", 1.0, 0.2),
            ],
        );
        let mut day2 = PerDaySnapshot::default();
        day2.top_entities_by_country.insert(
            code("USA"),
            vec![
                EntityCount::new("Biden", 5.0, 0.5),
                EntityCount::new("nato", 5.0, 0.5),
            ],
        );

        let aggregate =
            Aggregator::default().aggregate(&[Arc::new(day1), Arc::new(day2)], range(2));
        let usa = &aggregate.top_entities_by_country[&code("USA")];

        let names: Vec<&str> = usa.iter().map(|e| e.entity.as_str()).collect();
        // Case-sensitive: `nato` and `NATO` stay separate entities
        assert_eq!(names, vec!["Biden", "nato", "NATO"]);
        assert_eq!(usa[0].count, 6.0);
        assert!((usa[0].share - 6.0 / 15.0).abs() < EPS);
        let share_sum: f64 = usa.iter().map(|e| e.share).sum();
        assert!((share_sum - 1.0).abs() < EPS);
    }

    #[test]
    fn test_entities_truncated_to_limit() {
        let mut snapshot = PerDaySnapshot::default();
        snapshot.top_entities_by_country.insert(
            code("DEU"),
            (0..25)
                .map(|i| EntityCount::new(format!("entity-{i:02}"), f64::from(i + 1), 0.0))
                .collect(),
        );

        let aggregate = Aggregator::default().aggregate(&[Arc::new(snapshot)], range(1));
        let deu = &aggregate.top_entities_by_country[&code("DEU")];
        assert_eq!(deu.len(), 10);
        assert!(deu.windows(2).all(|w| w[0].count >= w[1].count));
        assert_eq!(deu[0].entity, "entity-24");
        let share_sum: f64 = deu.iter().map(|e| e.share).sum();
        assert!((share_sum - 1.0).abs() < EPS);

        let small = Aggregator::new(3).aggregate(
            &[Arc::new(PerDaySnapshot {
                top_entities_by_country: aggregate.top_entities_by_country.clone(),
                ..Default::default()
            })],
            range(1),
        );
        assert_eq!(small.top_entities_by_country[&code("DEU")].len(), 3);
    }

    #[test]
    fn test_zero_count_entities_dropped() {
        let mut snapshot = PerDaySnapshot::default();
        snapshot
            .top_entities_by_country
            .insert(code("USA"), vec![EntityCount::new("Nobody", 0.0, 0.0)]);

        let aggregate = Aggregator::default().aggregate(&[Arc::new(snapshot)], range(1));
        assert!(aggregate.top_entities_by_country.is_empty());
    }

    #[test]
    fn test_top_entities_union() {
        let snapshots: Vec<Arc<PerDaySnapshot>> = ["NATO", "EU", "NATO"]
            .iter()
            .map(|e| {
                Arc::new(PerDaySnapshot {
                    top_entity_of_day: Some((*e).to_string()),
                    ..Default::default()
                })
            })
            .chain(std::iter::once(Arc::new(PerDaySnapshot::default())))
            .collect();

        let aggregate = Aggregator::default().aggregate(&snapshots, range(4));
        assert_eq!(aggregate.top_entities.len(), 2);
        assert!(aggregate.top_entities.contains("NATO"));
        assert!(aggregate.top_entities.contains("EU"));
        // Most recent day naming one
        assert_eq!(aggregate.top_entity_of_day.as_deref(), Some("NATO"));
    }

    #[test]
    fn test_foreign_press_sums_then_renormalizes() {
        let snapshots = vec![
            Arc::new(with_featured("USA", &[("GBR", 1.0)], 10.0)),
            Arc::new(with_featured("USA", &[("GBR", 0.25), ("DEU", 0.75)], 30.0)),
            Arc::new(PerDaySnapshot::default()),
        ];

        let aggregate = Aggregator::default().aggregate(&snapshots, range(3));
        let usa = &aggregate.foreign_press.featured[&code("USA")];

        // Sparse mean over the two appearances
        assert!((usa.total - 20.0).abs() < EPS);
        // GBR 1.25, DEU 0.75 of 2.0
        assert!((usa.contributors[&code("GBR")] - 0.625).abs() < EPS);
        assert!((usa.contributors[&code("DEU")] - 0.375).abs() < EPS);
        let sum: f64 = usa.contributors.values().sum();
        assert!((sum - 1.0).abs() < EPS);
    }

    #[test]
    fn test_foreign_press_zero_contributors_empty() {
        let snapshots = vec![Arc::new(with_featured("FRA", &[("GBR", 0.0)], 0.0))];
        let aggregate = Aggregator::default().aggregate(&snapshots, range(1));

        let fra = &aggregate.foreign_press.featured[&code("FRA")];
        assert!(fra.contributors.is_empty());
        assert_eq!(fra.total, 0.0);
        // Present in the raw map but not ranked
        assert!(aggregate.foreign_press.featured_rankings.is_empty());
    }

    #[test]
    fn test_rankings_rebuilt_descending() {
        let mut featured = BTreeMap::new();
        featured.insert(code("USA"), CoverageRelation::new(shares(&[("GBR", 1.0)]), 4.0));
        featured.insert(code("FRA"), CoverageRelation::new(shares(&[("GBR", 1.0)]), 9.0));
        featured.insert(code("ITA"), CoverageRelation::new(ShareMap::new(), 0.0));
        let mut covering = BTreeMap::new();
        covering.insert(code("GBR"), CoverageRelation::new(shares(&[("USA", 1.0)]), 2.0));

        let snapshot = PerDaySnapshot {
            foreign_press: ForeignPress::from_relations(featured, covering),
            ..Default::default()
        };
        let aggregate = Aggregator::default().aggregate(&[Arc::new(snapshot)], range(1));

        let ranked: Vec<&str> = aggregate
            .foreign_press
            .featured_rankings
            .iter()
            .map(|r| r.country.as_str())
            .collect();
        assert_eq!(ranked, vec!["FRA", "USA"]);
        assert_eq!(aggregate.foreign_press.covering_rankings.len(), 1);
        assert_eq!(aggregate.foreign_press.covering_rankings[0].total, 2.0);
    }

    #[test]
    fn test_values_near_max_stay_finite() {
        let big = 1e308;
        let mut day = with_featured("USA", &[("GBR", big), ("DEU", big)], big);
        day.mention_share.insert(code("USA"), big);
        day.top_entities_by_country.insert(
            code("USA"),
            vec![
                EntityCount::new("NATO", big, 0.5),
                EntityCount::new("EU", f64::MAX, 0.5),
            ],
        );
        let day = Arc::new(day);

        let aggregate = Aggregator::default().aggregate(&[Arc::clone(&day), day], range(2));

        assert_eq!(aggregate.mention_share[&code("USA")], big);
        let usa = &aggregate.foreign_press.featured[&code("USA")];
        assert_eq!(usa.total, big);
        assert!((usa.contributors[&code("GBR")] - 0.5).abs() < EPS);
        assert!((usa.contributors[&code("DEU")] - 0.5).abs() < EPS);

        let entities = &aggregate.top_entities_by_country[&code("USA")];
        assert!(entities.iter().all(|e| e.count.is_finite() && e.share.is_finite()));
        assert_eq!(entities[0].entity, "EU");
        assert_eq!(entities[0].count, f64::MAX);
        let share_sum: f64 = entities.iter().map(|e| e.share).sum();
        assert!((share_sum - 1.0).abs() < EPS);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use proptest::test_runner::Config;

        const COUNTRIES: [&str; 5] = ["USA", "GBR", "DEU", "FRA", "CHN"];
        const ENTITIES: [&str; 14] = [
            "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n",
        ];

        fn value() -> impl Strategy<Value = f64> {
            prop_oneof![
                4 => 0.0f64..1.0,
                1 => Just(0.0),
                1 => 1e300f64..f64::MAX,
            ]
        }

        fn share_map() -> impl Strategy<Value = ShareMap> {
            prop::collection::btree_map(prop::sample::select(COUNTRIES.to_vec()), value(), 0..4)
                .prop_map(|m| m.into_iter().map(|(c, v)| (code(c), v)).collect())
        }

        fn entity_list() -> impl Strategy<Value = Vec<EntityCount>> {
            prop::collection::vec(
                (prop::sample::select(ENTITIES.to_vec()), value()),
                0..12,
            )
            .prop_map(|items| {
                items
                    .into_iter()
                    .map(|(name, count)| EntityCount::new(name, count, 0.0))
                    .collect()
            })
        }

        fn relations() -> impl Strategy<Value = BTreeMap<CountryCode, CoverageRelation>> {
            prop::collection::btree_map(
                prop::sample::select(COUNTRIES.to_vec()),
                (share_map(), value()),
                0..4,
            )
            .prop_map(|m| {
                m.into_iter()
                    .map(|(c, (contributors, total))| {
                        (code(c), CoverageRelation::new(contributors, total))
                    })
                    .collect()
            })
        }

        fn snapshot() -> impl Strategy<Value = Arc<PerDaySnapshot>> {
            (
                share_map(),
                share_map(),
                prop::collection::btree_map(
                    prop::sample::select(COUNTRIES.to_vec()),
                    entity_list(),
                    0..3,
                ),
                relations(),
                relations(),
            )
                .prop_map(|(imports, mentions, entities, featured, covering)| {
                    Arc::new(PerDaySnapshot {
                        import_share: imports,
                        mention_share: mentions,
                        top_entities_by_country: entities
                            .into_iter()
                            .map(|(c, list)| (code(c), list))
                            .collect(),
                        foreign_press: ForeignPress::from_relations(featured, covering),
                        ..Default::default()
                    })
                })
        }

        fn close(actual: f64, expected: f64) -> bool {
            (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0)
        }

        fn check_relations(relations: &BTreeMap<CountryCode, CoverageRelation>) {
            for relation in relations.values() {
                assert!(relation.total.is_finite() && relation.total >= 0.0);
                if !relation.contributors.is_empty() {
                    let sum: f64 = relation.contributors.values().sum();
                    assert!((sum - 1.0).abs() < 1e-9, "contributor sum {sum}");
                    assert!(relation.contributors.values().all(|v| (0.0..=1.0).contains(v)));
                }
            }
        }

        proptest! {
            #![proptest_config(Config::with_cases(128))]

            #[test]
            fn shares_are_averaged_over_appearances(
                snapshots in prop::collection::vec(snapshot(), 0..8)
            ) {
                let aggregate = Aggregator::default().aggregate(&snapshots, range(8));
                prop_assert_eq!(aggregate.days_used, snapshots.len());
                prop_assert_eq!(&aggregate.date_range, &range(8));

                for country in COUNTRIES.map(code) {
                    let seen: Vec<f64> = snapshots
                        .iter()
                        .filter_map(|s| s.import_share.get(&country).copied())
                        .collect();
                    match aggregate.import_share.get(&country) {
                        None => prop_assert!(seen.is_empty()),
                        Some(mean) => {
                            let n = seen.len() as f64;
                            let expected: f64 = seen.iter().map(|v| v / n).sum();
                            prop_assert!(mean.is_finite());
                            prop_assert!(close(*mean, expected), "{} vs {}", mean, expected);
                        }
                    }
                }
                prop_assert!(aggregate.mention_share.values().all(|v| v.is_finite()));
            }

            #[test]
            fn contributor_shares_sum_to_one_or_are_empty(
                snapshots in prop::collection::vec(snapshot(), 1..8)
            ) {
                let aggregate = Aggregator::default().aggregate(&snapshots, range(8));
                check_relations(&aggregate.foreign_press.featured);
                check_relations(&aggregate.foreign_press.covering);

                let rankings = &aggregate.foreign_press.featured_rankings;
                prop_assert!(rankings.iter().all(|r| r.total > 0.0));
                prop_assert!(rankings.windows(2).all(|w| w[0].total >= w[1].total));
            }

            #[test]
            fn entity_lists_are_bounded_sorted_and_normalized(
                snapshots in prop::collection::vec(snapshot(), 1..8),
                limit in 1usize..12,
            ) {
                let aggregate = Aggregator::new(limit).aggregate(&snapshots, range(8));
                for entities in aggregate.top_entities_by_country.values() {
                    prop_assert!(!entities.is_empty());
                    prop_assert!(entities.len() <= limit);
                    prop_assert!(entities.windows(2).all(|w| w[0].count >= w[1].count));
                    prop_assert!(entities.iter().all(|e| e.count.is_finite()));
                    prop_assert!(entities.iter().all(|e| (0.0..=1.0).contains(&e.share)));
                    let sum: f64 = entities.iter().map(|e| e.share).sum();
                    prop_assert!((sum - 1.0).abs() < 1e-9, "share sum {}", sum);
                }
            }
        }
    }
}
