//! Core data types for coverage snapshots.
//!
//! This module defines the fundamental data structures:
//!
//! - [`DayKey`] - Calendar day, rendered as `YYYY-MM-DD`
//! - [`CountryCode`] - ISO-3166 alpha-3 country code
//! - [`PerDaySnapshot`] - Validated coverage metrics for one day
//! - [`ForeignPress`] - Featured/covering relations between countries
//! - [`WindowedAggregate`] - Several days combined into one summary
//! - [`TrendPoint`] - One day of a country's trend series

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical textual form of a [`DayKey`].
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// A calendar day used as cache key and fetch path parameter.
///
/// Ordering is chronological, which matches the lexicographic order of the
/// canonical `YYYY-MM-DD` form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// Creates a day key from a date.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Returns the underlying date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.0
    }

    /// Returns the previous calendar day, if representable.
    #[must_use]
    pub fn pred(&self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_KEY_FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, DAY_KEY_FORMAT).map(Self)
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl From<DayKey> for String {
    fn from(day: DayKey) -> Self {
        day.to_string()
    }
}

impl TryFrom<String> for DayKey {
    type Error = chrono::ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// An ISO-3166 alpha-3 country code.
///
/// Codes are uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CountryCode(String);

impl CountryCode {
    /// Creates a new country code, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().to_uppercase())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CountryCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CountryCode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Mapping from country to a numeric share.
pub type ShareMap = BTreeMap<CountryCode, f64>;

/// A named entity and how often it was mentioned for a country.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityCount {
    /// Entity name, compared case-sensitively.
    pub entity: String,
    /// Raw mention count.
    pub count: f64,
    /// Fraction of the country's listed mentions.
    pub share: f64,
}

impl EntityCount {
    /// Creates a new entity count.
    #[must_use]
    pub fn new(entity: impl Into<String>, count: f64, share: f64) -> Self {
        Self {
            entity: entity.into(),
            count,
            share,
        }
    }
}

/// One direction of the coverage relation for a single country.
///
/// For the featured direction `contributors` holds who covers the country;
/// for the covering direction it holds whom the country covers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageRelation {
    /// Per-contributor shares, normalized to sum to at most 1.
    pub contributors: ShareMap,
    /// Total coverage volume in this direction.
    pub total: f64,
}

impl CoverageRelation {
    /// Creates a relation from contributor shares and a total.
    #[must_use]
    pub const fn new(contributors: ShareMap, total: f64) -> Self {
        Self {
            contributors,
            total,
        }
    }
}

/// A country's position in a ranking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// Ranked country.
    pub country: CountryCode,
    /// Total the ranking is sorted by.
    pub total: f64,
}

/// Foreign press relations for all countries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignPress {
    /// How much each country is covered by others (`coveredBy`/`totalCoverage`).
    pub featured: BTreeMap<CountryCode, CoverageRelation>,
    /// How much each country covers others (`covering`/`totalCovering`).
    pub covering: BTreeMap<CountryCode, CoverageRelation>,
    /// Countries with positive featured totals, descending.
    pub featured_rankings: Vec<RankingEntry>,
    /// Countries with positive covering totals, descending.
    pub covering_rankings: Vec<RankingEntry>,
}

impl ForeignPress {
    /// Creates foreign press data from both relation maps, deriving the rankings.
    #[must_use]
    pub fn from_relations(
        featured: BTreeMap<CountryCode, CoverageRelation>,
        covering: BTreeMap<CountryCode, CoverageRelation>,
    ) -> Self {
        let featured_rankings = rank_by_total(&featured);
        let covering_rankings = rank_by_total(&covering);
        Self {
            featured,
            covering,
            featured_rankings,
            covering_rankings,
        }
    }

    /// Returns the featured total for a country, or 0 if absent.
    #[must_use]
    pub fn featured_total(&self, country: &CountryCode) -> f64 {
        self.featured.get(country).map_or(0.0, |r| r.total)
    }

    /// Returns the covering total for a country, or 0 if absent.
    #[must_use]
    pub fn covering_total(&self, country: &CountryCode) -> f64 {
        self.covering.get(country).map_or(0.0, |r| r.total)
    }

    /// Returns true if neither direction holds any country.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.featured.is_empty() && self.covering.is_empty()
    }
}

/// Sorts countries with a positive total by that total, descending.
///
/// Ties are broken by ascending country code.
#[must_use]
pub fn rank_by_total(relations: &BTreeMap<CountryCode, CoverageRelation>) -> Vec<RankingEntry> {
    let mut ranking: Vec<RankingEntry> = relations
        .iter()
        .filter(|(_, r)| r.total > 0.0)
        .map(|(country, r)| RankingEntry {
            country: country.clone(),
            total: r.total,
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.country.cmp(&b.country))
    });
    ranking
}

/// Validated coverage metrics for one day.
///
/// Created once per day on first successful load and never mutated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerDaySnapshot {
    /// Share of incoming coverage per country (`importData`).
    pub import_share: ShareMap,
    /// Share of outgoing coverage per country (`exportData`).
    pub export_share: ShareMap,
    /// Named-entity mention share per country (`nerData`).
    pub mention_share: ShareMap,
    /// Most mentioned entities per country.
    pub top_entities_by_country: BTreeMap<CountryCode, Vec<EntityCount>>,
    /// The day's single most salient entity (`topNer`).
    pub top_entity_of_day: Option<String>,
    /// Featured/covering relations (`foreignPressData`).
    pub foreign_press: ForeignPress,
}

/// Several days of snapshots combined into one summary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowedAggregate {
    /// Every requested day, oldest first, whether or not it had data.
    pub date_range: Vec<DayKey>,
    /// Number of days that contributed data.
    pub days_used: usize,
    /// Sparse average of import shares.
    pub import_share: ShareMap,
    /// Sparse average of export shares.
    pub export_share: ShareMap,
    /// Sparse average of mention shares.
    pub mention_share: ShareMap,
    /// Frequency-merged top entities per country.
    pub top_entities_by_country: BTreeMap<CountryCode, Vec<EntityCount>>,
    /// Top entity of the most recent day that names one.
    pub top_entity_of_day: Option<String>,
    /// Union of each day's top entity.
    pub top_entities: BTreeSet<String>,
    /// Averaged totals with renormalized contributor shares.
    pub foreign_press: ForeignPress,
}

impl WindowedAggregate {
    /// Creates an aggregate with no data covering the given range.
    #[must_use]
    pub fn empty(date_range: Vec<DayKey>) -> Self {
        Self {
            date_range,
            ..Default::default()
        }
    }

    /// Returns true if no day contributed any data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.import_share.is_empty()
            && self.export_share.is_empty()
            && self.mention_share.is_empty()
            && self.top_entities_by_country.is_empty()
            && self.top_entities.is_empty()
            && self.foreign_press.is_empty()
    }
}

/// One day of a country's featured/covering trend.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Day of the point.
    pub date: DayKey,
    /// Featured total for the day.
    pub featured: f64,
    /// Covering total for the day.
    pub covering: f64,
}

impl TrendPoint {
    /// Creates a trend point.
    #[must_use]
    pub const fn new(date: DayKey, featured: f64, covering: f64) -> Self {
        Self {
            date,
            featured,
            covering,
        }
    }

    /// Creates a zero point for a day without data.
    #[must_use]
    pub const fn zero(date: DayKey) -> Self {
        Self::new(date, 0.0, 0.0)
    }
}
