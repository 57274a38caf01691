// 🔍 Filter State & Predicate Pipeline
// Immutable filter values; every UI interaction produces a new FilterState

use crate::dataset::{OccupationCategory, Record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

pub const MIN_YEAR: i32 = 0;
pub const MAX_YEAR: i32 = 2024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("year range {from}-{to} is reversed")]
    Reversed { from: i32, to: i32 },

    #[error("year {0} is outside 0-2024")]
    OutOfBounds(i32),
}

// ============================================================================
// YEAR RANGE
// ============================================================================

/// Closed, inclusive year interval with `MIN_YEAR <= from <= to <= MAX_YEAR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearRange {
    from: i32,
    to: i32,
}

impl YearRange {
    pub fn new(from: i32, to: i32) -> Result<Self, FilterError> {
        for year in [from, to] {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(FilterError::OutOfBounds(year));
            }
        }
        if from > to {
            return Err(FilterError::Reversed { from, to });
        }
        Ok(YearRange { from, to })
    }

    pub fn from(&self) -> i32 {
        self.from
    }

    pub fn to(&self) -> i32 {
        self.to
    }

    /// Lifespan lies inside the window: born at or after `from`, died at or
    /// before `to`. Unknown years never match.
    pub fn contains_lifespan(&self, birth: Option<i32>, death: Option<i32>) -> bool {
        match (birth, death) {
            (Some(birth), Some(death)) => death <= self.to && birth >= self.from,
            _ => false,
        }
    }

    /// Move both bounds by `delta`, clamped to the valid window.
    pub fn shifted(&self, delta: i32) -> Self {
        let from = (self.from + delta).clamp(MIN_YEAR, MAX_YEAR);
        let to = (self.to + delta).clamp(MIN_YEAR, MAX_YEAR);
        YearRange { from: from.min(to), to }
    }

    /// Move only one bound, keeping `from <= to`.
    pub fn with_from(&self, from: i32) -> Self {
        let from = from.clamp(MIN_YEAR, self.to);
        YearRange { from, to: self.to }
    }

    pub fn with_to(&self, to: i32) -> Self {
        let to = to.clamp(self.from, MAX_YEAR);
        YearRange { from: self.from, to }
    }

    pub fn at_upper_bound(&self) -> bool {
        self.to >= MAX_YEAR || self.from >= MAX_YEAR
    }
}

impl Default for YearRange {
    fn default() -> Self {
        YearRange { from: 0, to: 500 }
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

// Wire form is a `[from, to]` pair, like a two-handle slider reports it
impl Serialize for YearRange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.from, self.to].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for YearRange {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [from, to] = <[i32; 2]>::deserialize(deserializer)?;
        YearRange::new(from, to).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// PREDICATES
// ============================================================================

/// One independent dimension of the filter. Predicates commute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Region(String),
    Gender(BTreeSet<String>),
    Occupation(BTreeSet<OccupationCategory>),
    Years(YearRange),
}

impl Predicate {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::Region(name) => &record.country == name,
            Predicate::Gender(genders) => genders.contains(&record.gender),
            Predicate::Occupation(categories) => record
                .occupation_category
                .map(|c| categories.contains(&c))
                .unwrap_or(false),
            Predicate::Years(range) => range.contains_lifespan(record.birth_year, record.death_year),
        }
    }
}

// ============================================================================
// FILTER STATE
// ============================================================================

/// Current selection. Empty sets and `None` mean "everything" for that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub genders: BTreeSet<String>,
    #[serde(default)]
    pub occupations: BTreeSet<OccupationCategory>,
    #[serde(default)]
    pub years: YearRange,
}

impl FilterState {
    pub fn new(years: YearRange) -> Self {
        FilterState {
            years,
            ..FilterState::default()
        }
    }

    /// Active predicates, cheapest-to-reject first
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::with_capacity(4);
        if let Some(region) = &self.region {
            predicates.push(Predicate::Region(region.clone()));
        }
        if !self.genders.is_empty() {
            predicates.push(Predicate::Gender(self.genders.clone()));
        }
        if !self.occupations.is_empty() {
            predicates.push(Predicate::Occupation(self.occupations.clone()));
        }
        predicates.push(Predicate::Years(self.years));
        predicates
    }

    /// Conjunction of every active dimension, without allocating predicates
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(region) = &self.region {
            if &record.country != region {
                return false;
            }
        }
        if !self.genders.is_empty() && !self.genders.contains(&record.gender) {
            return false;
        }
        if !self.occupations.is_empty() {
            match record.occupation_category {
                Some(c) if self.occupations.contains(&c) => {}
                _ => return false,
            }
        }
        self.years.contains_lifespan(record.birth_year, record.death_year)
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Region click: selecting the already-selected region clears it.
    pub fn select_region(&self, name: &str) -> Self {
        let mut next = self.clone();
        next.region = if self.region.as_deref() == Some(name) {
            None
        } else {
            Some(name.to_string())
        };
        next
    }

    pub fn clear_region(&self) -> Self {
        FilterState {
            region: None,
            ..self.clone()
        }
    }

    pub fn toggle_gender(&self, gender: &str) -> Self {
        let mut next = self.clone();
        if !next.genders.remove(gender) {
            next.genders.insert(gender.to_string());
        }
        next
    }

    pub fn toggle_occupation(&self, category: OccupationCategory) -> Self {
        let mut next = self.clone();
        if !next.occupations.remove(&category) {
            next.occupations.insert(category);
        }
        next
    }

    /// Replace the whole checked set, as a checkbox group reports it
    pub fn with_genders<I, S>(&self, genders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterState {
            genders: genders.into_iter().map(Into::into).collect(),
            ..self.clone()
        }
    }

    pub fn with_occupations<I>(&self, categories: I) -> Self
    where
        I: IntoIterator<Item = OccupationCategory>,
    {
        FilterState {
            occupations: categories.into_iter().collect(),
            ..self.clone()
        }
    }

    pub fn with_years(&self, years: YearRange) -> Self {
        FilterState {
            years,
            ..self.clone()
        }
    }

    /// Back to defaults, keeping the current year window
    pub fn reset(&self) -> Self {
        FilterState::new(self.years)
    }
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let genders: Vec<&str> = self.genders.iter().map(String::as_str).collect();
        let occupations: Vec<&str> = self.occupations.iter().map(|c| c.as_str()).collect();
        write!(
            f,
            "region={} genders=[{}] occupations=[{}] years={}",
            self.region.as_deref().unwrap_or("*"),
            genders.join(","),
            occupations.join(","),
            self.years
        )
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Single O(n) scan; result borrows from `records`, preserving order.
pub fn apply_filter<'a>(records: &'a [Record], state: &FilterState) -> Vec<&'a Record> {
    records.iter().filter(|r| state.matches(r)).collect()
}

/// Apply predicates one after another in the given order.
pub fn apply_predicates<'a>(records: &'a [Record], predicates: &[Predicate]) -> Vec<&'a Record> {
    let mut current: Vec<&Record> = records.iter().collect();
    for predicate in predicates {
        current.retain(|r| predicate.matches(r));
    }
    current
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DeathCategory;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    fn random_records(rng: &mut StdRng, n: usize) -> Vec<Record> {
        let countries = ["France", "Japan", "Peru"];
        let genders = ["Male", "Female", "Non-binary"];
        (0..n)
            .map(|i| {
                let birth = rng.random_range(0..1900);
                let death = birth + rng.random_range(1..100);
                let occupation = if rng.random_bool(0.9) {
                    Some(OccupationCategory::ALL[rng.random_range(0..6)])
                } else {
                    None
                };
                Record::new(&format!("Q{}", i), &format!("Person {}", i))
                    .with_origin(
                        genders[rng.random_range(0..genders.len())],
                        countries[rng.random_range(0..countries.len())],
                    )
                    .with_categories(occupation, Some(DeathCategory::NaturalCauses))
                    .with_lifespan(birth, death)
            })
            .collect()
    }

    fn ids(records: &[&Record]) -> HashSet<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_year_range_validation() {
        assert!(YearRange::new(0, 2024).is_ok());
        assert_eq!(
            YearRange::new(1900, 1800),
            Err(FilterError::Reversed { from: 1900, to: 1800 })
        );
        assert_eq!(YearRange::new(-1, 10), Err(FilterError::OutOfBounds(-1)));
        assert_eq!(YearRange::new(10, 2025), Err(FilterError::OutOfBounds(2025)));
    }

    #[test]
    fn test_year_range_deserialize_validates() {
        let ok: YearRange = serde_json::from_str("[100, 200]").unwrap();
        assert_eq!((ok.from(), ok.to()), (100, 200));
        assert!(serde_json::from_str::<YearRange>("[200, 100]").is_err());
    }

    #[test]
    fn test_year_predicate_is_inclusive() {
        let range = YearRange::new(1800, 1900).unwrap();
        assert!(range.contains_lifespan(Some(1800), Some(1900)));
        assert!(!range.contains_lifespan(Some(1799), Some(1850)));
        assert!(!range.contains_lifespan(Some(1850), Some(1901)));
        assert!(!range.contains_lifespan(None, Some(1850)));
    }

    #[test]
    fn test_shift_clamps() {
        let range = YearRange::new(2000, 2023).unwrap().shifted(5);
        assert_eq!((range.from(), range.to()), (2005, 2024));
        assert!(range.at_upper_bound());
    }

    #[test]
    fn test_empty_selection_passes_everything() {
        let mut rng = StdRng::seed_from_u64(1);
        let records = random_records(&mut rng, 200);
        let state = FilterState::new(YearRange::new(0, 2024).unwrap());
        assert_eq!(apply_filter(&records, &state).len(), records.len());
    }

    #[test]
    fn test_unknown_occupation_fails_occupation_filter() {
        let record = Record::new("Q1", "X").with_lifespan(100, 150);
        let state = FilterState::default().toggle_occupation(OccupationCategory::Art);
        assert!(!state.matches(&record));
        assert!(FilterState::default().matches(&record));
    }

    #[test]
    fn test_predicate_order_does_not_matter() {
        let mut rng = StdRng::seed_from_u64(2);
        let records = random_records(&mut rng, 500);
        let state = FilterState::new(YearRange::new(200, 1500).unwrap())
            .select_region("Japan")
            .with_genders(["Male", "Female"])
            .with_occupations([OccupationCategory::Art, OccupationCategory::Science]);

        let expected = ids(&apply_filter(&records, &state));
        let mut predicates = state.predicates();
        assert_eq!(predicates.len(), 4);

        for _ in 0..24 {
            predicates.shuffle(&mut rng);
            assert_eq!(ids(&apply_predicates(&records, &predicates)), expected);
        }
    }

    #[test]
    fn test_filter_is_idempotent_and_non_mutating() {
        let mut rng = StdRng::seed_from_u64(3);
        let records = random_records(&mut rng, 300);
        let snapshot = records.clone();
        let state = FilterState::default().toggle_gender("Female");

        let first = apply_filter(&records, &state);
        let second = apply_filter(&records, &state);
        assert_eq!(first, second);
        assert_eq!(records, snapshot);
    }

    #[test]
    fn test_region_click_toggles() {
        let state = FilterState::default().select_region("Peru");
        assert_eq!(state.region.as_deref(), Some("Peru"));
        let state = state.select_region("Japan");
        assert_eq!(state.region.as_deref(), Some("Japan"));
        assert_eq!(state.select_region("Japan").region, None);
    }

    #[test]
    fn test_toggles_and_reset() {
        let state = FilterState::default()
            .toggle_gender("Male")
            .toggle_occupation(OccupationCategory::Sports);
        assert!(state.genders.contains("Male"));
        let state = state.toggle_gender("Male");
        assert!(state.genders.is_empty());

        let reset = state.select_region("Peru").reset();
        assert_eq!(reset, FilterState::new(state.years));
    }
}
