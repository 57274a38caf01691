// 🗂️ Dataset - biographical records + region index
// Loaded once at startup, never mutated afterwards (only filtered)

use crate::regions::{load_regions, Region};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Fixed link template, keyed by the record's Wikidata id
pub const LINK_TEMPLATE: &str = "https://www.wikidata.org/wiki/Special:GoToLinkedPage/enwiki/";

// ============================================================================
// CLOSED CATEGORIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OccupationCategory {
    Art,
    Politics,
    Sports,
    Science,
    Business,
    Social,
}

impl OccupationCategory {
    /// Display order on both the boxplot x-axis and the heatmap columns
    pub const ALL: [OccupationCategory; 6] = [
        OccupationCategory::Art,
        OccupationCategory::Politics,
        OccupationCategory::Sports,
        OccupationCategory::Science,
        OccupationCategory::Business,
        OccupationCategory::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OccupationCategory::Art => "Art",
            OccupationCategory::Politics => "Politics",
            OccupationCategory::Sports => "Sports",
            OccupationCategory::Science => "Science",
            OccupationCategory::Business => "Business",
            OccupationCategory::Social => "Social",
        }
    }

    /// Position in [`OccupationCategory::ALL`]
    pub fn index(&self) -> usize {
        match self {
            OccupationCategory::Art => 0,
            OccupationCategory::Politics => 1,
            OccupationCategory::Sports => 2,
            OccupationCategory::Science => 3,
            OccupationCategory::Business => 4,
            OccupationCategory::Social => 5,
        }
    }

    /// Case-insensitive label lookup; `None` for anything outside the closed set
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for OccupationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeathCategory {
    NaturalCauses,
    UnintentionalCauses,
    SuicideAndSelfInflicted,
    HomicideAndViolence,
}

impl DeathCategory {
    /// Heatmap row order
    pub const ALL: [DeathCategory; 4] = [
        DeathCategory::NaturalCauses,
        DeathCategory::UnintentionalCauses,
        DeathCategory::SuicideAndSelfInflicted,
        DeathCategory::HomicideAndViolence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeathCategory::NaturalCauses => "Natural Causes",
            DeathCategory::UnintentionalCauses => "Unintentional Causes",
            DeathCategory::SuicideAndSelfInflicted => "Suicide and Self-Inflicted",
            DeathCategory::HomicideAndViolence => "Homicide and Violence",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            DeathCategory::NaturalCauses => 0,
            DeathCategory::UnintentionalCauses => 1,
            DeathCategory::SuicideAndSelfInflicted => 2,
            DeathCategory::HomicideAndViolence => 3,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for DeathCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// One biographical entry.
///
/// Numeric fields are `None` when the source cell was malformed; such a
/// record stays in the dataset but drops out of that field's population
/// (e.g. an unknown death year never passes the year filter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub name: String,
    pub description: String,
    pub gender: String,
    pub country: String,
    pub occupation: String,
    pub occupation_category: Option<OccupationCategory>,
    pub manner_of_death: String,
    pub death_category: Option<DeathCategory>,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub age_of_death: Option<i32>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Record {
    /// Create a record with only identity fields set
    pub fn new(id: &str, name: &str) -> Self {
        Record {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            gender: String::new(),
            country: String::new(),
            occupation: String::new(),
            occupation_category: None,
            manner_of_death: String::new(),
            death_category: None,
            birth_year: None,
            death_year: None,
            age_of_death: None,
            lat: None,
            lng: None,
        }
    }

    /// Builder pattern: gender + country
    pub fn with_origin(mut self, gender: &str, country: &str) -> Self {
        self.gender = gender.to_string();
        self.country = country.to_string();
        self
    }

    /// Builder pattern: occupation and manner-of-death categories
    pub fn with_categories(
        mut self,
        occupation: Option<OccupationCategory>,
        death: Option<DeathCategory>,
    ) -> Self {
        self.occupation_category = occupation;
        self.death_category = death;
        self
    }

    /// Builder pattern: lifespan; age of death is derived as death - birth
    pub fn with_lifespan(mut self, birth_year: i32, death_year: i32) -> Self {
        self.birth_year = Some(birth_year);
        self.death_year = Some(death_year);
        self.age_of_death = Some(death_year - birth_year);
        self
    }

    /// External page for this record
    pub fn link(&self) -> String {
        format!("{}{}", LINK_TEMPLATE, self.id)
    }

    fn fmt_year(year: Option<i32>) -> String {
        year.map(|y| y.to_string()).unwrap_or_else(|| "?".to_string())
    }

    /// Hover text shared by the globe points and boxplot points
    pub fn tooltip(&self) -> String {
        let occupation_category = self
            .occupation_category
            .map(|c| c.as_str())
            .unwrap_or("Unknown");

        format!(
            "Name: {}\nDescription: {}\nGender: {}\nYears: {}-{} (aged {})\nCountry: {}\nOccupation: {}: {}\nManner of Death: {}",
            self.name,
            self.description,
            self.gender,
            Self::fmt_year(self.birth_year),
            Self::fmt_year(self.death_year),
            Self::fmt_year(self.age_of_death),
            self.country,
            occupation_category,
            self.occupation,
            self.manner_of_death,
        )
    }
}

// ============================================================================
// CSV LOADING
// ============================================================================

/// Raw CSV row; every cell is text until coerced.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Short description", default)]
    description: String,
    #[serde(rename = "Gender", default)]
    gender: String,
    #[serde(rename = "Country", default)]
    country: String,
    #[serde(rename = "Occupation", default)]
    occupation: String,
    #[serde(rename = "Occupation category", default)]
    occupation_category: String,
    #[serde(rename = "Manner of death", default)]
    manner_of_death: String,
    #[serde(rename = "Manner of death category", default)]
    death_category: String,
    #[serde(rename = "Birth year", default)]
    birth_year: String,
    #[serde(rename = "Death year", default)]
    death_year: String,
    #[serde(rename = "Age of death", default)]
    age_of_death: String,
    #[serde(default)]
    lat: String,
    #[serde(default)]
    lng: String,
}

/// What the loader had to coerce to "unknown"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rows: usize,
    pub bad_birth_year: usize,
    pub bad_death_year: usize,
    pub bad_age_of_death: usize,
    pub bad_coordinates: usize,
    pub unknown_occupation_category: usize,
    pub unknown_death_category: usize,
    /// Rows whose age of death disagrees with death - birth (kept as-is)
    pub age_mismatch: usize,
}

impl LoadReport {
    pub fn coerced_fields(&self) -> usize {
        self.bad_birth_year + self.bad_death_year + self.bad_age_of_death + self.bad_coordinates
    }
}

/// Lenient integer parse: accepts "1850" and "1850.0"; anything else is unknown.
pub fn parse_year(cell: &str) -> Option<i32> {
    let cell = cell.trim();
    if let Ok(v) = cell.parse::<i32>() {
        return Some(v);
    }
    cell.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() < i32::MAX as f64)
        .map(|v| v.trunc() as i32)
}

pub fn parse_coordinate(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl RawRecord {
    fn into_record(self, report: &mut LoadReport) -> Record {
        let birth_year = parse_year(&self.birth_year);
        let death_year = parse_year(&self.death_year);
        let age_of_death = parse_year(&self.age_of_death);
        let lat = parse_coordinate(&self.lat);
        let lng = parse_coordinate(&self.lng);
        let occupation_category = OccupationCategory::from_label(&self.occupation_category);
        let death_category = DeathCategory::from_label(&self.death_category);

        if birth_year.is_none() {
            report.bad_birth_year += 1;
        }
        if death_year.is_none() {
            report.bad_death_year += 1;
        }
        if age_of_death.is_none() {
            report.bad_age_of_death += 1;
        }
        if lat.is_none() || lng.is_none() {
            report.bad_coordinates += 1;
        }
        if occupation_category.is_none() {
            report.unknown_occupation_category += 1;
        }
        if death_category.is_none() {
            report.unknown_death_category += 1;
        }
        if let (Some(b), Some(d), Some(a)) = (birth_year, death_year, age_of_death) {
            if d - b != a {
                report.age_mismatch += 1;
                debug!(id = %self.id, birth = b, death = d, age = a, "age of death disagrees with lifespan");
            }
        }

        Record {
            id: self.id,
            name: self.name,
            description: self.description,
            gender: self.gender,
            country: self.country,
            occupation: self.occupation,
            occupation_category,
            manner_of_death: self.manner_of_death,
            death_category,
            birth_year,
            death_year,
            age_of_death,
            lat,
            lng,
        }
    }
}

/// Parse records from any CSV source with a header row.
pub fn read_records<R: Read>(reader: R) -> Result<(Vec<Record>, LoadReport)> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for (line, result) in rdr.deserialize::<RawRecord>().enumerate() {
        let raw = result.with_context(|| format!("Failed to deserialize record on row {}", line + 2))?;
        report.rows += 1;
        records.push(raw.into_record(&mut report));
    }

    if report.coerced_fields() > 0 {
        warn!(
            birth = report.bad_birth_year,
            death = report.bad_death_year,
            age = report.bad_age_of_death,
            coordinates = report.bad_coordinates,
            "malformed numeric fields coerced to unknown"
        );
    }

    Ok((records, report))
}

pub fn load_records(csv_path: &Path) -> Result<(Vec<Record>, LoadReport)> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open records CSV {}", csv_path.display()))?;
    read_records(file)
}

// ============================================================================
// DATASET
// ============================================================================

/// Both foundational datasets, joined on region name.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    regions: Vec<Region>,
    region_index: HashMap<String, usize>,
    record_index: HashMap<String, usize>,
}

impl Dataset {
    pub fn new(records: Vec<Record>, regions: Vec<Region>) -> Self {
        let region_index = regions
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();
        let record_index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();

        Dataset {
            records,
            regions,
            region_index,
            record_index,
        }
    }

    /// Load the record CSV and region GeoJSON from disk
    pub fn load(records_path: &Path, regions_path: &Path) -> Result<(Self, LoadReport)> {
        let regions = load_regions(regions_path)?;
        let (records, report) = load_records(records_path)?;

        info!(
            records = records.len(),
            regions = regions.len(),
            "dataset loaded"
        );

        Ok((Dataset::new(records, regions), report))
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.region_index.get(name).map(|&i| &self.regions[i])
    }

    pub fn record(&self, id: &str) -> Option<&Record> {
        self.record_index.get(id).map(|&i| &self.records[i])
    }

    /// Area of a record's country; 0 when the country has no polygon
    pub fn region_area(&self, name: &str) -> f64 {
        self.region(name).map(|r| r.area).unwrap_or(0.0)
    }

    /// Distinct gender values present in the records, sorted
    pub fn genders(&self) -> Vec<String> {
        let mut genders: Vec<String> = self
            .records
            .iter()
            .map(|r| r.gender.clone())
            .filter(|g| !g.is_empty())
            .collect();
        genders.sort();
        genders.dedup();
        genders
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Id,Name,Short description,Gender,Country,Occupation,Death year,Birth year,Manner of death,Age of death,Occupation category,Manner of death category,lat,lng
Q7259,Ada Lovelace,English mathematician,Female,United Kingdom,Mathematician,1852,1815,natural causes,37,Science,Natural Causes,55.0,-3.0
Q7251,Alan Turing,English computer scientist,Male,United Kingdom,Computer scientist,1954,1912,suicide,41,Science,Suicide and Self-Inflicted,55.0,-3.0
Q1,Nobody,Unknown person,Male,Atlantis,Sailor,unknown,1800.0,,abc,Seafaring,Lost at sea,,
";

    #[test]
    fn test_read_records_parses_typed_fields() {
        let (records, report) = read_records(CSV.as_bytes()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(report.rows, 3);

        let ada = &records[0];
        assert_eq!(ada.id, "Q7259");
        assert_eq!(ada.occupation_category, Some(OccupationCategory::Science));
        assert_eq!(ada.death_category, Some(DeathCategory::NaturalCauses));
        assert_eq!(ada.birth_year, Some(1815));
        assert_eq!(ada.death_year, Some(1852));
        assert_eq!(ada.age_of_death, Some(37));
        assert_eq!(ada.lat, Some(55.0));
    }

    #[test]
    fn test_malformed_numerics_become_unknown() {
        let (records, report) = read_records(CSV.as_bytes()).unwrap();
        let nobody = &records[2];

        assert_eq!(nobody.birth_year, Some(1800));
        assert_eq!(nobody.death_year, None);
        assert_eq!(nobody.age_of_death, None);
        assert_eq!(nobody.lat, None);
        assert_eq!(nobody.occupation_category, None);
        assert_eq!(nobody.death_category, None);

        assert_eq!(report.bad_death_year, 1);
        assert_eq!(report.bad_age_of_death, 1);
        assert_eq!(report.bad_coordinates, 1);
        assert_eq!(report.unknown_occupation_category, 1);
        assert_eq!(report.unknown_death_category, 1);
    }

    #[test]
    fn test_age_mismatch_is_counted_not_corrected() {
        let csv = "\
Id,Name,Birth year,Death year,Age of death
Q2,Someone,1900,1950,49
";
        let (records, report) = read_records(csv.as_bytes()).unwrap();
        assert_eq!(records[0].age_of_death, Some(49));
        assert_eq!(report.age_mismatch, 1);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(OccupationCategory::from_label(" politics "), Some(OccupationCategory::Politics));
        assert_eq!(OccupationCategory::from_label("Farming"), None);
        assert_eq!(
            DeathCategory::from_label("Homicide and Violence"),
            Some(DeathCategory::HomicideAndViolence)
        );
        for (i, c) in OccupationCategory::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
        for (i, c) in DeathCategory::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn test_link_and_tooltip() {
        let record = Record::new("Q7259", "Ada Lovelace")
            .with_origin("Female", "United Kingdom")
            .with_categories(Some(OccupationCategory::Science), None)
            .with_lifespan(1815, 1852);

        assert_eq!(
            record.link(),
            "https://www.wikidata.org/wiki/Special:GoToLinkedPage/enwiki/Q7259"
        );
        let tooltip = record.tooltip();
        assert!(tooltip.contains("Name: Ada Lovelace"));
        assert!(tooltip.contains("Years: 1815-1852 (aged 37)"));
        assert!(tooltip.contains("Occupation: Science: "));
    }

    #[test]
    fn test_dataset_lookups() {
        let (records, _) = read_records(CSV.as_bytes()).unwrap();
        let dataset = Dataset::new(records, vec![]);

        assert_eq!(dataset.record("Q7251").map(|r| r.name.as_str()), Some("Alan Turing"));
        assert!(dataset.record("missing").is_none());
        assert_eq!(dataset.region_area("United Kingdom"), 0.0);
        assert_eq!(dataset.genders(), vec!["Female".to_string(), "Male".to_string()]);
    }
}
