// 🧭 Derived Views - globe, boxplot and heatmap from one filtered snapshot
//
// compute_views is pure: same dataset + same FilterState → same Views.
// Adapters (TUI, HTTP) only ever see these structs.

use crate::dataset::{Dataset, DeathCategory, OccupationCategory, Record};
use crate::filter::{apply_filter, FilterState};
use crate::jitter::random_from_string;
use crate::palette::{self, Rgb};
use crate::quantile::FiveNumberSummary;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// OPTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewOptions {
    /// Max jittered points on the boxplot
    pub point_limit: usize,
    /// Horizontal jitter span in boxplot units
    pub jitter_width: f64,
    /// Length of the ranked side list
    pub top_regions: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        ViewOptions {
            point_limit: 1000,
            jitter_width: 10.0,
            top_regions: 10,
        }
    }
}

// ============================================================================
// GLOBE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRegion {
    pub rank: usize,
    pub name: String,
    pub count: usize,
}

/// Per-polygon styling; one entry for every region in the dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionShade {
    pub name: String,
    /// `None` = unranked (no matching records)
    pub rank: Option<usize>,
    pub count: usize,
    pub selected: bool,
    pub cap_color: Rgb,
    pub label_size: f64,
}

impl RegionShade {
    pub fn cap_color_when(&self, hovered: Option<&str>) -> Rgb {
        if self.selected {
            palette::LIGHT_GRAY
        } else if hovered == Some(self.name.as_str()) {
            palette::GOLD
        } else {
            self.cap_color
        }
    }

    pub fn stroke_color_when(&self, hovered: Option<&str>) -> Rgb {
        if self.selected {
            palette::BLACK
        } else if hovered == Some(self.name.as_str()) {
            palette::GOLD
        } else {
            palette::STROKE
        }
    }

    pub fn altitude_when(&self, hovered: Option<&str>) -> f64 {
        if !self.selected && hovered == Some(self.name.as_str()) {
            0.011
        } else {
            0.01
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobePoint {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub radius: f64,
    pub category: Option<OccupationCategory>,
    pub color: Rgb,
    pub tooltip: String,
    pub link: String,
}

impl GlobePoint {
    pub fn color_when(&self, hovered: Option<&str>) -> Rgb {
        if hovered == Some(self.id.as_str()) {
            palette::GOLD
        } else {
            self.color
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobeView {
    pub ranks: BTreeMap<String, usize>,
    pub top_regions: Vec<RankedRegion>,
    pub regions: Vec<RegionShade>,
    /// Only populated while a region is selected
    pub points: Vec<GlobePoint>,
}

impl GlobeView {
    pub fn rank_of(&self, region: &str) -> Option<usize> {
        self.ranks.get(region).copied()
    }
}

/// Count per region, sorted by count desc then name asc, ranked 1..n.
pub fn rank_regions(records: &[&Record]) -> Vec<RankedRegion> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        if record.country.is_empty() {
            continue;
        }
        *counts.entry(record.country.as_str()).or_insert(0) += 1;
    }

    let mut ordered: Vec<(&str, usize)> = counts.into_iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, (name, count))| RankedRegion {
            rank: i + 1,
            name: name.to_string(),
            count,
        })
        .collect()
}

fn point_radius(area: f64) -> f64 {
    0.08 + (area * (0.4 - 0.03)) / 3000.0
}

fn build_globe(
    dataset: &Dataset,
    filter: &FilterState,
    filtered: &[&Record],
    options: &ViewOptions,
) -> GlobeView {
    let ranked = rank_regions(filtered);
    let counts: HashMap<&str, usize> = ranked.iter().map(|r| (r.name.as_str(), r.count)).collect();
    let ranks: BTreeMap<String, usize> = ranked.iter().map(|r| (r.name.clone(), r.rank)).collect();

    let regions = dataset
        .regions()
        .iter()
        .map(|region| {
            let rank = ranks.get(&region.name).copied();
            let selected = filter.region.as_deref() == Some(region.name.as_str());
            let cap_color = match rank {
                _ if selected => palette::LIGHT_GRAY,
                Some(rank) => palette::rank_color(rank),
                None => palette::UNRANKED,
            };
            RegionShade {
                name: region.name.clone(),
                rank,
                count: counts.get(region.name.as_str()).copied().unwrap_or(0),
                selected,
                cap_color,
                label_size: region.label_size(),
            }
        })
        .collect();

    let points = if filter.region.is_some() {
        filtered
            .iter()
            .filter_map(|record| {
                let region = dataset.region(&record.country);
                let (lat, lng) = match (record.lat, record.lng) {
                    (Some(lat), Some(lng)) => (lat, lng),
                    _ => region.map(|r| (r.lat, r.lng))?,
                };
                Some(GlobePoint {
                    id: record.id.clone(),
                    name: record.name.clone(),
                    lat,
                    lng,
                    radius: point_radius(dataset.region_area(&record.country)),
                    category: record.occupation_category,
                    color: palette::occupation_color_or_fallback(record.occupation_category),
                    tooltip: record.tooltip(),
                    link: record.link(),
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    let top_regions = ranked.into_iter().take(options.top_regions).collect();

    GlobeView {
        ranks,
        top_regions,
        regions,
        points,
    }
}

// ============================================================================
// BOXPLOT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: OccupationCategory,
    /// `None` = no data for this category under the current filter
    pub summary: Option<FiveNumberSummary>,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxplotPoint {
    pub id: String,
    pub name: String,
    pub category: OccupationCategory,
    pub age: f64,
    /// Offset from the band center, in `[0, jitter_width)`
    pub jitter: f64,
    pub color: Rgb,
    pub tooltip: String,
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoxplotView {
    /// Always one entry per category, in `OccupationCategory::ALL` order
    pub summaries: Vec<CategorySummary>,
    pub points: Vec<BoxplotPoint>,
    /// More plottable records matched than `point_limit`
    pub truncated: bool,
}

impl BoxplotView {
    pub fn summary(&self, category: OccupationCategory) -> Option<&FiveNumberSummary> {
        self.summaries
            .iter()
            .find(|s| s.category == category)
            .and_then(|s| s.summary.as_ref())
    }
}

fn build_boxplot(filtered: &[&Record], options: &ViewOptions) -> BoxplotView {
    let mut ages: [Vec<f64>; 6] = Default::default();
    for record in filtered {
        if let (Some(category), Some(age)) = (record.occupation_category, record.age_of_death) {
            ages[category.index()].push(f64::from(age));
        }
    }

    let summaries = OccupationCategory::ALL
        .iter()
        .map(|&category| CategorySummary {
            category,
            summary: FiveNumberSummary::from_values(&ages[category.index()]),
            color: palette::occupation_color(category),
        })
        .collect();

    let mut plottable = filtered.iter().filter_map(|record| {
        let category = record.occupation_category?;
        let age = f64::from(record.age_of_death?);
        Some(BoxplotPoint {
            id: record.id.clone(),
            name: record.name.clone(),
            category,
            age,
            jitter: random_from_string(&record.name) * options.jitter_width,
            color: palette::age_color(age),
            tooltip: record.tooltip(),
            link: record.link(),
        })
    });

    let points: Vec<BoxplotPoint> = plottable.by_ref().take(options.point_limit).collect();
    let truncated = plottable.next().is_some();
    if truncated {
        tracing::debug!(limit = options.point_limit, "boxplot point limit reached");
    }

    BoxplotView {
        summaries,
        points,
        truncated,
    }
}

// ============================================================================
// HEATMAP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub occupation: OccupationCategory,
    pub death: DeathCategory,
    pub count: usize,
    /// Share of `HeatmapView::total`, 0 when the total is 0
    pub percent: f64,
    pub color: Rgb,
}

impl HeatmapCell {
    /// Whole-percent label, floored
    pub fn percent_label(&self) -> String {
        format!("{}%", self.percent.floor() as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupationTotal {
    pub occupation: OccupationCategory,
    pub count: usize,
    pub color: Rgb,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeatmapView {
    /// 24 cells, occupation-major
    pub cells: Vec<HeatmapCell>,
    pub occupation_totals: Vec<OccupationTotal>,
    /// Sum of all cells
    pub total: usize,
    /// Filtered records missing either category
    pub unclassified: usize,
}

impl HeatmapView {
    pub fn cell(&self, occupation: OccupationCategory, death: DeathCategory) -> Option<&HeatmapCell> {
        self.cells
            .get(occupation.index() * DeathCategory::ALL.len() + death.index())
    }
}

fn build_heatmap(filtered: &[&Record]) -> HeatmapView {
    let mut counts = [[0usize; 4]; 6];
    let mut totals = [0usize; 6];
    let mut unclassified = 0;

    for record in filtered {
        if let Some(occupation) = record.occupation_category {
            totals[occupation.index()] += 1;
        }
        match (record.occupation_category, record.death_category) {
            (Some(o), Some(d)) => counts[o.index()][d.index()] += 1,
            _ => unclassified += 1,
        }
    }

    let total: usize = counts.iter().flatten().sum();

    let cells = OccupationCategory::ALL
        .iter()
        .flat_map(|&occupation| {
            DeathCategory::ALL.iter().map(move |&death| {
                let count = counts[occupation.index()][death.index()];
                let percent = if total > 0 {
                    count as f64 / total as f64 * 100.0
                } else {
                    0.0
                };
                HeatmapCell {
                    occupation,
                    death,
                    count,
                    percent,
                    color: palette::share_color(percent),
                }
            })
        })
        .collect();

    let occupation_totals = OccupationCategory::ALL
        .iter()
        .map(|&occupation| OccupationTotal {
            occupation,
            count: totals[occupation.index()],
            color: palette::occupation_color(occupation),
        })
        .collect();

    HeatmapView {
        cells,
        occupation_totals,
        total,
        unclassified,
    }
}

// ============================================================================
// ALL VIEWS
// ============================================================================

/// The three projections of one filtered snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Views {
    pub filter: FilterState,
    /// Records passing every predicate
    pub matched: usize,
    pub globe: GlobeView,
    pub boxplot: BoxplotView,
    pub heatmap: HeatmapView,
}

pub fn compute_views(dataset: &Dataset, filter: &FilterState) -> Views {
    compute_views_with(dataset, filter, &ViewOptions::default())
}

pub fn compute_views_with(dataset: &Dataset, filter: &FilterState, options: &ViewOptions) -> Views {
    let filtered = apply_filter(dataset.records(), filter);

    Views {
        filter: filter.clone(),
        matched: filtered.len(),
        globe: build_globe(dataset, filter, &filtered, options),
        boxplot: build_boxplot(&filtered, options),
        heatmap: build_heatmap(&filtered),
    }
}

// ============================================================================
// TESTS
// ============================================================================
