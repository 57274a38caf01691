// 🔄 View Synchronization Core
// Owns the current FilterState and reconciles keyed scene elements on every change
//
// Redraw protocol: each store is fully reconciled against the latest views
// (enter new keys, update changed values, exit stale keys). Re-running a
// refresh with the same filter is a no-op on every store.

use crate::dataset::{Dataset, DeathCategory, OccupationCategory};
use crate::filter::FilterState;
use crate::quantile::FiveNumberSummary;
use crate::views::{
    compute_views_with, BoxplotPoint, CategorySummary, GlobePoint, HeatmapCell, RegionShade,
    ViewOptions, Views,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

// ============================================================================
// RECONCILER
// ============================================================================

/// What one reconciliation pass did to a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Delta {
    pub entered: usize,
    pub updated: usize,
    pub exited: usize,
    pub unchanged: usize,
}

impl Delta {
    pub fn is_noop(&self) -> bool {
        self.entered == 0 && self.updated == 0 && self.exited == 0
    }
}

/// Keyed element store with enter/update/exit semantics.
#[derive(Debug, Clone)]
pub struct Reconciler<K, V> {
    elements: BTreeMap<K, V>,
}

impl<K: Ord + Clone, V: PartialEq> Reconciler<K, V> {
    pub fn new() -> Self {
        Reconciler {
            elements: BTreeMap::new(),
        }
    }

    /// Replace the store's contents with `data`, keyed by stable identity.
    /// Duplicate keys in `data` keep the last value.
    pub fn reconcile<I>(&mut self, data: I) -> Delta
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut next: BTreeMap<K, V> = BTreeMap::new();
        let mut delta = Delta::default();

        for (key, value) in data {
            next.insert(key, value);
        }

        for (key, value) in &next {
            match self.elements.get(key) {
                None => delta.entered += 1,
                Some(old) if old != value => delta.updated += 1,
                Some(_) => delta.unchanged += 1,
            }
        }
        delta.exited = self
            .elements
            .keys()
            .filter(|k| !next.contains_key(*k))
            .count();

        self.elements = next;
        delta
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.elements.get(key)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.elements.iter()
    }
}

impl<K: Ord + Clone, V: PartialEq> Default for Reconciler<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SCENE
// ============================================================================

/// Every element currently shown on the three surfaces
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub regions: Reconciler<String, RegionShade>,
    pub globe_points: Reconciler<String, GlobePoint>,
    pub boxes: Reconciler<OccupationCategory, Option<FiveNumberSummary>>,
    pub box_points: Reconciler<String, BoxplotPoint>,
    pub cells: Reconciler<(OccupationCategory, DeathCategory), HeatmapCell>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub matched: usize,
    pub regions: Delta,
    pub globe_points: Delta,
    pub boxes: Delta,
    pub box_points: Delta,
    pub cells: Delta,
}

impl RefreshReport {
    pub fn is_noop(&self) -> bool {
        [
            self.regions,
            self.globe_points,
            self.boxes,
            self.box_points,
            self.cells,
        ]
        .iter()
        .all(Delta::is_noop)
    }
}

impl Scene {
    fn apply(&mut self, views: &Views) -> RefreshReport {
        RefreshReport {
            matched: views.matched,
            regions: self
                .regions
                .reconcile(views.globe.regions.iter().map(|r| (r.name.clone(), r.clone()))),
            globe_points: self
                .globe_points
                .reconcile(views.globe.points.iter().map(|p| (p.id.clone(), p.clone()))),
            boxes: self.boxes.reconcile(
                views
                    .boxplot
                    .summaries
                    .iter()
                    .map(|s: &CategorySummary| (s.category, s.summary)),
            ),
            box_points: self
                .box_points
                .reconcile(views.boxplot.points.iter().map(|p| (p.id.clone(), p.clone()))),
            cells: self.cells.reconcile(
                views
                    .heatmap
                    .cells
                    .iter()
                    .map(|c: &HeatmapCell| ((c.occupation, c.death), c.clone())),
            ),
        }
    }
}

// ============================================================================
// CAMERA
// ============================================================================

/// Globe point of view
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Camera {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
}

impl Camera {
    /// Below this altitude a second click on the selected region zooms out
    pub const ZOOM_THRESHOLD: f64 = 1.5;
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            lat: 31.53,
            lng: 26.65,
            altitude: 2.5,
        }
    }
}

// ============================================================================
// DASHBOARD
// ============================================================================

/// The UI-owned mutable side: current filter, last views, scene.
pub struct Dashboard {
    dataset: Dataset,
    options: ViewOptions,
    filter: FilterState,
    views: Views,
    scene: Scene,
    camera: Camera,
}

impl Dashboard {
    pub fn new(dataset: Dataset, filter: FilterState, options: ViewOptions) -> Self {
        let mut dashboard = Dashboard {
            dataset,
            options,
            filter,
            views: Views::default(),
            scene: Scene::default(),
            camera: Camera::default(),
        };
        dashboard.refresh();
        dashboard
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn views(&self) -> &Views {
        &self.views
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Swap in a new filter and redraw all three surfaces from one snapshot
    pub fn set_filter(&mut self, filter: FilterState) -> RefreshReport {
        self.filter = filter;
        self.refresh()
    }

    /// Recompute views for the current filter and reconcile the scene
    pub fn refresh(&mut self) -> RefreshReport {
        self.views = compute_views_with(&self.dataset, &self.filter, &self.options);
        let report = self.scene.apply(&self.views);

        debug!(
            filter = %self.filter,
            matched = report.matched,
            regions_changed = report.regions.updated,
            points_entered = report.box_points.entered,
            points_exited = report.box_points.exited,
            "refresh"
        );

        report
    }

    /// Polygon click: select the region and fly to it, or zoom back out when
    /// the already-selected region is clicked while close in.
    pub fn click_region(&mut self, name: &str) -> RefreshReport {
        let Some(region) = self.dataset.region(name) else {
            debug!(region = name, "click on unknown region ignored");
            return self.refresh();
        };
        let (lat, lng, focus) = (region.lat, region.lng, region.focus_altitude());

        let already_selected = self.filter.region.as_deref() == Some(name);
        if already_selected && self.camera.altitude < Camera::ZOOM_THRESHOLD {
            self.camera.altitude = Camera::ZOOM_THRESHOLD + 0.5;
            let next = self.filter.clear_region();
            self.set_filter(next)
        } else {
            self.camera = Camera {
                lat,
                lng,
                altitude: focus,
            };
            let next = FilterState {
                region: Some(name.to_string()),
                ..self.filter.clone()
            };
            self.set_filter(next)
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::YearRange;
    use crate::views::tests::fixture;

    fn all_years() -> FilterState {
        FilterState::new(YearRange::new(0, 2024).unwrap())
    }

    #[test]
    fn test_reconciler_enter_update_exit() {
        let mut store: Reconciler<&str, i32> = Reconciler::new();

        let delta = store.reconcile([("a", 1), ("b", 2)]);
        assert_eq!(delta.entered, 2);

        let delta = store.reconcile([("b", 3), ("c", 4)]);
        assert_eq!(
            delta,
            Delta {
                entered: 1,
                updated: 1,
                exited: 1,
                unchanged: 0
            }
        );
        assert_eq!(store.get(&"b"), Some(&3));
        assert!(store.get(&"a").is_none());

        assert!(store.reconcile([("b", 3), ("c", 4)]).is_noop());
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let mut dashboard = Dashboard::new(fixture(), all_years(), ViewOptions::default());
        let again = dashboard.refresh();
        assert!(again.is_noop(), "{:?}", again);
        assert_eq!(dashboard.scene().cells.len(), 24);
        assert_eq!(dashboard.scene().boxes.len(), 6);
    }

    #[test]
    fn test_scene_tracks_latest_filter() {
        let mut dashboard = Dashboard::new(fixture(), all_years(), ViewOptions::default());
        assert_eq!(dashboard.scene().box_points.len(), 5);

        let next = dashboard.filter().toggle_gender("Female");
        let report = dashboard.set_filter(next);
        assert_eq!(report.matched, 2);
        assert_eq!(report.box_points.exited, 3);
        assert_eq!(dashboard.scene().box_points.len(), 2);

        // All three surfaces reflect the same snapshot
        assert_eq!(dashboard.views().matched, 2);
        assert_eq!(dashboard.views().heatmap.total, 2);
        assert_eq!(dashboard.views().globe.rank_of("France"), Some(1));
        assert_eq!(dashboard.views().globe.rank_of("Japan"), None);
    }

    #[test]
    fn test_click_region_selects_then_zooms_out() {
        let mut dashboard = Dashboard::new(fixture(), all_years(), ViewOptions::default());

        dashboard.click_region("Japan");
        assert_eq!(dashboard.filter().region.as_deref(), Some("Japan"));
        assert!(dashboard.camera().altitude < Camera::ZOOM_THRESHOLD);
        assert_eq!(dashboard.scene().globe_points.len(), 2);

        dashboard.click_region("Japan");
        assert_eq!(dashboard.filter().region, None);
        assert_eq!(dashboard.camera().altitude, 2.0);
        assert!(dashboard.scene().globe_points.is_empty());
    }

    #[test]
    fn test_click_unknown_region_keeps_state() {
        let mut dashboard = Dashboard::new(fixture(), all_years(), ViewOptions::default());
        let before = dashboard.filter().clone();
        assert!(dashboard.click_region("Atlantis").is_noop());
        assert_eq!(dashboard.filter(), &before);
    }
}
