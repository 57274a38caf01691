// Mortality Globe - Core Library
// Exposes the derivation layer for the terminal dashboard, the API server and tests

pub mod jitter;
pub mod quantile;
pub mod dataset;
pub mod regions;
pub mod filter;
pub mod palette;
pub mod views;
pub mod sync;
pub mod playback;
pub mod config;
pub mod logging;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use jitter::{random_from_string, string_hash, Lcg};
pub use quantile::{quantile, quickselect, FiveNumberSummary};
pub use dataset::{
    Dataset, DeathCategory, LoadReport, OccupationCategory, Record,
    load_records, read_records,
};
pub use regions::{Geometry, Region, load_regions, parse_regions};
pub use filter::{
    FilterError, FilterState, Predicate, YearRange,
    apply_filter, apply_predicates,
};
pub use palette::Rgb;
pub use views::{
    BoxplotView, GlobeView, HeatmapView, ViewOptions, Views,
    compute_views, compute_views_with,
};
pub use sync::{Camera, Dashboard, Delta, Reconciler, RefreshReport, Scene};
pub use playback::Playback;
pub use config::{AppConfig, ConfigError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
