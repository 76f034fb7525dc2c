//! Per-container retention: a recent-observation ring plus a window sampler.
mod percentiles;
mod retention;


pub use percentiles::{PercentileReport, PercentileValue, Percentiles};
pub use retention::{
    CacheSettings, DEFAULT_RECENT, DEFAULT_SAMPLES, DEFAULT_WINDOW, StatsRetentionCache,
};
