use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::{ContainerStats, Observation};
use crate::error::{StorageError, StorageResult};
use crate::sampling::{WindowSampler, validate_parameters};

use super::percentiles::{PercentileReport, build_report, validate_percentiles};

pub const DEFAULT_RECENT: usize = 60;
pub const DEFAULT_SAMPLES: usize = 10;
pub const DEFAULT_WINDOW: usize = 100;

/// Sizing shared by every per-container cache of one storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Capacity of the recent-observation ring.
    pub recent: usize,
    /// Number of sampler slots (k).
    pub samples: usize,
    /// Sampler window, in observations (W).
    pub window: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            recent: DEFAULT_RECENT,
            samples: DEFAULT_SAMPLES,
            window: DEFAULT_WINDOW,
        }
    }
}

impl CacheSettings {
    /// Checks the settings before any cache is built from them.
    ///
    /// # Errors
    ///
    /// Returns an error when a size is zero or the sample count exceeds the
    /// window.
    pub fn validate(&self) -> StorageResult<()> {
        self.validate_recent()?;
        validate_parameters(self.samples, self.window)?;
        Ok(())
    }

    const fn validate_recent(&self) -> StorageResult<()> {
        if self.recent == 0 {
            return Err(StorageError::InvalidSettings {
                message: "recent capacity must be >= 1",
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
struct CacheState {
    recent: VecDeque<Observation>,
    sampler: WindowSampler<Observation>,
    last_sequence: u64,
}

/// Query-facing store for one container's observations.
///
/// Writers are expected to be serialized upstream (one collector per
/// container); readers may run concurrently with each other and with the
/// writer, and always see a fully applied `add`.
#[derive(Debug)]
pub struct StatsRetentionCache {
    container_id: Arc<str>,
    settings: CacheSettings,
    state: RwLock<CacheState>,
}

impl StatsRetentionCache {
    /// # Errors
    ///
    /// Returns an error when the settings are invalid.
    pub fn new(container_id: &str, settings: CacheSettings) -> StorageResult<Self> {
        settings.validate_recent()?;
        let sampler = WindowSampler::new(settings.samples, settings.window)?;
        Ok(Self::with_sampler(container_id, settings, sampler))
    }

    /// Same as [`StatsRetentionCache::new`] with a reproducible sampler.
    ///
    /// # Errors
    ///
    /// Returns an error when the settings are invalid.
    pub fn with_seed(container_id: &str, settings: CacheSettings, seed: u64) -> StorageResult<Self> {
        settings.validate_recent()?;
        let sampler = WindowSampler::with_seed(settings.samples, settings.window, seed)?;
        Ok(Self::with_sampler(container_id, settings, sampler))
    }

    fn with_sampler(
        container_id: &str,
        settings: CacheSettings,
        sampler: WindowSampler<Observation>,
    ) -> Self {
        Self {
            container_id: Arc::from(container_id),
            settings,
            state: RwLock::new(CacheState {
                recent: VecDeque::with_capacity(settings.recent),
                sampler,
                last_sequence: 0,
            }),
        }
    }

    #[must_use]
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    #[must_use]
    pub const fn settings(&self) -> CacheSettings {
        self.settings
    }

    /// Stamps `stats` with the next sequence number and retains it.
    ///
    /// # Errors
    ///
    /// Returns an error when `stats` is older than the newest retained
    /// observation.
    pub fn add(&self, stats: ContainerStats) -> StorageResult<Observation> {
        let mut state = self.state.write();
        if let Some(newest) = state.recent.back() {
            if stats.timestamp < newest.timestamp() {
                return Err(StorageError::OutOfOrderTimestamp {
                    container: self.container_id.to_string(),
                    newest: newest.timestamp().to_rfc3339(),
                    actual: stats.timestamp.to_rfc3339(),
                });
            }
        }

        let sequence = state.last_sequence.saturating_add(1);
        let observation = Observation::new(Arc::clone(&self.container_id), sequence, stats);
        state.sampler.add(observation.clone())?;
        state.last_sequence = sequence;
        if state.recent.len() >= self.settings.recent {
            state.recent.pop_front();
        }
        state.recent.push_back(observation.clone());
        Ok(observation)
    }

    /// The most recent observations, oldest first. `None` returns everything
    /// the ring still holds.
    #[must_use]
    pub fn recent_stats(&self, limit: Option<usize>) -> Vec<Observation> {
        let state = self.state.read();
        let held = state.recent.len();
        let count = limit.map_or(held, |limit| limit.min(held));
        state
            .recent
            .iter()
            .skip(held.saturating_sub(count))
            .cloned()
            .collect()
    }

    /// Up to `count` observations from the window sampler.
    #[must_use]
    pub fn samples(&self, count: usize) -> Vec<Observation> {
        let state = self.state.read();
        let mut samples = state.sampler.snapshot();
        samples.truncate(count);
        samples
    }

    /// Exact percentiles over the recent ring.
    ///
    /// # Errors
    ///
    /// Returns an error when a percentile exceeds 100 or nothing is retained.
    pub fn percentiles(&self, cpu: &[u8], memory: &[u8]) -> StorageResult<PercentileReport> {
        validate_percentiles(cpu)?;
        validate_percentiles(memory)?;
        let state = self.state.read();
        if state.recent.is_empty() {
            return Err(StorageError::InsufficientData {
                container: self.container_id.to_string(),
            });
        }
        Ok(build_report(state.recent.iter(), cpu, memory))
    }

    /// Observations currently held in the recent ring.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().recent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
