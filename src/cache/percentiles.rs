use serde::Serialize;

use crate::domain::{ContainerStats, Observation};
use crate::error::{StorageError, StorageResult};

const NANOS_PER_MILLICORE_SECOND: u128 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PercentileValue {
    pub percentile: u8,
    pub value: u64,
}

/// Summary of one series. `present` is false when the series had no values,
/// in which case every number is zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Percentiles {
    pub present: bool,
    pub mean: u64,
    pub max: u64,
    pub values: Vec<PercentileValue>,
}

impl Percentiles {
    #[must_use]
    pub fn get(&self, percentile: u8) -> Option<u64> {
        self.values
            .iter()
            .find(|value| value.percentile == percentile)
            .map(|value| value.value)
    }

    fn from_values(mut values: Vec<u64>, requested: &[u8]) -> Self {
        values.sort_unstable();
        let Some(max) = values.last().copied() else {
            return Self {
                values: requested
                    .iter()
                    .map(|percentile| PercentileValue {
                        percentile: *percentile,
                        value: 0,
                    })
                    .collect(),
                ..Self::default()
            };
        };
        let sum: u128 = values.iter().map(|value| u128::from(*value)).sum();
        let count = u128::try_from(values.len()).unwrap_or(u128::MAX);
        let mean = sum
            .checked_div(count)
            .and_then(|mean| u64::try_from(mean).ok())
            .unwrap_or(0);
        Self {
            present: true,
            mean,
            max,
            values: requested
                .iter()
                .map(|percentile| PercentileValue {
                    percentile: *percentile,
                    value: nearest_rank(&values, *percentile),
                })
                .collect(),
        }
    }
}

/// Percentiles over the observations currently held in a recent ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PercentileReport {
    pub observations: usize,
    pub cpu_millicores: Percentiles,
    pub memory_bytes: Percentiles,
}

pub(super) fn validate_percentiles(requested: &[u8]) -> StorageResult<()> {
    match requested.iter().find(|percentile| **percentile > 100) {
        Some(value) => Err(StorageError::InvalidPercentile { value: *value }),
        None => Ok(()),
    }
}

pub(super) fn build_report<'obs, I>(recent: I, cpu: &[u8], memory: &[u8]) -> PercentileReport
where
    I: Iterator<Item = &'obs Observation> + Clone,
{
    let observations = recent.clone().count();
    let memory_values: Vec<u64> = recent
        .clone()
        .map(|observation| observation.stats().memory.usage_bytes)
        .collect();
    let cpu_values: Vec<u64> = recent
        .clone()
        .zip(recent.skip(1))
        .filter_map(|(prev, next)| cpu_rate_millicores(prev.stats(), next.stats()))
        .collect();
    PercentileReport {
        observations,
        cpu_millicores: Percentiles::from_values(cpu_values, cpu),
        memory_bytes: Percentiles::from_values(memory_values, memory),
    }
}

/// Average CPU usage between two samples, in thousandths of a core.
/// `None` when time did not advance or the counter went backwards.
pub(super) fn cpu_rate_millicores(prev: &ContainerStats, next: &ContainerStats) -> Option<u64> {
    let elapsed_ns = next
        .timestamp
        .signed_duration_since(prev.timestamp)
        .num_nanoseconds()
        .and_then(|elapsed| u128::try_from(elapsed).ok())
        .filter(|elapsed| *elapsed > 0)?;
    let used_ns = next.cpu.total_ns.checked_sub(prev.cpu.total_ns)?;
    u128::from(used_ns)
        .saturating_mul(NANOS_PER_MILLICORE_SECOND)
        .checked_div(elapsed_ns)
        .and_then(|rate| u64::try_from(rate).ok())
}

/// Nearest-rank percentile of an ascending slice; percentile 0 is the minimum.
fn nearest_rank(sorted: &[u64], percentile: u8) -> u64 {
    let rank = usize::from(percentile)
        .saturating_mul(sorted.len())
        .div_ceil(100)
        .max(1);
    sorted
        .get(rank.saturating_sub(1))
        .copied()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_rank_matches_textbook_values() -> Result<(), String> {
        let values: Vec<u64> = (1..=10_u64).map(|value| value.saturating_mul(10)).collect();
        for (percentile, expected) in [(0, 10), (10, 10), (50, 50), (90, 90), (95, 100), (100, 100)] {
            let got = nearest_rank(&values, percentile);
            if got != expected {
                return Err(format!("p{}: expected {}, got {}", percentile, expected, got));
            }
        }
        Ok(())
    }

    #[test]
    fn empty_series_is_not_present() -> Result<(), String> {
        let summary = Percentiles::from_values(Vec::new(), &[50, 99]);
        if summary.present || summary.max != 0 || summary.get(99) != Some(0) {
            return Err(format!("Unexpected empty summary: {:?}", summary));
        }
        Ok(())
    }

    #[test]
    fn rejects_percentiles_above_hundred() -> Result<(), String> {
        match validate_percentiles(&[50, 101]) {
            Err(StorageError::InvalidPercentile { value: 101 }) => Ok(()),
            other => Err(format!("Expected invalid percentile, got {:?}", other)),
        }
    }
}
