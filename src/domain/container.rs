use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sampling::Sequenced;

/// Identifies one container across drivers and the plugin wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerReference {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub namespace: String,
}

impl ContainerReference {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Cumulative CPU time counters, in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuStats {
    pub total_ns: u64,
    #[serde(default)]
    pub user_ns: u64,
    #[serde(default)]
    pub system_ns: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub usage_bytes: u64,
    #[serde(default)]
    pub working_set_bytes: u64,
}

/// One resource-usage sample as produced by the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStats {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub cpu: CpuStats,
    #[serde(default)]
    pub memory: MemoryStats,
}

/// Plugin wire payload: a container and the stats recorded for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub reference: ContainerReference,
    #[serde(default)]
    pub stats: Vec<ContainerStats>,
}

/// Stats accepted by a retention cache, stamped with the cache's sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    container_id: Arc<str>,
    sequence_number: u64,
    stats: ContainerStats,
}

impl Observation {
    pub(crate) const fn new(
        container_id: Arc<str>,
        sequence_number: u64,
        stats: ContainerStats,
    ) -> Self {
        Self {
            container_id,
            sequence_number,
            stats,
        }
    }

    #[must_use]
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    #[must_use]
    pub const fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.stats.timestamp
    }

    #[must_use]
    pub const fn stats(&self) -> &ContainerStats {
        &self.stats
    }
}

impl Sequenced for Observation {
    fn sequence(&self) -> u64 {
        self.sequence_number
    }
}
