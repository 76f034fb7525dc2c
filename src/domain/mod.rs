//! Container telemetry records shared by the cache, drivers, and plugin wire.
mod container;

pub use container::{
    ContainerInfo, ContainerReference, ContainerStats, CpuStats, MemoryStats, Observation,
};
