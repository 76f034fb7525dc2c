//! Storage drivers: the driver contract, the name-keyed registry, and the
//! in-tree drivers.
mod builtins;
mod config;
mod jsonl;
mod memory;
mod registry;
mod traits;


pub use config::DriverConfig;
pub use jsonl::{JSONL_ENGINE, JsonLinesDriver, JsonLinesRecord};
pub use memory::{MEMORY_ENGINE, MemoryStorage};
pub use registry::{DriverRegistry, driver_registry};
pub use traits::{DriverFactory, StorageDriver};
