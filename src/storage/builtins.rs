use std::sync::Arc;

use super::DriverFactory;
use super::jsonl::JsonLinesFactory;
use super::memory::MemoryFactory;
use crate::plugin::PluginDriverFactory;

pub(super) fn builtins() -> Vec<Arc<dyn DriverFactory>> {
    vec![
        Arc::new(MemoryFactory),
        Arc::new(JsonLinesFactory),
        Arc::new(PluginDriverFactory),
    ]
}
