mod ingest;
mod report;
mod serve;

#[cfg(test)]
mod tests;

pub(crate) use ingest::run_ingest;
pub(crate) use serve::run_serve_plugin;
