//! File input and output: dataset ingest and fit-report export.

pub mod export;
pub mod ingest;
