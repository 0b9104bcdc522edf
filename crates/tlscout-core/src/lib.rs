// Library root: re-exports all modules so integration tests and the CLI
// can access the crate's public API.

pub mod candidate;
pub mod config;
pub mod engine;
pub mod pipeline;
pub mod position;
pub mod records;
pub mod scoring;
