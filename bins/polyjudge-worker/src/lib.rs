//! Judge core: language adapters, the process engine and the pipeline
//! that turns a test plan plus a submission into a `JudgeReport`.

pub mod config;
pub mod conventions;
pub mod engine;
pub mod evaluator;
pub mod executor;
pub mod features;
pub mod interrupt;
pub mod languages;
pub mod lint;
pub mod stacktrace;
