pub mod plan;
pub mod report;
pub mod serialization;
pub mod types;
