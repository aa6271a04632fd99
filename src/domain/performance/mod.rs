pub mod entity;

pub use entity::{validate_performance, Performance, PerformanceCategory};
