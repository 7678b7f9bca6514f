//! Test data factories


pub use fixtures::{BatchConfig, TestDataFactory, TestScenario};
