//! End-to-end test support for cadence
//!
//! - `harness`: isolated review-state stores with a controllable clock
//! - `mocks`: factories for sections, plan requests, attempts and overdue items

pub mod mocks;

pub use harness::TestStoreManager;
pub use mocks::{BatchConfig, TestDataFactory, TestScenario};
