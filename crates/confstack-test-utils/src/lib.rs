//! Test helpers shared across confstack crates.

pub mod fixture;

pub use fixture::{ConfigFixture, SAMPLE_APP, SAMPLE_CLOUD, SAMPLE_DATABASE, SAMPLE_SECRETS};
