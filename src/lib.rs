#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
// Ignore the warning that the `coverage_nightly` cfg is not recognized.
#![cfg_attr(test, allow(unexpected_cfgs))]
// https://github.com/taiki-e/coverage-helper?tab=readme-ov-file#usage
#![cfg_attr(all(test, coverage_nightly), feature(coverage_attribute))]

#[cfg(feature = "cli")]
pub mod api;
pub mod app;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod migrate;
pub mod tracing;
