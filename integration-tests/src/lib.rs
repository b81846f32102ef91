//! Shared fixtures for the workspace integration tests.

pub mod fixtures;
