//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and drive both phases
//! end-to-end against an in-memory or temporary SQLite store.

mod common;
mod discovery_tests;
mod extraction_tests;
