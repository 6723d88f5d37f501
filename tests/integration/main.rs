//! Integration tests for Webmark
//!
//! These tests use wiremock to create mock HTTP servers and exercise
//! discovery, politeness and the full harvest end-to-end.

mod common;
mod crawl_tests;
mod politeness_tests;
