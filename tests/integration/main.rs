//! Integration tests for Doc-Harvest
//!
//! These tests use wiremock for document and page servers, scripted
//! fetchers for listing pages, and temporary directories for all output.

mod persist_tests;
mod support;
