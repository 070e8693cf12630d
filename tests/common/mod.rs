//! Shared fixtures for the integration tests
//!
//! Builds small gzip-sharded corpora in temporary directories so each test
//! runs the real pipeline end to end.

#![allow(dead_code)]

pub mod corpus;

pub use corpus::{cited_paper, paper, pdf_parse, TestCorpus};
