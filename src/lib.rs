//! seedrun - run a candidate program across many seeds and compare runs
//!
//! This library provides the trial runner that drives the candidate program
//! and parses its output, a JSON run store, and the statistical comparison
//! of a run against a baseline with HTML, text and JSON reports.

pub mod cli;
pub mod comparison;
pub mod config;
pub mod html_output;
pub mod json_output;
pub mod literal;
pub mod runner;
pub mod store;
pub mod text_output;
pub mod trial;
