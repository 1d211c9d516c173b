//! Core infrastructure shared by every stage of a bootstrap
//!
//! Configuration, console output and progress reporting.

pub mod config;
pub mod output;
pub mod progress;
