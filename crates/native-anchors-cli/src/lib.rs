//! # native-anchors-cli
//!
//! Command-line harness over the `native-anchors` discovery engine.
//!
//! - `anchors list`: one line per trust anchor
//! - `anchors export`: the anchor set as a PEM bundle (or JSON)
//! - `anchors check`: per-store summary and partial failures
//!
//! All trust decisions live in the library; this crate only configures a
//! discovery pass and prints what it returns.

pub mod cli;
pub mod output;

pub use cli::run;
