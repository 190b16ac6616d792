//! Parse command implementation
//!
//! Offline parser entry point for debugging: reads a captured k6 report from
//! disk and prints the structured result.

use crate::error::Result;
use crate::report::{self, ParseOptions};
use std::path::Path;
use std::time::Duration;

pub fn execute_parse(report_path: &Path, duration_secs: u64) -> Result<()> {
    let raw = std::fs::read_to_string(report_path)?;

    let options = ParseOptions {
        window: Duration::from_secs(duration_secs),
    };
    let run = report::parse_with_options(&raw, &options);

    println!("{}", serde_json::to_string_pretty(&run)?);
    Ok(())
}
