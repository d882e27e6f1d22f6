//! `anchors check`

use anyhow::{bail, Result};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;

use native_anchors::{DiscoveryResult, PartialFailure, Platform};

use super::Context;
use crate::cli::args::CheckArgs;
use crate::output::{self, OutputFormat};

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    platform: Platform,
    anchors: usize,
    stores: BTreeMap<String, usize>,
    partial_failures: &'a [PartialFailure],
}

impl<'a> CheckReport<'a> {
    fn new(result: &'a DiscoveryResult) -> Self {
        let mut stores = BTreeMap::new();
        for anchor in &result.anchors {
            for store in &anchor.origin_stores {
                *stores.entry(store.to_string()).or_insert(0) += 1;
            }
        }
        Self {
            platform: Platform::current(),
            anchors: result.len(),
            stores,
            partial_failures: &result.partial_failures,
        }
    }
}

pub async fn execute(ctx: Context, args: CheckArgs) -> Result<()> {
    let result = ctx.discover().await?;
    let report = CheckReport::new(&result);

    if matches!(ctx.output_format, OutputFormat::Json) {
        output::print_json(&report)?;
    } else {
        println!(
            "  {} {} trust anchors on {}",
            "✓".bright_green(),
            report.anchors.to_string().bright_white(),
            report.platform
        );
        for (store, count) in &report.stores {
            println!("    {:>5}  {}", count, store.dimmed());
        }
        println!();
        output::print_failures(report.partial_failures);
    }

    if args.strict && !result.partial_failures.is_empty() {
        bail!(
            "{} store(s) or entries could not be read",
            result.partial_failures.len()
        );
    }
    Ok(())
}
