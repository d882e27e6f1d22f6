//! `anchors list`

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;

use super::Context;
use crate::cli::args::ListArgs;
use crate::output::{self, AnchorSummary, OutputFormat};

pub async fn execute(ctx: Context, args: ListArgs) -> Result<()> {
    let result = ctx.discover().await?;

    let needle = args.subject.as_deref().map(str::to_lowercase);
    let anchors: Vec<_> = result
        .anchors
        .iter()
        .filter(|a| {
            needle
                .as_deref()
                .map_or(true, |n| a.certificate.subject.text.to_lowercase().contains(n))
        })
        .collect();

    if matches!(ctx.output_format, OutputFormat::Json) {
        let summaries: Vec<AnchorSummary> = anchors.iter().map(|a| AnchorSummary::from(*a)).collect();
        output::print_json(&summaries)?;
        output::print_failures(&result.partial_failures);
        return Ok(());
    }

    let now = Utc::now();
    let expired = anchors
        .iter()
        .filter(|a| a.certificate.is_expired_at(now))
        .count();

    println!(
        "  {} trust anchors ({} expired)",
        anchors.len().to_string().bright_white(),
        if expired > 0 {
            expired.to_string().bright_red()
        } else {
            expired.to_string().bright_green()
        }
    );
    println!();

    for anchor in &anchors {
        output::print_anchor_line(anchor, now, args.stores);
    }

    println!();
    output::print_failures(&result.partial_failures);
    Ok(())
}
