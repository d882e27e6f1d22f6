//! `anchors export`

use anyhow::{Context as _, Result};
use tracing::info;

use super::Context;
use crate::cli::args::ExportArgs;
use crate::output::{self, OutputFormat};

pub async fn execute(ctx: Context, args: ExportArgs) -> Result<()> {
    let result = ctx.discover().await?;

    let body = match ctx.output_format {
        OutputFormat::Pretty => result.to_pem(),
        OutputFormat::Json => serde_json::to_string_pretty(&result)? + "\n",
    };

    match &args.file {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), anchors = result.len(), "exported trust anchors");
        }
        None => print!("{body}"),
    }

    output::print_failures(&result.partial_failures);
    Ok(())
}
