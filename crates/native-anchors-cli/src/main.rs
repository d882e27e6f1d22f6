//! anchors - inspect the trust anchors the operating system provides.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    native_anchors_cli::run().await
}
