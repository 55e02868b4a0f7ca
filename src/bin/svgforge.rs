//! svgforge CLI
//!
//! Command-line entry point for the svgforge conversion service.

#[cfg(feature = "cli")]
use svgforge::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
