//! `mm download`: install the visualizer for this platform.

use anyhow::Result;

use crate::{config::Config, printer, visualizer};

pub async fn run(cfg: &Config) -> Result<()> {
    println!("Downloading the game");
    let binary = visualizer::download(cfg).await?;
    printer::success(&format!("Visualizer installed at {}", binary.display()));
    Ok(())
}
