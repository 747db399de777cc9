use anyhow::Result;
use blockcode_rs_core::cli::Args;
use clap::Parser;

fn main() -> Result<()> {
    let args = Args::parse();
    blockcode_rs_core::run_cli(&args)
}
