//! Provides the main entry point to the program.
use anyhow::Result;
use icegrid::cli::run_cli;

fn main() -> Result<()> {
    human_panic::setup_panic!();

    run_cli()
}
