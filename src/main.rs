use clap::Parser;
use docflow::{cli, logging};

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    let _guard = logging::init(&args.command)?;
    cli::run(args)
}
