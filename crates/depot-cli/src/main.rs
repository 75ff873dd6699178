use clap::Parser;
use color_eyre::Result;
use serde_json::json;

mod cli;
mod dispatch;
mod output;
mod style;

use cli::DepotCli;
use output::{Outcome, Status};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = DepotCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let outcome = dispatch::run(&cli)
        .unwrap_or_else(|err| Outcome::new(Status::Failure, format!("{err:#}"), json!({})));
    let code = output::emit(&outcome, cli.json, cli.no_color)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("depot={level},depot_core={level},depot_cli={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
