use clap::Parser;
use jlogic_cli::{Cli, run};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let stdout = std::io::stdout();
    if let Err(err) = run(cli, &mut stdout.lock()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
