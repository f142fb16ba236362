mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "erpdesk", &mut std::io::stdout());
            Ok(())
        }

        Command::Resources => {
            commands::list::resources(&cli.global);
            Ok(())
        }

        Command::Postal(args) => {
            let client = config::resolve_postal(&cli.global)?;
            commands::insights::postal(client, args, &cli.global).await
        }

        cmd => {
            let backend = config::resolve_backend(&cli.global)?;
            tracing::debug!(command = ?cmd, url = %backend.url, "dispatching command");
            commands::dispatch(cmd, &backend, &cli.global).await
        }
    }
}
