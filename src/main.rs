use clap::Parser;

use trialseal::cli::{Cli, CliHandler};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let handler = match CliHandler::new(cli.config.clone()) {
        Ok(handler) => handler,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let verbose = cli.verbose || handler.config().verbose;
    let log_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("trialseal={}", log_level))
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(version = trialseal::VERSION, "trialseal starting");

    if let Err(e) = handler.execute(cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
