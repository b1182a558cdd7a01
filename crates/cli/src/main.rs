use chat_export_cli::cli::Cli;
use chat_export_cli::{commands, logging};
use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::dispatch(cli).await {
		error!(target = "chx", error = %err, "command failed");
		std::process::exit(1);
	}
}
