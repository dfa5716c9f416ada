use afk_cli::{app, cli::Cli, logging};
use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose, cli.quiet);

	match app::run(&cli).await {
		Ok(outcome) if outcome.is_failure() => {
			error!(target = "afk.cli", %outcome, "session ended");
			std::process::exit(1);
		}
		Ok(_) => {}
		Err(err) => {
			error!(target = "afk.cli", "{err:#}");
			std::process::exit(err.exit_code());
		}
	}
}
