use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use vault_interpolate::{app, cli, error, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    logging::init(cli.debug);

    match app::App::run(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), error::format_error_chain(&err));
            ExitCode::FAILURE
        }
    }
}
