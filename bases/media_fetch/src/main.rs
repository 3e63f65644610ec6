// bases/media_fetch/src/main.rs
mod app;
mod args;
mod config;
mod output;
mod prompt;
mod render;

use app::App;
use args::CliArgs;
use clap::Parser;
use color_eyre::Result;
use config::Config;
use output::OutputHandler;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config::default_log_filter(args.verbose).into()),
        )
        .init();

    let output = OutputHandler::new(args.verbose);
    let result = match Config::from_args(args) {
        Ok(config) => App::new(config, output.clone()).run().await,
        Err(error) => Err(error.into()),
    };

    if let Err(error) = result {
        output.print_error(&error);
        std::process::exit(1);
    }
    Ok(())
}
