//! Process Diagram State Machine Inference

use clap::Parser;
use process_fsm::{Config, Result, VERSION, cli, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)?
    } else {
        Config::load()?
    };

    // The command line overrides the configured level
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(level);

    tracing::info!("process-fsm v{}", VERSION);
    tracing::debug!("Parsed arguments: {:?}", args);
    tracing::debug!("Loaded configuration: {:?}", config);

    let code = cli::execute(args, config).await?;
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
