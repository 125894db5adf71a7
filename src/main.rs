//! # Pet Care command line
//!
//! Loads the configuration, sets up logging and metrics, opens the local
//! database and runs one command.

use clap::Parser;
use envconfig::Envconfig;
use logfire::config::MetricsOptions;
use pet_care::{action, app::AppState, config::AppConfig, logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = action::AppArgs::parse();
    let app_config = AppConfig::init_from_env()?;

    // Initialize logging and metrics
    let shutdown_handler = match &app_config.logfire_token {
        Some(token) => Some(
            logfire::configure()
                .install_panic_handler()
                .with_metrics(Some(MetricsOptions::default()))
                .send_to_logfire(logfire::config::SendToLogfire::Yes)
                .with_token(token)
                .finish()?,
        ),
        None => {
            logger::setup_simple_logger(app_config.log_level()?)?;
            None
        }
    };

    let app = AppState::build(app_config).await?;
    let result = args.run(&app).await;
    app.shutdown();

    if let Some(shutdown_handler) = shutdown_handler {
        shutdown_handler.shutdown()?;
    }

    result
}
