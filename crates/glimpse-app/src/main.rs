//! Glimpse binary.

mod cli;
mod demo;
mod presenter;
mod settings;

use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "glimpse=info,glimpse_session=info,glimpse_common=info".into()
        }))
        .init();

    let args = cli::parse();
    let settings = match settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            warn!(error = %err, "falling back to default settings");
            settings::Settings::default()
        }
    };

    match args.command {
        cli::Command::Demo {
            viewers,
            deny_capture,
        } => {
            if let Err(err) = demo::run(settings, viewers, deny_capture).await {
                error!(error = %err, "demo failed");
                std::process::exit(1);
            }
        }
    }
}
