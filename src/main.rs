use std::error::Error;

use clap::Parser;
use tracing::info;

use qn_scale::config::{Cli, Config};
use qn_scale::scanner::QnScanner;
use qn_scale::{logging, Dispatcher, Poller, SqliteRecorder, WebhookNotifier};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);
    let config = Config::from_cli(&cli)?;

    let mut dispatcher = Dispatcher::new().with_sink_timeout(config.sink_timeout);
    if let Some(path) = &config.discord_webhook_file {
        dispatcher = dispatcher.with_notifier(WebhookNotifier::from_file(path).await?);
        info!("Will send data to discord through webhook");
    }
    if let Some(path) = &config.sqlite_path {
        dispatcher = dispatcher.with_recorder(SqliteRecorder::open(path).await?);
        info!(path = %path.display(), "Will record data to sqlite");
    }
    dispatcher.log_enabled();

    let scanner = QnScanner::new()
        .await?
        .with_discovery_timeout(config.discovery_timeout);

    let poller = Poller::new(scanner, config.session, config.retry, dispatcher);
    poller.run().await;
    Ok(())
}
