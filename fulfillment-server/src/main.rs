//! Fulfillment server binary

use fulfillment_server::common::logger;
use fulfillment_server::core::server::Server;
use fulfillment_server::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();

    let log_dir = format!("{}/logs", config.work_dir);
    let json_logs = config.is_production();
    logger::init_logger(
        "info",
        json_logs,
        if json_logs { Some(log_dir.as_str()) } else { None },
    )?;

    tracing::info!(
        environment = %config.environment,
        work_dir = %config.work_dir,
        "Starting order fulfillment server"
    );

    Server::new(config).run().await
}
