use ::tracing::debug;
use admission_webhook::{WebhookServer, cli, config::Config, tracing::setup_tracing};
use anyhow::Result;
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    let runtime = Runtime::new()?;
    runtime.block_on(async {
        setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;
        debug!("tracing system ready");

        let server = WebhookServer::new_from_config(config).await?;
        server.run().await
    })
}
