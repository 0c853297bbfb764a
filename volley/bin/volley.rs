#![deny(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

use std::sync::Arc;

use tokio::sync::broadcast;
use volley::Config;
use volley_common::Signal;
use volley_dispatch::Dispatcher;
use volley_http::ApiServer;
use volley_relay::SmtpMailer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    volley_common::logging::init();

    let config = Config::load()?;

    let mailer = SmtpMailer::new(config.timeouts.clone(), config.relay.require_tls);
    let dispatcher = Arc::new(Dispatcher::new(mailer, config.policy.clone()));

    let server = ApiServer::bind(&config.server.listen, dispatcher).await?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            let _ = shutdown_tx.send(Signal::Shutdown);
        }
    });

    server.serve(shutdown_rx).await?;

    Ok(())
}
