use clap::Parser;
use ssh_pubkey_server::cli::Cli;
use ssh_pubkey_server::server::{wait_for_signal, PubkeyServer};
use ssh_pubkey_server::{logging, SERVICE_NAME, SERVICE_VERSION};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_config())?;

    info!(
        service = SERVICE_NAME,
        version = SERVICE_VERSION,
        "Starting SSH public key server"
    );

    let config = cli.server_config();
    info!(
        listen_addr = %config.listen_addr,
        metrics_addr = ?config.metrics_addr,
        drain_duration = ?config.drain_duration,
        graceful_shutdown_duration = ?config.graceful_shutdown_duration,
        "Configuration loaded"
    );

    // Key or config problems must stop the process before anything binds
    let mut server = match PubkeyServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Failed to create server");
            return Err(e.into());
        }
    };

    server.run_in_background();

    match wait_for_signal().await {
        Ok(signal) => info!(signal = signal, "Initiating graceful shutdown"),
        Err(e) => error!(error = %e, "Failed to wait for termination signal, shutting down"),
    }

    let report = server.shutdown().await;
    if report.is_clean() {
        info!("SSH public key server shut down gracefully");
    } else {
        warn!("SSH public key server shut down with errors");
    }

    Ok(())
}
