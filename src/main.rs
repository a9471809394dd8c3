use replset_sidecar::{
    create_root_logger_for_file, create_root_logger_for_stdout, shutdown_signal, ControlLoop, ControllerConfig,
    KubeDirectory, MongoDatabase, Reconciler, ShutdownHandle,
};
use std::error::Error;
use std::io;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = match ControllerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let logger = create_root_logger_for_stdout(&std::env::var("POD_NAME").unwrap_or_default());
            slog::crit!(logger, "Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    let logger = match &config.log_directory {
        Some(directory) => create_root_logger_for_file(directory, &config.identity.name)?,
        None => create_root_logger_for_stdout(&config.identity.name),
    };
    slog::info!(
        logger,
        "Starting replica set sidecar";
        "ordinal" => config.identity.ordinal.as_u32(),
        "address" => &config.identity.full_address_with_port,
        "namespace" => config.namespace(),
        "service" => config.service_name(),
        "replica_set_id" => &config.replica_set_id,
        "config_server" => config.config_server,
        "primary_label" => &config.primary_label,
        "interval" => ?config.loop_interval,
        "authenticated" => config.credentials.is_some()
    );

    let directory = KubeDirectory::connect(
        logger.new(slog::o!("component" => "directory")),
        config.namespace(),
        config.service_name(),
        config.timeouts.command,
    )
    .await?;
    let database = MongoDatabase::new(
        logger.new(slog::o!("component" => "database")),
        config.address_scheme.port,
        config.credentials.clone(),
        config.timeouts,
    );
    let reconciler = Reconciler::new(logger.clone(), config.reconciler_config(), directory, database);

    let (handle, signal) = shutdown_signal();
    tokio::spawn(shutdown_on_signal(logger.clone(), handle));

    ControlLoop::new(logger, reconciler, config.loop_interval).run(signal).await;
    Ok(())
}

async fn shutdown_on_signal(logger: slog::Logger, handle: ShutdownHandle) {
    match wait_for_signal().await {
        Ok(()) => {
            slog::info!(logger, "Received stop signal, shutting down");
            handle.shutdown();
        }
        Err(e) => {
            // Keep the handle alive: the process still stops on SIGKILL.
            slog::error!(logger, "Cannot listen for stop signals: {}", e);
            std::future::pending::<()>().await;
            drop(handle);
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> io::Result<()> {
    tokio::signal::ctrl_c().await
}
