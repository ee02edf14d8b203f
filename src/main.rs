//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Entry point of the CEL AMQP publisher.
// Reads one JSON event record per line from stdin and publishes each to the configured broker.
// SIGHUP re-reads the settings and reloads the configuration; Ctrl-C stops.
//--------------------------------------------------------------------------------------------------
// cat events.jsonl | cargo run -- --env-file ./cel_amqp.env
// cargo run -- --env-file ./cel_amqp.env --log-level debug
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rabbitmq::RabbitMQConnector;
use tracing::{Level, error, info, warn};

use cel_amqp::{CelAmqpModule, ConnectionManager, SettingsLoader, source};

/// How long shutdown waits for work that cannot be cancelled, such as a blocked stdin read
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// CLI options for the application
#[derive(Parser, Debug)]
#[command(name = "cel-amqp", about = "Publishes CEL events to an AMQP broker")]
struct Opt {
    /// Settings overlay read on start and on every reload
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Maximum log level
    #[arg(long, default_value = "info")]
    log_level: Level,
}

/// Re-reads settings, refreshes broker profiles and reapplies the configuration
async fn reload(
    module: &CelAmqpModule,
    loader: &SettingsLoader,
    connector: &RabbitMQConnector,
) -> anyhow::Result<()> {
    let settings = loader.load()?;
    connector.set_profiles(settings.profiles);
    module.reload(settings.cel).await?;
    Ok(())
}

#[cfg(unix)]
fn spawn_reload_on_hangup(
    module: Arc<CelAmqpModule>,
    loader: SettingsLoader,
    connector: Arc<RabbitMQConnector>,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup())?;
    Ok(tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!("Reload requested");
            match reload(&module, &loader, &connector).await {
                Ok(()) => info!("Reload complete"),
                Err(err) => error!("Reload failed, keeping previous configuration: {:#}", err),
            }
        }
    }))
}

/// Runs `future` to completion, then stops the runtime without waiting past
/// [`SHUTDOWN_GRACE`] for blocking threads that are still running.
fn block_on_then_shutdown<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    Ok(output)
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();

    tracing_subscriber::fmt().with_max_level(opt.log_level).init();

    block_on_then_shutdown(run(opt))?
}

async fn run(opt: Opt) -> anyhow::Result<()> {
    let loader = SettingsLoader::new(Some(opt.env_file));
    let settings = loader.load()?;

    let connector = Arc::new(RabbitMQConnector::new(&settings.app_id));
    connector.set_profiles(settings.profiles);

    let module = Arc::new(
        CelAmqpModule::load(ConnectionManager::new(connector.clone()), settings.cel).await?,
    );

    #[cfg(unix)]
    let reloader = spawn_reload_on_hangup(module.clone(), loader.clone(), connector.clone())?;

    let handler = module.handler();
    let events = tokio::task::spawn_blocking(move || {
        let stdin = std::io::stdin();
        source::run_with_handler(stdin.lock(), &handler)
    });

    let outcome: anyhow::Result<()> = tokio::select! {
        result = events => match result {
            Ok(Ok(stats)) => {
                info!("Input closed: {} events, {} malformed", stats.received, stats.malformed);
                Ok(())
            }
            Ok(Err(err)) => Err(err.into()),
            Err(err) => Err(err.into()),
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    };

    #[cfg(unix)]
    reloader.abort();

    // Accepted events are flushed to the broker before the runtime goes away.
    if let Err(err) = module.unload().await {
        warn!("Closing the AMQP connection failed, queued events may be lost: {}", err);
    }
    outcome
}
