use std::sync::Arc;

use clap::Parser;
use pulsewatch::{
    config::{ChannelType, read_config_file},
    dispatch::Dispatcher,
    informers::default_informers,
    monitor::Monitor,
    templates::TemplateRegistry,
};
use tokio::sync::broadcast;
use tracing::{error, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Log level (trace, debug, info, warn or error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn init(level: LevelFilter) {
    let filter = filter::Targets::new()
        .with_targets(vec![("pulsewatch", level), ("pulsewatch_hub", level)]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let level = args
        .log_level
        .parse::<LevelFilter>()
        .map_err(|_| anyhow::anyhow!("unsupported log level: {}", args.log_level))?;
    init(level);
    trace!("started with args: {args:?}");
    info!("pulsewatch {}", env!("CARGO_PKG_VERSION"));

    let config = read_config_file(&args.config)?;
    config.validate()?;
    let config = Arc::new(config);

    let templates = Arc::new(TemplateRegistry::compile(&config.backends)?);
    info!(
        "configuration '{}': {} backend(s), {} channel(s), {} notification template(s)",
        config.name,
        config.backends.len(),
        config.channels.len(),
        templates.len()
    );

    let informers = default_informers();
    for channel_type in ChannelType::ALL {
        if !informers.contains_key(&channel_type) {
            anyhow::bail!("no informer registered for channel type {channel_type}");
        }
    }

    let dispatcher = Arc::new(Dispatcher::new(config.clone(), templates, informers));

    let (shutdown_tx, _) = broadcast::channel(1);
    let monitor = Monitor::new(config, dispatcher, shutdown_tx.clone());

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("interrupt received, shutting down");
                let _ = shutdown_tx.send(());
            }
            Err(e) => error!("failed to listen for shutdown signal: {e}"),
        }
    });

    monitor.run().await
}
