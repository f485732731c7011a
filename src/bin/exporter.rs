use std::path::PathBuf;

use clap::Parser;
use fleet_exporter::{
    config::{Config, Mode},
    roles::{start_master, start_slave},
    util::{self, process_env},
};
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(about = "Prometheus exporter with master/slave aggregation")]
struct Args {
    /// Config file
    #[arg(short, long, default_value = "config.json")]
    file: PathBuf,

    /// Override the configured role
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,
}

fn init() {
    let level = process_env(util::EXPORTER_LOG)
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::INFO);

    let filter = filter::Targets::new()
        .with_default(LevelFilter::WARN)
        .with_target("fleet_exporter", level);

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
    dotenv::dotenv().ok();
    init();

    let args = Args::parse();
    trace!("started with args: {args:?}");

    let mut config = Config::load(&args.file, process_env);
    if let Some(mode) = args.mode {
        config.mode = mode;
    }

    info!("starting as {}", config.mode);

    match config.mode {
        Mode::Slave => {
            let slave = start_slave(&config).await?;
            tokio::signal::ctrl_c().await?;
            info!("shutting down");
            slave.shutdown().await?;
        }
        Mode::Master => {
            let master = start_master(&config).await?;
            tokio::signal::ctrl_c().await?;
            info!("shutting down");
            master.shutdown().await?;
        }
    }

    Ok(())
}
