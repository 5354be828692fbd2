use std::path::PathBuf;

use clap::Parser;
use glove_core::{FlexNormalizer, SensorStreams};
use glove_daq::{
    BusDevice, Config, CycleDriver, GestureSink, I2cPort, LinuxI2cPort, MockPeer, OutputConfig,
    ResetPulse, RunSummary, Sequencer, ThreadDelay, Timing, XmlFileSink, XmlStreamSink,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "glove-daq")]
#[command(about = "Glove sensor acquisition")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "glove-daq.toml")]
    config: PathBuf,

    /// Stop after this many cycles instead of running until interrupted
    #[arg(long)]
    cycles: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "glove_daq=info,glove_core=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        info!(path = ?cli.config, "Loading configuration");
        Config::load(&cli.config)?
    } else {
        info!("No configuration file found, using defaults");
        Config::default()
    };

    info!(
        device = ?config.bus.device,
        address = config.bus.address,
        side = %config.glove.side,
        output = ?config.output,
        "Starting glove-daq"
    );

    let sink: Box<dyn GestureSink + Send> = match &config.output {
        OutputConfig::File { path } => Box::new(XmlFileSink::new(path)),
        OutputConfig::Stdout => Box::new(XmlStreamSink::stdout()),
    };

    let cancel = CancellationToken::new();
    let limit = cli.cycles;
    let mut acquisition = {
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || match config.bus.device.clone() {
            BusDevice::Linux { path } => {
                run_acquisition(LinuxI2cPort::new(path), &config, sink, &cancel, limit)
            }
            BusDevice::Mock { jitter } => {
                let port = if jitter {
                    MockPeer::randomized(config.bus.address)
                } else {
                    MockPeer::from_streams(config.bus.address, &SensorStreams::default())
                };
                run_acquisition(port, &config, sink, &cancel, limit)
            }
        })
    };

    let summary = tokio::select! {
        result = &mut acquisition => result?,
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => {
                    info!("Shutdown signal received, finishing current cycle");
                    cancel.cancel();
                }
                Err(e) => error!(error = ?e, "Unable to listen for shutdown signal"),
            }
            acquisition.await?
        }
    };

    info!(
        cycles = summary.cycles,
        disconnected = summary.disconnected,
        "Shutdown complete"
    );
    Ok(())
}

/// Blocking half of the process: one reset pulse, then cycles until stopped.
fn run_acquisition<P: I2cPort>(
    port: P,
    config: &Config,
    sink: Box<dyn GestureSink + Send>,
    cancel: &CancellationToken,
    limit: Option<u64>,
) -> RunSummary {
    let mut delay = ThreadDelay;

    if let Some(reset) = &config.reset {
        let pulse = ResetPulse::with_timing(
            &reset.gpio_value_path,
            reset.pulse_interval(),
            reset.recovery(),
        );
        if let Err(e) = pulse.fire(&mut delay) {
            error!(error = ?e, "Reset pulse failed, acquiring anyway");
        }
    }

    let sequencer = Sequencer::new(
        port,
        config.bus.address,
        Timing::from(&config.timing),
        delay,
    );
    let mut driver = CycleDriver::new(
        sequencer,
        config.glove.side,
        FlexNormalizer::new(config.glove.flex_full_scale),
        sink,
    );
    driver.run(cancel, limit)
}
