//! StageCtl - Stage show automation
//!
//! Renders songs into frame-accurate command timelines and plays them back on
//! Art-Net, MIDI and debug transports.

mod config;
mod logging_setup;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use stagectl_control::{
    ArtNetController, ArtNetWriter, BufferWriter, LightingController, NoneWaiter,
    PlaybackError, PlaybackReport, Player, ShutdownSignal, TransportKind, TransportWriter,
    VisualizerWriter, Waiter, WaiterKind,
};
use stagectl_core::{DataStore, SongRenderer};
use stagectl_io::DirectoryLoader;
use tracing::{error, info, warn};

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "stagectl", version, about = "Stage show automation for lights and MIDI")]
struct Cli {
    /// Directory holding the show documents
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play a song or a set list
    Playback {
        kind: PlaybackKind,
        id: String,
        #[command(flatten)]
        options: PlaybackArgs,
    },
    /// Render every song and report errors
    Validate,
    /// List MIDI output ports
    MidiPorts,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlaybackKind {
    Song,
    Setlist,
}

#[derive(Debug, Args)]
struct PlaybackArgs {
    /// Transports to play on: buffer, visualizer, artnet, midi
    #[arg(short = 't', long = "transport", value_delimiter = ',')]
    transports: Vec<String>,

    /// host:port of the visualizer
    #[arg(long)]
    visualizer_endpoint: Option<String>,

    /// MIDI output port id or name
    #[arg(short = 'm', long)]
    midi_device_id: Option<String>,

    /// Start gates: none, audio
    #[arg(short = 'w', long = "wait-for", value_delimiter = ',')]
    waiters: Vec<String>,
}

impl Cli {
    /// Flags win over the config file
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if let Command::Playback { options, .. } = &self.command {
            let playback = &mut config.playback;
            if !options.transports.is_empty() {
                playback.transports = options.transports.clone();
            }
            if !options.waiters.is_empty() {
                playback.waiters = options.waiters.clone();
            }
            if let Some(endpoint) = &options.visualizer_endpoint {
                playback.visualizer_endpoint = endpoint.clone();
            }
            if let Some(id) = &options.midi_device_id {
                playback.midi_device_id = id.clone();
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);

    let _log_guard = logging_setup::init(&config.log)?;

    info!("==========================================");
    info!("===      StageCtl Session Started      ===");
    info!("==========================================");

    match cli.command {
        Command::Playback { kind, id, .. } => playback(config, kind, &id).await,
        Command::Validate => validate(&config),
        Command::MidiPorts => midi_ports(),
    }
}

fn load_store(config: &AppConfig) -> Result<DataStore> {
    let store = DirectoryLoader::new(&config.data_dir)
        .load()
        .with_context(|| format!("Failed to load show data from {:?}", config.data_dir))?;
    info!(
        "Loaded {} entities from {:?}",
        store.len(),
        config.data_dir
    );
    Ok(store)
}

async fn playback(config: AppConfig, kind: PlaybackKind, id: &str) -> Result<()> {
    // reject bad names before touching any device
    let transports = config
        .playback
        .transport_kinds()
        .context("Invalid transport selection")?;
    let waiter_kinds = config
        .playback
        .waiter_kinds()
        .context("Invalid waiter selection")?;

    let store = Arc::new(load_store(&config)?);
    let shutdown = ShutdownSignal::new();

    let writers = build_writers(&config, &transports)?;
    let waiters = build_waiters(&config, &waiter_kinds, &shutdown)?;

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, stopping playback");
                ctrl_c.trigger();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let player = Player::new(store, writers, waiters, shutdown);
    let result = match kind {
        PlaybackKind::Song => player.play_song(id).await,
        PlaybackKind::Setlist => player.play_set_list(id).await,
    };

    match result {
        Ok(report) => {
            log_report(&report);
            Ok(())
        }
        Err(PlaybackError::Interrupted) => {
            info!("Playback interrupted");
            Ok(())
        }
        Err(e) => Err(e).context("Playback failed"),
    }
}

/// Construct the selected transports. A transport that can not be set up is
/// logged and skipped; startup fails only when none is usable.
fn build_writers(
    config: &AppConfig,
    transports: &[TransportKind],
) -> Result<Vec<Box<dyn TransportWriter>>> {
    let mut writers: Vec<Box<dyn TransportWriter>> = Vec::with_capacity(transports.len());

    for &kind in transports {
        match build_writer(config, kind) {
            Ok(writer) => {
                info!("Transport {:?} ready", writer.name());
                writers.push(writer);
            }
            Err(e) => error!("Skipping transport {}: {:#}", kind, e),
        }
    }

    if writers.is_empty() {
        bail!("None of the selected transports could be set up");
    }
    Ok(writers)
}

fn build_writer(config: &AppConfig, kind: TransportKind) -> Result<Box<dyn TransportWriter>> {
    let writer: Box<dyn TransportWriter> = match kind {
        TransportKind::Buffer => Box::new(BufferWriter::new(io::stdout())),
        TransportKind::Visualizer => {
            let endpoint = &config.playback.visualizer_endpoint;
            Box::new(
                VisualizerWriter::connect(endpoint)
                    .with_context(|| format!("Failed to connect to visualizer {}", endpoint))?,
            )
        }
        TransportKind::ArtNet => {
            let controller = ArtNetController::connect(config.artnet.clone())
                .context("Failed to open Art-Net socket")?;
            controller
                .start()
                .context("Failed to start Art-Net controller")?;
            Box::new(ArtNetWriter::new(Arc::new(controller)))
        }
        #[cfg(feature = "midi")]
        TransportKind::Midi => {
            let device_id = &config.playback.midi_device_id;
            Box::new(
                stagectl_control::MidiWriter::connect(device_id)
                    .with_context(|| format!("Failed to open MIDI device {:?}", device_id))?,
            )
        }
        #[cfg(not(feature = "midi"))]
        TransportKind::Midi => bail!("MIDI support is not compiled in"),
    };
    Ok(writer)
}

fn build_waiters(
    config: &AppConfig,
    kinds: &[WaiterKind],
    shutdown: &ShutdownSignal,
) -> Result<Vec<Box<dyn Waiter>>> {
    let mut waiters: Vec<Box<dyn Waiter>> = Vec::with_capacity(kinds.len());

    for kind in kinds {
        match kind {
            WaiterKind::None => waiters.push(Box::new(NoneWaiter)),
            #[cfg(feature = "audio")]
            WaiterKind::Audio => waiters.push(Box::new(
                stagectl_control::AudioLevelWaiter::new(
                    config.playback.audio.clone(),
                    shutdown.clone(),
                )
                .context("Invalid audio waiter settings")?,
            )),
            #[cfg(not(feature = "audio"))]
            WaiterKind::Audio => {
                let _ = (config, shutdown);
                bail!("Audio support is not compiled in")
            }
        }
    }

    Ok(waiters)
}

fn log_report(report: &PlaybackReport) {
    info!(
        "Played {} songs, {} frames",
        report.songs.len(),
        report.frames
    );
    for fault in &report.faults {
        warn!(
            "Transport {:?} failed on frame {} of {:?}{}: {}",
            fault.writer,
            fault.frame,
            fault.song,
            if fault.fatal { " (dropped)" } else { "" },
            fault.error
        );
    }
}

fn validate(config: &AppConfig) -> Result<()> {
    let store = load_store(config)?;
    let renderer = SongRenderer::new(&store);
    let mut failures = 0;

    for (id, song) in &store.songs {
        match renderer.render(song) {
            Ok(commands) => println!("ok      {} ({} frames)", id, commands.len()),
            Err(e) => {
                failures += 1;
                error!("Song {:?} does not render: {}", id, e);
                println!("FAILED  {}: {}", id, e);
            }
        }
    }

    for (id, set_list) in &store.set_lists {
        for selector in &set_list.songs {
            if store.song(&selector.id).is_none() {
                failures += 1;
                println!("FAILED  set list {}: unknown song {:?}", id, selector.id);
            }
        }
    }

    if failures > 0 {
        bail!("{} problems found", failures);
    }
    println!(
        "{} songs and {} set lists are valid",
        store.songs.len(),
        store.set_lists.len()
    );
    Ok(())
}

#[cfg(feature = "midi")]
fn midi_ports() -> Result<()> {
    let ports = stagectl_control::midi::list_output_ports().context("Failed to list MIDI ports")?;
    if ports.is_empty() {
        println!("No MIDI output ports found");
    }
    for port in ports {
        println!("{}", port);
    }
    Ok(())
}

#[cfg(not(feature = "midi"))]
fn midi_ports() -> Result<()> {
    bail!("MIDI support is not compiled in")
}
