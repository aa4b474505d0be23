//! Real-time playback
//!
//! The [`Player`] renders the requested songs, waits for every waiter and then
//! steps through the frames on an absolute-deadline clock. Each frame is
//! handed to all writers concurrently and the next frame only starts once
//! every writer has returned.

mod clock;

pub use clock::FrameClock;

use std::sync::Arc;

use futures::future::join_all;
use stagectl_core::{Command, DataStore, EntityKind, SongRenderer};
use tracing::{debug, error, info, warn};

use crate::error::{ControlError, PlaybackError};
use crate::shutdown::ShutdownSignal;
use crate::transport::TransportWriter;
use crate::waiter::Waiter;

/// Result alias for playback
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// A writer error observed during playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterFault {
    pub writer: String,
    pub song: String,
    pub frame: u64,
    pub error: String,
    pub fatal: bool,
}

/// Summary of a finished playback
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Songs played to the end, in order
    pub songs: Vec<String>,
    /// Frames dispatched across all songs
    pub frames: u64,
    pub faults: Vec<WriterFault>,
    /// Writers removed after a fatal error
    pub dropped_writers: Vec<String>,
}

impl PlaybackReport {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Plays songs and set lists on a set of transports
pub struct Player {
    store: Arc<DataStore>,
    writers: Vec<Box<dyn TransportWriter>>,
    waiters: Vec<Box<dyn Waiter>>,
    shutdown: ShutdownSignal,
}

impl Player {
    pub fn new(
        store: Arc<DataStore>,
        writers: Vec<Box<dyn TransportWriter>>,
        waiters: Vec<Box<dyn Waiter>>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            store,
            writers,
            waiters,
            shutdown,
        }
    }

    /// Play a single song. Writers are closed when this returns.
    pub async fn play_song(mut self, id: &str) -> Result<PlaybackReport> {
        let result = match self.render(id) {
            Ok(commands) => {
                let mut report = PlaybackReport::default();
                self.play_rendered(id, &commands, &mut report)
                    .await
                    .map(|()| report)
            }
            Err(e) => Err(e),
        };
        self.close_writers().await;
        result
    }

    /// Play every song of a set list in order. All songs are resolved and
    /// rendered before the first frame is sent. Writers are closed when this
    /// returns.
    pub async fn play_set_list(mut self, id: &str) -> Result<PlaybackReport> {
        let result = match self.render_set_list(id) {
            Ok(songs) => {
                let mut report = PlaybackReport::default();
                let mut outcome = Ok(());
                for (song_id, commands) in &songs {
                    outcome = self.play_rendered(song_id, commands, &mut report).await;
                    if outcome.is_err() {
                        break;
                    }
                }
                outcome.map(|()| report)
            }
            Err(e) => Err(e),
        };
        self.close_writers().await;
        result
    }

    fn render(&self, id: &str) -> Result<Vec<Command>> {
        let song = self.store.song(id).ok_or_else(|| PlaybackError::NotFound {
            kind: EntityKind::Song,
            id: id.to_string(),
        })?;
        SongRenderer::new(&self.store)
            .render(song)
            .map_err(|source| PlaybackError::Render {
                song: id.to_string(),
                source,
            })
    }

    fn render_set_list(&self, id: &str) -> Result<Vec<(String, Vec<Command>)>> {
        let set_list = self
            .store
            .set_list(id)
            .ok_or_else(|| PlaybackError::NotFound {
                kind: EntityKind::SetList,
                id: id.to_string(),
            })?;

        if let Some(missing) = set_list
            .songs
            .iter()
            .find(|selector| self.store.song(&selector.id).is_none())
        {
            return Err(PlaybackError::NotFound {
                kind: EntityKind::Song,
                id: missing.id.clone(),
            });
        }

        info!(
            "Rendering set list {:?} with {} songs",
            set_list.id,
            set_list.songs.len()
        );
        set_list
            .songs
            .iter()
            .map(|selector| Ok((selector.id.clone(), self.render(&selector.id)?)))
            .collect()
    }

    async fn play_rendered(
        &mut self,
        song_id: &str,
        commands: &[Command],
        report: &mut PlaybackReport,
    ) -> Result<()> {
        if self.writers.is_empty() {
            return Err(PlaybackError::NoActiveWriters);
        }

        self.wait_for_start().await?;

        let Some(first) = commands.first().and_then(|c| c.bar_change) else {
            warn!("Song {:?} rendered no frames", song_id);
            return Ok(());
        };

        info!("Playing song {:?} ({} frames)", song_id, commands.len());
        let mut clock = FrameClock::start(&first);

        for command in commands {
            if let Some(bar_change) = &command.bar_change {
                clock.set_bar_change(bar_change);
                debug!(
                    "Bar change at frame {}: {}/{} at {}",
                    command.state.frame,
                    bar_change.note_count,
                    bar_change.note_value,
                    bar_change.speed
                );
            }

            tokio::select! {
                biased;
                _ = self.shutdown.wait() => {
                    info!("Playback of {:?} interrupted at frame {}", song_id, command.state.frame);
                    return Err(PlaybackError::Interrupted);
                }
                _ = clock.wait() => {}
            }

            self.dispatch(song_id, command, report).await?;
            report.frames += 1;
            clock.advance();
        }

        let lag = clock.lag();
        if lag > clock.frame_duration() {
            debug!("Song {:?} finished {:?} behind schedule", song_id, lag);
        }

        info!("Finished song {:?}", song_id);
        report.songs.push(song_id.to_string());
        Ok(())
    }

    /// Block on every waiter in turn, each on the blocking pool
    async fn wait_for_start(&mut self) -> Result<()> {
        let waiters = std::mem::take(&mut self.waiters);

        for mut waiter in waiters {
            let name = waiter.name().to_string();
            debug!("Waiting for {:?}", name);

            let task = tokio::task::spawn_blocking(move || {
                let result = waiter.wait();
                (waiter, result)
            });

            let (waiter, result) = tokio::select! {
                biased;
                _ = self.shutdown.wait() => return Err(PlaybackError::Interrupted),
                joined = task => joined.map_err(|e| PlaybackError::Waiter {
                    name: name.clone(),
                    source: ControlError::InvalidParameter(format!("waiter task failed: {}", e)),
                })?,
            };
            self.waiters.push(waiter);

            match result {
                Ok(()) => {}
                Err(ControlError::Interrupted) => return Err(PlaybackError::Interrupted),
                Err(source) => return Err(PlaybackError::Waiter { name, source }),
            }
        }

        Ok(())
    }

    /// Hand one frame to every writer concurrently and wait for all of them
    async fn dispatch(
        &mut self,
        song_id: &str,
        command: &Command,
        report: &mut PlaybackReport,
    ) -> Result<()> {
        let command = Arc::new(command.clone());
        let frame = command.state.frame;

        let tasks = std::mem::take(&mut self.writers).into_iter().map(|mut writer| {
            let command = command.clone();
            tokio::task::spawn_blocking(move || {
                let result = writer.write(&command);
                (writer, result)
            })
        });

        for joined in join_all(tasks).await {
            let (mut writer, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    error!("Transport task failed on frame {}: {}", frame, e);
                    report.faults.push(WriterFault {
                        writer: "unknown".to_string(),
                        song: song_id.to_string(),
                        frame,
                        error: e.to_string(),
                        fatal: true,
                    });
                    continue;
                }
            };

            let Err(err) = result else {
                self.writers.push(writer);
                continue;
            };

            let fatal = err.is_fatal();
            report.faults.push(WriterFault {
                writer: writer.name().to_string(),
                song: song_id.to_string(),
                frame,
                error: err.to_string(),
                fatal,
            });

            if fatal {
                error!(
                    "Transport {:?} failed on frame {}, dropping it: {}",
                    writer.name(),
                    frame,
                    err
                );
                report.dropped_writers.push(writer.name().to_string());
                close_writer(writer.as_mut());
            } else {
                warn!(
                    "Transport {:?} failed on frame {}, retrying next frame: {}",
                    writer.name(),
                    frame,
                    err
                );
                self.writers.push(writer);
            }
        }

        if self.writers.is_empty() {
            error!("All transports failed, stopping playback");
            return Err(PlaybackError::NoActiveWriters);
        }
        Ok(())
    }

    async fn close_writers(&mut self) {
        let tasks = std::mem::take(&mut self.writers).into_iter().map(|mut writer| {
            tokio::task::spawn_blocking(move || close_writer(writer.as_mut()))
        });
        for joined in join_all(tasks).await {
            if let Err(e) = joined {
                warn!("Failed to close transport: {}", e);
            }
        }
    }
}

fn close_writer(writer: &mut dyn TransportWriter) {
    match writer.close() {
        Ok(()) => debug!("Closed transport {:?}", writer.name()),
        Err(e) => warn!("Failed to close transport {:?}: {}", writer.name(), e),
    }
}
