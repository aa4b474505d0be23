//! Song renderer
//!
//! Compiles a [`Song`] and the entities it references into one [`Command`]
//! per frame. Rendering is pure and all-or-nothing: any unresolved reference
//! aborts the whole song.
//!
//! ```rust
//! use stagectl_core::{BarChange, DataStore, Song, SongRenderer};
//!
//! let song = Song {
//!     id: "intro".to_string(),
//!     bar_changes: vec![BarChange { at: 0, note_value: 4, note_count: 4, speed: 120 }],
//!     ..Default::default()
//! };
//! let store = DataStore::new();
//! let commands = SongRenderer::new(&store).render(&song).unwrap();
//! assert_eq!(commands.len(), 960);
//! ```

mod devices;
mod layers;

pub use layers::Layer;

use tracing::debug;

use crate::command::Command;
use crate::dmx::{DmxAnimation, DmxDeviceParams, DmxParams, DmxScene, DmxTransition, ParamKind};
use crate::ease::EaseFunction;
use crate::error::{EntityKind, RenderError, Result};
use crate::song::Song;
use crate::store::DataStore;
use crate::timing::{frame_states, streamline_bar_changes, validate_bar_changes, RENDER_FRAMES};
use devices::{resolve_targets, ResolvedDevice};
use layers::{flatten_params, ChannelWrite, Timeline};

/// A scene instance placed at an absolute frame. Positions saturate, the
/// timeline bound rejects anything that did.
struct Placement<'a> {
    start: u64,
    end: u64,
    scene: &'a DmxScene,
}

/// Renders songs against a read-only entity store
pub struct SongRenderer<'a> {
    store: &'a DataStore,
}

impl<'a> SongRenderer<'a> {
    pub fn new(store: &'a DataStore) -> Self {
        Self { store }
    }

    /// Render a song by id
    pub fn render_by_id(&self, id: &str) -> Result<Vec<Command>> {
        let song = self
            .store
            .song(id)
            .ok_or_else(|| RenderError::not_found(EntityKind::Song, id, "render request"))?;
        self.render(song)
    }

    /// Render a song into its frame-indexed command sequence
    pub fn render(&self, song: &Song) -> Result<Vec<Command>> {
        let bar_changes = streamline_bar_changes(song);
        validate_bar_changes(&bar_changes)?;

        let placements = self.place_scenes(song)?;

        let content_end = placements
            .iter()
            .map(|placement| placement.end)
            .chain(song.midi_commands.iter().map(|midi| midi.at.saturating_add(1)))
            .max()
            .unwrap_or(0);

        let states = frame_states(&bar_changes, content_end)?;
        let total_frames = states.len() as u64;
        let mut timeline = Timeline::new(total_frames);

        if !song.dmx_device_params.is_empty() {
            let context = format!("song {:?}", song.id);
            let span = Span {
                start: 0,
                end: total_frames,
            };
            for device_params in &song.dmx_device_params {
                self.render_device_params(&mut timeline, device_params, span, true, &context)?;
            }
        }

        for placement in &placements {
            self.render_placement(&mut timeline, placement, &song.id)?;
        }

        let mut commands: Vec<Command> = states.into_iter().map(Command::new).collect();

        for (frame, dmx_commands) in timeline.into_commands() {
            commands[frame as usize].dmx_commands = dmx_commands;
        }

        for midi in &song.midi_commands {
            if let Some(cmd) = commands.get_mut(midi.at as usize) {
                cmd.midi_commands.push(*midi);
            }
        }

        for bc in bar_changes.values() {
            if let Some(cmd) = commands.get_mut(bc.at as usize) {
                cmd.bar_change = Some(*bc);
            }
        }

        debug!(
            "Rendered song {:?}: {} frames, {} scene placements",
            song.id,
            commands.len(),
            placements.len()
        );

        Ok(commands)
    }

    fn place_scenes(&self, song: &Song) -> Result<Vec<Placement<'a>>> {
        let mut placements = Vec::new();

        for position in &song.dmx_scenes {
            let context = format!("song {:?}", song.id);
            let scene = self
                .store
                .scene(&position.id)
                .ok_or_else(|| RenderError::not_found(EntityKind::Scene, &position.id, context))?;
            let length = scene_length(scene)?;

            for repetition in 0..u64::from(position.repeat.max(1)) {
                let start = position.at.saturating_add(repetition.saturating_mul(length));
                placements.push(Placement {
                    start,
                    end: start.saturating_add(length),
                    scene,
                });
            }
        }

        Ok(placements)
    }

    fn render_placement(
        &self,
        timeline: &mut Timeline,
        placement: &Placement<'_>,
        song_id: &str,
    ) -> Result<()> {
        let scene = placement.scene;
        let context = format!("song {:?}, scene {:?}", song_id, scene.id);

        for sub_scene in &scene.sub_scenes {
            let preset = match &sub_scene.preset {
                Some(selector) => Some(self.store.preset(&selector.id).ok_or_else(|| {
                    RenderError::not_found(EntityKind::Preset, &selector.id, context.as_str())
                })?),
                None => None,
            };

            for &offset in &sub_scene.at {
                let span = Span {
                    start: placement.start.saturating_add(offset),
                    end: placement.end,
                };

                if let Some(preset) = preset {
                    let preset_context = format!("{}, preset {:?}", context, preset.id);
                    for device_params in &preset.device_params {
                        self.render_device_params(
                            timeline,
                            device_params,
                            span,
                            true,
                            &preset_context,
                        )?;
                    }
                }

                for device_params in &sub_scene.device_params {
                    self.render_device_params(timeline, device_params, span, false, &context)?;
                }
            }
        }

        Ok(())
    }

    fn render_device_params(
        &self,
        timeline: &mut Timeline,
        device_params: &DmxDeviceParams,
        span: Span,
        from_preset: bool,
        context: &str,
    ) -> Result<()> {
        let devices = resolve_targets(self.store, device_params, context)?;
        let layer = |own: Layer| if from_preset { Layer::Preset } else { own };

        let direct = flatten_all(&devices, &device_params.params)?;
        timeline.write(span.start, layer(Layer::Direct), &direct);

        if let Some(selector) = &device_params.animation {
            let animation = self.store.animation(&selector.id).ok_or_else(|| {
                RenderError::not_found(EntityKind::Animation, &selector.id, context)
            })?;
            render_animation(timeline, animation, &devices, span, layer(Layer::Animation))?;
        }

        if let Some(selector) = &device_params.transition {
            let transition = self.store.transition(&selector.id).ok_or_else(|| {
                RenderError::not_found(EntityKind::Transition, &selector.id, context)
            })?;
            render_transition(timeline, transition, &devices, span.start, layer(Layer::Transition))?;
        }

        Ok(())
    }
}

/// Frames a sub-scene firing is active for
#[derive(Debug, Clone, Copy)]
struct Span {
    start: u64,
    end: u64,
}

/// Frame length of one bar of the scene's own metre
pub fn scene_length(scene: &DmxScene) -> Result<u64> {
    let note_length = RENDER_FRAMES
        .checked_div(u64::from(scene.note_value))
        .unwrap_or(0);
    let length = u64::from(scene.note_count) * note_length;
    if length == 0 {
        return Err(RenderError::InvalidScene {
            id: scene.id.clone(),
            reason: "note value and note count must yield a non-zero length",
        });
    }
    Ok(length)
}

fn flatten_all(devices: &[ResolvedDevice<'_>], params: &[DmxParams]) -> Result<Vec<ChannelWrite>> {
    let mut writes = Vec::new();
    for resolved in devices {
        for p in params {
            writes.extend(flatten_params(resolved.device, resolved.device_type, p)?);
        }
    }
    Ok(writes)
}

/// Loop the animation from the firing frame until the scene instance ends
fn render_animation(
    timeline: &mut Timeline,
    animation: &DmxAnimation,
    devices: &[ResolvedDevice<'_>],
    span: Span,
    layer: Layer,
) -> Result<()> {
    if animation.length == 0 {
        return Err(RenderError::InvalidAnimation {
            id: animation.id.clone(),
            reason: "length must not be zero",
        });
    }
    let length = u64::from(animation.length);

    let keyframes = animation
        .frames
        .iter()
        .filter(|frame| frame.at < animation.length)
        .map(|frame| Ok((u64::from(frame.at), flatten_all(devices, &[frame.params])?)))
        .collect::<Result<Vec<_>>>()?;

    let mut cycle_start = span.start;
    while cycle_start < span.end {
        for (at, writes) in &keyframes {
            let frame = cycle_start + at;
            if frame < span.end {
                timeline.write(frame, layer, writes);
            }
        }
        cycle_start += length;
    }

    Ok(())
}

/// Ease every (from, to) pair over `length` frames starting at `start`
fn render_transition(
    timeline: &mut Timeline,
    transition: &DmxTransition,
    devices: &[ResolvedDevice<'_>],
    start: u64,
    layer: Layer,
) -> Result<()> {
    let ease: EaseFunction = transition.ease.parse()?;
    let length = u64::from(transition.length);

    for step in 0..=length {
        let frame = start.saturating_add(step);
        if frame >= timeline.total_frames() {
            break;
        }
        let t = if length == 0 {
            1.0
        } else {
            step as f32 / length as f32
        };

        let mut frame_params = Vec::with_capacity(transition.params.len() * 2);
        for pair in &transition.params {
            let mut eased = DmxParams {
                led: pair.from.led,
                ..Default::default()
            };
            let mut arriving = DmxParams {
                led: pair.to.led,
                ..Default::default()
            };

            for kind in ParamKind::ALL {
                match (pair.from.get(kind), pair.to.get(kind)) {
                    (Some(from), Some(to)) => eased.set(kind, Some(ease.interpolate(from, to, t))),
                    (Some(from), None) if step == 0 => eased.set(kind, Some(from)),
                    (None, Some(to)) if step == length => arriving.set(kind, Some(to)),
                    _ => {}
                }
            }

            frame_params.push(eased);
            frame_params.push(arriving);
        }

        let writes = flatten_all(devices, &frame_params)?;
        timeline.write(frame, layer, &writes);
    }

    Ok(())
}
