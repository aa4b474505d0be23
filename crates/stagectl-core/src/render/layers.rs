//! Per-frame channel compositing
//!
//! Writes are collected per frame and per layer. Resolving a frame merges the
//! layers from lowest to highest precedence so the highest layer wins for a
//! channel, and within a layer the last write wins.

use std::collections::BTreeMap;

use crate::command::{DmxChannel, DmxCommand, DmxUniverse, DmxValue, DMX_CHANNELS};
use crate::dmx::{DmxDevice, DmxDeviceType, DmxParams, ParamKind};
use crate::error::{RenderError, Result};

/// Parameter source, ordered by precedence (lowest first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Preset = 0,
    Animation = 1,
    Transition = 2,
    Direct = 3,
}

const LAYER_COUNT: usize = 4;

/// Absolute channel write produced by flattening params onto a device
pub type ChannelWrite = (DmxUniverse, DmxChannel, DmxValue);

#[derive(Debug, Default)]
struct FrameLayers {
    layers: [BTreeMap<(DmxUniverse, DmxChannel), DmxValue>; LAYER_COUNT],
}

impl FrameLayers {
    fn resolve(&self) -> Vec<DmxCommand> {
        let mut merged = BTreeMap::new();
        for layer in &self.layers {
            merged.extend(layer.iter().map(|(k, v)| (*k, *v)));
        }
        merged
            .into_iter()
            .map(|((universe, channel), value)| DmxCommand::new(universe, channel, value))
            .collect()
    }
}

/// Sparse DMX writes of a whole song, keyed by frame
#[derive(Debug)]
pub(crate) struct Timeline {
    total_frames: u64,
    frames: BTreeMap<u64, FrameLayers>,
}

impl Timeline {
    pub(crate) fn new(total_frames: u64) -> Self {
        Self {
            total_frames,
            frames: BTreeMap::new(),
        }
    }

    pub(crate) fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Record writes on a frame. Frames past the end of the song are dropped.
    pub(crate) fn write(&mut self, frame: u64, layer: Layer, writes: &[ChannelWrite]) {
        if frame >= self.total_frames || writes.is_empty() {
            return;
        }
        let slot = &mut self.frames.entry(frame).or_default().layers[layer as usize];
        for &(universe, channel, value) in writes {
            slot.insert((universe, channel), value);
        }
    }

    /// Resolved DMX commands per frame, in frame order
    pub(crate) fn into_commands(self) -> impl Iterator<Item = (u64, Vec<DmxCommand>)> {
        self.frames
            .into_iter()
            .map(|(frame, layers)| (frame, layers.resolve()))
    }
}

/// Map sparse params onto the channels of a concrete device
pub(crate) fn flatten_params(
    device: &DmxDevice,
    device_type: &DmxDeviceType,
    params: &DmxParams,
) -> Result<Vec<ChannelWrite>> {
    let led = device_type.led(params.led);
    let mut writes = Vec::new();

    for (kind, value) in params.values() {
        let offset = match kind {
            ParamKind::Red => led.map(|l| l.red),
            ParamKind::Green => led.map(|l| l.green),
            ParamKind::Blue => led.map(|l| l.blue),
            ParamKind::White => led.and_then(|l| l.white),
            ParamKind::Pan => device_type.pan_channel,
            ParamKind::Tilt => device_type.tilt_channel,
            ParamKind::Strobe => device_type.strobe_channel,
            ParamKind::Mode => device_type.mode_channel,
            ParamKind::Dimmer => device_type.dimmer_channel,
        };

        let Some(offset) = offset else {
            tracing::trace!(
                "device {:?} has no channel for {:?} (led {})",
                device.id,
                kind,
                params.led
            );
            continue;
        };

        let channel = u32::from(device.start_channel) + u32::from(offset);
        if channel >= DMX_CHANNELS as u32 {
            return Err(RenderError::ChannelOutOfRange {
                device: device.id.clone(),
                channel,
            });
        }
        writes.push((device.universe, channel as DmxChannel, value));
    }

    Ok(writes)
}
