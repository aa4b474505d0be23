//! DMX show content: devices, groups, scenes and the parameter layers
//! (presets, animations, transitions) that are composited onto them.

use serde::{Deserialize, Serialize};

use crate::command::{DmxChannel, DmxUniverse, DmxValue};

/// Free-form label attached to devices, used by tag selectors
pub type Tag = String;

/// Channel layout of a single LED segment, relative to the device start channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Led {
    pub position: u16,
    pub red: DmxChannel,
    pub green: DmxChannel,
    pub blue: DmxChannel,
    #[serde(default)]
    pub white: Option<DmxChannel>,
}

/// Channel map shared by every device of one model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmxDeviceType {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub leds: Vec<Led>,
    #[serde(default)]
    pub strobe_channel: Option<DmxChannel>,
    #[serde(default)]
    pub dimmer_channel: Option<DmxChannel>,
    #[serde(default)]
    pub mode_channel: Option<DmxChannel>,
    #[serde(default)]
    pub pan_channel: Option<DmxChannel>,
    #[serde(default)]
    pub tilt_channel: Option<DmxChannel>,
}

impl DmxDeviceType {
    /// Look up the LED mapped to the given position
    pub fn led(&self, position: u16) -> Option<&Led> {
        self.leds.iter().find(|led| led.position == position)
    }
}

/// A physical fixture patched into a universe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmxDevice {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub type_id: String,
    pub universe: DmxUniverse,
    pub start_channel: DmxChannel,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl DmxDevice {
    /// Returns true if the device carries every one of the given tags
    pub fn has_tags(&self, tags: &[Tag]) -> bool {
        tags.iter().all(|tag| self.tags.contains(tag))
    }
}

/// Selects devices either by id or by a set of tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmxDeviceSelector {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Selects a device group by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmxDeviceGroupSelector {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Named collection of device selectors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmxDeviceGroup {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub devices: Vec<DmxDeviceSelector>,
}

/// Generic by-id reference used for presets, animations and transitions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Sparse channel values for one LED of a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmxParams {
    #[serde(default)]
    pub led: u16,
    #[serde(default)]
    pub red: Option<DmxValue>,
    #[serde(default)]
    pub green: Option<DmxValue>,
    #[serde(default)]
    pub blue: Option<DmxValue>,
    #[serde(default)]
    pub white: Option<DmxValue>,
    #[serde(default)]
    pub pan: Option<DmxValue>,
    #[serde(default)]
    pub tilt: Option<DmxValue>,
    #[serde(default)]
    pub strobe: Option<DmxValue>,
    #[serde(default)]
    pub mode: Option<DmxValue>,
    #[serde(default)]
    pub dimmer: Option<DmxValue>,
}

/// Addressable parameter of a device, independent of its channel map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamKind {
    Red,
    Green,
    Blue,
    White,
    Pan,
    Tilt,
    Strobe,
    Mode,
    Dimmer,
}

impl ParamKind {
    pub const ALL: [ParamKind; 9] = [
        ParamKind::Red,
        ParamKind::Green,
        ParamKind::Blue,
        ParamKind::White,
        ParamKind::Pan,
        ParamKind::Tilt,
        ParamKind::Strobe,
        ParamKind::Mode,
        ParamKind::Dimmer,
    ];
}

impl DmxParams {
    /// Value set for the given parameter, if any
    pub fn get(&self, kind: ParamKind) -> Option<DmxValue> {
        match kind {
            ParamKind::Red => self.red,
            ParamKind::Green => self.green,
            ParamKind::Blue => self.blue,
            ParamKind::White => self.white,
            ParamKind::Pan => self.pan,
            ParamKind::Tilt => self.tilt,
            ParamKind::Strobe => self.strobe,
            ParamKind::Mode => self.mode,
            ParamKind::Dimmer => self.dimmer,
        }
    }

    pub fn set(&mut self, kind: ParamKind, value: Option<DmxValue>) {
        let slot = match kind {
            ParamKind::Red => &mut self.red,
            ParamKind::Green => &mut self.green,
            ParamKind::Blue => &mut self.blue,
            ParamKind::White => &mut self.white,
            ParamKind::Pan => &mut self.pan,
            ParamKind::Tilt => &mut self.tilt,
            ParamKind::Strobe => &mut self.strobe,
            ParamKind::Mode => &mut self.mode,
            ParamKind::Dimmer => &mut self.dimmer,
        };
        *slot = value;
    }

    /// Iterate all parameters that carry a value
    pub fn values(&self) -> impl Iterator<Item = (ParamKind, DmxValue)> + '_ {
        ParamKind::ALL
            .into_iter()
            .filter_map(move |kind| self.get(kind).map(|v| (kind, v)))
    }
}

/// Parameters for a device or a device group, optionally animated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmxDeviceParams {
    #[serde(default)]
    pub group: Option<DmxDeviceGroupSelector>,
    #[serde(default)]
    pub device: Option<DmxDeviceSelector>,
    #[serde(default)]
    pub params: Vec<DmxParams>,
    #[serde(default)]
    pub animation: Option<Selector>,
    #[serde(default)]
    pub transition: Option<Selector>,
}

/// Part of a scene that fires at one or more offsets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmxSubScene {
    /// Frame offsets relative to the scene start
    #[serde(default)]
    pub at: Vec<u64>,
    #[serde(default)]
    pub device_params: Vec<DmxDeviceParams>,
    #[serde(default)]
    pub preset: Option<Selector>,
}

/// A reusable light sequence with its own metre
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmxScene {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub note_value: u8,
    pub note_count: u16,
    #[serde(default)]
    pub sub_scenes: Vec<DmxSubScene>,
}

/// Static default parameters, applied underneath everything else
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmxPreset {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub device_params: Vec<DmxDeviceParams>,
}

/// Keyframe of an animation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmxAnimationFrame {
    pub at: u8,
    pub params: DmxParams,
}

/// Params looped over `length` frames
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmxAnimation {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub length: u8,
    #[serde(default)]
    pub frames: Vec<DmxAnimationFrame>,
}

/// Start and end state of a transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmxTransitionParams {
    pub from: DmxParams,
    pub to: DmxParams,
}

/// Eased interpolation between parameter states
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmxTransition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Name of the ease function, see [`crate::ease::EaseFunction`]
    pub ease: String,
    pub length: u8,
    #[serde(default)]
    pub params: Vec<DmxTransitionParams>,
}
