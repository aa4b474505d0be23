//! In-memory entity store
//!
//! The store is filled once by a loader and then shared read-only with the
//! renderer and the player. Lookups return `None` for unknown ids.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dmx::{
    DmxAnimation, DmxDevice, DmxDeviceGroup, DmxDeviceType, DmxPreset, DmxScene, DmxTransition,
};
use crate::song::{SetList, Song};

/// Keyed collections of everything a show is built from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStore {
    pub set_lists: BTreeMap<String, SetList>,
    pub songs: BTreeMap<String, Song>,
    pub dmx_scenes: BTreeMap<String, DmxScene>,
    pub dmx_presets: BTreeMap<String, DmxPreset>,
    pub dmx_animations: BTreeMap<String, DmxAnimation>,
    pub dmx_transitions: BTreeMap<String, DmxTransition>,
    pub dmx_devices: BTreeMap<String, DmxDevice>,
    pub dmx_device_types: BTreeMap<String, DmxDeviceType>,
    pub dmx_device_groups: BTreeMap<String, DmxDeviceGroup>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn song(&self, id: &str) -> Option<&Song> {
        self.songs.get(id)
    }

    pub fn set_list(&self, id: &str) -> Option<&SetList> {
        self.set_lists.get(id)
    }

    pub fn scene(&self, id: &str) -> Option<&DmxScene> {
        self.dmx_scenes.get(id)
    }

    pub fn preset(&self, id: &str) -> Option<&DmxPreset> {
        self.dmx_presets.get(id)
    }

    pub fn animation(&self, id: &str) -> Option<&DmxAnimation> {
        self.dmx_animations.get(id)
    }

    pub fn transition(&self, id: &str) -> Option<&DmxTransition> {
        self.dmx_transitions.get(id)
    }

    pub fn device(&self, id: &str) -> Option<&DmxDevice> {
        self.dmx_devices.get(id)
    }

    pub fn device_type(&self, id: &str) -> Option<&DmxDeviceType> {
        self.dmx_device_types.get(id)
    }

    pub fn device_group(&self, id: &str) -> Option<&DmxDeviceGroup> {
        self.dmx_device_groups.get(id)
    }

    /// Devices carrying all of the given tags, ordered by id
    pub fn devices_by_tags<'s, 't>(
        &'s self,
        tags: &'t [String],
    ) -> impl Iterator<Item = &'s DmxDevice> + 't
    where
        's: 't,
    {
        self.dmx_devices
            .values()
            .filter(move |device| device.has_tags(tags))
    }

    /// Merge another store into this one. Entities of `other` replace
    /// entities with the same id.
    pub fn merge(&mut self, other: DataStore) {
        self.set_lists.extend(other.set_lists);
        self.songs.extend(other.songs);
        self.dmx_scenes.extend(other.dmx_scenes);
        self.dmx_presets.extend(other.dmx_presets);
        self.dmx_animations.extend(other.dmx_animations);
        self.dmx_transitions.extend(other.dmx_transitions);
        self.dmx_devices.extend(other.dmx_devices);
        self.dmx_device_types.extend(other.dmx_device_types);
        self.dmx_device_groups.extend(other.dmx_device_groups);
    }

    /// Total number of entities in the store
    pub fn len(&self) -> usize {
        self.set_lists.len()
            + self.songs.len()
            + self.dmx_scenes.len()
            + self.dmx_presets.len()
            + self.dmx_animations.len()
            + self.dmx_transitions.len()
            + self.dmx_devices.len()
            + self.dmx_device_types.len()
            + self.dmx_device_groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
