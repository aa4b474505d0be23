//! On-disk document format
//!
//! Every data file holds any subset of the top-level collections. Entities are
//! listed, not keyed; their `id` becomes the store key on merge.

use serde::{Deserialize, Serialize};
use stagectl_core::{
    DataStore, DmxAnimation, DmxDevice, DmxDeviceGroup, DmxDeviceType, DmxPreset, DmxScene,
    DmxTransition, SetList, Song,
};

/// Contents of a single data file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataDocument {
    pub set_lists: Vec<SetList>,
    pub songs: Vec<Song>,
    pub dmx_scenes: Vec<DmxScene>,
    pub dmx_presets: Vec<DmxPreset>,
    pub dmx_animations: Vec<DmxAnimation>,
    pub dmx_transitions: Vec<DmxTransition>,
    pub dmx_devices: Vec<DmxDevice>,
    pub dmx_device_types: Vec<DmxDeviceType>,
    pub dmx_device_groups: Vec<DmxDeviceGroup>,
}

impl DataDocument {
    /// Number of entities in the document
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

    /// Merge into a store. Entities replace existing ones with the same id.
    pub fn merge_into(self, store: &mut DataStore) {
        fn keyed<T>(items: Vec<T>, id: impl Fn(&T) -> &str) -> Vec<(String, T)> {
            items
                .into_iter()
                .map(|item| (id(&item).to_string(), item))
                .collect()
        }

        store.set_lists.extend(keyed(self.set_lists, |e| e.id.as_str()));
        store.songs.extend(keyed(self.songs, |e| e.id.as_str()));
        store.dmx_scenes.extend(keyed(self.dmx_scenes, |e| e.id.as_str()));
        store.dmx_presets.extend(keyed(self.dmx_presets, |e| e.id.as_str()));
        store
            .dmx_animations
            .extend(keyed(self.dmx_animations, |e| e.id.as_str()));
        store
            .dmx_transitions
            .extend(keyed(self.dmx_transitions, |e| e.id.as_str()));
        store.dmx_devices.extend(keyed(self.dmx_devices, |e| e.id.as_str()));
        store
            .dmx_device_types
            .extend(keyed(self.dmx_device_types, |e| e.id.as_str()));
        store
            .dmx_device_groups
            .extend(keyed(self.dmx_device_groups, |e| e.id.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_entities_win() {
        let doc = DataDocument {
            songs: vec![
                Song {
                    id: "a".into(),
                    name: "first".into(),
                    ..Default::default()
                },
                Song {
                    id: "a".into(),
                    name: "second".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(doc.len(), 2);

        let mut store = DataStore::new();
        doc.merge_into(&mut store);
        assert_eq!(store.songs.len(), 1);
        assert_eq!(store.song("a").map(|s| s.name.as_str()), Some("second"));
    }
}
