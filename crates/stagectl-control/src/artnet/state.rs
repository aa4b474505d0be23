//! Per-universe DMX state table

use std::collections::BTreeMap;

use stagectl_core::{DmxChannel, DmxUniverse, DmxValue, DMX_CHANNELS};

/// Full 512-channel frame of one universe
pub type UniverseData = [DmxValue; DMX_CHANNELS];

/// Last known value of every channel, per universe. Universes appear on their
/// first write and start dark.
#[derive(Debug, Clone, Default)]
pub struct DmxState {
    universes: BTreeMap<DmxUniverse, UniverseData>,
}

impl DmxState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a channel. Returns false for channels outside the universe, which
    /// leave the table untouched.
    pub fn set(&mut self, universe: DmxUniverse, channel: DmxChannel, value: DmxValue) -> bool {
        let index = usize::from(channel);
        if index >= DMX_CHANNELS {
            return false;
        }
        self.universes
            .entry(universe)
            .or_insert([0; DMX_CHANNELS])[index] = value;
        true
    }

    pub fn get(&self, universe: DmxUniverse, channel: DmxChannel) -> Option<DmxValue> {
        self.universes
            .get(&universe)
            .and_then(|data| data.get(usize::from(channel)).copied())
    }

    /// Copy of every universe, in universe order
    pub fn snapshot(&self) -> Vec<(DmxUniverse, UniverseData)> {
        self.universes.iter().map(|(u, data)| (*u, *data)).collect()
    }

    pub fn universe_count(&self) -> usize {
        self.universes.len()
    }
}
