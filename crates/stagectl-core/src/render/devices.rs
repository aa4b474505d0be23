//! Resolution of device and group selectors into concrete fixtures

use crate::dmx::{DmxDevice, DmxDeviceParams, DmxDeviceSelector, DmxDeviceType};
use crate::error::{EntityKind, RenderError, Result};
use crate::store::DataStore;

/// A device together with its channel map
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedDevice<'a> {
    pub device: &'a DmxDevice,
    pub device_type: &'a DmxDeviceType,
}

/// Resolve the target of a device params entry. Exactly one of device and
/// group must be set; groups expand to their members, duplicates removed.
pub(crate) fn resolve_targets<'a>(
    store: &'a DataStore,
    params: &DmxDeviceParams,
    context: &str,
) -> Result<Vec<ResolvedDevice<'a>>> {
    let devices = match (&params.group, &params.device) {
        (Some(group), None) => {
            let group = store.device_group(&group.id).ok_or_else(|| {
                RenderError::not_found(EntityKind::DeviceGroup, &group.id, context)
            })?;

            let mut members: Vec<&DmxDevice> = Vec::new();
            for selector in &group.devices {
                for device in expand_selector(store, selector, context)? {
                    if !members.iter().any(|m| m.id == device.id) {
                        members.push(device);
                    }
                }
            }
            members
        }
        (None, Some(selector)) => expand_selector(store, selector, context)?,
        (Some(_), Some(_)) => {
            return Err(RenderError::InvalidSelector(format!(
                "{}: both device and group are set",
                context
            )))
        }
        (None, None) => {
            return Err(RenderError::InvalidSelector(format!(
                "{}: neither device nor group is set",
                context
            )))
        }
    };

    devices
        .into_iter()
        .map(|device| {
            let device_type = store.device_type(&device.type_id).ok_or_else(|| {
                RenderError::not_found(
                    EntityKind::DeviceType,
                    &device.type_id,
                    format!("{}, device {:?}", context, device.id),
                )
            })?;
            Ok(ResolvedDevice {
                device,
                device_type,
            })
        })
        .collect()
}

fn expand_selector<'a>(
    store: &'a DataStore,
    selector: &DmxDeviceSelector,
    context: &str,
) -> Result<Vec<&'a DmxDevice>> {
    if !selector.id.is_empty() {
        let device = store
            .device(&selector.id)
            .ok_or_else(|| RenderError::not_found(EntityKind::Device, &selector.id, context))?;
        return Ok(vec![device]);
    }

    if !selector.tags.is_empty() {
        let devices: Vec<_> = store.devices_by_tags(&selector.tags).collect();
        if devices.is_empty() {
            tracing::debug!("{}: no device matches tags {:?}", context, selector.tags);
        }
        return Ok(devices);
    }

    Err(RenderError::InvalidSelector(format!(
        "{}: device selector needs an id or tags",
        context
    )))
}
