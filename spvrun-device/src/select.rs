//! # Device Selector
//!
//! State-free selection over enumerated platforms and devices, driven by
//! optional name-substring filters. The outcome taxonomy is deliberately
//! fine-grained: "no devices at all", "devices exist but none match the
//! filter", "devices exist but none can ingest the module format", and
//! "the named device exists but cannot ingest the format" are all
//! distinguishable to the caller.

use crate::api::{ApiError, ComputeApi, DeviceDesc, PlatformDesc};
use thiserror::Error;

/// Fixed format identifier a capable device must advertise.
pub const MODULE_FORMAT: &str = "SPIR-V";

/// One platform with its enumerated devices, snapshot for selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Platform {
    pub desc: PlatformDesc,
    pub devices: Vec<DeviceDesc>,
}

/// The chosen platform/device pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub platform: PlatformDesc,
    pub device: DeviceDesc,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("no platforms available")]
    NoPlatforms,

    #[error("no platform name contains {0:?}")]
    NoSuchPlatform(String),

    #[error("platform {0:?} has no devices")]
    NoDevicesAvailable(String),

    #[error("no device name contains {0:?}")]
    NoSuchDevice(String),

    #[error("no device supports ingesting {MODULE_FORMAT} modules")]
    NoCapableDevice,

    #[error("device {0:?} matched the filter but cannot ingest {MODULE_FORMAT} modules")]
    NamedDeviceNotCapable(String),
}

/// Snapshot all platforms and their devices in enumeration order.
pub fn enumerate<A: ComputeApi>(api: &mut A) -> Result<Vec<Platform>, ApiError> {
    let mut platforms = Vec::new();
    for desc in api.platforms()? {
        let devices = api.devices(desc.id)?;
        tracing::debug!(
            platform = %desc.name,
            devices = devices.len(),
            "enumerated platform"
        );
        platforms.push(Platform { desc, devices });
    }
    tracing::debug!(platforms = platforms.len(), "enumeration complete");
    Ok(platforms)
}

/// Select the device to run on.
///
/// - with a platform filter: the first platform whose name contains it must
///   yield a device (its failure is final);
/// - with only a device filter: platforms are tried in order, and
///   "no devices" / "no name match" mean keep looking, while a name match
///   on a non-capable device is immediately fatal;
/// - with no filters: the first capable device of the first platform that
///   has one wins.
pub fn select_device(
    platforms: &[Platform],
    platform_filter: Option<&str>,
    device_filter: Option<&str>,
) -> Result<Selection, SelectError> {
    if platforms.is_empty() {
        return Err(SelectError::NoPlatforms);
    }

    if let Some(filter) = platform_filter {
        let platform = platforms
            .iter()
            .find(|p| p.desc.name.contains(filter))
            .ok_or_else(|| SelectError::NoSuchPlatform(filter.to_string()))?;
        let device = pick_device(platform, device_filter)?;
        return Ok(Selection {
            platform: platform.desc.clone(),
            device: device.clone(),
        });
    }

    if let Some(filter) = device_filter {
        for platform in platforms {
            match pick_device(platform, Some(filter)) {
                Ok(device) => {
                    return Ok(Selection {
                        platform: platform.desc.clone(),
                        device: device.clone(),
                    })
                }
                Err(SelectError::NoDevicesAvailable(_)) | Err(SelectError::NoSuchDevice(_)) => {
                    continue
                }
                Err(fatal) => return Err(fatal),
            }
        }
        return Err(SelectError::NoSuchDevice(filter.to_string()));
    }

    for platform in platforms {
        if let Some(device) = platform
            .devices
            .iter()
            .find(|d| d.supports_module_format(MODULE_FORMAT))
        {
            return Ok(Selection {
                platform: platform.desc.clone(),
                device: device.clone(),
            });
        }
    }
    Err(SelectError::NoCapableDevice)
}

/// Device-selection rule within one platform.
fn pick_device<'a>(
    platform: &'a Platform,
    device_filter: Option<&str>,
) -> Result<&'a DeviceDesc, SelectError> {
    if platform.devices.is_empty() {
        return Err(SelectError::NoDevicesAvailable(platform.desc.name.clone()));
    }

    match device_filter {
        Some(filter) => {
            let device = platform
                .devices
                .iter()
                .find(|d| d.name.contains(filter))
                .ok_or_else(|| SelectError::NoSuchDevice(filter.to_string()))?;
            if !device.supports_module_format(MODULE_FORMAT) {
                return Err(SelectError::NamedDeviceNotCapable(device.name.clone()));
            }
            Ok(device)
        }
        None => platform
            .devices
            .iter()
            .find(|d| d.supports_module_format(MODULE_FORMAT))
            .ok_or(SelectError::NoCapableDevice),
    }
}
