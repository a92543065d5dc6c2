//! Appliance-specific payload codec, property stream, capability decode and
//! device model for Midea-family air conditioners.
//!
//! Sits on top of [`midea_dongle_core`], which only understands the outer
//! carrier frame; everything here is about what lives inside its payload.

mod capabilities;
mod control;
mod crc;
mod device;
pub mod payload;
mod property;
mod status;

pub use capabilities::{Capabilities, TempRange};
pub use control::{ControlError, DeviceControl};
pub use device::DeviceModel;
pub use property::{Property, PropertyStream};
pub use status::{
    AirFlowDirection, BreezelessMode, ControlSettings, ControllableStatus, DeviceTimers, FanSpeed,
    OperationMode, Preset, ReadableStatus, TemperatureUnit,
};
