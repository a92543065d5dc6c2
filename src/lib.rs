//! Half-duplex UART gateway stack bridging a Midea air conditioner to a
//! cloud/LAN controller: ties [`midea_dongle_core`]'s appliance-agnostic
//! framing and scheduler to [`midea_ac`]'s payload codec and device model
//! behind one small [`MideaAcSession`] surface.

mod config;
mod error;
mod surface;

pub use config::SchedulerConfig;
pub use error::Error;
pub use surface::{AutoconfStatus, MideaAcSession};

pub use midea_ac::{
    Capabilities, ControlError, ControlSettings, ControllableStatus, DeviceControl, DeviceModel,
    DeviceTimers, FanSpeed, OperationMode, Preset, ReadableStatus, TemperatureUnit,
};
pub use midea_dongle_core::{LinkKind, LinkState, NetworkStatus, SchedulerError, Transport};
