//! A transient mutator over a device's controllable state: accumulates
//! setter calls against a snapshot of [`ControllableStatus`] and
//! [`ControlSettings`], then serialises into one `0x40` set-command.
//!
//! A `DeviceControl` value lives only as long as it takes to gather the
//! changes for one command; it borrows nothing from its parent model and is
//! always constructed fresh from a snapshot.

use thiserror::Error;

use crate::capabilities::Capabilities;
use crate::device::DeviceModel;
use crate::status::{ControlSettings, ControllableStatus, FanSpeed, OperationMode, Preset, ReadableStatus};

/// Errors from attempting an unsupported transition. Each carries the value
/// the caller tried to set so logging/UI can report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("appliance does not support mode {0:?}")]
    UnsupportedMode(OperationMode),
    #[error("appliance does not support fan speed {0}")]
    UnsupportedFanSpeed(u8),
    #[error("appliance does not support preset {0:?}")]
    UnsupportedPreset(Preset),
}

#[derive(Debug, Clone)]
pub struct DeviceControl {
    power: bool,
    mode: OperationMode,
    horizontal_swing: bool,
    vertical_swing: bool,
    target_temp_half_degrees: u8,
    fan_speed: u8,
    preset: Preset,
    humidity_setpoint: u8,
    timers: crate::status::DeviceTimers,
    settings: ControlSettings,
    clean_fan_time: bool,
    old_changed: bool,
}

impl DeviceControl {
    /// Snapshots the controllable fields and UI settings of `model`.
    pub fn from_model(model: &DeviceModel) -> Self {
        let c: &ControllableStatus = &model.controllable;
        Self {
            power: c.power,
            mode: c.mode,
            horizontal_swing: c.horizontal_swing,
            vertical_swing: c.vertical_swing,
            target_temp_half_degrees: c.target_temp_half_degrees,
            fan_speed: c.fan_speed,
            preset: c.preset,
            humidity_setpoint: c.humidity_setpoint,
            timers: c.timers,
            settings: model.control_settings,
            clean_fan_time: false,
            old_changed: false,
        }
    }

    pub fn old_changed(&self) -> bool {
        self.old_changed
    }

    pub fn set_power_status(&mut self, on: bool) {
        self.power = on;
    }

    /// Switching mode also clears any active preset and turns the unit on,
    /// then re-applies the mode's fan-speed constraint (AUTO/DRY/DRY_CUSTOM
    /// force fan speed to auto).
    pub fn set_mode(&mut self, mode: OperationMode, capabilities: &Capabilities) -> Result<(), ControlError> {
        if self.power && mode == self.mode {
            return Ok(());
        }
        if !capabilities.has_mode(mode) {
            return Err(ControlError::UnsupportedMode(mode));
        }
        self.mode = mode;
        self.preset = Preset::None;
        self.power = true;
        self.old_changed = true;
        self.apply_fan_constraints(capabilities);
        Ok(())
    }

    fn apply_fan_constraints(&mut self, capabilities: &Capabilities) {
        if matches!(self.mode, OperationMode::Auto | OperationMode::Dry | OperationMode::DryCustom) {
            // Best-effort: the auto-fan override should never itself fail
            // capability validation on a conformant appliance.
            let _ = self.set_fan_speed(FanSpeed::AUTO, capabilities);
        }
    }

    pub fn set_target_temp_int(&mut self, value: u8) {
        if value == self.target_temp_half_degrees {
            return;
        }
        self.target_temp_half_degrees = value;
        self.old_changed = true;
    }

    /// `celsius` is whole-degree Celsius; converts to the half-degree wire
    /// unit with the usual round-half-up.
    pub fn set_target_temp(&mut self, celsius: f32) {
        self.set_target_temp_int((celsius * 2.0 + 0.5) as u8);
    }

    pub fn set_vertical_swing(&mut self, on: bool) {
        self.vertical_swing = on;
    }

    pub fn set_horizontal_swing(&mut self, on: bool) {
        self.horizontal_swing = on;
    }

    pub fn set_fan_speed(&mut self, value: u8, capabilities: &Capabilities) -> Result<(), ControlError> {
        if value == self.fan_speed {
            return Ok(());
        }
        if !capabilities.has_fan_speed(value) {
            return Err(ControlError::UnsupportedFanSpeed(value));
        }
        self.fan_speed = value;
        self.preset = Preset::None;
        self.old_changed = true;
        Ok(())
    }

    pub fn set_preset(&mut self, preset: Preset, capabilities: &Capabilities) -> Result<(), ControlError> {
        let supported = match preset {
            Preset::None | Preset::Sleep => true,
            Preset::Turbo => match self.mode {
                OperationMode::Heat => capabilities.has_turbo_heat(),
                _ => capabilities.has_turbo_cool(),
            },
            Preset::Eco => capabilities.has_eco(),
            Preset::FrostProtection => capabilities.has_eight_heat(),
        };
        if !supported {
            return Err(ControlError::UnsupportedPreset(preset));
        }
        self.preset = preset;
        Ok(())
    }

    pub fn set_target_humidity(&mut self, humidity: u8) {
        self.humidity_setpoint = humidity;
    }

    /// Marks the filter-clean acknowledgement bit to send, mirroring
    /// whatever the parent model currently reports as the filter-full flag.
    pub fn clear_filter_maintenance(&mut self, readable: &ReadableStatus) {
        self.clean_fan_time = readable.filter_full;
    }

    /// Disabling the on-timer when already powered (and vice versa for the
    /// off-timer) matches the firmware's own interlock.
    pub fn set_time_on(&mut self, minutes: u32) {
        self.timers.set_time_on(if self.power { 0 } else { minutes });
    }

    pub fn set_time_off(&mut self, minutes: u32) {
        self.timers.set_time_off(if self.power { minutes } else { 0 });
    }

    /// Builds the 23-byte `0x40` set-command body. `readable` supplies the
    /// opaque flags that must be echoed back verbatim; `capabilities`
    /// supplies the mode's temperature range and the electric-heater flag.
    pub fn build_set_command(&self, readable: &ReadableStatus, capabilities: &Capabilities) -> Vec<u8> {
        let range = capabilities.temp_range(self.mode);
        let temp = range.clamp(self.target_temp_half_degrees);
        let dot_temp = temp % 2;
        let new_temp = temp / 2 - 12;
        let old_temp = (temp / 2).clamp(17, 30) - 16;
        let ptc_assis = self.mode == OperationMode::Heat && capabilities.has_electric_heater();

        let mut data = vec![0u8; 23];
        data[0] = 0x40;
        data[1] = (u8::from(self.settings.beeper_feedback) << 6)
            | (u8::from(readable.test2) << 5)
            | (u8::from(readable.timer_mode) << 4)
            | (u8::from(readable.child_sleep_mode) << 3)
            | (u8::from(readable.imode_resume) << 2)
            | (1 << 1)
            | u8::from(self.power);
        data[2] = (self.mode.as_raw() << 5) | (dot_temp << 4) | (old_temp & 0x0F);
        data[3] = self.fan_speed;
        let timer_bytes = self.timers.to_bytes();
        data[4..7].copy_from_slice(&timer_bytes);
        data[7] = 0x30 | (u8::from(self.vertical_swing) * 0b1100) | (u8::from(self.horizontal_swing) * 0b0011);
        data[8] = (u8::from(readable.feel_own) << 7)
            | (u8::from(self.preset == Preset::Turbo) << 5)
            | (u8::from(readable.low_freq_fan) << 4)
            | (u8::from(readable.save) << 3)
            | readable.cosy_sleep;
        data[9] = (u8::from(self.preset == Preset::Eco) << 7)
            | (u8::from(readable.clean_up) << 5)
            | (u8::from(ptc_assis) << 3)
            | (u8::from(readable.dry_clean) << 2)
            | (u8::from(readable.exchange_air) << 1);
        data[10] = (u8::from(self.clean_fan_time) << 7)
            | (u8::from(readable.filter_full) << 6)
            | (u8::from(readable.peak_elec) << 5)
            | (u8::from(readable.night_light) << 4)
            | (u8::from(readable.catch_cold) << 3)
            | (u8::from(self.settings.display_unit == crate::status::TemperatureUnit::Fahrenheit) << 2)
            | (u8::from(self.preset == Preset::Turbo) << 1)
            | u8::from(self.preset == Preset::Sleep);
        data[15] = u8::from(readable.natural_fan) << 6;
        data[18] = new_temp;
        data[19] = self.humidity_setpoint;
        data[21] = (u8::from(self.preset == Preset::FrostProtection) << 7)
            | (u8::from(readable.double_temp) << 6)
            | readable.set_expand;

        crate::payload::set_command(&data)
    }
}
