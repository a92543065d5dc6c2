//! The aggregate device model: capabilities plus the readable/controllable
//! status, composed rather than inherited (see the design notes on why the
//! source's multiple-inheritance hierarchy is flattened here).

use log::debug;

use crate::capabilities::Capabilities;
use crate::payload::type_id;
use crate::property;
use crate::status::{
    BreezelessMode, ControlSettings, ControllableStatus, DeviceTimers, OperationMode, Preset,
    ReadableStatus, TemperatureUnit,
};

/// Composition of the four state sub-records that make up a device's
/// observed state. Capabilities are filled once at session start and then
/// treated as immutable; the rest is overwritten on every matching report.
#[derive(Debug, Clone, Default)]
pub struct DeviceModel {
    pub capabilities: Capabilities,
    pub readable: ReadableStatus,
    pub controllable: ControllableStatus,
    pub control_settings: ControlSettings,
}

fn bit(byte: u8, index: u32) -> bool {
    byte & (1u8 << index) != 0
}

fn bits(byte: u8, shift: u32, width: u32) -> u8 {
    (byte >> shift) & ((1u16 << width) - 1) as u8
}

/// `t = (raw − 50) × 0.5`, `NaN` if `raw == 0xFF`; if a decimal nibble is
/// present it refines the result, with the decimal reflected-signed for
/// sub-25°C readings.
fn decode_temperature(raw: u8, decimal: u8) -> f32 {
    if raw == 0xFF {
        return f32::NAN;
    }
    let mut value = raw as i32 * 5;
    let mut decimal = decimal as i32;
    if decimal >= 5 {
        decimal -= 5;
    }
    value -= 250;
    if value < 0 {
        decimal = -decimal;
    }
    (value + decimal) as f32 * 0.1
}

fn bcd_digit(byte: u8) -> u32 {
    (byte / 16) as u32 * 10 + (byte % 16) as u32
}

fn decode_bcd_power(bcd: [u8; 3]) -> f32 {
    let value = 10000 * bcd_digit(bcd[0]) + 100 * bcd_digit(bcd[1]) + bcd_digit(bcd[2]);
    value as f32 * 0.1
}

fn decode_preset(sleep_func: bool, turbo1: bool, turbo2: bool, eco: bool, eight_hot: bool) -> Preset {
    if sleep_func {
        Preset::Sleep
    } else if turbo1 || turbo2 {
        Preset::Turbo
    } else if eco {
        Preset::Eco
    } else if eight_hot {
        Preset::FrostProtection
    } else {
        Preset::None
    }
}

/// Reproduces the two co-existing target-temperature encodings a `0x40`
/// command must carry (see [`crate::control::build_set_command`]): firmware
/// versions disagree on which of byte 2 and byte 18 they respect.
pub fn decode_target_temp(new_temp: u8, old_temp: u8, dot_temp: bool, is_legacy_layout: bool) -> u8 {
    let value = if new_temp != 0 || !is_legacy_layout {
        new_temp as u32 + 12
    } else {
        old_temp as u32 + 16
    };
    (value * 2 + dot_temp as u32) as u8
}

impl DeviceModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one inbound Midea-layer payload: validates and strips its
    /// trailing CRC-8/MAXIM byte, then dispatches on the type byte. A CRC
    /// mismatch drops the frame (it is left to the scheduler to retry);
    /// unknown types are logged and ignored.
    pub fn apply_report(&mut self, payload: &[u8]) {
        let Some(body) = Self::strip_crc(payload) else {
            return;
        };
        let Some(&type_byte) = body.first() else {
            return;
        };
        match type_byte {
            type_id::STATUS_A0 => self.apply_a0(body),
            type_id::STATUS_C0 => self.apply_c0(body),
            type_id::STATUS_A1 => self.apply_a1(body),
            type_id::STATUS_C1 => self.apply_c1(body),
            type_id::PROPERTY_GET | type_id::PROPERTY_SET => {
                self.apply_properties(body);
            }
            type_id::CAPABILITY_REPORT => {
                self.apply_capabilities_body(body);
            }
            other => debug!("ignoring status report of unknown type 0x{other:02X}"),
        }
    }

    /// Applies one `0xB5` capability-report payload (CRC included) and
    /// returns the continuation id (`0` once the appliance has nothing more
    /// to report, or if the frame's CRC doesn't validate).
    pub fn apply_capabilities(&mut self, payload: &[u8]) -> u8 {
        match Self::strip_crc(payload) {
            Some(body) => self.apply_capabilities_body(body),
            None => 0,
        }
    }

    fn apply_capabilities_body(&mut self, body: &[u8]) -> u8 {
        let (stream, next_id) = property::iter(body);
        for record in stream {
            self.capabilities.apply_property(record);
        }
        next_id
    }

    fn apply_properties(&mut self, body: &[u8]) -> u8 {
        let (stream, next_id) = property::iter(body);
        for record in stream {
            self.apply_property(record);
        }
        next_id
    }

    /// Validates the trailing CRC-8/MAXIM byte and returns the payload with
    /// it stripped off, so callers (and [`property::iter`]'s continuation-id
    /// detection) never see it as data.
    fn strip_crc(payload: &[u8]) -> Option<&[u8]> {
        if !crate::payload::validate(payload) {
            debug!("dropping report with invalid CRC ({} bytes)", payload.len());
            return None;
        }
        Some(&payload[..payload.len() - 1])
    }

    fn apply_property(&mut self, record: property::Property<'_>) {
        let byte0 = record.data.first().copied().unwrap_or(0);
        match record.uuid {
            0x0009 => self.controllable.v_wind_direction = byte0,
            0x000A => self.controllable.h_wind_direction = byte0,
            0x0043 => self.controllable.breezeless_mode = BreezelessMode::from_raw(byte0),
            0x022C => self.controllable.buzzer_on = byte0 != 0,
            0x0018 => self.controllable.silky_cool_on = byte0 != 0,
            0x0032 => self.controllable.wind_on_me_on = byte0 != 0,
            0x0033 => self.controllable.wind_off_me_on = byte0 != 0,
            0x0042 => self.controllable.breeze_away_on = byte0 != 0,
            0x0030 => self.controllable.smart_eye_on = byte0 != 0,
            0x0039 => self.controllable.self_clean_on = byte0 != 0,
            0x0015 => self.readable.indoor_humidity = byte0,
            other => debug!("ignoring property UUID 0x{other:04X}"),
        }
    }

    /// 14(+1)-byte modern status report (struct byte `N` lives at `payload[N]`;
    /// `payload[0]` is the type byte itself, there is no separate id byte).
    fn apply_a0(&mut self, payload: &[u8]) {
        if payload.len() < 15 {
            debug!("A0 status report too short: {} bytes", payload.len());
            return;
        }
        let b1 = payload[1];
        let power = bit(b1, 0);
        let new_temp = bits(b1, 1, 5);
        let dot_temp = bit(b1, 6);
        let err_mark = bit(b1, 7);

        let mode = OperationMode::from_raw(bits(payload[2], 0, 3));
        let fan_speed = bits(payload[3], 0, 7);
        let timers = DeviceTimers::from_bytes([payload[4], payload[5], payload[6]]);

        let b7 = payload[7];
        let horizontal_swing = bits(b7, 0, 2) != 0;
        let vertical_swing = bits(b7, 2, 2) != 0;

        let b8 = payload[8];
        let cosy_sleep = bits(b8, 0, 2);
        let save = bit(b8, 3);
        let low_freq_fan = bit(b8, 4);
        let turbo1 = bit(b8, 5);
        let feel_own = bit(b8, 7);

        let b9 = payload[9];
        let exchange_air = bit(b9, 1);
        let dry_clean = bit(b9, 2);
        let eco = bit(b9, 4);
        let clean_up = bit(b9, 5);
        let temp_unit = bit(b9, 7);

        let b10 = payload[10];
        let sleep_func = bit(b10, 0);
        let turbo2 = bit(b10, 1);
        let catch_cold = bit(b10, 3);
        let night_light = bit(b10, 4);
        let peak_elec = bit(b10, 5);
        let natural_fan = bit(b10, 6);

        let light = bits(payload[11], 4, 3);

        let b12 = payload[12];
        let set_expand = bits(b12, 0, 6);
        let double_temp = bit(b12, 6);
        let eight_hot = bit(b12, 7);

        let humidity = bits(payload[13], 0, 7);
        let has_no_wind_feel = bit(payload[14], 3);
        let _ = has_no_wind_feel; // preserved for symmetry with C0, not separately exposed

        self.controllable.power = power;
        self.controllable.mode = mode;
        self.controllable.fan_speed = fan_speed;
        self.controllable.horizontal_swing = horizontal_swing;
        self.controllable.vertical_swing = vertical_swing;
        self.controllable.timers = timers;
        self.controllable.target_temp_half_degrees = decode_target_temp(new_temp, 0, dot_temp, false);
        self.controllable.preset = decode_preset(sleep_func, turbo1, turbo2, eco, eight_hot);
        self.controllable.humidity_setpoint = humidity;

        self.readable.error_code = u8::from(err_mark);
        self.readable.indoor_humidity = humidity;
        self.readable.cosy_sleep = cosy_sleep;
        self.readable.save = save;
        self.readable.low_freq_fan = low_freq_fan;
        self.readable.feel_own = feel_own;
        self.readable.natural_fan = natural_fan;
        self.readable.dry_clean = dry_clean;
        self.readable.clean_up = clean_up;
        self.readable.exchange_air = exchange_air;
        self.readable.night_light = night_light;
        self.readable.catch_cold = catch_cold;
        self.readable.peak_elec = peak_elec;
        self.readable.set_expand = set_expand;
        self.readable.double_temp = double_temp;
        self.readable.light_on = !(light != 0);

        self.control_settings.display_unit = if temp_unit {
            TemperatureUnit::Fahrenheit
        } else {
            TemperatureUnit::Celsius
        };
    }

    /// 22(+1)-byte legacy status report; carries raw in/out temperatures and
    /// the legacy `oldTemp` target-temperature fallback. Struct byte `N`
    /// lives at `payload[N]`; `payload[0]` is the type byte itself.
    fn apply_c0(&mut self, payload: &[u8]) {
        if payload.len() < 22 {
            debug!("C0 status report too short: {} bytes", payload.len());
            return;
        }
        let b1 = payload[1];
        let power = bit(b1, 0);
        let err_mark = bit(b1, 7);

        let b2 = payload[2];
        let old_temp = bits(b2, 0, 4);
        let dot_temp = bit(b2, 4);
        let mode = OperationMode::from_raw(bits(b2, 5, 3));

        let fan_speed = bits(payload[3], 0, 7);
        let timers = DeviceTimers::from_bytes([payload[4], payload[5], payload[6]]);

        let b7 = payload[7];
        let horizontal_swing = bits(b7, 0, 2) != 0;
        let vertical_swing = bits(b7, 2, 2) != 0;

        let b8 = payload[8];
        let cosy_sleep = bits(b8, 0, 2);
        let save = bit(b8, 3);
        let low_freq_fan = bit(b8, 4);
        let turbo1 = bit(b8, 5);
        let feel_own = bit(b8, 7);

        let b9 = payload[9];
        let child_sleep_mode = bit(b9, 0);
        let natural_fan = bit(b9, 1);
        let dry_clean = bit(b9, 2);
        let eco = bit(b9, 4);
        let clean_up = bit(b9, 5);

        let b10 = payload[10];
        let sleep_func = bit(b10, 0);
        let turbo2 = bit(b10, 1);
        let temp_unit = bit(b10, 2);
        let exchange_air = bit(b10, 3);
        let night_light = bit(b10, 4);
        let catch_cold = bit(b10, 5);
        let peak_elec = bit(b10, 6);

        let in_temp_raw = payload[11];
        let out_temp_raw = payload[12];

        let new_temp = bits(payload[13], 0, 5);
        let dus_full = bit(payload[13], 5);

        let light = bits(payload[14], 4, 3);

        let b16 = payload[15];
        let in_temp_dec = bits(b16, 0, 4);
        let out_temp_dec = bits(b16, 4, 4);

        let err_info = payload[16];
        let humidity = bits(payload[19], 0, 7);

        let b22 = payload[21];
        let set_expand = bits(b22, 0, 6);
        let double_temp = bit(b22, 6);
        let eight_hot = bit(b22, 7);

        self.controllable.power = power;
        self.controllable.mode = mode;
        self.controllable.fan_speed = fan_speed;
        self.controllable.horizontal_swing = horizontal_swing;
        self.controllable.vertical_swing = vertical_swing;
        self.controllable.timers = timers;
        self.controllable.target_temp_half_degrees =
            decode_target_temp(new_temp, old_temp, dot_temp, true);
        self.controllable.preset = decode_preset(sleep_func, turbo1, turbo2, eco, eight_hot);
        self.controllable.humidity_setpoint = humidity;

        self.readable.indoor_temp_celsius = decode_temperature(in_temp_raw, in_temp_dec);
        self.readable.outdoor_temp_celsius = decode_temperature(out_temp_raw, out_temp_dec);
        self.readable.error_code = if err_mark { err_info } else { 0 };
        self.readable.indoor_humidity = humidity;
        self.readable.filter_full = dus_full;
        self.readable.child_sleep_mode = child_sleep_mode;
        self.readable.cosy_sleep = cosy_sleep;
        self.readable.save = save;
        self.readable.low_freq_fan = low_freq_fan;
        self.readable.feel_own = feel_own;
        self.readable.natural_fan = natural_fan;
        self.readable.dry_clean = dry_clean;
        self.readable.clean_up = clean_up;
        self.readable.exchange_air = exchange_air;
        self.readable.night_light = night_light;
        self.readable.catch_cold = catch_cold;
        self.readable.peak_elec = peak_elec;
        self.readable.set_expand = set_expand;
        self.readable.double_temp = double_temp;
        self.readable.light_on = !(light != 0);

        self.control_settings.display_unit = if temp_unit {
            TemperatureUnit::Fahrenheit
        } else {
            TemperatureUnit::Celsius
        };
    }

    /// Raw in/out temperatures and humidity setpoint only; no decimal
    /// refinement, no controllable fields beyond humidity. Struct byte `N`
    /// lives at `payload[N]`; `payload[0]` is the type byte itself.
    fn apply_a1(&mut self, payload: &[u8]) {
        if payload.len() < 18 {
            debug!("A1 status report too short: {} bytes", payload.len());
            return;
        }
        self.readable.indoor_temp_celsius = decode_temperature(payload[13], 0);
        self.readable.outdoor_temp_celsius = decode_temperature(payload[14], 0);
        // payload[15..17) are the two skip bytes between outTemp and humidity.
        let humidity = bits(payload[17], 0, 7);
        self.readable.indoor_humidity = humidity;
        self.controllable.humidity_setpoint = humidity;
    }

    /// Three BCD bytes decode to watts × 10. Struct byte `N` lives at
    /// `payload[N]`; `payload[0]` is the type byte itself.
    fn apply_c1(&mut self, payload: &[u8]) {
        if payload.len() < 19 {
            debug!("C1 status report too short: {} bytes", payload.len());
            return;
        }
        self.readable.power_usage_watts = decode_bcd_power([payload[16], payload[17], payload[18]]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_temp_decode_scenario() {
        // capabilities.tempRange(COOL) = (34, 60); controllable target = 45
        // (22.5C): byte2 low nibble = 6, byte2 bit4 = 1, byte18 = 10.
        let new_temp = 10; // byte 18
        let old_temp = 0;
        let dot_temp = true; // byte 2 bit 4
        let target = decode_target_temp(new_temp, old_temp, dot_temp, true);
        assert_eq!(target, 45);
    }

    #[test]
    fn legacy_target_temp_falls_back_to_old_temp_when_new_temp_zero() {
        let target = decode_target_temp(0, 6, false, true);
        assert_eq!(target, (6 + 16) * 2);
    }

    #[test]
    fn preset_precedence_sleep_wins_over_everything() {
        assert_eq!(decode_preset(true, true, true, true, true), Preset::Sleep);
    }

    #[test]
    fn preset_precedence_turbo_from_either_bit() {
        assert_eq!(decode_preset(false, true, false, false, false), Preset::Turbo);
        assert_eq!(decode_preset(false, false, true, false, false), Preset::Turbo);
    }

    #[test]
    fn preset_precedence_eco_then_frost_then_none() {
        assert_eq!(decode_preset(false, false, false, true, false), Preset::Eco);
        assert_eq!(decode_preset(false, false, false, false, true), Preset::FrostProtection);
        assert_eq!(decode_preset(false, false, false, false, false), Preset::None);
    }

    #[test]
    fn temperature_decode_handles_sentinel_and_sign() {
        assert!(decode_temperature(0xFF, 0).is_nan());
        // raw=50 -> value=0 after the -250 offset: exactly 0.0C
        assert_eq!(decode_temperature(50, 0), 0.0);
    }

    #[test]
    fn bcd_power_decode() {
        // 0x01 0x23 0x45 -> digits 1,23,45 -> 12345 -> 1234.5W
        assert_eq!(decode_bcd_power([0x01, 0x23, 0x45]), 1234.5);
    }

    #[test]
    fn a0_report_decodes_fields_at_struct_byte_offsets() {
        // payload[0] is the type byte; struct byte N (per DeviceStatusA0) lives
        // at payload[N] from there, with no separate id byte in between.
        let mut payload = vec![
            type_id::STATUS_A0,
            0x0B, // byte1: power=1, newTemp=5, dotTemp=0, errMark=0
            0x02, // byte2: mode=COOL(2)
            0x64, // byte3: fanSpeed=100
            0x00, 0x00, 0x00, // bytes4-6: timers (none set)
            0x0F, // byte7: leftRightFan=3, updownFan=3 (both swings on)
            0x00, // byte8
            0x00, // byte9
            0x00, // byte10
            0x00, // byte11: light=0 (on)
            0x00, // byte12
            0x2D, // byte13: humidity=45
            0x00, // byte14
            0x00, // CRC placeholder
        ];
        crate::payload::finalize(&mut payload);

        let mut model = DeviceModel::new();
        model.apply_report(&payload);

        assert!(model.controllable.power);
        assert_eq!(model.controllable.mode, OperationMode::Cool);
        assert_eq!(model.controllable.fan_speed, 100);
        assert!(model.controllable.horizontal_swing);
        assert!(model.controllable.vertical_swing);
        assert_eq!(model.controllable.target_temp_half_degrees, 34); // newTemp=5 -> (5+12)*2
        assert_eq!(model.readable.indoor_humidity, 45);
    }

    #[test]
    fn unknown_report_type_is_ignored() {
        let mut model = DeviceModel::new();
        let mut payload = vec![0xFE, 0x00, 0x00];
        crate::payload::finalize(&mut payload);
        model.apply_report(&payload);
        assert_eq!(model.controllable, ControllableStatus::default());
    }

    #[test]
    fn b1_property_updates_controllable_field() {
        let mut model = DeviceModel::new();
        let mut payload = vec![type_id::PROPERTY_GET, 0x01, 0x2C, 0x02, 0x00, 0x01, 0x01, 0x00];
        crate::payload::finalize(&mut payload);
        model.apply_report(&payload);
        assert!(model.controllable.buzzer_on);
    }

    #[test]
    fn report_with_invalid_crc_is_dropped() {
        let mut model = DeviceModel::new();
        let mut payload = vec![type_id::PROPERTY_GET, 0x01, 0x2C, 0x02, 0x00, 0x01, 0x01, 0x00];
        crate::payload::finalize(&mut payload);
        *payload.last_mut().unwrap() ^= 0x01;
        model.apply_report(&payload);
        assert!(!model.controllable.buzzer_on);
    }
}
