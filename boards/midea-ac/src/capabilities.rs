//! Appliance capabilities, discovered once via one or more `0xB5` exchanges
//! and treated as immutable afterwards (a re-query is allowed but should
//! only refine what is already known).

use log::{debug, warn};

use crate::property::Property;
use crate::status::{FanSpeed, OperationMode};

/// UUIDs carried in capability (`0xB5`) and property (`0xB1`) reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
enum CapabilityUuid {
    VWind,
    HWind,
    Humidity,
    SilkyCool,
    Feedback,
    EcoEye,
    WindOnMe,
    WindOffMe,
    SelfClean,
    BreezeAway,
    Breezeless,
    Fan,
    Eco,
    EightHeat,
    Modes,
    Swing,
    Power,
    Filter,
    AuxHeater,
    Turbo,
    Dry,
    Fahrenheit,
    Light,
    Temp,
    Buzzer,
    Twins,
    FourDirection,
    Unknown(u16),
}

impl From<u16> for CapabilityUuid {
    fn from(uuid: u16) -> Self {
        match uuid {
            0x0009 => Self::VWind,
            0x000A => Self::HWind,
            0x0015 => Self::Humidity,
            0x0018 => Self::SilkyCool,
            0x001A => Self::Feedback,
            0x0030 => Self::EcoEye,
            0x0032 => Self::WindOnMe,
            0x0033 => Self::WindOffMe,
            0x0039 => Self::SelfClean,
            0x0042 => Self::BreezeAway,
            0x0043 => Self::Breezeless,
            0x0210 => Self::Fan,
            0x0212 => Self::Eco,
            0x0213 => Self::EightHeat,
            0x0214 => Self::Modes,
            0x0215 => Self::Swing,
            0x0216 => Self::Power,
            0x0217 => Self::Filter,
            0x0219 => Self::AuxHeater,
            0x021A => Self::Turbo,
            0x021F => Self::Dry,
            0x0222 => Self::Fahrenheit,
            0x0224 => Self::Light,
            0x0225 => Self::Temp,
            0x022C => Self::Buzzer,
            0x0232 => Self::Twins,
            0x0233 => Self::FourDirection,
            other => Self::Unknown(other),
        }
    }
}

fn prv_mode(x: u8) -> u8 {
    match x {
        1 => 0b1111,
        2 => 0b0110,
        3 => 0b0001,
        4 => 0b0101,
        5 => 0b1001,
        _ => 0b1011,
    }
}

fn prv_swing(x: u8) -> u8 {
    match x {
        1 => 0b11,
        2 => 0b00,
        3 => 0b10,
        _ => 0b01,
    }
}

fn prv_fan_speed(x: u8) -> u8 {
    match x {
        1 => 0b11111,
        2 => 0b00001,
        3 => 0b00101,
        4 => 0b01101,
        7 => 0b00111,
        _ => 0b01111,
    }
}

fn prv_dry_smart(x: u8) -> u8 {
    match x {
        1 => 0b01,
        2 => 0b11,
        3 => 0b10,
        _ => 0b00,
    }
}

fn prv_turbo(x: u8) -> u8 {
    match x {
        0 => 0b01,
        2 => 0b00,
        3 => 0b10,
        _ => 0b11,
    }
}

fn prv_power(x: u8) -> u8 {
    match x {
        2 => 0b01,
        3 => 0b11,
        _ => 0b00,
    }
}

fn prv_filter(x: u8) -> u8 {
    match x {
        0 => 0b00,
        3 => 0b10,
        4 => 0b11,
        _ => 0b01,
    }
}

fn prv_eco(x: u8) -> u8 {
    match x {
        1 => 0b01,
        2 => 0b11,
        _ => 0b00,
    }
}

/// A half-degree-Celsius inclusive temperature range, default `(34, 60)`
/// (i.e. 17..=30 in whole degrees).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempRange {
    pub min: u8,
    pub max: u8,
}

impl Default for TempRange {
    fn default() -> Self {
        Self { min: 34, max: 60 }
    }
}

impl TempRange {
    pub fn clamp(self, value: u8) -> u8 {
        value.clamp(self.min, self.max)
    }
}

/// Decoded per-appliance capability set.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    mode_mask: u8,
    swing_mask: u8,
    fan_mask: u8,
    dry_smart_mask: u8,
    turbo_mask: u8,
    eco_mask: u8,
    power_mask: u8,
    filter_mask: u8,

    temp_cool: TempRange,
    temp_auto: TempRange,
    temp_heat: TempRange,
    has_dot_five: bool,

    has_fahrenheit: bool,
    has_light: bool,
    has_eight_heat: bool,
    has_electric_heater: bool,

    has_self_clean: bool,
    has_silky_cool: bool,
    has_one_key_no_wind_on_me: bool,
    has_breeze: bool,
    has_buzzer: bool,
    has_smart_eye: bool,
    has_indoor_humidity: bool,
    has_vertical_wind: bool,
    has_horizontal_wind: bool,
    has_twins: bool,
    has_four_direction: bool,
    has_blowing_people: bool,
    has_avoid_people: bool,
}

impl Capabilities {
    pub fn new() -> Self {
        Self {
            temp_cool: TempRange::default(),
            temp_auto: TempRange::default(),
            temp_heat: TempRange::default(),
            ..Default::default()
        }
    }

    pub fn has_mode_cool(&self) -> bool {
        self.mode_mask & 0b0001 != 0
    }
    pub fn has_mode_auto(&self) -> bool {
        self.mode_mask & 0b0010 != 0
    }
    pub fn has_mode_heat(&self) -> bool {
        self.mode_mask & 0b0100 != 0
    }
    pub fn has_mode_dry(&self) -> bool {
        self.mode_mask & 0b1000 != 0
    }

    pub fn has_dry_smart(&self) -> bool {
        self.dry_smart_mask & 0b01 != 0
    }
    pub fn has_mode_dry_custom(&self) -> bool {
        self.dry_smart_mask & 0b10 != 0
    }

    pub fn has_swing_vertical(&self) -> bool {
        self.swing_mask & 0b01 != 0
    }
    pub fn has_swing_horizontal(&self) -> bool {
        self.swing_mask & 0b10 != 0
    }
    pub fn has_swing_both(&self) -> bool {
        self.swing_mask == 0b11
    }

    pub fn has_fan_low(&self) -> bool {
        self.fan_mask & 0b00001 != 0
    }
    pub fn has_fan_medium(&self) -> bool {
        self.fan_mask & 0b00010 != 0
    }
    pub fn has_fan_high(&self) -> bool {
        self.fan_mask & 0b00100 != 0
    }
    pub fn has_fan_auto(&self) -> bool {
        self.fan_mask & 0b01000 != 0
    }
    pub fn has_fan_raw(&self) -> bool {
        self.fan_mask & 0b10000 != 0
    }

    pub fn has_turbo_cool(&self) -> bool {
        self.turbo_mask & 0b01 != 0
    }
    pub fn has_turbo_heat(&self) -> bool {
        self.turbo_mask & 0b10 != 0
    }

    pub fn has_eco(&self) -> bool {
        self.eco_mask & 0b01 != 0
    }
    pub fn has_eco_special(&self) -> bool {
        self.eco_mask & 0b10 != 0
    }

    pub fn has_power_report(&self) -> bool {
        self.power_mask & 0b01 != 0
    }
    pub fn has_power_limits(&self) -> bool {
        self.power_mask & 0b10 != 0
    }

    pub fn has_filter_clean_reminder(&self) -> bool {
        self.filter_mask & 0b01 != 0
    }
    pub fn has_filter_replace_reminder(&self) -> bool {
        self.filter_mask & 0b10 != 0
    }

    pub fn has_dot_five(&self) -> bool {
        self.has_dot_five
    }
    pub fn has_fahrenheits(&self) -> bool {
        self.has_fahrenheit
    }
    pub fn has_light(&self) -> bool {
        self.has_light
    }
    pub fn has_eight_heat(&self) -> bool {
        self.has_eight_heat
    }
    pub fn has_electric_heater(&self) -> bool {
        self.has_electric_heater
    }
    pub fn has_self_clean(&self) -> bool {
        self.has_self_clean
    }
    pub fn has_silky_cool(&self) -> bool {
        self.has_silky_cool
    }
    pub fn has_breeze_away(&self) -> bool {
        self.has_one_key_no_wind_on_me
    }
    pub fn has_breezeless(&self) -> bool {
        self.has_breeze
    }
    pub fn has_buzzer(&self) -> bool {
        self.has_buzzer
    }
    pub fn has_smart_eye(&self) -> bool {
        self.has_smart_eye
    }
    pub fn has_indoor_humidity(&self) -> bool {
        self.has_indoor_humidity
    }
    pub fn has_vertical_wind(&self) -> bool {
        self.has_vertical_wind
    }
    pub fn has_horizontal_wind(&self) -> bool {
        self.has_horizontal_wind
    }
    pub fn has_twins(&self) -> bool {
        self.has_twins
    }
    pub fn has_four_direction(&self) -> bool {
        self.has_four_direction
    }
    pub fn has_blowing_people(&self) -> bool {
        self.has_blowing_people
    }
    pub fn has_avoid_people(&self) -> bool {
        self.has_avoid_people
    }

    pub fn has_mode(&self, mode: OperationMode) -> bool {
        match mode {
            OperationMode::Auto => self.has_mode_auto(),
            OperationMode::Cool => self.has_mode_cool(),
            OperationMode::Dry => self.has_mode_dry(),
            OperationMode::Heat => self.has_mode_heat(),
            OperationMode::Fan => true,
            OperationMode::DryCustom => self.has_mode_dry_custom(),
            OperationMode::Unknown => false,
        }
    }

    pub fn has_fan_speed(&self, value: u8) -> bool {
        match FanSpeed::from_setpoint(value) {
            FanSpeed::Auto => self.has_fan_auto(),
            FanSpeed::Low => self.has_fan_low(),
            FanSpeed::Medium => self.has_fan_medium(),
            FanSpeed::High => self.has_fan_high(),
            FanSpeed::Raw(_) => self.has_fan_raw() && value <= 100,
        }
    }

    pub fn temp_range(&self, mode: OperationMode) -> TempRange {
        match mode {
            OperationMode::Auto => self.temp_auto,
            OperationMode::Heat => self.temp_heat,
            _ => self.temp_cool,
        }
    }

    pub fn temp_range_max(&self) -> TempRange {
        let min = self.temp_cool.min.min(self.temp_auto.min).min(self.temp_heat.min);
        let max = self.temp_cool.max.max(self.temp_auto.max).max(self.temp_heat.max);
        TempRange { min, max }
    }

    /// `true` iff any B1-sourced boolean is enabled, meaning a `0xB1`
    /// property query is needed in addition to the `0xB5` capability query.
    pub fn is_b1_query_needed(&self) -> bool {
        self.has_self_clean
            || self.has_silky_cool
            || self.has_one_key_no_wind_on_me
            || self.has_breeze
            || self.has_buzzer
            || self.has_smart_eye
            || self.has_indoor_humidity
            || self.has_vertical_wind
            || self.has_horizontal_wind
            || self.has_twins
            || self.has_four_direction
    }

    fn apply_temp(&mut self, data: &[u8]) {
        if data.len() < 7 {
            debug!("capability TEMP record too short: {} bytes", data.len());
            return;
        }
        self.temp_cool = TempRange { min: data[0], max: data[1] };
        self.temp_auto = TempRange { min: data[2], max: data[3] };
        self.temp_heat = TempRange { min: data[4], max: data[5] };
        self.has_dot_five = data[6] != 0;
    }

    /// Applies one decoded `0xB5` (or capability-carrying `0xB1`) record.
    pub fn apply_property(&mut self, property: Property<'_>) {
        let byte0 = property.data.first().copied().unwrap_or(0);
        let nzero = byte0 != 0;

        match CapabilityUuid::from(property.uuid) {
            CapabilityUuid::Temp => self.apply_temp(property.data),
            CapabilityUuid::Modes => self.mode_mask = prv_mode(byte0),
            CapabilityUuid::Swing => self.swing_mask = prv_swing(byte0),
            CapabilityUuid::Fan => self.fan_mask = prv_fan_speed(byte0),
            CapabilityUuid::Dry => self.dry_smart_mask = prv_dry_smart(byte0),
            CapabilityUuid::Turbo => self.turbo_mask = prv_turbo(byte0),
            CapabilityUuid::Eco => self.eco_mask = prv_eco(byte0),
            CapabilityUuid::Power => self.power_mask = prv_power(byte0),
            CapabilityUuid::Filter => self.filter_mask = prv_filter(byte0),
            CapabilityUuid::Fahrenheit => {
                // Not a mistake: 0 means the unit is changeable. Any other
                // observed value falls back to false and is logged.
                if byte0 > 1 {
                    warn!("UUID_FAHRENHEIT reported unexpected value {byte0}, treating as not changeable");
                }
                self.has_fahrenheit = byte0 == 0;
            }
            CapabilityUuid::Light => self.has_light = nzero,
            CapabilityUuid::EightHeat => self.has_eight_heat = nzero,
            CapabilityUuid::AuxHeater => self.has_electric_heater = nzero,
            CapabilityUuid::VWind => self.has_vertical_wind = nzero,
            CapabilityUuid::HWind => self.has_horizontal_wind = nzero,
            CapabilityUuid::Humidity => self.has_indoor_humidity = nzero,
            CapabilityUuid::SilkyCool => self.has_silky_cool = nzero,
            CapabilityUuid::EcoEye => self.has_smart_eye = nzero,
            CapabilityUuid::SelfClean => self.has_self_clean = nzero,
            CapabilityUuid::WindOnMe => self.has_blowing_people = nzero,
            CapabilityUuid::WindOffMe => self.has_avoid_people = nzero,
            CapabilityUuid::BreezeAway => self.has_one_key_no_wind_on_me = nzero,
            CapabilityUuid::Breezeless => self.has_breeze = nzero,
            CapabilityUuid::Buzzer => self.has_buzzer = nzero,
            CapabilityUuid::Twins => self.has_twins = nzero,
            CapabilityUuid::FourDirection => self.has_four_direction = nzero,
            CapabilityUuid::Feedback | CapabilityUuid::Unknown(_) => {
                debug!("ignoring capability UUID 0x{:04X}", property.uuid);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn prop(uuid: u16, data: &[u8]) -> Property<'_> {
        Property { uuid, result: None, data }
    }

    #[rstest]
    #[case(1, 0b1111)]
    #[case(2, 0b0110)]
    #[case(3, 0b0001)]
    #[case(4, 0b0101)]
    #[case(5, 0b1001)]
    #[case(9, 0b1011)]
    fn mode_mask_lookup(#[case] raw: u8, #[case] expected: u8) {
        let mut caps = Capabilities::new();
        caps.apply_property(prop(0x0214, &[raw]));
        assert_eq!(caps.mode_mask, expected);
    }

    #[test]
    fn fahrenheit_zero_means_changeable() {
        let mut caps = Capabilities::new();
        caps.apply_property(prop(0x0222, &[0]));
        assert!(caps.has_fahrenheits());
    }

    #[test]
    fn fahrenheit_one_means_not_changeable() {
        let mut caps = Capabilities::new();
        caps.apply_property(prop(0x0222, &[1]));
        assert!(!caps.has_fahrenheits());
    }

    #[test]
    fn fahrenheit_anomalous_value_logs_and_is_false() {
        let mut caps = Capabilities::new();
        caps.apply_property(prop(0x0222, &[42]));
        assert!(!caps.has_fahrenheits());
    }

    #[test]
    fn temp_ranges_decode_from_six_bytes_plus_dot_flag() {
        let mut caps = Capabilities::new();
        caps.apply_property(prop(0x0225, &[34, 60, 34, 60, 34, 56, 1]));
        assert_eq!(caps.temp_range(OperationMode::Cool), TempRange { min: 34, max: 60 });
        assert_eq!(caps.temp_range(OperationMode::Heat), TempRange { min: 34, max: 56 });
        assert!(caps.has_dot_five());
    }

    #[test]
    fn b1_query_needed_when_any_sourced_boolean_set() {
        let mut caps = Capabilities::new();
        assert!(!caps.is_b1_query_needed());
        caps.apply_property(prop(0x0039, &[1]));
        assert!(caps.is_b1_query_needed());
    }

    #[test]
    fn unknown_uuid_is_ignored() {
        let mut caps = Capabilities::new();
        caps.apply_property(prop(0xFFFF, &[1]));
        assert_eq!(caps.mode_mask, 0);
    }
}
