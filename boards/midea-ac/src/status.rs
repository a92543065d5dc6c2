//! Enums and sub-records composing the device's readable/controllable state.

/// The appliance's operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationMode {
    #[default]
    Unknown,
    Auto,
    Cool,
    Dry,
    Heat,
    Fan,
    DryCustom,
}

impl OperationMode {
    pub fn from_raw(value: u8) -> Self {
        match value {
            1 => Self::Auto,
            2 => Self::Cool,
            3 => Self::Dry,
            4 => Self::Heat,
            5 => Self::Fan,
            6 => Self::DryCustom,
            _ => Self::Unknown,
        }
    }

    pub fn as_raw(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Auto => 1,
            Self::Cool => 2,
            Self::Dry => 3,
            Self::Heat => 4,
            Self::Fan => 5,
            Self::DryCustom => 6,
        }
    }
}

/// "Breezeless" (no-direct-airflow) sub-mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreezelessMode {
    #[default]
    Unknown,
    Off,
    Away,
    Mild,
    Less,
}

impl BreezelessMode {
    pub fn from_raw(value: u8) -> Self {
        match value {
            1 => Self::Off,
            2 => Self::Away,
            3 => Self::Mild,
            4 => Self::Less,
            _ => Self::Unknown,
        }
    }

    pub fn as_raw(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Off => 1,
            Self::Away => 2,
            Self::Mild => 3,
            Self::Less => 4,
        }
    }
}

/// Vertical/horizontal louver direction, as a coarse named position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AirFlowDirection {
    #[default]
    Unknown,
    Pos1,
    Pos2,
    Pos3,
    Pos4,
    Pos5,
}

impl AirFlowDirection {
    pub fn from_raw(value: u8) -> Self {
        match value {
            ..=0 => Self::Unknown,
            1..=24 => Self::Pos1,
            25..=49 => Self::Pos2,
            50..=74 => Self::Pos3,
            75..=99 => Self::Pos4,
            _ => Self::Pos5,
        }
    }
}

/// Named fan speed setpoints. `Raw` carries any other literal value 0..=100
/// (a percentage) that the appliance accepts directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanSpeed {
    Low,
    Medium,
    High,
    Auto,
    Raw(u8),
}

impl FanSpeed {
    pub const LOW: u8 = 40;
    pub const MEDIUM: u8 = 60;
    pub const HIGH: u8 = 80;
    pub const AUTO: u8 = 102;

    /// Maps a literal setpoint byte to its named constant, if any.
    pub fn from_setpoint(value: u8) -> Self {
        match value {
            Self::AUTO => Self::Auto,
            Self::LOW => Self::Low,
            Self::MEDIUM => Self::Medium,
            Self::HIGH => Self::High,
            other => Self::Raw(other),
        }
    }

    /// Buckets a reported raw fan speed byte into a named speed, for
    /// display purposes only (distinct from [`Self::from_setpoint`]).
    pub fn display(raw: u8) -> Self {
        match raw {
            0..=50 => Self::Low,
            51..=79 => Self::Medium,
            80..=100 => Self::High,
            _ => Self::Auto,
        }
    }
}

/// User-selectable operating preset. Mutually exclusive with one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    None,
    Sleep,
    Turbo,
    Eco,
    FrostProtection,
}

/// Display/reporting unit for temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

/// Packed on/off timer pair, stored as the wire's own 3-byte shape.
///
/// `hi` bytes start at a base of `0x7F`; the active bit is `hi & 0x80`, and
/// the coarse count above the base combines with a low nibble to produce a
/// minutes value: `minutes = 15*(hi - 0x7F) - low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceTimers {
    on_hi: u8,
    off_hi: u8,
    off_low: u8,
    on_low: u8,
}

const TIMER_HIGH_BASE: u8 = 0x7F;

impl Default for DeviceTimers {
    fn default() -> Self {
        Self {
            on_hi: TIMER_HIGH_BASE,
            off_hi: TIMER_HIGH_BASE,
            off_low: 0,
            on_low: 0,
        }
    }
}

impl DeviceTimers {
    /// Unpacks from the wire's 3 bytes: `[on_hi, off_hi, low_nibbles]` where
    /// `low_nibbles` packs `off_low` in the high nibble and `on_low` in the
    /// low nibble.
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        Self {
            on_hi: bytes[0],
            off_hi: bytes[1],
            off_low: (bytes[2] >> 4) & 0x0F,
            on_low: bytes[2] & 0x0F,
        }
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.on_hi, self.off_hi, (self.off_low << 4) | (self.on_low & 0x0F)]
    }

    pub fn is_time_on(self) -> bool {
        self.on_hi & 0x80 != 0
    }

    pub fn is_time_off(self) -> bool {
        self.off_hi & 0x80 != 0
    }

    fn get_time(high: u8, low: u8) -> i32 {
        15 * (high as i32 - TIMER_HIGH_BASE as i32) - low as i32
    }

    fn set_time(high: &mut u8, minutes: u32) -> u8 {
        *high = TIMER_HIGH_BASE;
        if minutes == 0 {
            return 0;
        }
        let minutes = minutes + 14;
        *high = high.wrapping_add((minutes / 15) as u8);
        (14 - minutes % 15) as u8
    }

    pub fn time_on_minutes(self) -> i32 {
        Self::get_time(self.on_hi, self.on_low)
    }

    pub fn time_off_minutes(self) -> i32 {
        Self::get_time(self.off_hi, self.off_low)
    }

    pub fn set_time_on(&mut self, minutes: u32) {
        self.on_low = Self::set_time(&mut self.on_hi, minutes);
    }

    pub fn set_time_off(&mut self, minutes: u32) {
        self.off_low = Self::set_time(&mut self.off_hi, minutes);
    }
}

/// Sensor and telemetry fields, overwritten whenever a matching report
/// arrives. The opaque flag fields are preserved verbatim for round-trip
/// into the next `0x40` control frame — their individual meaning is not
/// otherwise interpreted by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReadableStatus {
    pub indoor_temp_celsius: f32,
    pub outdoor_temp_celsius: f32,
    pub indoor_humidity: u8,
    pub power_usage_watts: f32,
    pub error_code: u8,
    pub light_on: bool,
    pub filter_full: bool,

    pub imode_resume: bool,
    pub timer_mode: bool,
    pub test2: bool,
    pub cosy_sleep: u8,
    pub save: bool,
    pub low_freq_fan: bool,
    pub feel_own: bool,
    pub child_sleep_mode: bool,
    pub natural_fan: bool,
    pub dry_clean: bool,
    pub clean_up: bool,
    pub exchange_air: bool,
    pub night_light: bool,
    pub catch_cold: bool,
    pub peak_elec: bool,
    pub set_expand: u8,
    pub double_temp: bool,
}

/// User-settable fields, overwritten whenever a matching report arrives.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllableStatus {
    pub power: bool,
    pub mode: OperationMode,
    pub horizontal_swing: bool,
    pub vertical_swing: bool,
    pub target_temp_half_degrees: u8,
    pub fan_speed: u8,
    pub preset: Preset,
    pub humidity_setpoint: u8,
    pub timers: DeviceTimers,

    pub h_wind_direction: u8,
    pub v_wind_direction: u8,
    pub breezeless_mode: BreezelessMode,
    pub silky_cool_on: bool,
    pub wind_on_me_on: bool,
    pub wind_off_me_on: bool,
    pub breeze_away_on: bool,
    pub smart_eye_on: bool,
    pub self_clean_on: bool,
    pub buzzer_on: bool,
}

impl ControllableStatus {
    pub fn fan_speed_display(&self) -> FanSpeed {
        FanSpeed::display(self.fan_speed)
    }
}

/// UI-level preferences that do not come from the appliance itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlSettings {
    pub beeper_feedback: bool,
    pub display_unit: TemperatureUnit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_timers_are_inactive() {
        let timers = DeviceTimers::default();
        assert!(!timers.is_time_on());
        assert!(!timers.is_time_off());
    }

    #[rstest]
    #[case(0)]
    #[case(15)]
    #[case(30)]
    #[case(90)]
    #[case(735)] // largest value representable with a u8 high byte
    fn timer_minutes_roundtrip(#[case] minutes: u32) {
        let mut timers = DeviceTimers::default();
        timers.set_time_on(minutes);
        assert_eq!(timers.time_on_minutes(), minutes as i32);
        assert_eq!(timers.is_time_on(), minutes != 0);
    }

    #[test]
    fn timer_bytes_roundtrip() {
        let mut timers = DeviceTimers::default();
        timers.set_time_on(45);
        timers.set_time_off(90);
        let bytes = timers.to_bytes();
        let restored = DeviceTimers::from_bytes(bytes);
        assert_eq!(restored, timers);
    }

    #[rstest]
    #[case(0, FanSpeed::Low)]
    #[case(50, FanSpeed::Low)]
    #[case(51, FanSpeed::Medium)]
    #[case(79, FanSpeed::Medium)]
    #[case(80, FanSpeed::High)]
    #[case(100, FanSpeed::High)]
    #[case(101, FanSpeed::Auto)]
    #[case(102, FanSpeed::Auto)]
    fn fan_speed_display_buckets(#[case] raw: u8, #[case] expected: FanSpeed) {
        assert_eq!(FanSpeed::display(raw), expected);
    }

    #[test]
    fn fan_speed_setpoint_constants_are_distinct_from_display_buckets() {
        // A setpoint of 50 is not one of the named constants (40/60/80/102),
        // so it reports as Raw even though display() would bucket it as Low.
        assert_eq!(FanSpeed::from_setpoint(50), FanSpeed::Raw(50));
        assert_eq!(FanSpeed::from_setpoint(FanSpeed::LOW), FanSpeed::Low);
    }
}
