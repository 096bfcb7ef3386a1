//! Static descriptions of the supported register devices.

use crate::regdev::named::{NamedRegister, ValueWidth, names_unique};

/// Everything the driver needs to know about one kind of device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Device node name.
    pub name: &'static str,
    /// Device-tree compatible string the bus matches on.
    pub compatible: &'static str,
    /// Register span in bytes.
    pub span: usize,
    /// Named attributes, in the order they are exposed.
    pub registers: &'static [NamedRegister],
    /// `(offset, value)` pairs written at bind time, in order.
    pub reset: &'static [(usize, u32)],
}

pub mod rgb_pwm {
    use super::*;

    pub const RED_OFFSET: usize = 0x00;
    pub const GREEN_OFFSET: usize = 0x04;
    pub const BLUE_OFFSET: usize = 0x08;
    pub const PERIOD_OFFSET: usize = 0x0C;
    pub const SPAN: usize = 0x10;

    /// Channel duty registers hold 16 meaningful bits.
    pub const CHANNEL_MASK: u32 = 0x0000_FFFF;
    /// Period written at bind time.
    pub const RESET_PERIOD: u32 = 0x0FFF;

    pub const REGISTERS: [NamedRegister; 4] = [
        NamedRegister::new("red", RED_OFFSET).masked(CHANNEL_MASK),
        NamedRegister::new("green", GREEN_OFFSET).masked(CHANNEL_MASK),
        NamedRegister::new("blue", BLUE_OFFSET).masked(CHANNEL_MASK),
        NamedRegister::new("period", PERIOD_OFFSET),
    ];

    // LEDs off, full-scale period
    pub static RESET: [(usize, u32); 4] = [
        (RED_OFFSET, 0),
        (GREEN_OFFSET, 0),
        (BLUE_OFFSET, 0),
        (PERIOD_OFFSET, RESET_PERIOD),
    ];
}

pub mod push_button {
    use super::*;

    pub const BUTTON_OFFSET: usize = 0x00;
    pub const SPAN: usize = 0x10;

    pub const REGISTERS: [NamedRegister; 1] = [NamedRegister::new("push_button_reg", BUTTON_OFFSET)
        .masked(0xFF)
        .parsed_as(ValueWidth::U8)];
}

const _: () = assert!(names_unique(&rgb_pwm::REGISTERS));
const _: () = assert!(names_unique(&push_button::REGISTERS));

/// RGB PWM controller: red/green/blue duty and a shared period.
pub static RGB_PWM: DeviceProfile = DeviceProfile {
    name: "rgb_pwm",
    compatible: "weizenegger,rgb-pwm",
    span: rgb_pwm::SPAN,
    registers: &rgb_pwm::REGISTERS,
    reset: &rgb_pwm::RESET,
};

/// Push-button register; no reset values.
pub static PUSH_BUTTON: DeviceProfile = DeviceProfile {
    name: "push_button",
    compatible: "sdc,push_button",
    span: push_button::SPAN,
    registers: &push_button::REGISTERS,
    reset: &[],
};

/// Finds the profile matching a device-tree compatible string.
pub fn by_compatible(compatible: &str) -> Option<&'static DeviceProfile> {
    [&RGB_PWM, &PUSH_BUTTON]
        .into_iter()
        .find(|profile| profile.compatible == compatible)
}
