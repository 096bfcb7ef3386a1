//! Test support utilities - only compiled in test builds.

use std::{string::String, vec::Vec};

use crate::regdev::{
    RegError,
    block::RegisterBlock,
    control::{AttributeDevice, Delay, SelectorSource},
    driver::DualInterfaceDriver,
    guard::DeviceGuard,
    profile::{PUSH_BUTTON, RGB_PWM},
    region::{RegionMapper, Resource, SimWindow, SimulatedRegisters},
};

/// Standard test bank: four 32-bit registers, 16 bytes.
pub type TestRegs = SimulatedRegisters<4>;
pub type TestWindow<'a> = SimWindow<'a, 4>;

pub const RGB_BASE: usize = 0xff37_f430;
pub const BUTTON_BASE: usize = 0xff37_f440;

/// Maps `regs` and wraps it in a bare block.
pub fn sim_block(regs: &TestRegs) -> RegisterBlock<TestWindow<'_>> {
    let window = (&regs).map(Resource::new(0, TestRegs::SPAN)).unwrap();
    RegisterBlock::new(window)
}

pub fn sim_guard(regs: &TestRegs) -> DeviceGuard<TestWindow<'_>> {
    DeviceGuard::new(sim_block(regs))
}

pub fn bind_rgb(regs: &TestRegs) -> DualInterfaceDriver<TestWindow<'_>> {
    DualInterfaceDriver::bind(&RGB_PWM, Resource::new(RGB_BASE, TestRegs::SPAN), &regs).unwrap()
}

pub fn bind_push_button(regs: &TestRegs) -> DualInterfaceDriver<TestWindow<'_>> {
    DualInterfaceDriver::bind(&PUSH_BUTTON, Resource::new(BUTTON_BASE, TestRegs::SPAN), &regs)
        .unwrap()
}

/// In-memory attribute device that records every successful write.
#[derive(Debug, Default)]
pub struct MockAttributes {
    pub values: Vec<(&'static str, u32)>,
    pub writes: Vec<(&'static str, u32)>,
    /// Writes to this attribute fail with [`RegError::Unavailable`].
    pub fail_set: Option<&'static str>,
    /// Reads of this attribute fail the given number of times.
    pub fail_get: Option<(&'static str, usize)>,
}

impl MockAttributes {
    pub fn with_values(values: &[(&'static str, u32)]) -> Self {
        Self {
            values: values.to_vec(),
            ..Self::default()
        }
    }
}

impl AttributeDevice for MockAttributes {
    fn get(&mut self, name: &str) -> Result<u32, RegError> {
        if let Some((failing, remaining)) = self.fail_get.as_mut() {
            if *failing == name && *remaining > 0 {
                *remaining -= 1;
                return Err(RegError::Unavailable);
            }
        }
        self.values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|&(_, value)| value)
            .ok_or(RegError::UnknownName)
    }

    fn set(&mut self, name: &str, value: u32) -> Result<(), RegError> {
        if self.fail_set == Some(name) {
            return Err(RegError::Unavailable);
        }
        let name: &'static str = String::from(name).leak();
        match self.values.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.values.push((name, value)),
        }
        self.writes.push((name, value));
        Ok(())
    }
}

/// Delay that only records the requested durations.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub calls: Vec<u32>,
}

impl Delay for RecordingDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(ms);
    }
}

/// Selector that replays a script; the last entry repeats forever.
#[derive(Debug)]
pub struct ScriptedSelector {
    script: Vec<Result<u32, RegError>>,
    next: usize,
}

impl ScriptedSelector {
    pub fn new(script: &[Result<u32, RegError>]) -> Self {
        Self {
            script: script.to_vec(),
            next: 0,
        }
    }
}

impl SelectorSource for ScriptedSelector {
    fn read_selector(&mut self) -> Result<u32, RegError> {
        let Some(last) = self.script.len().checked_sub(1) else {
            return Ok(0);
        };
        let result = self.script[self.next.min(last)];
        self.next += 1;
        result
    }
}
