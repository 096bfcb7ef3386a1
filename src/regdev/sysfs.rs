//! Hosted loop collaborators backed by the filesystem.
//!
//! A bound device shows up as a directory with one text file per attribute,
//! e.g. `/sys/bus/platform/devices/ff37f430.rgb_pwm/red`. Values are written as
//! decimal text and read back by taking the leading decimal number.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use crate::regdev::{
    RegError,
    control::{AttributeDevice, Delay, SelectorSource},
    text::{format_value, scan_decimal},
};

pub const DEFAULT_ADC_PATH: &str = "/sys/bus/platform/devices/ff37f400.adc";
pub const DEFAULT_RGB_PATH: &str = "/sys/bus/platform/devices/ff37f430.rgb_pwm";
pub const DEFAULT_SELECTOR_PATH: &str = "/home/soc/number.txt";

fn read_number(path: &Path) -> Result<u32, RegError> {
    let text = fs::read_to_string(path).map_err(|err| {
        log::debug!("failed to read {}: {err}", path.display());
        RegError::Unavailable
    })?;
    scan_decimal(&text)
}

/// Attribute directory of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysfsDevice {
    root: PathBuf,
}

impl SysfsDevice {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn attribute(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl AttributeDevice for SysfsDevice {
    fn get(&mut self, name: &str) -> Result<u32, RegError> {
        read_number(&self.attribute(name))
    }

    fn set(&mut self, name: &str, value: u32) -> Result<(), RegError> {
        let path = self.attribute(name);
        // Attribute files exist already; never create one
        let mut file = fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|err| {
                log::debug!("failed to open {}: {err}", path.display());
                RegError::Unavailable
            })?;
        file.write_all(format_value(value).as_bytes())
            .map_err(|_| RegError::Unavailable)
    }
}

/// Override selector kept as a number in a plain text file.
///
/// The file is re-read on every call, so editing it takes effect on the next
/// cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelector {
    path: PathBuf,
}

impl FileSelector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for FileSelector {
    fn default() -> Self {
        Self::new(DEFAULT_SELECTOR_PATH)
    }
}

impl SelectorSource for FileSelector {
    fn read_selector(&mut self) -> Result<u32, RegError> {
        read_number(&self.path)
    }
}

/// Sleeps the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
