//! Potentiometer to RGB example: the sample-to-actuation loop over sysfs
//!
//! This example demonstrates:
//! - Driving the control loop through attribute files of bound devices
//! - Reading the override selector from a plain text file each cycle
//! - Surviving transient read/write failures with backoff
//!
//! Usage: `pot_to_rgb [ADC_DIR] [RGB_DIR] [SELECTOR_FILE]`
//!
//! Writing 1, 2 or 3 to the selector file forces red, green or blue to full
//! brightness; anything else hands control back to the potentiometers.

use embedded_regdev::prelude::*;
use embedded_regdev::regdev::sysfs::{DEFAULT_ADC_PATH, DEFAULT_RGB_PATH, DEFAULT_SELECTOR_PATH};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::process::ExitCode;

/// Prints log records to stderr.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() -> ExitCode {
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Info));

    let mut args = std::env::args().skip(1);
    let adc_dir = args.next().unwrap_or_else(|| DEFAULT_ADC_PATH.into());
    let rgb_dir = args.next().unwrap_or_else(|| DEFAULT_RGB_PATH.into());
    let selector = args.next().unwrap_or_else(|| DEFAULT_SELECTOR_PATH.into());

    println!("=== Potentiometer to RGB ===");
    println!("  ADC:      {adc_dir}");
    println!("  RGB PWM:  {rgb_dir}");
    println!("  Selector: {selector}\n");

    let mut control = SampleToActuationLoop::new(
        SysfsDevice::new(adc_dir),
        SysfsDevice::new(rgb_dir),
        FileSelector::new(selector),
        StdDelay,
        LoopConfig::default(),
    );

    // Without working devices there is nothing to retry against
    if let Err(err) = control.init() {
        eprintln!("initialization failed: {err}");
        return ExitCode::FAILURE;
    }

    control.run()
}
