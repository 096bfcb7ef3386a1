//! Polling control loop: sample three input channels, convert them to
//! 18.17 fixed-point duties, apply the override selector, and write the
//! duties to an output device.
//!
//! ```text
//! Init ──▶ Sampling ──▶ Actuating ──▶ Sampling ──▶ …
//!             │  ▲          │
//!   read fail │  │ backoff  │ write fail
//!             ▼  │          ▼
//!           (skip cycle, back off, resample)
//! ```
//!
//! The loop only talks to devices through [`AttributeDevice`], so it drives
//! a [`DualInterfaceDriver`] in-process as readily as a sysfs directory.

use crate::regdev::{RegError, driver::DualInterfaceDriver, region::RegisterRegion};

/// Full-scale duty in 18.17 fixed point (1.0).
pub const DUTY_SCALE: u32 = 1 << 17;

/// Largest sample of the 12-bit ADC.
pub const ADC_MAX: u32 = 4095;

/// Maps a 12-bit sample to an 18.17 fixed-point duty, truncating.
///
/// Samples above [`ADC_MAX`] saturate at full scale.
///
/// ```
/// use embedded_regdev::regdev::control::{DUTY_SCALE, adc_to_duty};
///
/// assert_eq!(adc_to_duty(0), 0);
/// assert_eq!(adc_to_duty(4095), DUTY_SCALE);
/// ```
pub fn adc_to_duty(sample: u16) -> u32 {
    let sample = u32::from(sample).min(ADC_MAX);
    // 4095 * 2^17 fits in u32
    sample * DUTY_SCALE / ADC_MAX
}

/// Duty values for the three colour channels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Duties {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

impl Duties {
    pub const fn new(red: u32, green: u32, blue: u32) -> Self {
        Self { red, green, blue }
    }

    pub fn from_samples(samples: [u16; 3]) -> Self {
        Self::new(
            adc_to_duty(samples[0]),
            adc_to_duty(samples[1]),
            adc_to_duty(samples[2]),
        )
    }

    pub fn as_array(&self) -> [u32; 3] {
        [self.red, self.green, self.blue]
    }
}

/// Applies the override selector.
///
/// Selector 1, 2 or 3 drives red, green or blue to full scale and the other
/// two channels to zero. Any other value leaves `duties` untouched.
pub fn apply_override(selector: u32, duties: Duties) -> Duties {
    match selector {
        1 => Duties::new(DUTY_SCALE, 0, 0),
        2 => Duties::new(0, DUTY_SCALE, 0),
        3 => Duties::new(0, 0, DUTY_SCALE),
        _ => duties,
    }
}

/// A device reachable through named attributes.
pub trait AttributeDevice {
    fn get(&mut self, name: &str) -> Result<u32, RegError>;
    fn set(&mut self, name: &str, value: u32) -> Result<(), RegError>;
}

impl<T: AttributeDevice + ?Sized> AttributeDevice for &mut T {
    fn get(&mut self, name: &str) -> Result<u32, RegError> {
        (**self).get(name)
    }

    fn set(&mut self, name: &str, value: u32) -> Result<(), RegError> {
        (**self).set(name, value)
    }
}

impl<R: RegisterRegion> AttributeDevice for &DualInterfaceDriver<R> {
    fn get(&mut self, name: &str) -> Result<u32, RegError> {
        DualInterfaceDriver::get(*self, name)
    }

    fn set(&mut self, name: &str, value: u32) -> Result<(), RegError> {
        DualInterfaceDriver::set(*self, name, value)
    }
}

/// Source of the override selector, read fresh every cycle.
pub trait SelectorSource {
    /// Reads the selector. Errors are treated as "no override" by the loop.
    fn read_selector(&mut self) -> Result<u32, RegError>;
}

impl<T: SelectorSource + ?Sized> SelectorSource for &mut T {
    fn read_selector(&mut self) -> Result<u32, RegError> {
        (**self).read_selector()
    }
}

/// Selector that never overrides.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSelector;

impl SelectorSource for NoSelector {
    fn read_selector(&mut self) -> Result<u32, RegError> {
        Ok(0)
    }
}

/// Uses one attribute of a device as the selector, e.g. a push-button
/// register.
#[derive(Debug)]
pub struct AttributeSelector<D> {
    device: D,
    name: &'static str,
}

impl<D: AttributeDevice> AttributeSelector<D> {
    pub fn new(device: D, name: &'static str) -> Self {
        Self { device, name }
    }
}

impl<D: AttributeDevice> SelectorSource for AttributeSelector<D> {
    fn read_selector(&mut self) -> Result<u32, RegError> {
        self.device.get(self.name)
    }
}

/// Blocking millisecond delay.
pub trait Delay {
    fn delay_ms(&mut self, ms: u32);
}

impl<T: Delay + ?Sized> Delay for &mut T {
    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

/// How fresh samples are obtained from the input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// The device converts continuously once `auto_update` is set.
    Auto,
    /// Write `update` before every sampling pass.
    Triggered,
}

/// Attribute names, timings and initial values for the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    pub channels: [&'static str; 3],
    pub outputs: [&'static str; 3],
    pub auto_update_attr: &'static str,
    pub update_attr: &'static str,
    pub period_attr: &'static str,
    pub sampling: SamplingMode,
    /// Output period written at init.
    pub period: u32,
    pub settle_ms: u32,
    pub backoff_ms: u32,
    pub cycle_ms: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            channels: ["ch0_raw", "ch1_raw", "ch2_raw"],
            outputs: ["red", "green", "blue"],
            auto_update_attr: "auto_update",
            update_attr: "update",
            period_attr: "period",
            sampling: SamplingMode::Auto,
            period: 320,
            settle_ms: 100,
            backoff_ms: 100,
            cycle_ms: 20,
        }
    }
}

impl LoopConfig {
    pub fn with_period(mut self, period: u32) -> Self {
        self.period = period;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingMode) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_timings(mut self, settle_ms: u32, backoff_ms: u32, cycle_ms: u32) -> Self {
        self.settle_ms = settle_ms;
        self.backoff_ms = backoff_ms;
        self.cycle_ms = cycle_ms;
        self
    }
}

/// Outcome of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// All three duties were written.
    Actuated(Duties),
    /// A channel read failed; nothing was written.
    SampleFailed(RegError),
    /// A duty write failed; the remaining writes were skipped.
    ActuationFailed(RegError),
}

/// What the loop last saw and wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopState {
    pub samples: [u16; 3],
    pub selector: u32,
    /// Last duties written in full.
    pub duties: Duties,
}

pub struct SampleToActuationLoop<I, O, S, D> {
    input: I,
    output: O,
    selector: S,
    delay: D,
    config: LoopConfig,
    state: LoopState,
}

impl<I, O, S, D> core::fmt::Debug for SampleToActuationLoop<I, O, S, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SampleToActuationLoop")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<I, O, S, D> SampleToActuationLoop<I, O, S, D>
where
    I: AttributeDevice,
    O: AttributeDevice,
    S: SelectorSource,
    D: Delay,
{
    pub fn new(input: I, output: O, selector: S, delay: D, config: LoopConfig) -> Self {
        Self {
            input,
            output,
            selector,
            delay,
            config,
            state: LoopState::default(),
        }
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    /// Enables sampling on the input, sets the output period, and waits for
    /// the hardware to settle.
    pub fn init(&mut self) -> Result<(), RegError> {
        log::info!("control loop: starting");

        if self.config.sampling == SamplingMode::Auto {
            self.input
                .set(self.config.auto_update_attr, 1)
                .inspect_err(|err| log::error!("failed to enable auto_update on input: {err}"))?;
        }
        self.output
            .set(self.config.period_attr, self.config.period)
            .inspect_err(|err| log::error!("failed to set output period: {err}"))?;

        self.delay.delay_ms(self.config.settle_ms);
        Ok(())
    }

    /// Runs one Sampling → Actuating pass, including its trailing delay.
    pub fn step(&mut self) -> Cycle {
        let samples = match self.sample() {
            Ok(samples) => samples,
            Err(err) => {
                log::warn!("error reading input channels: {err}");
                self.delay.delay_ms(self.config.backoff_ms);
                return Cycle::SampleFailed(err);
            }
        };

        let selector = self.selector.read_selector().unwrap_or(0);
        let duties = apply_override(selector, Duties::from_samples(samples));
        self.state.samples = samples;
        self.state.selector = selector;

        if let Err(err) = self.actuate(duties) {
            log::warn!("error writing duties: {err}");
            self.delay.delay_ms(self.config.backoff_ms);
            return Cycle::ActuationFailed(err);
        }

        log::debug!("samples {samples:?} selector {selector} -> {duties:?}");
        self.state.duties = duties;
        self.delay.delay_ms(self.config.cycle_ms);
        Cycle::Actuated(duties)
    }

    /// Polls forever. Transient failures only skip a cycle.
    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    pub fn into_parts(self) -> (I, O, S, D) {
        (self.input, self.output, self.selector, self.delay)
    }

    fn sample(&mut self) -> Result<[u16; 3], RegError> {
        if self.config.sampling == SamplingMode::Triggered {
            self.input.set(self.config.update_attr, 1)?;
        }

        let mut samples = [0u16; 3];
        for (sample, name) in samples.iter_mut().zip(self.config.channels) {
            let raw = self.input.get(name)?;
            *sample = raw.min(u32::from(u16::MAX)) as u16;
        }
        Ok(samples)
    }

    fn actuate(&mut self, duties: Duties) -> Result<(), RegError> {
        for (name, duty) in self.config.outputs.into_iter().zip(duties.as_array()) {
            self.output.set(name, duty)?;
        }
        Ok(())
    }
}
