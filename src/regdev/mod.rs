pub mod block;
pub mod control;
pub mod driver;
pub mod error;
pub mod guard;
pub mod helpers;
pub mod named;
pub mod profile;
pub mod raw;
pub mod region;
#[cfg(feature = "std")]
pub mod sysfs;
pub mod text;
pub mod typed;

#[cfg(test)]
mod test_support;

pub use block::RegisterBlock;
pub use control::{
    AttributeDevice, AttributeSelector, Cycle, Delay, Duties, LoopConfig, LoopState, NoSelector,
    SampleToActuationLoop, SamplingMode, SelectorSource, adc_to_duty, apply_override,
};
pub use driver::{DualInterfaceDriver, MappedDevice};
pub use error::RegError;
pub use guard::{DeviceGuard, Exclusive};
pub use named::{NamedRegister, NamedRegisterView, RegisterTable, ValueWidth, names_unique};
pub use profile::{DeviceProfile, PUSH_BUTTON, RGB_PWM};
pub use raw::{RawPort, SeekFrom};
pub use region::{
    MMIO_CLAIM_SLOTS, Mmio, MmioMapper, MmioWindow, RegionMapper, RegisterRegion, Resource,
    SimWindow, SimulatedRegisters,
};
#[cfg(feature = "std")]
pub use sysfs::{FileSelector, StdDelay, SysfsDevice};
pub use text::AttrText;
pub use typed::{PushButton, RgbPwm};

pub mod prelude {
    pub use super::{
        AttributeDevice, Cycle, Delay, DeviceGuard, DeviceProfile, DualInterfaceDriver,
        LoopConfig, MmioMapper, PUSH_BUTTON, PushButton, RGB_PWM, RegError, RegionMapper,
        RegisterRegion, Resource, RgbPwm, SampleToActuationLoop, SelectorSource, SimulatedRegisters,
        ValueWidth,
    };
    #[cfg(feature = "std")]
    pub use super::{FileSelector, StdDelay, SysfsDevice};
}
