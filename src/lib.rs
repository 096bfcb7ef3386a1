//! A `no_std`, no-alloc driver core for small memory-mapped register blocks.
//!
//! Each bound device exposes the same guarded register block through two
//! interfaces, plus a polling control loop that turns analog samples into PWM
//! duty cycles.
//!
//! # Features
//!
//! - **Dual interface** - raw little-endian word transfers at byte positions,
//!   and named attributes with per-register masks and text parsing
//! - **Single write gate** - every mutation runs inside a critical section
//! - **Typestate bind path** - `map` → `expose` → `unbind`, no use after unbind
//! - **Pluggable regions** - real MMIO or an atomic-backed simulated bank
//! - **Control loop** - sample, convert to 18.17 fixed point, override, actuate,
//!   with backoff on transient errors
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                        ┌─────────────────────┐
//! │  Raw interface   │  read_at / write_at    │                     │
//! │  (RawPort)       │───────────────────────▶│    DeviceGuard      │
//! └──────────────────┘                        │  (critical section) │
//! ┌──────────────────┐  get / set / store     │          │          │
//! │ Named interface  │───────────────────────▶│          ▼          │
//! │ (NamedRegister-  │                        │   RegisterBlock     │
//! │  View, RgbPwm)   │                        │          │          │
//! └──────────────────┘                        │          ▼          │
//!          ▲                                  │   RegisterRegion    │
//!          │ AttributeDevice                  │  (Mmio / Sim bank)  │
//! ┌──────────────────┐                        └─────────────────────┘
//! │ SampleTo-        │
//! │ ActuationLoop    │
//! └──────────────────┘
//! ```
//!
//! - **Reads** from either interface go straight to the block and are never torn
//! - **Writes** from either interface serialize through the guard and bump its
//!   write counter
//! - **Named writes** are masked; raw writes store the word as given
//!
//! # Example
//!
//! ```rust
//! use embedded_regdev::prelude::*;
//!
//! static REGS: SimulatedRegisters<4> = SimulatedRegisters::new();
//!
//! let driver = DualInterfaceDriver::bind(
//!     &RGB_PWM,
//!     Resource::new(0xff37_f430, 16),
//!     &&REGS,
//! )
//! .unwrap();
//!
//! // Named side: masked to the channel width
//! driver.set("red", 0x1_2345).unwrap();
//! assert_eq!(driver.get("red").unwrap(), 0x2345);
//!
//! // Raw side: one little-endian word per transfer
//! let mut word = [0u8; 4];
//! assert_eq!(driver.read_at(12, &mut word), Ok(4));
//! assert_eq!(u32::from_le_bytes(word), 0x0FFF);
//! assert_eq!(driver.read_at(16, &mut word), Ok(0));
//!
//! let regs = driver.unbind();
//! drop(regs);
//! assert!(!REGS.is_claimed());
//! ```

#![deny(unsafe_code)]
#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod regdev;

pub mod prelude {
    pub use crate::regdev::prelude::*;
}
