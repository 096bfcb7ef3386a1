//! Typed facades over a bound driver, one accessor pair per named register.

use crate::regdev::{
    RegError,
    driver::DualInterfaceDriver,
    profile::{DeviceProfile, PUSH_BUTTON, RGB_PWM, rgb_pwm},
    region::RegisterRegion,
};

/// Generates a getter and a `set_` method for each named register.
macro_rules! impl_register_accessors {
    ($($name:ident),+ $(,)?) => {
        paste::paste! {
            $(
                #[doc = "Reads the `" $name "` register."]
                #[inline]
                pub fn $name(&self) -> Result<u32, RegError> {
                    self.driver.get(stringify!($name))
                }

                #[doc = "Writes the `" $name "` register through the named interface."]
                #[inline]
                pub fn [<set_ $name>](&self, value: u32) -> Result<(), RegError> {
                    self.driver.set(stringify!($name), value)
                }
            )+
        }
    };
}

/// Generates the facade struct and its profile-checked constructor.
macro_rules! register_facade {
    ($(#[$meta:meta])* $facade:ident, $profile:expr) => {
        $(#[$meta])*
        pub struct $facade<'a, R: RegisterRegion> {
            driver: &'a DualInterfaceDriver<R>,
        }

        impl<'a, R: RegisterRegion> core::fmt::Debug for $facade<'a, R> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_struct(stringify!($facade)).finish_non_exhaustive()
            }
        }

        impl<'a, R: RegisterRegion> $facade<'a, R> {
            /// Wraps `driver`, which must have been bound with the matching profile.
            ///
            /// # Errors
            /// [`RegError::MapFailed`] if the driver is bound to a different device.
            pub fn new(driver: &'a DualInterfaceDriver<R>) -> Result<Self, RegError> {
                let expected: &DeviceProfile = &$profile;
                if driver.profile().compatible != expected.compatible {
                    return Err(RegError::MapFailed);
                }
                Ok(Self { driver })
            }

            pub fn driver(&self) -> &'a DualInterfaceDriver<R> {
                self.driver
            }
        }
    };
}

register_facade!(
    /// RGB PWM controller registers.
    RgbPwm,
    RGB_PWM
);

impl<'a, R: RegisterRegion> RgbPwm<'a, R> {
    impl_register_accessors!(red, green, blue, period);

    /// Writes all three channels under one lock, so no reader of the raw
    /// interface sees a half-updated colour from another writer.
    pub fn set_rgb(&self, red: u32, green: u32, blue: u32) -> Result<(), RegError> {
        let mask = rgb_pwm::CHANNEL_MASK;
        self.driver.guard().with_exclusive_access(|access| {
            access.write_word(rgb_pwm::RED_OFFSET, red & mask)?;
            access.write_word(rgb_pwm::GREEN_OFFSET, green & mask)?;
            access.write_word(rgb_pwm::BLUE_OFFSET, blue & mask)
        })
    }
}

register_facade!(
    /// Push-button register.
    PushButton,
    PUSH_BUTTON
);

impl<'a, R: RegisterRegion> PushButton<'a, R> {
    impl_register_accessors!(push_button_reg);
}
