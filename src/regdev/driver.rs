use crate::regdev::{
    RegError,
    block::RegisterBlock,
    guard::DeviceGuard,
    helpers::{WORD_SIZE, file_position},
    named::{NamedRegisterView, RegisterTable},
    profile::DeviceProfile,
    raw::RawPort,
    region::{RegionMapper, RegisterRegion, Resource},
    text::{AttrText, format_value, parse_value},
};

/// A device whose register range is mapped but not yet initialized or
/// exposed to callers.
pub struct MappedDevice<R: RegisterRegion> {
    profile: &'static DeviceProfile,
    resource: Resource,
    guard: DeviceGuard<R>,
}

impl<R: RegisterRegion> core::fmt::Debug for MappedDevice<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MappedDevice")
            .field("profile", &self.profile.name)
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}

impl<R: RegisterRegion> MappedDevice<R> {
    /// Claims and maps the register range described by `resource`.
    ///
    /// # Errors
    /// [`RegError::MapFailed`] if the resource does not match the profile's
    /// span or the mapper cannot claim it.
    pub fn map<M>(
        profile: &'static DeviceProfile,
        resource: Resource,
        mapper: &M,
    ) -> Result<Self, RegError>
    where
        M: RegionMapper<Region = R>,
    {
        if resource.span != profile.span {
            log::warn!(
                "{}: resource span {:#x} does not match register span {:#x}",
                profile.name,
                resource.span,
                profile.span
            );
            return Err(RegError::MapFailed);
        }

        let region = mapper.map(resource).inspect_err(|_| {
            log::error!(
                "{}: failed to request/remap resource at {:#x}",
                profile.name,
                resource.base
            )
        })?;
        if region.span() != profile.span {
            return Err(RegError::MapFailed);
        }

        Ok(Self {
            profile,
            resource,
            guard: DeviceGuard::new(RegisterBlock::new(region)),
        })
    }

    /// Writes the profile's reset values and opens both interfaces.
    pub fn expose(self) -> Result<DualInterfaceDriver<R>, RegError> {
        let table = RegisterTable::new(self.profile.registers, self.guard.span())?;

        let reset = self.profile.reset;
        self.guard.with_exclusive_access(|access| {
            reset
                .iter()
                .try_for_each(|&(offset, value)| access.write_word(offset, value))
        })?;

        log::info!(
            "{}: bound at {:#x}, {} attribute(s)",
            self.profile.name,
            self.resource.base,
            table.entries().len()
        );

        Ok(DualInterfaceDriver {
            profile: self.profile,
            resource: self.resource,
            guard: self.guard,
            table,
        })
    }
}

/// A bound register device exposing a raw byte-range interface and a named
/// attribute interface over the same guarded block.
///
/// The driver is a plain value owned by whoever bound it; share it by
/// reference across threads. [`unbind`](Self::unbind) consumes it, so no call
/// can reach the registers afterwards.
pub struct DualInterfaceDriver<R: RegisterRegion> {
    profile: &'static DeviceProfile,
    resource: Resource,
    guard: DeviceGuard<R>,
    table: RegisterTable,
}

impl<R: RegisterRegion> core::fmt::Debug for DualInterfaceDriver<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DualInterfaceDriver")
            .field("profile", &self.profile.name)
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}

impl<R: RegisterRegion> DualInterfaceDriver<R> {
    /// Maps `resource`, resets the registers and exposes both interfaces.
    ///
    /// # Errors
    /// [`RegError::MapFailed`] if the range cannot be claimed.
    pub fn bind<M>(
        profile: &'static DeviceProfile,
        resource: Resource,
        mapper: &M,
    ) -> Result<Self, RegError>
    where
        M: RegionMapper<Region = R>,
    {
        MappedDevice::map(profile, resource, mapper)?.expose()
    }

    /// Withdraws both interfaces and hands the region back for release.
    pub fn unbind(self) -> R {
        log::info!("{}: unbound from {:#x}", self.profile.name, self.resource.base);
        self.guard.into_block().into_region()
    }

    pub fn profile(&self) -> &'static DeviceProfile {
        self.profile
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn span(&self) -> usize {
        self.guard.span()
    }

    pub fn guard(&self) -> &DeviceGuard<R> {
        &self.guard
    }

    /// Named interface over this device's attribute table.
    pub fn named(&self) -> NamedRegisterView<'_, R> {
        NamedRegisterView::new(&self.guard, self.table)
    }

    pub fn get(&self, name: &str) -> Result<u32, RegError> {
        self.named().get(name)
    }

    pub fn set(&self, name: &str, value: u32) -> Result<(), RegError> {
        self.named().set(name, value)
    }

    /// Reads an attribute as decimal text.
    pub fn show(&self, name: &str) -> Result<AttrText, RegError> {
        self.get(name).map(format_value)
    }

    /// Parses `text` in the attribute's width and writes it. Returns the
    /// number of bytes consumed.
    pub fn store(&self, name: &str, text: &str) -> Result<usize, RegError> {
        let entry = self.table.lookup(name)?;
        let value = parse_value(text, entry.width)?;
        self.set(name, value)?;
        Ok(text.len())
    }

    /// Attribute names in the order they are exposed.
    pub fn attributes(&self) -> impl Iterator<Item = &'static str> {
        self.table.entries().iter().map(|entry| entry.name)
    }

    /// Reads one register at file position `pos` into `buf[..4]`.
    ///
    /// Returns `Ok(0)` at or past the end of the span, `Ok(4)` otherwise.
    ///
    /// # Errors
    /// [`RegError::InvalidOffset`], [`RegError::Misaligned`], or
    /// [`RegError::TransferIncomplete`] if `buf` cannot hold a word.
    pub fn read_at(&self, pos: i64, buf: &mut [u8]) -> Result<usize, RegError> {
        let Some(offset) = self.raw_offset(pos, "read")? else {
            return Ok(0);
        };
        let out = buf.get_mut(..WORD_SIZE).ok_or(RegError::TransferIncomplete)?;

        let value = self.guard.read_word(offset)?;
        out.copy_from_slice(&value.to_le_bytes());
        Ok(WORD_SIZE)
    }

    /// Writes exactly one register at file position `pos` from `data`.
    ///
    /// Returns `Ok(0)` at or past the end of the span, `Ok(4)` otherwise.
    /// Raw writes are stored unmasked.
    ///
    /// # Errors
    /// [`RegError::InvalidOffset`], [`RegError::Misaligned`], or
    /// [`RegError::TransferIncomplete`] unless `data` is exactly one word.
    pub fn write_at(&self, pos: i64, data: &[u8]) -> Result<usize, RegError> {
        let Some(offset) = self.raw_offset(pos, "write")? else {
            return Ok(0);
        };
        let word: [u8; WORD_SIZE] = data.try_into().map_err(|_| {
            log::warn!(
                "{}: write of {} bytes, expected {}",
                self.profile.name,
                data.len(),
                WORD_SIZE
            );
            RegError::TransferIncomplete
        })?;

        let value = u32::from_le_bytes(word);
        self.guard
            .with_exclusive_access(|access| access.write_word(offset, value))?;
        Ok(WORD_SIZE)
    }

    /// Opens a cursor over the raw interface, starting at position 0.
    pub fn open_raw(&self) -> RawPort<'_, R> {
        RawPort::new(self)
    }

    fn raw_offset(&self, pos: i64, op: &str) -> Result<Option<usize>, RegError> {
        file_position(pos, self.span()).inspect_err(|err| {
            if *err == RegError::Misaligned {
                log::warn!("{}_{op}: unaligned access at {pos}", self.profile.name);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regdev::{
        profile::{PUSH_BUTTON, RGB_PWM, rgb_pwm},
        test_support::{TestRegs, bind_push_button, bind_rgb},
    };

    #[test]
    fn bind_initializes_rgb_registers() {
        let regs = TestRegs::new();
        regs.poke(rgb_pwm::RED_OFFSET, 0xFFFF);
        regs.poke(rgb_pwm::PERIOD_OFFSET, 1);

        let driver = bind_rgb(&regs);

        assert_eq!(driver.get("red").unwrap(), 0);
        assert_eq!(driver.get("green").unwrap(), 0);
        assert_eq!(driver.get("blue").unwrap(), 0);
        assert_eq!(driver.get("period").unwrap(), 0x0FFF);
        assert_eq!(driver.guard().write_count(), 4);
    }

    #[test]
    fn bind_leaves_push_button_untouched() {
        let regs = TestRegs::new();
        regs.poke(0, 3);

        let driver = bind_push_button(&regs);

        assert_eq!(driver.get("push_button_reg").unwrap(), 3);
        assert_eq!(driver.guard().write_count(), 0);
    }

    #[test]
    fn bind_rejects_wrong_span_and_claimed_range() {
        let regs = TestRegs::new();

        let wrong_span = DualInterfaceDriver::bind(&RGB_PWM, Resource::new(0xff37_f430, 8), &&regs);
        assert_eq!(wrong_span.unwrap_err(), RegError::MapFailed);

        let unaligned = DualInterfaceDriver::bind(&RGB_PWM, Resource::new(0xff37_f432, 16), &&regs);
        assert_eq!(unaligned.unwrap_err(), RegError::MapFailed);

        let _driver = bind_rgb(&regs);
        let again = DualInterfaceDriver::bind(&RGB_PWM, Resource::new(0xff37_f430, 16), &&regs);
        assert_eq!(again.unwrap_err(), RegError::MapFailed);
    }

    #[test]
    fn unbind_releases_the_region() {
        let regs = TestRegs::new();
        let driver = bind_rgb(&regs);
        assert!(regs.is_claimed());

        drop(driver.unbind());
        assert!(!regs.is_claimed());

        // The range can be bound again
        let rebound = bind_rgb(&regs);
        assert_eq!(rebound.get("period").unwrap(), 0x0FFF);
    }

    #[test]
    fn raw_round_trip_at_every_word() {
        let regs = TestRegs::new();
        let driver = bind_rgb(&regs);

        for pos in (0..16).step_by(4) {
            let value = 0x0001_0000u32 + pos as u32;
            assert_eq!(driver.write_at(pos, &value.to_le_bytes()), Ok(4));

            let mut buf = [0u8; 4];
            assert_eq!(driver.read_at(pos, &mut buf), Ok(4));
            assert_eq!(u32::from_le_bytes(buf), value);
        }
    }

    #[test]
    fn raw_end_of_range_reads_zero_bytes() {
        let regs = TestRegs::new();
        let driver = bind_rgb(&regs);

        let mut buf = [0xAAu8; 4];
        for pos in [16, 17, 20, 1 << 40] {
            assert_eq!(driver.read_at(pos, &mut buf), Ok(0));
            assert_eq!(driver.write_at(pos, &[1, 2, 3, 4]), Ok(0));
        }
        assert_eq!(buf, [0xAA; 4]);
    }

    #[test]
    fn raw_rejects_misuse() {
        let regs = TestRegs::new();
        let driver = bind_rgb(&regs);
        let mut buf = [0u8; 4];

        for pos in [1, 2, 3, 5, 14] {
            assert_eq!(driver.read_at(pos, &mut buf), Err(RegError::Misaligned));
            assert_eq!(driver.write_at(pos, &[0; 4]), Err(RegError::Misaligned));
        }

        assert_eq!(driver.read_at(-4, &mut buf), Err(RegError::InvalidOffset));
        assert_eq!(driver.write_at(-1, &[0; 4]), Err(RegError::InvalidOffset));

        assert_eq!(driver.read_at(0, &mut [0u8; 2]), Err(RegError::TransferIncomplete));
        assert_eq!(driver.write_at(0, &[0; 3]), Err(RegError::TransferIncomplete));
        assert_eq!(driver.write_at(0, &[0; 8]), Err(RegError::TransferIncomplete));

        // Nothing above reached the hardware beyond the bind-time reset
        assert_eq!(driver.guard().write_count(), 4);
        assert_eq!(regs.peek(rgb_pwm::PERIOD_OFFSET), 0x0FFF);
    }

    #[test]
    fn raw_read_fills_only_one_word_of_a_larger_buffer() {
        let regs = TestRegs::new();
        let driver = bind_rgb(&regs);

        let mut buf = [0xEEu8; 8];
        assert_eq!(driver.read_at(12, &mut buf), Ok(4));
        assert_eq!(buf, [0xFF, 0x0F, 0, 0, 0xEE, 0xEE, 0xEE, 0xEE]);
    }

    #[test]
    fn raw_writes_are_not_masked() {
        let regs = TestRegs::new();
        let driver = bind_rgb(&regs);

        driver.write_at(0, &0x0003_FFFFu32.to_le_bytes()).unwrap();
        assert_eq!(driver.get("red").unwrap(), 0x0003_FFFF);
    }

    #[test]
    fn named_set_then_get_returns_masked_value() {
        let regs = TestRegs::new();
        let driver = bind_rgb(&regs);

        driver.set("green", 0x1FFFF).unwrap();
        assert_eq!(driver.get("green").unwrap(), 0xFFFF);

        driver.set("period", 0x1FFFF).unwrap();
        assert_eq!(driver.get("period").unwrap(), 0x1FFFF);

        assert_eq!(driver.get("alpha"), Err(RegError::UnknownName));
        assert_eq!(driver.set("alpha", 1), Err(RegError::UnknownName));
    }

    #[test]
    fn show_and_store_use_attribute_text() {
        let regs = TestRegs::new();
        let driver = bind_rgb(&regs);

        assert_eq!(driver.show("period").unwrap().as_str(), "4095\n");
        assert_eq!(driver.store("period", "320\n"), Ok(4));
        assert_eq!(driver.get("period").unwrap(), 320);

        assert_eq!(driver.store("blue", "0x20000"), Ok(7));
        assert_eq!(driver.show("blue").unwrap().as_str(), "0\n");

        assert_eq!(driver.store("blue", "bright"), Err(RegError::ParseFailed));
        assert_eq!(driver.store("alpha", "1"), Err(RegError::UnknownName));
    }

    #[test]
    fn push_button_raw_window() {
        let regs = TestRegs::new();
        regs.poke(0, 1);
        let driver = bind_push_button(&regs);
        let mut buf = [0u8; 4];

        // Raw writes keep all 32 bits, the named view reads them back as-is
        assert_eq!(driver.write_at(0, &0x0000_0302u32.to_le_bytes()), Ok(4));
        assert_eq!(driver.read_at(0, &mut buf), Ok(4));
        assert_eq!(u32::from_le_bytes(buf), 0x0302);
        assert_eq!(driver.get("push_button_reg").unwrap(), 0x0302);

        assert_eq!(driver.read_at(16, &mut buf), Ok(0));
        assert_eq!(driver.write_at(16, &[1, 0, 0, 0]), Ok(0));
        assert_eq!(driver.read_at(2, &mut buf), Err(RegError::Misaligned));
        assert_eq!(driver.write_at(2, &[1, 0, 0, 0]), Err(RegError::Misaligned));

        // A short transfer never reaches the register
        assert_eq!(driver.write_at(0, &[9, 9, 9]), Err(RegError::TransferIncomplete));
        assert_eq!(regs.peek(0), 0x0302);
        assert_eq!(driver.guard().write_count(), 1);
    }

    #[test]
    fn push_button_store_parses_eight_bits() {
        let regs = TestRegs::new();
        let driver = bind_push_button(&regs);

        assert_eq!(driver.store("push_button_reg", "2\n"), Ok(2));
        assert_eq!(regs.peek(0), 2);
        assert_eq!(driver.store("push_button_reg", "300"), Err(RegError::ParseFailed));
        assert_eq!(regs.peek(0), 2);
    }

    #[test]
    fn attributes_follow_profile_order() {
        let regs = TestRegs::new();
        let driver = bind_rgb(&regs);

        let mut names = driver.attributes();
        assert_eq!(names.next(), Some("red"));
        assert_eq!(names.next(), Some("green"));
        assert_eq!(names.next(), Some("blue"));
        assert_eq!(names.next(), Some("period"));
        assert_eq!(names.next(), None);
        assert_eq!(driver.profile(), &RGB_PWM);
        assert_ne!(driver.profile(), &PUSH_BUTTON);
    }

    #[test]
    fn every_mutating_path_goes_through_the_guard() {
        let regs = TestRegs::new();
        let driver = bind_rgb(&regs);
        let base = driver.guard().write_count();

        driver.set("red", 1).unwrap();
        driver.store("green", "2").unwrap();
        driver.write_at(8, &3u32.to_le_bytes()).unwrap();
        driver.open_raw().write(&4u32.to_le_bytes()).unwrap();

        assert_eq!(driver.guard().write_count(), base + 4);
    }

    #[test]
    fn concurrent_writers_never_tear_a_word() {
        const PATTERNS: [u32; 4] = [0x0000_0000, 0xFFFF_FFFF, 0x5A5A_5A5A, 0xA5A5_A5A5];
        const ROUNDS: usize = 500;

        let regs = TestRegs::new();
        let driver = bind_rgb(&regs);
        let base = driver.guard().write_count();

        std::thread::scope(|s| {
            for (i, pattern) in PATTERNS.into_iter().enumerate() {
                let driver = &driver;
                s.spawn(move || {
                    for _ in 0..ROUNDS {
                        // Half the writers use each interface
                        if i % 2 == 0 {
                            driver.write_at(12, &pattern.to_le_bytes()).unwrap();
                        } else {
                            driver.set("period", pattern).unwrap();
                        }
                    }
                });
            }
            s.spawn(|| {
                let mut buf = [0u8; 4];
                for _ in 0..ROUNDS {
                    driver.read_at(12, &mut buf).unwrap();
                    let seen = u32::from_le_bytes(buf);
                    assert!(
                        seen == 0x0FFF || PATTERNS.contains(&seen),
                        "torn read {seen:#x}"
                    );
                }
            });
        });

        assert!(PATTERNS.contains(&driver.get("period").unwrap()));
        let total = (PATTERNS.len() * ROUNDS) as u32;
        assert_eq!(driver.guard().write_count(), base + total);
    }
}
