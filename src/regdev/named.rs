use crate::regdev::{
    RegError,
    guard::DeviceGuard,
    helpers::word_offset,
    region::RegisterRegion,
};

/// Numeric width an attribute's text is parsed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueWidth {
    U8,
    U16,
    U32,
}

impl ValueWidth {
    /// Largest value representable in this width.
    pub const fn max(self) -> u32 {
        match self {
            ValueWidth::U8 => u8::MAX as u32,
            ValueWidth::U16 => u16::MAX as u32,
            ValueWidth::U32 => u32::MAX,
        }
    }
}

/// One named register: a human-meaningful handle bound to a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedRegister {
    pub name: &'static str,
    pub offset: usize,
    /// Applied to every value written through the named interface.
    pub mask: u32,
    /// Width textual values are parsed into before the mask is applied.
    pub width: ValueWidth,
}

impl NamedRegister {
    /// Full-width, unmasked register.
    pub const fn new(name: &'static str, offset: usize) -> Self {
        Self {
            name,
            offset,
            mask: u32::MAX,
            width: ValueWidth::U32,
        }
    }

    pub const fn masked(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    pub const fn parsed_as(mut self, width: ValueWidth) -> Self {
        self.width = width;
        self
    }
}

const fn same_name(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Returns true if no two entries share a name.
///
/// Usable in `const` items, so static tables can be checked at compile time.
pub const fn names_unique(entries: &[NamedRegister]) -> bool {
    let mut i = 0;
    while i < entries.len() {
        let mut j = 0;
        while j < i {
            if same_name(entries[i].name, entries[j].name) {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

/// A register table checked against a block span.
///
/// Every offset is in range and word aligned, and names are unique.
#[derive(Debug, Clone, Copy)]
pub struct RegisterTable {
    entries: &'static [NamedRegister],
}

impl RegisterTable {
    /// Validates `entries` for a block of `span` bytes.
    ///
    /// # Panics
    /// If two entries share a name.
    ///
    /// # Errors
    /// [`RegError::OutOfRange`] or [`RegError::Misaligned`] for a bad offset.
    pub fn new(entries: &'static [NamedRegister], span: usize) -> Result<Self, RegError> {
        assert!(names_unique(entries), "duplicate attribute name in register table");
        for entry in entries {
            word_offset(entry.offset, span)?;
        }
        Ok(Self { entries })
    }

    pub fn lookup(&self, name: &str) -> Result<&'static NamedRegister, RegError> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or(RegError::UnknownName)
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &'static [NamedRegister] {
        self.entries
    }
}

/// Named get/set over a guarded register block.
///
/// Borrows the block's guard; the view itself holds no register state.
pub struct NamedRegisterView<'a, R: RegisterRegion> {
    guard: &'a DeviceGuard<R>,
    table: RegisterTable,
}

impl<'a, R: RegisterRegion> core::fmt::Debug for NamedRegisterView<'a, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NamedRegisterView")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl<'a, R: RegisterRegion> NamedRegisterView<'a, R> {
    pub fn new(guard: &'a DeviceGuard<R>, table: RegisterTable) -> Self {
        Self { guard, table }
    }

    /// Returns the raw register word; reads are never masked.
    pub fn get(&self, name: &str) -> Result<u32, RegError> {
        let entry = self.table.lookup(name)?;
        self.guard.read_word(entry.offset)
    }

    /// Masks `value` to the register's domain and writes it under the guard.
    pub fn set(&self, name: &str, value: u32) -> Result<(), RegError> {
        let entry = self.table.lookup(name)?;
        self.guard
            .with_exclusive_access(|access| access.write_word(entry.offset, value & entry.mask))
    }

    pub fn lookup(&self, name: &str) -> Result<&'static NamedRegister, RegError> {
        self.table.lookup(name)
    }

    /// Attribute names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.table.entries().iter().map(|entry| entry.name)
    }
}
