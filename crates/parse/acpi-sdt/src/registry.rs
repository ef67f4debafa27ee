//! Installed ACPI table registry.
//!
//! Handles refer to positions inside a single byte space owned by the
//! registry. Each installed table occupies an explicit `(start, len)` range of
//! that space, so "which table owns this position" is a bounds check rather
//! than pointer arithmetic.

use alloc::vec::Vec;
use core::ops::Range;

use bitflags::bitflags;
use log::debug;

use crate::SdtError;
use crate::sdt::{self, SdtHeader};

/// Opaque key identifying an installed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableKey(pub usize);

bitflags! {
    /// Bitmap of the ACPI versions a table is a member of.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TableVersion: u32 {
        /// Not associated with any ACPI version.
        const NONE = 1 << 0;
        /// ACPI 1.0b.
        const V1_0B = 1 << 1;
        /// ACPI 2.0.
        const V2_0 = 1 << 2;
        /// ACPI 3.0.
        const V3_0 = 1 << 3;
        /// ACPI 4.0.
        const V4_0 = 1 << 4;
        /// ACPI 5.0 and later.
        const V5_0 = 1 << 5;
    }
}

/// Callback invoked whenever a table is installed.
pub type TableNotifyFn = fn(&SdtHeader, TableVersion, TableKey);

/// An installed table and the range of registry memory it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstalledTable {
    /// Key the table was installed under.
    pub key: TableKey,
    /// ACPI versions the table belongs to.
    pub version: TableVersion,
    /// Offset of the first header byte in registry memory.
    pub start: usize,
    /// Total table length, header included.
    pub len: usize,
}

impl InstalledTable {
    /// Returns the range of registry memory covered by this table.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    /// Returns `true` if `position` lies inside this table.
    #[must_use]
    pub fn contains(&self, position: usize) -> bool {
        self.range().contains(&position)
    }

    /// Returns the offset of the first AML byte after the header.
    #[must_use]
    pub fn body_start(&self) -> usize {
        self.start + SdtHeader::SIZE
    }
}

/// Source of installed ACPI tables.
///
/// Implementations enumerate tables in a stable order and expose the memory
/// the tables live in. Every [`InstalledTable::range`] returned by
/// [`table_at`](Self::table_at) must lie within [`memory`](Self::memory).
pub trait TableRegistry {
    /// Returns the table at the zero-based enumeration `index`, or `None`
    /// once the index runs past the last table.
    fn table_at(&self, index: usize) -> Option<InstalledTable>;

    /// The byte space all table ranges index into.
    fn memory(&self) -> &[u8];

    /// Mutable access to the byte space all table ranges index into.
    fn memory_mut(&mut self) -> &mut [u8];

    /// Register (`register == true`) or unregister an installation callback.
    ///
    /// # Errors
    ///
    /// Returns [`SdtError::InvalidParameter`] when unregistering a callback
    /// that was never registered.
    fn register_notify(&mut self, register: bool, notification: TableNotifyFn) -> Result<(), SdtError>;

    /// Locate a table by its key.
    ///
    /// # Errors
    ///
    /// Returns [`SdtError::NotFound`] if no installed table has `key`.
    fn find_table_by_key(&self, key: TableKey) -> Result<InstalledTable, SdtError> {
        (0..)
            .map_while(|index| self.table_at(index))
            .find(|table| table.key == key)
            .ok_or(SdtError::NotFound)
    }

    /// Locate the table whose range contains `position`.
    ///
    /// # Errors
    ///
    /// Returns [`SdtError::NotFound`] if the position is outside every table.
    fn find_table_by_position(&self, position: usize) -> Result<InstalledTable, SdtError> {
        (0..)
            .map_while(|index| self.table_at(index))
            .find(|table| table.contains(position))
            .ok_or(SdtError::NotFound)
    }
}

/// In-memory [`TableRegistry`] that owns copies of installed tables.
///
/// Tables are appended back to back into one buffer. Positions handed out
/// for one table stay valid as more tables are installed.
#[derive(Default)]
pub struct TableArena {
    memory: Vec<u8>,
    tables: Vec<InstalledTable>,
    notifications: Vec<TableNotifyFn>,
    next_key: usize,
}

impl TableArena {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a copy of `table` and return its key.
    ///
    /// The stored copy gets a freshly computed checksum, then every
    /// registered notification is invoked with the installed header.
    ///
    /// # Errors
    ///
    /// Returns [`SdtError::InvalidParameter`] if `table` is shorter than an
    /// SDT header or its header length disagrees with the slice length.
    pub fn install(&mut self, table: &[u8], version: TableVersion) -> Result<TableKey, SdtError> {
        let header = SdtHeader::read_from_bytes(table).ok_or(SdtError::InvalidParameter)?;
        if header.length() as usize != table.len() {
            return Err(SdtError::InvalidParameter);
        }

        let start = self.memory.len();
        self.memory.extend_from_slice(table);
        sdt::update_checksum(&mut self.memory[start..]);

        self.next_key += 1;
        let key = TableKey(self.next_key);
        self.tables.push(InstalledTable {
            key,
            version,
            start,
            len: table.len(),
        });

        let header = SdtHeader {
            checksum: self.memory[start + SdtHeader::CHECKSUM_OFFSET],
            ..header
        };
        debug!(
            "acpi-sdt: installed {} ({} bytes) as key {}",
            crate::aml::NameSeg(header.signature()),
            table.len(),
            key.0
        );
        for notify in &self.notifications {
            notify(&header, version, key);
        }

        Ok(key)
    }

    /// Returns the number of installed tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` if no table has been installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl TableRegistry for TableArena {
    fn table_at(&self, index: usize) -> Option<InstalledTable> {
        self.tables.get(index).copied()
    }

    fn memory(&self) -> &[u8] {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    fn register_notify(&mut self, register: bool, notification: TableNotifyFn) -> Result<(), SdtError> {
        if register {
            self.notifications.push(notification);
            return Ok(());
        }

        let index = self
            .notifications
            .iter()
            .position(|&f| core::ptr::fn_addr_eq(f, notification))
            .ok_or(SdtError::InvalidParameter)?;
        self.notifications.remove(index);
        Ok(())
    }
}
