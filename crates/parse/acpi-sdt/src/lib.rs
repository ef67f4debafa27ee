//! `acpi-sdt` --- handle-based navigation and in-place editing of AML tables.
//!
//! This crate exposes the ACPI System Description Table interface used by
//! firmware components and table-fixup tools: enumerate installed tables,
//! open a position inside a DSDT/SSDT body as an opaque [`AcpiHandle`], walk
//! to child objects, read or overwrite individual operands, and resolve
//! dotted namespace paths such as `\_SB.PCI0.LPC0` to the object that
//! declares them.
//!
//! All state lives in an explicit [`AcpiSdt`] context wrapping a
//! [`TableRegistry`]. Handles are plain views (a position plus the decoded
//! opcode layout); they never own table memory. Edits never resize an
//! object. The table checksum is repaired when a modified handle is passed
//! to [`AcpiSdt::close`].
//!
//! # Usage
//!
//! ```ignore
//! let mut arena = TableArena::new();
//! let key = arena.install(&ssdt_bytes, TableVersion::V2_0)?;
//! let mut sdt = AcpiSdt::new(arena, SdtConfig::default());
//!
//! let root = sdt.open_sdt(key)?;
//! if let Some(adr) = sdt.find_path(&root, "\\_SB.PCI0._ADR")? {
//!     // Name (_ADR, 0x00020000): the value is the object at operand 2
//!     if let Some(mut value) = sdt.get_child(&adr, None)? {
//!         sdt.set_option(&mut value, 1, &0x0003_0000u32.to_le_bytes())?;
//!         sdt.close(value)?;
//!     }
//!     sdt.close(adr)?;
//! }
//! sdt.close(root)?;
//! ```

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod aml;
pub mod handle;
pub mod protocol;
pub mod registry;
pub mod sdt;

pub use aml::{AcpiDataType, AmlError, AmlOption, NamePath, NameSeg};
pub use handle::{AcpiHandle, NodeHandle, RootHandle};
pub use protocol::{AcpiSdt, SdtConfig, TableInfo};
pub use registry::{InstalledTable, TableArena, TableKey, TableNotifyFn, TableRegistry, TableVersion};
pub use sdt::SdtHeader;

/// Errors returned by the public table and handle operations.
///
/// "Nothing there" is not an error: an operand index past the end of an
/// object reports [`AcpiDataType::None`], and a path without a structural
/// match resolves to `Ok(None)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SdtError {
    /// A handle, index, position or path was malformed or refers to
    /// something that cannot be opened (such as a bare name string).
    #[error("invalid parameter")]
    InvalidParameter,
    /// A table key or position does not belong to any installed table.
    #[error("not found")]
    NotFound,
    /// The data does not fit in the storage of the operand being replaced.
    #[error("bad buffer size")]
    BadBufferSize,
}
