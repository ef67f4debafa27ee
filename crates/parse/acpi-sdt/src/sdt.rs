//! System Description Table (SDT) header and checksum utilities.

use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Standard ACPI System Description Table header.
///
/// This 36-byte header is present at the start of every ACPI table. For
/// DSDT and SSDT tables it is followed directly by the AML body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct SdtHeader {
    /// 4-byte ASCII signature identifying the table type.
    pub signature: [u8; 4],
    /// Total length of the table, including the header, in bytes.
    pub length: U32,
    /// Revision of the table structure.
    pub revision: u8,
    /// Checksum byte. The entire table, including the header, must sum to zero.
    pub checksum: u8,
    /// OEM-supplied identification string.
    pub oem_id: [u8; 6],
    /// OEM-supplied table identification string.
    pub oem_table_id: [u8; 8],
    /// OEM-supplied revision number.
    pub oem_revision: U32,
    /// Vendor ID of the utility that created the table.
    pub creator_id: [u8; 4],
    /// Revision of the utility that created the table.
    pub creator_revision: U32,
}

const _: () = assert!(core::mem::size_of::<SdtHeader>() == SdtHeader::SIZE);

impl SdtHeader {
    /// The size of an SDT header in bytes.
    pub const SIZE: usize = 36;

    /// Offset of the checksum byte within the header.
    pub const CHECKSUM_OFFSET: usize = core::mem::offset_of!(SdtHeader, checksum);

    /// Read an [`SdtHeader`] from a byte slice.
    ///
    /// Returns `None` if the slice is shorter than [`SdtHeader::SIZE`] bytes.
    #[must_use]
    pub fn read_from_bytes(data: &[u8]) -> Option<Self> {
        Self::read_from_prefix(data).ok().map(|(header, _)| header)
    }

    /// Returns the 4-byte signature.
    #[must_use]
    pub fn signature(&self) -> [u8; 4] {
        self.signature
    }

    /// Returns the total length of this table (header included).
    #[must_use]
    pub fn length(&self) -> u32 {
        self.length.get()
    }
}

/// Validate the checksum of a byte slice.
///
/// ACPI tables are designed so that the sum of all bytes in the table equals
/// zero (mod 256). This function computes that sum and returns `true` when
/// the checksum is valid.
#[must_use]
pub fn validate_checksum(data: &[u8]) -> bool {
    sum(data) == 0
}

/// Recompute and store the checksum byte of a complete table.
///
/// The checksum byte is treated as zero while summing, then set so that the
/// whole table sums to zero. Slices shorter than an SDT header are left
/// untouched.
pub fn update_checksum(table: &mut [u8]) {
    if table.len() < SdtHeader::SIZE {
        return;
    }
    table[SdtHeader::CHECKSUM_OFFSET] = 0;
    table[SdtHeader::CHECKSUM_OFFSET] = sum(table).wrapping_neg();
}

fn sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |a, &b| a.wrapping_add(b))
}
