//! AML (ACPI Machine Language) structure decoding.
//!
//! This module knows how AML objects are laid out without evaluating them:
//! the per-opcode operand layout ([`opcode`]), how long an object is
//! ([`size`]), how names are encoded ([`name`]), which sub-objects are
//! structural children ([`child`]), where each operand lives ([`option`]),
//! and how declared names form a searchable tree ([`namespace`]).

pub mod child;
pub mod name;
pub mod namespace;
pub mod opcode;
pub mod option;
pub mod size;

pub use name::{NamePath, NameSeg};
pub use opcode::{AmlByteEncoding, EncodingAttributes, OperandKind};
pub use option::{AcpiDataType, AmlOption};

/// Errors specific to AML bytecode decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AmlError {
    /// The AML stream ended unexpectedly.
    #[error("unexpected end of AML stream")]
    UnexpectedEnd,
    /// The byte at the decode position is not a known opcode.
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),
    /// The byte after an `ExtOpPrefix` is not a known extended opcode.
    #[error("unknown extended opcode 0x5b {0:#04x}")]
    UnknownExtendedOpcode(u8),
    /// A PkgLength encoding was invalid or overran the remaining buffer.
    #[error("invalid package length")]
    InvalidPkgLength,
    /// A NameString or ASL path was malformed.
    #[error("malformed name string")]
    InvalidName,
    /// A string constant was not NUL-terminated within the buffer.
    #[error("unterminated string constant")]
    UnterminatedString,
    /// A byte-list operand was found in an object without a PkgLength.
    #[error("byte list outside a length-prefixed object")]
    MisplacedByteList,
    /// The position holds a bare name string, which is not an object.
    #[error("bare name string is not an object")]
    BareName,
    /// A handle passed as the previous child does not lie inside the parent.
    #[error("handle is not a child of the parent")]
    NotAChild,
    /// Objects are nested deeper than the decoder follows.
    #[error("AML objects nested too deeply")]
    TooDeep,
}
