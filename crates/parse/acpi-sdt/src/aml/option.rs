//! Operand access by index.
//!
//! Index 0 is always the opcode itself. Indices `1..=max_index` are the
//! declared operands in encoding order. Anything past that has no data.

use super::AmlError;
use super::opcode::OperandKind;
use super::size::operands;
use crate::handle::NodeHandle;

/// Kind of data found at an operand index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcpiDataType {
    /// No operand exists at the requested index.
    None,
    /// The opcode bytes (index 0).
    Opcode,
    /// An encoded `NameString`.
    NameString,
    /// A little-endian integer of 1, 2, 4 or 8 bytes.
    Uint,
    /// A NUL-terminated ASCII string, terminator included.
    String,
    /// A nested object, which can be opened as a handle.
    Child,
    /// Raw bytes running to the end of the enclosing package.
    Buffer,
}

impl From<OperandKind> for AcpiDataType {
    fn from(kind: OperandKind) -> Self {
        match kind {
            OperandKind::Uint8 | OperandKind::Uint16 | OperandKind::Uint32 | OperandKind::Uint64 => Self::Uint,
            OperandKind::Name => Self::NameString,
            OperandKind::String => Self::String,
            OperandKind::Object => Self::Child,
            OperandKind::ByteList => Self::Buffer,
        }
    }
}

/// One operand of an open object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmlOption<'a> {
    /// What the bytes hold.
    pub data_type: AcpiDataType,
    /// Offset of the first operand byte in registry memory.
    pub position: usize,
    /// The operand's encoded bytes; empty for [`AcpiDataType::None`].
    pub data: &'a [u8],
}

/// Locate operand `index` of `node` within `memory`.
///
/// The walk replays the object's layout and stops at the requested operand
/// without descending into it.
pub(crate) fn parse_option<'a>(
    memory: &'a [u8],
    node: &NodeHandle,
    index: usize,
) -> Result<AmlOption<'a>, AmlError> {
    let object = memory
        .get(node.start..node.start + node.size)
        .ok_or(AmlError::UnexpectedEnd)?;
    let encoding = node.encoding;

    if index > encoding.max_index() {
        return Ok(AmlOption {
            data_type: AcpiDataType::None,
            position: node.start,
            data: &[],
        });
    }

    if index == 0 {
        return Ok(AmlOption {
            data_type: AcpiDataType::Opcode,
            position: node.start,
            data: &object[..encoding.opcode_len()],
        });
    }

    let mut spans = operands(encoding, object)?;
    for _ in 1..index {
        spans.next().transpose()?;
    }
    let span = spans.next().ok_or(AmlError::UnexpectedEnd)??;

    Ok(AmlOption {
        data_type: span.kind.into(),
        position: node.start + span.offset,
        data: &object[span.offset..span.offset + span.size],
    })
}
