//! Object size computation.
//!
//! Most AML objects carry no length prefix; their extent is the opcode plus
//! the sum of their operands, where nested objects are sized recursively.
//! Objects with a PkgLength are the exception: the encoded length is trusted
//! for everything inside the package, provided it fits in the buffer.

use super::name::name_string_size;
use super::opcode::{self, AmlByteEncoding, EXT_OP_PREFIX, OperandKind};
use super::AmlError;

/// Decode an ACPI PkgLength field (1-4 bytes).
///
/// Returns `(field_len, pkg_len)` where `field_len` is the number of bytes
/// the PkgLength encoding itself occupies and `pkg_len` is the package
/// length, which counts the encoding bytes and everything after them.
///
/// # Errors
///
/// Returns [`AmlError::UnexpectedEnd`] if the field is truncated and
/// [`AmlError::InvalidPkgLength`] if the length is shorter than its own
/// encoding.
pub fn decode_pkg_length(bytes: &[u8]) -> Result<(usize, usize), AmlError> {
    let lead = *bytes.first().ok_or(AmlError::UnexpectedEnd)?;
    let follow = usize::from(lead >> 6);

    if follow == 0 {
        // Single byte: bits 5:0 are the length
        let len = usize::from(lead & 0x3F);
        return if len == 0 { Err(AmlError::InvalidPkgLength) } else { Ok((1, len)) };
    }

    // Multi-byte: lead bits 3:0 are the low nibble, following bytes are higher bits
    let follow_bytes = bytes.get(1..=follow).ok_or(AmlError::UnexpectedEnd)?;
    let mut len = usize::from(lead & 0x0F);
    for (i, &b) in follow_bytes.iter().enumerate() {
        len |= usize::from(b) << (4 + i * 8);
    }

    if len < 1 + follow {
        return Err(AmlError::InvalidPkgLength);
    }
    Ok((1 + follow, len))
}

/// Deepest chain of nested operand objects [`object_size`] follows.
///
/// Package contents are not walked when sizing, so only objects nested as
/// operands count towards it.
pub const MAX_NESTING: usize = 256;

/// Compute the total length of the object at the start of `bytes`.
///
/// `bytes` must end where the enclosing region ends; an object that would
/// extend past it is rejected rather than truncated.
///
/// # Errors
///
/// Returns an [`AmlError`] if the object or any nested object is malformed,
/// uses an unknown opcode, or overruns `bytes`, and
/// [`AmlError::TooDeep`] if operands nest more than [`MAX_NESTING`] levels.
pub fn object_size(encoding: &AmlByteEncoding, bytes: &[u8]) -> Result<usize, AmlError> {
    nested_object_size(encoding, bytes, 0)
}

/// Compute the length of one operand of the given kind at the start of
/// `bytes`.
///
/// A [`OperandKind::ByteList`] takes everything left in `bytes`, so callers
/// pass a slice bounded to the enclosing package.
///
/// # Errors
///
/// Returns an [`AmlError`] if the operand is malformed or overruns `bytes`.
pub fn operand_size(kind: OperandKind, bytes: &[u8]) -> Result<usize, AmlError> {
    nested_operand_size(kind, bytes, 0)
}

fn nested_object_size(encoding: &AmlByteEncoding, bytes: &[u8], depth: usize) -> Result<usize, AmlError> {
    if encoding.is_name_string() {
        // A name reached as a nested object is a reference to that name.
        return name_string_size(bytes).ok_or(AmlError::InvalidName);
    }

    let opcode_len = encoding.opcode_len();
    if bytes.len() < opcode_len {
        return Err(AmlError::UnexpectedEnd);
    }

    if encoding.has_pkg_length() {
        let (_, pkg_len) = decode_pkg_length(&bytes[opcode_len..])?;
        let size = opcode_len + pkg_len;
        if size > bytes.len() {
            return Err(AmlError::InvalidPkgLength);
        }
        return Ok(size);
    }

    let mut offset = opcode_len;
    for &kind in encoding.operands {
        if kind == OperandKind::ByteList {
            return Err(AmlError::MisplacedByteList);
        }
        offset += nested_operand_size(kind, &bytes[offset..], depth)?;
    }
    Ok(offset)
}

fn nested_operand_size(kind: OperandKind, bytes: &[u8], depth: usize) -> Result<usize, AmlError> {
    let size = match kind {
        OperandKind::Uint8 => 1,
        OperandKind::Uint16 => 2,
        OperandKind::Uint32 => 4,
        OperandKind::Uint64 => 8,
        OperandKind::Name => name_string_size(bytes).ok_or(AmlError::InvalidName)?,
        OperandKind::String => {
            bytes.iter().position(|&b| b == 0).ok_or(AmlError::UnterminatedString)? + 1
        }
        OperandKind::Object => {
            if depth >= MAX_NESTING {
                return Err(AmlError::TooDeep);
            }
            let encoding = lookup_or_error(bytes)?;
            nested_object_size(encoding, bytes, depth + 1)?
        }
        OperandKind::ByteList => bytes.len(),
    };

    if size > bytes.len() {
        return Err(AmlError::UnexpectedEnd);
    }
    Ok(size)
}

/// Like [`opcode::lookup`], reporting which byte was not understood.
///
/// # Errors
///
/// Returns [`AmlError::UnexpectedEnd`] for an empty or truncated opcode and
/// an unknown-opcode error otherwise.
pub fn lookup_or_error(bytes: &[u8]) -> Result<&'static AmlByteEncoding, AmlError> {
    opcode::lookup(bytes).ok_or(match bytes {
        [] | [EXT_OP_PREFIX] => AmlError::UnexpectedEnd,
        [EXT_OP_PREFIX, sub, ..] => AmlError::UnknownExtendedOpcode(*sub),
        [lead, ..] => AmlError::UnknownOpcode(*lead),
    })
}

/// Location of one operand relative to the start of its object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandSpan {
    /// Declared kind of the operand.
    pub kind: OperandKind,
    /// Offset from the first opcode byte.
    pub offset: usize,
    /// Encoded length.
    pub size: usize,
}

/// Iterator over the operands of one object, in encoding order.
///
/// Created by [`operands`]. Stops after the first error.
pub struct Operands<'a> {
    encoding: &'static AmlByteEncoding,
    object: &'a [u8],
    offset: usize,
    index: usize,
}

impl Operands<'_> {
    /// Offset just past the last operand visited so far.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for Operands<'_> {
    type Item = Result<OperandSpan, AmlError>;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = *self.encoding.operands.get(self.index)?;
        self.index += 1;

        match operand_size(kind, &self.object[self.offset..]) {
            Ok(size) => {
                let span = OperandSpan {
                    kind,
                    offset: self.offset,
                    size,
                };
                self.offset += size;
                Some(Ok(span))
            }
            Err(err) => {
                self.index = self.encoding.operands.len();
                Some(Err(err))
            }
        }
    }
}

/// Walk the operands of an already-sized object.
///
/// `object` must span exactly the object (as computed by [`object_size`]).
///
/// # Errors
///
/// Returns an [`AmlError`] if the PkgLength cannot be decoded.
pub fn operands<'a>(
    encoding: &'static AmlByteEncoding,
    object: &'a [u8],
) -> Result<Operands<'a>, AmlError> {
    let mut offset = encoding.opcode_len();
    if encoding.has_pkg_length() {
        let tail = object.get(offset..).ok_or(AmlError::UnexpectedEnd)?;
        offset += decode_pkg_length(tail)?.0;
    }
    if offset > object.len() {
        return Err(AmlError::UnexpectedEnd);
    }
    Ok(Operands {
        encoding,
        object,
        offset,
        index: 0,
    })
}
