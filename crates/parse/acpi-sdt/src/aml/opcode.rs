//! AML opcode encodings.
//!
//! Every opcode is described by the kinds of operands that follow it, in
//! encoding order, plus a few attribute flags. The table is static and
//! covers the ACPI 6 opcode space.
//!
//! See ACPI 6.5, section 20: <https://uefi.org/specs/ACPI/6.5/20_AML_Specification.html>

use bitflags::bitflags;

/// `ExtOpPrefix`, the first byte of every two-byte opcode.
pub const EXT_OP_PREFIX: u8 = 0x5B;
/// `DualNamePrefix`, followed by two name segments.
pub const DUAL_NAME_PREFIX: u8 = 0x2E;
/// `MultiNamePrefix`, followed by a segment count and the segments.
pub const MULTI_NAME_PREFIX: u8 = 0x2F;
/// `RootChar` (`\`).
pub const ROOT_CHAR: u8 = b'\\';
/// `ParentPrefixChar` (`^`).
pub const PARENT_PREFIX_CHAR: u8 = b'^';
/// `NullName`.
pub const NULL_NAME: u8 = 0x00;

/// Layout of one operand following an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// `ByteData`.
    Uint8,
    /// `WordData`.
    Uint16,
    /// `DWordData`.
    Uint32,
    /// `QWordData`.
    Uint64,
    /// A `NameString`.
    Name,
    /// A NUL-terminated ASCII string.
    String,
    /// A nested object (`TermArg`, `SuperName`, `DataRefObject`, ...).
    Object,
    /// Uninterpreted bytes running to the end of the enclosing package.
    ByteList,
}

bitflags! {
    /// Attribute flags of an [`AmlByteEncoding`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EncodingAttributes: u32 {
        /// A PkgLength follows the opcode and bounds the whole object.
        const HAS_PKG_LENGTH = 1 << 0;
        /// The byte starts a name string, not an opcode.
        const IS_NAME_CHAR = 1 << 1;
        /// A term list follows the declared operands.
        const HAS_CHILD_OBJ = 1 << 2;
        /// The object declares a name in the ACPI namespace.
        const IN_NAMESPACE = 1 << 3;
    }
}

/// Operand layout of one opcode.
#[derive(Debug, PartialEq, Eq)]
pub struct AmlByteEncoding {
    /// Lead opcode byte.
    pub opcode: u8,
    /// Second byte for `ExtOpPrefix` opcodes.
    pub sub_opcode: Option<u8>,
    /// ASL-style mnemonic, used for diagnostics.
    pub mnemonic: &'static str,
    /// Operands in encoding order (operand index 1 is `operands[0]`).
    pub operands: &'static [OperandKind],
    /// Attribute flags.
    pub attributes: EncodingAttributes,
}

impl AmlByteEncoding {
    /// Number of bytes taken by the opcode itself.
    #[must_use]
    pub fn opcode_len(&self) -> usize {
        if self.sub_opcode.is_some() { 2 } else { 1 }
    }

    /// Highest valid operand index (index 0 is the opcode).
    #[must_use]
    pub fn max_index(&self) -> usize {
        self.operands.len()
    }

    /// Returns `true` if a PkgLength follows the opcode.
    #[must_use]
    pub fn has_pkg_length(&self) -> bool {
        self.attributes.contains(EncodingAttributes::HAS_PKG_LENGTH)
    }

    /// Returns `true` if a term list follows the operands.
    #[must_use]
    pub fn has_child_objects(&self) -> bool {
        self.attributes.contains(EncodingAttributes::HAS_CHILD_OBJ)
    }

    /// Returns `true` if the object declares a namespace name.
    #[must_use]
    pub fn in_namespace(&self) -> bool {
        self.attributes.contains(EncodingAttributes::IN_NAMESPACE)
    }

    /// Returns `true` for the pseudo-encoding of a bare name string.
    #[must_use]
    pub fn is_name_string(&self) -> bool {
        self.attributes.contains(EncodingAttributes::IS_NAME_CHAR)
    }
}

use OperandKind::{ByteList, Name, Object, String as Str, Uint8, Uint16, Uint32, Uint64};

const NONE: EncodingAttributes = EncodingAttributes::empty();
const PKG: EncodingAttributes = EncodingAttributes::HAS_PKG_LENGTH;
const PKG_CHILD: EncodingAttributes = PKG.union(EncodingAttributes::HAS_CHILD_OBJ);
const NS: EncodingAttributes = EncodingAttributes::IN_NAMESPACE;
const NS_SCOPE: EncodingAttributes = PKG_CHILD.union(NS);

const fn op(
    opcode: u8,
    mnemonic: &'static str,
    operands: &'static [OperandKind],
    attributes: EncodingAttributes,
) -> AmlByteEncoding {
    AmlByteEncoding {
        opcode,
        sub_opcode: None,
        mnemonic,
        operands,
        attributes,
    }
}

const fn ext(
    sub_opcode: u8,
    mnemonic: &'static str,
    operands: &'static [OperandKind],
    attributes: EncodingAttributes,
) -> AmlByteEncoding {
    AmlByteEncoding {
        opcode: EXT_OP_PREFIX,
        sub_opcode: Some(sub_opcode),
        mnemonic,
        operands,
        attributes,
    }
}

/// Pseudo-encoding shared by every lead name character.
pub static NAME_STRING: AmlByteEncoding = AmlByteEncoding {
    opcode: b'_',
    sub_opcode: None,
    mnemonic: "NameString",
    operands: &[],
    attributes: EncodingAttributes::IS_NAME_CHAR,
};

/// One-byte opcodes.
static PRIMARY: &[AmlByteEncoding] = &[
    op(0x00, "Zero", &[], NONE),
    op(0x01, "One", &[], NONE),
    op(0x06, "Alias", &[Name, Name], NS),
    op(0x08, "Name", &[Name, Object], NS),
    op(0x0A, "BytePrefix", &[Uint8], NONE),
    op(0x0B, "WordPrefix", &[Uint16], NONE),
    op(0x0C, "DWordPrefix", &[Uint32], NONE),
    op(0x0D, "StringPrefix", &[Str], NONE),
    op(0x0E, "QWordPrefix", &[Uint64], NONE),
    op(0x10, "Scope", &[Name], NS_SCOPE),
    op(0x11, "Buffer", &[Object, ByteList], PKG),
    op(0x12, "Package", &[Uint8], PKG_CHILD),
    op(0x13, "VarPackage", &[Object], PKG_CHILD),
    op(0x14, "Method", &[Name, Uint8], NS_SCOPE),
    op(0x15, "External", &[Name, Uint8, Uint8], NONE),
    op(0x60, "Local0", &[], NONE),
    op(0x61, "Local1", &[], NONE),
    op(0x62, "Local2", &[], NONE),
    op(0x63, "Local3", &[], NONE),
    op(0x64, "Local4", &[], NONE),
    op(0x65, "Local5", &[], NONE),
    op(0x66, "Local6", &[], NONE),
    op(0x67, "Local7", &[], NONE),
    op(0x68, "Arg0", &[], NONE),
    op(0x69, "Arg1", &[], NONE),
    op(0x6A, "Arg2", &[], NONE),
    op(0x6B, "Arg3", &[], NONE),
    op(0x6C, "Arg4", &[], NONE),
    op(0x6D, "Arg5", &[], NONE),
    op(0x6E, "Arg6", &[], NONE),
    op(0x70, "Store", &[Object, Object], NONE),
    op(0x71, "RefOf", &[Object], NONE),
    op(0x72, "Add", &[Object, Object, Object], NONE),
    op(0x73, "Concatenate", &[Object, Object, Object], NONE),
    op(0x74, "Subtract", &[Object, Object, Object], NONE),
    op(0x75, "Increment", &[Object], NONE),
    op(0x76, "Decrement", &[Object], NONE),
    op(0x77, "Multiply", &[Object, Object, Object], NONE),
    op(0x78, "Divide", &[Object, Object, Object, Object], NONE),
    op(0x79, "ShiftLeft", &[Object, Object, Object], NONE),
    op(0x7A, "ShiftRight", &[Object, Object, Object], NONE),
    op(0x7B, "And", &[Object, Object, Object], NONE),
    op(0x7C, "NAnd", &[Object, Object, Object], NONE),
    op(0x7D, "Or", &[Object, Object, Object], NONE),
    op(0x7E, "NOr", &[Object, Object, Object], NONE),
    op(0x7F, "XOr", &[Object, Object, Object], NONE),
    op(0x80, "Not", &[Object, Object], NONE),
    op(0x81, "FindSetLeftBit", &[Object, Object], NONE),
    op(0x82, "FindSetRightBit", &[Object, Object], NONE),
    op(0x83, "DerefOf", &[Object], NONE),
    op(0x84, "ConcatenateResTemplate", &[Object, Object, Object], NONE),
    op(0x85, "Mod", &[Object, Object, Object], NONE),
    op(0x86, "Notify", &[Object, Object], NONE),
    op(0x87, "SizeOf", &[Object], NONE),
    op(0x88, "Index", &[Object, Object, Object], NONE),
    op(0x89, "Match", &[Object, Uint8, Object, Uint8, Object, Object], NONE),
    op(0x8A, "CreateDWordField", &[Object, Object, Name], NS),
    op(0x8B, "CreateWordField", &[Object, Object, Name], NS),
    op(0x8C, "CreateByteField", &[Object, Object, Name], NS),
    op(0x8D, "CreateBitField", &[Object, Object, Name], NS),
    op(0x8E, "ObjectType", &[Object], NONE),
    op(0x8F, "CreateQWordField", &[Object, Object, Name], NS),
    op(0x90, "LAnd", &[Object, Object], NONE),
    op(0x91, "LOr", &[Object, Object], NONE),
    op(0x92, "LNot", &[Object], NONE),
    op(0x93, "LEqual", &[Object, Object], NONE),
    op(0x94, "LGreater", &[Object, Object], NONE),
    op(0x95, "LLess", &[Object, Object], NONE),
    op(0x96, "ToBuffer", &[Object, Object], NONE),
    op(0x97, "ToDecimalString", &[Object, Object], NONE),
    op(0x98, "ToHexString", &[Object, Object], NONE),
    op(0x99, "ToInteger", &[Object, Object], NONE),
    op(0x9C, "ToString", &[Object, Object, Object], NONE),
    op(0x9D, "CopyObject", &[Object, Object], NONE),
    op(0x9E, "Mid", &[Object, Object, Object, Object], NONE),
    op(0x9F, "Continue", &[], NONE),
    op(0xA0, "If", &[Object], PKG_CHILD),
    op(0xA1, "Else", &[], PKG_CHILD),
    op(0xA2, "While", &[Object], PKG_CHILD),
    op(0xA3, "Noop", &[], NONE),
    op(0xA4, "Return", &[Object], NONE),
    op(0xA5, "Break", &[], NONE),
    op(0xCC, "BreakPoint", &[], NONE),
    op(0xFF, "Ones", &[], NONE),
];

/// Opcodes introduced by `ExtOpPrefix` (`0x5B`).
static EXTENDED: &[AmlByteEncoding] = &[
    ext(0x01, "Mutex", &[Name, Uint8], NS),
    ext(0x02, "Event", &[Name], NS),
    ext(0x12, "CondRefOf", &[Object, Object], NONE),
    ext(0x13, "CreateField", &[Object, Object, Object, Name], NS),
    ext(0x1F, "LoadTable", &[Object, Object, Object, Object, Object, Object], NONE),
    ext(0x20, "Load", &[Name, Object], NONE),
    ext(0x21, "Stall", &[Object], NONE),
    ext(0x22, "Sleep", &[Object], NONE),
    ext(0x23, "Acquire", &[Object, Uint16], NONE),
    ext(0x24, "Signal", &[Object], NONE),
    ext(0x25, "Wait", &[Object, Object], NONE),
    ext(0x26, "Reset", &[Object], NONE),
    ext(0x27, "Release", &[Object], NONE),
    ext(0x28, "FromBCD", &[Object, Object], NONE),
    ext(0x29, "ToBCD", &[Object, Object], NONE),
    ext(0x2A, "Unload", &[Object], NONE),
    ext(0x30, "Revision", &[], NONE),
    ext(0x31, "Debug", &[], NONE),
    ext(0x32, "Fatal", &[Uint8, Uint32, Object], NONE),
    ext(0x33, "Timer", &[], NONE),
    ext(0x80, "OperationRegion", &[Name, Uint8, Object, Object], NS),
    ext(0x81, "Field", &[Name, Uint8, ByteList], PKG),
    ext(0x82, "Device", &[Name], NS_SCOPE),
    ext(0x83, "Processor", &[Name, Uint8, Uint32, Uint8], NS_SCOPE),
    ext(0x84, "PowerResource", &[Name, Uint8, Uint16], NS_SCOPE),
    ext(0x85, "ThermalZone", &[Name], NS_SCOPE),
    ext(0x86, "IndexField", &[Name, Name, Uint8, ByteList], PKG),
    ext(0x87, "BankField", &[Name, Name, Object, Uint8, ByteList], PKG),
    ext(0x88, "DataTableRegion", &[Name, Object, Object, Object], NS),
];

/// Returns `true` for `LeadNameChar` (`A`-`Z` or `_`).
#[must_use]
pub fn is_lead_name_char(byte: u8) -> bool {
    byte.is_ascii_uppercase() || byte == b'_'
}

/// Returns `true` for any `NameChar` (`A`-`Z`, `0`-`9` or `_`).
#[must_use]
pub fn is_name_char(byte: u8) -> bool {
    is_lead_name_char(byte) || byte.is_ascii_digit()
}

/// Returns `true` if `byte` can start a `NameString`.
#[must_use]
pub fn starts_name_string(byte: u8) -> bool {
    is_lead_name_char(byte)
        || matches!(byte, ROOT_CHAR | PARENT_PREFIX_CHAR | DUAL_NAME_PREFIX | MULTI_NAME_PREFIX)
}

/// Look up the encoding of the opcode at the start of `bytes`.
///
/// Returns `None` for an empty slice, a truncated extended opcode, or an
/// unassigned opcode byte. Bytes that start a name string map to
/// [`NAME_STRING`].
#[must_use]
pub fn lookup(bytes: &[u8]) -> Option<&'static AmlByteEncoding> {
    let (&lead, rest) = bytes.split_first()?;
    if starts_name_string(lead) {
        return Some(&NAME_STRING);
    }
    if lead == EXT_OP_PREFIX {
        let sub = *rest.first()?;
        return EXTENDED.iter().find(|e| e.sub_opcode == Some(sub));
    }
    PRIMARY.iter().find(|e| e.opcode == lead)
}
