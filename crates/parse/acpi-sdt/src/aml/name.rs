//! AML name segments and paths.
//!
//! ACPI names are composed of 4-byte segments. A name string may be prefixed
//! with the root character (`\`) or any number of parent prefixes (`^`), and
//! carries zero, one, two (`DualNamePrefix`) or N (`MultiNamePrefix`)
//! segments.

use alloc::vec::Vec;

use super::AmlError;
use super::opcode::{
    DUAL_NAME_PREFIX, MULTI_NAME_PREFIX, NULL_NAME, PARENT_PREFIX_CHAR, ROOT_CHAR, is_lead_name_char,
    is_name_char,
};

/// A 4-byte AML name segment (e.g., `_SB_`, `PCI0`, `_HID`).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameSeg(pub [u8; 4]);

impl NameSeg {
    /// Create a `NameSeg` from the first 4 bytes of a slice.
    ///
    /// Returns `None` if the slice is shorter than 4 bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let mut seg = [0u8; 4];
        seg.copy_from_slice(bytes.get(..4)?);
        Some(Self(seg))
    }

    /// Convert one ASL name segment (`PCI0`, `_sb`, `LPC`) to its encoded
    /// form: upper-cased and padded with `_` to 4 characters.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidName`] for empty or over-long segments and
    /// for characters outside the ACPI name alphabet.
    pub fn from_asl(text: &[u8]) -> Result<Self, AmlError> {
        if text.is_empty() || text.len() > 4 {
            return Err(AmlError::InvalidName);
        }
        let mut seg = [b'_'; 4];
        for (i, &c) in text.iter().enumerate() {
            let c = c.to_ascii_uppercase();
            let valid = if i == 0 { is_lead_name_char(c) } else { is_name_char(c) };
            if !valid {
                return Err(AmlError::InvalidName);
            }
            seg[i] = c;
        }
        Ok(Self(seg))
    }

    /// Returns the name as a UTF-8 string (ACPI names are always ASCII).
    #[must_use]
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.0).unwrap_or("")
    }
}

impl core::fmt::Debug for NameSeg {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NameSeg(\"{}\")", self.as_str())
    }
}

impl core::fmt::Display for NameSeg {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the encoded length of the `NameString` at the start of `bytes`.
///
/// Returns `None` if the name is malformed or runs past the end of `bytes`.
#[must_use]
pub fn name_string_size(bytes: &[u8]) -> Option<usize> {
    let mut len = 0;
    while matches!(bytes.get(len), Some(&(ROOT_CHAR | PARENT_PREFIX_CHAR))) {
        len += 1;
    }

    let segments = match *bytes.get(len)? {
        NULL_NAME => {
            len += 1;
            0
        }
        DUAL_NAME_PREFIX => {
            len += 1;
            2
        }
        MULTI_NAME_PREFIX => {
            let count = *bytes.get(len + 1)?;
            len += 2;
            usize::from(count)
        }
        lead if is_lead_name_char(lead) => 1,
        _ => return None,
    };

    len += segments * 4;
    (len <= bytes.len()).then_some(len)
}

/// A decoded AML name path.
///
/// Unlike a fully-qualified namespace path, this keeps the prefix form of
/// the name: whether it is anchored at the root and how many scopes it climbs
/// before descending through its segments.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct NamePath {
    root: bool,
    parent_count: usize,
    segments: Vec<NameSeg>,
}

impl NamePath {
    /// Parse an ASL path such as `\_SB.PCI0.LPC0`, `^^FOO` or `_hid`.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidName`] if the text is empty, mixes root
    /// and parent prefixes, places a prefix after the first segment,
    /// contains an invalid segment, or has more segments than a
    /// `MultiNamePrefix` count can hold.
    pub fn from_asl(text: &str) -> Result<Self, AmlError> {
        let mut rest = text.as_bytes();
        let mut path = Self::default();

        if let Some((&ROOT_CHAR, tail)) = rest.split_first() {
            path.root = true;
            rest = tail;
        } else {
            while let Some((&PARENT_PREFIX_CHAR, tail)) = rest.split_first() {
                path.parent_count += 1;
                rest = tail;
            }
        }

        if rest.is_empty() {
            return if path.root || path.parent_count > 0 {
                Ok(path)
            } else {
                Err(AmlError::InvalidName)
            };
        }

        for segment in rest.split(|&c| c == b'.') {
            path.segments.push(NameSeg::from_asl(segment)?);
        }
        if path.segments.len() > usize::from(u8::MAX) {
            return Err(AmlError::InvalidName);
        }
        Ok(path)
    }

    /// Decode the `NameString` at the start of `bytes`.
    ///
    /// Returns the path together with the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidName`] if the encoding is malformed or
    /// truncated.
    pub fn from_aml(bytes: &[u8]) -> Result<(Self, usize), AmlError> {
        let size = name_string_size(bytes).ok_or(AmlError::InvalidName)?;
        let mut path = Self::default();
        let mut pos = 0;

        if bytes[0] == ROOT_CHAR {
            path.root = true;
            pos = 1;
        }
        while bytes[pos] == PARENT_PREFIX_CHAR {
            path.parent_count += 1;
            pos += 1;
        }

        let count = match bytes[pos] {
            NULL_NAME => 0,
            DUAL_NAME_PREFIX => {
                pos += 1;
                2
            }
            MULTI_NAME_PREFIX => {
                pos += 2;
                usize::from(bytes[pos - 1])
            }
            _ => 1,
        };

        for chunk in bytes[pos..size].chunks_exact(4).take(count) {
            if !is_lead_name_char(chunk[0]) || !chunk[1..].iter().all(|&c| is_name_char(c)) {
                return Err(AmlError::InvalidName);
            }
            path.segments.extend(NameSeg::from_bytes(chunk));
        }
        Ok((path, size))
    }

    /// Encode this path as an AML `NameString`.
    ///
    /// Paths hold at most 255 segments, so every path has an encoding.
    #[must_use]
    pub fn to_aml(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(3 + self.parent_count + self.segments.len() * 4);
        if self.root {
            out.push(ROOT_CHAR);
        }
        out.extend(core::iter::repeat_n(PARENT_PREFIX_CHAR, self.parent_count));

        match self.segments.len() {
            0 => out.push(NULL_NAME),
            1 => {}
            2 => out.push(DUAL_NAME_PREFIX),
            n => {
                out.push(MULTI_NAME_PREFIX);
                out.push(u8::try_from(n).unwrap_or(u8::MAX));
            }
        }
        for seg in &self.segments {
            out.extend_from_slice(&seg.0);
        }
        out
    }

    /// Returns `true` if the path names the namespace root itself (`\`).
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.root && self.parent_count == 0 && self.segments.is_empty()
    }

    /// Returns `true` if the path starts with the root character.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.root
    }

    /// Number of `^` prefixes.
    #[must_use]
    pub fn parent_count(&self) -> usize {
        self.parent_count
    }

    /// Returns the segments of this path.
    #[must_use]
    pub fn segments(&self) -> &[NameSeg] {
        &self.segments
    }
}

impl core::fmt::Display for NamePath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.root {
            f.write_str("\\")?;
        }
        for _ in 0..self.parent_count {
            f.write_str("^")?;
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl core::fmt::Debug for NamePath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NamePath(\"{self}\")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_string_sizes() {
        assert_eq!(name_string_size(b"_HID"), Some(4));
        assert_eq!(name_string_size(b"\\_SB_"), Some(5));
        assert_eq!(name_string_size(b"^^FOO_xx"), Some(6));
        assert_eq!(name_string_size(b"\x2E_SB_PCI0"), Some(9));
        assert_eq!(name_string_size(b"\\\x2F\x03_SB_PCI0LPC0"), Some(15));
        assert_eq!(name_string_size(b"\\\x00"), Some(2));
    }

    #[test]
    fn truncated_or_malformed_names() {
        assert_eq!(name_string_size(b"_HI"), None);
        assert_eq!(name_string_size(b"\\"), None);
        assert_eq!(name_string_size(b"\x2F"), None);
        assert_eq!(name_string_size(b"\x2F\x02_SB_"), None);
        assert_eq!(name_string_size(b"1ABC"), None);
    }

    #[test]
    fn asl_paths_are_normalised() {
        let path = NamePath::from_asl("\\_sb.PCI0.lpc").unwrap();
        assert!(path.is_absolute());
        assert_eq!(path.segments(), &[NameSeg(*b"_SB_"), NameSeg(*b"PCI0"), NameSeg(*b"LPC_")]);
        assert_eq!(path.to_aml(), b"\\\x2F\x03_SB_PCI0LPC_");
        assert_eq!(path.to_string(), "\\_SB_.PCI0.LPC_");
    }

    #[test]
    fn prefix_only_paths() {
        assert!(NamePath::from_asl("\\").unwrap().is_root());
        assert_eq!(NamePath::from_asl("\\").unwrap().to_aml(), b"\\\x00");

        let up = NamePath::from_asl("^^").unwrap();
        assert_eq!(up.parent_count(), 2);
        assert!(!up.is_root());

        let dual = NamePath::from_asl("^FOO.BAR").unwrap();
        assert_eq!(dual.to_aml(), b"^\x2EFOO_BAR_");
    }

    #[test]
    fn segment_count_fits_multi_name_prefix() {
        let longest = ["ABCD"; 255].join(".");
        let path = NamePath::from_asl(&longest).unwrap();
        let aml = path.to_aml();
        assert_eq!(&aml[..2], &[MULTI_NAME_PREFIX, 255]);
        assert_eq!(NamePath::from_aml(&aml), Ok((path, 2 + 255 * 4)));

        let too_long = ["ABCD"; 256].join(".");
        assert_eq!(NamePath::from_asl(&too_long), Err(AmlError::InvalidName));
    }

    #[test]
    fn malformed_asl_paths() {
        for text in ["", "\\^FOO", "FOO^", "FOO..BAR", "FOO.", "TOOLONG", "1ABC", "A-B", "\\\\"] {
            assert_eq!(NamePath::from_asl(text), Err(AmlError::InvalidName), "{text:?}");
        }
    }

    #[test]
    fn aml_round_trips_through_decoder() {
        let encoded = b"\\\x2F\x03_SB_PCI0LPC0\x0C";
        let (path, used) = NamePath::from_aml(encoded).unwrap();
        assert_eq!(used, 15);
        assert_eq!(path, NamePath::from_asl("\\_SB.PCI0.LPC0").unwrap());
    }

    #[test]
    fn decoder_rejects_bad_segment_characters() {
        assert_eq!(NamePath::from_aml(b"_H!D"), Err(AmlError::InvalidName));
    }
}
