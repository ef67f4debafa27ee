//! Handles to positions inside installed AML tables.
//!
//! A handle is a small view record: where the object starts in registry
//! memory, how long it is, and whether it has been written through. It never
//! owns table bytes, so any number of handles may overlap.

use crate::aml::AmlError;
use crate::aml::opcode::AmlByteEncoding;
use crate::aml::size::{lookup_or_error, object_size};
use crate::registry::TableKey;

/// Handle to the top of one table's AML body.
///
/// A root handle carries no opcode and therefore has no operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootHandle {
    pub(crate) table: TableKey,
    pub(crate) start: usize,
    pub(crate) size: usize,
    pub(crate) modified: bool,
}

impl RootHandle {
    /// Key of the table this handle belongs to.
    #[must_use]
    pub fn table(&self) -> TableKey {
        self.table
    }
}

/// Handle to one decoded AML object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHandle {
    pub(crate) start: usize,
    pub(crate) encoding: &'static AmlByteEncoding,
    pub(crate) size: usize,
    pub(crate) modified: bool,
}

impl NodeHandle {
    /// Decode the object at `start`, which must end before `end`.
    ///
    /// Bare name strings are rejected: they only exist as operands of the
    /// object that contains them.
    pub(crate) fn open(memory: &[u8], start: usize, end: usize) -> Result<Self, AmlError> {
        let bytes = memory.get(start..end).ok_or(AmlError::UnexpectedEnd)?;
        let encoding = lookup_or_error(bytes)?;
        if encoding.is_name_string() {
            return Err(AmlError::BareName);
        }
        let size = object_size(encoding, bytes)?;
        Ok(Self {
            start,
            encoding,
            size,
            modified: false,
        })
    }

    /// Operand layout of the object's opcode.
    #[must_use]
    pub fn encoding(&self) -> &'static AmlByteEncoding {
        self.encoding
    }
}

/// An open ACPI handle: either a table root or a decoded object.
///
/// Cloning a handle duplicates it, including its modified flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcpiHandle {
    /// The top of a table body.
    Root(RootHandle),
    /// A decoded object within a table body.
    Node(NodeHandle),
}

impl AcpiHandle {
    /// Offset of the first byte covered by this handle in registry memory.
    #[must_use]
    pub fn start(&self) -> usize {
        match self {
            Self::Root(root) => root.start,
            Self::Node(node) => node.start,
        }
    }

    /// Number of bytes covered by this handle.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Root(root) => root.size,
            Self::Node(node) => node.size,
        }
    }

    /// Offset just past the last byte covered by this handle.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start() + self.size()
    }

    /// Returns `true` if an operand was written through this handle.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        match self {
            Self::Root(root) => root.modified,
            Self::Node(node) => node.modified,
        }
    }

    /// Returns `true` for a table root handle.
    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root(_))
    }

    /// Returns the decoded object, or `None` for a root handle.
    #[must_use]
    pub fn as_node(&self) -> Option<&NodeHandle> {
        match self {
            Self::Root(_) => None,
            Self::Node(node) => Some(node),
        }
    }
}

impl From<NodeHandle> for AcpiHandle {
    fn from(node: NodeHandle) -> Self {
        Self::Node(node)
    }
}

impl From<RootHandle> for AcpiHandle {
    fn from(root: RootHandle) -> Self {
        Self::Root(root)
    }
}
