//! Structural child enumeration.
//!
//! The children of a table root are the objects of its term list. The
//! children of an object are its nested-object operands followed, for
//! objects that carry one, by the term list after the last operand.
//! Enumeration is restartable: the next child is found by resuming just past
//! the previous one.

use log::trace;

use super::AmlError;
use super::name::name_string_size;
use super::opcode::OperandKind;
use super::size::operands;
use crate::handle::{AcpiHandle, NodeHandle};

/// Find the child of `parent` that follows `previous`, or the first child
/// when `previous` is `None`.
///
/// Returns `Ok(None)` once the children are exhausted. A returned child
/// never extends past the end of `parent`.
pub(crate) fn next_child(
    memory: &[u8],
    parent: &AcpiHandle,
    previous: Option<&NodeHandle>,
) -> Result<Option<NodeHandle>, AmlError> {
    let (start, end) = (parent.start(), parent.end());
    let resume = match previous {
        Some(prev) if prev.start < start || prev.start + prev.size > end => {
            return Err(AmlError::NotAChild);
        }
        Some(prev) => prev.start + prev.size,
        None => start,
    };

    let node = match parent {
        AcpiHandle::Root(_) => return scan_term_list(memory, resume, end),
        AcpiHandle::Node(node) => node,
    };

    let object = memory.get(start..end).ok_or(AmlError::UnexpectedEnd)?;
    let mut spans = operands(node.encoding, object)?;
    for span in spans.by_ref() {
        let span = span?;
        let position = start + span.offset;
        if span.kind != OperandKind::Object || position < resume {
            continue;
        }
        match NodeHandle::open(memory, position, end) {
            Ok(child) => return Ok(Some(child)),
            // A name passed as an argument is a reference, not a child.
            Err(AmlError::BareName) => {}
            Err(err) => return Err(err),
        }
    }

    if !node.encoding.has_child_objects() {
        return Ok(None);
    }
    scan_term_list(memory, resume.max(start + spans.offset()), end)
}

/// Return the first openable object in `memory[position..end]`.
///
/// Bare names are stepped over whole. Bytes that do not decode to an object
/// are stepped over one at a time.
fn scan_term_list(memory: &[u8], mut position: usize, end: usize) -> Result<Option<NodeHandle>, AmlError> {
    while position < end {
        let bytes = memory.get(position..end).ok_or(AmlError::UnexpectedEnd)?;
        match NodeHandle::open(memory, position, end) {
            Ok(child) => return Ok(Some(child)),
            Err(AmlError::BareName) => {
                position += name_string_size(bytes).unwrap_or(1);
            }
            Err(err) => {
                trace!("acpi-sdt: skipping {:#04x} at {position:#x}: {err}", bytes[0]);
                position += 1;
            }
        }
    }
    Ok(None)
}
