//! Structural namespace tree used for path lookups.
//!
//! The tree is built from one subtree of a table by walking its children
//! and recording every object that declares a name. Resolution is purely
//! structural: a path matches when its segments name successive declared
//! nodes, with no search rules beyond `\` and `^` prefixes.

use alloc::vec::Vec;

use super::AmlError;
use super::child::next_child;
use super::name::{NamePath, NameSeg};
use super::opcode::OperandKind;
use super::size::{MAX_NESTING, operands};
use crate::handle::{AcpiHandle, NodeHandle};

/// Index of the root node in [`Namespace::nodes`].
pub const ROOT: usize = 0;

/// A single node in the structural namespace.
#[derive(Debug, Clone)]
pub struct NamespaceNode {
    /// Local name of this node.
    pub name: NameSeg,
    /// Index of the enclosing node. The root is its own parent.
    pub parent: usize,
    /// Indices of the nodes declared directly inside this one.
    pub children: Vec<usize>,
    /// The declaring object, or `None` for the root and for scopes that are
    /// only implied by a multi-segment name.
    pub object: Option<NodeHandle>,
}

/// A namespace tree collected from one subtree of a table.
#[derive(Debug, Clone)]
pub struct Namespace {
    nodes: Vec<NamespaceNode>,
}

impl Namespace {
    fn new() -> Self {
        Self {
            nodes: alloc::vec![NamespaceNode {
                name: NameSeg(*b"\\___"),
                parent: ROOT,
                children: Vec::new(),
                object: None,
            }],
        }
    }

    /// Build the tree for `object` and everything nested inside it.
    ///
    /// The object's own name, if it declares one, is placed relative to the
    /// root.
    ///
    /// # Errors
    ///
    /// Returns an [`AmlError`] if any object in the subtree cannot be walked,
    /// or [`AmlError::TooDeep`] if objects nest more than [`MAX_NESTING`]
    /// levels below `object`.
    pub fn from_object(memory: &[u8], object: &NodeHandle) -> Result<Self, AmlError> {
        let mut namespace = Self::new();
        namespace.visit(memory, object.clone(), ROOT, 0)?;
        Ok(namespace)
    }

    /// Build the tree for the contents of `object`, treating the object
    /// itself as the root scope.
    ///
    /// # Errors
    ///
    /// Returns an [`AmlError`] if any object in the subtree cannot be walked,
    /// or [`AmlError::TooDeep`] if objects nest more than [`MAX_NESTING`]
    /// levels below `object`.
    pub fn from_contents(memory: &[u8], object: &NodeHandle) -> Result<Self, AmlError> {
        let mut namespace = Self::new();
        namespace.visit_children(memory, AcpiHandle::Node(object.clone()), ROOT, 0)?;
        Ok(namespace)
    }

    /// Resolve `path` starting from the node at index `scope`.
    ///
    /// Returns `None` if any segment is missing or the final node has no
    /// declaring object.
    #[must_use]
    pub fn lookup(&self, scope: usize, path: &NamePath) -> Option<&NodeHandle> {
        let mut node = self.start_of(scope, path);
        for &segment in path.segments() {
            node = self.child(node, segment)?;
        }
        self.nodes.get(node)?.object.as_ref()
    }

    /// Returns all nodes; index [`ROOT`] is the root.
    #[must_use]
    pub fn nodes(&self) -> &[NamespaceNode] {
        &self.nodes
    }

    fn start_of(&self, scope: usize, path: &NamePath) -> usize {
        if path.is_absolute() {
            return ROOT;
        }
        (0..path.parent_count()).fold(scope, |node, _| self.nodes[node].parent)
    }

    fn child(&self, parent: usize, name: NameSeg) -> Option<usize> {
        self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&index| self.nodes[index].name == name)
    }

    fn child_or_insert(&mut self, parent: usize, name: NameSeg) -> usize {
        if let Some(index) = self.child(parent, name) {
            return index;
        }
        let index = self.nodes.len();
        self.nodes.push(NamespaceNode {
            name,
            parent,
            children: Vec::new(),
            object: None,
        });
        self.nodes[parent].children.push(index);
        index
    }

    /// Record `object` under `path`; the first declaration of a name wins.
    fn declare(&mut self, scope: usize, path: &NamePath, object: &NodeHandle) -> usize {
        let mut node = self.start_of(scope, path);
        for &segment in path.segments() {
            node = self.child_or_insert(node, segment);
        }
        if node != ROOT && self.nodes[node].object.is_none() {
            self.nodes[node].object = Some(object.clone());
        }
        node
    }

    fn visit(&mut self, memory: &[u8], object: NodeHandle, scope: usize, depth: usize) -> Result<(), AmlError> {
        if depth > MAX_NESTING {
            return Err(AmlError::TooDeep);
        }
        let scope = match declared_name(memory, &object)? {
            Some(path) => self.declare(scope, &path, &object),
            None => scope,
        };
        self.visit_children(memory, AcpiHandle::Node(object), scope, depth)
    }

    fn visit_children(
        &mut self,
        memory: &[u8],
        parent: AcpiHandle,
        scope: usize,
        depth: usize,
    ) -> Result<(), AmlError> {
        let mut previous = None;
        while let Some(child) = next_child(memory, &parent, previous.as_ref())? {
            self.visit(memory, child.clone(), scope, depth + 1)?;
            previous = Some(child);
        }
        Ok(())
    }
}

/// The name declared by `object`: its last `NameString` operand, when the
/// opcode creates a namespace entry.
fn declared_name(memory: &[u8], object: &NodeHandle) -> Result<Option<NamePath>, AmlError> {
    if !object.encoding.in_namespace() {
        return Ok(None);
    }
    let bytes = memory
        .get(object.start..object.start + object.size)
        .ok_or(AmlError::UnexpectedEnd)?;

    let mut last = None;
    for span in operands(object.encoding, bytes)? {
        let span = span?;
        if span.kind == OperandKind::Name {
            last = Some(span.offset);
        }
    }
    let Some(offset) = last else {
        return Ok(None);
    };
    let (path, _) = NamePath::from_aml(&bytes[offset..])?;
    Ok(Some(path))
}

/// Resolve `path` below a table root, trying the subtree of each root child
/// in order and returning the first match.
///
/// # Errors
///
/// Returns an [`AmlError`] if a child or one of its subtrees cannot be
/// walked.
pub(crate) fn find_from_root(
    memory: &[u8],
    root: &AcpiHandle,
    path: &NamePath,
) -> Result<Option<NodeHandle>, AmlError> {
    let mut previous = None;
    while let Some(child) = next_child(memory, root, previous.as_ref())? {
        let namespace = Namespace::from_object(memory, &child)?;
        if let Some(found) = namespace.lookup(ROOT, path) {
            return Ok(Some(found.clone()));
        }
        previous = Some(child);
    }
    Ok(None)
}

/// Resolve `path` within the contents of `node` only.
///
/// # Errors
///
/// Returns an [`AmlError`] if the subtree cannot be walked.
pub(crate) fn find_in_subtree(
    memory: &[u8],
    node: &NodeHandle,
    path: &NamePath,
) -> Result<Option<NodeHandle>, AmlError> {
    let namespace = Namespace::from_contents(memory, node)?;
    Ok(namespace.lookup(ROOT, path).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::RootHandle;
    use crate::registry::TableKey;

    fn pkg(opcode: &[u8], contents: &[&[u8]]) -> Vec<u8> {
        let contents = contents.concat();
        let mut out = opcode.to_vec();
        out.push(u8::try_from(contents.len() + 1).unwrap());
        out.extend_from_slice(&contents);
        out
    }

    fn named_pkg(opcode: &[u8], name: &[u8], body: &[&[u8]]) -> Vec<u8> {
        let mut contents = vec![name];
        contents.extend_from_slice(body);
        pkg(opcode, &contents)
    }

    fn device(name: &[u8], body: &[&[u8]]) -> Vec<u8> {
        named_pkg(&[0x5B, 0x82], name, body)
    }

    fn scope(name: &[u8], body: &[&[u8]]) -> Vec<u8> {
        named_pkg(&[0x10], name, body)
    }

    fn name_obj(name: &[u8], value: &[u8]) -> Vec<u8> {
        [&[0x08][..], name, value].concat()
    }

    fn root(memory: &[u8]) -> AcpiHandle {
        AcpiHandle::Root(RootHandle {
            table: TableKey(1),
            start: 0,
            size: memory.len(),
            modified: false,
        })
    }

    fn path(text: &str) -> NamePath {
        NamePath::from_asl(text).unwrap()
    }

    // Name (VER_, One)
    // Scope (\_SB_) { Device (PCI0) { Name (_ADR, Zero) Device (LPC0) {} } }
    fn dsdt() -> Vec<u8> {
        let lpc = device(b"LPC0", &[]);
        let pci = device(b"PCI0", &[&name_obj(b"_ADR", &[0x00]), &lpc]);
        [name_obj(b"VER_", &[0x01]), scope(b"\\_SB_", &[&pci])].concat()
    }

    #[test]
    fn root_lookup_walks_each_child_subtree() {
        let memory = dsdt();
        let root = root(&memory);

        let lpc = find_from_root(&memory, &root, &path("\\_SB.PCI0.LPC0")).unwrap().unwrap();
        assert_eq!(lpc.encoding.mnemonic, "Device");
        assert_eq!(&memory[lpc.start + 3..lpc.start + 7], b"LPC0");

        let adr = find_from_root(&memory, &root, &path("_SB.PCI0._ADR")).unwrap().unwrap();
        assert_eq!(adr.encoding.mnemonic, "Name");

        let ver = find_from_root(&memory, &root, &path("VER")).unwrap().unwrap();
        assert_eq!(ver.start, 0);
    }

    #[test]
    fn missing_paths_are_not_errors() {
        let memory = dsdt();
        let root = root(&memory);
        assert_eq!(find_from_root(&memory, &root, &path("\\_SB.PCI0.LPC1")), Ok(None));
        assert_eq!(find_from_root(&memory, &root, &path("PCI0")), Ok(None));
    }

    #[test]
    fn implied_scopes_have_no_object() {
        // Scope (\_SB_.PCI0) { Name (FOO_, One) }
        let memory = scope(b"\\\x2E_SB_PCI0", &[&name_obj(b"FOO_", &[0x01])]);
        let root = root(&memory);
        assert_eq!(find_from_root(&memory, &root, &path("\\_SB")), Ok(None));
        assert!(find_from_root(&memory, &root, &path("\\_SB.PCI0")).unwrap().is_some());
        assert!(find_from_root(&memory, &root, &path("\\_SB.PCI0.FOO")).unwrap().is_some());
    }

    #[test]
    fn subtree_lookup_is_relative_to_the_node() {
        let memory = dsdt();
        let root = root(&memory);
        let pci = find_from_root(&memory, &root, &path("\\_SB.PCI0")).unwrap().unwrap();

        let lpc = find_in_subtree(&memory, &pci, &path("LPC0")).unwrap().unwrap();
        assert_eq!(lpc.encoding.mnemonic, "Device");
        assert!(find_in_subtree(&memory, &pci, &path("_ADR")).unwrap().is_some());
        assert_eq!(find_in_subtree(&memory, &pci, &path("\\_SB.PCI0")), Ok(None));
        assert_eq!(find_in_subtree(&memory, &pci, &path("VER")), Ok(None));
    }

    #[test]
    fn parent_prefixes_climb_scopes() {
        // Scope (\_SB_) { Device (PCI0) { Name (^FOO_, One) } }
        let memory = scope(b"\\_SB_", &[&device(b"PCI0", &[&name_obj(b"^FOO_", &[0x01])])]);
        let root = root(&memory);
        assert!(find_from_root(&memory, &root, &path("\\_SB.FOO")).unwrap().is_some());
        assert_eq!(find_from_root(&memory, &root, &path("\\_SB.PCI0.FOO")), Ok(None));
    }

    #[test]
    fn first_declaration_wins() {
        let memory = device(b"DEV0", &[&name_obj(b"FOO_", &[0x01]), &name_obj(b"FOO_", &[0x00])]);
        let node = NodeHandle::open(&memory, 0, memory.len()).unwrap();
        let found = find_in_subtree(&memory, &node, &path("FOO")).unwrap().unwrap();
        assert_eq!(found.start, 3 + 4);
    }

    /// `depth` devices named `DEV_`, each nested in the previous one.
    fn nested_devices(depth: usize) -> Vec<u8> {
        let mut inner = Vec::new();
        for _ in 0..depth {
            // two-byte PkgLength covering itself, the name and the body
            let len = 2 + 4 + inner.len();
            let mut out = vec![
                0x5B,
                0x82,
                0x40 | u8::try_from(len & 0x0F).unwrap(),
                u8::try_from(len >> 4).unwrap(),
            ];
            out.extend_from_slice(b"DEV_");
            out.extend_from_slice(&inner);
            inner = out;
        }
        inner
    }

    #[test]
    fn deep_package_nesting_is_bounded() {
        let memory = nested_devices(8);
        let root = root(&memory);
        assert!(find_from_root(&memory, &root, &path("DEV.DEV.DEV")).unwrap().is_some());

        let memory = nested_devices(MAX_NESTING + 2);
        let root = self::root(&memory);
        assert_eq!(find_from_root(&memory, &root, &path("DEV")), Err(AmlError::TooDeep));
        let node = NodeHandle::open(&memory, 0, memory.len()).unwrap();
        assert_eq!(find_in_subtree(&memory, &node, &path("DEV")), Err(AmlError::TooDeep));
    }
}
