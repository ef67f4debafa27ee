//! The ACPI SDT interface: table enumeration plus handle-based AML access.

use log::{debug, warn};

use crate::SdtError;
use crate::aml::child::next_child;
use crate::aml::namespace::{find_from_root, find_in_subtree};
use crate::aml::option::parse_option;
use crate::aml::{AcpiDataType, AmlError, AmlOption, NamePath};
use crate::handle::{AcpiHandle, NodeHandle, RootHandle};
use crate::registry::{InstalledTable, TableKey, TableNotifyFn, TableRegistry, TableVersion};
use crate::sdt::{self, SdtHeader};

/// Platform configuration for an [`AcpiSdt`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdtConfig {
    /// ACPI versions the platform exposes tables for.
    pub exposed_versions: TableVersion,
}

impl Default for SdtConfig {
    fn default() -> Self {
        Self {
            exposed_versions: TableVersion::V1_0B
                | TableVersion::V2_0
                | TableVersion::V3_0
                | TableVersion::V4_0
                | TableVersion::V5_0,
        }
    }
}

/// Description of one installed table, as returned by
/// [`AcpiSdt::get_acpi_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableInfo {
    /// The table's header as currently stored.
    pub header: SdtHeader,
    /// ACPI versions the table belongs to.
    pub version: TableVersion,
    /// Key to pass to [`AcpiSdt::open_sdt`].
    pub key: TableKey,
}

/// Handle-based access to the AML tables of a [`TableRegistry`].
///
/// Every handle returned by this type must be passed back to
/// [`close`](Self::close); that is the only point where the checksum of a
/// table written through the handle is repaired.
pub struct AcpiSdt<R: TableRegistry> {
    registry: R,
    config: SdtConfig,
}

impl<R: TableRegistry> AcpiSdt<R> {
    /// Wrap `registry`.
    #[must_use]
    pub fn new(registry: R, config: SdtConfig) -> Self {
        Self { registry, config }
    }

    /// The ACPI versions this platform exposes.
    #[must_use]
    pub fn acpi_version(&self) -> TableVersion {
        self.config.exposed_versions
    }

    /// Returns the underlying registry.
    #[must_use]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Returns the underlying registry mutably, e.g. to install more tables.
    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    /// Consume the context and return the registry.
    #[must_use]
    pub fn into_registry(self) -> R {
        self.registry
    }

    /// Returns the installed table at enumeration `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SdtError::NotFound`] once `index` is past the last table.
    pub fn get_acpi_table(&self, index: usize) -> Result<TableInfo, SdtError> {
        let table = self.registry.table_at(index).ok_or(SdtError::NotFound)?;
        let header = SdtHeader::read_from_bytes(self.table_slice(&table)?).ok_or(SdtError::NotFound)?;
        Ok(TableInfo {
            header,
            version: table.version,
            key: table.key,
        })
    }

    /// Returns the full bytes of the table installed under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SdtError::NotFound`] if no installed table has `key`.
    pub fn table_bytes(&self, key: TableKey) -> Result<&[u8], SdtError> {
        let table = self.registry.find_table_by_key(key)?;
        self.table_slice(&table)
    }

    /// Register or unregister a callback invoked whenever a table is
    /// installed.
    ///
    /// # Errors
    ///
    /// Returns [`SdtError::InvalidParameter`] when unregistering a callback
    /// that was never registered.
    pub fn register_notify(&mut self, register: bool, notification: TableNotifyFn) -> Result<(), SdtError> {
        self.registry.register_notify(register, notification)
    }

    /// Open the AML body of the table installed under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SdtError::NotFound`] if no installed table has `key`.
    pub fn open_sdt(&self, key: TableKey) -> Result<AcpiHandle, SdtError> {
        let table = self.registry.find_table_by_key(key)?;
        self.root_of(&table).map(AcpiHandle::Root)
    }

    /// Open the object whose opcode is at `position` in registry memory.
    ///
    /// # Errors
    ///
    /// Returns [`SdtError::InvalidParameter`] if the position is outside
    /// every table body, holds a bare name string or an unknown opcode, or
    /// the object does not fit in its table.
    pub fn open(&self, position: usize) -> Result<AcpiHandle, SdtError> {
        let table = self
            .registry
            .find_table_by_position(position)
            .map_err(|_| SdtError::InvalidParameter)?;
        if position < table.body_start() {
            return Err(SdtError::InvalidParameter);
        }

        NodeHandle::open(self.registry.memory(), position, table.range().end)
            .map(AcpiHandle::Node)
            .map_err(aml_error)
    }

    /// Release `handle`, repairing its table's checksum if an operand was
    /// written through it.
    ///
    /// # Errors
    ///
    /// Returns [`SdtError::NotFound`] if the handle was modified and no
    /// installed table contains it.
    pub fn close(&mut self, handle: AcpiHandle) -> Result<(), SdtError> {
        if !handle.is_modified() {
            return Ok(());
        }

        let table = self
            .registry
            .find_table_by_position(handle.start())
            .inspect_err(|_| warn!("acpi-sdt: no table owns modified handle at {:#x}", handle.start()))?;
        let bytes = self
            .registry
            .memory_mut()
            .get_mut(table.range())
            .ok_or(SdtError::NotFound)?;
        sdt::update_checksum(bytes);
        debug!("acpi-sdt: checksum of table {} updated", table.key.0);
        Ok(())
    }

    /// Returns the child of `parent` that follows `previous`, or its first
    /// child when `previous` is `None`. Returns `Ok(None)` when there are no
    /// more children.
    ///
    /// # Errors
    ///
    /// Returns [`SdtError::InvalidParameter`] if `previous` is a root handle
    /// or does not lie inside `parent`, or if `parent` cannot be decoded.
    pub fn get_child(
        &self,
        parent: &AcpiHandle,
        previous: Option<&AcpiHandle>,
    ) -> Result<Option<AcpiHandle>, SdtError> {
        let previous = match previous {
            None => None,
            Some(AcpiHandle::Node(node)) => Some(node),
            Some(AcpiHandle::Root(_)) => return Err(SdtError::InvalidParameter),
        };
        let child = next_child(self.registry.memory(), parent, previous).map_err(aml_error)?;
        Ok(child.map(AcpiHandle::Node))
    }

    /// Read operand `index` of the object `handle` refers to.
    ///
    /// Index 0 is the opcode. An index past the last operand yields
    /// [`AcpiDataType::None`] with no data.
    ///
    /// # Errors
    ///
    /// Returns [`SdtError::InvalidParameter`] for a root handle or if the
    /// object's operands cannot be decoded.
    pub fn get_option(&self, handle: &AcpiHandle, index: usize) -> Result<AmlOption<'_>, SdtError> {
        let node = handle.as_node().ok_or(SdtError::InvalidParameter)?;
        parse_option(self.registry.memory(), node, index).map_err(aml_error)
    }

    /// Overwrite operand `index` of the object `handle` refers to, in place.
    ///
    /// Index 0 rewrites the opcode bytes. Operands are never resized. When
    /// `data` is shorter than the operand, only the leading bytes are
    /// replaced and the rest keep their old value. The handle keeps the
    /// layout it was opened with, so reopen the object after changing its
    /// opcode. The checksum is repaired when `handle` is closed.
    ///
    /// # Errors
    ///
    /// Returns [`SdtError::InvalidParameter`] for a root handle or an index
    /// past the last operand, and
    /// [`SdtError::BadBufferSize`] if `data` is longer than the operand.
    pub fn set_option(&mut self, handle: &mut AcpiHandle, index: usize, data: &[u8]) -> Result<(), SdtError> {
        let AcpiHandle::Node(node) = handle else {
            return Err(SdtError::InvalidParameter);
        };
        if index > node.encoding.max_index() {
            return Err(SdtError::InvalidParameter);
        }

        let option = parse_option(self.registry.memory(), node, index).map_err(aml_error)?;
        if option.data_type == AcpiDataType::None {
            return Err(SdtError::InvalidParameter);
        }
        if data.len() > option.data.len() {
            return Err(SdtError::BadBufferSize);
        }

        let position = option.position;
        self.registry
            .memory_mut()
            .get_mut(position..position + data.len())
            .ok_or(SdtError::InvalidParameter)?
            .copy_from_slice(data);
        node.modified = true;
        Ok(())
    }

    /// Resolve the ASL path `path` (such as `\_SB.PCI0.LPC0`) relative to
    /// `handle`.
    ///
    /// From a root handle, each top-level object's subtree is searched in
    /// order. From an object handle, only that object's contents are
    /// searched. The root path `\` yields the table root. A well-formed
    /// path with no match yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`SdtError::InvalidParameter`] if `path` is malformed or the
    /// searched subtree cannot be decoded.
    pub fn find_path(&self, handle: &AcpiHandle, path: &str) -> Result<Option<AcpiHandle>, SdtError> {
        let path = NamePath::from_asl(path).map_err(aml_error)?;
        debug!("acpi-sdt: FindPath - {path}");

        let memory = self.registry.memory();
        let found = match handle {
            AcpiHandle::Root(_) if path.is_root() => return Ok(Some(handle.clone())),
            AcpiHandle::Root(_) => find_from_root(memory, handle, &path),
            AcpiHandle::Node(node) if path.is_root() => {
                let table = self.registry.find_table_by_position(node.start)?;
                return self.root_of(&table).map(|root| Some(AcpiHandle::Root(root)));
            }
            AcpiHandle::Node(node) => find_in_subtree(memory, node, &path),
        };
        Ok(found.map_err(aml_error)?.map(AcpiHandle::Node))
    }

    /// Duplicate `handle`. The copy must be closed separately.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn duplicate(&self, handle: &AcpiHandle) -> AcpiHandle {
        handle.clone()
    }

    fn table_slice(&self, table: &InstalledTable) -> Result<&[u8], SdtError> {
        self.registry.memory().get(table.range()).ok_or(SdtError::NotFound)
    }

    fn root_of(&self, table: &InstalledTable) -> Result<RootHandle, SdtError> {
        if table.len < SdtHeader::SIZE {
            return Err(SdtError::InvalidParameter);
        }
        self.table_slice(table)?;
        Ok(RootHandle {
            table: table.key,
            start: table.body_start(),
            size: table.len - SdtHeader::SIZE,
            modified: false,
        })
    }
}

fn aml_error(err: AmlError) -> SdtError {
    debug!("acpi-sdt: {err}");
    SdtError::InvalidParameter
}
