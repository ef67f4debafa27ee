//! Handle workflows against tables installed in a [`TableArena`].

use acpi_sdt::sdt::validate_checksum;
use acpi_sdt::{
    AcpiDataType, AcpiHandle, AcpiSdt, SdtConfig, SdtError, SdtHeader, TableArena, TableKey, TableVersion,
};

fn table(signature: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let len = u32::try_from(SdtHeader::SIZE + body.len()).unwrap();
    let mut bytes = vec![0u8; SdtHeader::SIZE];
    bytes[0..4].copy_from_slice(signature);
    bytes[4..8].copy_from_slice(&len.to_le_bytes());
    bytes[8] = 2;
    bytes[10..16].copy_from_slice(b"HADRON");
    bytes[16..24].copy_from_slice(b"TESTTABL");
    bytes.extend_from_slice(body);
    bytes
}

/// ```text
/// Name (VAL_, 0x12345678)
/// Scope (\_SB_) {
///     Device (PCI0) {
///         Name (_ADR, Zero)
///         Processor (CPU0, 1, 0x00000410, 6) {}
///         Method (_STA) { Return (0x0F) }
///     }
/// }
/// ```
fn dsdt_body() -> Vec<u8> {
    let mut body = vec![0x08, b'V', b'A', b'L', b'_', 0x0C, 0x78, 0x56, 0x34, 0x12];

    let adr = [0x08, b'_', b'A', b'D', b'R', 0x00];
    let cpu = [0x5B, 0x83, 0x0B, b'C', b'P', b'U', b'0', 0x01, 0x10, 0x04, 0x00, 0x00, 0x06];
    let sta = [0x14, 0x09, b'_', b'S', b'T', b'A', 0x00, 0xA4, 0x0A, 0x0F];

    let mut pci = vec![0x5B, 0x82, 0x00, b'P', b'C', b'I', b'0'];
    pci.extend_from_slice(&adr);
    pci.extend_from_slice(&cpu);
    pci.extend_from_slice(&sta);
    pci[2] = u8::try_from(pci.len() - 2).unwrap();

    let mut scope = vec![0x10, 0x00, b'\\', b'_', b'S', b'B', b'_'];
    scope.extend_from_slice(&pci);
    scope[1] = u8::try_from(scope.len() - 1).unwrap();

    body.extend_from_slice(&scope);
    body
}

fn setup() -> (AcpiSdt<TableArena>, TableKey) {
    let mut arena = TableArena::new();
    let key = arena.install(&table(b"DSDT", &dsdt_body()), TableVersion::V2_0).unwrap();
    (AcpiSdt::new(arena, SdtConfig::default()), key)
}

fn walk(sdt: &AcpiSdt<TableArena>, parent: &AcpiHandle, visited: &mut Vec<usize>) {
    let mut previous: Option<AcpiHandle> = None;
    while let Some(child) = sdt.get_child(parent, previous.as_ref()).unwrap() {
        assert!(child.start() >= parent.start());
        assert!(child.end() <= parent.end(), "child at {:#x} overruns parent", child.start());
        visited.push(child.start());
        walk(sdt, &child, visited);
        previous = Some(child);
    }
}

#[test]
fn edit_integer_and_repair_checksum() {
    let (mut sdt, key) = setup();
    let length = sdt.get_acpi_table(0).unwrap().header.length() as usize;
    assert_eq!(sdt.table_bytes(key).unwrap().len(), length);

    let root = sdt.open_sdt(key).unwrap();
    let name = sdt.get_child(&root, None).unwrap().unwrap();
    let mut value = sdt.get_child(&name, None).unwrap().unwrap();

    let option = sdt.get_option(&value, 1).unwrap();
    assert_eq!(option.data_type, AcpiDataType::Uint);
    assert_eq!(option.data, &[0x78, 0x56, 0x34, 0x12]);

    sdt.set_option(&mut value, 1, &0xCAFE_F00Du32.to_le_bytes()).unwrap();
    sdt.close(value).unwrap();
    sdt.close(name).unwrap();
    sdt.close(root).unwrap();

    let bytes = sdt.table_bytes(key).unwrap();
    assert_eq!(bytes.len(), length);
    assert!(validate_checksum(bytes));

    let root = sdt.open_sdt(key).unwrap();
    let name = sdt.find_path(&root, "\\VAL").unwrap().unwrap();
    let value = sdt.get_child(&name, None).unwrap().unwrap();
    assert_eq!(sdt.get_option(&value, 1).unwrap().data, &0xCAFE_F00Du32.to_le_bytes());
}

#[test]
fn processor_operands_in_encoding_order() {
    let (mut sdt, key) = setup();
    let root = sdt.open_sdt(key).unwrap();
    let mut cpu = sdt.find_path(&root, "\\_SB.PCI0.CPU0").unwrap().unwrap();

    let opcode = sdt.get_option(&cpu, 0).unwrap();
    assert_eq!(opcode.data_type, AcpiDataType::Opcode);
    assert_eq!(opcode.data, &[0x5B, 0x83]);
    assert_eq!(sdt.get_option(&cpu, 1).unwrap().data, b"CPU0");
    assert_eq!(sdt.get_option(&cpu, 3).unwrap().data, &[0x10, 0x04, 0x00, 0x00]);
    assert_eq!(sdt.get_option(&cpu, 5).unwrap().data_type, AcpiDataType::None);

    // PBlk address, written short: only the low byte changes
    sdt.set_option(&mut cpu, 3, &[0x20]).unwrap();
    assert_eq!(sdt.get_option(&cpu, 3).unwrap().data, &[0x20, 0x04, 0x00, 0x00]);
    assert_eq!(sdt.set_option(&mut cpu, 4, &[0, 0]), Err(SdtError::BadBufferSize));

    sdt.close(cpu).unwrap();
    assert!(validate_checksum(sdt.table_bytes(key).unwrap()));
}

#[test]
fn child_walk_is_bounded_and_terminates() {
    let (sdt, key) = setup();
    let root = sdt.open_sdt(key).unwrap();
    let mut visited = Vec::new();
    walk(&sdt, &root, &mut visited);

    let base = SdtHeader::SIZE;
    // Name, DWordConst, Scope, Device, Name, Zero, Processor, Method, Return, ByteConst
    assert_eq!(visited.len(), 10);
    assert_eq!(visited[0], base);
    assert_eq!(visited[2], base + 10);
}

#[test]
fn bare_names_cannot_be_opened() {
    let (sdt, _) = setup();
    let name_object = SdtHeader::SIZE;
    assert!(sdt.open(name_object).is_ok());
    assert_eq!(sdt.open(name_object + 1), Err(SdtError::InvalidParameter));
}

#[test]
fn root_path_from_any_handle() {
    let (sdt, key) = setup();
    let root = sdt.open_sdt(key).unwrap();
    let sta = sdt.find_path(&root, "\\_SB.PCI0._STA").unwrap().unwrap();
    let pci = sdt.find_path(&root, "_SB.PCI0").unwrap().unwrap();

    for handle in [&root, &sta, &pci] {
        assert_eq!(sdt.find_path(handle, "\\").unwrap(), Some(root.clone()));
    }
    assert_eq!(sdt.find_path(&pci, "_STA").unwrap(), Some(sta));
    assert_eq!(sdt.find_path(&pci, "PCI0"), Ok(None));
    assert_eq!(sdt.find_path(&root, "\\_SB.PCI0.LPC0"), Ok(None));
    assert_eq!(sdt.find_path(&root, "\\_SB.TOOLONG"), Err(SdtError::InvalidParameter));
}

#[test]
fn unmodified_duplicate_leaves_table_alone() {
    let (mut sdt, key) = setup();
    let before = sdt.table_bytes(key).unwrap().to_vec();

    let root = sdt.open_sdt(key).unwrap();
    let pci = sdt.find_path(&root, "\\_SB.PCI0").unwrap().unwrap();
    let copy = sdt.duplicate(&pci);
    sdt.close(copy).unwrap();
    sdt.close(pci).unwrap();
    sdt.close(root).unwrap();

    assert_eq!(sdt.table_bytes(key).unwrap(), before.as_slice());
}

#[test]
fn edits_repair_only_the_owning_table() {
    let (mut sdt, dsdt) = setup();
    // Name (FLAG, One)
    let ssdt = sdt
        .registry_mut()
        .install(&table(b"SSDT", &[0x08, b'F', b'L', b'A', b'G', 0x0A, 0x01]), TableVersion::V2_0)
        .unwrap();

    let info = sdt.get_acpi_table(1).unwrap();
    assert_eq!(info.key, ssdt);
    assert_eq!(&info.header.signature(), b"SSDT");

    let root = sdt.open_sdt(ssdt).unwrap();
    assert!(sdt.find_path(&root, "\\VAL").unwrap().is_none());
    let flag = sdt.find_path(&root, "FLAG").unwrap().unwrap();
    let mut value = sdt.open(flag.start() + 5).unwrap();

    let dsdt_before = sdt.table_bytes(dsdt).unwrap().to_vec();
    sdt.set_option(&mut value, 1, &[0x00]).unwrap();
    assert!(!validate_checksum(sdt.table_bytes(ssdt).unwrap()));

    let copy = sdt.duplicate(&value);
    sdt.close(copy).unwrap();
    sdt.close(value).unwrap();
    assert!(validate_checksum(sdt.table_bytes(ssdt).unwrap()));
    assert_eq!(sdt.table_bytes(dsdt).unwrap(), dsdt_before.as_slice());
}

#[test]
fn rewrite_opcode_in_place() {
    let (mut sdt, key) = setup();
    let root = sdt.open_sdt(key).unwrap();
    let adr = sdt.find_path(&root, "\\_SB.PCI0._ADR").unwrap().unwrap();
    let mut zero = sdt.get_child(&adr, None).unwrap().unwrap();
    assert_eq!(sdt.get_option(&zero, 0).unwrap().data, &[0x00]);

    // Zero becomes One
    sdt.set_option(&mut zero, 0, &[0x01]).unwrap();
    assert_eq!(sdt.get_option(&zero, 0).unwrap().data, &[0x01]);
    assert_eq!(sdt.set_option(&mut zero, 0, &[0x01, 0x01]), Err(SdtError::BadBufferSize));

    let position = zero.start();
    sdt.close(zero).unwrap();
    assert!(validate_checksum(sdt.table_bytes(key).unwrap()));

    let one = sdt.open(position).unwrap();
    assert_eq!(one.size(), 1);
    assert_eq!(sdt.get_option(&one, 0).unwrap().data, &[0x01]);
}

#[test]
fn closing_edit_without_its_table_is_not_found() {
    let (mut sdt, key) = setup();
    let root = sdt.open_sdt(key).unwrap();
    let name = sdt.get_child(&root, None).unwrap().unwrap();
    let mut value = sdt.get_child(&name, None).unwrap().unwrap();
    sdt.set_option(&mut value, 1, &[0x00]).unwrap();

    // a registry holding only an unrelated, shorter table
    let mut arena = TableArena::new();
    let noop = arena.install(&table(b"SSDT", &[0xA3]), TableVersion::V2_0).unwrap();
    let mut other = AcpiSdt::new(arena, SdtConfig::default());
    assert!(value.start() >= other.table_bytes(noop).unwrap().len());
    assert_eq!(other.close(value.clone()), Err(SdtError::NotFound));

    sdt.close(value).unwrap();
    assert!(validate_checksum(sdt.table_bytes(key).unwrap()));
}
