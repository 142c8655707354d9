//! Tests for FPDT parsing

use acpi_perf_topology::fpdt::{self, Fpdt, FpdtRecordType, PerformanceRecord};
use acpi_perf_topology::{parse_table, Error, ParsedTable, TableKind, WalkState};

fn fpdt_header(body_len: usize) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"FPDT");
    data.extend_from_slice(&((36 + body_len) as u32).to_le_bytes());
    data.extend_from_slice(&[1, 0]);
    data.extend_from_slice(b"OEM   ");
    data.extend_from_slice(b"OEMTABLE");
    data.extend_from_slice(&[0; 12]);
    data
}

/// Test that the fixture decodes to its two pointer records
#[test]
fn test_fixture() {
    let data = std::fs::read("tests/fixtures/fpdt.dat").unwrap();
    let fpdt = Fpdt::parse(&data).unwrap();

    assert_eq!(fpdt.header.length as usize, data.len());
    assert_eq!(fpdt.header.oem_id_str(), "ARMLTD");
    assert_eq!(fpdt.header.oem_table_id_str(), "ARMVIRT");
    assert_eq!(fpdt.header.creator_id_tag(), "ARM ");

    let records: Vec<_> = fpdt
        .records
        .iter()
        .map(|r| (r.offset, r.record.header.record_type, r.record.record))
        .collect();
    assert_eq!(
        records,
        vec![
            (
                36,
                FpdtRecordType::FBPT_POINTER,
                PerformanceRecord::Fbpt {
                    pointer: 0x5f7e_c000
                }
            ),
            (
                52,
                FpdtRecordType::S3PT_POINTER,
                PerformanceRecord::S3pt {
                    pointer: 0x5f7e_b000
                }
            ),
        ]
    );
}

/// Test the textual report for each record
#[test]
fn test_report_lines() {
    let data = std::fs::read("tests/fixtures/fpdt.dat").unwrap();
    let lines: Vec<_> = fpdt::records(&data)
        .unwrap()
        .map(|r| r.unwrap().record.record.to_string())
        .collect();
    assert_eq!(
        lines,
        vec!["FBPT\nPointer: 0x5f7ec000", "S3PT\nPointer: 0x5f7eb000"]
    );
}

/// A single S3PT record which ends exactly at the end of the buffer
#[test]
fn test_single_s3pt_record() {
    let mut data = fpdt_header(16);
    data.extend_from_slice(&[1, 0, 1, 16, 0, 0, 0, 0]);
    data.extend_from_slice(&0xdead_beefu64.to_le_bytes());

    let mut walker = fpdt::records(&data).unwrap();
    let record = walker.next_record().unwrap().unwrap();
    assert_eq!(record.offset, 36);
    assert_eq!(record.length, 16);
    assert_eq!(record.record.record.pointer(), Some(0xdead_beef));
    assert_eq!(walker.next_record(), Ok(None));
    assert_eq!(walker.state(), WalkState::Done);
    assert_eq!(walker.offset(), data.len());
}

/// Offsets increase and the walk ends exactly at the buffer end
#[test]
fn test_offsets_increase() {
    let mut body = Vec::new();
    for record_type in [0u16, 3, 1, 3, 2] {
        let len = if record_type == 3 { 32 } else { 16 };
        let mut record = vec![0; len];
        record[..2].copy_from_slice(&record_type.to_le_bytes());
        body.extend_from_slice(&record);
    }
    let mut data = fpdt_header(body.len());
    data.extend_from_slice(&body);

    let mut walker = fpdt::records(&data).unwrap();
    let mut offsets = Vec::new();
    while let Some(record) = walker.next_record().unwrap() {
        offsets.push(record.offset);
    }
    assert_eq!(offsets, vec![36, 52, 84, 100, 132]);
    assert_eq!(walker.offset(), data.len());
    assert_eq!(walker.state(), WalkState::Done);
}

/// A pointer record cut short by the end of the buffer
#[test]
fn test_record_past_the_end() {
    let mut data = fpdt_header(8);
    data.extend_from_slice(&[0, 0, 1, 16, 0, 0, 0, 0]);
    assert_eq!(
        Fpdt::parse(&data),
        Err(Error::Malformed {
            offset: 36,
            length: 16
        })
    );
}

#[test]
fn test_too_short_and_bad_signature() {
    let data = std::fs::read("tests/fixtures/fpdt.dat").unwrap();
    assert_eq!(
        Fpdt::parse(&data[..35]),
        Err(Error::TooShort { len: 35 })
    );
    assert!(matches!(
        parse_table(&data, TableKind::Pptt),
        Err(Error::BadSignature { .. })
    ));
}

#[test]
fn test_parse_table_detects_fpdt() {
    let data = std::fs::read("tests/fixtures/fpdt.dat").unwrap();
    let kind = TableKind::detect(&data).unwrap();
    assert_eq!(kind, TableKind::Fpdt);
    match parse_table(&data, kind).unwrap() {
        ParsedTable::Fpdt(fpdt) => assert_eq!(fpdt.records.len(), 2),
        ParsedTable::Pptt(_) => panic!("expected an FPDT"),
    }
}
