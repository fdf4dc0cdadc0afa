//! Integration tests driving the full ingest-then-write pipeline
//! against a real temporary index directory.

use std::fs;
use std::io::Cursor;

use zudiprops::{ingest_udiprops, Endianness, IndexError, IndexWriter, Session};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const SAMPLE_DRIVER: &str = r#"
shortname example
release 1 1.0.0
requires udi 0x101
module example.so
region 0 type normal priority hi
device 1 2 bus_type string pci present boolean t
message 1 hello there
message_file messages.txt
"#;

#[test]
fn full_pipeline_writes_every_sibling_file() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    IndexWriter::create(dir.path(), Endianness::Little, 1).unwrap();

    let mut session = Session::new();
    session.initialize(1, "/drivers/example").unwrap();
    ingest_udiprops(&mut session, Cursor::new(SAMPLE_DRIVER.as_bytes())).unwrap();
    session.write(dir.path(), Endianness::Little).unwrap();

    for name in [
        "drivers.zudi-index",
        "driver-data.zudi-index",
        "devices.zudi-index",
        "ranks.zudi-index",
        "provisions.zudi-index",
        "regions.zudi-index",
        "messages.zudi-index",
        "disaster-messages.zudi-index",
        "message-files.zudi-index",
        "readable-files.zudi-index",
        "strings.zudi-index",
    ] {
        let path = dir.path().join(name);
        assert!(path.exists(), "missing {name}");
    }

    let regions = fs::read(dir.path().join("regions.zudi-index")).unwrap();
    assert!(!regions.is_empty(), "region statement should have been written");

    let devices = fs::read(dir.path().join("devices.zudi-index")).unwrap();
    assert!(!devices.is_empty(), "device statement should have been written");
}

#[test]
fn missing_requires_udi_rejects_write() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    IndexWriter::create(dir.path(), Endianness::Little, 1).unwrap();

    let mut session = Session::new();
    session.initialize(1, "/drivers/example").unwrap();
    ingest_udiprops(&mut session, Cursor::new(b"shortname example\n".as_slice())).unwrap();

    let err = session.write(dir.path(), Endianness::Little).unwrap_err();
    assert!(matches!(err, IndexError::NoRequiresUdi { driver_id: 1 }));
}

#[test]
fn record_count_bumps_once_per_driver() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    IndexWriter::create(dir.path(), Endianness::Little, 1).unwrap();

    for id in [1u32, 2u32] {
        let mut session = Session::new();
        session.initialize(id, "/drivers/example").unwrap();
        ingest_udiprops(&mut session, Cursor::new(SAMPLE_DRIVER.as_bytes())).unwrap();
        session.write(dir.path(), Endianness::Little).unwrap();
    }

    let header = fs::read(dir.path().join("drivers.zudi-index")).unwrap();
    // nRecords is a little-endian u32 at byte offset 8 (§4.4).
    let n_records = u32::from_le_bytes(header[8..12].try_into().unwrap());
    assert_eq!(n_records, 2);
}

#[test]
fn big_endian_index_tags_its_header() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    IndexWriter::create(dir.path(), Endianness::Big, 1).unwrap();

    let header = fs::read(dir.path().join("drivers.zudi-index")).unwrap();
    assert_eq!(&header[0..4], b"be\0\0");
}

#[test]
fn ranks_and_provisions_are_written_via_session_api_only() {
    init_logging();
    use zudiprops::model::{ProvisionRecord, RankAttribute, RankRecord};

    let dir = tempfile::tempdir().unwrap();
    IndexWriter::create(dir.path(), Endianness::Little, 1).unwrap();

    let mut session = Session::new();
    session.initialize(1, "/drivers/example").unwrap();
    ingest_udiprops(&mut session, Cursor::new(SAMPLE_DRIVER.as_bytes())).unwrap();

    session
        .push_rank(RankRecord {
            driver_id: 1,
            rank: 3,
            attributes: vec![RankAttribute {
                name: "bus_type".to_string(),
            }],
        })
        .unwrap();
    session
        .push_provision(ProvisionRecord {
            driver_id: 1,
            version: 0x100,
            name: "example_provision".to_string(),
        })
        .unwrap();

    session.write(dir.path(), Endianness::Little).unwrap();

    let ranks = fs::read(dir.path().join("ranks.zudi-index")).unwrap();
    assert!(!ranks.is_empty());
    let provisions = fs::read(dir.path().join("provisions.zudi-index")).unwrap();
    assert!(!provisions.is_empty());
}

#[test]
fn unknown_statement_aborts_ingestion_of_the_current_driver() {
    init_logging();
    use zudiprops::ParseError;

    let text = "requires udi 0x101\nnonsense_keyword foo\nshortname example\n";
    let mut session = Session::new();
    session.initialize(1, "/drivers/example").unwrap();
    let err = ingest_udiprops(&mut session, Cursor::new(text.as_bytes())).unwrap_err();
    assert!(matches!(
        err,
        IndexError::Parse(ParseError::Rejected { line: 2, .. })
    ));

    // What was accumulated before the bad line survives; the line
    // that caused the abort (and everything after it) never ran.
    let header = session.current().unwrap();
    assert!(header.has_requires_udi);
    assert_eq!(header.short_name, "");
}

#[test]
fn backslash_continuation_folds_across_physical_lines() {
    init_logging();
    let text = "shortname exa\\\nmple\nrequires udi 0x101\n";
    let mut session = Session::new();
    session.initialize(1, "/drivers/example").unwrap();
    ingest_udiprops(&mut session, Cursor::new(text.as_bytes())).unwrap();

    assert_eq!(session.current().unwrap().short_name, "example");
}
