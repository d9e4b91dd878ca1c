use std::sync::Arc;

use kxref::domain::{InstanceId, KernelVersion, SinkError};
use kxref::pipeline::Pipeline;
use kxref::sink::{Sink, SinkHandle, SqliteSink};
use kxref::symbolization::{LineReader, ResolutionRecord, Resolver};
use kxref_common::{IndexTable, SymbolFileRow, XrefRow};
use rusqlite::Connection;

struct OneLine;

impl LineReader for OneLine {
    fn frames(&mut self, address: u64) -> Vec<ResolutionRecord> {
        vec![ResolutionRecord {
            file: "./kernel/sched/core.c".to_string(),
            line: u32::try_from(address & 0xfff).unwrap(),
            function: Some("schedule".to_string()),
        }]
    }
}

#[test]
fn test_database_file_is_created_with_schema() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("kernel_bin.sqlite");

    let sink = SqliteSink::open(&db).expect("Failed to open sink");
    assert!(db.exists());
    for table in ["instances", "configs", "files", "symbols", "tags", "symbols_files", "xrefs"] {
        assert_eq!(sink.count_rows(table).unwrap(), 0, "table {table}");
    }

    // Reopening an existing database keeps its rows
    let version: KernelVersion = "6.1.12-rc3".parse().unwrap();
    sink.execute(&version.instance_row("upstream").to_sql()).unwrap();
    drop(sink);
    let sink = SqliteSink::open(&db).unwrap();
    assert_eq!(sink.count_rows("instances").unwrap(), 1);
}

#[test]
fn test_instance_ids_follow_inserts() {
    let dir = tempfile::tempdir().unwrap();
    let sink = SqliteSink::open(dir.path().join("k.sqlite")).unwrap();

    let version: KernelVersion = "5.15".parse().unwrap();
    let first = sink.execute_returning_id(&version.instance_row("upstream").to_sql()).unwrap();
    sink.execute(&IndexTable::Files.to_sql(first)).unwrap();
    let second = sink.execute_returning_id(&version.instance_row("it's patched").to_sql()).unwrap();

    assert_eq!(second, first + 1);
    assert_eq!(sink.count_rows("files").unwrap(), 1);
}

#[test]
fn test_pipeline_rows_land_in_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("k.sqlite");
    let sink: SinkHandle = Arc::new(SqliteSink::open(&db).unwrap());
    let instance = InstanceId(
        sink.execute_returning_id(&KernelVersion::default().instance_row("test").to_sql()).unwrap(),
    );

    let pipeline = Pipeline::start(Resolver::with_reader(OneLine)).unwrap();
    let dispatcher = pipeline.dispatcher();
    let symbol = SymbolFileRow {
        instance_id: instance.0,
        symbol_name: "schedule".to_string(),
        symbol_offset: 0xffff_ffff_81a0_0000,
        symbol_type: 'T',
    };
    dispatcher.enqueue(&sink, 0, "None", symbol.to_sql()).unwrap();

    let xref = XrefRow {
        instance_id: instance.0,
        caller_offset: 0xffff_ffff_81a0_0000,
        calling_offset: 0xffff_ffff_81a0_002a,
        callee_offset: 0xffff_ffff_81b0_0000,
    };
    dispatcher
        .enqueue(&sink, xref.calling_offset, "sym.schedule", xref.to_template().as_str())
        .unwrap();
    pipeline.finish().unwrap();

    let conn = Connection::open(&db).unwrap();
    let (name, offset, kind): (String, String, String) = conn
        .query_row("SELECT symbol_name, symbol_offset, symbol_type FROM symbols_files", [], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?))
        })
        .unwrap();
    assert_eq!(name, "schedule");
    assert_eq!(offset, "0xffffffff81a00000");
    assert_eq!(kind, "T");

    let (calling, source_line): (String, String) = conn
        .query_row("SELECT calling_offset, source_line FROM xrefs WHERE id = ?1", [instance.0], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(calling, "0xffffffff81a0002a");
    assert_eq!(source_line, "kernel/sched/core.c:42");
}

#[test]
fn test_bad_statement_reports_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let sink = SqliteSink::open(dir.path().join("k.sqlite")).unwrap();

    let statement = "INSERT INTO xrefs (id) VALUES ('unterminated);";
    match sink.execute(statement) {
        Err(SinkError::Execution { statement: reported, .. }) => assert_eq!(reported, statement),
        other => panic!("expected execution error, got {other:?}"),
    }
}

#[test]
fn test_unwritable_location() {
    let dir = tempfile::tempdir().unwrap();
    let result = SqliteSink::open(dir.path().join("missing").join("k.sqlite"));
    assert!(matches!(result, Err(SinkError::Open { .. })));
}
