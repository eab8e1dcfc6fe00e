mod common;

use std::fs;
use std::time::{Duration, UNIX_EPOCH};

use wpress::{extract, Error, Termination};
use wpress_core::EntryHeader;

use common::{entry, terminator, write_archive};

#[test]
fn extracts_single_entry() {
    let tmp = tempfile::tempdir().unwrap();
    let archive = write_archive(
        tmp.path(),
        &[
            entry("database.sql", b"hello world", 1700000000),
            terminator(),
        ],
    );
    let out = tmp.path().join("out");

    let summary = extract(&archive, &out).unwrap();
    assert_eq!(summary.file_count, 1);
    assert_eq!(summary.total_bytes, 11);
    assert_eq!(summary.output_dir, out);
    assert_eq!(summary.termination, Termination::Terminator);

    let target = out.join("database.sql");
    assert_eq!(fs::read(&target).unwrap(), b"hello world");
    assert_eq!(fs::metadata(&target).unwrap().len(), 11);
    assert_eq!(
        fs::metadata(&target).unwrap().modified().unwrap(),
        UNIX_EPOCH + Duration::from_secs(1700000000)
    );
}

#[test]
fn creates_intermediate_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let archive = write_archive(
        tmp.path(),
        &[entry("a/b.txt", b"abc", 1600000000), terminator()],
    );
    let out = tmp.path().join("out");

    let summary = extract(&archive, &out).unwrap();
    assert_eq!(summary.file_count, 1);
    assert_eq!(summary.total_bytes, 3);
    assert!(out.join("a").is_dir());
    assert_eq!(fs::read(out.join("a/b.txt")).unwrap(), b"abc");
}

#[test]
fn stops_at_terminator() {
    let tmp = tempfile::tempdir().unwrap();
    // A well-formed record placed after the terminator must never be read
    let archive = write_archive(
        tmp.path(),
        &[
            entry("kept.txt", b"kept", 1600000000),
            terminator(),
            entry("ignored.txt", b"ignored", 1600000000),
        ],
    );
    let out = tmp.path().join("out");

    let summary = extract(&archive, &out).unwrap();
    assert_eq!(summary.file_count, 1);
    assert_eq!(summary.termination, Termination::Terminator);
    assert!(out.join("kept.txt").exists());
    assert!(!out.join("ignored.txt").exists());
}

#[test]
fn terminator_only_archive_yields_no_files() {
    let tmp = tempfile::tempdir().unwrap();
    let archive = write_archive(tmp.path(), &[terminator()]);
    let out = tmp.path().join("out");

    let summary = extract(&archive, &out).unwrap();
    assert_eq!(summary.file_count, 0);
    assert_eq!(summary.total_bytes, 0);
    assert_eq!(summary.termination, Termination::Terminator);
    assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
}

#[test]
fn empty_archive_is_clean_end_of_stream() {
    let tmp = tempfile::tempdir().unwrap();
    let archive = write_archive(tmp.path(), &[]);
    let out = tmp.path().join("out");

    let summary = extract(&archive, &out).unwrap();
    assert_eq!(summary.file_count, 0);
    assert_eq!(summary.termination, Termination::EndOfStream);
    assert!(out.is_dir());
}

#[test]
fn truncated_final_header_keeps_prior_entries() {
    let tmp = tempfile::tempdir().unwrap();
    let partial = entry("never-finished.txt", b"", 0)[..100].to_vec();
    let archive = write_archive(
        tmp.path(),
        &[entry("kept.txt", b"kept", 1600000000), partial],
    );
    let out = tmp.path().join("out");

    let summary = extract(&archive, &out).unwrap();
    assert_eq!(summary.file_count, 1);
    assert_eq!(summary.termination, Termination::TruncatedHeader { read: 100 });
    assert_eq!(fs::read(out.join("kept.txt")).unwrap(), b"kept");
}

#[test]
fn truncated_payload_keeps_partial_file() {
    let tmp = tempfile::tempdir().unwrap();
    let mut record = EntryHeader::new("cut.bin", 32, 1600000000)
        .unwrap()
        .bytes()
        .to_vec();
    record.extend_from_slice(b"abcde");
    let archive = write_archive(tmp.path(), &[record]);
    let out = tmp.path().join("out");

    let summary = extract(&archive, &out).unwrap();
    assert_eq!(summary.file_count, 0);
    assert_eq!(summary.total_bytes, 0);
    assert_eq!(
        summary.termination,
        Termination::TruncatedPayload {
            entry: "cut.bin".into(),
            expected: 32,
            copied: 5,
        }
    );
    assert_eq!(fs::read(out.join("cut.bin")).unwrap(), b"abcde");
}

#[test]
fn malformed_size_aborts() {
    let tmp = tempfile::tempdir().unwrap();
    let mut header = EntryHeader::new("bad.bin", 0, 0).unwrap();
    header.size = *b"12ab34\0\0\0\0\0\0\0\0";
    let archive = write_archive(
        tmp.path(),
        &[header.bytes().to_vec(), terminator()],
    );
    let out = tmp.path().join("out");

    assert!(matches!(
        extract(&archive, &out),
        Err(Error::MalformedHeader { offset: 0, .. })
    ));
    assert!(!out.join("bad.bin").exists());
}

#[test]
fn whitespace_padded_fields_are_accepted() {
    let tmp = tempfile::tempdir().unwrap();
    let mut header = EntryHeader::new("pad.txt", 0, 0).unwrap();
    header.size = *b"  3           ";
    header.mtime = *b"  1600000000  ";
    let mut record = header.bytes().to_vec();
    record.extend_from_slice(b"abc");
    let archive = write_archive(tmp.path(), &[record, terminator()]);
    let out = tmp.path().join("out");

    let summary = extract(&archive, &out).unwrap();
    assert_eq!(summary.file_count, 1);
    assert_eq!(fs::read(out.join("pad.txt")).unwrap(), b"abc");
    assert_eq!(
        fs::metadata(out.join("pad.txt")).unwrap().modified().unwrap(),
        UNIX_EPOCH + Duration::from_secs(1600000000)
    );
}

#[test]
fn rejects_parent_path_components() {
    let tmp = tempfile::tempdir().unwrap();
    let archive = write_archive(
        tmp.path(),
        &[entry("../escape.txt", b"evil", 0), terminator()],
    );
    let out = tmp.path().join("out");

    assert!(matches!(
        extract(&archive, &out),
        Err(Error::InvalidPath { .. })
    ));
    assert!(!tmp.path().join("escape.txt").exists());
}

#[test]
fn missing_archive_fails_before_touching_output() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");

    let result = extract(tmp.path().join("missing.wpress"), &out);
    assert!(matches!(result, Err(Error::ArchiveOpen { .. })));
    assert!(!out.exists());
}

#[test]
fn repeated_extraction_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let archive = write_archive(
        tmp.path(),
        &[
            entry("a/b.txt", b"abc", 1600000000),
            entry("c.txt", b"c", 1600000001),
            terminator(),
        ],
    );
    let out = tmp.path().join("out");

    let first = extract(&archive, &out).unwrap();
    let second = extract(&archive, &out).unwrap();

    assert_eq!(first.file_count, second.file_count);
    assert_eq!(first.total_bytes, second.total_bytes);
    assert_eq!(first.termination, second.termination);
    assert_eq!(fs::read(out.join("a/b.txt")).unwrap(), b"abc");
    assert_eq!(fs::read(out.join("c.txt")).unwrap(), b"c");
    assert_eq!(fs::read_dir(&out).unwrap().count(), 2);
}

#[test]
fn write_failure_aborts_run() {
    let tmp = tempfile::tempdir().unwrap();
    let archive = write_archive(
        tmp.path(),
        &[entry("a/b.txt", b"abc", 1600000000), terminator()],
    );
    let out = tmp.path().join("out");

    // The entry needs `a` to be a directory; an existing regular file with
    // that name must abort the whole run.
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("a"), b"in the way").unwrap();

    assert!(matches!(extract(&archive, &out), Err(Error::Io { .. })));
    assert_eq!(fs::read(out.join("a")).unwrap(), b"in the way");
}
