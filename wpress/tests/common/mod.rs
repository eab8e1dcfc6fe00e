#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use wpress_core::EntryHeader;

/// One raw (header, payload) record.
pub fn entry(name: &str, payload: &[u8], mtime: u64) -> Vec<u8> {
    let mut data = EntryHeader::new(name, payload.len() as u64, mtime)
        .unwrap()
        .bytes()
        .to_vec();
    data.extend_from_slice(payload);
    data
}

/// The all-zero end record.
pub fn terminator() -> Vec<u8> {
    EntryHeader::terminator().bytes().to_vec()
}

/// Concatenate raw records into an archive file under `dir`.
pub fn write_archive(dir: &Path, parts: &[Vec<u8>]) -> PathBuf {
    let path = dir.join("site.wpress");
    fs::write(&path, parts.concat()).unwrap();
    path
}
