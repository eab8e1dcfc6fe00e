use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use wpress_core::HEADER_SIZE;

use crate::archive::{ArchiveReader, HeaderRecord};
use crate::builder::ArchiveBuilder;
use crate::ext::EntryExt;
use crate::Error;

/// How an extraction loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The all-zero terminator record was reached.
    Terminator,
    /// The archive ended cleanly on a record boundary.
    EndOfStream,
    /// The archive ended inside a header record. Entries already written
    /// are kept.
    TruncatedHeader { read: usize },
    /// The archive ended inside an entry payload. The partial file is kept
    /// but not counted.
    TruncatedPayload {
        entry: PathBuf,
        expected: u64,
        copied: u64,
    },
}

impl Termination {
    /// True for the two terminations that do not indicate a damaged archive.
    pub fn is_clean(&self) -> bool {
        matches!(self, Termination::Terminator | Termination::EndOfStream)
    }
}

/// Totals for one extraction run. Returned per call so concurrent or
/// repeated extractions never share state.
#[derive(Debug)]
pub struct ExtractionSummary {
    pub file_count: u64,
    pub total_bytes: u64,
    pub output_dir: PathBuf,
    pub termination: Termination,
}

/// Extract every entry of `archive_path` under `output_dir`, creating the
/// directory tree the entry names encode and restoring modification times.
///
/// Progress is printed per entry. Destination write failures abort the run;
/// a truncated archive stops it early with the partial totals in the
/// returned summary.
pub fn extract(
    archive_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
) -> Result<ExtractionSummary, Error> {
    let archive_path = archive_path.as_ref();
    let output_dir = output_dir.as_ref();

    let archive = File::open(archive_path).map_err(|e| Error::ArchiveOpen {
        path: archive_path.to_path_buf(),
        source: e,
    })?;
    let mut reader = ArchiveReader::new(BufReader::new(archive));

    fs::create_dir_all(output_dir)
        .map_err(|e| Error::io("Create output directory", output_dir, e))?;

    let mut file_count = 0;
    let mut total_bytes = 0;

    let termination = loop {
        let header = match reader.next_record().map_err(|e| e.path(archive_path))? {
            HeaderRecord::Entry(header) => header,
            HeaderRecord::Terminator => break Termination::Terminator,
            HeaderRecord::End => break Termination::EndOfStream,
            HeaderRecord::Truncated { read } => break Termination::TruncatedHeader { read },
        };
        let header_offset = reader.offset() - HEADER_SIZE as u64;

        let relative = header.checked_path()?.to_path_buf();
        let size = header.size().map_err(|e| Error::MalformedHeader {
            offset: header_offset,
            source: e,
        })?;
        let mtime = header.mtime().map_err(|e| Error::MalformedHeader {
            offset: header_offset,
            source: e,
        })?;

        println!("Extracting: {} ({} bytes)", relative.display(), size);

        let target_path = output_dir.join(&relative);
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::io("Create entry directory", parent, e))?;
        }

        let mut target = File::create(&target_path)
            .map_err(|e| Error::io("Create entry file", &target_path, e))?;
        let copied = reader
            .copy_payload(size, &mut target)
            .map_err(|e| e.path(&target_path))?;
        if copied < size {
            break Termination::TruncatedPayload {
                entry: relative,
                expected: size,
                copied,
            };
        }

        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(mtime);
        target
            .set_modified(modified)
            .map_err(|e| Error::io("Set entry modification time", &target_path, e))?;

        file_count += 1;
        total_bytes += size;
    };

    Ok(ExtractionSummary {
        file_count,
        total_bytes,
        output_dir: output_dir.to_path_buf(),
        termination,
    })
}

/// Print the path of every entry in `archive_path`, with sizes and
/// timestamps when `verbose` is set. Truncation warns on stderr.
pub fn list(archive_path: impl AsRef<Path>, verbose: bool) -> Result<(), Error> {
    let archive_path = archive_path.as_ref();

    let archive = File::open(archive_path).map_err(|e| Error::ArchiveOpen {
        path: archive_path.to_path_buf(),
        source: e,
    })?;
    let mut reader = ArchiveReader::new(BufReader::new(archive));

    loop {
        let header = match reader.next_record().map_err(|e| e.path(archive_path))? {
            HeaderRecord::Entry(header) => header,
            HeaderRecord::Terminator | HeaderRecord::End => break,
            HeaderRecord::Truncated { read } => {
                eprintln!(
                    "warning: {}: archive ended inside a header record ({} of {} bytes)",
                    archive_path.display(),
                    read,
                    HEADER_SIZE
                );
                break;
            }
        };
        let header_offset = reader.offset() - HEADER_SIZE as u64;

        let relative = header.checked_path()?;
        let size = header.size().map_err(|e| Error::MalformedHeader {
            offset: header_offset,
            source: e,
        })?;

        if verbose {
            let mtime = header.mtime().map_err(|e| Error::MalformedHeader {
                offset: header_offset,
                source: e,
            })?;
            println!("{:>14} {:>14} {}", size, mtime, relative.display());
        } else {
            println!("{}", relative.display());
        }

        let skipped = reader
            .skip_payload(size)
            .map_err(|e| e.path(archive_path))?;
        if skipped < size {
            eprintln!(
                "warning: {}: archive ended inside entry {} ({} of {} bytes)",
                archive_path.display(),
                relative.display(),
                skipped,
                size
            );
            break;
        }
    }
    Ok(())
}

/// Structural check of `archive_path` without writing anything: every
/// header must parse and every payload must be fully present. Returns the
/// entry and payload byte counts.
pub fn verify(archive_path: impl AsRef<Path>) -> Result<(u64, u64), Error> {
    let archive_path = archive_path.as_ref();

    let archive = File::open(archive_path).map_err(|e| Error::ArchiveOpen {
        path: archive_path.to_path_buf(),
        source: e,
    })?;
    let mut reader = ArchiveReader::new(BufReader::new(archive));

    let mut entries = 0;
    let mut bytes = 0;

    loop {
        let header = match reader.next_record().map_err(|e| e.path(archive_path))? {
            HeaderRecord::Entry(header) => header,
            HeaderRecord::Terminator | HeaderRecord::End => break,
            HeaderRecord::Truncated { read } => {
                return Err(Error::TruncatedHeader {
                    offset: reader.offset() - read as u64,
                    read,
                });
            }
        };
        let header_offset = reader.offset() - HEADER_SIZE as u64;

        let relative = header.checked_path()?.to_path_buf();
        let size = header.size().map_err(|e| Error::MalformedHeader {
            offset: header_offset,
            source: e,
        })?;
        header.mtime().map_err(|e| Error::MalformedHeader {
            offset: header_offset,
            source: e,
        })?;

        let skipped = reader
            .skip_payload(size)
            .map_err(|e| e.path(archive_path))?;
        if skipped < size {
            return Err(Error::TruncatedPayload {
                entry: relative,
                expected: size,
                copied: skipped,
            });
        }

        entries += 1;
        bytes += size;
    }
    Ok((entries, bytes))
}

/// Archive every regular file under `folder` into `archive_path`,
/// overwriting it if present. Returns the total archive length.
pub fn create(archive_path: impl AsRef<Path>, folder: impl AsRef<Path>) -> Result<u64, Error> {
    let archive_path = archive_path.as_ref();

    let mut archive_file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(archive_path)
        .map_err(|e| Error::io("Write archive", archive_path, e))?;

    let mut builder = ArchiveBuilder::new();
    builder.dir(folder)?;
    builder
        .write_archive(&mut archive_file)
        .map_err(|e| e.path(archive_path))
}
