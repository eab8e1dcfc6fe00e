use std::fmt;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use wpress_core::{EntryHeader, NAME_LEN};

use crate::archive::copy_chunked;
use crate::ext::check_path;
use crate::{Error, COPY_BUF_SIZE};

struct BuilderEntry {
    /// Relative path stored in the archive
    target: PathBuf,
    kind: BuilderEntryKind,
}

enum BuilderEntryKind {
    /// Path to a regular file on the build system
    File(PathBuf),
    /// Reader to stream the entry's data from, with an explicit
    /// modification time
    Reader { source: Box<dyn Read>, mtime: u64 },
}

impl fmt::Debug for BuilderEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use BuilderEntryKind::*;
        match self {
            File(p) => write!(f, "BuilderEntryKind::File({:?})", p),
            Reader { mtime, .. } => write!(f, "BuilderEntryKind::Reader {{ mtime: {} }}", mtime),
        }
    }
}

/// Builder pattern for constructing wpress archives. Holds a list of entries
/// and consumes itself to write an archive.
///
/// `target` is the **relative** path stored in the archive; the builder
/// rejects absolute paths, non-normal components, and names longer than the
/// header's name field.
pub struct ArchiveBuilder {
    entries: Vec<BuilderEntry>,
}

impl ArchiveBuilder {
    pub fn new() -> ArchiveBuilder {
        ArchiveBuilder {
            entries: Vec::new(),
        }
    }

    /// Add a regular file to this builder. `source` is the position of the
    /// file on the build system; its size and modification time are read
    /// when the archive is written.
    pub fn file(
        &mut self,
        source: impl AsRef<Path>,
        target: impl AsRef<Path>,
    ) -> Result<&mut ArchiveBuilder, Error> {
        let target = checked_target(target.as_ref())?;
        self.entries.push(BuilderEntry {
            target,
            kind: BuilderEntryKind::File(source.as_ref().to_path_buf()),
        });
        Ok(self)
    }

    /// Add a file to this builder. `source` is a reader to stream the
    /// entry's data from.
    pub fn file_reader(
        &mut self,
        source: impl Read + 'static,
        target: impl AsRef<Path>,
        mtime: u64,
    ) -> Result<&mut ArchiveBuilder, Error> {
        let target = checked_target(target.as_ref())?;
        self.entries.push(BuilderEntry {
            target,
            kind: BuilderEntryKind::Reader {
                source: Box::new(source),
                mtime,
            },
        });
        Ok(self)
    }

    /// Iterate a directory and replicate its relative structure in this
    /// builder by adding entries for all regular files. Symlinks and special
    /// files have no representation in the format and are skipped.
    pub fn dir(&mut self, dir: impl AsRef<Path>) -> Result<&mut ArchiveBuilder, Error> {
        let dir = dir.as_ref();
        self.add_dir_entries(dir, dir)?;
        Ok(self)
    }

    fn add_dir_entries(&mut self, base: &Path, current: &Path) -> Result<(), Error> {
        // Sort each folder's entries by file name
        let mut read_dir = Vec::new();
        for entry_res in
            fs::read_dir(current).map_err(|e| Error::io("Read directory", current, e))?
        {
            read_dir.push(entry_res.map_err(|e| Error::io("Read directory", current, e))?);
        }
        read_dir.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        for entry in read_dir {
            let path = entry.path();
            let metadata = entry
                .metadata()
                .map_err(|e| Error::io("Read metadata", &path, e))?;

            if metadata.is_dir() {
                self.add_dir_entries(base, &path)?;
            } else if metadata.is_file() {
                let target = path
                    .strip_prefix(base)
                    // This shouldn't be reachable
                    .unwrap_or_else(|_| {
                        panic!(
                            "base ({}) was not found in path ({})",
                            base.display(),
                            path.display()
                        )
                    })
                    .to_path_buf();
                self.file(&path, target)?;
            }
        }
        Ok(())
    }

    /// Consume this builder, writing the sorted entries followed by the
    /// terminator record to `w`. Assumes `w` starts at position 0; returns
    /// the total archive length.
    pub fn write_archive<W: Write + Seek>(mut self, w: &mut W) -> Result<u64, Error> {
        // Sort the entries by target path so the same inputs result in
        // _exactly_ the same archive every time.
        self.entries.sort_by(|a, b| a.target.cmp(&b.target));

        let mut buf = vec![0; COPY_BUF_SIZE];

        for builder_entry in self.entries.iter_mut() {
            let name = builder_entry
                .target
                .to_str()
                .expect("target path was checked on insert");

            let header_offset = stream_position(w)?;

            // Placeholder record until the payload length is known
            w.write_all(EntryHeader::terminator().bytes())
                .map_err(|e| Error::io("Write entry header", PathBuf::new(), e))?;

            let (size, mtime) = match &mut builder_entry.kind {
                BuilderEntryKind::File(source_path) => {
                    let metadata = fs::metadata(&source_path)
                        .map_err(|e| Error::io("Read metadata", source_path.as_path(), e))?;
                    // Pre-epoch timestamps cannot be encoded; clamp to zero
                    let mtime = metadata
                        .modified()
                        .map_err(|e| Error::io("Read metadata", source_path.as_path(), e))?
                        .duration_since(UNIX_EPOCH)
                        .map(|d| d.as_secs())
                        .unwrap_or(0);

                    let source_file = File::open(&source_path)
                        .map_err(|e| Error::io("Read source file", source_path.as_path(), e))?;
                    let size = copy_chunked(source_file, w, &mut buf)
                        .map_err(|e| Error::io("Copy entry data", source_path.as_path(), e))?;
                    (size, mtime)
                }
                BuilderEntryKind::Reader { source, mtime } => {
                    let size = copy_chunked(source, w, &mut buf)
                        .map_err(|e| Error::io("Copy entry data", PathBuf::new(), e))?;
                    (size, *mtime)
                }
            };

            let header = EntryHeader::new(name, size, mtime)?;
            let end = stream_position(w)?;
            w.seek(SeekFrom::Start(header_offset))
                .map_err(|e| Error::io("Write entry header", PathBuf::new(), e))?;
            w.write_all(header.bytes())
                .map_err(|e| Error::io("Write entry header", PathBuf::new(), e))?;
            w.seek(SeekFrom::Start(end))
                .map_err(|e| Error::io("Write entry header", PathBuf::new(), e))?;
        }

        w.write_all(EntryHeader::terminator().bytes())
            .map_err(|e| Error::io("Write terminator", PathBuf::new(), e))?;
        stream_position(w)
    }
}

impl fmt::Debug for ArchiveBuilder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (&e.target, &e.kind)))
            .finish()
    }
}

fn stream_position<W: Seek>(w: &mut W) -> Result<u64, Error> {
    w.stream_position()
        .map_err(|e| Error::io("Seek archive", PathBuf::new(), e))
}

/// Verify a target path before accepting it: UTF-8, normal components only,
/// and short enough for the header's name field.
fn checked_target(target: &Path) -> Result<PathBuf, Error> {
    let name = target.to_str().ok_or_else(|| Error::NonUtf8Name {
        name: target.to_string_lossy().into_owned(),
    })?;
    if name.len() > NAME_LEN {
        return Err(Error::Core(wpress_core::Error::NameTooLong(name.len())));
    }
    check_path(target)?;
    Ok(target.to_path_buf())
}
