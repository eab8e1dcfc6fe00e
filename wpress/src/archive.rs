use std::io::{self, Read, Write};
use std::path::PathBuf;

use wpress_core::{EntryHeader, HEADER_SIZE};

use crate::{Error, COPY_BUF_SIZE};

/// One record slot read from an archive stream.
#[derive(Debug)]
pub enum HeaderRecord {
    /// A regular entry; its payload follows immediately.
    Entry(EntryHeader),
    /// The all-zero end marker.
    Terminator,
    /// The stream ended cleanly on a record boundary.
    End,
    /// The stream ended inside a header.
    Truncated { read: usize },
}

/// Sequential reader over the records of an archive.
///
/// Records are positionally contiguous: the payload of an entry must be
/// consumed (or skipped) before the next header can be read.
pub struct ArchiveReader<R> {
    src: R,
    offset: u64,
    buf: Vec<u8>,
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(src: R) -> ArchiveReader<R> {
        ArchiveReader {
            src,
            offset: 0,
            buf: Vec::new(),
        }
    }

    /// Byte offset of the next unread header or payload chunk.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read the next header record, tolerating a clean or mid-header EOF.
    pub fn next_record(&mut self) -> Result<HeaderRecord, Error> {
        let mut header_bytes = [0; HEADER_SIZE];
        let count = read_full(&mut self.src, &mut header_bytes)
            .map_err(|e| Error::io("Read entry header", PathBuf::new(), e))?;

        if count == 0 {
            return Ok(HeaderRecord::End);
        }
        if count < HEADER_SIZE {
            self.offset += count as u64;
            return Ok(HeaderRecord::Truncated { read: count });
        }

        let header = *EntryHeader::parse(&header_bytes)?;
        self.offset += HEADER_SIZE as u64;
        if header.is_terminator() {
            Ok(HeaderRecord::Terminator)
        } else {
            Ok(HeaderRecord::Entry(header))
        }
    }

    /// Copy exactly `size` payload bytes to `dest` in bounded chunks and
    /// return the count actually moved. A short count means the source was
    /// exhausted mid-payload.
    pub fn copy_payload<W: Write>(&mut self, size: u64, dest: &mut W) -> Result<u64, Error> {
        if self.buf.is_empty() {
            self.buf = vec![0; COPY_BUF_SIZE];
        }

        let mut copied = 0;
        while copied < size {
            let want = (size - copied).min(self.buf.len() as u64) as usize;
            let count = self
                .src
                .read(&mut self.buf[..want])
                .map_err(|e| Error::io("Read entry payload", PathBuf::new(), e))?;
            if count == 0 {
                break;
            }
            dest.write_all(&self.buf[..count])
                .map_err(|e| Error::io("Write entry payload", PathBuf::new(), e))?;
            copied += count as u64;
        }
        self.offset += copied;
        Ok(copied)
    }

    /// Consume `size` payload bytes without keeping them.
    pub fn skip_payload(&mut self, size: u64) -> Result<u64, Error> {
        self.copy_payload(size, &mut io::sink())
    }
}

/// Read until `buf` is full or the source is exhausted.
fn read_full<R: Read>(src: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let count = src.read(&mut buf[total..])?;
        if count == 0 {
            break;
        }
        total += count;
    }
    Ok(total)
}

/// Copy `src` to completion through `buf`, returning the total moved.
pub(crate) fn copy_chunked<R: Read, W: Write>(
    mut src: R,
    dest: &mut W,
    buf: &mut [u8],
) -> io::Result<u64> {
    let mut total = 0;
    loop {
        let count = src.read(buf)?;
        if count == 0 {
            break;
        }
        dest.write_all(&buf[..count])?;
        total += count as u64;
    }
    Ok(total)
}
