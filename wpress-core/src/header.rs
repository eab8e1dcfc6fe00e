//! The packed struct represents the on-disk format of wpress archives
use alloc::string::String;

use bytemuck::{Pod, Zeroable};

use crate::{Error, MTIME_LEN, NAME_LEN, RESERVED_LEN, SIZE_LEN};

#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(packed, C)]
pub struct EntryHeader {
    /// NUL-padded relative path from the extract directory
    pub name: [u8; NAME_LEN],
    /// Payload length in bytes as an ASCII decimal string
    pub size: [u8; SIZE_LEN],
    /// POSIX modification time as an ASCII decimal string
    pub mtime: [u8; MTIME_LEN],
    /// Reserved, zeroed on write and ignored on read
    pub reserved: [u8; RESERVED_LEN],
}

impl EntryHeader {
    /// Parse a header from exactly one record worth of bytes
    pub fn parse(data: &[u8]) -> Result<&EntryHeader, Error> {
        Ok(bytemuck::try_from_bytes(data)?)
    }

    /// Construct a header for `name` with the given payload size and
    /// modification time
    pub fn new(name: &str, size: u64, mtime: u64) -> Result<EntryHeader, Error> {
        let name_bytes = name.as_bytes();
        if name_bytes.len() > NAME_LEN {
            return Err(Error::NameTooLong(name_bytes.len()));
        }

        let mut header = EntryHeader::zeroed();
        header.name[..name_bytes.len()].copy_from_slice(name_bytes);
        write_decimal(&mut header.size, size)?;
        write_decimal(&mut header.mtime, mtime)?;
        Ok(header)
    }

    /// The all-zero record that ends an archive
    pub fn terminator() -> EntryHeader {
        EntryHeader::zeroed()
    }

    /// Retrieve the name, ending at the first NUL
    pub fn name_bytes(&self) -> &[u8] {
        let mut i = 0;
        while i < self.name.len() {
            if self.name[i] == 0 {
                break;
            }
            i += 1;
        }
        &self.name[..i]
    }

    /// A header with an empty name ends the archive
    pub fn is_terminator(&self) -> bool {
        self.name_bytes().is_empty()
    }

    pub fn size(&self) -> Result<u64, Error> {
        parse_decimal(&self.size).ok_or_else(|| Error::MalformedSize(field_text(&self.size)))
    }

    pub fn mtime(&self) -> Result<u64, Error> {
        parse_decimal(&self.mtime).ok_or_else(|| Error::MalformedModTime(field_text(&self.mtime)))
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Numeric fields are NUL padded, with surrounding ASCII whitespace permitted
fn parse_decimal(field: &[u8]) -> Option<u64> {
    let text = core::str::from_utf8(field).ok()?;
    let text = text.trim_matches(|c: char| c == '\0' || c.is_ascii_whitespace());
    if text.is_empty() {
        return None;
    }
    text.parse().ok()
}

fn field_text(field: &[u8]) -> String {
    let text = String::from_utf8_lossy(field);
    String::from(text.trim_matches('\0'))
}

fn write_decimal(field: &mut [u8], value: u64) -> Result<(), Error> {
    let text = alloc::format!("{}", value);
    if text.len() > field.len() {
        return Err(Error::FieldOverflow(value));
    }
    field[..text.len()].copy_from_slice(text.as_bytes());
    Ok(())
}
