use alloc::format;
use alloc::string::String;
use core::error;
use core::fmt::{Display, Formatter, Result};

use bytemuck::PodCastError;

#[derive(Debug)]
pub enum Error {
    Cast(PodCastError),
    MalformedSize(String),
    MalformedModTime(String),
    NameTooLong(usize),
    FieldOverflow(u64),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> Result {
        use Error::*;

        let msg = match self {
            Cast(err) => format!("Cast: {:?}", err),
            MalformedSize(raw) => format!("Malformed size field: {:?}", raw),
            MalformedModTime(raw) => format!("Malformed modification time field: {:?}", raw),
            NameTooLong(len) => format!("Entry name too long: {} bytes", len),
            FieldOverflow(value) => format!("Value too wide for header field: {}", value),
        };
        write!(f, "{}", msg)
    }
}

impl error::Error for Error {}

impl From<PodCastError> for Error {
    fn from(err: PodCastError) -> Error {
        Error::Cast(err)
    }
}
