use std::ops::Range;

use serde::Serialize;

use super::error::LlrpError;
use super::layout;
use crate::engine::{ByteCursor, ByteOrder, CursorError};

/// Fixed LLRP message header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LlrpHeader {
    pub version: u8,
    pub message_type: u16,
    pub length: u32,
    pub message_id: u32,
}

impl LlrpHeader {
    pub fn body_range(&self) -> Range<usize> {
        layout::MESSAGE_HEADER_LEN..self.length as usize
    }
}

/// Big-endian reads over one LLRP message.
pub struct LlrpReader<'a> {
    cursor: ByteCursor<'a>,
}

impl<'a> LlrpReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(buffer),
        }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), LlrpError> {
        self.cursor.require_len(needed).map_err(too_short)
    }

    pub fn read_u16_be(&self, range: Range<usize>) -> Result<u16, LlrpError> {
        self.cursor
            .read_u16(range.start, ByteOrder::Big)
            .map_err(too_short)
    }

    pub fn read_u32_be(&self, range: Range<usize>) -> Result<u32, LlrpError> {
        self.cursor
            .read_u32(range.start, ByteOrder::Big)
            .map_err(too_short)
    }

    pub fn read_slice(&self, range: Range<usize>) -> Result<&'a [u8], LlrpError> {
        self.cursor.read_slice(range).map_err(too_short)
    }

    pub fn header(&self) -> Result<LlrpHeader, LlrpError> {
        self.require_len(layout::MESSAGE_HEADER_LEN)?;
        let version_type = self.read_u16_be(layout::VERSION_TYPE_RANGE)?;
        let version = ((version_type >> layout::VERSION_SHIFT) & layout::VERSION_MASK) as u8;
        if !layout::SUPPORTED_VERSIONS.contains(&version) {
            return Err(LlrpError::UnsupportedVersion { version });
        }
        let length = self.read_u32_be(layout::MESSAGE_LENGTH_RANGE)?;
        if (length as usize) < layout::MESSAGE_HEADER_LEN {
            return Err(LlrpError::InvalidLength {
                length,
                min: layout::MESSAGE_HEADER_LEN,
            });
        }
        if length as usize > self.cursor.len() {
            return Err(LlrpError::LengthExceedsBuffer {
                length,
                actual: self.cursor.len(),
            });
        }
        Ok(LlrpHeader {
            version,
            message_type: version_type & layout::MESSAGE_TYPE_MASK,
            length,
            message_id: self.read_u32_be(layout::MESSAGE_ID_RANGE)?,
        })
    }
}

fn too_short(err: CursorError) -> LlrpError {
    match err {
        CursorError::OutOfBounds {
            offset,
            needed,
            available,
        } => LlrpError::TooShort {
            needed: offset + needed,
            actual: offset + available,
        },
    }
}
