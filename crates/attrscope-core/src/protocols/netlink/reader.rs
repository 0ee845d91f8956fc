use std::ops::Range;

use serde::Serialize;

use super::error::NetlinkError;
use super::layout;
use crate::engine::{ByteCursor, ByteOrder, CursorError};

/// Fixed `nlmsghdr` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetlinkHeader {
    pub length: u32,
    pub message_type: u16,
    pub flags: u16,
    pub sequence: u32,
    pub port_id: u32,
}

impl NetlinkHeader {
    /// Payload bytes after the header, bounded by `length`.
    pub fn payload_range(&self) -> Range<usize> {
        layout::NLMSG_HDRLEN..self.length as usize
    }

    pub fn is_control(&self) -> bool {
        self.message_type < layout::NLMSG_MIN_TYPE
    }
}

/// Reads netlink framing in host byte order.
pub struct NetlinkReader<'a> {
    cursor: ByteCursor<'a>,
    order: ByteOrder,
}

impl<'a> NetlinkReader<'a> {
    pub fn new(buffer: &'a [u8], order: ByteOrder) -> Self {
        Self {
            cursor: ByteCursor::new(buffer),
            order,
        }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), NetlinkError> {
        self.cursor.require_len(needed).map_err(too_short)
    }

    pub fn read_u16(&self, range: Range<usize>) -> Result<u16, NetlinkError> {
        self.cursor.read_u16(range.start, self.order).map_err(too_short)
    }

    pub fn read_u32(&self, range: Range<usize>) -> Result<u32, NetlinkError> {
        self.cursor.read_u32(range.start, self.order).map_err(too_short)
    }

    pub fn read_slice(&self, range: Range<usize>) -> Result<&'a [u8], NetlinkError> {
        self.cursor.read_slice(range).map_err(too_short)
    }

    /// Read and validate the message header.
    pub fn header(&self) -> Result<NetlinkHeader, NetlinkError> {
        self.require_len(layout::NLMSG_HDRLEN)?;
        let length = self.read_u32(layout::NLMSG_LEN_RANGE)?;
        if (length as usize) < layout::NLMSG_HDRLEN {
            return Err(NetlinkError::InvalidLength {
                length,
                min: layout::NLMSG_HDRLEN,
            });
        }
        if length as usize > self.cursor.len() {
            return Err(NetlinkError::LengthExceedsBuffer {
                length,
                actual: self.cursor.len(),
            });
        }
        Ok(NetlinkHeader {
            length,
            message_type: self.read_u16(layout::NLMSG_TYPE_RANGE)?,
            flags: self.read_u16(layout::NLMSG_FLAGS_RANGE)?,
            sequence: self.read_u32(layout::NLMSG_SEQ_RANGE)?,
            port_id: self.read_u32(layout::NLMSG_PID_RANGE)?,
        })
    }
}

fn too_short(err: CursorError) -> NetlinkError {
    match err {
        CursorError::OutOfBounds {
            offset,
            needed,
            available,
        } => NetlinkError::TooShort {
            needed: offset + needed,
            actual: offset + available,
        },
    }
}
