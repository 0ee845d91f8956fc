use std::ops::Range;

use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use super::error::NetflowError;
use super::layout;
use crate::engine::{ByteCursor, ByteOrder, CursorError};

/// NetFlow v9 packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetflowHeader {
    pub version: u16,
    /// Records (template and data) announced for the packet.
    pub count: u16,
    pub sys_uptime_ms: u32,
    pub unix_secs: u32,
    pub sequence: u32,
    /// Observation domain; part of the template scope.
    pub source_id: u32,
}

impl NetflowHeader {
    /// Export time as RFC 3339, if representable.
    pub fn exported_at(&self) -> Option<String> {
        OffsetDateTime::from_unix_timestamp(i64::from(self.unix_secs))
            .ok()
            .and_then(|dt| dt.format(&Rfc3339).ok())
    }
}

pub struct NetflowReader<'a> {
    cursor: ByteCursor<'a>,
}

impl<'a> NetflowReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(buffer),
        }
    }

    pub fn read_u16_be(&self, range: Range<usize>) -> Result<u16, NetflowError> {
        self.cursor
            .read_u16(range.start, ByteOrder::Big)
            .map_err(too_short)
    }

    pub fn read_u32_be(&self, range: Range<usize>) -> Result<u32, NetflowError> {
        self.cursor
            .read_u32(range.start, ByteOrder::Big)
            .map_err(too_short)
    }

    pub fn header(&self) -> Result<NetflowHeader, NetflowError> {
        self.cursor
            .require_len(layout::PACKET_HEADER_LEN)
            .map_err(too_short)?;
        let version = self.read_u16_be(layout::VERSION_RANGE)?;
        if version != layout::NETFLOW_V9 {
            return Err(NetflowError::UnsupportedVersion { version });
        }
        Ok(NetflowHeader {
            version,
            count: self.read_u16_be(layout::COUNT_RANGE)?,
            sys_uptime_ms: self.read_u32_be(layout::SYS_UPTIME_RANGE)?,
            unix_secs: self.read_u32_be(layout::UNIX_SECS_RANGE)?,
            sequence: self.read_u32_be(layout::SEQUENCE_RANGE)?,
            source_id: self.read_u32_be(layout::SOURCE_ID_RANGE)?,
        })
    }
}

fn too_short(err: CursorError) -> NetflowError {
    match err {
        CursorError::OutOfBounds {
            offset,
            needed,
            available,
        } => NetflowError::TooShort {
            needed: offset + needed,
            actual: offset + available,
        },
    }
}
