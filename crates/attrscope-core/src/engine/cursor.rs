use std::ops::Range;

use super::context::ByteOrder;
use super::error::CursorError;

/// Bounds-checked, endianness-aware reads over a borrowed byte view.
///
/// Offsets passed to the read methods are relative to the view; errors report
/// the absolute offset (`base + offset`) so diagnostics point at the original
/// message buffer.
///
/// # Examples
/// ```
/// use attrscope_core::engine::{ByteCursor, ByteOrder};
///
/// let cursor = ByteCursor::new(&[0x08, 0x00, 0x01, 0x00]);
/// assert_eq!(cursor.read_u16(0, ByteOrder::Little).unwrap(), 8);
/// assert_eq!(cursor.read_u16(2, ByteOrder::Big).unwrap(), 0x0100);
/// assert_eq!(cursor.remaining(3), 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    base: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, base: 0 }
    }

    /// Cursor over a sub-view whose first byte sits at `base` in the message.
    pub fn with_base(buf: &'a [u8], base: usize) -> Self {
        Self { buf, base }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// Bytes left from `offset` to the end of the view (zero past the end).
    pub fn remaining(&self, offset: usize) -> usize {
        self.buf.len().saturating_sub(offset)
    }

    pub fn require_len(&self, needed: usize) -> Result<(), CursorError> {
        if self.buf.len() < needed {
            return Err(CursorError::OutOfBounds {
                offset: self.base,
                needed,
                available: self.buf.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, CursorError> {
        self.buf
            .get(offset)
            .copied()
            .ok_or_else(|| self.out_of_bounds(offset, 1))
    }

    pub fn read_u16(&self, offset: usize, order: ByteOrder) -> Result<u16, CursorError> {
        let bytes = self.read_array::<2>(offset)?;
        Ok(match order {
            ByteOrder::Big => u16::from_be_bytes(bytes),
            ByteOrder::Little => u16::from_le_bytes(bytes),
        })
    }

    pub fn read_u32(&self, offset: usize, order: ByteOrder) -> Result<u32, CursorError> {
        let bytes = self.read_array::<4>(offset)?;
        Ok(match order {
            ByteOrder::Big => u32::from_be_bytes(bytes),
            ByteOrder::Little => u32::from_le_bytes(bytes),
        })
    }

    pub fn read_u64(&self, offset: usize, order: ByteOrder) -> Result<u64, CursorError> {
        let bytes = self.read_array::<8>(offset)?;
        Ok(match order {
            ByteOrder::Big => u64::from_be_bytes(bytes),
            ByteOrder::Little => u64::from_le_bytes(bytes),
        })
    }

    /// Read an unsigned integer of 1..=8 bytes.
    ///
    /// Odd widths (3, 5, 6, 7) occur in template-defined layouts where the
    /// exporter truncates counters.
    pub fn read_uint(
        &self,
        offset: usize,
        width: usize,
        order: ByteOrder,
    ) -> Result<u64, CursorError> {
        if width == 0 || width > 8 {
            return Err(self.out_of_bounds(offset, width));
        }
        let bytes = self.read_slice(offset..offset + width)?;
        let value = match order {
            ByteOrder::Big => bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)),
            ByteOrder::Little => bytes
                .iter()
                .rev()
                .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)),
        };
        Ok(value)
    }

    pub fn read_slice(&self, range: Range<usize>) -> Result<&'a [u8], CursorError> {
        let start = range.start;
        let needed = range.end.saturating_sub(range.start);
        self.buf
            .get(range)
            .ok_or_else(|| self.out_of_bounds(start, needed))
    }

    /// Sub-cursor over `range`, keeping absolute offsets intact.
    pub fn as_slice(&self) -> &'a [u8] {
        self.buf
    }

    fn read_array<const N: usize>(&self, offset: usize) -> Result<[u8; N], CursorError> {
        let bytes = self.read_slice(offset..offset.saturating_add(N))?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn out_of_bounds(&self, offset: usize, needed: usize) -> CursorError {
        CursorError::OutOfBounds {
            offset: self.base + offset,
            needed,
            available: self.remaining(offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ByteCursor;
    use crate::engine::context::ByteOrder;
    use crate::engine::error::CursorError;

    #[test]
    fn reads_respect_byte_order() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u8(7).unwrap(), 0x08);
        assert_eq!(cursor.read_u32(0, ByteOrder::Big).unwrap(), 0x0102_0304);
        assert_eq!(cursor.read_u32(0, ByteOrder::Little).unwrap(), 0x0403_0201);
        assert_eq!(
            cursor.read_u64(0, ByteOrder::Big).unwrap(),
            0x0102_0304_0506_0708
        );
    }

    #[test]
    fn read_past_end_reports_absolute_offset() {
        let data = [0u8; 3];
        let cursor = ByteCursor::with_base(&data, 100);
        let err = cursor.read_u32(1, ByteOrder::Big).unwrap_err();
        assert_eq!(
            err,
            CursorError::OutOfBounds {
                offset: 101,
                needed: 4,
                available: 2,
            }
        );
    }

    #[test]
    fn read_uint_handles_odd_widths() {
        let data = [0x00, 0x01, 0x02];
        let cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_uint(0, 3, ByteOrder::Big).unwrap(), 0x0102);
        assert_eq!(cursor.read_uint(0, 3, ByteOrder::Little).unwrap(), 0x02_0100);
        assert!(cursor.read_uint(0, 9, ByteOrder::Big).is_err());
        assert!(cursor.read_uint(0, 0, ByteOrder::Big).is_err());
    }

    #[test]
    fn remaining_saturates() {
        let data = [0u8; 4];
        let cursor = ByteCursor::new(&data);
        assert_eq!(cursor.remaining(1), 3);
        assert_eq!(cursor.remaining(10), 0);
    }

    #[test]
    fn errors_carry_absolute_offsets() {
        let data = [8u8, 7, 6];
        let cursor = ByteCursor::with_base(&data, 12);
        assert_eq!(cursor.read_u8(2).unwrap(), 6);
        let err = cursor.read_u8(3).unwrap_err();
        assert!(matches!(err, CursorError::OutOfBounds { offset: 15, .. }));
    }
}
