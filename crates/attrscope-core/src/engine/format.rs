//! Record header shapes.
//!
//! A `RecordFormat` tells the walker how to read one record header: the
//! explicit (type + length on the wire) form, and optionally an implicit form
//! selected by a discriminator bit in the first byte, whose length comes from
//! a static table.

use std::collections::BTreeMap;

use super::context::ByteOrder;

/// Width of an integer header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidth {
    U8,
    U16,
    U32,
}

impl FieldWidth {
    pub fn bytes(&self) -> usize {
        match self {
            FieldWidth::U8 => 1,
            FieldWidth::U16 => 2,
            FieldWidth::U32 => 4,
        }
    }
}

/// Which header field comes first on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrder {
    /// `type | length` (LLRP, NetFlow flowsets).
    TypeFirst,
    /// `length | type` (netlink `nlattr`).
    LengthFirst,
}

/// Explicit-length (TLV) header. The length field counts the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitHeader {
    pub order: FieldOrder,
    pub type_width: FieldWidth,
    pub length_width: FieldWidth,
    /// Bits of the raw type field that form the type code.
    pub type_mask: u32,
    /// Bits of the raw type field preserved as `Attribute::flags`.
    pub flag_mask: u32,
    /// Records start on multiples of this many bytes (1 = unaligned).
    pub alignment: usize,
    /// Header byte order; `None` follows `DecodeContext::byte_order`.
    pub byte_order: Option<ByteOrder>,
    /// Flag bit marking a value stored big-endian regardless of header order.
    pub network_order_flag: Option<u32>,
}

impl ExplicitHeader {
    pub fn min_len(&self) -> usize {
        self.type_width.bytes() + self.length_width.bytes()
    }

    /// Round `len` up to the next alignment boundary.
    pub fn align(&self, len: usize) -> usize {
        if self.alignment <= 1 {
            return len;
        }
        len.div_ceil(self.alignment) * self.alignment
    }
}

/// Implicit-length (TV) header: one byte, length looked up by type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicitHeader {
    /// Bit of the first byte that selects this form.
    pub discriminator: u8,
    pub type_mask: u8,
    /// Value length (header excluded) per type code.
    pub lengths: BTreeMap<u8, usize>,
}

impl ImplicitHeader {
    pub const HEADER_LEN: usize = 1;

    pub fn matches(&self, first: u8) -> bool {
        first & self.discriminator != 0
    }

    pub fn value_len(&self, type_code: u8) -> Option<usize> {
        self.lengths.get(&type_code).copied()
    }
}

/// Header rules for one protocol family.
///
/// # Examples
/// ```
/// use attrscope_core::engine::{ExplicitHeader, FieldOrder, FieldWidth, RecordFormat};
///
/// let format = RecordFormat::explicit(ExplicitHeader {
///     order: FieldOrder::LengthFirst,
///     type_width: FieldWidth::U16,
///     length_width: FieldWidth::U16,
///     type_mask: 0x3fff,
///     flag_mask: 0xc000,
///     alignment: 4,
///     byte_order: None,
///     network_order_flag: Some(0x4000),
/// });
/// assert_eq!(format.min_header_len(), 4);
/// assert_eq!(format.explicit.align(5), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFormat {
    pub explicit: ExplicitHeader,
    pub implicit: Option<ImplicitHeader>,
}

impl RecordFormat {
    pub fn explicit(explicit: ExplicitHeader) -> Self {
        Self {
            explicit,
            implicit: None,
        }
    }

    pub fn with_implicit(mut self, implicit: ImplicitHeader) -> Self {
        self.implicit = Some(implicit);
        self
    }

    /// Smallest number of bytes that can hold any header of this format.
    pub fn min_header_len(&self) -> usize {
        match self.implicit {
            Some(_) => ImplicitHeader::HEADER_LEN,
            None => self.explicit.min_len(),
        }
    }

    pub fn header_order(&self, ctx_order: ByteOrder) -> ByteOrder {
        self.explicit.byte_order.unwrap_or(ctx_order)
    }
}
