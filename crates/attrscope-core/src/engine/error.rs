use thiserror::Error;

/// Errors returned by bounds-checked cursor reads.
///
/// Handlers convert these into `OutOfBounds` diagnostics; they never escape
/// a walk.
///
/// # Examples
/// ```
/// use attrscope_core::engine::{ByteCursor, ByteOrder, CursorError};
///
/// let cursor = ByteCursor::new(&[0x01]);
/// let err = cursor.read_u16(0, ByteOrder::Big).unwrap_err();
/// assert!(matches!(err, CursorError::OutOfBounds { needed: 2, .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("read out of bounds at offset {offset}: need {needed} bytes, {available} available")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        available: usize,
    },
}

/// Errors returned when registering a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template {id} has no fields")]
    Empty { id: u16 },
    #[error("template {id} record length {length} exceeds {max} bytes")]
    TooLong { id: u16, length: usize, max: usize },
}

/// Errors returned when writing a synthetic tree back to bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("type {type_code}: {what} values cannot be encoded")]
    Unsupported { type_code: u32, what: &'static str },
    #[error("type {type_code}: integer width {width} is not in 1..=8")]
    UnsignedWidth { type_code: u32, width: usize },
    #[error("type {type_code}: {field} value {value} does not fit in {width} bytes")]
    FieldOverflow {
        type_code: u32,
        field: &'static str,
        value: u64,
        width: usize,
    },
    #[error("type {type_code}: record format has no implicit-length form")]
    NoImplicitForm { type_code: u32 },
    #[error("type {type_code}: implicit value is {actual} bytes, table says {expected:?}")]
    ImplicitLength {
        type_code: u32,
        expected: Option<usize>,
        actual: usize,
    },
}
