//! Writes attribute trees back to bytes.
//!
//! Used to build fixtures and to check that decoding is lossless for the
//! values the engine understands. Lengths and padding are recomputed from the
//! values; the `span`, `declared_len` and `padding` of the input are only used
//! to size fixed-width integers and NUL-padded text.

use std::net::IpAddr;

use super::context::ByteOrder;
use super::error::EncodeError;
use super::format::{FieldOrder, FieldWidth, RecordFormat};
use super::tree::{Attribute, AttributeValue, HeaderForm};

/// Encode `attributes` as a record list under `format`.
///
/// `order` plays the role of `DecodeContext::byte_order`: it applies when the
/// format does not fix a byte order.
///
/// # Examples
/// ```
/// use attrscope_core::engine::encode::{bytes_leaf, encode_attributes, nested};
/// use attrscope_core::engine::ByteOrder;
/// use attrscope_core::protocols::netlink::netlink_format;
///
/// let tree = vec![nested(1, 0, vec![bytes_leaf(2, b"abc")])];
/// let bytes = encode_attributes(&tree, &netlink_format(), ByteOrder::Little).unwrap();
/// assert_eq!(bytes, [0x0c, 0x00, 0x01, 0x00, 0x07, 0x00, 0x02, 0x00, b'a', b'b', b'c', 0x00]);
/// ```
pub fn encode_attributes(
    attributes: &[Attribute],
    format: &RecordFormat,
    order: ByteOrder,
) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    for attribute in attributes {
        encode_one(&mut out, attribute, format, order)?;
    }
    Ok(out)
}

fn encode_one(
    out: &mut Vec<u8>,
    attribute: &Attribute,
    format: &RecordFormat,
    order: ByteOrder,
) -> Result<(), EncodeError> {
    match attribute.form {
        HeaderForm::Explicit => encode_explicit(out, attribute, format, order),
        HeaderForm::Implicit => encode_implicit(out, attribute, format, order),
        HeaderForm::Template => Err(EncodeError::Unsupported {
            type_code: attribute.type_code,
            what: "template-laid-out",
        }),
    }
}

fn encode_explicit(
    out: &mut Vec<u8>,
    attribute: &Attribute,
    format: &RecordFormat,
    order: ByteOrder,
) -> Result<(), EncodeError> {
    let explicit = &format.explicit;
    let value_order = match explicit.network_order_flag {
        Some(flag) if attribute.flags & flag != 0 => ByteOrder::Big,
        _ => explicit.byte_order.unwrap_or(order),
    };
    let value = value_bytes(attribute, format, value_order)?;

    let header_order = format.header_order(order);
    let raw_type = (attribute.type_code & explicit.type_mask) | (attribute.flags & explicit.flag_mask);
    let record_len = (explicit.min_len() + value.len()) as u64;
    let mut type_field = Vec::with_capacity(4);
    write_uint(
        &mut type_field,
        u64::from(raw_type),
        explicit.type_width,
        header_order,
        attribute.type_code,
        "type",
    )?;
    let mut length_field = Vec::with_capacity(4);
    write_uint(
        &mut length_field,
        record_len,
        explicit.length_width,
        header_order,
        attribute.type_code,
        "length",
    )?;

    let start = out.len();
    match explicit.order {
        FieldOrder::TypeFirst => {
            out.extend_from_slice(&type_field);
            out.extend_from_slice(&length_field);
        }
        FieldOrder::LengthFirst => {
            out.extend_from_slice(&length_field);
            out.extend_from_slice(&type_field);
        }
    }
    out.extend_from_slice(&value);
    let written = out.len() - start;
    out.resize(start + explicit.align(written), 0);
    Ok(())
}

fn encode_implicit(
    out: &mut Vec<u8>,
    attribute: &Attribute,
    format: &RecordFormat,
    order: ByteOrder,
) -> Result<(), EncodeError> {
    let type_code = attribute.type_code;
    let implicit = format
        .implicit
        .as_ref()
        .ok_or(EncodeError::NoImplicitForm { type_code })?;
    let code = u8::try_from(type_code)
        .ok()
        .filter(|code| code & !implicit.type_mask == 0)
        .ok_or(EncodeError::FieldOverflow {
            type_code,
            field: "type",
            value: u64::from(type_code),
            width: 1,
        })?;
    let value = value_bytes(attribute, format, format.header_order(order))?;
    let expected = implicit.value_len(code);
    if expected != Some(value.len()) {
        return Err(EncodeError::ImplicitLength {
            type_code,
            expected,
            actual: value.len(),
        });
    }
    out.push(implicit.discriminator | code);
    out.extend_from_slice(&value);
    Ok(())
}

fn value_bytes(
    attribute: &Attribute,
    format: &RecordFormat,
    order: ByteOrder,
) -> Result<Vec<u8>, EncodeError> {
    let type_code = attribute.type_code;
    match &attribute.value {
        AttributeValue::Opaque(bytes) | AttributeValue::Bytes(bytes) => {
            // Prefixed groups keep their fixed prefix as the value.
            let mut out = bytes.clone();
            out.extend(encode_attributes(&attribute.children, format, order)?);
            Ok(out)
        }
        AttributeValue::Unresolved { bytes, .. } => Ok(bytes.clone()),
        AttributeValue::Text(text) => {
            let mut bytes = text.as_bytes().to_vec();
            bytes.resize(bytes.len().max(attribute.value_len()), 0);
            Ok(bytes)
        }
        AttributeValue::Address(IpAddr::V4(addr)) => Ok(addr.octets().to_vec()),
        AttributeValue::Address(IpAddr::V6(addr)) => Ok(addr.octets().to_vec()),
        AttributeValue::Unsigned(value) => {
            let value = *value;
            let width = attribute.value_len();
            if !(1..=8).contains(&width) {
                return Err(EncodeError::UnsignedWidth { type_code, width });
            }
            if width < 8 && value >> (8 * width) != 0 {
                return Err(EncodeError::FieldOverflow {
                    type_code,
                    field: "value",
                    value,
                    width,
                });
            }
            let bytes = value.to_be_bytes();
            let mut out = bytes[8 - width..].to_vec();
            if order == ByteOrder::Little {
                out.reverse();
            }
            Ok(out)
        }
        AttributeValue::Nested => encode_attributes(&attribute.children, format, order),
        AttributeValue::Namespaced { .. } => Err(EncodeError::Unsupported {
            type_code,
            what: "namespaced",
        }),
        AttributeValue::TemplateDefinition { .. } => Err(EncodeError::Unsupported {
            type_code,
            what: "template definition",
        }),
    }
}

fn write_uint(
    out: &mut Vec<u8>,
    value: u64,
    width: FieldWidth,
    order: ByteOrder,
    type_code: u32,
    field: &'static str,
) -> Result<(), EncodeError> {
    let overflow = EncodeError::FieldOverflow {
        type_code,
        field,
        value,
        width: width.bytes(),
    };
    match width {
        FieldWidth::U8 => out.push(u8::try_from(value).map_err(|_| overflow)?),
        FieldWidth::U16 => {
            let value = u16::try_from(value).map_err(|_| overflow)?;
            match order {
                ByteOrder::Big => out.extend_from_slice(&value.to_be_bytes()),
                ByteOrder::Little => out.extend_from_slice(&value.to_le_bytes()),
            }
        }
        FieldWidth::U32 => {
            let value = u32::try_from(value).map_err(|_| overflow)?;
            match order {
                ByteOrder::Big => out.extend_from_slice(&value.to_be_bytes()),
                ByteOrder::Little => out.extend_from_slice(&value.to_le_bytes()),
            }
        }
    }
    Ok(())
}

fn synthetic(type_code: u32, form: HeaderForm, value: AttributeValue, value_len: usize) -> Attribute {
    Attribute {
        type_code,
        flags: 0,
        form,
        declared_len: value_len,
        header_len: 0,
        consumed_len: value_len,
        span: 0..value_len,
        padding: 0,
        value,
        children: Vec::new(),
    }
}

/// Explicit-form leaf holding a byte string.
pub fn bytes_leaf(type_code: u32, bytes: &[u8]) -> Attribute {
    synthetic(
        type_code,
        HeaderForm::Explicit,
        AttributeValue::Bytes(bytes.to_vec()),
        bytes.len(),
    )
}

/// Explicit-form leaf holding a `width`-byte unsigned integer.
pub fn unsigned_leaf(type_code: u32, value: u64, width: usize) -> Attribute {
    synthetic(
        type_code,
        HeaderForm::Explicit,
        AttributeValue::Unsigned(value),
        width,
    )
}

/// Implicit-form (TV) leaf; the value length must match the format's table.
pub fn implicit_leaf(type_code: u32, bytes: &[u8]) -> Attribute {
    synthetic(
        type_code,
        HeaderForm::Implicit,
        AttributeValue::Bytes(bytes.to_vec()),
        bytes.len(),
    )
}

/// Explicit-form record whose value is `children`.
pub fn nested(type_code: u32, flags: u32, children: Vec<Attribute>) -> Attribute {
    let mut attribute = synthetic(type_code, HeaderForm::Explicit, AttributeValue::Nested, 0);
    attribute.flags = flags;
    attribute.children = children;
    attribute
}
