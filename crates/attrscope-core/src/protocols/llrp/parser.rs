use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::error::LlrpError;
use super::layout;
use super::reader::{LlrpHeader, LlrpReader};
use crate::engine::handlers::{
    BytesHandler, NamespaceHandler, NestedHandler, TextHandler, UnsignedHandler,
};
use crate::engine::{
    AttributeValue, AttributeWalker, ByteOrder, DecodeContext, DecodeOutput, ExplicitHeader,
    FieldOrder, FieldWidth, Handler, HandlerOutput, ImplicitHeader, RecordFormat,
    TypeDispatchTable, handler_fn,
};

/// LLRP parameter header rules: TLV with a 10-bit type, or TV when the
/// first byte has its high bit set.
pub fn llrp_format() -> RecordFormat {
    RecordFormat::explicit(ExplicitHeader {
        order: FieldOrder::TypeFirst,
        type_width: FieldWidth::U16,
        length_width: FieldWidth::U16,
        type_mask: layout::TLV_TYPE_MASK,
        flag_mask: 0,
        alignment: 1,
        byte_order: Some(ByteOrder::Big),
        network_order_flag: None,
    })
    .with_implicit(ImplicitHeader {
        discriminator: layout::TV_DISCRIMINATOR,
        type_mask: layout::TV_TYPE_MASK,
        lengths: layout::TV_LENGTHS.iter().copied().collect::<BTreeMap<_, _>>(),
    })
}

/// Custom parameter (type 1023): vendor id, then vendor subtype.
///
/// Callers can register more vendors on the returned handler before adding
/// it to a table.
pub fn custom_parameters() -> NamespaceHandler {
    let impinj = NamespaceHandler::new(FieldWidth::U32)
        .register(layout::IMPINJ_SEARCH_MODE, UnsignedHandler::fixed(2))
        .register(layout::IMPINJ_RF_PHASE_ANGLE, UnsignedHandler::fixed(2))
        .register(layout::IMPINJ_PEAK_RSSI, UnsignedHandler::fixed(2))
        .register(layout::IMPINJ_RF_DOPPLER_FREQUENCY, UnsignedHandler::fixed(2));
    NamespaceHandler::new(FieldWidth::U32).register(layout::VENDOR_IMPINJ, impinj)
}

/// Parameter handlers for the report and notification messages.
pub fn llrp_parameters() -> TypeDispatchTable {
    let mut leaves = TypeDispatchTable::new();
    for (code, len) in layout::TV_LENGTHS {
        let code = u32::from(*code);
        match *len {
            width @ (1 | 2 | 4 | 8) => leaves.register(code, UnsignedHandler::fixed(width)),
            _ => leaves.register(code, BytesHandler),
        };
    }
    leaves
        .register(layout::PARAM_UTC_TIMESTAMP, UnsignedHandler::fixed(8))
        .register(layout::PARAM_UPTIME, UnsignedHandler::fixed(8))
        .register(layout::PARAM_EPC_DATA, epc_data())
        .register(layout::PARAM_ANTENNA_EVENT, BytesHandler)
        .register(layout::PARAM_CONNECTION_ATTEMPT_EVENT, UnsignedHandler::fixed(2))
        .register(layout::PARAM_CUSTOM, custom_parameters());
    let leaves = Arc::new(leaves);

    let mut errors = TypeDispatchTable::new();
    errors
        .register(layout::PARAM_FIELD_ERROR, BytesHandler)
        .register(
            layout::PARAM_PARAMETER_ERROR,
            NestedHandler::new(Arc::new({
                let mut inner = TypeDispatchTable::new();
                inner.register(layout::PARAM_FIELD_ERROR, BytesHandler);
                inner
            }))
            .with_prefix(layout::PARAMETER_ERROR_PREFIX_LEN),
        );

    let mut table = (*leaves).clone();
    table
        .register(
            layout::PARAM_TAG_REPORT_DATA,
            NestedHandler::new(Arc::clone(&leaves)),
        )
        .register(
            layout::PARAM_READER_EVENT_NOTIFICATION_DATA,
            NestedHandler::new(Arc::clone(&leaves)),
        )
        .register(
            layout::PARAM_RO_SPEC,
            NestedHandler::new(Arc::clone(&leaves)).with_prefix(layout::RO_SPEC_PREFIX_LEN),
        )
        .register(layout::PARAM_LLRP_STATUS, llrp_status(Arc::new(errors)));
    table
}

/// `EPCData`: bit count, then the EPC padded to whole bytes.
fn epc_data() -> impl Handler {
    handler_fn(|view, scope| {
        let cursor = view.cursor();
        let epc = cursor.read_u16(0, view.byte_order).and_then(|bits| {
            let len = usize::from(bits).div_ceil(8);
            cursor.read_slice(2..2 + len)
        });
        match epc {
            Ok(epc) => HandlerOutput::value(AttributeValue::Bytes(epc.to_vec()), 2 + epc.len()),
            Err(err) => {
                scope.cursor_error(&err);
                HandlerOutput::opaque(view)
            }
        }
    })
}

/// `LLRPStatus`: the status code keys its UTF-8 description; error
/// parameters follow as children.
fn llrp_status(errors: Arc<TypeDispatchTable>) -> impl Handler {
    handler_fn(move |view, scope| {
        let cursor = view.cursor();
        let prefix = cursor.read_u16(0, view.byte_order).and_then(|status| {
            let text_len = usize::from(cursor.read_u16(2, view.byte_order)?);
            let start = layout::LLRP_STATUS_PREFIX_LEN;
            let text = cursor.read_slice(start..start + text_len)?;
            Ok((status, text))
        });
        let (status, text) = match prefix {
            Ok(prefix) => prefix,
            Err(err) => {
                scope.cursor_error(&err);
                return HandlerOutput::opaque(view);
            }
        };

        let fixed = layout::LLRP_STATUS_PREFIX_LEN + text.len();
        let (children, consumed) = match scope.walk_nested(&view.tail(fixed), &errors) {
            Some(nested) => (nested.children, fixed + nested.consumed),
            None => (Vec::new(), fixed),
        };
        HandlerOutput {
            value: AttributeValue::Namespaced {
                key: u64::from(status),
                inner: Box::new(AttributeValue::Text(
                    String::from_utf8_lossy(text).into_owned(),
                )),
            },
            children,
            consumed,
        }
    })
}

/// One decoded LLRP message.
#[derive(Debug, Clone)]
pub struct LlrpMessage {
    pub header: LlrpHeader,
    /// Message fields before the first parameter.
    pub fixed_body: Vec<u8>,
    pub output: DecodeOutput,
}

/// Decode one LLRP message with the built-in parameter table.
pub fn decode_llrp_message(buffer: &[u8], ctx: &DecodeContext) -> Result<LlrpMessage, LlrpError> {
    decode_llrp_with(buffer, ctx, &llrp_parameters())
}

/// Decode one LLRP message with caller-supplied parameter handlers.
pub fn decode_llrp_with(
    buffer: &[u8],
    ctx: &DecodeContext,
    parameters: &TypeDispatchTable,
) -> Result<LlrpMessage, LlrpError> {
    let reader = LlrpReader::new(buffer);
    let header = reader.header()?;
    let body = header.body_range();
    let params_start = body.start + layout::fixed_body_len(header.message_type);
    if params_start > body.end {
        return Err(LlrpError::TooShort {
            needed: params_start,
            actual: body.end,
        });
    }
    let fixed_body = reader.read_slice(body.start..params_start)?.to_vec();

    let ctx = ctx.clone().protocol_version(u16::from(header.version));
    let format = llrp_format();
    let output =
        AttributeWalker::new(&format).walk(buffer, params_start, body.end, &ctx, parameters);
    debug!(
        message_type = header.message_type,
        message_id = header.message_id,
        parameters = output.tree.len(),
        diagnostics = output.diagnostics.len(),
        "llrp message decoded"
    );
    Ok(LlrpMessage {
        header,
        fixed_body,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::{decode_llrp_message, llrp_format};
    use crate::engine::encode::{bytes_leaf, encode_attributes, implicit_leaf, nested};
    use crate::engine::{
        Attribute, AttributeValue, ByteOrder, DecodeContext, DiagnosticKind, HeaderForm,
    };
    use crate::protocols::llrp::layout;

    fn message(message_type: u16, fixed: &[u8], body: &[u8]) -> Vec<u8> {
        let length = (layout::MESSAGE_HEADER_LEN + fixed.len() + body.len()) as u32;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&((1u16 << 10) | message_type).to_be_bytes());
        bytes.extend_from_slice(&length.to_be_bytes());
        bytes.extend_from_slice(&7u32.to_be_bytes());
        bytes.extend_from_slice(fixed);
        bytes.extend_from_slice(body);
        bytes
    }

    fn encode(tree: &[Attribute]) -> Vec<u8> {
        encode_attributes(tree, &llrp_format(), ByteOrder::Big).unwrap()
    }

    fn ctx() -> DecodeContext {
        DecodeContext::default()
    }

    #[test]
    fn tag_report_mixes_tv_tlv_and_custom() {
        let epc = [0x30, 0x08, 0x33, 0xb2, 0xdd, 0xd9, 0x01, 0x40, 0x00, 0x00, 0x00, 0x01];
        let custom = [0x00, 0x00, 0x65, 0x1a, 0x00, 0x00, 0x00, 0x39, 0xfc, 0x18];
        let report = nested(
            layout::PARAM_TAG_REPORT_DATA,
            0,
            vec![
                implicit_leaf(u32::from(layout::TV_EPC_96), &epc),
                implicit_leaf(u32::from(layout::TV_ANTENNA_ID), &[0x00, 0x01]),
                implicit_leaf(u32::from(layout::TV_PEAK_RSSI), &[0xc8]),
                bytes_leaf(layout::PARAM_CUSTOM, &custom),
            ],
        );
        let bytes = message(layout::MSG_RO_ACCESS_REPORT, &[], &encode(&[report]));
        let msg = decode_llrp_message(&bytes, &ctx()).unwrap();

        assert_eq!(msg.header.message_id, 7);
        assert!(msg.output.diagnostics.is_empty(), "{:?}", msg.output.diagnostics);
        let report = &msg.output.tree[0];
        assert_eq!(report.type_code, layout::PARAM_TAG_REPORT_DATA);
        assert_eq!(report.declared_len, 4 + 13 + 3 + 2 + 14);
        assert_eq!(report.children.len(), 4);
        assert_eq!(report.children[0].form, HeaderForm::Implicit);
        assert_eq!(report.children[0].value, AttributeValue::Bytes(epc.to_vec()));
        assert_eq!(report.children[1].value, AttributeValue::Unsigned(1));
        assert_eq!(report.children[2].value, AttributeValue::Unsigned(0xc8));
        assert_eq!(
            report.children[3].value,
            AttributeValue::Namespaced {
                key: layout::VENDOR_IMPINJ,
                inner: Box::new(AttributeValue::Namespaced {
                    key: layout::IMPINJ_PEAK_RSSI,
                    inner: Box::new(AttributeValue::Unsigned(0xfc18)),
                }),
            }
        );
        assert_eq!(msg.output.end_offset, bytes.len());
    }

    #[test]
    fn llrp_status_keeps_code_description_and_errors() {
        let body = [
            0x01, 0x1f, 0x00, 0x13, // LLRPStatus, 19 bytes
            0x00, 0x65, 0x00, 0x03, b'b', b'a', b'd', //
            0x01, 0x20, 0x00, 0x08, 0x00, 0x02, 0x00, 0x05, // FieldError
        ];
        let bytes = message(layout::MSG_ERROR_MESSAGE, &[], &body);
        let msg = decode_llrp_message(&bytes, &ctx()).unwrap();
        assert!(msg.output.diagnostics.is_empty());
        let status = &msg.output.tree[0];
        assert_eq!(
            status.value,
            AttributeValue::Namespaced {
                key: 101,
                inner: Box::new(AttributeValue::Text("bad".to_string())),
            }
        );
        assert_eq!(status.children[0].type_code, layout::PARAM_FIELD_ERROR);
    }

    #[test]
    fn ro_spec_prefix_is_kept_as_value() {
        let prefix = [0, 0, 0, 9, 0, 0];
        let body = encode(&[bytes_leaf(layout::PARAM_RO_SPEC, &prefix)]);
        let bytes = message(layout::MSG_ADD_ROSPEC, &[], &body);
        let msg = decode_llrp_message(&bytes, &ctx()).unwrap();
        assert_eq!(msg.output.tree[0].value, AttributeValue::Bytes(prefix.to_vec()));
        assert!(msg.output.tree[0].children.is_empty());
        assert!(msg.output.diagnostics.is_empty());
    }

    #[test]
    fn fixed_message_fields_precede_parameters() {
        let fixed = [0x00, 0x00, 0x65, 0x1a, 0x02];
        let body = encode(&[implicit_leaf(u32::from(layout::TV_RO_SPEC_ID), &[0, 0, 0, 3])]);
        let bytes = message(layout::MSG_CUSTOM_MESSAGE, &fixed, &body);
        let msg = decode_llrp_message(&bytes, &ctx()).unwrap();
        assert_eq!(msg.fixed_body, fixed.to_vec());
        assert_eq!(msg.output.tree[0].value, AttributeValue::Unsigned(3));
        assert_eq!(msg.output.tree[0].span.start, 15);
    }

    #[test]
    fn tv_type_without_length_entry_stops_the_level() {
        let body = [0x81, 0x00, 0x02, 0x95, 0xff];
        let bytes = message(layout::MSG_RO_ACCESS_REPORT, &[], &body);
        let msg = decode_llrp_message(&bytes, &ctx()).unwrap();
        assert_eq!(msg.output.tree.len(), 1);
        assert_eq!(msg.output.count(DiagnosticKind::MalformedHeader), 1);
        assert_eq!(msg.output.diagnostics[0].offset, 13);
    }

    #[test]
    fn overlong_parameter_is_clamped_to_message() {
        let body = [0x00, 0xc8, 0x00, 0x14, 0, 0, 0, 0];
        let bytes = message(layout::MSG_KEEPALIVE, &[], &body);
        let msg = decode_llrp_message(&bytes, &ctx()).unwrap();
        assert_eq!(msg.output.tree.len(), 1);
        assert_eq!(msg.output.tree[0].span, 10..18);
        assert_eq!(msg.output.diagnostics.len(), 1);
        assert_eq!(msg.output.count(DiagnosticKind::LengthMismatch), 1);
        assert!(msg.output.tree[0].value.is_opaque());
    }
}
