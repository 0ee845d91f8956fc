use std::sync::Arc;

use tracing::debug;

use super::error::NetflowError;
use super::layout;
use super::reader::{NetflowHeader, NetflowReader};
use crate::engine::handlers::{
    AddressHandler, BytesHandler, TemplateDataHandler, TextHandler, UnsignedHandler,
};
use crate::engine::{
    Attribute, AttributeValue, AttributeWalker, ByteOrder, DecodeContext, DecodeOutput,
    DecodeScope, DiagnosticKind, ExplicitHeader, FieldOrder, FieldSpec, FieldWidth, Handler,
    HandlerOutput, HeaderForm, RecordFormat, RecordView, SharedTemplateCache, SourceKey,
    Template, TreeBuilder, TypeDispatchTable, handler_fn,
};

/// Flowset header rules: `id | length`, big-endian, no alignment.
pub fn netflow_format() -> RecordFormat {
    RecordFormat::explicit(ExplicitHeader {
        order: FieldOrder::TypeFirst,
        type_width: FieldWidth::U16,
        length_width: FieldWidth::U16,
        type_mask: 0xffff,
        flag_mask: 0,
        alignment: 1,
        byte_order: Some(ByteOrder::Big),
        network_order_flag: None,
    })
}

/// Handlers for common v9 field types inside data records.
pub fn netflow_fields() -> TypeDispatchTable {
    let mut fields = TypeDispatchTable::new();
    for code in [
        layout::IN_BYTES,
        layout::IN_PKTS,
        layout::FLOWS,
        layout::PROTOCOL,
        layout::SRC_TOS,
        layout::TCP_FLAGS,
        layout::L4_SRC_PORT,
        layout::SRC_MASK,
        layout::INPUT_SNMP,
        layout::L4_DST_PORT,
        layout::DST_MASK,
        layout::OUTPUT_SNMP,
        layout::SRC_AS,
        layout::DST_AS,
        layout::LAST_SWITCHED,
        layout::FIRST_SWITCHED,
    ] {
        fields.register(code, UnsignedHandler::any_width());
    }
    for code in [
        layout::IPV4_SRC_ADDR,
        layout::IPV4_DST_ADDR,
        layout::IPV4_NEXT_HOP,
        layout::BGP_IPV4_NEXT_HOP,
        layout::IPV6_SRC_ADDR,
        layout::IPV6_DST_ADDR,
        layout::IPV6_NEXT_HOP,
    ] {
        fields.register(code, AddressHandler);
    }
    fields
        .register(layout::IN_SRC_MAC, BytesHandler)
        .register(layout::OUT_DST_MAC, BytesHandler)
        .register(layout::IF_NAME, TextHandler)
        .register(layout::IF_DESC, TextHandler)
        .register(layout::SAMPLER_NAME, TextHandler);
    fields
}

/// Flowset dispatch: template and options template definitions, and
/// template-driven data flowsets.
pub fn netflow_flowsets(fields: Arc<TypeDispatchTable>) -> TypeDispatchTable {
    let mut flowsets = TypeDispatchTable::new();
    flowsets
        .register(layout::TEMPLATE_FLOWSET_ID, template_flowset(false))
        .register(layout::OPTIONS_TEMPLATE_FLOWSET_ID, template_flowset(true))
        .register_range(
            layout::MIN_DATA_FLOWSET_ID..=u32::from(u16::MAX),
            TemplateDataHandler::new(fields),
        );
    flowsets
}

struct Definition {
    id: u16,
    scope_fields: usize,
    fields: Vec<FieldSpec>,
    header_len: usize,
    len: usize,
}

fn template_flowset(options: bool) -> impl Handler {
    handler_fn(move |view, scope| {
        let header_len = if options {
            layout::OPTIONS_TEMPLATE_HEADER_LEN
        } else {
            layout::TEMPLATE_HEADER_LEN
        };
        let mut definitions = TreeBuilder::new();
        let mut offset = 0usize;

        while view.len() - offset >= header_len {
            let definition = match read_definition(view, offset, options) {
                Ok(definition) => definition,
                Err(detail) => {
                    // Later definitions cannot be located; drop the rest.
                    scope.report(DiagnosticKind::MalformedHeader, view.offset + offset, detail);
                    offset = view.len();
                    break;
                }
            };
            register(scope, &definition, view.offset + offset);
            definitions.push(Attribute {
                type_code: u32::from(definition.id),
                flags: 0,
                form: HeaderForm::Explicit,
                declared_len: definition.len,
                header_len: definition.header_len,
                consumed_len: definition.len,
                span: view.offset + offset..view.offset + offset + definition.len,
                padding: 0,
                value: AttributeValue::TemplateDefinition {
                    template_id: definition.id,
                    scope_field_count: definition.scope_fields,
                    fields: definition.fields,
                },
                children: Vec::new(),
            });
            offset += definition.len;
        }

        let mut definitions = definitions.finish();
        let trailing = &view.value[offset..];
        if !trailing.is_empty()
            && trailing.len() < layout::FIELD_SPEC_LEN
            && trailing.iter().all(|b| *b == 0)
        {
            if let Some(last) = definitions.last_mut() {
                last.padding = trailing.len();
            }
            offset = view.len();
        }
        HandlerOutput::nested(definitions, offset)
    })
}

fn read_definition(
    view: &RecordView<'_>,
    offset: usize,
    options: bool,
) -> Result<Definition, String> {
    let cursor = view.cursor();
    let order = view.byte_order;
    let read = |at: usize| cursor.read_u16(at, order).map_err(|e| e.to_string());

    let id = read(offset)?;
    let (header_len, count, scope_fields) = if options {
        let scope_len = usize::from(read(offset + 2)?);
        let option_len = usize::from(read(offset + 4)?);
        if scope_len % layout::FIELD_SPEC_LEN != 0 || option_len % layout::FIELD_SPEC_LEN != 0 {
            return Err(format!(
                "options template {id}: scope length {scope_len} and option length {option_len} must be multiples of {}",
                layout::FIELD_SPEC_LEN
            ));
        }
        (
            layout::OPTIONS_TEMPLATE_HEADER_LEN,
            (scope_len + option_len) / layout::FIELD_SPEC_LEN,
            scope_len / layout::FIELD_SPEC_LEN,
        )
    } else {
        (layout::TEMPLATE_HEADER_LEN, usize::from(read(offset + 2)?), 0)
    };

    let len = header_len + count * layout::FIELD_SPEC_LEN;
    let available = view.len() - offset;
    if len > available {
        return Err(format!(
            "template {id} declares {count} fields ({len} bytes), {available} remain; not registered"
        ));
    }

    let fields = (0..count)
        .map(|i| -> Result<FieldSpec, String> {
            let at = offset + header_len + i * layout::FIELD_SPEC_LEN;
            Ok(FieldSpec::new(read(at)?, read(at + 2)?))
        })
        .collect::<Result<Vec<_>, String>>()?;
    Ok(Definition {
        id,
        scope_fields,
        fields,
        header_len,
        len,
    })
}

fn register(scope: &mut DecodeScope<'_>, definition: &Definition, offset: usize) {
    let id = definition.id;
    if u32::from(id) < layout::MIN_DATA_FLOWSET_ID {
        scope.report(
            DiagnosticKind::MalformedHeader,
            offset,
            format!("template id {id} is reserved; not registered"),
        );
        return;
    }
    let (Some(cache), Some(source)) = (scope.templates(), scope.ctx().source_key.clone()) else {
        debug!(id, "no template cache or source in scope; definition not registered");
        return;
    };
    match Template::new(id, source, definition.fields.clone()) {
        Ok(template) => {
            cache.insert(template.with_scope_fields(definition.scope_fields));
        }
        Err(err) => scope.report(
            DiagnosticKind::MalformedHeader,
            offset,
            format!("{err}; not registered"),
        ),
    }
}

/// One decoded export packet.
#[derive(Debug, Clone)]
pub struct NetflowPacket {
    pub header: NetflowHeader,
    pub exported_at: Option<String>,
    pub source: SourceKey,
    /// Template definitions and data records found in the flowsets.
    pub records: usize,
    pub output: DecodeOutput,
}

/// Decoding state for one collector.
///
/// The session owns the template cache; clones share it, so one session can
/// be handed to several threads decoding different exporters.
#[derive(Debug, Clone)]
pub struct NetflowSession {
    templates: SharedTemplateCache,
    flowsets: Arc<TypeDispatchTable>,
    ctx: DecodeContext,
}

impl Default for NetflowSession {
    fn default() -> Self {
        Self::new()
    }
}

impl NetflowSession {
    pub fn new() -> Self {
        Self::with_templates(SharedTemplateCache::new())
    }

    pub fn with_templates(templates: SharedTemplateCache) -> Self {
        Self {
            templates,
            flowsets: Arc::new(netflow_flowsets(Arc::new(netflow_fields()))),
            ctx: DecodeContext::new(ByteOrder::Big),
        }
    }

    /// Decode options (depth limit, unknown-type reporting). Byte order is
    /// always big-endian.
    pub fn with_context(mut self, ctx: DecodeContext) -> Self {
        self.ctx = DecodeContext {
            byte_order: ByteOrder::Big,
            ..ctx
        };
        self
    }

    pub fn templates(&self) -> &SharedTemplateCache {
        &self.templates
    }

    pub fn reset(&self) {
        self.templates.reset();
    }

    /// Decode one export packet received from `exporter`.
    ///
    /// Templates are scoped to `(exporter, header.source_id)`.
    pub fn decode_packet(
        &self,
        exporter: &str,
        buffer: &[u8],
    ) -> Result<NetflowPacket, NetflowError> {
        let header = NetflowReader::new(buffer).header()?;
        let source = SourceKey::new(exporter).with_domain(header.source_id);
        let ctx = self
            .ctx
            .clone()
            .protocol_version(header.version)
            .source_key(source.clone());

        let format = netflow_format();
        let output = AttributeWalker::new(&format)
            .with_templates(&self.templates)
            .walk(buffer, layout::PACKET_HEADER_LEN, buffer.len(), &ctx, &self.flowsets);

        let records = output.tree.iter().map(|flowset| flowset.children.len()).sum();
        if records != usize::from(header.count) {
            debug!(
                announced = header.count,
                decoded = records,
                source = %source,
                "record count differs from packet header"
            );
        }
        Ok(NetflowPacket {
            exported_at: header.exported_at(),
            header,
            source,
            records,
            output,
        })
    }
}
