//! Built-in handlers shared by the protocol profiles.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use super::diagnostics::DiagnosticKind;
use super::dispatch::{Handler, HandlerOutput, RecordView, TypeDispatchTable};
use super::format::FieldWidth;
use super::tree::AttributeValue;
use super::walker::DecodeScope;

/// Keeps the value as raw bytes; the default for unknown types.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueHandler;

impl Handler for OpaqueHandler {
    fn decode(&self, view: &RecordView<'_>, _scope: &mut DecodeScope<'_>) -> HandlerOutput {
        HandlerOutput::opaque(view)
    }
}

/// Known type whose value is a byte string.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesHandler;

impl Handler for BytesHandler {
    fn decode(&self, view: &RecordView<'_>, _scope: &mut DecodeScope<'_>) -> HandlerOutput {
        HandlerOutput::value(AttributeValue::Bytes(view.value.to_vec()), view.len())
    }
}

/// Unsigned integer in the record's byte order.
///
/// A fixed width reads exactly that many bytes and leaves the rest for the
/// walker to flag; `any_width` takes the whole value (1..=8 bytes).
#[derive(Debug, Clone, Copy)]
pub struct UnsignedHandler {
    width: Option<usize>,
}

impl UnsignedHandler {
    pub fn fixed(width: usize) -> Self {
        Self { width: Some(width) }
    }

    pub fn any_width() -> Self {
        Self { width: None }
    }
}

impl Handler for UnsignedHandler {
    fn decode(&self, view: &RecordView<'_>, scope: &mut DecodeScope<'_>) -> HandlerOutput {
        let width = self.width.unwrap_or(view.len());
        if view.len() < width {
            let needed = width;
            scope.report(
                DiagnosticKind::OutOfBounds,
                view.offset,
                format!(
                    "type {} needs a {needed}-byte integer, {} available",
                    view.type_code,
                    view.len()
                ),
            );
            return HandlerOutput::opaque(view);
        }
        match view.cursor().read_uint(0, width, view.byte_order) {
            Ok(value) => HandlerOutput::value(AttributeValue::Unsigned(value), width),
            Err(_) => {
                scope.report(
                    DiagnosticKind::LengthMismatch,
                    view.offset,
                    format!(
                        "type {} has a {width}-byte value, not an integer width",
                        view.type_code
                    ),
                );
                HandlerOutput::opaque(view)
            }
        }
    }
}

/// NUL-padded text; invalid UTF-8 is replaced, not rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextHandler;

impl Handler for TextHandler {
    fn decode(&self, view: &RecordView<'_>, _scope: &mut DecodeScope<'_>) -> HandlerOutput {
        let raw = String::from_utf8_lossy(view.value);
        let text = raw.trim_end_matches('\0').to_string();
        HandlerOutput::value(AttributeValue::Text(text), view.len())
    }
}

/// IPv4 (4 bytes) or IPv6 (16 bytes) address in network order.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressHandler;

impl Handler for AddressHandler {
    fn decode(&self, view: &RecordView<'_>, scope: &mut DecodeScope<'_>) -> HandlerOutput {
        let address = match view.value.len() {
            4 => <[u8; 4]>::try_from(view.value)
                .ok()
                .map(|octets| IpAddr::V4(Ipv4Addr::from(octets))),
            16 => <[u8; 16]>::try_from(view.value)
                .ok()
                .map(|octets| IpAddr::V6(Ipv6Addr::from(octets))),
            _ => None,
        };
        match address {
            Some(address) => HandlerOutput::value(AttributeValue::Address(address), view.len()),
            None => {
                scope.report(
                    DiagnosticKind::LengthMismatch,
                    view.offset,
                    format!(
                        "type {} address of {} bytes is neither IPv4 nor IPv6",
                        view.type_code,
                        view.len()
                    ),
                );
                HandlerOutput::opaque(view)
            }
        }
    }
}

/// Value is a nested list of records, dispatched through its own table.
#[derive(Debug, Clone)]
pub struct NestedHandler {
    table: Arc<TypeDispatchTable>,
    skip: usize,
}

impl NestedHandler {
    pub fn new(table: Arc<TypeDispatchTable>) -> Self {
        Self { table, skip: 0 }
    }

    /// Fixed-size prefix before the nested records, kept as the value bytes.
    pub fn with_prefix(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }
}

impl Handler for NestedHandler {
    fn decode(&self, view: &RecordView<'_>, scope: &mut DecodeScope<'_>) -> HandlerOutput {
        if view.len() < self.skip {
            scope.report(
                DiagnosticKind::OutOfBounds,
                view.offset,
                format!(
                    "type {} needs a {}-byte prefix, {} available",
                    view.type_code,
                    self.skip,
                    view.len()
                ),
            );
            return HandlerOutput::opaque(view);
        }
        let body = view.tail(self.skip);
        let Some(nested) = scope.walk_nested(&body, &self.table) else {
            return HandlerOutput::opaque(view);
        };
        let mut output = HandlerOutput::nested(nested.children, self.skip + nested.consumed);
        if self.skip > 0 {
            output.value = AttributeValue::Bytes(view.value[..self.skip].to_vec());
        }
        output
    }
}

/// Reads a secondary discriminator and re-dispatches the remaining bytes.
///
/// Chaining two of these models vendor id → vendor subtype dispatch. The
/// discriminator is pushed on the context's namespace stack while the inner
/// handler runs.
#[derive(Clone)]
pub struct NamespaceHandler {
    key_width: FieldWidth,
    namespaces: HashMap<u64, Arc<dyn Handler>>,
}

impl NamespaceHandler {
    pub fn new(key_width: FieldWidth) -> Self {
        Self {
            key_width,
            namespaces: HashMap::new(),
        }
    }

    pub fn register(mut self, key: u64, handler: impl Handler + 'static) -> Self {
        self.namespaces.insert(key, Arc::new(handler));
        self
    }

    pub fn contains(&self, key: u64) -> bool {
        self.namespaces.contains_key(&key)
    }
}

impl std::fmt::Debug for NamespaceHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.namespaces.keys().copied().collect();
        keys.sort_unstable();
        f.debug_struct("NamespaceHandler")
            .field("key_width", &self.key_width)
            .field("keys", &keys)
            .finish()
    }
}

impl Handler for NamespaceHandler {
    fn decode(&self, view: &RecordView<'_>, scope: &mut DecodeScope<'_>) -> HandlerOutput {
        let width = self.key_width.bytes();
        let cursor = view.cursor();
        let key = match self.key_width {
            FieldWidth::U8 => cursor.read_u8(0).map(u64::from),
            FieldWidth::U16 => cursor.read_u16(0, view.byte_order).map(u64::from),
            FieldWidth::U32 => cursor.read_u32(0, view.byte_order).map(u64::from),
        };
        let key = match key {
            Ok(key) => key,
            Err(err) => {
                scope.cursor_error(&err);
                return HandlerOutput::opaque(view);
            }
        };

        let rest = view.tail(width);
        let inner = match self.namespaces.get(&key) {
            Some(handler) => scope.with_namespace(key, |scope| handler.decode(&rest, scope)),
            None => {
                if scope.ctx().report_unknown {
                    scope.report(
                        DiagnosticKind::UnknownType,
                        view.offset,
                        format!("type {} namespace {key} not registered", view.type_code),
                    );
                }
                HandlerOutput::opaque(&rest)
            }
        };

        HandlerOutput {
            value: AttributeValue::Namespaced {
                key,
                inner: Box::new(inner.value),
            },
            children: inner.children,
            consumed: width + inner.consumed.min(rest.len()),
        }
    }
}

/// Body of a schema-driven data record.
///
/// The record's type code is the template id; the template is looked up
/// under the context's source key. A missing template leaves the body opaque
/// and reports `UnresolvedTemplate`.
#[derive(Debug, Clone)]
pub struct TemplateDataHandler {
    fields: Arc<TypeDispatchTable>,
}

impl TemplateDataHandler {
    pub fn new(fields: Arc<TypeDispatchTable>) -> Self {
        Self { fields }
    }
}

impl Handler for TemplateDataHandler {
    fn decode(&self, view: &RecordView<'_>, scope: &mut DecodeScope<'_>) -> HandlerOutput {
        let template_id = u16::try_from(view.type_code).unwrap_or(u16::MAX);
        let template = match (scope.templates(), scope.ctx().source_key.as_ref()) {
            (Some(cache), Some(source)) => cache.lookup(template_id, source),
            _ => None,
        };

        let Some(template) = template else {
            let source = scope
                .ctx()
                .source_key
                .as_ref()
                .map(|key| key.to_string())
                .unwrap_or_else(|| "<none>".to_string());
            scope.report(
                DiagnosticKind::UnresolvedTemplate,
                view.offset,
                format!("template {template_id} not defined for source {source}"),
            );
            return HandlerOutput::value(
                AttributeValue::Unresolved {
                    template_id,
                    bytes: view.value.to_vec(),
                },
                view.len(),
            );
        };

        match scope.walk_template(view, &template, &self.fields) {
            Some(records) => HandlerOutput::nested(records.children, records.consumed),
            None => HandlerOutput::opaque(view),
        }
    }
}
