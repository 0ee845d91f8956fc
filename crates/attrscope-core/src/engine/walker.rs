//! Record walker.
//!
//! Each nesting level runs the same state machine:
//! `Start → ReadHeader → Dispatch → Advance → {Start | Done | Fatal}`.
//! `Fatal` stops the current level only; attributes already decoded at that
//! level are kept and the parent continues with its next sibling.

use tracing::trace;

use super::context::{ByteOrder, DecodeContext};
use super::cursor::ByteCursor;
use super::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticsSink};
use super::error::CursorError;
use super::dispatch::{HandlerOutput, RecordView, TypeDispatchTable};
use super::format::{FieldOrder, FieldWidth, RecordFormat};
use super::template::{SharedTemplateCache, Template};
use super::tree::{Attribute, AttributeValue, HeaderForm, TreeBuilder};

/// Trailing zero bytes shorter than this after template records are padding.
pub const TEMPLATE_PADDING_LIMIT: usize = 4;

/// Result of one top-level decode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutput {
    pub tree: Vec<Attribute>,
    pub diagnostics: Vec<Diagnostic>,
    /// Offset where the walk stopped; equals `end_offset` unless a level
    /// went `Fatal`.
    pub end_offset: usize,
}

impl DecodeOutput {
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}

/// Children produced by a nested walk, with the value bytes they covered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedOutput {
    pub children: Vec<Attribute>,
    pub consumed: usize,
}

/// Drives header reads, dispatch and recursion for one record format.
///
/// # Examples
/// ```
/// use attrscope_core::engine::{AttributeWalker, ByteOrder, DecodeContext, TypeDispatchTable};
/// use attrscope_core::protocols::netlink::netlink_format;
///
/// let format = netlink_format();
/// let walker = AttributeWalker::new(&format);
/// let buffer = [0x08, 0x00, 0x01, 0x00, b'a', b'b', b'c', b'd'];
/// let ctx = DecodeContext::new(ByteOrder::Little);
/// let out = walker.walk(&buffer, 0, buffer.len(), &ctx, &TypeDispatchTable::new());
/// assert_eq!(out.tree.len(), 1);
/// assert_eq!(out.end_offset, 8);
/// assert!(out.diagnostics.is_empty());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AttributeWalker<'w> {
    format: &'w RecordFormat,
    templates: Option<&'w SharedTemplateCache>,
}

impl<'w> AttributeWalker<'w> {
    pub fn new(format: &'w RecordFormat) -> Self {
        Self {
            format,
            templates: None,
        }
    }

    /// Make a template cache available to schema-driven handlers.
    pub fn with_templates(mut self, templates: &'w SharedTemplateCache) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Decode `buffer[start_offset..end_offset]` as a list of records.
    ///
    /// Never fails: anomalies are returned as diagnostics.
    pub fn walk(
        &self,
        buffer: &[u8],
        start_offset: usize,
        end_offset: usize,
        ctx: &DecodeContext,
        dispatch: &TypeDispatchTable,
    ) -> DecodeOutput {
        let mut sink = DiagnosticsSink::new();
        let cursor = bounded_cursor(buffer, start_offset, end_offset, &mut sink);
        let start = cursor.base();
        let mut scope = DecodeScope {
            ctx,
            format: self.format,
            templates: self.templates,
            sink: &mut sink,
            depth: 0,
            truncated: false,
        };
        let level = walk_level(cursor, dispatch, &mut scope);
        DecodeOutput {
            tree: level.attributes,
            diagnostics: sink.into_vec(),
            end_offset: start + level.end,
        }
    }

    /// Decode `buffer[start_offset..end_offset]` as back-to-back records of
    /// `template`, with field values resolved through `fields`.
    pub fn walk_template(
        &self,
        buffer: &[u8],
        start_offset: usize,
        end_offset: usize,
        ctx: &DecodeContext,
        template: &Template,
        fields: &TypeDispatchTable,
    ) -> DecodeOutput {
        let mut sink = DiagnosticsSink::new();
        let cursor = bounded_cursor(buffer, start_offset, end_offset, &mut sink);
        let start = cursor.base();
        let mut scope = DecodeScope {
            ctx,
            format: self.format,
            templates: self.templates,
            sink: &mut sink,
            depth: 0,
            truncated: false,
        };
        let level = walk_template_level(cursor, template, fields, &mut scope);
        if level.end < cursor.len() {
            let trailing = cursor.len() - level.end;
            scope.report(
                DiagnosticKind::LengthMismatch,
                start + level.end,
                format!(
                    "{trailing} unconsumed trailing bytes after records of template {}",
                    template.id
                ),
            );
        }
        DecodeOutput {
            tree: level.attributes,
            diagnostics: sink.into_vec(),
            end_offset: start + level.end,
        }
    }
}

/// Handler-side access to recursion, templates and diagnostics.
pub struct DecodeScope<'s> {
    ctx: &'s DecodeContext,
    format: &'s RecordFormat,
    templates: Option<&'s SharedTemplateCache>,
    sink: &'s mut DiagnosticsSink,
    depth: usize,
    /// Set while decoding the value of a record the walker already clamped.
    truncated: bool,
}

impl<'s> DecodeScope<'s> {
    pub fn ctx(&self) -> &DecodeContext {
        self.ctx
    }

    pub fn templates(&self) -> Option<&'s SharedTemplateCache> {
        self.templates
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether the enclosing record was cut short by the walker.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Append a diagnostic.
    ///
    /// Inside a clamped record the walker has already reported the
    /// shortfall, so bounds, length and header complaints that follow from
    /// it are dropped.
    pub fn report(&mut self, kind: DiagnosticKind, offset: usize, detail: impl Into<String>) {
        if self.truncated && kind.follows_truncation() {
            trace!(%kind, offset, "diagnostic inside clamped record dropped");
            return;
        }
        self.sink.push(kind, offset, detail);
    }

    /// Report a failed cursor read inside a handler.
    pub fn cursor_error(&mut self, err: &CursorError) {
        match err {
            CursorError::OutOfBounds { offset, .. } => {
                self.report(DiagnosticKind::OutOfBounds, *offset, err.to_string());
            }
        }
    }

    /// Walk the view's bytes as child records dispatched through `table`.
    ///
    /// Returns `None` (after reporting) when the nesting limit is reached.
    pub fn walk_nested(
        &mut self,
        view: &RecordView<'_>,
        table: &TypeDispatchTable,
    ) -> Option<NestedOutput> {
        let mut child = self.enter(view.offset)?;
        let level = walk_level(view.cursor(), table, &mut child);
        Some(NestedOutput {
            children: level.attributes,
            consumed: level.end,
        })
    }

    /// Walk the view's bytes as records laid out by `template`.
    ///
    /// Trailing bytes that are not padding are left unconsumed so the caller
    /// reports them once.
    pub fn walk_template(
        &mut self,
        view: &RecordView<'_>,
        template: &Template,
        fields: &TypeDispatchTable,
    ) -> Option<NestedOutput> {
        let mut child = self.enter(view.offset)?;
        let level = walk_template_level(view.cursor(), template, fields, &mut child);
        Some(NestedOutput {
            children: level.attributes,
            consumed: level.end,
        })
    }

    /// Run `f` with `code` pushed on the namespace stack.
    pub fn with_namespace<R>(&mut self, code: u64, f: impl FnOnce(&mut DecodeScope<'_>) -> R) -> R {
        let ctx = self.ctx.with_namespace(code);
        let mut scope = DecodeScope {
            ctx: &ctx,
            format: self.format,
            templates: self.templates,
            sink: &mut *self.sink,
            depth: self.depth,
            truncated: self.truncated,
        };
        f(&mut scope)
    }

    fn enter(&mut self, offset: usize) -> Option<DecodeScope<'_>> {
        let depth = self.depth + 1;
        if depth > self.ctx.max_nesting_depth {
            self.sink.push(
                DiagnosticKind::MalformedHeader,
                offset,
                format!(
                    "nesting depth {depth} exceeds limit {}; branch left opaque",
                    self.ctx.max_nesting_depth
                ),
            );
            return None;
        }
        Some(DecodeScope {
            ctx: self.ctx,
            format: self.format,
            templates: self.templates,
            sink: &mut *self.sink,
            depth,
            truncated: self.truncated,
        })
    }
}

struct LevelOutput {
    attributes: Vec<Attribute>,
    /// Offset reached, relative to the level's cursor.
    end: usize,
}

#[derive(Debug, Clone, Copy)]
struct RecordHeader {
    type_code: u32,
    flags: u32,
    form: HeaderForm,
    header_len: usize,
    declared_len: usize,
}

enum Step {
    Start,
    ReadHeader,
    Dispatch(RecordHeader),
    Advance(usize),
    Done,
    Fatal,
}

fn bounded_cursor<'a>(
    buffer: &'a [u8],
    start_offset: usize,
    end_offset: usize,
    sink: &mut DiagnosticsSink,
) -> ByteCursor<'a> {
    let end = end_offset.min(buffer.len());
    if end_offset > buffer.len() {
        sink.push(
            DiagnosticKind::OutOfBounds,
            buffer.len(),
            format!(
                "end offset {end_offset} beyond buffer of {} bytes; clamped",
                buffer.len()
            ),
        );
    }
    let start = start_offset.min(end);
    let view = buffer.get(start..end).unwrap_or_default();
    ByteCursor::with_base(view, start)
}

fn walk_level(
    cursor: ByteCursor<'_>,
    table: &TypeDispatchTable,
    scope: &mut DecodeScope<'_>,
) -> LevelOutput {
    let end = cursor.len();
    let min_header = scope.format.min_header_len();
    let mut offset = 0usize;
    let mut tree = TreeBuilder::new();
    let mut step = Step::Start;

    loop {
        step = match step {
            Step::Start => {
                let remaining = end - offset;
                if remaining == 0 {
                    Step::Done
                } else if remaining < min_header {
                    scope.report(
                        DiagnosticKind::MalformedHeader,
                        cursor.base() + offset,
                        format!(
                            "{remaining} trailing bytes cannot hold a {min_header}-byte header"
                        ),
                    );
                    Step::Fatal
                } else {
                    Step::ReadHeader
                }
            }
            Step::ReadHeader => match read_header(&cursor, offset, scope) {
                Ok(header) => Step::Dispatch(header),
                Err(detail) => {
                    scope.report(
                        DiagnosticKind::MalformedHeader,
                        cursor.base() + offset,
                        detail,
                    );
                    Step::Fatal
                }
            },
            Step::Dispatch(header) => {
                let attribute = dispatch_record(&cursor, offset, header, table, scope);
                let next = offset + attribute.span.len() + attribute.padding;
                tree.push(attribute);
                Step::Advance(next)
            }
            Step::Advance(next) => {
                offset = next.max(offset + 1).min(end);
                Step::Start
            }
            Step::Done | Step::Fatal => break,
        };
    }

    LevelOutput {
        attributes: tree.finish(),
        end: offset,
    }
}

fn read_header(
    cursor: &ByteCursor<'_>,
    offset: usize,
    scope: &DecodeScope<'_>,
) -> Result<RecordHeader, String> {
    let format = scope.format;
    let first = cursor.read_u8(offset).map_err(|e| e.to_string())?;

    if let Some(implicit) = format.implicit.as_ref().filter(|i| i.matches(first)) {
        let type_code = first & implicit.type_mask;
        let value_len = implicit
            .value_len(type_code)
            .ok_or_else(|| format!("implicit-length type {type_code} has no length entry"))?;
        return Ok(RecordHeader {
            type_code: u32::from(type_code),
            flags: 0,
            form: HeaderForm::Implicit,
            header_len: 1,
            declared_len: 1 + value_len,
        });
    }

    let explicit = &format.explicit;
    let min_len = explicit.min_len();
    let remaining = cursor.remaining(offset);
    if remaining < min_len {
        return Err(format!(
            "need {min_len} header bytes, {remaining} available"
        ));
    }

    let order = format.header_order(scope.ctx.byte_order);
    let (type_at, length_at) = match explicit.order {
        FieldOrder::TypeFirst => (offset, offset + explicit.type_width.bytes()),
        FieldOrder::LengthFirst => (offset + explicit.length_width.bytes(), offset),
    };
    let raw_type = read_width(cursor, type_at, explicit.type_width, order)?;
    let raw_len = read_width(cursor, length_at, explicit.length_width, order)? as usize;

    if raw_len < min_len {
        return Err(format!(
            "declared length {raw_len} is below the {min_len}-byte header"
        ));
    }

    Ok(RecordHeader {
        type_code: raw_type & explicit.type_mask,
        flags: raw_type & explicit.flag_mask,
        form: HeaderForm::Explicit,
        header_len: min_len,
        declared_len: raw_len,
    })
}

fn read_width(
    cursor: &ByteCursor<'_>,
    offset: usize,
    width: FieldWidth,
    order: ByteOrder,
) -> Result<u32, String> {
    let value = match width {
        FieldWidth::U8 => cursor.read_u8(offset).map(u32::from),
        FieldWidth::U16 => cursor.read_u16(offset, order).map(u32::from),
        FieldWidth::U32 => cursor.read_u32(offset, order),
    };
    value.map_err(|e| e.to_string())
}

fn dispatch_record(
    cursor: &ByteCursor<'_>,
    offset: usize,
    header: RecordHeader,
    table: &TypeDispatchTable,
    scope: &mut DecodeScope<'_>,
) -> Attribute {
    let base = cursor.base();
    let available = cursor.remaining(offset);
    let mut record_len = header.declared_len;
    let clamped = record_len > available;
    if clamped {
        scope.report(
            DiagnosticKind::LengthMismatch,
            base + offset,
            format!(
                "type {} declares {} bytes, {available} remain; clamped",
                header.type_code, header.declared_len
            ),
        );
        record_len = available;
    }

    let value_start = offset + header.header_len;
    let value = cursor
        .read_slice(value_start..offset + record_len)
        .unwrap_or_default();
    let view = RecordView {
        type_code: header.type_code,
        flags: header.flags,
        offset: base + value_start,
        value,
        byte_order: value_order(scope, header.flags),
    };

    let outer_truncated = scope.truncated;
    scope.truncated |= clamped;
    let output = match table.lookup(header.type_code) {
        Some(handler) => handler.decode(&view, scope),
        None => {
            if scope.ctx.report_unknown {
                scope.report(
                    DiagnosticKind::UnknownType,
                    base + offset,
                    format!("no handler for type {}; kept opaque", header.type_code),
                );
            }
            HandlerOutput::opaque(&view)
        }
    };

    let consumed = output.consumed.min(view.len());
    if consumed != view.len() {
        scope.report(
            DiagnosticKind::LengthMismatch,
            view.offset + consumed,
            format!(
                "type {} consumed {consumed} of {} value bytes; {} unconsumed trailing bytes",
                header.type_code,
                view.len(),
                view.len() - consumed
            ),
        );
    }
    scope.truncated = outer_truncated;

    let padding = match header.form {
        HeaderForm::Explicit => {
            scope.format.explicit.align(record_len).min(available) - record_len
        }
        _ => 0,
    };

    trace!(
        type_code = header.type_code,
        offset = base + offset,
        declared = header.declared_len,
        consumed = header.header_len + consumed,
        depth = scope.depth,
        "decoded record"
    );

    Attribute {
        type_code: header.type_code,
        flags: header.flags,
        form: header.form,
        declared_len: header.declared_len,
        header_len: header.header_len,
        consumed_len: header.header_len + consumed,
        span: base + offset..base + offset + record_len,
        padding,
        value: output.value,
        children: output.children,
    }
}

fn value_order(scope: &DecodeScope<'_>, flags: u32) -> ByteOrder {
    let explicit = &scope.format.explicit;
    match explicit.network_order_flag {
        Some(flag) if flags & flag != 0 => ByteOrder::Big,
        _ => explicit.byte_order.unwrap_or(scope.ctx.byte_order),
    }
}

fn walk_template_level(
    cursor: ByteCursor<'_>,
    template: &Template,
    fields: &TypeDispatchTable,
    scope: &mut DecodeScope<'_>,
) -> LevelOutput {
    let record_len = template.record_len;
    let mut tree = TreeBuilder::new();
    if record_len == 0 {
        scope.report(
            DiagnosticKind::MalformedHeader,
            cursor.base(),
            format!("template {} describes zero-length records", template.id),
        );
        return LevelOutput {
            attributes: Vec::new(),
            end: 0,
        };
    }

    let mut offset = 0usize;
    while cursor.remaining(offset) >= record_len {
        let record = decode_template_record(&cursor, offset, template, fields, scope);
        tree.push(record);
        offset += record_len;
    }

    let mut attributes = tree.finish();
    let trailing = cursor.remaining(offset);
    if trailing > 0 && trailing < TEMPLATE_PADDING_LIMIT {
        let is_padding = cursor
            .read_slice(offset..offset + trailing)
            .map(|rest| rest.iter().all(|b| *b == 0))
            .unwrap_or(false);
        if is_padding {
            if let Some(last) = attributes.last_mut() {
                last.padding = trailing;
            }
            offset += trailing;
        }
    }

    LevelOutput {
        attributes,
        end: offset,
    }
}

fn decode_template_record(
    cursor: &ByteCursor<'_>,
    offset: usize,
    template: &Template,
    fields: &TypeDispatchTable,
    scope: &mut DecodeScope<'_>,
) -> Attribute {
    let base = cursor.base();
    let mut children = TreeBuilder::new();
    let mut field_offset = offset;

    for spec in &template.fields {
        let length = usize::from(spec.length);
        let value = cursor
            .read_slice(field_offset..field_offset + length)
            .unwrap_or_default();
        let view = RecordView {
            type_code: u32::from(spec.field_type),
            flags: 0,
            offset: base + field_offset,
            value,
            byte_order: scope.ctx.byte_order,
        };
        let output = match fields.lookup(view.type_code) {
            Some(handler) => handler.decode(&view, scope),
            None => HandlerOutput::opaque(&view),
        };
        let consumed = output.consumed.min(length);
        if consumed != length {
            scope.report(
                DiagnosticKind::LengthMismatch,
                view.offset + consumed,
                format!(
                    "field type {} consumed {consumed} of {length} bytes",
                    spec.field_type
                ),
            );
        }
        children.push(Attribute {
            type_code: view.type_code,
            flags: 0,
            form: HeaderForm::Template,
            declared_len: length,
            header_len: 0,
            consumed_len: consumed,
            span: view.offset..view.offset + length,
            padding: 0,
            value: output.value,
            children: output.children,
        });
        field_offset += length;
    }

    Attribute {
        type_code: u32::from(template.id),
        flags: 0,
        form: HeaderForm::Template,
        declared_len: template.record_len,
        header_len: 0,
        consumed_len: template.record_len,
        span: base + offset..base + offset + template.record_len,
        padding: 0,
        value: AttributeValue::Nested,
        children: children.finish(),
    }
}

#[cfg(test)]
mod tests {
    use super::AttributeWalker;
    use crate::engine::context::{ByteOrder, DecodeContext};
    use crate::engine::diagnostics::DiagnosticKind;
    use crate::engine::dispatch::TypeDispatchTable;
    use crate::engine::format::{ExplicitHeader, FieldOrder, FieldWidth, RecordFormat};
    use crate::engine::handlers::NestedHandler;
    use crate::engine::template::{FieldSpec, SourceKey, Template};
    use crate::engine::tree::AttributeValue;
    use std::sync::Arc;

    fn nla_format() -> RecordFormat {
        RecordFormat::explicit(ExplicitHeader {
            order: FieldOrder::LengthFirst,
            type_width: FieldWidth::U16,
            length_width: FieldWidth::U16,
            type_mask: 0x3fff,
            flag_mask: 0xc000,
            alignment: 4,
            byte_order: None,
            network_order_flag: Some(0x4000),
        })
    }

    fn le() -> DecodeContext {
        DecodeContext::new(ByteOrder::Little)
    }

    #[test]
    fn explicit_record_decodes_exactly() {
        let format = nla_format();
        let buf = [0x08, 0x00, 0x01, 0x00, b'a', b'b', b'c', b'd'];
        let out = AttributeWalker::new(&format).walk(&buf, 0, 8, &le(), &TypeDispatchTable::new());
        assert_eq!(out.tree.len(), 1);
        let attr = &out.tree[0];
        assert_eq!(attr.type_code, 1);
        assert_eq!(attr.declared_len, 8);
        assert_eq!(attr.value, AttributeValue::Opaque(b"abcd".to_vec()));
        assert_eq!(out.end_offset, 8);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn alignment_padding_is_skipped() {
        let format = nla_format();
        let buf = [
            0x05, 0x00, 0x01, 0x00, 0xaa, 0x00, 0x00, 0x00, // len 5 + 3 padding
            0x04, 0x00, 0x02, 0x00, // empty attribute
        ];
        let out = AttributeWalker::new(&format).walk(&buf, 0, buf.len(), &le(), &TypeDispatchTable::new());
        assert_eq!(out.tree.len(), 2);
        assert_eq!(out.tree[0].padding, 3);
        assert_eq!(out.tree[1].span, 8..12);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn padding_never_runs_past_end() {
        let format = nla_format();
        let buf = [0x05, 0x00, 0x01, 0x00, 0xaa];
        let out = AttributeWalker::new(&format).walk(&buf, 0, buf.len(), &le(), &TypeDispatchTable::new());
        assert_eq!(out.tree[0].padding, 0);
        assert_eq!(out.end_offset, 5);
    }

    #[test]
    fn short_declared_length_is_fatal_for_level_only() {
        let format = nla_format();
        let buf = [
            0x06, 0x00, 0x01, 0x00, 0x01, 0x02, 0x00, 0x00, // ok
            0x02, 0x00, 0x02, 0x00, // length below header
            0x04, 0x00, 0x03, 0x00,
        ];
        let out = AttributeWalker::new(&format).walk(&buf, 0, buf.len(), &le(), &TypeDispatchTable::new());
        assert_eq!(out.tree.len(), 1);
        assert_eq!(out.count(DiagnosticKind::MalformedHeader), 1);
        assert_eq!(out.diagnostics[0].offset, 8);
        assert_eq!(out.end_offset, 8);
    }

    #[test]
    fn nesting_limit_stops_recursion() {
        let format = nla_format();
        let mut table = TypeDispatchTable::new();
        let inner = Arc::new({
            let mut t = TypeDispatchTable::new();
            t.register(1, crate::engine::handlers::OpaqueHandler);
            t
        });
        table.register(1, NestedHandler::new(Arc::clone(&inner)));
        // outer(1) { inner(1) "ab" }
        let buf = [
            0x0c, 0x00, 0x01, 0x80, 0x06, 0x00, 0x01, 0x00, b'a', b'b', 0x00, 0x00,
        ];
        let ctx = le().max_nesting_depth(0);
        let out = AttributeWalker::new(&format).walk(&buf, 0, buf.len(), &ctx, &table);
        assert_eq!(out.tree.len(), 1);
        assert!(out.tree[0].value.is_opaque());
        assert_eq!(out.tree[0].flags, 0x8000);
        assert_eq!(out.count(DiagnosticKind::MalformedHeader), 1);

        let out = AttributeWalker::new(&format).walk(&buf, 0, buf.len(), &le(), &table);
        assert_eq!(out.tree[0].children.len(), 1);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn end_offset_beyond_buffer_is_clamped() {
        let format = nla_format();
        let buf = [0x04, 0x00, 0x01, 0x00];
        let out = AttributeWalker::new(&format).walk(&buf, 0, 64, &le(), &TypeDispatchTable::new());
        assert_eq!(out.tree.len(), 1);
        assert_eq!(out.count(DiagnosticKind::OutOfBounds), 1);
        assert_eq!(out.end_offset, 4);
    }

    #[test]
    fn template_walk_splits_records_and_reports_leftover() {
        let format = nla_format();
        let template = Template::new(
            300,
            SourceKey::new("A"),
            vec![FieldSpec::new(1, 2), FieldSpec::new(2, 1)],
        )
        .unwrap();
        let buf = [0, 1, 9, 0, 2, 8, 0xff, 0xff];
        let ctx = DecodeContext::new(ByteOrder::Big);
        let out = AttributeWalker::new(&format).walk_template(
            &buf,
            0,
            buf.len(),
            &ctx,
            &template,
            &TypeDispatchTable::new(),
        );
        assert_eq!(out.tree.len(), 2);
        assert_eq!(out.tree[1].children[0].span, 3..5);
        assert_eq!(out.end_offset, 6);
        assert_eq!(out.count(DiagnosticKind::LengthMismatch), 1);
    }

    #[test]
    fn template_walk_accepts_zero_padding() {
        let format = nla_format();
        let template =
            Template::new(300, SourceKey::new("A"), vec![FieldSpec::new(1, 3)]).unwrap();
        let buf = [1, 2, 3, 0];
        let ctx = DecodeContext::new(ByteOrder::Big);
        let out = AttributeWalker::new(&format).walk_template(
            &buf,
            0,
            buf.len(),
            &ctx,
            &template,
            &TypeDispatchTable::new(),
        );
        assert_eq!(out.tree.len(), 1);
        assert_eq!(out.tree[0].padding, 1);
        assert!(out.diagnostics.is_empty());
    }
}
