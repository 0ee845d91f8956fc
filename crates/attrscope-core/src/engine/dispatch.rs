//! Type-code → handler registry.
//!
//! Handlers are values: anything implementing [`Handler`], including plain
//! closures. A handler receives a [`RecordView`] bounded to the record's value
//! bytes and a [`DecodeScope`] for recursion and diagnostics, and reports how
//! many value bytes it consumed.

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use super::context::ByteOrder;
use super::cursor::ByteCursor;
use super::tree::{Attribute, AttributeValue};
use super::walker::DecodeScope;

/// Value bytes of one record, plus what the header said about them.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    pub type_code: u32,
    pub flags: u32,
    /// Absolute offset of `value[0]` in the message buffer.
    pub offset: usize,
    pub value: &'a [u8],
    /// Byte order for multi-byte values in this record.
    pub byte_order: ByteOrder,
}

impl<'a> RecordView<'a> {
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn cursor(&self) -> ByteCursor<'a> {
        ByteCursor::with_base(self.value, self.offset)
    }

    /// View of the bytes after the first `skip`, same type and flags.
    pub fn tail(&self, skip: usize) -> RecordView<'a> {
        let skip = skip.min(self.value.len());
        RecordView {
            offset: self.offset + skip,
            value: &self.value[skip..],
            ..*self
        }
    }
}

/// What a handler produced for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOutput {
    pub value: AttributeValue,
    pub children: Vec<Attribute>,
    /// Value bytes consumed (header excluded).
    pub consumed: usize,
}

impl HandlerOutput {
    pub fn value(value: AttributeValue, consumed: usize) -> Self {
        Self {
            value,
            children: Vec::new(),
            consumed,
        }
    }

    pub fn nested(children: Vec<Attribute>, consumed: usize) -> Self {
        Self {
            value: AttributeValue::Nested,
            children,
            consumed,
        }
    }

    /// Whole view kept as raw bytes.
    pub fn opaque(view: &RecordView<'_>) -> Self {
        Self::value(AttributeValue::Opaque(view.value.to_vec()), view.len())
    }
}

/// Decoder for one record type.
///
/// Implementations must only read through `view`; they never see bytes past
/// the record's end.
pub trait Handler: Send + Sync {
    fn decode(&self, view: &RecordView<'_>, scope: &mut DecodeScope<'_>) -> HandlerOutput;
}

impl<F> Handler for F
where
    F: Fn(&RecordView<'_>, &mut DecodeScope<'_>) -> HandlerOutput + Send + Sync,
{
    fn decode(&self, view: &RecordView<'_>, scope: &mut DecodeScope<'_>) -> HandlerOutput {
        self(view, scope)
    }
}

/// Pin a closure to the [`Handler`] signature.
///
/// Closures passed straight to `register` cannot infer their lifetimes from
/// the `Handler` bound; wrapping them here gives the compiler the `Fn`
/// signature to check against.
pub fn handler_fn<F>(f: F) -> F
where
    F: Fn(&RecordView<'_>, &mut DecodeScope<'_>) -> HandlerOutput + Send + Sync,
{
    f
}

/// Registry of handlers keyed by type code.
///
/// Lookup order: exact code, then registered ranges (first match), then the
/// fallback. A miss means the walker keeps the record opaque.
///
/// # Examples
/// ```
/// use attrscope_core::engine::{HandlerOutput, TypeDispatchTable, handler_fn};
/// use attrscope_core::engine::handlers::OpaqueHandler;
///
/// let mut table = TypeDispatchTable::new();
/// table.register(1, OpaqueHandler);
/// table.register_range(
///     256..=u32::from(u16::MAX),
///     handler_fn(|view, _scope| HandlerOutput::opaque(view)),
/// );
/// assert!(table.lookup(1).is_some());
/// assert!(table.lookup(300).is_some());
/// assert!(table.lookup(2).is_none());
/// ```
#[derive(Clone, Default)]
pub struct TypeDispatchTable {
    handlers: HashMap<u32, Arc<dyn Handler>>,
    ranges: Vec<(RangeInclusive<u32>, Arc<dyn Handler>)>,
    fallback: Option<Arc<dyn Handler>>,
}

impl TypeDispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_code: u32, handler: impl Handler + 'static) -> &mut Self {
        self.register_shared(type_code, Arc::new(handler))
    }

    pub fn register_shared(&mut self, type_code: u32, handler: Arc<dyn Handler>) -> &mut Self {
        self.handlers.insert(type_code, handler);
        self
    }

    pub fn register_range(
        &mut self,
        range: RangeInclusive<u32>,
        handler: impl Handler + 'static,
    ) -> &mut Self {
        self.ranges.push((range, Arc::new(handler)));
        self
    }

    pub fn set_fallback(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.fallback = Some(Arc::new(handler));
        self
    }

    pub fn lookup(&self, type_code: u32) -> Option<&Arc<dyn Handler>> {
        self.handlers
            .get(&type_code)
            .or_else(|| {
                self.ranges
                    .iter()
                    .find(|(range, _)| range.contains(&type_code))
                    .map(|(_, handler)| handler)
            })
            .or(self.fallback.as_ref())
    }

    pub fn contains(&self, type_code: u32) -> bool {
        self.lookup(type_code).is_some()
    }

    pub fn len(&self) -> usize {
        self.handlers.len() + self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty() && self.ranges.is_empty() && self.fallback.is_none()
    }
}

impl fmt::Debug for TypeDispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codes: Vec<_> = self.handlers.keys().copied().collect();
        codes.sort_unstable();
        let ranges: Vec<_> = self.ranges.iter().map(|(range, _)| range.clone()).collect();
        f.debug_struct("TypeDispatchTable")
            .field("codes", &codes)
            .field("ranges", &ranges)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
