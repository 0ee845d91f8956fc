use serde::{Deserialize, Serialize};

use super::template::SourceKey;

/// Default bound on nested attribute groups.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 16;

/// Byte order used for multi-byte header and value fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

impl ByteOrder {
    /// Byte order of the machine running the decoder.
    pub fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }
}

/// Per-call decode configuration.
///
/// A context is created for each top-level decode and passed by reference.
/// Handlers that open a namespace derive a child context with
/// [`DecodeContext::with_namespace`] instead of mutating the parent.
///
/// # Examples
/// ```
/// use attrscope_core::engine::{ByteOrder, DecodeContext};
///
/// let ctx = DecodeContext::new(ByteOrder::Little).max_nesting_depth(4);
/// let vendor = ctx.with_namespace(25882);
/// assert_eq!(vendor.namespace_stack, vec![25882]);
/// assert!(ctx.namespace_stack.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeContext {
    pub byte_order: ByteOrder,
    pub protocol_version: u16,
    /// Outer discriminators (vendor id, subtype, ...) that led to the
    /// current record, outermost first.
    pub namespace_stack: Vec<u64>,
    pub max_nesting_depth: usize,
    /// Identity of the stream feeding schema-driven records.
    pub source_key: Option<SourceKey>,
    /// Emit `UnknownType` diagnostics for opaque fallbacks.
    pub report_unknown: bool,
}

impl Default for DecodeContext {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::Big,
            protocol_version: 0,
            namespace_stack: Vec::new(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            source_key: None,
            report_unknown: false,
        }
    }
}

impl DecodeContext {
    pub fn new(byte_order: ByteOrder) -> Self {
        Self {
            byte_order,
            ..Self::default()
        }
    }

    pub fn protocol_version(mut self, version: u16) -> Self {
        self.protocol_version = version;
        self
    }

    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn source_key(mut self, key: SourceKey) -> Self {
        self.source_key = Some(key);
        self
    }

    pub fn report_unknown(mut self, enabled: bool) -> Self {
        self.report_unknown = enabled;
        self
    }

    /// Child context with `code` pushed on the namespace stack.
    pub fn with_namespace(&self, code: u64) -> Self {
        let mut child = self.clone();
        child.namespace_stack.push(code);
        child
    }

    /// Innermost namespace, if any.
    pub fn current_namespace(&self) -> Option<u64> {
        self.namespace_stack.last().copied()
    }
}
