//! Protocol-agnostic record decoding.
//!
//! The engine walks a byte range as a list of self-describing records,
//! dispatches each record's value to a handler by type code, and collects
//! the results into an attribute tree plus a list of diagnostics. Protocol
//! knowledge lives in [`RecordFormat`] values and [`TypeDispatchTable`]s;
//! nothing in this module names a protocol.

pub mod context;
pub mod cursor;
pub mod diagnostics;
pub mod dispatch;
pub mod encode;
pub mod error;
pub mod format;
pub mod handlers;
pub mod template;
pub mod tree;
pub mod walker;

pub use context::{ByteOrder, DEFAULT_MAX_NESTING_DEPTH, DecodeContext};
pub use cursor::ByteCursor;
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticsSink, summarize_diagnostics};
pub use dispatch::{Handler, HandlerOutput, RecordView, TypeDispatchTable, handler_fn};
pub use encode::encode_attributes;
pub use error::{CursorError, EncodeError, TemplateError};
pub use format::{ExplicitHeader, FieldOrder, FieldWidth, ImplicitHeader, RecordFormat};
pub use template::{FieldSpec, SharedTemplateCache, SourceKey, Template, TemplateCache};
pub use tree::{Attribute, AttributeValue, HeaderForm, TreeBuilder, visit};
pub use walker::{
    AttributeWalker, DecodeOutput, DecodeScope, NestedOutput, TEMPLATE_PADDING_LIMIT,
};
