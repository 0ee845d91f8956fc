use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Kind of non-fatal anomaly found while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A read would have gone past the available bytes.
    OutOfBounds,
    /// Declared length disagrees with the bytes available or consumed.
    LengthMismatch,
    /// No handler registered; the record was kept opaque.
    UnknownType,
    /// A data record referenced a template that was never defined.
    UnresolvedTemplate,
    /// Header unreadable or invalid; decoding stopped at this nesting level.
    MalformedHeader,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::OutOfBounds => "out_of_bounds",
            DiagnosticKind::LengthMismatch => "length_mismatch",
            DiagnosticKind::UnknownType => "unknown_type",
            DiagnosticKind::UnresolvedTemplate => "unresolved_template",
            DiagnosticKind::MalformedHeader => "malformed_header",
        }
    }

    /// Kinds that a clamped record's shortfall can cause again further in.
    pub fn follows_truncation(&self) -> bool {
        matches!(
            self,
            DiagnosticKind::OutOfBounds
                | DiagnosticKind::LengthMismatch
                | DiagnosticKind::MalformedHeader
        )
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One anomaly, attached to the byte offset it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub offset: usize,
    pub detail: String,
}

/// Append-only collector shared by every level of one decode call.
///
/// Pushing never interrupts control flow; the sink is drained into the
/// decode output when the top-level walk returns.
#[derive(Debug, Default)]
pub struct DiagnosticsSink {
    entries: Vec<Diagnostic>,
}

impl DiagnosticsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: DiagnosticKind, offset: usize, detail: impl Into<String>) {
        let detail = detail.into();
        debug!(%kind, offset, %detail, "decode diagnostic");
        self.entries.push(Diagnostic {
            kind,
            offset,
            detail,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

/// Count diagnostics per kind, in stable kind order.
///
/// # Examples
/// ```
/// use attrscope_core::engine::{Diagnostic, DiagnosticKind, summarize_diagnostics};
///
/// let diagnostics = vec![Diagnostic {
///     kind: DiagnosticKind::LengthMismatch,
///     offset: 4,
///     detail: "declared 8, available 6".to_string(),
/// }];
/// let summary = summarize_diagnostics(&diagnostics);
/// assert_eq!(summary.get(&DiagnosticKind::LengthMismatch), Some(&1));
/// ```
pub fn summarize_diagnostics(diagnostics: &[Diagnostic]) -> BTreeMap<DiagnosticKind, u64> {
    let mut counts = BTreeMap::new();
    for diagnostic in diagnostics {
        *counts.entry(diagnostic.kind).or_insert(0) += 1;
    }
    counts
}
