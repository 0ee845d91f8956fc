//! attrscope core library for decoding self-describing binary records.
//!
//! The crate is split in two layers. `engine` walks length-prefixed and
//! type-prefixed records (TLV, TV and template-driven layouts), dispatches
//! values to handlers and collects an attribute tree plus diagnostics.
//! `protocols` holds the profiles (layout/reader/parser) that configure the
//! engine for Netlink, LLRP and NetFlow v9. [`decode`] ties both together and
//! produces a deterministic [`DecodeReport`].
//!
//! Invariants:
//! - Decoding never panics and never reads past the input buffer.
//! - Malformed input yields diagnostics; only framing failures are errors.
//! - Report outputs are deterministic for a given input and options.
//!
//! Version française (résumé):
//! Cette crate décode des enregistrements binaires auto-descriptifs :
//! moteur générique (`engine`) -> profils de protocoles (`protocols`) ->
//! rapport déterministe. Les anomalies deviennent des diagnostics attachés à
//! un offset ; seules les erreurs d'en-tête de message sont des erreurs.
//!
//! # Examples
//! ```
//! use attrscope_core::decode::{DecodeOptions, decode_report};
//! use attrscope_core::protocols::Protocol;
//!
//! // LLRP KEEPALIVE (type 62), no parameters.
//! let message = [0x04, 0x3e, 0, 0, 0, 10, 0, 0, 0, 7];
//! let report = decode_report("keepalive.bin", Protocol::Llrp, &message, &DecodeOptions::default())?;
//! assert_eq!(report.report_version, attrscope_core::REPORT_VERSION);
//! assert!(report.attributes.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use engine::{Attribute, Diagnostic, DiagnosticKind, SourceKey};
use protocols::Protocol;
use protocols::llrp::LlrpHeader;
use protocols::netflow::NetflowHeader;
use protocols::netlink::NetlinkHeader;

pub mod decode;
pub mod engine;
pub mod protocols;

pub use decode::{DecodeError, DecodeOptions, decode_file, decode_report};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;

/// Decoded message with deterministic ordering.
///
/// # Examples
/// ```
/// use attrscope_core::make_stub_report;
/// use attrscope_core::protocols::Protocol;
///
/// let report = make_stub_report("message.bin", 16, Protocol::Netlink);
/// assert_eq!(report.report_version, attrscope_core::REPORT_VERSION);
/// assert!(report.attributes.is_empty());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct DecodeReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// Input metadata.
    pub input: InputInfo,
    /// Protocol profile used for decoding.
    pub protocol: Protocol,
    /// Message header summary (absent for stub reports).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageSummary>,
    /// Top-level attributes in document order.
    pub attributes: Vec<Attribute>,
    /// Diagnostics in the order they were raised.
    pub diagnostics: Vec<Diagnostic>,
    /// Diagnostic counts per kind, in stable kind order.
    pub diagnostic_summary: BTreeMap<DiagnosticKind, u64>,
}

impl DecodeReport {
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use attrscope_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "attrscope".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "attrscope");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "attrscope").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input metadata embedded in reports.
#[derive(Debug, Clone, Serialize)]
pub struct InputInfo {
    /// Input path as provided to the decoder.
    pub path: String,
    /// Size of the decoded message in bytes.
    pub bytes: u64,
}

/// Framing-level view of the decoded message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum MessageSummary {
    Netlink {
        header: NetlinkHeader,
        family: String,
        /// Family header bytes (e.g. `genlmsghdr`, `ifinfomsg`) as hex.
        family_header: String,
    },
    Llrp {
        header: LlrpHeader,
        /// Fixed message fields before the first parameter, as hex.
        fixed_body: String,
    },
    Netflow {
        header: NetflowHeader,
        #[serde(skip_serializing_if = "Option::is_none")]
        exported_at: Option<String>,
        source: SourceKey,
        records: usize,
    },
}

/// Build a stub report with base fields filled and empty results.
///
/// # Examples
/// ```
/// use attrscope_core::make_stub_report;
/// use attrscope_core::protocols::Protocol;
///
/// let report = make_stub_report("export.bin", 120, Protocol::Netflow);
/// assert_eq!(report.input.bytes, 120);
/// assert!(report.message.is_none());
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64, protocol: Protocol) -> DecodeReport {
    DecodeReport {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "attrscope".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        protocol,
        message: None,
        attributes: vec![],
        diagnostics: vec![],
        diagnostic_summary: BTreeMap::new(),
    }
}
