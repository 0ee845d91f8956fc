//! One-shot decoding of a single message into a [`DecodeReport`].
//!
//! This is the entry point used by the CLI: pick a protocol profile, frame
//! the message, walk its records and fold the result into a report. Callers
//! decoding a stream of NetFlow packets should keep a
//! [`NetflowSession`](crate::protocols::netflow::NetflowSession) instead, so
//! templates survive from one packet to the next.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::engine::{DecodeContext, DecodeOutput, summarize_diagnostics};
use crate::protocols::Protocol;
use crate::protocols::llrp::{LlrpError, decode_llrp_message};
use crate::protocols::netflow::{NetflowError, NetflowSession};
use crate::protocols::netlink::{NetlinkBus, NetlinkError, decode_netlink_message};
use crate::{DecodeReport, MessageSummary, make_stub_report};

/// Exporter name used when the caller does not know where a packet came from.
pub const DEFAULT_EXPORTER: &str = "local";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("netlink framing error: {0}")]
    Netlink(#[from] NetlinkError),
    #[error("LLRP framing error: {0}")]
    Llrp(#[from] LlrpError),
    #[error("NetFlow framing error: {0}")]
    Netflow(#[from] NetflowError),
}

/// Options for one decode call.
///
/// # Examples
/// ```
/// use attrscope_core::decode::DecodeOptions;
///
/// let opts: DecodeOptions = serde_json::from_str(r#"{"exporter":"192.0.2.1"}"#)?;
/// assert_eq!(opts.exporter, "192.0.2.1");
/// assert_eq!(opts.context.max_nesting_depth, 16);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Netlink reads header fields in `context.byte_order`; LLRP and NetFlow
    /// are always big-endian.
    pub context: DecodeContext,
    pub netlink_bus: NetlinkBus,
    /// NetFlow exporter identity; templates are scoped to it.
    pub exporter: String,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            context: DecodeContext::default(),
            netlink_bus: NetlinkBus::default(),
            exporter: DEFAULT_EXPORTER.to_string(),
        }
    }
}

/// Framing summary plus engine output for one message.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    pub summary: MessageSummary,
    pub output: DecodeOutput,
}

/// Frame and decode one message with the profile for `protocol`.
pub fn decode_message(
    protocol: Protocol,
    buffer: &[u8],
    opts: &DecodeOptions,
) -> Result<DecodedMessage, DecodeError> {
    let decoded = match protocol {
        Protocol::Netlink => {
            let message = decode_netlink_message(buffer, &opts.context, opts.netlink_bus)?;
            let framed = message.header.length as usize;
            if framed < buffer.len() {
                debug!(
                    framed,
                    buffer = buffer.len(),
                    "bytes after the first netlink message ignored"
                );
            }
            DecodedMessage {
                summary: MessageSummary::Netlink {
                    header: message.header,
                    family: message.family.to_string(),
                    family_header: hex::encode(&message.family_header),
                },
                output: message.output,
            }
        }
        Protocol::Llrp => {
            let message = decode_llrp_message(buffer, &opts.context)?;
            DecodedMessage {
                summary: MessageSummary::Llrp {
                    header: message.header,
                    fixed_body: hex::encode(&message.fixed_body),
                },
                output: message.output,
            }
        }
        Protocol::Netflow => {
            let session = NetflowSession::new().with_context(opts.context.clone());
            let packet = session.decode_packet(&opts.exporter, buffer)?;
            DecodedMessage {
                summary: MessageSummary::Netflow {
                    header: packet.header,
                    exported_at: packet.exported_at,
                    source: packet.source,
                    records: packet.records,
                },
                output: packet.output,
            }
        }
    };
    Ok(decoded)
}

/// Decode `buffer` and build the report for it.
pub fn decode_report(
    input_path: &str,
    protocol: Protocol,
    buffer: &[u8],
    opts: &DecodeOptions,
) -> Result<DecodeReport, DecodeError> {
    let DecodedMessage { summary, output } = decode_message(protocol, buffer, opts)?;
    let mut report = make_stub_report(input_path, buffer.len() as u64, protocol);
    report.diagnostic_summary = summarize_diagnostics(&output.diagnostics);
    report.message = Some(summary);
    report.attributes = output.tree;
    report.diagnostics = output.diagnostics;
    Ok(report)
}

/// Read a raw message from `path` and decode it.
pub fn decode_file(
    path: &Path,
    protocol: Protocol,
    opts: &DecodeOptions,
) -> Result<DecodeReport, DecodeError> {
    let buffer = fs::read(path)?;
    decode_report(&path.display().to_string(), protocol, &buffer, opts)
}
