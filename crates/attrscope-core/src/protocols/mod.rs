//! Protocol profiles for the decoding engine.
//!
//! Each protocol follows a layered structure:
//! - `layout`: byte offsets, type codes and static tables
//! - `reader`: message framing with typed errors
//! - `parser`: record formats, dispatch tables and the decode entry point
//! - `error`: framing errors
//!
//! Framing failures are returned as errors. Once a message is framed, every
//! anomaly inside it is reported as a diagnostic by the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod llrp;
pub mod netflow;
pub mod netlink;

/// Protocol families with a built-in profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Netlink,
    Llrp,
    Netflow,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Netlink => "netlink",
            Protocol::Llrp => "llrp",
            Protocol::Netflow => "netflow",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
