use thiserror::Error;

/// Errors returned by netlink message framing.
///
/// # Examples
/// ```
/// use attrscope_core::protocols::netlink::NetlinkError;
///
/// let err = NetlinkError::TooShort { needed: 16, actual: 3 };
/// assert!(err.to_string().contains("message too short"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetlinkError {
    #[error("message too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("invalid message length {length}: below the {min}-byte header")]
    InvalidLength { length: u32, min: usize },
    #[error("message length {length} exceeds the {actual}-byte buffer")]
    LengthExceedsBuffer { length: u32, actual: usize },
}
