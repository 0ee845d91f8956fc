use thiserror::Error;

/// Errors returned by LLRP message framing.
///
/// # Examples
/// ```
/// use attrscope_core::protocols::llrp::LlrpError;
///
/// let err = LlrpError::UnsupportedVersion { version: 7 };
/// assert!(err.to_string().contains("unsupported LLRP version"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlrpError {
    #[error("message too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("unsupported LLRP version {version}")]
    UnsupportedVersion { version: u8 },
    #[error("invalid message length {length}: below the {min}-byte header")]
    InvalidLength { length: u32, min: usize },
    #[error("message length {length} exceeds the {actual}-byte buffer")]
    LengthExceedsBuffer { length: u32, actual: usize },
}
