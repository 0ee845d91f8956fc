use thiserror::Error;

/// Errors returned by NetFlow packet framing.
///
/// # Examples
/// ```
/// use attrscope_core::protocols::netflow::NetflowError;
///
/// let err = NetflowError::UnsupportedVersion { version: 5 };
/// assert!(err.to_string().contains("unsupported NetFlow version 5"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetflowError {
    #[error("packet too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("unsupported NetFlow version {version}")]
    UnsupportedVersion { version: u16 },
}
