//! Main Crate Error

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Xorkad crate error enum.
///
/// Lookups never fail with an [Error]; absence is reported as `None` or `false`.
/// Errors only come from constructing identifiers and validating configuration.
pub enum Error {
    /// Indicates that the bytes used to build an [crate::Id] are not 20 bytes long.
    #[error("Invalid Id size, expected 20, got {0}")]
    InvalidIdSize(usize),

    /// Indicates that a string is not a valid 40 characters hex encoded [crate::Id].
    #[error("Invalid Id encoding: {0}")]
    InvalidIdEncoding(String),

    /// Indicates that a [crate::Config] value is out of its accepted range.
    #[error("Invalid config: {0}")]
    InvalidConfig(&'static str),
}
