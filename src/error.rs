use std::path::PathBuf;

use thiserror::Error;

use crate::operation::OperationKind;

/// Startup-time failures. Any of these aborts the process before the first
/// update is polled.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Operations '{first}' and '{second}' share the code '{code}'")]
    CodeCollision {
        code: char,
        first: OperationKind,
        second: OperationKind,
    },
    #[error("Code '{code}' of '{operation}' is reserved by the cancel token")]
    ReservedCode { code: char, operation: OperationKind },
    #[error("Operation '{0}' is registered twice")]
    DuplicateOperation(OperationKind),
    #[error("Color cycle must contain at least one color")]
    EmptyColorCycle,
    #[error("Failed to read config file {path:?}: {source}")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path:?}: {source}")]
    ParseConfig {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to read font file {path:?}: {source}")]
    ReadFont {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse font file {path:?}")]
    ParseFont { path: PathBuf },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Empty dispatch token")]
    MalformedToken,
    #[error("No operation registered for code '{0}'")]
    UnknownOperation(char),
    #[error("Operation '{0}' has no assigned code")]
    Unregistered(OperationKind),
    #[error("Reference {0:?} cannot be encoded unambiguously")]
    AmbiguousReference(String),
    #[error("Token is {len} bytes long, the limit is {max}")]
    TokenTooLong { len: usize, max: usize },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("Operation '{0}' does not produce an annotated image")]
    Unsupported(OperationKind),
}

/// A vision service call failed; the description is shown to the user as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RemoteError(pub String);

/// A messaging transport call failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);
