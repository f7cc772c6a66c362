//! Error types for the codec
//!
//! This module defines the single error type shared by the primitive layer,
//! the registry and the orchestrator. We use `thiserror` for automatic
//! `Display` and `Error` trait implementations.
//!
//! ## Taxonomy
//!
//! - Registration conflicts: [`CodecError::AlreadyRegistered`], [`CodecError::HandleConflict`]
//! - Unsupported shapes: [`CodecError::NoSurrogate`], [`CodecError::UnsupportedType`]
//! - Decode-time resolution failures: [`CodecError::UnknownHandle`], [`CodecError::TypeMismatch`]
//! - Virtual buffer addressing: [`CodecError::OutOfRange`], [`CodecError::OutOfBounds`]
//! - Malformed payloads and sink/source failures: [`CodecError::InvalidData`], [`CodecError::Io`]
//! - Foreign failures raised inside a surrogate: [`CodecError::Execution`]

use crate::types::{SubHandle, TypeHandle};
use std::error::Error as StdError;
use std::io;
use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Boxed foreign error accepted by [`CodecError::wrap`]
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Error types for encoding, decoding and registration
#[derive(Debug, Error)]
pub enum CodecError {
    /// Type is already bound to a different handle in the target context
    #[error(
        "{type_name} is already registered with a different handle \
         (context '{context}', existing {existing}/{existing_sub}, requested {requested}/{requested_sub})"
    )]
    AlreadyRegistered {
        /// Name of the source type
        type_name: String,
        /// Context the registration targeted
        context: String,
        /// Handle the type is currently bound to
        existing: TypeHandle,
        /// Subtype handle the type is currently bound to
        existing_sub: SubHandle,
        /// Handle requested by the failed registration
        requested: TypeHandle,
        /// Subtype handle requested by the failed registration
        requested_sub: SubHandle,
    },

    /// Handle slot is already taken by another type, or would mix
    /// subtyped and unsubtyped bindings on one handle
    #[error("handle {handle}/{sub_handle} in context '{context}' conflicts with {existing_type}")]
    HandleConflict {
        /// Primary handle
        handle: TypeHandle,
        /// Subtype handle
        sub_handle: SubHandle,
        /// Context the registration targeted
        context: String,
        /// Type already occupying the slot
        existing_type: String,
    },

    /// No surrogate could be found or derived for a type
    #[error("no appropriate surrogate found for {type_name}: {detail}")]
    NoSurrogate {
        /// Name (or id) of the offending type
        type_name: String,
        /// What was missing
        detail: String,
    },

    /// Decoder met a handle the active registry cannot resolve
    #[error("unresolved type handle {handle}{} in context '{context}'", sub_suffix(.sub_handle))]
    UnknownHandle {
        /// Primary handle read from the stream
        handle: TypeHandle,
        /// Subtype handle, when one could be read
        sub_handle: Option<SubHandle>,
        /// Context the decode ran in
        context: String,
    },

    /// Generic primitive dispatch has no writer for this kind
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// Decoded value is not of the requested static type
    #[error("type mismatch: expected {expected}, decoded {found}")]
    TypeMismatch {
        /// Requested type
        expected: &'static str,
        /// Description of the decoded value
        found: String,
    },

    /// Virtual buffer index past the logical size
    #[error("index {index} out of range for buffer of size {size}")]
    OutOfRange {
        /// Offending linear index (or range end)
        index: usize,
        /// Logical size of the buffer
        size: usize,
    },

    /// Destination lacks capacity and expansion was not permitted
    #[error("copy of {requested} bytes at {index} exceeds destination size {size}")]
    OutOfBounds {
        /// Destination start index
        index: usize,
        /// Requested byte count
        requested: usize,
        /// Destination logical size
        size: usize,
    },

    /// Payload is structurally invalid
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// I/O error from the underlying sink or source
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Foreign failure raised while a surrogate encoded or decoded a member
    #[error("serialization failed: {message}")]
    Execution {
        /// Original error message
        message: String,
        /// Original error
        #[source]
        source: BoxError,
    },
}

fn sub_suffix(sub: &Option<SubHandle>) -> String {
    match sub {
        Some(sub) => format!("/{}", sub),
        None => String::new(),
    }
}

impl CodecError {
    /// Wrap a foreign error, passing a boxed `CodecError` through unchanged.
    pub fn wrap(err: BoxError) -> Self {
        match err.downcast::<CodecError>() {
            Ok(codec) => *codec,
            Err(other) => CodecError::Execution {
                message: other.to_string(),
                source: other,
            },
        }
    }

    /// Create an invalid-data error
    pub fn invalid(detail: impl Into<String>) -> Self {
        CodecError::InvalidData(detail.into())
    }

    /// Create a no-surrogate error
    pub fn no_surrogate(type_name: impl Into<String>, detail: impl Into<String>) -> Self {
        CodecError::NoSurrogate {
            type_name: type_name.into(),
            detail: detail.into(),
        }
    }

    /// True for errors that mean "the stream ended early"
    pub fn is_eof(&self) -> bool {
        matches!(self, CodecError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

impl From<BoxError> for CodecError {
    fn from(err: BoxError) -> Self {
        CodecError::wrap(err)
    }
}

impl From<std::string::FromUtf8Error> for CodecError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        CodecError::InvalidData(format!("invalid UTF-8: {}", err))
    }
}
