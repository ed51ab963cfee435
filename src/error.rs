//! Error taxonomy for the wire codec and the request dispatcher.

use std::io;
use thiserror::Error;

/// Errors raised while decoding or encoding the wire format itself: malformed
/// fixed-width integers, truncated text blobs, or a read that comes up short.
#[derive(Debug, Error)]
pub enum WireError {
    /// Fewer bytes were available than a length prefix promised.
    #[error("truncated frame: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// A fixed-width integer field did not parse as hexadecimal.
    #[error("malformed fixed-width integer: {0:?}")]
    MalformedInt(String),

    /// A text blob contained a code point outside the 8-bit transparent range.
    #[error("text blob contains a non-8-bit code point: U+{0:04X}")]
    NonByteCodePoint(u32),

    /// Underlying I/O failure on the input or output stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised by the request dispatcher while executing a single command.
///
/// Every variant here, once caught at the dispatch loop boundary, is rendered
/// through `Display` and becomes the payload of an `ERROR_RESULT` frame.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Propagated from the wire codec.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// A handle was negative but outside every defined virtual band.
    #[error("invalid handle: {0}")]
    InvalidHandle(i32),

    /// A non-negative handle pointed at a vacant or out-of-range slot.
    #[error("handle {0} does not refer to a live object")]
    VacantHandle(i32),

    /// `FREE_OBJECT` was issued against a handle that is already vacant.
    #[error("handle {0} is already free")]
    DoubleFree(i32),

    /// `GET_CLASS` named a class the runtime does not know about.
    #[error("class not found: {0}")]
    ClassNotFound(String),

    /// `GET_METHOD` named a method/arity/parameter-type combination the
    /// owning class does not declare.
    #[error("no such method: {owner}.{name}/{arity}")]
    MethodNotFound {
        owner: String,
        name: String,
        arity: usize,
    },

    /// A handle resolved to a value of the wrong kind for the position it
    /// was used in (e.g. a `String` handle passed where a `Class` was
    /// expected).
    #[error("unexpected value kind: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// The reflective call itself raised an error.
    #[error("invocation failed: {0}")]
    Invocation(String),
}

impl DispatchError {
    /// A short, stable tag describing which branch of the error taxonomy this
    /// is, used for diagnostic logging only (never sent on the wire).
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Wire(_) => "protocol-framing",
            DispatchError::InvalidHandle(_)
            | DispatchError::VacantHandle(_)
            | DispatchError::DoubleFree(_)
            | DispatchError::ClassNotFound(_)
            | DispatchError::MethodNotFound { .. }
            | DispatchError::TypeMismatch { .. } => "resolution",
            DispatchError::Invocation(_) => "invocation",
        }
    }
}
