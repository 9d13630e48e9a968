//! Error types for vsdl

use crate::native::Size;
use vsdl_affine::ExecError;

/// Session errors.
#[derive(Debug, thiserror::Error)]
pub enum VsdlError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not load library {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: libloading::Error,
    },

    #[error("could not get proc: {name}")]
    Symbol {
        name: &'static str,
        #[source]
        source: libloading::Error,
    },

    /// Fatal: the running platform cannot host this session.
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A native call reported failure; `message` is the library's own text.
    #[error("{call} failed: {message}")]
    Native { call: &'static str, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Fatal: the affine thread aborted and the session is gone.
    #[error("session aborted: {0}")]
    Fatal(String),

    #[error("session is shut down")]
    Closed,

    #[error("blocking call issued from the session's own native thread")]
    WrongThread,
}

impl VsdlError {
    /// True when the session cannot continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, VsdlError::Fatal(_) | VsdlError::Unsupported(_))
    }
}

impl From<ExecError<VsdlError>> for VsdlError {
    fn from(err: ExecError<VsdlError>) -> Self {
        match err {
            ExecError::Operation(err) => err,
            ExecError::Fatal(reason) => VsdlError::Fatal(reason),
            ExecError::Closed => VsdlError::Closed,
            ExecError::WorkerThread => VsdlError::WrongThread,
        }
    }
}

/// Rejected input, detected before anything reaches the native thread.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("image is {actual}, back-buffer is {expected}")]
    SizeMismatch { expected: Size, actual: Size },

    #[error("invalid image format {0}, expected RGBA8")]
    PixelFormat(String),
}
