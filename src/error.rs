//! Error handling types for reading and writing documents
//!
//! Every failure is fatal to the call that produced it. The [`ErrorKind`]
//! tells the caller which class of failure occurred; context and the
//! underlying cause travel alongside it.

use std::{error::Error as StdError, fmt, io};
use thiserror::Error;

type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Main error type for parse, compact and serialize operations
#[derive(Debug)]
pub struct Error {
    /// The specific kind of error
    kind: ErrorKind,
    /// Additional context for the error
    context: Option<String>,
    /// Source error that caused this error
    source: Option<BoxedSource>,
}

/// Error categories
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// Structural violation in the input document
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
    /// The element handler refused the placement of an element
    #[error("Element <{name}> rejected by handler")]
    ElementRejected { name: String },
    /// Lookahead reached past the end of the stream
    #[error("Stream exhausted at offset {offset}")]
    StreamExhausted { offset: usize },
    /// Lookahead exceeded the configured buffer limit
    #[error("Lookahead of {requested} bytes exceeds buffer limit of {limit} bytes")]
    BufferLimitExceeded { requested: usize, limit: usize },
    /// Elements nested deeper than the configured maximum
    #[error("Maximum nesting depth of {max} exceeded")]
    MaxDepthExceeded { max: usize },
    /// Input is not valid UTF-8
    #[error("Input is not valid UTF-8")]
    InvalidEncoding,
    /// Reading the input or writing the output failed
    #[error("I/O error: {0}")]
    Io(String),
    /// A parallel unit of work failed; the cause is the error's source
    #[error("Worker failed")]
    WorkerFailure,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
            source: None,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedDocument(message.into()))
    }

    /// Wraps the first failure of a fan-out.
    pub fn worker_failure(cause: Self) -> Self {
        Self::new(ErrorKind::WorkerFailure).with_source(cause)
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Follows `WorkerFailure` wrappers down to the error that started them.
    pub fn root_cause(&self) -> &Self {
        let mut current = self;
        while let Some(inner) = current
            .source
            .as_deref()
            .and_then(|source| source.downcast_ref::<Self>())
        {
            current = inner;
        }
        current
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        matches!(self.kind, ErrorKind::StreamExhausted { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.kind)?;

        if let Some(ctx) = &self.context {
            write!(f, "\nContext: {}", ctx)?;
        }

        if let Some(source) = &self.source {
            write!(f, "\nCaused by: {}", source)?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn StdError + 'static))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::InvalidData {
            return Self::new(ErrorKind::InvalidEncoding).with_source(err);
        }
        Self::new(ErrorKind::Io(err.to_string())).with_source(err)
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::new(ErrorKind::InvalidEncoding).with_source(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
