/// Errors produced while processing a block
use std::fmt;
use thiserror::Error;

/// One of the three input streams the dispatcher consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Clock,
    Surface,
    Instrument,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Clock => write!(f, "clock"),
            Stream::Surface => write!(f, "surface"),
            Stream::Instrument => write!(f, "instrument"),
        }
    }
}

/// One of the two output streams the dispatcher writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    Surface,
    Instrument,
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::Surface => write!(f, "surface"),
            Port::Instrument => write!(f, "instrument"),
        }
    }
}

/// All of these are `Copy` so they can be built on the real-time path.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("malformed {stream} event: expected at least {expected} bytes, got {actual}")]
    MalformedEvent {
        stream: Stream,
        expected: usize,
        actual: usize,
    },

    #[error("{0} output rejected a write")]
    OutputWriteFailure(Port),

    #[error("deferred event queue is full")]
    QueueOverflow,
}

pub type Result<T> = std::result::Result<T, Error>;
