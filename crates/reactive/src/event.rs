//! Event payloads crossing the trigger boundary.

use alloc::string::String;
use arbor_core::Value;
use core::fmt;

/// An error raised by a trigger stream.
///
/// Trigger errors never escape the engine as faults; they are routed into
/// hook error handlers and converted into ordinary value transitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmitError {
    message: String,
}

impl EmitError {
    /// Creates a new trigger error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// One emission of a trigger stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A value emission
    Next(Value),
    /// An error emission
    Error(EmitError),
}

impl Event {
    /// Creates a value emission.
    pub fn next(value: impl Into<Value>) -> Self {
        Event::Next(value.into())
    }

    /// Creates an error emission.
    pub fn error(message: impl Into<String>) -> Self {
        Event::Error(EmitError::new(message))
    }

    /// Returns true if this is a value emission.
    #[inline]
    pub fn is_next(&self) -> bool {
        matches!(self, Event::Next(_))
    }

    /// Returns the value if this is a value emission, None otherwise.
    pub fn as_next(&self) -> Option<&Value> {
        match self {
            Event::Next(value) => Some(value),
            Event::Error(_) => None,
        }
    }

    /// Returns the error if this is an error emission, None otherwise.
    pub fn as_error(&self) -> Option<&EmitError> {
        match self {
            Event::Next(_) => None,
            Event::Error(err) => Some(err),
        }
    }
}
