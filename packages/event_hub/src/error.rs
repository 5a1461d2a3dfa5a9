use thiserror::Error;

use crate::EventName;

/// The error type a fallible listener returns to signal that it failed.
///
/// See [`Listener::fallible()`][crate::Listener::fallible].
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur when configuring or operating an [`EventHub`][crate::EventHub].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller provided an argument that can never be valid, such as an empty event name
    /// or an identical name for both sides of a success/failure pair.
    #[error("invalid argument: {problem}")]
    InvalidArgument {
        /// A human-readable description of the problem.
        problem: String,
    },

    /// The hub was configured with a list of allowed events and the caller referenced
    /// an event that is not on that list.
    #[error("unknown event '{name}': the event is not in the list of allowed events")]
    UnknownEvent {
        /// The name that was rejected.
        name: EventName,
    },

    /// A listener returned an error while an event was being dispatched. Listeners that had
    /// not yet been called for the same dispatch were skipped.
    #[error("listener for event '{name}' failed")]
    ListenerFailed {
        /// The event that was being dispatched.
        name: EventName,

        /// The error returned by the listener.
        #[source]
        source: ListenerError,
    },
}

impl Error {
    pub(crate) fn invalid_argument(problem: impl Into<String>) -> Self {
        Self::InvalidArgument {
            problem: problem.into(),
        }
    }
}

/// A specialized `Result` type for event hub operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::error::Error as _;
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn unknown_event_names_the_event() {
        let error = Error::UnknownEvent {
            name: EventName::from("connected"),
        };

        assert!(error.to_string().contains("'connected'"));
    }

    #[test]
    fn listener_failed_exposes_source() {
        let error = Error::ListenerFailed {
            name: EventName::from("saved"),
            source: "disk full".into(),
        };

        let source = error.source().expect("listener failure must carry its source");
        assert_eq!(source.to_string(), "disk full");
    }
}
