use std::any::type_name;
use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;

use foldhash::HashSet;

use crate::{DispatchMode, Error, EventHub, EventName, Result};

/// Creates instances of [`EventHub`].
///
/// All parameters are optional:
/// * `allowed_events` - if set to a non-empty list, every operation that references an event
///   outside the list fails with [`Error::UnknownEvent`]. Defaults to no restriction.
/// * `dispatch_mode` - see [`DispatchMode`]. Defaults to [`DispatchMode::Immediate`].
///
/// Use `EventHub::builder()` to create a new instance of this builder.
///
/// # Example
///
/// ```
/// use event_hub::{DispatchMode, EventHub};
///
/// let hub = EventHub::<String>::builder()
///     .allowed_events(["connected", "disconnected"])
///     .dispatch_mode(DispatchMode::Deferred)
///     .build()?;
///
/// assert_eq!(hub.dispatch_mode(), DispatchMode::Deferred);
/// # Ok::<(), event_hub::Error>(())
/// ```
pub struct EventHubBuilder<T> {
    allowed_events: Vec<EventName>,
    dispatch_mode: DispatchMode,

    _payload: PhantomData<fn(T)>,
}

impl<T: 'static> EventHubBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            allowed_events: Vec::new(),
            dispatch_mode: DispatchMode::default(),
            _payload: PhantomData,
        }
    }

    /// Restricts the hub to the given event names.
    ///
    /// An empty collection means "no restriction", same as not calling this method.
    /// Calling the method again replaces the previous list.
    ///
    /// A single string is not a collection of event names and is rejected at compile time:
    ///
    /// ```compile_fail
    /// use event_hub::EventHub;
    ///
    /// let hub = EventHub::<()>::builder().allowed_events("connected").build();
    /// ```
    #[must_use]
    pub fn allowed_events<I, N>(self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<EventName>,
    {
        Self {
            allowed_events: names.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    /// Sets when listeners are called relative to raising an event.
    #[must_use]
    pub fn dispatch_mode(self, mode: DispatchMode) -> Self {
        Self {
            dispatch_mode: mode,
            ..self
        }
    }

    /// Creates the hub.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the list of allowed events contains an empty name.
    pub fn build(self) -> Result<EventHub<T>> {
        if self.allowed_events.iter().any(EventName::is_empty) {
            return Err(Error::invalid_argument(
                "the list of allowed events must not contain an empty event name",
            ));
        }

        let allowed_events = if self.allowed_events.is_empty() {
            None
        } else {
            Some(self.allowed_events.into_iter().collect::<HashSet<_>>())
        };

        Ok(EventHub::from_parts(allowed_events, self.dispatch_mode))
    }
}

impl<T> Debug for EventHubBuilder<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("allowed_events", &self.allowed_events)
            .field("dispatch_mode", &self.dispatch_mode)
            .finish()
    }
}
