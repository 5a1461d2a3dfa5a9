use std::any::type_name;
use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug, Formatter};
use std::rc::{Rc, Weak};

use foldhash::{HashMap, HashMapExt, HashSet};
use tracing::{debug, trace};

use crate::listener::Handler;
use crate::{
    DeferredQueue, DispatchMode, Error, EventHubBuilder, EventName, Listener, ListenerError,
    PendingDispatch, Result, Settlement, WaitError, race_events, settlement_pair,
};

/// Dispatches named events to the listeners registered for them.
///
/// Producers raise an event with [`emit()`][Self::emit], consumers register with
/// [`add_listener()`][Self::add_listener] (alias [`on()`][Self::on]),
/// [`once()`][Self::once], [`wait_for()`][Self::wait_for] or
/// [`callback_once()`][Self::callback_once].
///
/// The hub is a cheaply cloneable handle. All clones operate on the same registry, so a listener
/// can hold a clone (or, to avoid keeping the hub alive, a [`WeakEventHub`]) and register or
/// remove listeners while an event is being dispatched. Such changes only affect later
/// dispatches: every dispatch calls the listeners captured when the event was raised.
///
/// The hub is single-threaded.
///
/// # Event names
///
/// Every operation that takes an event name validates it the same way:
///
/// * An empty name fails with [`Error::InvalidArgument`].
/// * If the hub was created with a list of allowed events, a name outside that list fails with
///   [`Error::UnknownEvent`].
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use event_hub::{EventHub, Listener};
///
/// let hub = EventHub::<u32>::with_allowed_events(["progress", "done"])?;
/// let total = Rc::new(Cell::new(0));
///
/// hub.on(
///     "progress",
///     Listener::new({
///         let total = Rc::clone(&total);
///         move |step: &u32| total.set(total.get() + step)
///     }),
/// )?;
///
/// assert!(hub.emit("progress", 10)?);
/// assert!(hub.emit("progress", 5)?);
/// assert!(!hub.emit("done", 0)?); // Nobody is listening.
///
/// assert_eq!(total.get(), 15);
/// # Ok::<(), event_hub::Error>(())
/// ```
pub struct EventHub<T> {
    core: Rc<HubCore<T>>,
}

impl<T: 'static> EventHub<T> {
    /// Creates a hub that accepts any non-empty event name and dispatches immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(None, DispatchMode::Immediate)
    }

    /// Creates a hub that only accepts the given event names.
    ///
    /// An empty collection means "no restriction".
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the collection contains an empty name.
    pub fn with_allowed_events<I, N>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<EventName>,
    {
        Self::builder().allowed_events(names).build()
    }

    /// Starts building a hub with custom configuration.
    #[must_use]
    pub fn builder() -> EventHubBuilder<T> {
        EventHubBuilder::new()
    }

    pub(crate) fn from_parts(
        allowed_events: Option<HashSet<EventName>>,
        dispatch_mode: DispatchMode,
    ) -> Self {
        debug!(
            allowed_events = allowed_events.as_ref().map(HashSet::len),
            mode = ?dispatch_mode,
            "event hub created"
        );

        Self {
            core: Rc::new(HubCore {
                allowed_events,
                dispatch_mode,
                listeners: RefCell::new(HashMap::new()),
                deferred: DeferredQueue::new(),
            }),
        }
    }

    /// Registers a listener for an event.
    ///
    /// Listeners of one event are called in registration order. There is no deduplication:
    /// registering the same listener twice means it is called twice per dispatch.
    ///
    /// Returns the hub to allow chaining.
    ///
    /// # Errors
    ///
    /// Fails if the event name is not valid for this hub (see [type-level docs][Self]).
    pub fn add_listener(&self, name: impl Into<EventName>, listener: Listener<T>) -> Result<&Self> {
        let name = name.into();
        self.core.check(&name)?;

        self.core.insert(name, listener);

        Ok(self)
    }

    /// Alias for [`add_listener()`][Self::add_listener].
    ///
    /// # Errors
    ///
    /// Fails if the event name is not valid for this hub (see [type-level docs][Self]).
    #[inline]
    pub fn on(&self, name: impl Into<EventName>, listener: Listener<T>) -> Result<&Self> {
        self.add_listener(name, listener)
    }

    /// Removes the earliest registration of `listener` for an event.
    ///
    /// Only one registration is removed even if the same listener was registered several
    /// times. Nothing happens if the listener is not registered for the event.
    ///
    /// A listener registered via [`once()`][Self::once] cannot be removed this way because the
    /// registration belongs to a wrapper around it.
    ///
    /// Returns the hub to allow chaining.
    ///
    /// # Errors
    ///
    /// Fails if the event name is not valid for this hub (see [type-level docs][Self]).
    pub fn remove_listener(
        &self,
        name: impl Into<EventName>,
        listener: &Listener<T>,
    ) -> Result<&Self> {
        let name = name.into();
        self.core.check(&name)?;

        self.core.remove(&name, listener);

        Ok(self)
    }

    /// Removes every listener registered for an event, including one-shot registrations.
    ///
    /// Pending [`wait_for()`][Self::wait_for] settlements that lose a registration this way
    /// resolve with [`WaitError::Disconnected`] once their other registration is gone, too.
    ///
    /// Returns the hub to allow chaining.
    ///
    /// # Errors
    ///
    /// Fails if the event name is not valid for this hub (see [type-level docs][Self]).
    pub fn remove_all_listeners(&self, name: impl Into<EventName>) -> Result<&Self> {
        let name = name.into();
        self.core.check(&name)?;

        // Dropped outside the borrow, as the last reference may run arbitrary destructors.
        let removed = self.core.listeners.borrow_mut().remove(&name);

        trace!(
            event = %name,
            listeners = removed.as_ref().map_or(0, Vec::len),
            "removed all listeners"
        );

        drop(removed);

        Ok(self)
    }

    /// Registers a listener that is called on the next dispatch of the event and then removed.
    ///
    /// Even if the event is raised several times before the dispatch that removes the
    /// registration completes (e.g. by a listener that raises the same event), the listener is
    /// called only once.
    ///
    /// Returns the hub to allow chaining.
    ///
    /// # Errors
    ///
    /// Fails if the event name is not valid for this hub (see [type-level docs][Self]).
    pub fn once(&self, name: impl Into<EventName>, listener: Listener<T>) -> Result<&Self> {
        let name = name.into();
        self.core.check(&name)?;

        let adapter = Rc::new_cyclic(|this| OnceAdapter {
            hub: Rc::downgrade(&self.core),
            name: name.clone(),
            inner: listener,
            fired: Cell::new(false),
            this: Weak::clone(this),
        });

        self.core.insert(name, Listener::from_handler(adapter));

        Ok(self)
    }

    /// Raises an event, passing `data` to every listener registered for it.
    ///
    /// The listeners that will be called are captured before any of them runs. Listeners added
    /// or removed while the dispatch is in progress do not affect which listeners this dispatch
    /// calls.
    ///
    /// In [`DispatchMode::Immediate`] the listeners are called before this method returns. In
    /// [`DispatchMode::Deferred`] they are called by [`run_deferred()`][Self::run_deferred].
    ///
    /// Returns `false` if no listener was registered for the event, `true` otherwise.
    ///
    /// # Errors
    ///
    /// Fails if the event name is not valid for this hub (see [type-level docs][Self]).
    ///
    /// Returns [`Error::ListenerFailed`] if a fallible listener returned an error. Listeners
    /// after it in the same dispatch are not called.
    pub fn emit(&self, name: impl Into<EventName>, data: T) -> Result<bool> {
        let name = name.into();
        self.core.check(&name)?;

        let snapshot = self.core.snapshot(&name);

        if snapshot.is_empty() {
            trace!(event = %name, "raised event has no listeners");
            return Ok(false);
        }

        match self.core.dispatch_mode {
            DispatchMode::Immediate => {
                self.core.dispatch(&name, &data, &snapshot)?;
            }
            DispatchMode::Deferred => {
                trace!(event = %name, listeners = snapshot.len(), "deferring dispatch");

                self.core.deferred.push(PendingDispatch {
                    name,
                    data,
                    snapshot,
                });
            }
        }

        Ok(true)
    }

    /// Alias for [`emit()`][Self::emit].
    ///
    /// # Errors
    ///
    /// See [`emit()`][Self::emit].
    #[inline]
    pub fn raise_event(&self, name: impl Into<EventName>, data: T) -> Result<bool> {
        self.emit(name, data)
    }

    /// Calls the listeners of every dispatch queued in [`DispatchMode::Deferred`], oldest first.
    ///
    /// Dispatches queued by listeners while this runs are also processed before returning.
    /// Returns the number of listener calls made. One-shot registrations captured by several
    /// queued dispatches count only for the dispatch that fired them. In
    /// [`DispatchMode::Immediate`] nothing is ever queued and this returns zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ListenerFailed`] if a fallible listener returned an error. The
    /// remaining listeners of that dispatch are not called; later dispatches stay queued for
    /// the next call.
    pub fn run_deferred(&self) -> Result<usize> {
        let mut calls: usize = 0;

        while let Some(pending) = self.core.deferred.pop() {
            let made = self
                .core
                .dispatch(&pending.name, &pending.data, &pending.snapshot)?;
            calls = calls.saturating_add(made);
        }

        if calls > 0 {
            trace!(listeners = calls, "ran deferred dispatches");
        }

        Ok(calls)
    }

    /// Number of dispatches queued for [`run_deferred()`][Self::run_deferred].
    #[must_use]
    pub fn pending_dispatches(&self) -> usize {
        self.core.deferred.len()
    }

    /// Returns a future that resolves when either `success` or `failure` is raised,
    /// whichever comes first.
    ///
    /// The future resolves to `Ok(data)` if `success` wins and to
    /// `Err(WaitError::Failed(data))` if `failure` wins. As soon as one of them is raised, the
    /// registrations for both are removed, so the other event has no further effect.
    ///
    /// The registrations are made when this method is called, not when the future is first
    /// polled, so events raised before awaiting are not missed.
    ///
    /// # Errors
    ///
    /// Fails if either event name is not valid for this hub (see [type-level docs][Self]).
    ///
    /// Returns [`Error::InvalidArgument`] if `success` and `failure` are the same event.
    ///
    /// # Example
    ///
    /// ```
    /// use event_hub::{EventHub, WaitError};
    /// # use futures::executor::block_on;
    ///
    /// let hub = EventHub::<&str>::new();
    /// let settlement = hub.wait_for("loaded", "load_failed")?;
    ///
    /// hub.emit("load_failed", "file not found")?;
    ///
    /// assert_eq!(
    ///     block_on(settlement),
    ///     Err(WaitError::Failed("file not found"))
    /// );
    /// # Ok::<(), event_hub::Error>(())
    /// ```
    pub fn wait_for(
        &self,
        success: impl Into<EventName>,
        failure: impl Into<EventName>,
    ) -> Result<Settlement<T>>
    where
        T: Clone,
    {
        let (success, failure) = self.check_pair(success.into(), failure.into())?;

        let (settler, settlement) = settlement_pair();

        race_events(&self.core, success, failure, move |outcome| {
            settler.settle(outcome.map_err(WaitError::Failed));
        });

        Ok(settlement)
    }

    /// Calls `callback` once, when either `success` or `failure` is raised, whichever comes
    /// first.
    ///
    /// The callback receives `Ok(data)` if `success` wins and `Err(data)` if `failure` wins.
    /// As soon as one of them is raised, the registrations for both are removed.
    ///
    /// Returns the hub to allow chaining.
    ///
    /// # Errors
    ///
    /// Fails if either event name is not valid for this hub (see [type-level docs][Self]).
    ///
    /// Returns [`Error::InvalidArgument`] if `success` and `failure` are the same event.
    pub fn callback_once<F>(
        &self,
        success: impl Into<EventName>,
        failure: impl Into<EventName>,
        callback: F,
    ) -> Result<&Self>
    where
        T: Clone,
        F: FnOnce(std::result::Result<T, T>) + 'static,
    {
        let (success, failure) = self.check_pair(success.into(), failure.into())?;

        race_events(&self.core, success, failure, callback);

        Ok(self)
    }

    /// Number of registrations for an event, one-shot registrations included.
    ///
    /// # Errors
    ///
    /// Fails if the event name is not valid for this hub (see [type-level docs][Self]).
    pub fn listener_count(&self, name: impl Into<EventName>) -> Result<usize> {
        let name = name.into();
        self.core.check(&name)?;

        Ok(self
            .core
            .listeners
            .borrow()
            .get(&name)
            .map_or(0, Vec::len))
    }

    /// Whether at least one listener is registered for an event.
    ///
    /// # Errors
    ///
    /// Fails if the event name is not valid for this hub (see [type-level docs][Self]).
    pub fn has_listeners(&self, name: impl Into<EventName>) -> Result<bool> {
        Ok(self.listener_count(name)? > 0)
    }

    /// Names of the events that currently have at least one listener, in no particular order.
    #[must_use]
    pub fn event_names(&self) -> Vec<EventName> {
        self.core.listeners.borrow().keys().cloned().collect()
    }

    /// The allowed event names, or `None` if the hub accepts any non-empty name.
    #[must_use]
    pub fn allowed_events(&self) -> Option<impl Iterator<Item = &EventName>> {
        self.core.allowed_events.as_ref().map(|names| names.iter())
    }

    /// When listeners are called relative to raising an event.
    #[must_use]
    pub fn dispatch_mode(&self) -> DispatchMode {
        self.core.dispatch_mode
    }

    /// Creates a handle that does not keep the hub alive.
    ///
    /// Listeners that need to reach the hub they are registered with should capture this
    /// instead of a clone of the hub, which would form a reference cycle.
    #[must_use]
    pub fn downgrade(&self) -> WeakEventHub<T> {
        WeakEventHub {
            core: Rc::downgrade(&self.core),
        }
    }

    fn check_pair(&self, success: EventName, failure: EventName) -> Result<(EventName, EventName)> {
        self.core.check(&success)?;
        self.core.check(&failure)?;

        if success == failure {
            return Err(Error::invalid_argument(format!(
                "success and failure events must differ but both are '{success}'"
            )));
        }

        Ok((success, failure))
    }
}

impl<T: 'static> Default for EventHub<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EventHub<T> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<T> Debug for EventHub<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field(
                "allowed_events",
                &self.core.allowed_events.as_ref().map(HashSet::len),
            )
            .field("dispatch_mode", &self.core.dispatch_mode)
            .field("events_with_listeners", &self.core.listeners.borrow().len())
            .field("pending_dispatches", &self.core.deferred.len())
            .finish()
    }
}

/// A handle to an [`EventHub`] that does not keep it alive.
///
/// Obtained from [`EventHub::downgrade()`].
pub struct WeakEventHub<T> {
    core: Weak<HubCore<T>>,
}

impl<T> WeakEventHub<T> {
    /// Returns the hub if any strong handle to it still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<EventHub<T>> {
        self.core.upgrade().map(|core| EventHub { core })
    }
}

impl<T> Clone for WeakEventHub<T> {
    fn clone(&self) -> Self {
        Self {
            core: Weak::clone(&self.core),
        }
    }
}

impl<T> Debug for WeakEventHub<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("alive", &(self.core.strong_count() > 0))
            .finish()
    }
}

/// The registry shared by all handles to one hub.
///
/// No `RefCell` borrow is held while a listener runs, so listeners may call back into the hub.
pub(crate) struct HubCore<T> {
    allowed_events: Option<HashSet<EventName>>,
    dispatch_mode: DispatchMode,

    /// Keys only exist while at least one listener is registered for them.
    listeners: RefCell<HashMap<EventName, Vec<Listener<T>>>>,

    deferred: DeferredQueue<T>,
}

impl<T> HubCore<T> {
    /// The one place that decides whether an event name is acceptable.
    fn check(&self, name: &EventName) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid_argument("event name must not be empty"));
        }

        if let Some(allowed) = &self.allowed_events {
            if !allowed.contains(name) {
                return Err(Error::UnknownEvent { name: name.clone() });
            }
        }

        Ok(())
    }

    pub(crate) fn insert(&self, name: EventName, listener: Listener<T>) {
        trace!(event = %name, "adding listener");

        self.listeners
            .borrow_mut()
            .entry(name)
            .or_default()
            .push(listener);
    }

    /// Removes the earliest registration of `listener`. Returns whether one was found.
    pub(crate) fn remove(&self, name: &EventName, listener: &Listener<T>) -> bool {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();

            let Some(registered) = listeners.get_mut(name) else {
                return false;
            };

            let Some(index) = registered.iter().position(|l| l.same_as(listener)) else {
                return false;
            };

            let removed = registered.remove(index);

            if registered.is_empty() {
                listeners.remove(name);
            }

            removed
        };

        trace!(event = %name, "listener removed");

        // Dropped outside the borrow, as the last reference may run arbitrary destructors.
        drop(removed);

        true
    }

    fn snapshot(&self, name: &EventName) -> Vec<Listener<T>> {
        self.listeners
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Calls each listener of the snapshot in order. Returns the number of listeners that ran,
    /// not counting one-shot registrations that had already fired.
    fn dispatch(&self, name: &EventName, data: &T, snapshot: &[Listener<T>]) -> Result<usize> {
        trace!(event = %name, listeners = snapshot.len(), "dispatching event");

        let mut calls: usize = 0;

        for listener in snapshot {
            let ran = listener.invoke(data).map_err(|source| {
                debug!(event = %name, error = %source, "listener failed");

                Error::ListenerFailed {
                    name: name.clone(),
                    source,
                }
            })?;

            if ran {
                calls = calls.saturating_add(1);
            }
        }

        Ok(calls)
    }
}

impl<T> Debug for HubCore<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>()).finish_non_exhaustive()
    }
}

/// Wraps a listener registered via [`EventHub::once()`] so that it deregisters itself
/// before calling the wrapped listener.
struct OnceAdapter<T> {
    hub: Weak<HubCore<T>>,
    name: EventName,
    inner: Listener<T>,

    /// A dispatch captured before the deregistration may still call us. Only the first call
    /// reaches `inner`.
    fired: Cell<bool>,

    this: Weak<Self>,
}

impl<T: 'static> Handler<T> for OnceAdapter<T> {
    fn handle(&self, data: &T) -> std::result::Result<bool, ListenerError> {
        if self.fired.replace(true) {
            return Ok(false);
        }

        if let (Some(hub), Some(this)) = (self.hub.upgrade(), self.this.upgrade()) {
            hub.remove(&self.name, &Listener::from_handler(this));
        }

        self.inner.invoke(data)
    }
}
