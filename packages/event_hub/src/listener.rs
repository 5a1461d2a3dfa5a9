use std::any::type_name;
use std::fmt::{self, Debug, Formatter};
use std::rc::{Rc, Weak};

use crate::ListenerError;

/// Logic invoked by a registered [`Listener`] when its event is raised.
///
/// Implemented by the wrappers around user closures and by the crate's own one-shot adapters.
pub(crate) trait Handler<T> {
    /// Returns `Ok(false)` if the handler had already done its work and skipped this call.
    fn handle(&self, data: &T) -> Result<bool, ListenerError>;
}

/// A handler that can be registered with an [`EventHub`][crate::EventHub].
///
/// The handle is cheap to clone and all clones refer to the same handler. Identity is what
/// matters for removal: [`EventHub::remove_listener()`][crate::EventHub::remove_listener]
/// removes a registration made with a clone of the same `Listener`, whereas two listeners
/// created from identical closures are unrelated.
///
/// # Example
///
/// ```
/// use event_hub::{EventHub, Listener};
///
/// let hub = EventHub::<u32>::new();
/// let print = Listener::new(|value: &u32| println!("got {value}"));
///
/// hub.on("tick", print.clone())?;
/// assert!(hub.emit("tick", 1)?);
///
/// hub.remove_listener("tick", &print)?;
/// assert!(!hub.emit("tick", 2)?);
/// # Ok::<(), event_hub::Error>(())
/// ```
pub struct Listener<T> {
    handler: Rc<dyn Handler<T>>,
}

impl<T: 'static> Listener<T> {
    /// Creates a listener from a closure that cannot fail.
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) + 'static,
    {
        Self::from_handler(Rc::new(InfallibleFn(f)))
    }

    /// Creates a listener from a closure that can fail.
    ///
    /// If the closure returns an error during dispatch, the dispatch stops: listeners later in
    /// the same dispatch are not called and the error is returned to whoever raised the event,
    /// wrapped in [`Error::ListenerFailed`][crate::Error::ListenerFailed].
    ///
    /// # Example
    ///
    /// ```
    /// use event_hub::{Error, EventHub, Listener};
    ///
    /// let hub = EventHub::<i64>::new();
    /// hub.on(
    ///     "deposit",
    ///     Listener::fallible(|amount: &i64| {
    ///         if *amount < 0 {
    ///             return Err("negative deposit".into());
    ///         }
    ///         Ok(())
    ///     }),
    /// )?;
    ///
    /// assert!(matches!(
    ///     hub.emit("deposit", -5),
    ///     Err(Error::ListenerFailed { .. })
    /// ));
    /// # Ok::<(), Error>(())
    /// ```
    #[must_use]
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn(&T) -> Result<(), ListenerError> + 'static,
    {
        Self::from_handler(Rc::new(FallibleFn(f)))
    }
}

impl<T> Listener<T> {
    pub(crate) fn from_handler(handler: Rc<dyn Handler<T>>) -> Self {
        Self { handler }
    }

    #[inline]
    pub(crate) fn invoke(&self, data: &T) -> Result<bool, ListenerError> {
        self.handler.handle(data)
    }

    pub(crate) fn downgrade(&self) -> WeakListener<T> {
        WeakListener {
            handler: Rc::downgrade(&self.handler),
        }
    }

    /// Whether both handles refer to the same handler.
    #[must_use]
    #[inline]
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.handler, &other.handler)
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            handler: Rc::clone(&self.handler),
        }
    }
}

impl<T> Debug for Listener<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("handler", &Rc::as_ptr(&self.handler).cast::<()>())
            .finish()
    }
}

/// A handle to a listener that does not keep the handler alive.
///
/// One-shot adapters use this to refer to their own registrations without creating
/// reference cycles through the registry.
pub(crate) struct WeakListener<T> {
    handler: Weak<dyn Handler<T>>,
}

impl<T> WeakListener<T> {
    pub(crate) fn upgrade(&self) -> Option<Listener<T>> {
        self.handler.upgrade().map(Listener::from_handler)
    }
}

impl<T> Debug for WeakListener<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("alive", &(self.handler.strong_count() > 0))
            .finish()
    }
}

struct InfallibleFn<F>(F);

impl<T, F> Handler<T> for InfallibleFn<F>
where
    F: Fn(&T),
{
    fn handle(&self, data: &T) -> Result<bool, ListenerError> {
        (self.0)(data);
        Ok(true)
    }
}

struct FallibleFn<F>(F);

impl<T, F> Handler<T> for FallibleFn<F>
where
    F: Fn(&T) -> Result<(), ListenerError>,
{
    fn handle(&self, data: &T) -> Result<bool, ListenerError> {
        (self.0)(data).map(|()| true)
    }
}
