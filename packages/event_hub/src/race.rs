//! The primitive behind [`EventHub::wait_for()`][crate::EventHub::wait_for] and
//! [`EventHub::callback_once()`][crate::EventHub::callback_once]: register on two events, let the
//! first one raised decide the outcome, then deregister from both.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::listener::Handler;
use crate::{EventName, HubCore, Listener, ListenerError, WeakListener};

type OnSettle<T> = Box<dyn FnOnce(Result<T, T>)>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Side {
    Success,
    Failure,
}

struct RaceState<T> {
    hub: Weak<HubCore<T>>,
    success: EventName,
    failure: EventName,

    /// Taken by whichever side fires first. Dropped unused if both registrations are dropped
    /// without firing.
    on_settle: RefCell<Option<OnSettle<T>>>,

    /// The two registrations, held weakly because the registrations themselves own this state.
    registrations: RefCell<Option<(WeakListener<T>, WeakListener<T>)>>,
}

impl<T> RaceState<T> {
    fn deregister(&self) {
        let Some((success, failure)) = self.registrations.borrow_mut().take() else {
            return;
        };

        let Some(hub) = self.hub.upgrade() else {
            return;
        };

        if let Some(listener) = success.upgrade() {
            hub.remove(&self.success, &listener);
        }

        if let Some(listener) = failure.upgrade() {
            hub.remove(&self.failure, &listener);
        }
    }
}

struct RaceSide<T> {
    state: Rc<RaceState<T>>,
    side: Side,
}

impl<T: Clone> Handler<T> for RaceSide<T> {
    fn handle(&self, data: &T) -> Result<bool, ListenerError> {
        // Taking the callback first makes any later call a no-op, including calls from
        // dispatches that captured this registration before it was removed.
        let Some(on_settle) = self.state.on_settle.borrow_mut().take() else {
            return Ok(false);
        };

        trace!(
            success = %self.state.success,
            failure = %self.state.failure,
            side = ?self.side,
            "race settled"
        );

        self.state.deregister();

        on_settle(match self.side {
            Side::Success => Ok(data.clone()),
            Side::Failure => Err(data.clone()),
        });

        Ok(true)
    }
}

/// Registers one-shot listeners on `success` and `failure`. The first of them to be raised calls
/// `on_settle` with `Ok(data)` or `Err(data)` respectively and removes both registrations.
///
/// The caller is responsible for validating the event names.
pub(crate) fn race_events<T, F>(
    hub: &Rc<HubCore<T>>,
    success: EventName,
    failure: EventName,
    on_settle: F,
) where
    T: Clone + 'static,
    F: FnOnce(Result<T, T>) + 'static,
{
    debug_assert_ne!(success, failure);

    let state = Rc::new(RaceState {
        hub: Rc::downgrade(hub),
        success: success.clone(),
        failure: failure.clone(),
        on_settle: RefCell::new(Some(Box::new(on_settle))),
        registrations: RefCell::new(None),
    });

    let success_listener = Listener::from_handler(Rc::new(RaceSide {
        state: Rc::clone(&state),
        side: Side::Success,
    }));

    let failure_listener = Listener::from_handler(Rc::new(RaceSide {
        state: Rc::clone(&state),
        side: Side::Failure,
    }));

    *state.registrations.borrow_mut() =
        Some((success_listener.downgrade(), failure_listener.downgrade()));

    // From here on the registry owns the state, through the listeners.
    drop(state);

    hub.insert(success, success_listener);
    hub.insert(failure, failure_listener);
}
