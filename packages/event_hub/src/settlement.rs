//! Single-resolution future returned by [`EventHub::wait_for()`][crate::EventHub::wait_for].

use std::any::type_name;
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Why a [`Settlement`] did not produce the success data.
#[derive(Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum WaitError<T> {
    /// The failure event was raised first. Contains the data it was raised with.
    Failed(T),

    /// Neither event can be raised for this wait any more because its registrations were
    /// dropped, either together with the hub or via
    /// [`EventHub::remove_all_listeners()`][crate::EventHub::remove_all_listeners].
    Disconnected,
}

impl<T: Debug> Error for WaitError<T> {}

impl<T> Display for WaitError<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for error message.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(_) => write!(f, "the failure event was raised before the success event"),
            Self::Disconnected => write!(
                f,
                "the wait was disconnected before either event was raised"
            ),
        }
    }
}

enum SlotState<T> {
    /// Not settled. Holds the waker of whoever most recently polled the settlement, if anyone.
    Pending(Option<Waker>),

    Settled(Result<T, WaitError<T>>),

    /// The outcome has been handed out by `poll()`.
    Consumed,
}

struct Slot<T> {
    state: RefCell<SlotState<T>>,
}

impl<T> Slot<T> {
    /// Stores the outcome and wakes the awaiter. Returns `false` if the slot was already settled.
    fn settle(&self, outcome: Result<T, WaitError<T>>) -> bool {
        let waker = {
            let mut state = self.state.borrow_mut();

            let SlotState::Pending(waker) = &mut *state else {
                return false;
            };

            let waker = waker.take();
            *state = SlotState::Settled(outcome);
            waker
        };

        // Waking happens outside the borrow because a waker may poll synchronously.
        if let Some(waker) = waker {
            waker.wake();
        }

        true
    }
}

/// A future that resolves once with the outcome of a
/// [`EventHub::wait_for()`][crate::EventHub::wait_for] race.
///
/// * `Ok(data)` if the success event was raised first.
/// * `Err(WaitError::Failed(data))` if the failure event was raised first.
/// * `Err(WaitError::Disconnected)` if the wait can no longer complete.
///
/// The outcome is decided exactly once. Raising either event again afterwards has no effect
/// on the settlement.
///
/// # Panics
///
/// Polling the settlement again after it has returned [`Poll::Ready`] panics.
pub struct Settlement<T> {
    slot: Rc<Slot<T>>,
}

impl<T> Settlement<T> {
    /// Whether the outcome has been decided, so awaiting would complete immediately.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(*self.slot.state.borrow(), SlotState::Pending(_))
    }
}

impl<T> Future for Settlement<T> {
    type Output = Result<T, WaitError<T>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.slot.state.borrow_mut();

        if let SlotState::Pending(waker) = &mut *state {
            *waker = Some(cx.waker().clone());
            return Poll::Pending;
        }

        match mem::replace(&mut *state, SlotState::Consumed) {
            SlotState::Settled(outcome) => Poll::Ready(outcome),
            SlotState::Consumed => panic!("Settlement polled after completion"),
            SlotState::Pending(_) => unreachable!("pending state was handled above"),
        }
    }
}

impl<T> Debug for Settlement<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("is_settled", &self.is_settled())
            .finish()
    }
}

/// The producing side of a [`Settlement`].
///
/// Dropping the settler without calling [`settle()`][Self::settle] resolves the settlement
/// with [`WaitError::Disconnected`].
pub(crate) struct Settler<T> {
    slot: Rc<Slot<T>>,
}

impl<T> Settler<T> {
    pub(crate) fn settle(self, outcome: Result<T, WaitError<T>>) {
        self.slot.settle(outcome);
    }
}

impl<T> Drop for Settler<T> {
    fn drop(&mut self) {
        // No-op if `settle()` already ran.
        self.slot.settle(Err(WaitError::Disconnected));
    }
}

impl<T> Debug for Settler<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>()).finish_non_exhaustive()
    }
}

/// Creates a connected settler-settlement pair.
pub(crate) fn settlement_pair<T>() -> (Settler<T>, Settlement<T>) {
    let slot = Rc::new(Slot {
        state: RefCell::new(SlotState::Pending(None)),
    });

    (
        Settler {
            slot: Rc::clone(&slot),
        },
        Settlement { slot },
    )
}
