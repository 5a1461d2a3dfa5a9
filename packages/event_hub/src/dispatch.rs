use std::cell::RefCell;
use std::collections::VecDeque;

use crate::{EventName, Listener};

/// When the listeners of a raised event are called.
///
/// Configured via [`EventHubBuilder::dispatch_mode()`][crate::EventHubBuilder::dispatch_mode].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum DispatchMode {
    /// Listeners are called before [`EventHub::emit()`][crate::EventHub::emit] returns,
    /// on the call stack of the caller that raised the event.
    #[default]
    Immediate,

    /// [`EventHub::emit()`][crate::EventHub::emit] only captures the listeners that are
    /// registered at that moment. They are called later, when the owner of the hub calls
    /// [`EventHub::run_deferred()`][crate::EventHub::run_deferred].
    Deferred,
}

/// A raised event whose listeners have been captured but not yet called.
#[derive(Debug)]
pub(crate) struct PendingDispatch<T> {
    pub(crate) name: EventName,
    pub(crate) data: T,
    pub(crate) snapshot: Vec<Listener<T>>,
}

/// FIFO queue of dispatches waiting for [`EventHub::run_deferred()`][crate::EventHub::run_deferred].
#[derive(Debug)]
pub(crate) struct DeferredQueue<T> {
    pending: RefCell<VecDeque<PendingDispatch<T>>>,
}

impl<T> DeferredQueue<T> {
    pub(crate) fn new() -> Self {
        Self {
            pending: RefCell::new(VecDeque::new()),
        }
    }

    pub(crate) fn push(&self, dispatch: PendingDispatch<T>) {
        self.pending.borrow_mut().push_back(dispatch);
    }

    /// Removes the oldest pending dispatch. The borrow is released before returning, so the
    /// caller may call listeners that queue new dispatches.
    pub(crate) fn pop(&self) -> Option<PendingDispatch<T>> {
        self.pending.borrow_mut().pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.borrow().len()
    }
}
