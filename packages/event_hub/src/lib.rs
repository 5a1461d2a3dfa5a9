#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Named-event dispatch for coordinating independent producers and consumers on one thread.
//!
//! An [`EventHub`] maps event names to ordered lists of [`Listener`]s. Producers raise an event
//! by name with some data and every listener registered for that name is called with it.
//!
//! On top of plain registration the hub offers one-shot primitives:
//!
//! * [`EventHub::once()`] - call a listener on the next dispatch of an event only.
//! * [`EventHub::wait_for()`] - a future that resolves with whichever of a success/failure
//!   event pair is raised first.
//! * [`EventHub::callback_once()`] - the same race, reported to a callback.
//!
//! This is part of the [Folo project](https://github.com/folo-rs/folo) that provides mechanisms for
//! high-performance hardware-aware programming in Rust.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use event_hub::{EventHub, Listener};
//! # use futures::executor::block_on;
//!
//! let hub = EventHub::<String>::with_allowed_events(["message", "ready", "failed"])?;
//! let inbox = Rc::new(RefCell::new(Vec::new()));
//!
//! hub.on(
//!     "message",
//!     Listener::new({
//!         let inbox = Rc::clone(&inbox);
//!         move |text: &String| inbox.borrow_mut().push(text.clone())
//!     }),
//! )?;
//!
//! let ready = hub.wait_for("ready", "failed")?;
//!
//! hub.emit("message", "hello".to_string())?;
//! hub.emit("ready", "all systems go".to_string())?;
//!
//! assert_eq!(*inbox.borrow(), vec!["hello".to_string()]);
//! assert_eq!(block_on(ready).unwrap(), "all systems go");
//!
//! // Events outside the allow-list are rejected.
//! assert!(hub.emit("mesage", "typo".to_string()).is_err());
//! # Ok::<(), event_hub::Error>(())
//! ```
//!
//! # Dispatch
//!
//! Raising an event captures the listeners registered for it at that moment and calls them in
//! registration order. Listeners may register and remove listeners (including themselves) or
//! raise further events while being called; registry changes only affect later dispatches.
//!
//! By default listeners are called before [`EventHub::emit()`] returns. A hub built with
//! [`DispatchMode::Deferred`] queues dispatches until [`EventHub::run_deferred()`] is called.
//!
//! # Errors
//!
//! Invalid event names are reported synchronously by the operation that received them, as
//! [`Error::InvalidArgument`] or [`Error::UnknownEvent`]. A fallible listener that returns an
//! error stops the dispatch it is part of and the error is returned as
//! [`Error::ListenerFailed`].
//!
//! # Logging
//!
//! The crate emits [`tracing`] events (`debug` for hub creation and listener failures, `trace`
//! for registry changes and dispatches). It does not install a subscriber.

mod builder;
mod dispatch;
mod error;
mod event_name;
mod hub;
mod listener;
mod race;
mod settlement;

pub use builder::*;
pub use dispatch::DispatchMode;
pub(crate) use dispatch::{DeferredQueue, PendingDispatch};
pub use error::*;
pub use event_name::*;
pub(crate) use hub::HubCore;
pub use hub::{EventHub, WeakEventHub};
pub use listener::Listener;
pub(crate) use listener::WeakListener;
pub(crate) use race::race_events;
pub use settlement::{Settlement, WaitError};
pub(crate) use settlement::settlement_pair;
