//! Integration tests exercising the public API of `event_hub` the way an application would.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use event_hub::{DispatchMode, Error, EventHub, Listener, WaitError};
use futures::executor::block_on;

fn counter() -> (Rc<Cell<usize>>, Listener<u32>) {
    let count = Rc::new(Cell::new(0_usize));
    let listener = Listener::new({
        let count = Rc::clone(&count);
        move |_: &u32| count.set(count.get().wrapping_add(1))
    });

    (count, listener)
}

#[test]
fn every_operation_accepts_any_name_without_allow_list() {
    let hub = EventHub::<u32>::new();
    let (count, listener) = counter();

    for name in ["a", "with space", "ünïcödé", "x.y/z"] {
        hub.on(name, listener.clone()).unwrap();
        hub.once(name, listener.clone()).unwrap();
        assert!(hub.emit(name, 0).unwrap());
        hub.remove_listener(name, &listener).unwrap();
        let _settlement = hub.wait_for(name, "other").unwrap();
        hub.callback_once(name, "other", |_| {}).unwrap();
    }

    assert_eq!(count.get(), 8);
}

#[test]
fn every_operation_rejects_unlisted_names() {
    let hub = EventHub::<u32>::with_allowed_events(["allowed", "also_allowed"]).unwrap();
    let (_, listener) = counter();

    let is_unknown = |result: Result<(), Error>| matches!(result, Err(Error::UnknownEvent { .. }));

    assert!(is_unknown(hub.on("other", listener.clone()).map(drop)));
    assert!(is_unknown(hub.once("other", listener.clone()).map(drop)));
    assert!(is_unknown(hub.remove_listener("other", &listener).map(drop)));
    assert!(is_unknown(hub.emit("other", 1).map(drop)));
    assert!(is_unknown(hub.wait_for("allowed", "other").map(drop)));
    assert!(is_unknown(hub.callback_once("other", "allowed", |_| {}).map(drop)));

    hub.on("allowed", listener.clone()).unwrap();
    assert!(hub.emit("allowed", 1).unwrap());
}

#[test]
fn emit_passes_same_data_to_every_listener() {
    let hub = EventHub::<Vec<u8>>::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    for label in 0..3_u8 {
        let seen = Rc::clone(&seen);
        hub.on(
            "payload",
            Listener::new(move |data: &Vec<u8>| seen.borrow_mut().push((label, data.clone()))),
        )
        .unwrap();
    }

    assert!(hub.emit("payload", vec![1, 2, 3]).unwrap());

    assert_eq!(
        *seen.borrow(),
        vec![(0, vec![1, 2, 3]), (1, vec![1, 2, 3]), (2, vec![1, 2, 3])]
    );
}

#[test]
fn double_registration_minus_one_removal_runs_once() {
    let hub = EventHub::<u32>::new();
    let (count, f) = counter();

    hub.on("e", f.clone()).unwrap();
    hub.on("e", f.clone()).unwrap();
    hub.remove_listener("e", &f).unwrap();

    hub.emit("e", 0).unwrap();

    assert_eq!(count.get(), 1);
}

#[test]
fn once_fires_on_exactly_one_emit() {
    let hub = EventHub::<u32>::new();
    let (count, listener) = counter();

    hub.once("e", listener).unwrap();

    assert!(hub.emit("e", 0).unwrap());
    for _ in 0..5 {
        assert!(!hub.emit("e", 0).unwrap());
    }

    assert_eq!(count.get(), 1);
}

#[test]
fn wait_for_success_removes_failure_registration() {
    let hub = EventHub::<String>::new();

    let settlement = hub.wait_for("connected", "connect_failed").unwrap();

    hub.emit("connected", "10.0.0.1".to_string()).unwrap();
    assert!(!hub.emit("connect_failed", "timeout".to_string()).unwrap());

    assert_eq!(block_on(settlement), Ok("10.0.0.1".to_string()));
}

#[test]
fn wait_for_same_names_fails_synchronously() {
    let hub = EventHub::<u32>::new();

    let result = hub.wait_for("e", "e");

    assert!(matches!(result, Err(Error::InvalidArgument { .. })));
}

#[test]
fn callback_once_then_failure_event_has_no_listeners() {
    let hub = EventHub::<&'static str>::new();
    let calls = Rc::new(RefCell::new(Vec::new()));

    hub.callback_once("s", "f", {
        let calls = Rc::clone(&calls);
        move |outcome| calls.borrow_mut().push(outcome)
    })
    .unwrap();

    assert!(hub.emit("s", "data").unwrap());
    assert!(!hub.emit("f", "error").unwrap());

    assert_eq!(*calls.borrow(), vec![Ok("data")]);
}

#[test]
fn two_waits_on_same_pair_both_settle() {
    let hub = EventHub::<u32>::new();

    let a = hub.wait_for("s", "f").unwrap();
    let b = hub.wait_for("s", "f").unwrap();

    hub.emit("s", 7).unwrap();

    assert_eq!(block_on(a), Ok(7));
    assert_eq!(block_on(b), Ok(7));
}

#[test]
fn wait_for_failure_carries_error_data() {
    let hub = EventHub::<Rc<str>>::new();

    let settlement = hub.wait_for("done", "error").unwrap();
    hub.emit("error", Rc::from("disk full")).unwrap();

    let Err(WaitError::Failed(reason)) = block_on(settlement) else {
        panic!("expected the failure event to win");
    };
    assert_eq!(&*reason, "disk full");
}

#[test]
fn listener_can_chain_waits_through_weak_hub() {
    let hub = EventHub::<u32>::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    // Each "step" schedules a one-shot listener for the next step.
    let weak = hub.downgrade();
    let step_log = Rc::clone(&log);
    hub.on(
        "step",
        Listener::new(move |n: &u32| {
            let log = Rc::clone(&step_log);
            let expected = *n;
            weak.upgrade()
                .unwrap()
                .once(
                    "step_done",
                    Listener::new(move |m: &u32| log.borrow_mut().push((expected, *m))),
                )
                .unwrap();
        }),
    )
    .unwrap();

    hub.emit("step", 1).unwrap();
    hub.emit("step_done", 10).unwrap();
    hub.emit("step", 2).unwrap();
    hub.emit("step_done", 20).unwrap();
    hub.emit("step_done", 30).unwrap();

    assert_eq!(*log.borrow(), vec![(1, 10), (2, 20)]);
}

#[test]
fn deferred_hub_runs_nested_emits_in_same_drain() {
    let hub = EventHub::<u32>::builder()
        .dispatch_mode(DispatchMode::Deferred)
        .build()
        .unwrap();
    let order = Rc::new(RefCell::new(Vec::new()));

    let weak = hub.downgrade();
    let first_order = Rc::clone(&order);
    hub.on(
        "first",
        Listener::new(move |n: &u32| {
            first_order.borrow_mut().push(format!("first:{n}"));
            weak.upgrade().unwrap().emit("second", n.wrapping_add(1)).unwrap();
        }),
    )
    .unwrap();

    let second_order = Rc::clone(&order);
    hub.on(
        "second",
        Listener::new(move |n: &u32| second_order.borrow_mut().push(format!("second:{n}"))),
    )
    .unwrap();

    hub.emit("first", 1).unwrap();

    // Nothing runs on the emitting call stack.
    assert!(order.borrow().is_empty());

    assert_eq!(hub.run_deferred().unwrap(), 2);
    assert_eq!(*order.borrow(), vec!["first:1", "second:2"]);
}
