//! Example that demonstrates the exact usage shown in the README.md file.
//!
//! This shows how to register listeners, raise events and wait for one of two outcomes.

use std::cell::Cell;
use std::rc::Rc;

use event_hub::{EventHub, Listener};
use futures::executor::block_on;

fn main() {
    println!("=== EventHub README Example ===");

    let hub = EventHub::<u32>::with_allowed_events(["progress", "done", "failed"]).unwrap();

    let total = Rc::new(Cell::new(0_u32));
    hub.on(
        "progress",
        Listener::new({
            let total = Rc::clone(&total);
            move |step: &u32| total.set(total.get().wrapping_add(*step))
        }),
    )
    .unwrap();

    hub.once("done", Listener::new(|code: &u32| println!("Done with code {code}"))).unwrap();

    let outcome = hub.wait_for("done", "failed").unwrap();

    for step in [10, 20, 30] {
        hub.emit("progress", step).unwrap();
    }
    hub.emit("done", 0).unwrap();

    println!("Total progress: {}", total.get());
    println!("Outcome: {:?}", block_on(outcome));

    // Both one-shot registrations are gone once "done" has been raised.
    assert!(!hub.has_listeners("done").unwrap());
    assert!(!hub.has_listeners("failed").unwrap());

    println!("README example completed successfully!");
}
