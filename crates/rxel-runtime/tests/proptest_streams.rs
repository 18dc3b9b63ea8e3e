//! Property-based invariant tests for the reactive primitives and the
//! lifecycle bridge.
//!
//! 1. `dedupe` emits exactly one value per maximal run of equal values.
//! 2. `merge` forwards every value in arrival order.
//! 3. A leading+trailing throttle never emits more than one value per
//!    boundary and always ends on the last value.
//! 4. Registering a stream any number of times while attached yields one
//!    subscription and one execution per event.
//! 5. Detach/attach sequences keep "subscribed iff attached".

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use proptest::prelude::*;
use rxel_runtime::{FrameScheduler, LifecycleBridge, Stream, Subject};
use serde_json::{Value as Json, json};

// ── Strategies ────────────────────────────────────────────────────────────

fn small_values() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..4, 0..64)
}

fn json_values() -> impl Strategy<Value = Vec<Json>> {
    prop::collection::vec(
        prop_oneof![
            Just(Json::Null),
            any::<bool>().prop_map(Json::Bool),
            (0i64..3).prop_map(|n| json!(n)),
            "[ab]{0,2}".prop_map(Json::String),
        ],
        0..48,
    )
}

/// Throttle script step: emit a value, or run one frame.
#[derive(Debug, Clone)]
enum Step {
    Emit(u16),
    Frame,
}

fn steps() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(
        prop_oneof![
            3 => any::<u16>().prop_map(Step::Emit),
            1 => Just(Step::Frame),
        ],
        1..64,
    )
}

fn runs<T: PartialEq + Clone>(values: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for v in values {
        if out.last() != Some(v) {
            out.push(v.clone());
        }
    }
    out
}

fn collect<T: Clone + 'static>(
    stream: &Stream<T>,
) -> (Rc<RefCell<Vec<T>>>, rxel_runtime::Subscription) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    let sub = stream.subscribe(move |v: &T| s.borrow_mut().push(v.clone()));
    (seen, sub)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. dedupe: one emission per run
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn dedupe_emits_one_value_per_run(values in small_values()) {
        let subject = Subject::new();
        let (seen, _sub) = collect(&subject.stream().dedupe());
        for v in &values {
            subject.next(v);
        }
        prop_assert_eq!(&*seen.borrow(), &runs(&values));
    }

    #[test]
    fn dedupe_uses_structural_json_equality(values in json_values()) {
        let subject = Subject::new();
        let (seen, _sub) = collect(&subject.stream().dedupe());
        for v in &values {
            subject.next(v);
        }
        let seen = seen.borrow();
        prop_assert_eq!(&*seen, &runs(&values));
        for pair in seen.windows(2) {
            prop_assert_ne!(&pair[0], &pair[1]);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. merge: arrival order
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn merge_preserves_arrival_order(script in prop::collection::vec((0usize..3, any::<u8>()), 0..64)) {
        let sources: Vec<Subject<u8>> = (0..3).map(|_| Subject::new()).collect();
        let merged = Stream::merge(sources.iter().map(Subject::stream));
        let (seen, _sub) = collect(&merged);
        for (source, value) in &script {
            sources[*source].next(value);
        }
        let expected: Vec<u8> = script.iter().map(|(_, v)| *v).collect();
        prop_assert_eq!(&*seen.borrow(), &expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. throttle: at most one emission per boundary, ends on the last value
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn throttle_emits_leading_and_latest_trailing(script in steps()) {
        let frames = Rc::new(FrameScheduler::new());
        let subject = Subject::new();
        let (seen, _sub) = collect(&subject.stream().throttle(frames.clone()));

        let mut emitted_values = Vec::new();
        let mut per_frame = Vec::new();
        for step in &script {
            match step {
                Step::Emit(v) => {
                    emitted_values.push(*v);
                    subject.next(v);
                }
                Step::Frame => {
                    let before = seen.borrow().len();
                    frames.run_frame();
                    per_frame.push(seen.borrow().len() - before);
                }
            }
        }
        // Drain whatever is pending.
        for _ in 0..2 {
            frames.run_frame();
        }

        let seen = seen.borrow();
        prop_assert!(per_frame.iter().all(|n| *n <= 1));
        prop_assert!(seen.len() <= emitted_values.len());
        if let Some(last) = emitted_values.last() {
            prop_assert_eq!(seen.last(), Some(last));
            prop_assert_eq!(seen.first(), emitted_values.first());
        } else {
            prop_assert!(seen.is_empty());
        }
        prop_assert_eq!(frames.pending(), 0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Registration idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn repeated_registration_subscribes_once(
        repeats in 1usize..8,
        events in 0usize..16,
        attach_first in any::<bool>(),
    ) {
        let bridge = LifecycleBridge::new();
        let subject: Subject<()> = Subject::new();
        let runs = Rc::new(Cell::new(0usize));
        let r = Rc::clone(&runs);
        let stream = subject.stream().inspect(move |()| r.set(r.get() + 1));

        if attach_first {
            bridge.on_attach();
        }
        for _ in 0..repeats {
            bridge.register_streams([stream.erase()]);
        }
        if !attach_first {
            bridge.on_attach();
        }
        for _ in 0..events {
            subject.next(&());
        }

        prop_assert_eq!(bridge.registered_count(), 1);
        prop_assert_eq!(bridge.active_count(), 1);
        prop_assert_eq!(subject.observer_count(), 1);
        prop_assert_eq!(runs.get(), events);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Subscribed iff attached
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn subscriptions_follow_attachment(ops in prop::collection::vec(any::<bool>(), 0..32)) {
        let bridge = LifecycleBridge::new();
        let subject: Subject<()> = Subject::new();
        bridge.register_streams([subject.stream().erase()]);
        for attach in ops {
            if attach {
                bridge.on_attach();
            } else {
                bridge.on_detach();
            }
            let expected = usize::from(bridge.is_attached());
            prop_assert_eq!(bridge.active_count(), expected);
            prop_assert_eq!(subject.observer_count(), expected);
        }
    }
}
