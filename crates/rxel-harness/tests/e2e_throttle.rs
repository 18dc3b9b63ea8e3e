//! E2E: render throttling on a lab-clock timer scheduler.
//!
//! 1. Three rapid writes within one interval, then silence: exactly two
//!    renders (leading, then trailing with the final value).
//! 2. Writes spaced further apart than the interval each render at once.
//! 3. A write landing during the trailing interval renders on the next
//!    boundary.
//! 4. `request_render` goes through the same throttle.
//! 5. A class with no fields renders once per attach.

#![forbid(unsafe_code)]

use std::rc::Rc;
use std::time::Duration;

use rxel_core::{ComponentClass, Value};
use rxel_harness::{ElementFixture, Snapshot};

fn single_field() -> Rc<ComponentClass> {
    let props = Rc::new(ComponentClass::new("x-meter"));
    props.get_or_create_field_config("level").expect("level field");
    props
}

fn attached(case: &str) -> ElementFixture {
    let mut fx = ElementFixture::new(case, single_field());
    fx.attach().expect("attach");
    fx.settle();
    fx.renders.clear();
    fx
}

fn levels(renders: &[Snapshot]) -> Vec<Value> {
    renders
        .iter()
        .map(|snapshot| snapshot[0].1.clone())
        .collect()
}

#[test]
fn rapid_writes_render_leading_and_trailing() {
    let mut fx = attached("rapid_writes");
    for level in 1..=3 {
        fx.set("level", level).expect("write");
        fx.advance(Duration::from_millis(2));
    }
    fx.settle();
    fx.evidence.emit();

    let outputs = fx.renders.outputs();
    assert_eq!(outputs.len(), 2, "leading + trailing only");
    assert_eq!(levels(&outputs), vec![Value::from(1), Value::from(3)]);
}

#[test]
fn spaced_writes_each_render_immediately() {
    let mut fx = attached("spaced_writes");
    for level in 1..=3 {
        fx.set("level", level).expect("write");
        assert_eq!(fx.renders.len(), level as usize);
        fx.advance(ElementFixture::INTERVAL * 2);
    }
    fx.evidence.emit();
    assert_eq!(
        levels(&fx.renders.outputs()),
        vec![Value::from(1), Value::from(2), Value::from(3)]
    );
}

#[test]
fn write_during_trailing_interval_renders_on_next_boundary() {
    let mut fx = attached("write_during_trailing");
    fx.set("level", 1).expect("write");
    fx.set("level", 2).expect("write");
    fx.advance(ElementFixture::INTERVAL);
    assert_eq!(fx.renders.len(), 2);

    fx.set("level", 3).expect("write");
    assert_eq!(fx.renders.len(), 2, "throttle re-armed after trailing render");
    fx.advance(ElementFixture::INTERVAL);
    fx.evidence.emit();
    assert_eq!(fx.renders.len(), 3);
    assert_eq!(fx.last_rendered("level"), Some(Value::from(3)));
}

#[test]
fn request_render_is_throttled() {
    let mut fx = attached("request_render");
    fx.element.request_render();
    fx.element.request_render();
    fx.element.request_render();
    assert_eq!(fx.renders.len(), 1);
    fx.settle();
    fx.evidence.emit();
    assert_eq!(fx.renders.len(), 2);
    assert_eq!(fx.element.render_count(), 3, "includes the attach render");
}

#[test]
fn request_render_while_detached_is_ignored() {
    let mut fx = attached("request_render_detached");
    fx.detach();
    fx.element.request_render();
    fx.settle();
    assert!(fx.renders.is_empty());
}

#[test]
fn fieldless_class_renders_once_per_attach() {
    let props = Rc::new(ComponentClass::new("x-static"));
    let mut fx = ElementFixture::new("fieldless", props);
    fx.attach().expect("attach");
    fx.settle();
    assert_eq!(fx.renders.len(), 1);
    fx.detach();
    fx.attach().expect("reattach");
    fx.settle();
    fx.evidence.emit();
    assert_eq!(fx.renders.len(), 2);
    assert!(fx.renders.outputs().iter().all(Vec::is_empty));
}
