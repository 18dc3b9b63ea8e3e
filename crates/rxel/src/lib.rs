#![forbid(unsafe_code)]

//! rxel public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users:
//! declare fields on a [`ComponentClass`](prelude::ComponentClass), build an
//! [`ElementClass`](prelude::ElementClass) with a template and a render
//! function, then drive each [`Element`](prelude::Element) from the host's
//! lifecycle callbacks.

pub use rxel_core as core;
pub use rxel_runtime as runtime;

pub mod prelude {
    pub use rxel_core as core;
    pub use rxel_runtime as runtime;

    pub use rxel_core::{
        ComponentClass, ComponentConfig, Converter, EffectRegistry, EffectTarget, FieldConfig,
        PropertyEffect, Value,
    };
    pub use rxel_runtime::{
        AnyStream, ChangeEvent, Element, ElementClass, ElementError, FrameScheduler,
        HostElement, Props, RenderRoot, Scheduler, Stream, Subject, SyncScheduler,
        TimerScheduler,
    };
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::prelude::*;

    #[derive(Default)]
    struct Host {
        events: RefCell<Vec<String>>,
    }

    impl EffectTarget for Host {
        fn dispatch_event(&self, name: &str) {
            self.events.borrow_mut().push(name.to_owned());
        }

        fn set_attribute(&self, _name: &str, _value: &str) {}
    }

    impl HostElement for Host {
        type Surface = ();

        fn attach_isolated_root(&self) {}
    }

    #[test]
    fn prelude_builds_a_working_element() {
        let props = Rc::new(ComponentClass::new("x-greeting"));
        props
            .configure_field("name", |f| {
                f.set_notify("name-changed");
            })
            .expect("field");

        let rendered = Rc::new(RefCell::new(Vec::<String>::new()));
        let sink = Rc::clone(&rendered);
        let class = ElementClass::builder(props).build(
            |p: &Props| format!("hello {}", p.value("name")),
            move |html: String, _root: &RenderRoot<Host>| sink.borrow_mut().push(html),
        );
        let host = Rc::new(Host::default());
        let element = Element::new(&class, Rc::clone(&host));

        element.on_attach().expect("attach");
        element.set("name", "rxel").expect("write");

        assert_eq!(host.events.borrow().last().map(String::as_str), Some("name-changed"));
        assert_eq!(rendered.borrow().last().map(String::as_str), Some("hello rxel"));
    }
}
