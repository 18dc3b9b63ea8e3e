//! Property effects.
//!
//! An effect is a (predicate, handler) pair: [`PropertyEffect::applies`]
//! inspects a field's configuration, [`PropertyEffect::apply`] performs the
//! side effect on the host. The change feed runs every applicable effect in
//! registry order on every raw write of a field, including writes that do not
//! change the value.
//!
//! The standard registry holds [`NotifyEffect`] then [`ReflectEffect`].
//! Additional effects are appended with [`EffectRegistry::with`].

use std::fmt;
use std::rc::Rc;

use crate::codec::encode;
use crate::config::FieldConfig;
use crate::error::EffectError;
use crate::logging::trace;
use crate::value::Value;

/// The part of a host element that effects write to.
pub trait EffectTarget {
    /// Dispatch a named, payload-free event on the host.
    fn dispatch_event(&self, name: &str);

    /// Write an attribute on the host.
    fn set_attribute(&self, name: &str, value: &str);
}

/// A side effect triggered by field writes.
pub trait PropertyEffect: fmt::Debug {
    /// Effect name for logs and errors.
    fn name(&self) -> &'static str;

    /// Whether this effect handles writes to a field with `config`.
    fn applies(&self, config: &FieldConfig) -> bool;

    /// Perform the effect for a write of `value` to `field`.
    fn apply(
        &self,
        host: &dyn EffectTarget,
        field: &str,
        value: &Value,
        config: &FieldConfig,
    ) -> Result<(), EffectError>;
}

/// Dispatches the field's notify event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyEffect;

impl PropertyEffect for NotifyEffect {
    fn name(&self) -> &'static str {
        "notify"
    }

    fn applies(&self, config: &FieldConfig) -> bool {
        config.notify_event().is_some()
    }

    fn apply(
        &self,
        host: &dyn EffectTarget,
        _field: &str,
        _value: &Value,
        config: &FieldConfig,
    ) -> Result<(), EffectError> {
        if let Some(event) = config.notify_event() {
            host.dispatch_event(event);
        }
        Ok(())
    }
}

/// Writes the encoded value back to the field's attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReflectEffect;

impl PropertyEffect for ReflectEffect {
    fn name(&self) -> &'static str {
        "reflect"
    }

    fn applies(&self, config: &FieldConfig) -> bool {
        config.reflects()
    }

    fn apply(
        &self,
        host: &dyn EffectTarget,
        _field: &str,
        value: &Value,
        config: &FieldConfig,
    ) -> Result<(), EffectError> {
        let text = encode(value, config)?;
        host.set_attribute(config.attribute(), &text);
        Ok(())
    }
}

/// Ordered list of property effects.
#[derive(Debug, Clone)]
pub struct EffectRegistry {
    effects: Vec<Rc<dyn PropertyEffect>>,
}

impl EffectRegistry {
    /// A registry with no effects.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            effects: Vec::new(),
        }
    }

    /// Notify, then reflect.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty().with(NotifyEffect).with(ReflectEffect)
    }

    /// Append an effect; it runs after every effect already registered.
    #[must_use]
    pub fn with(mut self, effect: impl PropertyEffect + 'static) -> Self {
        self.push(Rc::new(effect));
        self
    }

    pub fn push(&mut self, effect: Rc<dyn PropertyEffect>) {
        self.effects.push(effect);
    }

    /// Effect names in evaluation order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.effects.iter().map(|e| e.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Run every applicable effect in order.
    ///
    /// A failing effect does not stop later ones; the first error is returned.
    pub fn run(
        &self,
        host: &dyn EffectTarget,
        field: &str,
        value: &Value,
        config: &FieldConfig,
    ) -> Result<(), EffectError> {
        let mut first_error = None;
        for effect in self.effects.iter().filter(|e| e.applies(config)) {
            trace!(effect = effect.name(), field, "effect.apply");
            if let Err(err) = effect.apply(host, field, value, config) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Converter;
    use crate::value::HostObject;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Log(RefCell<Vec<String>>);

    impl EffectTarget for Log {
        fn dispatch_event(&self, name: &str) {
            self.0.borrow_mut().push(format!("event:{name}"));
        }

        fn set_attribute(&self, name: &str, value: &str) {
            self.0.borrow_mut().push(format!("attr:{name}={value}"));
        }
    }

    #[derive(Debug)]
    struct Opaque;

    impl HostObject for Opaque {
        fn to_attribute_string(&self) -> Option<String> {
            None
        }
    }

    #[derive(Debug)]
    struct Marker;

    impl PropertyEffect for Marker {
        fn name(&self) -> &'static str {
            "marker"
        }

        fn applies(&self, _config: &FieldConfig) -> bool {
            true
        }

        fn apply(
            &self,
            host: &dyn EffectTarget,
            field: &str,
            _value: &Value,
            _config: &FieldConfig,
        ) -> Result<(), EffectError> {
            host.dispatch_event(&format!("marker-{field}"));
            Ok(())
        }
    }

    #[test]
    fn no_flags_no_effects() {
        let host = Log::default();
        let cfg = FieldConfig::new("plain");
        EffectRegistry::standard()
            .run(&host, "plain", &Value::from(1), &cfg)
            .unwrap();
        assert!(host.0.borrow().is_empty());
    }

    #[test]
    fn notify_then_reflect_in_order() {
        let host = Log::default();
        let cfg = FieldConfig::new("maxItems")
            .with_notify("max-changed")
            .with_reflect(true);
        EffectRegistry::standard()
            .run(&host, "maxItems", &Value::from(3), &cfg)
            .unwrap();
        assert_eq!(
            *host.0.borrow(),
            vec!["event:max-changed".to_owned(), "attr:max-items=3".to_owned()]
        );
    }

    #[test]
    fn reflect_uses_converter() {
        let host = Log::default();
        let cfg = FieldConfig::new("data")
            .with_converter(Converter::Json)
            .with_reflect(true);
        EffectRegistry::standard()
            .run(&host, "data", &Value::from("x"), &cfg)
            .unwrap();
        assert_eq!(*host.0.borrow(), vec!["attr:data=\"x\"".to_owned()]);
    }

    #[test]
    fn reflect_failure_is_reported_after_other_effects_run() {
        let host = Log::default();
        let cfg = FieldConfig::new("obj").with_reflect(true);
        let registry = EffectRegistry::standard().with(Marker);
        let err = registry
            .run(&host, "obj", &Value::object(Opaque), &cfg)
            .unwrap_err();
        assert!(matches!(err, EffectError::Serialization(_)));
        assert_eq!(*host.0.borrow(), vec!["event:marker-obj".to_owned()]);
    }

    #[test]
    fn registry_order() {
        let registry = EffectRegistry::standard().with(Marker);
        assert_eq!(registry.names(), vec!["notify", "reflect", "marker"]);
        assert!(EffectRegistry::empty().is_empty());
    }
}
