//! Property configuration store.
//!
//! A [`ComponentClass`] accumulates one [`FieldConfig`] per declared field
//! while the class is being defined. Constructing the first instance seals the
//! class into an immutable [`ComponentConfig`] that every instance shares by
//! reference.
//!
//! # Invariants
//!
//! 1. Field order is declaration order; attribute enumeration follows it.
//! 2. External attribute names are unique within a class.
//! 3. After sealing, fields can be read but not created or changed.
//! 4. Field identifiers are non-empty strings.

use std::cell::RefCell;
use std::rc::Rc;

use crate::codec::Converter;
use crate::error::ConfigError;
use crate::logging::{debug, warn};
use crate::naming::to_kebab_case;

// ---------------------------------------------------------------------------
// FieldKey
// ---------------------------------------------------------------------------

/// Identifier a field is declared under.
///
/// Only named fields can be observed: the name doubles as the source of the
/// external attribute name. Symbolic keys exist so hosts that mint anonymous
/// property keys get a [`ConfigError`] instead of a silently unnamed field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Name(String),
    Symbol(u64),
}

impl FieldKey {
    fn into_name(self) -> Result<String, ConfigError> {
        match self {
            Self::Name(name) if name.is_empty() => Err(ConfigError::EmptyField),
            Self::Name(name) => Ok(name),
            Self::Symbol(id) => Err(ConfigError::NonStringField { id }),
        }
    }
}

impl From<&str> for FieldKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for FieldKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

// ---------------------------------------------------------------------------
// FieldConfig
// ---------------------------------------------------------------------------

/// Configuration of one declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    name: String,
    attribute: String,
    converter: Converter,
    notify: Option<String>,
    reflect: bool,
}

impl FieldConfig {
    /// A field with the default converter and no effects.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            attribute: to_kebab_case(&name),
            name,
            converter: Converter::Default,
            notify: None,
            reflect: false,
        }
    }

    /// Field (property) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// External attribute name.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    #[must_use]
    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Event dispatched on the host after each write, if any.
    #[must_use]
    pub fn notify_event(&self) -> Option<&str> {
        self.notify.as_deref()
    }

    /// Whether writes are reflected back to the attribute.
    #[must_use]
    pub const fn reflects(&self) -> bool {
        self.reflect
    }

    pub fn set_attribute(&mut self, attribute: impl Into<String>) -> &mut Self {
        self.attribute = attribute.into();
        self
    }

    pub fn set_converter(&mut self, converter: Converter) -> &mut Self {
        self.converter = converter;
        self
    }

    pub fn set_notify(&mut self, event: impl Into<String>) -> &mut Self {
        self.notify = Some(event.into());
        self
    }

    pub fn set_reflect(&mut self, reflect: bool) -> &mut Self {
        self.reflect = reflect;
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.set_attribute(attribute);
        self
    }

    #[must_use]
    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = converter;
        self
    }

    #[must_use]
    pub fn with_notify(mut self, event: impl Into<String>) -> Self {
        self.set_notify(event);
        self
    }

    #[must_use]
    pub fn with_reflect(mut self, reflect: bool) -> Self {
        self.reflect = reflect;
        self
    }
}

// ---------------------------------------------------------------------------
// ComponentConfig
// ---------------------------------------------------------------------------

/// Sealed, read-only configuration of a class.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentConfig {
    class_name: String,
    fields: Vec<FieldConfig>,
}

impl ComponentConfig {
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldConfig] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declaration index of a field.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// The field observing a given attribute.
    #[must_use]
    pub fn field_for_attribute(&self, attribute: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|f| f.attribute == attribute)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// External attribute names of every field, in declaration order.
///
/// This is the list a host runtime watches for attribute-change callbacks.
#[must_use]
pub fn observed_attribute_names(config: &ComponentConfig) -> Vec<String> {
    config.fields.iter().map(|f| f.attribute.clone()).collect()
}

// ---------------------------------------------------------------------------
// ComponentClass
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ClassState {
    fields: Vec<FieldConfig>,
    sealed: Option<Rc<ComponentConfig>>,
}

/// Class-scoped configuration record.
///
/// Populate fields with [`get_or_create_field_config`](Self::get_or_create_field_config)
/// and [`configure_field`](Self::configure_field) before any instance exists.
#[derive(Debug)]
pub struct ComponentClass {
    name: String,
    state: RefCell<ClassState>,
}

impl ComponentClass {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RefCell::new(ClassState::default()),
        }
    }

    /// Class name (for diagnostics).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the field's configuration, creating a default one on first use.
    ///
    /// Repeated calls for the same name return the same configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NonStringField`] for symbolic keys,
    /// [`ConfigError::EmptyField`] for empty names,
    /// [`ConfigError::Sealed`] when creating a field after sealing, and
    /// [`ConfigError::DuplicateAttribute`] when the default attribute name is
    /// already taken.
    pub fn get_or_create_field_config(
        &self,
        key: impl Into<FieldKey>,
    ) -> Result<FieldConfig, ConfigError> {
        let name = key.into().into_name()?;
        let mut state = self.state.borrow_mut();
        if let Some(existing) = state.fields.iter().find(|f| f.name == name) {
            return Ok(existing.clone());
        }
        if state.sealed.is_some() {
            return Err(self.sealed_error(&name));
        }
        let config = FieldConfig::new(name);
        check_unique_attribute(&state.fields, &config)?;
        state.fields.push(config.clone());
        Ok(config)
    }

    /// Get-or-create a field and apply `update` to its configuration.
    ///
    /// After sealing this only succeeds when `update` leaves the
    /// configuration unchanged.
    pub fn configure_field(
        &self,
        key: impl Into<FieldKey>,
        update: impl FnOnce(&mut FieldConfig),
    ) -> Result<FieldConfig, ConfigError> {
        let name = key.into().into_name()?;
        let (index, current) = {
            let state = self.state.borrow();
            let index = state.fields.iter().position(|f| f.name == name);
            let current = match index {
                Some(i) => state.fields[i].clone(),
                None => FieldConfig::new(name.clone()),
            };
            (index, current)
        };

        // The closure runs without the state borrowed.
        let mut updated = current.clone();
        update(&mut updated);
        updated.name = name;

        let mut state = self.state.borrow_mut();
        let index = index.or_else(|| state.fields.iter().position(|f| f.name == updated.name));
        if state.sealed.is_some() && (index.is_none() || updated != current) {
            warn!(class = %self.name, field = %updated.name, "config.change_after_seal");
            return Err(self.sealed_error(&updated.name));
        }

        let others: Vec<FieldConfig> = state
            .fields
            .iter()
            .filter(|f| f.name != updated.name)
            .cloned()
            .collect();
        check_unique_attribute(&others, &updated)?;

        match index {
            Some(i) => state.fields[i] = updated.clone(),
            None => state.fields.push(updated.clone()),
        }
        Ok(updated)
    }

    /// Freeze the configuration. Idempotent: later calls return the same record.
    pub fn seal(&self) -> Rc<ComponentConfig> {
        let mut state = self.state.borrow_mut();
        if let Some(sealed) = &state.sealed {
            return Rc::clone(sealed);
        }
        let config = Rc::new(ComponentConfig {
            class_name: self.name.clone(),
            fields: state.fields.clone(),
        });
        debug!(class = %self.name, fields = config.len(), "config.sealed");
        state.sealed = Some(Rc::clone(&config));
        config
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.state.borrow().sealed.is_some()
    }

    /// External attribute names in declaration order.
    #[must_use]
    pub fn observed_attribute_names(&self) -> Vec<String> {
        self.state
            .borrow()
            .fields
            .iter()
            .map(|f| f.attribute.clone())
            .collect()
    }

    fn sealed_error(&self, field: &str) -> ConfigError {
        ConfigError::Sealed {
            class: self.name.clone(),
            field: field.to_owned(),
        }
    }
}

fn check_unique_attribute(fields: &[FieldConfig], candidate: &FieldConfig) -> Result<(), ConfigError> {
    match fields
        .iter()
        .find(|f| f.name != candidate.name && f.attribute == candidate.attribute)
    {
        Some(clash) => Err(ConfigError::DuplicateAttribute {
            attribute: candidate.attribute.clone(),
            first: clash.name.clone(),
            second: candidate.name.clone(),
        }),
        None => Ok(()),
    }
}
