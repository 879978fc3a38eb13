//! Entity identity and the raw attribute bag carried by every entity.
//!
//! An entity is an integer key plus a JSON attribute map. What the map may
//! hold is decided by the component schemas registered for the entity's
//! `type`; this module only stores and reads it.

use serde_json::Value;

use crate::error::{Result, ValidationError};

/// Integer key of an entity, stable across turns.
pub type EntityId = u64;

/// Attribute name to raw value, as found in the state document.
pub type AttributeMap = serde_json::Map<String, Value>;

/// Identity component attached to every spawned entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: EntityId,
    /// The `type` tag that selected this entity's component list
    pub kind: String,
}

/// Raw attribute component, validated against the entity's schemas
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(pub AttributeMap);

impl Attributes {
    pub fn new(map: AttributeMap) -> Self {
        Self(map)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.0.insert(name.to_string(), value.into());
    }

    /// Read a required integer attribute.
    pub fn int(&self, name: &str) -> Result<i64> {
        int_attribute(&self.0, name)
    }

    pub fn as_map(&self) -> &AttributeMap {
        &self.0
    }
}

/// Read a required integer attribute out of a raw map.
pub fn int_attribute(map: &AttributeMap, name: &str) -> Result<i64> {
    match map.get(name) {
        None => Err(ValidationError::new(format!("'{}' is required.", name))),
        Some(value) => value
            .as_i64()
            .ok_or_else(|| ValidationError::new(format!("'{}' must be an integer.", name))),
    }
}

/// Read an optional integer attribute; absent and `null` both read as `None`.
pub fn optional_int_attribute(map: &AttributeMap, name: &str) -> Result<Option<i64>> {
    match map.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => int_attribute(map, name).map(Some),
    }
}

/// Resolves entity ids against the current pool.
///
/// Reference fields use this to check that the id they hold names an
/// existing entity of an acceptable type.
pub trait EntityLookup {
    /// The `type` tag of the entity with this id, if it exists.
    fn entity_type(&self, id: EntityId) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> AttributeMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_int_attribute() {
        let attrs = map(json!({"x": 300, "name": "Sol"}));
        assert_eq!(int_attribute(&attrs, "x"), Ok(300));
        assert_eq!(
            int_attribute(&attrs, "name").unwrap_err().message(),
            "'name' must be an integer."
        );
        assert_eq!(
            int_attribute(&attrs, "y").unwrap_err().message(),
            "'y' is required."
        );
    }

    #[test]
    fn test_optional_int_attribute() {
        let attrs = map(json!({"x_prev": 12, "y_prev": null}));
        assert_eq!(optional_int_attribute(&attrs, "x_prev"), Ok(Some(12)));
        assert_eq!(optional_int_attribute(&attrs, "y_prev"), Ok(None));
        assert_eq!(optional_int_attribute(&attrs, "warp"), Ok(None));
    }

    #[test]
    fn test_attributes_set_and_read() {
        let mut attrs = Attributes::default();
        attrs.set("population", 1000);
        assert!(attrs.contains("population"));
        assert_eq!(attrs.int("population"), Ok(1000));
        assert_eq!(attrs.get("population"), Some(&json!(1000)));
    }
}
