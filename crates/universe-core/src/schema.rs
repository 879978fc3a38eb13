//! Declarative attribute schemas.
//!
//! A [`ComponentSchema`] is a named list of [`Field`]s plus an optional
//! cross-field rule. The engine never branches on entity type; it only asks a
//! schema to `validate`, `serialize` or `display` an attribute map.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::components::Order;
use crate::entity::{AttributeMap, EntityLookup};
use crate::error::{Result, ValidationError};

/// What values a field accepts
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Int { min: Option<i64>, max: Option<i64> },
    Char,
    Bool,
    /// A list of movement orders
    Orders,
    /// Id of another entity, optionally restricted to some entity types
    Reference { types: Option<Vec<&'static str>> },
}

/// One attribute rule inside a component
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl Field {
    pub fn int(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Int { min: None, max: None },
            required: true,
        }
    }

    pub fn char(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Char,
            required: true,
        }
    }

    /// Boolean fields are always required.
    pub fn boolean(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Bool,
            required: true,
        }
    }

    pub fn orders(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Orders,
            required: true,
        }
    }

    /// A reference stored under `<name>_id`.
    pub fn reference(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Reference { types: None },
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Inclusive bounds for an integer field.
    pub fn range(mut self, lo: Option<i64>, hi: Option<i64>) -> Self {
        if let FieldKind::Int { min, max } = &mut self.kind {
            *min = lo;
            *max = hi;
        }
        self
    }

    /// Restrict a reference to entities of the given types.
    pub fn pointing_to(mut self, allowed: &[&'static str]) -> Self {
        if let FieldKind::Reference { types } = &mut self.kind {
            *types = Some(allowed.to_vec());
        }
        self
    }

    /// Key under which the value lives in an attribute map.
    pub fn data_name(&self) -> String {
        match self.kind {
            FieldKind::Reference { .. } => format!("{}_id", self.name),
            _ => self.name.to_string(),
        }
    }

    pub fn validate(&self, data: &AttributeMap, lookup: &dyn EntityLookup) -> Result<()> {
        let key = self.data_name();
        let value = match data.get(&key) {
            Some(value) => value,
            None if self.required || self.kind == FieldKind::Bool => {
                return Err(invalid(&key, "is required."));
            }
            None => return Ok(()),
        };

        match &self.kind {
            FieldKind::Int { min, max } => {
                let n = value
                    .as_i64()
                    .ok_or_else(|| invalid(&key, "must be an integer."))?;
                if let Some(min) = min {
                    if n < *min {
                        return Err(invalid(
                            &key,
                            &format!("must be greater than or equal to {}.", min),
                        ));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        return Err(invalid(
                            &key,
                            &format!("must be less than or equal to {}.", max),
                        ));
                    }
                }
            }
            FieldKind::Char => {
                if !value.is_string() {
                    return Err(invalid(&key, "must be a string."));
                }
            }
            FieldKind::Bool => {
                if !value.is_boolean() {
                    return Err(invalid(&key, "must be a boolean."));
                }
            }
            FieldKind::Orders => {
                let well_formed = value.as_array().is_some_and(|items| {
                    items
                        .iter()
                        .all(|item| serde_json::from_value::<Order>(item.clone()).is_ok())
                });
                if !well_formed {
                    return Err(invalid(&key, "must be a list of orders."));
                }
            }
            FieldKind::Reference { types } => {
                let id = value
                    .as_i64()
                    .ok_or_else(|| invalid(&key, "must be an integer."))?;
                let kind = u64::try_from(id)
                    .ok()
                    .and_then(|id| lookup.entity_type(id))
                    .ok_or_else(|| invalid(&key, "is not an existing entity."))?;
                if let Some(types) = types {
                    if !types.contains(&kind.as_str()) {
                        return Err(invalid(&key, "cannot point to an entity of this type."));
                    }
                }
            }
        }
        Ok(())
    }
}

fn invalid(key: &str, problem: &str) -> ValidationError {
    ValidationError::new(format!("'{}' {}", key, problem))
}

/// Cross-field check run after every field of a component has passed.
pub type Rule = fn(&AttributeMap) -> Result<()>;

/// Derived display text for one field value.
pub type Formatter = fn(&Value) -> String;

/// A named bundle of attribute rules an entity type may carry
#[derive(Debug, Clone)]
pub struct ComponentSchema {
    name: &'static str,
    fields: Vec<Field>,
    rule: Option<Rule>,
    formatters: Vec<(&'static str, Formatter)>,
}

impl ComponentSchema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            rule: None,
            formatters: Vec::new(),
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn display_with(mut self, field: &'static str, formatter: Formatter) -> Self {
        self.formatters.push((field, formatter));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn validate(&self, data: &AttributeMap, lookup: &dyn EntityLookup) -> Result<()> {
        for field in &self.fields {
            field.validate(data, lookup)?;
        }
        match self.rule {
            Some(rule) => rule(data),
            None => Ok(()),
        }
    }

    /// Validate, then keep only the declared fields that are present.
    pub fn serialize(&self, data: &AttributeMap, lookup: &dyn EntityLookup) -> Result<AttributeMap> {
        self.validate(data, lookup)?;
        let mut output = AttributeMap::new();
        for field in &self.fields {
            let key = field.data_name();
            if let Some(value) = data.get(&key) {
                output.insert(key, value.clone());
            }
        }
        Ok(output)
    }

    /// Validate, then render each present field as text.
    pub fn display(
        &self,
        data: &AttributeMap,
        lookup: &dyn EntityLookup,
    ) -> Result<BTreeMap<String, String>> {
        self.validate(data, lookup)?;
        let mut output = BTreeMap::new();
        for field in &self.fields {
            let key = field.data_name();
            let Some(value) = data.get(&key) else {
                continue;
            };
            let text = match self.formatters.iter().find(|(name, _)| *name == field.name) {
                Some((_, format)) => format(value),
                None => plain(value),
            };
            output.insert(key, text);
        }
        Ok(output)
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
