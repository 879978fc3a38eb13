//! Schema catalog - the attribute contract of every known component.

use crate::entity::AttributeMap;
use crate::error::{Result, ValidationError};
use crate::schema::{ComponentSchema, Field};

use super::planet::{format_gravity, format_radiation, format_temperature};

pub fn metadata() -> ComponentSchema {
    ComponentSchema::new(super::METADATA)
        .field(Field::char("type"))
        .field(Field::int("pk").optional())
}

pub fn position() -> ComponentSchema {
    ComponentSchema::new(super::POSITION)
        .field(Field::int("x"))
        .field(Field::int("y"))
        .field(Field::int("warp").optional())
        .field(Field::int("x_prev").optional())
        .field(Field::int("y_prev").optional())
}

pub fn queue() -> ComponentSchema {
    ComponentSchema::new(super::QUEUE).field(Field::orders("queue"))
}

pub fn species() -> ComponentSchema {
    let mut schema = ComponentSchema::new(super::SPECIES)
        .field(Field::char("name"))
        .field(Field::char("plural_name"))
        .field(Field::int("growth_rate"));

    for (min, max, immune) in HABITATS {
        schema = schema
            .field(Field::int(min).range(Some(0), Some(100)).optional())
            .field(Field::int(max).range(Some(0), Some(100)).optional())
            .field(Field::boolean(immune));
    }
    schema.rule(check_habitats)
}

/// (min, max, immune) attribute triples of the three habitability axes
const HABITATS: [(&str, &str, &str); 3] = [
    ("gravity_min", "gravity_max", "gravity_immune"),
    ("temperature_min", "temperature_max", "temperature_immune"),
    ("radiation_min", "radiation_max", "radiation_immune"),
];

/// An immune species has no tolerance window; any other species needs both bounds.
fn check_habitats(data: &AttributeMap) -> Result<()> {
    for (min, max, immune) in HABITATS {
        let is_immune = data.get(immune).and_then(|v| v.as_bool()).unwrap_or(false);
        let has_min = data.contains_key(min);
        let has_max = data.contains_key(max);

        if is_immune && (has_min || has_max) {
            return Err(ValidationError::new(format!(
                "'{}' and '{}' may not be set if '{}' is true.",
                min, max, immune
            )));
        }
        if !is_immune && !(has_min && has_max) {
            return Err(ValidationError::new(format!(
                "'{}' and '{}' must be set if '{}' is false.",
                min, max, immune
            )));
        }
    }
    Ok(())
}

pub fn ownership() -> ComponentSchema {
    ComponentSchema::new(super::OWNERSHIP)
        .field(Field::reference("owner").optional().pointing_to(&["species"]))
}

pub fn population() -> ComponentSchema {
    ComponentSchema::new(super::POPULATION).field(Field::int("population").optional())
}

pub fn environment() -> ComponentSchema {
    ComponentSchema::new(super::ENVIRONMENT)
        .field(Field::int("gravity").range(Some(0), Some(100)))
        .field(Field::int("temperature").range(Some(0), Some(100)))
        .field(Field::int("radiation").range(Some(0), Some(100)))
        .display_with("gravity", format_gravity)
        .display_with("temperature", format_temperature)
        .display_with("radiation", format_radiation)
}

pub fn mineral_concentrations() -> ComponentSchema {
    ComponentSchema::new(super::MINERAL_CONCENTRATIONS)
        .field(Field::int("ironium_conc").range(Some(0), Some(100)))
        .field(Field::int("boranium_conc").range(Some(0), Some(100)))
        .field(Field::int("germanium_conc").range(Some(0), Some(100)))
}

pub fn minerals() -> ComponentSchema {
    ComponentSchema::new(super::MINERALS)
        .field(Field::int("ironium").range(Some(0), None).optional())
        .field(Field::int("boranium").range(Some(0), None).optional())
        .field(Field::int("germanium").range(Some(0), None).optional())
}

/// The entity types every universe understands, with components in validation order.
pub fn default_entity_types() -> Vec<(&'static str, Vec<ComponentSchema>)> {
    vec![
        ("species", vec![metadata(), species()]),
        (
            "planet",
            vec![
                metadata(),
                position(),
                environment(),
                mineral_concentrations(),
                minerals(),
                population(),
                ownership(),
                queue(),
            ],
        ),
        (
            "ship",
            vec![
                metadata(),
                position(),
                minerals(),
                population(),
                ownership(),
                queue(),
            ],
        ),
    ]
}
