//! Integration tests for the full turn pipeline.
//!
//! Exercises: state document → validation → systems → serialized next state

use serde_json::{json, Value};
use universe_core::prelude::*;

// ── Helpers ────────────────────────────────────────────────────────────

fn run(entities: Value, updates: Value) -> Result<UniverseState, ValidationError> {
    let state: UniverseState =
        serde_json::from_value(json!({"turn": 2500, "width": 1000, "entities": entities})).unwrap();
    let updates: Updates = serde_json::from_value(updates).unwrap();
    GameState::new(state, updates).generate()
}

fn human() -> Value {
    json!({
        "type": "species",
        "name": "Human",
        "plural_name": "Humans",
        "growth_rate": 15,
        "gravity_immune": true,
        "temperature_immune": true,
        "radiation_immune": true,
    })
}

fn planet(owner_id: u64) -> Value {
    json!({
        "type": "planet",
        "x": 300,
        "y": 600,
        "gravity": 27,
        "temperature": 36,
        "radiation": 45,
        "ironium_conc": 67,
        "boranium_conc": 78,
        "germanium_conc": 82,
        "ironium": 20,
        "boranium": 30,
        "germanium": 40,
        "queue": [],
        "owner_id": owner_id,
        "population": 1000,
    })
}

fn entity(next: &UniverseState, id: u64) -> Value {
    serde_json::to_value(&next.entities[&id]).unwrap()
}

// ── Turn bookkeeping ───────────────────────────────────────────────────

#[test]
fn empty_universe_advances_turn() {
    let next = run(json!({}), json!({})).unwrap();
    assert_eq!(
        serde_json::to_value(&next).unwrap(),
        json!({"turn": 2501, "width": 1000, "entities": {}})
    );
}

#[test]
fn stationary_entity_gains_previous_position() {
    let next = run(
        json!({"0": {"pk": 0, "type": "ship", "x": 456, "y": 337, "queue": []}}),
        json!({}),
    )
    .unwrap();
    assert_eq!(
        entity(&next, 0),
        json!({"pk": 0, "type": "ship", "x": 456, "x_prev": 456, "y": 337, "y_prev": 337, "queue": []})
    );
}

#[test]
fn undeclared_attributes_are_dropped() {
    let next = run(
        json!({"0": {"type": "ship", "x": 1, "y": 2, "queue": [], "cargo": "spice"}}),
        json!({}),
    )
    .unwrap();
    assert!(next.entities[&0].get("cargo").is_none());
}

// ── Persistence of attributes ──────────────────────────────────────────

#[test]
fn planet_round_trips() {
    let next = run(json!({"0": human(), "1": planet(0)}), json!({})).unwrap();
    assert_eq!(next.turn, 2501);

    let out = entity(&next, 1);
    let mut expected = planet(0);
    expected["x_prev"] = json!(300);
    expected["y_prev"] = json!(600);
    assert_eq!(out, expected);
    assert!(out["population"].as_i64().unwrap() > 0);
}

#[test]
fn ship_round_trips() {
    let ship = json!({
        "type": "ship",
        "x": 300,
        "y": 600,
        "ironium": 20,
        "boranium": 30,
        "germanium": 40,
        "queue": [],
        "owner_id": 0,
        "population": 1000,
    });
    let next = run(json!({"0": human(), "1": ship}), json!({})).unwrap();

    let out = entity(&next, 1);
    assert_eq!(out["type"], "ship");
    assert_eq!((out["x"].as_i64(), out["y"].as_i64()), (Some(300), Some(600)));
    assert_eq!(out["ironium"], 20);
    assert_eq!(out["boranium"], 30);
    assert_eq!(out["germanium"], 40);
    assert_eq!(out["queue"], json!([]));
    assert_eq!(out["owner_id"], 0);
    assert_eq!(out["population"], 1000);
}

#[test]
fn species_round_trips() {
    let next = run(json!({"0": human()}), json!({})).unwrap();
    assert_eq!(entity(&next, 0), human());
}

// ── Validation ─────────────────────────────────────────────────────────

#[test]
fn missing_owner_is_rejected() {
    let err = run(json!({"1": planet(0)}), json!({})).unwrap_err();
    assert_eq!(err.to_string(), "'owner_id' is not an existing entity.");
}

#[test]
fn owner_must_be_a_species() {
    let err = run(
        json!({"0": {"type": "ship", "x": 0, "y": 0, "queue": []}, "1": planet(0)}),
        json!({}),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "'owner_id' cannot point to an entity of this type.");
}

#[test]
fn unknown_entity_type_is_rejected() {
    let err = run(json!({"0": {"type": "comet", "x": 0, "y": 0}}), json!({})).unwrap_err();
    assert_eq!(err.to_string(), "'comet' is not a registered entity type.");
}

#[test]
fn out_of_range_environment_is_rejected() {
    let mut bad = planet(0);
    bad["gravity"] = json!(101);
    let err = run(json!({"0": human(), "1": bad}), json!({})).unwrap_err();
    assert!(err.to_string().starts_with("'gravity'"), "{}", err);
}

#[test]
fn species_without_habitat_bounds_is_rejected() {
    let mut picky = human();
    picky["gravity_immune"] = json!(false);
    let err = run(json!({"0": picky}), json!({})).unwrap_err();
    assert_eq!(
        err.to_string(),
        "'gravity_min' and 'gravity_max' must be set if 'gravity_immune' is false."
    );
}

#[test]
fn first_invalid_entity_in_id_order_wins() {
    let err = run(
        json!({
            "5": {"type": "ship", "x": 0, "y": 0, "queue": [], "owner_id": 77},
            "2": {"type": "ship", "x": "far", "y": 0, "queue": []},
        }),
        json!({}),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "'x' must be an integer.");
}

// ── Host systems ───────────────────────────────────────────────────────

/// Grows every populated entity by a fixed amount
struct Growth(i64);

impl System for Growth {
    fn name(&self) -> &str {
        "growth"
    }

    fn process(&mut self, manager: &mut Manager) -> Result<(), ValidationError> {
        for (_, entity) in manager.get_entities("population") {
            let mut attributes = manager
                .world()
                .get::<&mut universe_core::entity::Attributes>(entity)
                .unwrap();
            if let Ok(population) = attributes.int("population") {
                attributes.set("population", population + self.0);
            }
        }
        Ok(())
    }
}

#[test]
fn host_system_runs_after_movement() {
    let state: UniverseState = serde_json::from_value(json!({
        "turn": 7,
        "width": 1000,
        "entities": {"0": human(), "1": planet(0)},
    }))
    .unwrap();
    let next = GameState::new(state, Updates::new())
        .with_system(Growth(50))
        .generate()
        .unwrap();

    assert_eq!(next.turn, 8);
    assert_eq!(next.entities[&1]["population"], 1050);
}
