//! Universe Headless Turn Harness
//!
//! Runs the calibration scenarios against the turn engine, or advances a
//! single state document read from disk.
//!
//! Usage:
//!   cargo run -p universe-simtest
//!   cargo run -p universe-simtest -- --verbose
//!   cargo run -p universe-simtest -- --state state.json [--updates updates.json] [--config engine.json]

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use universe_core::components::{random_environment, random_mineral_concentrations};
use universe_core::prelude::*;

// ── Errors ──────────────────────────────────────────────────────────────

/// Errors that can occur when running a turn from files
#[derive(Debug)]
enum HarnessError {
    Io(PathBuf, std::io::Error),
    Json(PathBuf, serde_json::Error),
    Validation(ValidationError),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::Io(path, e) => write!(f, "{}: {}", path.display(), e),
            HarnessError::Json(path, e) => write!(f, "{}: invalid JSON: {}", path.display(), e),
            HarnessError::Validation(e) => write!(f, "validation failed: {}", e),
        }
    }
}

impl std::error::Error for HarnessError {}

impl From<ValidationError> for HarnessError {
    fn from(e: ValidationError) -> Self {
        HarnessError::Validation(e)
    }
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");

    let default = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();

    if let Some(state) = flag_value(&args, "--state") {
        let updates = flag_value(&args, "--updates");
        let config = flag_value(&args, "--config");
        match run_files(&state, updates.as_deref(), config.as_deref()) {
            Ok(next) => println!("{}", next),
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!("=== Universe Turn Harness ===\n");

    let mut results = Vec::new();

    // 1. Turn bookkeeping and attribute echo
    results.extend(validate_pipeline(verbose));

    // 2. Order queue merging
    results.extend(validate_order_queues(verbose));

    // 3. Pursuit and chase cycles
    results.extend(validate_pursuit(verbose));

    // 4. Schema validation failures
    results.extend(validate_rejections(verbose));

    // 5. Planet generation helpers
    results.extend(validate_planet_rolls(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn flag_value(args: &[String], flag: &str) -> Option<PathBuf> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, HarnessError> {
    let text = std::fs::read_to_string(path).map_err(|e| HarnessError::Io(path.to_path_buf(), e))?;
    serde_json::from_str(&text).map_err(|e| HarnessError::Json(path.to_path_buf(), e))
}

/// Advance the state document at `state` by one turn and render it as JSON.
fn run_files(
    state: &Path,
    updates: Option<&Path>,
    config: Option<&Path>,
) -> Result<String, HarnessError> {
    let state: UniverseState = read_json(state)?;
    let updates: Updates = match updates {
        Some(path) => read_json(path)?,
        None => Updates::new(),
    };
    let config: EngineConfig = match config {
        Some(path) => read_json(path)?,
        None => EngineConfig::default(),
    };

    log::info!(
        "Running turn {} over {} entities",
        state.turn,
        state.entities.len()
    );
    let next = GameState::new(state, updates).with_config(config).generate()?;
    serde_json::to_string_pretty(&next).map_err(|e| HarnessError::Json(PathBuf::from("<output>"), e))
}

// ── Scenario helpers ────────────────────────────────────────────────────

fn run_turn(entities: Value, updates: Value) -> Result<UniverseState, String> {
    let state: UniverseState =
        serde_json::from_value(json!({"turn": 2500, "width": 1000, "entities": entities}))
            .map_err(|e| format!("bad state: {}", e))?;
    let updates: Updates =
        serde_json::from_value(updates).map_err(|e| format!("bad updates: {}", e))?;
    GameState::new(state, updates)
        .generate()
        .map_err(|e| e.to_string())
}

fn ship(x: i64, y: i64, queue: Value) -> Value {
    json!({"type": "ship", "x": x, "y": y, "queue": queue})
}

fn chase(target_id: u64) -> Value {
    json!([{"target_id": target_id, "warp": 10}])
}

fn position(next: &UniverseState, id: EntityId) -> Option<(i64, i64)> {
    let entity = next.entities.get(&id)?;
    Some((entity.get("x")?.as_i64()?, entity.get("y")?.as_i64()?))
}

fn queue_len(next: &UniverseState, id: EntityId) -> usize {
    next.entities
        .get(&id)
        .and_then(|e| e.get("queue"))
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

/// One movement scenario: expected end positions and remaining queue lengths.
fn movement_check(
    name: &str,
    entities: Value,
    updates: Value,
    expected: &[(EntityId, (i64, i64), usize)],
) -> TestResult {
    match run_turn(entities, updates) {
        Ok(next) => {
            let actual: Vec<_> = expected
                .iter()
                .map(|(id, _, _)| (*id, position(&next, *id), queue_len(&next, *id)))
                .collect();
            let passed = expected
                .iter()
                .zip(&actual)
                .all(|((_, at, queued), (_, got, left))| Some(*at) == *got && queued == left);
            TestResult {
                name: name.into(),
                passed,
                detail: format!("{:?}", actual),
            }
        }
        Err(e) => TestResult {
            name: name.into(),
            passed: false,
            detail: format!("turn failed: {}", e),
        },
    }
}

fn rejection_check(name: &str, entities: Value, message: &str) -> TestResult {
    match run_turn(entities, json!({})) {
        Ok(_) => TestResult {
            name: name.into(),
            passed: false,
            detail: format!("accepted, expected \"{}\"", message),
        },
        Err(e) => TestResult {
            name: name.into(),
            passed: e == message,
            detail: e,
        },
    }
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

fn planet() -> Value {
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
        "owner_id": 0,
        "population": 1000,
    })
}

// ── 1. Pipeline ─────────────────────────────────────────────────────────

fn validate_pipeline(verbose: bool) -> Vec<TestResult> {
    println!("--- Turn Pipeline ---");
    let mut results = Vec::new();

    match run_turn(json!({}), json!({})) {
        Ok(next) => results.push(TestResult {
            name: "empty_universe".into(),
            passed: next.turn == 2501 && next.width == 1000 && next.entities.is_empty(),
            detail: format!("turn {} width {}", next.turn, next.width),
        }),
        Err(e) => results.push(TestResult {
            name: "empty_universe".into(),
            passed: false,
            detail: e,
        }),
    }

    match run_turn(json!({"0": ship(456, 337, json!([]))}), json!({})) {
        Ok(next) => {
            let entity = &next.entities[&0];
            let prev = (entity.get("x_prev").cloned(), entity.get("y_prev").cloned());
            results.push(TestResult {
                name: "stationary_snapshot".into(),
                passed: prev == (Some(json!(456)), Some(json!(337))),
                detail: format!("prev {:?}", prev),
            });
        }
        Err(e) => results.push(TestResult {
            name: "stationary_snapshot".into(),
            passed: false,
            detail: e,
        }),
    }

    match run_turn(json!({"0": human(), "1": planet()}), json!({})) {
        Ok(next) => {
            let input = planet();
            let output = &next.entities[&1];
            let missing: Vec<_> = input
                .as_object()
                .into_iter()
                .flatten()
                .filter(|(key, value)| output.get(key.as_str()) != Some(*value))
                .map(|(key, _)| key.clone())
                .collect();
            results.push(TestResult {
                name: "planet_echo".into(),
                passed: missing.is_empty(),
                detail: if missing.is_empty() {
                    format!("{} attributes echoed", output.len())
                } else {
                    format!("changed or missing: {:?}", missing)
                },
            });
            if verbose {
                println!("    planet: {}", Value::Object(output.clone()));
            }
        }
        Err(e) => results.push(TestResult {
            name: "planet_echo".into(),
            passed: false,
            detail: e,
        }),
    }

    results
}

// ── 2. Order queues ─────────────────────────────────────────────────────

fn validate_order_queues(_verbose: bool) -> Vec<TestResult> {
    println!("--- Order Queues ---");
    vec![
        movement_check(
            "single_turn_move",
            json!({"0": ship(480, 235, json!([]))}),
            json!({"0": [{"seq": 0, "x_t": 422, "y_t": 210, "warp": 10}]}),
            &[(0, (422, 210), 0)],
        ),
        movement_check(
            "multi_turn_move",
            json!({"0": ship(480, 235, json!([]))}),
            json!({"0": [{"seq": 0, "x_t": 168, "y_t": 870, "warp": 10}]}),
            &[(0, (436, 325), 1)],
        ),
        movement_check(
            "replace_queued_move",
            json!({"0": ship(480, 235, json!([{"x_t": 637, "y_t": 786, "warp": 8}]))}),
            json!({"0": [{"seq": 0, "x_t": 422, "y_t": 210, "warp": 10}]}),
            &[(0, (422, 210), 0)],
        ),
        movement_check(
            "append_queued_move",
            json!({"0": ship(480, 235, json!([{"x_t": 422, "y_t": 210, "warp": 10}]))}),
            json!({"0": [{"seq": 1, "x_t": 637, "y_t": 786, "warp": 8}]}),
            &[(0, (422, 210), 1)],
        ),
        movement_check(
            "slow_motion",
            json!({"0": ship(500, 500, json!([{"x_t": 501, "y_t": 500, "warp": 1}]))}),
            json!({}),
            &[(0, (501, 500), 0)],
        ),
        movement_check(
            "warp_zero_holds",
            json!({"0": ship(500, 500, json!([{"x_t": 510, "y_t": 500, "warp": 0}]))}),
            json!({}),
            &[(0, (500, 500), 1)],
        ),
    ]
}

// ── 3. Pursuit ──────────────────────────────────────────────────────────

fn validate_pursuit(_verbose: bool) -> Vec<TestResult> {
    println!("--- Pursuit ---");
    vec![
        movement_check(
            "target_stationary",
            json!({"0": ship(480, 235, chase(1)), "1": ship(460, 215, json!([]))}),
            json!({}),
            &[(0, (460, 215), 0), (1, (460, 215), 0)],
        ),
        movement_check(
            "target_moving",
            json!({
                "0": ship(480, 235, chase(1)),
                "1": ship(460, 215, json!([{"x_t": 465, "y_t": 220, "warp": 10}])),
            }),
            json!({}),
            &[(0, (465, 220), 0), (1, (465, 220), 0)],
        ),
        movement_check(
            "target_barely_reached",
            json!({
                "0": ship(560, 315, chase(1)),
                "1": ship(460, 215, json!([{"x_t": 660, "y_t": 215, "warp": 10}])),
            }),
            json!({}),
            &[(0, (560, 215), 0), (1, (560, 215), 1)],
        ),
        movement_check(
            "target_stops_short",
            json!({
                "0": ship(560, 315, chase(1)),
                "1": ship(460, 215, json!([{"x_t": 510, "y_t": 215, "warp": 10}])),
            }),
            json!({}),
            &[(0, (525, 230), 1), (1, (510, 215), 0)],
        ),
        movement_check(
            "mutual_intercept",
            json!({"0": ship(480, 235, chase(1)), "1": ship(460, 215, chase(0))}),
            json!({}),
            &[(0, (470, 225), 0), (1, (470, 225), 0)],
        ),
        movement_check(
            "three_way_cycle",
            json!({
                "0": ship(480, 235, chase(1)),
                "1": ship(460, 215, chase(2)),
                "2": ship(500, 205, chase(0)),
            }),
            json!({}),
            &[(0, (480, 219), 0), (1, (480, 219), 0), (2, (480, 219), 0)],
        ),
        movement_check(
            "four_way_cycle",
            json!({
                "0": ship(500, 500, chase(1)),
                "1": ship(600, 500, chase(2)),
                "2": ship(600, 600, chase(3)),
                "3": ship(500, 600, chase(0)),
            }),
            json!({}),
            &[
                (0, (550, 550), 0),
                (1, (550, 550), 0),
                (2, (550, 550), 0),
                (3, (550, 550), 0),
            ],
        ),
        movement_check(
            "missing_target_holds",
            json!({"0": ship(480, 235, chase(42))}),
            json!({}),
            &[(0, (480, 235), 1)],
        ),
    ]
}

// ── 4. Rejections ───────────────────────────────────────────────────────

fn validate_rejections(_verbose: bool) -> Vec<TestResult> {
    println!("--- Validation ---");
    let mut wrong_owner = planet();
    wrong_owner["owner_id"] = json!(2);

    vec![
        rejection_check(
            "owner_must_exist",
            json!({"1": planet()}),
            "'owner_id' is not an existing entity.",
        ),
        rejection_check(
            "owner_must_be_species",
            json!({"1": wrong_owner, "2": ship(0, 0, json!([]))}),
            "'owner_id' cannot point to an entity of this type.",
        ),
        rejection_check(
            "type_must_be_registered",
            json!({"0": {"type": "comet"}}),
            "'comet' is not a registered entity type.",
        ),
        rejection_check(
            "queue_must_hold_orders",
            json!({"0": ship(0, 0, json!([{"warp": 3}]))}),
            "'queue' must be a list of orders.",
        ),
    ]
}

// ── 5. Planet rolls ─────────────────────────────────────────────────────

fn validate_planet_rolls(verbose: bool) -> Vec<TestResult> {
    println!("--- Planet Generation ---");
    let mut results = Vec::new();
    let mut rng = rand::thread_rng();

    let mut entities = serde_json::Map::new();
    entities.insert("0".into(), human());
    for id in 1..=50u64 {
        let mut body = planet();
        if let Some(map) = body.as_object_mut() {
            map.extend(random_environment(&mut rng));
            map.extend(random_mineral_concentrations(&mut rng));
        }
        entities.insert(id.to_string(), body);
    }

    match run_turn(Value::Object(entities), json!({})) {
        Ok(next) => {
            results.push(TestResult {
                name: "random_planets_validate".into(),
                passed: next.entities.len() == 51,
                detail: format!("{} entities accepted", next.entities.len()),
            });
            if verbose {
                let sample = &next.entities[&1];
                println!(
                    "    sample environment: gravity {} temperature {} radiation {}",
                    sample["gravity"], sample["temperature"], sample["radiation"]
                );
            }
        }
        Err(e) => results.push(TestResult {
            name: "random_planets_validate".into(),
            passed: false,
            detail: e,
        }),
    }

    let mut manager = Manager::with_default_types();
    let spawned = [(0, human()), (1, planet())].into_iter().try_for_each(|(id, body)| {
        let attributes = body.as_object().cloned().unwrap_or_default();
        manager.spawn(id, attributes).map(|_| ())
    });
    let shown = spawned.and_then(|_| manager.display(1));
    match shown {
        Ok(text) => {
            let gravity = text.get("gravity").cloned().unwrap_or_default();
            let temperature = text.get("temperature").cloned().unwrap_or_default();
            results.push(TestResult {
                name: "environment_display".into(),
                passed: gravity == "0.384g" && temperature == "-56\u{00b0}C",
                detail: format!("gravity {} temperature {}", gravity, temperature),
            });
        }
        Err(e) => results.push(TestResult {
            name: "environment_display".into(),
            passed: false,
            detail: e.to_string(),
        }),
    }

    results
}
