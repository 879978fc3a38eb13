//! Planet environment and mineral helpers: derived display text and random rolls.

use rand::Rng;
use serde_json::Value;

use crate::entity::AttributeMap;

/// Gravity 0..=100 maps onto 1/8g ..= 8g on a log scale.
pub fn format_gravity(value: &Value) -> String {
    let v = value.as_f64().unwrap_or_default();
    let gravity = 2f64.powf(6.0 * v / 100.0 - 3.0);
    format!("{:.3}g", gravity)
}

/// Temperature 0..=100 maps onto -200°C ..= 200°C.
pub fn format_temperature(value: &Value) -> String {
    let v = value.as_i64().unwrap_or_default();
    format!("{}\u{00b0}C", 4 * v - 200)
}

pub fn format_radiation(value: &Value) -> String {
    format!("{}mR", value)
}

/// Weight of each environment value 1..=99: ramps up over the first nine,
/// flat across the middle, ramps down over the last nine.
fn habitat_weight(value: i64) -> i64 {
    match value {
        1..=9 => value,
        91..=99 => 100 - value,
        _ => 10,
    }
}

fn roll_habitat<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    let total: i64 = (1..=99).map(habitat_weight).sum();
    let mut pick = rng.gen_range(0..total);
    for value in 1..=99 {
        let weight = habitat_weight(value);
        if pick < weight {
            return value;
        }
        pick -= weight;
    }
    99
}

/// Random `environment` attributes for a freshly generated planet.
pub fn random_environment<R: Rng + ?Sized>(rng: &mut R) -> AttributeMap {
    let mut data = AttributeMap::new();
    data.insert("gravity".into(), roll_habitat(rng).into());
    data.insert("temperature".into(), roll_habitat(rng).into());
    data.insert("radiation".into(), rng.gen_range(1..=99i64).into());
    data
}

/// Random `mineral_concentrations` attributes for a freshly generated planet.
pub fn random_mineral_concentrations<R: Rng + ?Sized>(rng: &mut R) -> AttributeMap {
    let mut data = AttributeMap::new();
    for name in ["ironium_conc", "boranium_conc", "germanium_conc"] {
        data.insert(name.into(), rng.gen_range(1..=99i64).into());
    }
    data
}
