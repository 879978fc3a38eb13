//! Movement system - simultaneous pursuit and interception
//!
//! Every entity with a non-empty queue flies toward its front waypoint. A turn
//! is split into micro-steps; in each one every mover:
//! 1. aims at its target's current position and freezes that vector as the
//!    one other pursuers can observe,
//! 2. if it chases another entity, re-aims at where that target will be at
//!    the end of the turn if it keeps its observed vector,
//! 3. integrates the resulting vector.
//!
//! Re-deriving from freshly observed vectors every micro-step is what lets
//! chase pairs and chase rings of any length meet at a common point without
//! solving for the rendezvous directly. All arithmetic is decimal so that a
//! hundred accumulations land exactly where integer tests expect.

use std::collections::HashMap;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::components::{Goal, Order, Position, Queue, QUEUE};
use crate::config::MovementConfig;
use crate::entity::{EntityId, Identity};
use crate::error::{Result, ValidationError};
use crate::manager::Manager;

use super::System;

/// Point or displacement in fractional universe coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vector {
    pub x: Decimal,
    pub y: Decimal,
}

impl Vector {
    pub const ZERO: Self = Self {
        x: Decimal::ZERO,
        y: Decimal::ZERO,
    };

    pub fn new(x: Decimal, y: Decimal) -> Self {
        Self { x, y }
    }

    pub fn from_coords(x: i64, y: i64) -> Self {
        Self::new(Decimal::from(x), Decimal::from(y))
    }

    /// Nearest integer point, ties to even.
    pub fn rounded(&self) -> Self {
        Self::new(round_half_even(self.x), round_half_even(self.y))
    }

    /// Euclidean length, or `None` if the squares leave the decimal range.
    pub fn length(&self) -> Option<Decimal> {
        let squares = self.x.checked_mul(self.x)?.checked_add(self.y.checked_mul(self.y)?)?;
        Some(sqrt(squares))
    }

    pub fn scaled(&self, factor: Decimal) -> Option<Self> {
        Some(Self::new(self.x.checked_mul(factor)?, self.y.checked_mul(factor)?))
    }

    pub fn checked_add(&self, other: Self) -> Option<Self> {
        Some(Self::new(self.x.checked_add(other.x)?, self.y.checked_add(other.y)?))
    }

    pub fn checked_sub(&self, other: Self) -> Option<Self> {
        Some(Self::new(self.x.checked_sub(other.x)?, self.y.checked_sub(other.y)?))
    }

    /// Integer grid coordinates of this point.
    pub fn quantize(&self) -> (i64, i64) {
        (quantize(self.x), quantize(self.y))
    }
}

/// Square root to full decimal precision.
///
/// Seeded from `f64` and refined with a bounded number of Newton steps, so
/// perfect squares come out exact and the loop always terminates.
fn sqrt(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mut root = value
        .to_f64()
        .and_then(|f| Decimal::from_f64(f.sqrt()))
        .filter(|root| !root.is_zero())
        .unwrap_or(value);
    for _ in 0..4 {
        let next = (root + value / root) / Decimal::TWO;
        if next == root {
            break;
        }
        root = next;
    }
    root
}

fn round_half_even(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
}

/// Round half-to-even onto the integer grid, saturating at the i64 range.
pub fn quantize(value: Decimal) -> i64 {
    round_half_even(value).to_i64().unwrap_or(if value.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Distance covered per micro-step: warp squared over the step count.
///
/// `None` when warp squared does not fit a decimal.
pub fn speed(warp: i64, micro_steps: u32) -> Option<Decimal> {
    let warp = Decimal::from(warp);
    warp.checked_mul(warp)?
        .checked_div(Decimal::from(micro_steps.max(1)))
}

/// Step vector from `from` toward `to`, capped at `speed`.
///
/// When the rounded distance is within one step the vector lands exactly on
/// the target instead of being scaled. `None` if the distance overflows.
pub fn steer(from: Vector, to: Vector, speed: Decimal) -> Option<Vector> {
    let delta = to.checked_sub(from)?;
    let distance = delta.length()?;
    if round_half_even(distance) <= speed {
        Some(delta)
    } else {
        Some(Vector::new(
            speed.checked_mul(delta.x)?.checked_div(distance)?,
            speed.checked_mul(delta.y)?.checked_div(distance)?,
        ))
    }
}

fn out_of_range(id: EntityId) -> ValidationError {
    ValidationError::new(format!(
        "Entity {} cannot move: its course leaves the coordinate range.",
        id
    ))
}

/// In-turn state of one moving entity
#[derive(Debug, Clone)]
struct Course {
    order: Order,
    speed: Decimal,
    /// Integrated fractional position
    position: Vector,
    /// Vector applied at the end of the current micro-step
    step: Vector,
    /// Phase-A vector of the current micro-step, visible to pursuers
    observable: Vector,
}

/// All courses of a turn plus lookups for targets that do not move
struct Pursuit {
    courses: Vec<(EntityId, hecs::Entity, Course)>,
    movers: HashMap<EntityId, usize>,
    anchors: HashMap<EntityId, Vector>,
    micro_steps: u32,
}

impl Pursuit {
    /// Position and observed vector of a target, if it exists.
    fn locate(&self, id: EntityId) -> Option<(Vector, Vector)> {
        if let Some(&i) = self.movers.get(&id) {
            let course = &self.courses[i].2;
            return Some((course.position, course.observable));
        }
        self.anchors.get(&id).map(|&position| (position, Vector::ZERO))
    }

    /// Phase A: aim at the target's current position and freeze the vector.
    fn aim(&mut self) -> Result<()> {
        for i in 0..self.courses.len() {
            let (id, _, course) = &self.courses[i];
            let target = match course.order.goal {
                Goal::Point { x_t, y_t } => Some(Vector::from_coords(x_t, y_t)),
                Goal::Target { target_id } => self.locate(target_id).map(|(at, _)| at.rounded()),
            };
            let vector = match target {
                Some(target) => {
                    steer(course.position, target, course.speed).ok_or_else(|| out_of_range(*id))?
                }
                None => Vector::ZERO,
            };

            let course = &mut self.courses[i].2;
            course.step = vector;
            course.observable = vector;
        }
        Ok(())
    }

    /// Phase B: chasers re-aim at the target's end-of-turn projection.
    fn project(&mut self, step: u32) -> Result<()> {
        let remaining = Decimal::from(self.micro_steps - step);
        for i in 0..self.courses.len() {
            let (id, _, course) = &self.courses[i];
            let Some(target_id) = course.order.target_id() else {
                continue;
            };
            let Some((at, drift)) = self.locate(target_id) else {
                continue;
            };
            let vector = drift
                .scaled(remaining)
                .and_then(|drift| at.checked_add(drift))
                .and_then(|projected| steer(course.position, projected.rounded(), course.speed))
                .ok_or_else(|| out_of_range(*id))?;
            self.courses[i].2.step = vector;
        }
        Ok(())
    }

    /// Phase C: apply this micro-step's vectors.
    fn integrate(&mut self) -> Result<()> {
        for (id, _, course) in &mut self.courses {
            course.position = course
                .position
                .checked_add(course.step)
                .ok_or_else(|| out_of_range(*id))?;
        }
        Ok(())
    }
}

/// Resolves one turn of movement for every entity with queued orders
#[derive(Debug, Default)]
pub struct MovementSystem {
    config: MovementConfig,
}

impl MovementSystem {
    pub fn new(config: MovementConfig) -> Self {
        Self { config }
    }

    /// Collect the movers and the fixed positions they may chase.
    fn plot(&self, manager: &Manager) -> Result<Pursuit> {
        let world = manager.world();
        let mut courses = Vec::new();
        let mut movers = HashMap::new();

        for (id, entity) in manager.get_entities(QUEUE) {
            let Ok(queue) = world.get::<&Queue>(entity) else {
                continue;
            };
            let Some(order) = queue.front().cloned() else {
                continue;
            };
            let Ok(position) = world.get::<&Position>(entity) else {
                log::warn!("Entity {} has orders but no position; not moving it", id);
                continue;
            };
            let start = Vector::from_coords(position.x, position.y);
            let speed = speed(order.warp, self.config.micro_steps).ok_or_else(|| {
                ValidationError::new(format!("Entity {} has an out of range 'warp'.", id))
            })?;
            movers.insert(id, courses.len());
            courses.push((
                id,
                entity,
                Course {
                    speed,
                    order,
                    position: start,
                    step: Vector::ZERO,
                    observable: Vector::ZERO,
                },
            ));
        }

        let mut anchors = HashMap::new();
        for (_, (identity, position)) in world.query::<(&Identity, &Position)>().iter() {
            if !movers.contains_key(&identity.id) {
                anchors.insert(identity.id, Vector::from_coords(position.x, position.y));
            }
        }

        let pursuit = Pursuit {
            courses,
            movers,
            anchors,
            micro_steps: self.config.micro_steps,
        };
        for (id, _, course) in &pursuit.courses {
            if let Some(target_id) = course.order.target_id() {
                if pursuit.locate(target_id).is_none() {
                    log::warn!(
                        "Entity {} targets entity {}, which has no position; holding position",
                        id,
                        target_id
                    );
                }
            }
        }
        Ok(pursuit)
    }
}

impl System for MovementSystem {
    fn name(&self) -> &str {
        "movement"
    }

    fn process(&mut self, manager: &mut Manager) -> Result<()> {
        for (_, position) in manager.world_mut().query_mut::<&mut Position>() {
            position.mark_start();
        }

        let mut pursuit = self.plot(manager)?;
        for step in 0..self.config.micro_steps {
            pursuit.aim()?;
            pursuit.project(step)?;
            pursuit.integrate()?;
        }

        let world = manager.world_mut();
        for (_, entity, course) in &pursuit.courses {
            if let Ok(mut position) = world.get::<&mut Position>(*entity) {
                let (x, y) = course.position.quantize();
                position.x = x;
                position.y = y;
            }
        }

        let arrivals = pop_arrivals(manager);
        log::debug!(
            "Resolved {} courses over {} micro-steps, {} waypoints reached",
            pursuit.courses.len(),
            self.config.micro_steps,
            arrivals
        );
        Ok(())
    }
}

/// Pop the front waypoint of every entity now standing on its target.
fn pop_arrivals(manager: &mut Manager) -> usize {
    let world = manager.world_mut();
    let positions: HashMap<EntityId, (i64, i64)> = world
        .query::<(&Identity, &Position)>()
        .iter()
        .map(|(_, (identity, position))| (identity.id, position.coords()))
        .collect();

    let mut arrivals = 0;
    for (_, (identity, queue)) in world.query_mut::<(&Identity, &mut Queue)>() {
        let Some(order) = queue.front() else {
            continue;
        };
        let target = match order.goal {
            Goal::Point { x_t, y_t } => Some((x_t, y_t)),
            Goal::Target { target_id } => positions.get(&target_id).copied(),
        };
        if target.is_some() && target == positions.get(&identity.id).copied() {
            queue.pop_front();
            arrivals += 1;
        }
    }
    arrivals
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_speed_is_exact() {
        assert_eq!(speed(10, 100), Some(Decimal::ONE));
        assert_eq!(speed(1, 100), Some(dec("0.01")));
        assert_eq!(speed(8, 100), Some(dec("0.64")));
        assert_eq!(speed(0, 100), Some(Decimal::ZERO));
    }

    #[test]
    fn test_oversized_inputs_do_not_overflow() {
        assert_eq!(speed(1_000_000_000_000_000, 100), None);
        let far = Vector::from_coords(1_000_000_000_000_000, 0);
        assert_eq!(steer(Vector::ZERO, far, Decimal::ONE), None);
        assert_eq!(
            steer(Vector::ZERO, Vector::from_coords(3, 4), Decimal::ONE),
            Some(Vector::new(dec("0.6"), dec("0.8")))
        );
    }

    #[test]
    fn test_quantize_ties_to_even() {
        assert_eq!(quantize(dec("470.5")), 470);
        assert_eq!(quantize(dec("471.5")), 472);
        assert_eq!(quantize(dec("-2.5")), -2);
        assert_eq!(quantize(dec("224.9999999")), 225);
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(sqrt(Decimal::from(2500)), Decimal::from(50));
        assert_eq!(sqrt(dec("0.25")), dec("0.5"));
        assert_eq!(sqrt(Decimal::ZERO), Decimal::ZERO);
        let root = sqrt(Decimal::from(800));
        assert!((root * root - Decimal::from(800)).abs() < dec("0.000000000000000000001"));
    }

    #[test]
    fn test_steer_scales_to_speed() {
        let v = steer(Vector::from_coords(0, 0), Vector::from_coords(30, 40), Decimal::ONE);
        assert_eq!(v, Some(Vector::new(dec("0.6"), dec("0.8"))));
    }

    #[test]
    fn test_steer_snaps_within_reach() {
        let from = Vector::new(dec("500.5"), dec("500"));
        let v = steer(from, Vector::from_coords(501, 500), dec("0.01"));
        assert_eq!(v, Some(Vector::new(dec("0.5"), Decimal::ZERO)));
    }

    #[test]
    fn test_steer_with_zero_speed_holds() {
        let v = steer(Vector::from_coords(0, 0), Vector::from_coords(3, 4), Decimal::ZERO);
        assert_eq!(v, Some(Vector::ZERO));
    }

    #[test]
    fn test_accumulation_does_not_drift() {
        let mut position = Vector::from_coords(480, 235);
        let step = steer(position, Vector::from_coords(480, 335), Decimal::ONE).unwrap();
        for _ in 0..100 {
            position = position.checked_add(step).unwrap();
        }
        assert_eq!(position.quantize(), (480, 335));
        assert_eq!(position.y, Decimal::from(335));
    }
}
