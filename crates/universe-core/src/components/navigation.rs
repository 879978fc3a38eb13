//! Typed movement views: position and order queue.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{int_attribute, optional_int_attribute, AttributeMap, EntityId};
use crate::error::{Result, ValidationError};

/// Where a waypoint leads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Goal {
    /// Chase another entity
    Target { target_id: EntityId },
    /// Fly to a fixed point
    Point { x_t: i64, y_t: i64 },
}

/// One movement order in a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(flatten)]
    pub goal: Goal,
    /// Top speed for this waypoint; distance per turn is warp squared
    pub warp: i64,
}

impl Order {
    pub fn point(x_t: i64, y_t: i64, warp: i64) -> Self {
        Self {
            goal: Goal::Point { x_t, y_t },
            warp,
        }
    }

    pub fn target(target_id: EntityId, warp: i64) -> Self {
        Self {
            goal: Goal::Target { target_id },
            warp,
        }
    }

    pub fn target_id(&self) -> Option<EntityId> {
        match self.goal {
            Goal::Target { target_id } => Some(target_id),
            Goal::Point { .. } => None,
        }
    }

    /// Attribute form stored inside a `queue` list.
    pub fn to_value(&self) -> Value {
        let mut map = AttributeMap::new();
        match self.goal {
            Goal::Target { target_id } => {
                map.insert("target_id".into(), target_id.into());
            }
            Goal::Point { x_t, y_t } => {
                map.insert("x_t".into(), x_t.into());
                map.insert("y_t".into(), y_t.into());
            }
        }
        map.insert("warp".into(), self.warp.into());
        Value::Object(map)
    }
}

/// Integer grid position, with the position held at the start of the turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: i64,
    pub y: i64,
    pub x_prev: Option<i64>,
    pub y_prev: Option<i64>,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self {
            x,
            y,
            x_prev: None,
            y_prev: None,
        }
    }

    pub fn from_attributes(data: &AttributeMap) -> Result<Self> {
        Ok(Self {
            x: int_attribute(data, "x")?,
            y: int_attribute(data, "y")?,
            x_prev: optional_int_attribute(data, "x_prev")?,
            y_prev: optional_int_attribute(data, "y_prev")?,
        })
    }

    pub fn write_into(&self, data: &mut AttributeMap) {
        data.insert("x".into(), self.x.into());
        data.insert("y".into(), self.y.into());
        if let Some(x_prev) = self.x_prev {
            data.insert("x_prev".into(), x_prev.into());
        }
        if let Some(y_prev) = self.y_prev {
            data.insert("y_prev".into(), y_prev.into());
        }
    }

    /// Remember the current coordinates as the turn-start position.
    pub fn mark_start(&mut self) {
        self.x_prev = Some(self.x);
        self.y_prev = Some(self.y);
    }

    pub fn coords(&self) -> (i64, i64) {
        (self.x, self.y)
    }
}

/// Ordered pending waypoints; the front one is being executed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Queue {
    pub orders: Vec<Order>,
}

impl Queue {
    pub fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    pub fn from_attributes(data: &AttributeMap) -> Result<Self> {
        let raw = data
            .get("queue")
            .cloned()
            .ok_or_else(|| ValidationError::new("'queue' is required."))?;
        let orders = serde_json::from_value(raw)
            .map_err(|_| ValidationError::new("'queue' must be a list of orders."))?;
        Ok(Self { orders })
    }

    pub fn write_into(&self, data: &mut AttributeMap) {
        let orders = self.orders.iter().map(Order::to_value).collect();
        data.insert("queue".into(), Value::Array(orders));
    }

    pub fn front(&self) -> Option<&Order> {
        self.orders.first()
    }

    pub fn pop_front(&mut self) -> Option<Order> {
        if self.orders.is_empty() {
            None
        } else {
            Some(self.orders.remove(0))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }
}
