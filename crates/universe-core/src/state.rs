//! The universe state document and client order updates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::Order;
use crate::entity::{AttributeMap, EntityId};

/// Snapshot of a universe between turns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniverseState {
    pub turn: i64,
    pub width: i64,
    #[serde(default)]
    pub entities: BTreeMap<EntityId, AttributeMap>,
}

/// A client patch to one slot of an entity's order queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    /// Queue position to overwrite or append at, not a submission counter
    pub seq: usize,
    #[serde(flatten)]
    pub order: Order,
}

impl Update {
    pub fn new(seq: usize, order: Order) -> Self {
        Self { seq, order }
    }
}

/// Order updates per entity, applied in list order
pub type Updates = BTreeMap<EntityId, Vec<Update>>;
