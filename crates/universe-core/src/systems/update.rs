//! Update system - merges client order updates into each entity's queue

use std::collections::BTreeMap;

use crate::components::{Queue, QUEUE};
use crate::error::Result;
use crate::manager::Manager;
use crate::state::Update;

use super::System;

/// Applies the turn's order updates, keyed by queue position
#[derive(Debug, Default)]
pub struct UpdateSystem;

impl System for UpdateSystem {
    fn name(&self) -> &str {
        "update"
    }

    fn process(&mut self, manager: &mut Manager) -> Result<()> {
        let mut merged = 0;
        for (id, entity) in manager.get_entities(QUEUE) {
            let updates = manager.take_updates(id);
            if updates.is_empty() {
                continue;
            }
            if let Ok(mut queue) = manager.world().get::<&mut Queue>(entity) {
                merged += updates.len();
                merge_updates(&mut queue, updates);
            }
        }

        for id in manager.pending_update_ids() {
            log::warn!("Ignoring updates for entity {}: it has no order queue", id);
        }
        manager.clear_updates();

        log::debug!("Merged {} order updates", merged);
        Ok(())
    }
}

/// Overwrite or insert waypoints by queue position, then rebuild the queue
/// in ascending position order. Later updates to the same slot win.
pub fn merge_updates(queue: &mut Queue, updates: impl IntoIterator<Item = Update>) {
    let mut slots: BTreeMap<usize, _> = queue.orders.drain(..).enumerate().collect();
    for update in updates {
        slots.insert(update.seq, update.order);
    }
    queue.orders = slots.into_values().collect();
}
