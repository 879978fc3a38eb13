//! Universe Core - Turn Engine
//!
//! Advances a space-strategy universe by exactly one turn: the prior state
//! and a batch of player order updates go in, the next state comes out.
//!
//! # Architecture
//!
//! Each turn builds a fresh [`Manager`](manager::Manager) over a `hecs` world:
//! - **Entities**: species, planets and ships keyed by a stable integer id
//! - **Components**: declarative attribute schemas (position, queue, ownership, ...)
//!   plus typed views that the systems read and write
//! - **Systems**: order-queue merging, then interception movement, then any
//!   rule systems the host appends
//!
//! # Example
//!
//! ```rust,no_run
//! use universe_core::prelude::*;
//!
//! let state: UniverseState = serde_json::from_str(r#"{
//!     "turn": 2500,
//!     "width": 1000,
//!     "entities": {"0": {"type": "ship", "x": 480, "y": 235, "queue": []}}
//! }"#).unwrap();
//! let updates: Updates = serde_json::from_str(
//!     r#"{"0": [{"seq": 0, "x_t": 422, "y_t": 210, "warp": 10}]}"#,
//! ).unwrap();
//!
//! let next = GameState::new(state, updates).generate().unwrap();
//! assert_eq!(next.turn, 2501);
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod manager;
pub mod schema;
pub mod state;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::{Goal, Order, Position, Queue};
    pub use crate::config::{EngineConfig, MovementConfig};
    pub use crate::engine::GameState;
    pub use crate::entity::{AttributeMap, EntityId};
    pub use crate::error::ValidationError;
    pub use crate::manager::Manager;
    pub use crate::state::{UniverseState, Update, Updates};
    pub use crate::systems::System;
}
