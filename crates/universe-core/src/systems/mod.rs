//! Systems - turn logic that runs over the manager in a fixed order

mod movement;
mod update;

pub use movement::*;
pub use update::*;

use crate::error::Result;
use crate::manager::Manager;

/// One stage of the turn pipeline.
///
/// Systems run in registration order and mutate entity components in place.
/// Rule systems owned by the host (growth, production, ...) implement this
/// trait and are appended after movement. By then the typed `Position` and
/// `Queue` views have been folded back, so host systems read and write the
/// entity's [`Attributes`](crate::entity::Attributes).
pub trait System {
    fn name(&self) -> &str;

    fn process(&mut self, manager: &mut Manager) -> Result<()>;
}
