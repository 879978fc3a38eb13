//! Turn engine - main entry point for advancing the universe one turn

use crate::components::default_entity_types;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::manager::Manager;
use crate::schema::ComponentSchema;
use crate::state::{UniverseState, Updates};
use crate::systems::{MovementSystem, System, UpdateSystem};

/// One unprocessed turn: the prior state plus the updates submitted for it
pub struct GameState {
    state: UniverseState,
    updates: Updates,
    config: EngineConfig,
    /// Entity types known to this turn, in registration order
    entity_types: Vec<(String, Vec<ComponentSchema>)>,
    /// Host rule systems, run after movement
    extra_systems: Vec<Box<dyn System>>,
}

impl GameState {
    /// Create a turn over the default `species`, `planet` and `ship` types
    pub fn new(state: UniverseState, updates: Updates) -> Self {
        Self {
            state,
            updates,
            config: EngineConfig::default(),
            entity_types: default_entity_types()
                .into_iter()
                .map(|(name, components)| (name.to_string(), components))
                .collect(),
            extra_systems: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register another entity type, or replace the components of an existing one.
    pub fn with_entity_type(mut self, name: impl Into<String>, components: Vec<ComponentSchema>) -> Self {
        let name = name.into();
        self.entity_types.retain(|(existing, _)| *existing != name);
        self.entity_types.push((name, components));
        self
    }

    /// Append a rule system to run after movement.
    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.extra_systems.push(Box::new(system));
        self
    }

    /// Run the turn and produce the next universe state.
    ///
    /// Every entity is validated before any system runs; the first failure
    /// aborts the turn.
    pub fn generate(self) -> Result<UniverseState> {
        let GameState {
            state,
            updates,
            config,
            entity_types,
            extra_systems,
        } = self;

        let mut manager = Manager::new();
        for (name, components) in entity_types {
            manager.register_entity_type(name, components);
        }
        for (id, attributes) in state.entities {
            manager.spawn(id, attributes)?;
        }
        manager.validate()?;
        manager.hydrate()?;
        manager.set_updates(updates);

        let core: Vec<Box<dyn System>> = vec![
            Box::new(UpdateSystem),
            Box::new(MovementSystem::new(config.movement)),
        ];
        run_systems(core, &mut manager)?;

        // Host systems see and edit attributes only.
        manager.dehydrate();
        run_systems(extra_systems, &mut manager)?;

        let entities = manager.serialize()?;

        log::info!(
            "Generated turn {} with {} entities",
            state.turn + 1,
            entities.len()
        );
        Ok(UniverseState {
            turn: state.turn + 1,
            width: state.width,
            entities,
        })
    }
}

fn run_systems(systems: Vec<Box<dyn System>>, manager: &mut Manager) -> Result<()> {
    for mut system in systems {
        log::debug!("Running {} system", system.name());
        system.process(manager)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Position, Queue, QUEUE};
    use crate::entity::{AttributeMap, Attributes};
    use crate::schema::Field;
    use serde_json::{json, Value};

    fn state(entities: Value) -> UniverseState {
        serde_json::from_value(json!({"turn": 2500, "width": 1000, "entities": entities})).unwrap()
    }

    /// Counts the queue attributes it sees after movement has run
    struct QueueCensus {
        seen: std::rc::Rc<std::cell::Cell<usize>>,
    }

    impl System for QueueCensus {
        fn name(&self) -> &str {
            "census"
        }

        fn process(&mut self, manager: &mut Manager) -> Result<()> {
            let world = manager.world();
            let queues = manager
                .get_entities(QUEUE)
                .into_iter()
                .filter(|(_, entity)| {
                    world.get::<&Queue>(*entity).is_err()
                        && world
                            .get::<&Attributes>(*entity)
                            .is_ok_and(|attributes| attributes.contains("queue"))
                })
                .count();
            self.seen.set(queues);
            Ok(())
        }
    }

    /// Clears every queue and parks every entity at the origin
    struct Recall;

    impl System for Recall {
        fn name(&self) -> &str {
            "recall"
        }

        fn process(&mut self, manager: &mut Manager) -> Result<()> {
            for (_, entity) in manager.get_entities(QUEUE) {
                assert!(manager.world().get::<&Position>(entity).is_err());
                let mut attributes = manager.world().get::<&mut Attributes>(entity).unwrap();
                attributes.set("queue", json!([]));
                attributes.set("x", 0);
                attributes.set("y", 0);
            }
            Ok(())
        }
    }

    #[test]
    fn test_turn_advances() {
        let next = GameState::new(state(json!({})), Updates::new()).generate().unwrap();
        assert_eq!(next.turn, 2501);
        assert_eq!(next.width, 1000);
        assert!(next.entities.is_empty());
    }

    #[test]
    fn test_validation_aborts_before_systems() {
        let seen = std::rc::Rc::new(std::cell::Cell::new(usize::MAX));
        let result = GameState::new(
            state(json!({"1": {"type": "ship", "x": 1, "y": 2, "queue": [], "owner_id": 0}})),
            Updates::new(),
        )
        .with_system(QueueCensus { seen: seen.clone() })
        .generate();

        assert_eq!(result.unwrap_err().message(), "'owner_id' is not an existing entity.");
        assert_eq!(seen.get(), usize::MAX);
    }

    #[test]
    fn test_extra_system_runs_after_movement() {
        let seen = std::rc::Rc::new(std::cell::Cell::new(0));
        GameState::new(
            state(json!({
                "0": {"type": "ship", "x": 0, "y": 0, "queue": []},
                "1": {"type": "ship", "x": 5, "y": 5, "queue": []},
            })),
            Updates::new(),
        )
        .with_system(QueueCensus { seen: seen.clone() })
        .generate()
        .unwrap();
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn test_host_system_edits_survive() {
        let updates: Updates =
            serde_json::from_value(json!({"0": [{"seq": 1, "x_t": 900, "y_t": 900, "warp": 5}]})).unwrap();
        let next = GameState::new(
            state(json!({"0": {"type": "ship", "x": 480, "y": 235, "queue": [{"x_t": 422, "y_t": 210, "warp": 10}]}})),
            updates,
        )
        .with_system(Recall)
        .generate()
        .unwrap();

        let ship = &next.entities[&0];
        assert_eq!(ship["queue"], json!([]));
        assert_eq!((ship["x"].as_i64(), ship["y"].as_i64()), (Some(0), Some(0)));
        assert_eq!((ship["x_prev"].as_i64(), ship["y_prev"].as_i64()), (Some(480), Some(235)));
    }

    #[test]
    fn test_custom_entity_type() {
        let beacon = ComponentSchema::new("beacon").field(Field::char("type")).field(Field::char("label"));
        let next = GameState::new(
            state(json!({"3": {"type": "beacon", "label": "home", "stray": 1}})),
            Updates::new(),
        )
        .with_entity_type("beacon", vec![beacon])
        .generate()
        .unwrap();

        let mut expected = AttributeMap::new();
        expected.insert("type".into(), json!("beacon"));
        expected.insert("label".into(), json!("home"));
        assert_eq!(next.entities[&3], expected);
    }

    #[test]
    fn test_micro_steps_are_configurable() {
        let mut config = EngineConfig::default();
        config.movement.micro_steps = 10;
        let updates: Updates =
            serde_json::from_value(json!({"0": [{"seq": 0, "x_t": 100, "y_t": 0, "warp": 10}]})).unwrap();

        let next = GameState::new(state(json!({"0": {"type": "ship", "x": 0, "y": 0, "queue": []}})), updates)
            .with_config(config)
            .generate()
            .unwrap();
        assert_eq!(next.entities[&0]["x"], 100);
        assert_eq!(next.entities[&0]["queue"], json!([]));
    }
}
