//! Per-turn entity registry and capability index.
//!
//! The manager owns a `hecs::World` holding one entity per pool entry. Each
//! entity carries its [`Identity`] and raw [`Attributes`]; after validation
//! the movement-facing components also get typed views ([`Position`],
//! [`Queue`]). For every component name the manager keeps an id-ordered
//! index so systems can select "all entities with a queue" directly.
//!
//! Typed views exist only between [`Manager::hydrate`] and
//! [`Manager::dehydrate`]; outside that window the raw attributes are the
//! single copy of every value.

use std::collections::{BTreeMap, HashMap};

use hecs::World;

use crate::components::{default_entity_types, Position, Queue, POSITION, QUEUE};
use crate::entity::{AttributeMap, Attributes, EntityId, EntityLookup, Identity};
use crate::error::{Result, ValidationError};
use crate::schema::ComponentSchema;
use crate::state::{Update, Updates};

/// Entity registry for a single turn
#[derive(Default)]
pub struct Manager {
    world: World,
    /// Entity type name -> components in validation order
    types: HashMap<String, Vec<ComponentSchema>>,
    /// Component name -> (entity id -> entity)
    index: HashMap<&'static str, BTreeMap<EntityId, hecs::Entity>>,
    /// Every spawned entity, regardless of its components
    pool: BTreeMap<EntityId, hecs::Entity>,
    updates: Updates,
}

impl Manager {
    /// Create a manager with no registered entity types
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager that knows `species`, `planet` and `ship`
    pub fn with_default_types() -> Self {
        let mut manager = Self::new();
        for (name, components) in default_entity_types() {
            manager.register_entity_type(name, components);
        }
        manager
    }

    /// Declare the components (in validation order) carried by an entity type.
    pub fn register_entity_type(&mut self, name: impl Into<String>, components: Vec<ComponentSchema>) {
        for component in &components {
            self.index.entry(component.name()).or_default();
        }
        self.types.insert(name.into(), components);
    }

    pub fn components_of(&self, kind: &str) -> Option<&[ComponentSchema]> {
        self.types.get(kind).map(Vec::as_slice)
    }

    /// Add an entity with its raw, not yet validated attributes.
    pub fn spawn(&mut self, id: EntityId, attributes: AttributeMap) -> Result<hecs::Entity> {
        let kind = match attributes.get("type") {
            None => return Err(ValidationError::new("'type' is required.")),
            Some(value) => value
                .as_str()
                .ok_or_else(|| ValidationError::new("'type' must be a string."))?
                .to_string(),
        };
        let components = self
            .types
            .get(&kind)
            .ok_or_else(|| ValidationError::new(format!("'{}' is not a registered entity type.", kind)))?;
        let names: Vec<&'static str> = components.iter().map(ComponentSchema::name).collect();

        if let Some(old) = self.pool.remove(&id) {
            self.world
                .despawn(old)
                .map_err(|_| ValidationError::new(format!("Entity {} is not in the world.", id)))?;
            for members in self.index.values_mut() {
                members.remove(&id);
            }
        }

        let entity = self
            .world
            .spawn((Identity { id, kind }, Attributes::new(attributes)));
        self.pool.insert(id, entity);
        for name in names {
            self.index.entry(name).or_default().insert(id, entity);
        }
        Ok(entity)
    }

    /// The entity with this id, if it carries the named component.
    pub fn get_entity(&self, component: &str, id: EntityId) -> Option<hecs::Entity> {
        self.index.get(component)?.get(&id).copied()
    }

    /// All entities carrying the named component, in id order.
    pub fn get_entities(&self, component: &str) -> Vec<(EntityId, hecs::Entity)> {
        self.index
            .get(component)
            .map(|members| members.iter().map(|(id, e)| (*id, *e)).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Components of the entity with this id, plus its raw attributes.
    fn schemas_and_attributes(
        &self,
        id: EntityId,
    ) -> Option<(&[ComponentSchema], hecs::Ref<'_, Attributes>)> {
        let entity = *self.pool.get(&id)?;
        let kind = self.world.get::<&Identity>(entity).ok()?.kind.clone();
        let schemas = self.components_of(&kind)?;
        let attributes = self.world.get::<&Attributes>(entity).ok()?;
        Some((schemas, attributes))
    }

    /// Validate one entity against each of its components in order.
    pub fn validate_entity(&self, id: EntityId) -> Result<()> {
        let Some((schemas, attributes)) = self.schemas_and_attributes(id) else {
            return Ok(());
        };
        for schema in schemas {
            schema.validate(attributes.as_map(), self)?;
        }
        Ok(())
    }

    /// Validate the whole pool in id order, stopping at the first failure.
    pub fn validate(&self) -> Result<()> {
        for id in self.pool.keys() {
            self.validate_entity(*id)?;
        }
        Ok(())
    }

    /// Attach typed `Position` and `Queue` views built from validated attributes.
    pub fn hydrate(&mut self) -> Result<()> {
        let mut positions = Vec::new();
        for (id, entity) in self.get_entities(POSITION) {
            if let Ok(attributes) = self.world.get::<&Attributes>(entity) {
                positions.push((id, entity, Position::from_attributes(attributes.as_map())?));
            }
        }
        let mut queues = Vec::new();
        for (id, entity) in self.get_entities(QUEUE) {
            if let Ok(attributes) = self.world.get::<&Attributes>(entity) {
                queues.push((id, entity, Queue::from_attributes(attributes.as_map())?));
            }
        }

        let missing = |id: EntityId| ValidationError::new(format!("Entity {} is not in the world.", id));
        for (id, entity, position) in positions {
            self.world.insert_one(entity, position).map_err(|_| missing(id))?;
        }
        for (id, entity, queue) in queues {
            self.world.insert_one(entity, queue).map_err(|_| missing(id))?;
        }
        Ok(())
    }

    /// Fold typed views back into the raw attribute maps and drop them.
    ///
    /// Afterwards `x`, `y`, `x_prev`, `y_prev` and `queue` live only in
    /// [`Attributes`], so later writes there are what gets serialized.
    pub fn dehydrate(&mut self) {
        for (_, (attributes, position)) in self.world.query_mut::<(&mut Attributes, &Position)>() {
            position.write_into(&mut attributes.0);
        }
        for (_, (attributes, queue)) in self.world.query_mut::<(&mut Attributes, &Queue)>() {
            queue.write_into(&mut attributes.0);
        }
        for entity in self.pool.values() {
            // Entities of custom types may carry neither view.
            self.world.remove_one::<Position>(*entity).ok();
            self.world.remove_one::<Queue>(*entity).ok();
        }
    }

    /// Cleaned attribute map of one entity: the union of each component's output.
    pub fn serialize_entity(&self, id: EntityId) -> Result<AttributeMap> {
        let mut output = AttributeMap::new();
        if let Some((schemas, attributes)) = self.schemas_and_attributes(id) {
            for schema in schemas {
                output.extend(schema.serialize(attributes.as_map(), self)?);
            }
        }
        Ok(output)
    }

    pub fn serialize(&self) -> Result<BTreeMap<EntityId, AttributeMap>> {
        let mut entities = BTreeMap::new();
        for id in self.pool.keys() {
            entities.insert(*id, self.serialize_entity(*id)?);
        }
        Ok(entities)
    }

    /// Human-readable attribute text of one entity.
    pub fn display(&self, id: EntityId) -> Result<BTreeMap<String, String>> {
        let mut output = BTreeMap::new();
        if let Some((schemas, attributes)) = self.schemas_and_attributes(id) {
            for schema in schemas {
                output.extend(schema.display(attributes.as_map(), self)?);
            }
        }
        Ok(output)
    }

    pub fn set_updates(&mut self, updates: Updates) {
        self.updates = updates;
    }

    /// Remove and return the pending updates addressed to an entity.
    pub fn take_updates(&mut self, id: EntityId) -> Vec<Update> {
        self.updates.remove(&id).unwrap_or_default()
    }

    /// Ids that still have updates nobody consumed.
    pub fn pending_update_ids(&self) -> Vec<EntityId> {
        self.updates.keys().copied().collect()
    }

    pub fn clear_updates(&mut self) {
        self.updates.clear();
    }
}

impl EntityLookup for Manager {
    fn entity_type(&self, id: EntityId) -> Option<String> {
        let entity = *self.pool.get(&id)?;
        let identity = self.world.get::<&Identity>(entity).ok()?;
        Some(identity.kind.clone())
    }
}
