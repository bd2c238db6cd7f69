#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Alchemy.
//!
//! The world owns every placed entity, the set of learned elements and the
//! queue of discovery notifications. It is mutated exclusively through
//! [`apply`], which reports each accepted mutation as an [`Event`].

mod discovery;

use alchemy_core::{
    Command, ElementName, EntityId, Event, RemovalReason, TickProgress, WorldPoint,
    ENTITY_FADE_TICKS,
};
use tracing::{debug, trace};

use self::discovery::{Discovery, Notification, NotificationQueue};

/// Represents the authoritative Alchemy world state.
#[derive(Debug)]
pub struct World {
    entities: Vec<ElementEntity>,
    next_entity_id: u32,
    discovery: Discovery,
    notifications: NotificationQueue,
    tick_index: u64,
}

impl World {
    /// Creates an empty world with nothing placed and nothing learned.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_entity_id: 0,
            discovery: Discovery::default(),
            notifications: NotificationQueue::default(),
            tick_index: 0,
        }
    }

    fn allocate_entity_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id = self.next_entity_id.wrapping_add(1);
        id
    }

    fn entity_index(&self, entity: EntityId) -> Option<usize> {
        self.entities.iter().position(|candidate| candidate.id == entity)
    }

    fn entity_mut(&mut self, entity: EntityId) -> Option<&mut ElementEntity> {
        self.entities
            .iter_mut()
            .find(|candidate| candidate.id == entity)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Placed instance of an element.
#[derive(Clone, Debug)]
struct ElementEntity {
    id: EntityId,
    element: ElementName,
    position: WorldPoint,
    fade: TickProgress,
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced {
                tick: world.tick_index,
            });

            for entity in &mut world.entities {
                entity.fade.advance();
            }

            if let Some(expired) = world.notifications.advance_head() {
                trace!(element = %expired.element(), "notification expired");
                out_events.push(Event::NotificationExpired {
                    element: expired.element().clone(),
                });
            }
        }
        Command::SeedDiscovery { elements } => {
            for element in &elements {
                let _ = world.discovery.insert(element);
            }
        }
        Command::SpawnEntity {
            element,
            position,
            origin,
        } => {
            let id = world.allocate_entity_id();
            world.entities.push(ElementEntity {
                id,
                element: element.clone(),
                position,
                fade: TickProgress::start(ENTITY_FADE_TICKS),
            });
            trace!(entity = id.get(), %element, ?origin, "entity spawned");
            out_events.push(Event::EntitySpawned {
                entity: id,
                element,
                position,
                origin,
            });
        }
        Command::MoveEntity { entity, position } => match world.entity_mut(entity) {
            Some(placed) => {
                placed.position = position;
                out_events.push(Event::EntityMoved { entity, position });
            }
            None => out_events.push(Event::EntityMissing { entity }),
        },
        Command::RaiseEntity { entity } => match world.entity_index(entity) {
            Some(index) => {
                let raised = world.entities.remove(index);
                world.entities.push(raised);
                out_events.push(Event::EntityRaised { entity });
            }
            None => out_events.push(Event::EntityMissing { entity }),
        },
        Command::RemoveEntity { entity, reason } => match world.entity_index(entity) {
            Some(index) => {
                let removed = world.entities.remove(index);
                if reason == RemovalReason::Discarded {
                    debug!(entity = entity.get(), element = %removed.element, "entity discarded");
                }
                out_events.push(Event::EntityRemoved {
                    entity,
                    element: removed.element,
                    reason,
                });
            }
            None => out_events.push(Event::EntityMissing { entity }),
        },
        Command::LearnElement { element } => {
            if !world.discovery.insert(element.name()) {
                return;
            }

            debug!(element = %element, "element learned");
            world.notifications.push(Notification::discovered(&element));
            out_events.push(Event::ElementLearned {
                element: element.name().clone(),
            });
            out_events.push(Event::NotificationQueued {
                element: element.name().clone(),
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use alchemy_core::{ElementName, EntitySnapshot, EntityView, NotificationSnapshot};

    use super::World;

    /// Captures every placed entity in draw order (bottom first).
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        EntityView::from_snapshots(
            world
                .entities
                .iter()
                .map(|entity| EntitySnapshot {
                    id: entity.id,
                    element: entity.element.clone(),
                    position: entity.position,
                    fade: entity.fade,
                })
                .collect(),
        )
    }

    /// Notification currently at the head of the queue, if any.
    #[must_use]
    pub fn notification(world: &World) -> Option<NotificationSnapshot> {
        world.notifications.head().map(|head| head.snapshot())
    }

    /// Number of notifications waiting, including the visible head.
    #[must_use]
    pub fn pending_notifications(world: &World) -> usize {
        world.notifications.len()
    }

    /// Learned elements in the order they were first learned.
    #[must_use]
    pub fn learned_elements(world: &World) -> &[ElementName] {
        world.discovery.in_learn_order()
    }

    /// Reports whether the element has been learned.
    #[must_use]
    pub fn is_learned(world: &World, element: &ElementName) -> bool {
        world.discovery.contains(element)
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[cfg(test)]
mod tests {
    use alchemy_core::{Element, IconKey, SpawnOrigin, NOTIFICATION_TICKS};

    use super::*;

    fn element(name: &str) -> Element {
        Element::new(name, IconKey::new(&name.to_lowercase()), false)
    }

    fn spawn(world: &mut World, name: &str, x: f32, y: f32) -> EntityId {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnEntity {
                element: ElementName::new(name),
                position: WorldPoint::new(x, y),
                origin: SpawnOrigin::Base,
            },
            &mut events,
        );
        match events.as_slice() {
            [Event::EntitySpawned { entity, .. }] => *entity,
            other => panic!("unexpected spawn events: {other:?}"),
        }
    }

    #[test]
    fn spawned_entities_receive_increasing_identifiers() {
        let mut world = World::new();
        let first = spawn(&mut world, "Water", 10.0, 10.0);
        let second = spawn(&mut world, "Fire", 20.0, 20.0);

        assert!(second > first);
        let ids: Vec<EntityId> = query::entity_view(&world).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn raise_moves_entity_to_top_of_draw_order() {
        let mut world = World::new();
        let bottom = spawn(&mut world, "Water", 0.0, 0.0);
        let top = spawn(&mut world, "Fire", 0.0, 0.0);
        let mut events = Vec::new();

        apply(&mut world, Command::RaiseEntity { entity: bottom }, &mut events);

        assert_eq!(events, vec![Event::EntityRaised { entity: bottom }]);
        let view = query::entity_view(&world);
        let hit = view
            .topmost_at(WorldPoint::ZERO, None)
            .expect("both entities cover the origin");
        assert_eq!(hit.id, bottom);
        assert_eq!(
            view.topmost_at(WorldPoint::ZERO, Some(bottom)).map(|e| e.id),
            Some(top)
        );
    }

    #[test]
    fn commands_for_missing_entities_are_reported() {
        let mut world = World::new();
        let ghost = EntityId::new(99);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MoveEntity {
                entity: ghost,
                position: WorldPoint::ZERO,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::RemoveEntity {
                entity: ghost,
                reason: RemovalReason::Consumed,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::EntityMissing { entity: ghost },
                Event::EntityMissing { entity: ghost },
            ]
        );
    }

    #[test]
    fn remove_reports_element_and_reason() {
        let mut world = World::new();
        let entity = spawn(&mut world, "Mud", 5.0, 5.0);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::RemoveEntity {
                entity,
                reason: RemovalReason::Discarded,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::EntityRemoved {
                entity,
                element: ElementName::new("Mud"),
                reason: RemovalReason::Discarded,
            }]
        );
        assert!(query::entity_view(&world).is_empty());
    }

    #[test]
    fn learning_twice_queues_a_single_notification() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::LearnElement {
                element: element("Steam"),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::LearnElement {
                element: element("Steam"),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::ElementLearned {
                    element: ElementName::new("Steam"),
                },
                Event::NotificationQueued {
                    element: ElementName::new("Steam"),
                },
            ]
        );
        assert_eq!(query::pending_notifications(&world), 1);
        let head = query::notification(&world).expect("notification queued");
        assert_eq!(head.title, "New element found!");
        assert_eq!(head.message, "Steam!");
        assert_eq!(head.icon, IconKey::new("steam"));
    }

    #[test]
    fn seeded_elements_are_learned_silently() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::SeedDiscovery {
                elements: vec![ElementName::new("Water"), ElementName::new("Fire")],
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::LearnElement {
                element: element("Water"),
            },
            &mut events,
        );

        assert!(events.is_empty());
        assert!(query::notification(&world).is_none());
        assert!(query::is_learned(&world, &ElementName::new("Fire")));
        assert_eq!(
            query::learned_elements(&world),
            &[ElementName::new("Water"), ElementName::new("Fire")]
        );
    }

    #[test]
    fn only_the_head_notification_advances() {
        let mut world = World::new();
        let mut events = Vec::new();
        for name in ["Steam", "Mud"] {
            apply(
                &mut world,
                Command::LearnElement {
                    element: element(name),
                },
                &mut events,
            );
        }

        for _ in 0..NOTIFICATION_TICKS - 1 {
            apply(&mut world, Command::Tick, &mut events);
        }
        let head = query::notification(&world).expect("head still alive");
        assert_eq!(head.element, ElementName::new("Steam"));
        assert_eq!(head.progress.current, NOTIFICATION_TICKS - 1);

        events.clear();
        apply(&mut world, Command::Tick, &mut events);
        assert!(events.contains(&Event::NotificationExpired {
            element: ElementName::new("Steam"),
        }));

        let next = query::notification(&world).expect("second notification visible");
        assert_eq!(next.element, ElementName::new("Mud"));
        assert_eq!(next.progress.current, 0, "queued notifications must not age");
    }

    #[test]
    fn tick_advances_entity_fade_until_saturated() {
        let mut world = World::new();
        let entity = spawn(&mut world, "Air", 0.0, 0.0);
        let mut events = Vec::new();

        for _ in 0..ENTITY_FADE_TICKS + 2 {
            apply(&mut world, Command::Tick, &mut events);
        }

        let view = query::entity_view(&world);
        let snapshot = view.get(entity).expect("entity present");
        assert!(snapshot.fade.is_complete());
        assert_eq!(snapshot.fade.current, ENTITY_FADE_TICKS);
        assert_eq!(query::tick_index(&world), u64::from(ENTITY_FADE_TICKS + 2));
        assert_eq!(
            events.first(),
            Some(&Event::TimeAdvanced { tick: 1 }),
            "tick reports the new tick index"
        );
    }
}
