use std::time::Duration;

use alchemy_catalog::{CatalogDocument, Registry};
use alchemy_core::{
    Command, ElementName, EntityId, Event, PlayArea, PointerButton, PointerInput, RemovalReason,
    SpawnOrigin, WorldPoint, ELEMENT_ICON_SIZE,
};
use alchemy_system_interaction::{HoldState, Interaction, InteractionConfig};
use alchemy_world::{apply, query, World};

struct Harness {
    world: World,
    interaction: Interaction,
    registry: Registry,
    pending: Vec<Event>,
}

impl Harness {
    fn new() -> Self {
        let registry = CatalogDocument::default_catalog()
            .to_registry()
            .expect("default catalog is valid");
        let mut world = World::new();
        let mut pending = Vec::new();
        apply(
            &mut world,
            Command::SeedDiscovery {
                elements: registry
                    .base_elements()
                    .into_iter()
                    .map(|element| element.name().clone())
                    .collect(),
            },
            &mut pending,
        );

        Self {
            world,
            interaction: Interaction::new(InteractionConfig::new(
                PlayArea::new(640.0, 480.0),
                Duration::from_millis(250),
                7,
            )),
            registry,
            pending,
        }
    }

    fn place(&mut self, name: &str, x: f32, y: f32) -> EntityId {
        let mut events = Vec::new();
        apply(
            &mut self.world,
            Command::SpawnEntity {
                element: ElementName::new(name),
                position: WorldPoint::new(x, y),
                origin: SpawnOrigin::Base,
            },
            &mut events,
        );
        let id = events
            .iter()
            .find_map(|event| match event {
                Event::EntitySpawned { entity, .. } => Some(*entity),
                _ => None,
            })
            .expect("spawn confirmed");
        self.pending.extend(events);
        id
    }

    fn step(&mut self, input: Option<PointerInput>) -> Vec<Command> {
        let view = query::entity_view(&self.world);
        let learned = query::learned_elements(&self.world).to_vec();
        let events = std::mem::take(&mut self.pending);
        let mut commands = Vec::new();
        self.interaction.handle(
            &events,
            input,
            &view,
            &self.registry,
            &learned,
            &mut commands,
        );
        for command in commands.clone() {
            apply(&mut self.world, command, &mut self.pending);
        }
        commands
    }

    fn down(&mut self, x: f32, y: f32, at_ms: u64) -> Vec<Command> {
        self.step(Some(PointerInput::down(WorldPoint::new(x, y), ms(at_ms))))
    }

    fn up(&mut self, x: f32, y: f32, at_ms: u64) -> Vec<Command> {
        self.step(Some(PointerInput::up(WorldPoint::new(x, y), ms(at_ms))))
    }

    fn drag(&mut self, x: f32, y: f32, at_ms: u64) -> Vec<Command> {
        self.step(Some(PointerInput::moved(WorldPoint::new(x, y), ms(at_ms))))
    }

    fn tick(&mut self) {
        apply(&mut self.world, Command::Tick, &mut self.pending);
        let _ = self.step(None);
    }

    fn elements(&self) -> Vec<String> {
        query::entity_view(&self.world)
            .iter()
            .map(|entity| entity.element.as_str().to_owned())
            .collect()
    }
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[test]
fn combining_replaces_sources_with_products_near_midpoint() {
    let mut harness = Harness::new();
    let water = harness.place("Water", 100.0, 100.0);
    let fire = harness.place("Fire", 300.0, 100.0);

    let _ = harness.down(300.0, 100.0, 0);
    let _ = harness.drag(110.0, 100.0, 100);
    let commands = harness.up(110.0, 100.0, 200);

    let removed: Vec<EntityId> = commands
        .iter()
        .filter_map(|command| match command {
            Command::RemoveEntity { entity, .. } => Some(*entity),
            _ => None,
        })
        .collect();
    assert_eq!(removed, vec![fire, water], "each source is removed exactly once");

    assert_eq!(harness.elements(), ["Steam", "Steam"]);
    let midpoint = WorldPoint::new(105.0, 100.0);
    for entity in query::entity_view(&harness.world).iter() {
        assert!((entity.position.x - midpoint.x).abs() <= ELEMENT_ICON_SIZE / 2.0);
        assert!((entity.position.y - midpoint.y).abs() <= ELEMENT_ICON_SIZE / 2.0);
    }

    assert!(query::is_learned(&harness.world, &ElementName::new("Steam")));
    assert_eq!(
        query::pending_notifications(&harness.world),
        1,
        "two steam products announce the discovery once"
    );
    assert_eq!(harness.interaction.state(), HoldState::Idle);
}

#[test]
fn dropping_onto_unrelated_entity_leaves_both_in_place() {
    let mut harness = Harness::new();
    let air = harness.place("Air", 100.0, 100.0);
    let fire = harness.place("Fire", 300.0, 100.0);

    let _ = harness.down(300.0, 100.0, 0);
    let _ = harness.drag(120.0, 110.0, 100);
    let commands = harness.up(120.0, 110.0, 200);

    assert!(commands.is_empty(), "no reaction emits no commands");
    let view = query::entity_view(&harness.world);
    assert_eq!(view.len(), 2);
    assert_eq!(
        view.get(fire).map(|entity| entity.position),
        Some(WorldPoint::new(120.0, 110.0))
    );
    assert_eq!(
        view.get(air).map(|entity| entity.position),
        Some(WorldPoint::new(100.0, 100.0))
    );
}

#[test]
fn grab_offset_is_preserved_while_dragging() {
    let mut harness = Harness::new();
    let earth = harness.place("Earth", 200.0, 200.0);

    let _ = harness.down(210.0, 190.0, 0);
    let commands = harness.drag(310.0, 290.0, 50);

    assert_eq!(
        commands,
        vec![Command::MoveEntity {
            entity: earth,
            position: WorldPoint::new(300.0, 300.0),
        }]
    );
}

#[test]
fn pressing_an_entity_raises_it() {
    let mut harness = Harness::new();
    let bottom = harness.place("Water", 200.0, 200.0);
    let _top = harness.place("Fire", 250.0, 200.0);

    let commands = harness.down(180.0, 200.0, 0);

    assert_eq!(commands, vec![Command::RaiseEntity { entity: bottom }]);
    let view = query::entity_view(&harness.world);
    assert_eq!(view.iter().last().map(|entity| entity.id), Some(bottom));
}

#[test]
fn double_click_clones_and_holds_the_copy() {
    let mut harness = Harness::new();
    let original = harness.place("Earth", 200.0, 200.0);

    let _ = harness.down(200.0, 200.0, 0);
    let _ = harness.up(200.0, 200.0, 60);
    let commands = harness.down(205.0, 200.0, 120);
    assert_eq!(
        commands,
        vec![Command::SpawnEntity {
            element: ElementName::new("Earth"),
            position: WorldPoint::new(205.0, 200.0),
            origin: SpawnOrigin::Clone,
        }]
    );

    let _ = harness.drag(400.0, 300.0, 180);
    let clone = harness
        .interaction
        .held_entity()
        .expect("clone attached to the pointer");
    assert_ne!(clone, original);
    let _ = harness.up(400.0, 300.0, 240);

    let view = query::entity_view(&harness.world);
    assert_eq!(view.len(), 2);
    assert_eq!(
        view.get(original).map(|entity| entity.position),
        Some(WorldPoint::new(200.0, 200.0))
    );
    assert_eq!(
        view.get(clone).map(|entity| entity.position),
        Some(WorldPoint::new(400.0, 300.0))
    );
}

#[test]
fn slow_second_press_grabs_instead_of_cloning() {
    let mut harness = Harness::new();
    let original = harness.place("Water", 200.0, 200.0);

    let _ = harness.down(200.0, 200.0, 0);
    let _ = harness.up(200.0, 200.0, 60);
    let commands = harness.down(200.0, 200.0, 1_000);

    assert_eq!(commands, vec![Command::RaiseEntity { entity: original }]);
    assert_eq!(harness.interaction.held_entity(), Some(original));
    assert_eq!(query::entity_view(&harness.world).len(), 1);
}

#[test]
fn two_empty_presses_spawn_base_ring_at_pointer() {
    let mut harness = Harness::new();
    let center = WorldPoint::new(150.0, 150.0);

    assert!(harness.down(center.x, center.y, 0).is_empty());
    let _ = harness.up(center.x, center.y, 50);
    let commands = harness.down(center.x, center.y, 100);

    assert_eq!(commands.len(), 4);
    assert_eq!(harness.elements(), ["Water", "Fire", "Air", "Earth"]);
    for entity in query::entity_view(&harness.world).iter() {
        assert!((entity.position.distance(center) - ELEMENT_ICON_SIZE).abs() < 1e-3);
    }
    assert!(
        query::notification(&harness.world).is_none(),
        "base elements are already known"
    );
}

#[test]
fn empty_press_after_entity_press_is_a_miss_click() {
    let mut harness = Harness::new();
    let _ = harness.place("Water", 300.0, 300.0);

    let _ = harness.down(300.0, 300.0, 0);
    let _ = harness.up(300.0, 300.0, 50);
    let commands = harness.down(50.0, 50.0, 100);

    assert!(commands.is_empty(), "miss-click must not respawn base elements");
    assert_eq!(harness.elements(), ["Water"]);
}

#[test]
fn events_outside_play_area_are_ignored() {
    let mut harness = Harness::new();
    let _ = harness.place("Water", 10.0, 10.0);

    assert!(harness.down(-5.0, 10.0, 0).is_empty());
    assert!(harness.down(10.0, 480.0, 10).is_empty());
    assert_eq!(harness.interaction.state(), HoldState::Idle);
}

#[test]
fn secondary_button_is_ignored() {
    let mut harness = Harness::new();
    let _ = harness.place("Water", 100.0, 100.0);

    let mut press = PointerInput::down(WorldPoint::new(100.0, 100.0), ms(0));
    press.button = PointerButton::Secondary;

    assert!(harness.step(Some(press)).is_empty());
    assert_eq!(harness.interaction.held_entity(), None);
}

#[test]
fn dropping_into_trash_discards_the_entity() {
    let mut harness = Harness::new();
    let mud = harness.place("Mud", 300.0, 300.0);

    let _ = harness.down(300.0, 300.0, 0);
    for _ in 0..8 {
        harness.tick();
    }
    let _ = harness.drag(590.0, 400.0, 100);
    assert!(harness.interaction.trash_view(1.0).lid_open);

    let commands = harness.up(590.0, 400.0, 200);
    assert_eq!(
        commands,
        vec![Command::RemoveEntity {
            entity: mud,
            reason: RemovalReason::Discarded,
        }]
    );
    assert!(query::entity_view(&harness.world).is_empty());
}

#[test]
fn crafting_in_the_trash_corner_wins_over_discarding() {
    let mut harness = Harness::new();
    let _ = harness.place("Water", 580.0, 420.0);
    let _ = harness.place("Fire", 300.0, 100.0);

    let _ = harness.down(300.0, 100.0, 0);
    for _ in 0..8 {
        harness.tick();
    }
    let _ = harness.drag(585.0, 420.0, 100);
    let commands = harness.up(585.0, 420.0, 200);

    assert!(
        !commands.iter().any(|command| matches!(
            command,
            Command::RemoveEntity {
                reason: RemovalReason::Discarded,
                ..
            }
        )),
        "a reacting partner takes precedence over the trash"
    );
    assert_eq!(harness.elements(), ["Steam", "Steam"]);
}

#[test]
fn clicking_an_entity_over_the_trash_keeps_it() {
    let mut harness = Harness::new();
    let mud = harness.place("Mud", 580.0, 420.0);

    let _ = harness.down(580.0, 420.0, 0);
    for _ in 0..8 {
        harness.tick();
    }
    let commands = harness.up(580.0, 420.0, 500);

    assert!(commands.is_empty(), "a press without drag never discards");
    assert_eq!(
        query::entity_view(&harness.world)
            .get(mud)
            .map(|entity| entity.position),
        Some(WorldPoint::new(580.0, 420.0))
    );
}

#[test]
fn hidden_trash_does_not_discard() {
    let mut harness = Harness::new();
    let mud = harness.place("Mud", 300.0, 300.0);

    let _ = harness.down(300.0, 300.0, 0);
    let _ = harness.drag(590.0, 400.0, 20);
    let commands = harness.up(590.0, 400.0, 40);

    assert!(commands.is_empty());
    assert_eq!(
        query::entity_view(&harness.world)
            .get(mud)
            .map(|entity| entity.position),
        Some(WorldPoint::new(590.0, 400.0))
    );
}

#[test]
fn trash_hides_again_once_released() {
    let mut harness = Harness::new();
    let _ = harness.place("Mud", 300.0, 300.0);

    let hidden_y = harness.interaction.trash_view(0.0).bounds.origin.y;
    let _ = harness.down(300.0, 300.0, 0);
    for _ in 0..8 {
        harness.tick();
    }
    assert!(harness.interaction.trash_view(1.0).bounds.origin.y < hidden_y);

    let _ = harness.up(300.0, 300.0, 50);
    for _ in 0..8 {
        harness.tick();
    }
    assert_eq!(harness.interaction.trash_view(1.0).bounds.origin.y, hidden_y);
}

#[test]
fn inventory_pick_spawns_held_element() {
    let mut harness = Harness::new();

    let _ = harness.drag(635.0, 100.0, 0);
    assert!(harness.interaction.inventory_open());
    for _ in 0..4 {
        harness.tick();
    }
    let view = harness
        .interaction
        .inventory_view(query::learned_elements(&harness.world), 1.0)
        .expect("inventory fully open");
    assert_eq!(view.slots.len(), 4);

    let (first, slot) = view.slots[0].clone();
    assert_eq!(first, ElementName::new("Water"));
    let press = slot.center();
    let commands = harness.down(press.x, press.y, 100);
    assert_eq!(
        commands,
        vec![Command::SpawnEntity {
            element: ElementName::new("Water"),
            position: press,
            origin: SpawnOrigin::Inventory,
        }]
    );

    let _ = harness.drag(200.0, 200.0, 150);
    let _ = harness.up(200.0, 200.0, 200);
    let placed = query::entity_view(&harness.world);
    assert_eq!(placed.len(), 1);
    assert_eq!(
        placed.iter().next().map(|entity| entity.position),
        Some(WorldPoint::new(200.0, 200.0))
    );
}

#[test]
fn inventory_closes_when_pointer_leaves_panel() {
    let mut harness = Harness::new();

    let _ = harness.drag(635.0, 100.0, 0);
    let _ = harness.drag(500.0, 100.0, 10);
    assert!(harness.interaction.inventory_open(), "panel keeps itself open");

    let _ = harness.drag(100.0, 100.0, 20);
    assert!(!harness.interaction.inventory_open());
}

#[test]
fn identical_seeds_jitter_identically() {
    let run = || {
        let mut harness = Harness::new();
        let _ = harness.place("Water", 100.0, 100.0);
        let _ = harness.place("Fire", 300.0, 100.0);
        let _ = harness.down(300.0, 100.0, 0);
        let _ = harness.drag(100.0, 100.0, 100);
        harness.up(100.0, 100.0, 200)
    };

    assert_eq!(run(), run());
}
