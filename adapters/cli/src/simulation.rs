//! Fixed-step session driver shared between the world, the systems and the
//! rendering backend.

use std::{sync::Arc, time::Duration};

use alchemy_catalog::Registry;
use alchemy_core::{
    Command, ElementName, EntitySnapshot, Event, IconKey, PlayArea, PointerInput, WorldPoint,
    TICK_DURATION,
};
use alchemy_rendering::{
    EntityPresentation, FrameInput, InventoryPresentation, InventorySlotPresentation,
    NotificationPresentation, Scene, TrashPresentation,
};
use alchemy_system_bootstrap::Bootstrap;
use alchemy_system_interaction::{layout::INVENTORY_ICON_GAP, Interaction, InteractionConfig};
use alchemy_world::{self as world, query, World};
use glam::Vec2;
use tracing::debug;

/// Upper bound on ticks simulated for a single frame.
const MAX_TICKS_PER_FRAME: u32 = 10;

/// Owns the world and the systems, and advances them on a fixed tick.
#[derive(Debug)]
pub(crate) struct Simulation {
    registry: Arc<Registry>,
    world: World,
    interaction: Interaction,
    play_area: PlayArea,
    pending_events: Vec<Event>,
    clock: Duration,
    accumulator: Duration,
    last_cursor: Option<WorldPoint>,
}

impl Simulation {
    /// Starts a session with the base elements placed around the centre.
    pub(crate) fn new(registry: Arc<Registry>, config: InteractionConfig) -> Self {
        let mut simulation = Self {
            registry,
            world: World::new(),
            interaction: Interaction::new(config),
            play_area: config.play_area,
            pending_events: Vec::new(),
            clock: Duration::ZERO,
            accumulator: Duration::ZERO,
            last_cursor: None,
        };

        let mut commands = Vec::new();
        Bootstrap.handle(&simulation.registry, simulation.play_area, &mut commands);
        simulation.apply_commands(commands);
        simulation
    }

    /// Feeds one frame of input and runs every tick that became due.
    pub(crate) fn advance(&mut self, dt: Duration, input: &FrameInput) {
        self.clock += dt;

        for pointer in self.pointer_inputs(input) {
            self.step(Some(pointer));
        }

        self.accumulator += dt;
        let mut ticks = 0;
        while self.accumulator >= TICK_DURATION {
            if ticks == MAX_TICKS_PER_FRAME {
                debug!(
                    behind_ms = self.accumulator.as_millis() as u64,
                    "dropping simulation backlog"
                );
                self.accumulator = Duration::ZERO;
                break;
            }
            self.accumulator -= TICK_DURATION;
            self.apply_commands(vec![Command::Tick]);
            self.step(None);
            ticks += 1;
        }
    }

    /// Fraction of the next tick that already elapsed.
    pub(crate) fn partial_tick(&self) -> f32 {
        self.accumulator.as_secs_f32() / TICK_DURATION.as_secs_f32()
    }

    /// Rewrites `scene` to reflect the current state.
    pub(crate) fn populate_scene(&self, scene: &mut Scene) {
        let partial_tick = self.partial_tick();

        scene.play_area = Vec2::new(self.play_area.width(), self.play_area.height());
        scene.entities = query::entity_view(&self.world)
            .iter()
            .map(|entity| self.entity_presentation(entity, partial_tick))
            .collect();

        scene.notification = query::notification(&self.world).map(|toast| {
            let visibility = toast.visibility(partial_tick);
            NotificationPresentation::new(
                toast.title,
                toast.message,
                toast.icon,
                self.play_area.width(),
                visibility,
            )
        });

        let trash = self.interaction.trash_view(partial_tick);
        scene.trash = Some(TrashPresentation {
            origin: to_vec2(trash.bounds.origin),
            size: trash.bounds.width,
            lid_open: trash.lid_open,
        });

        let learned = query::learned_elements(&self.world);
        scene.inventory = self
            .interaction
            .inventory_view(learned, partial_tick)
            .map(|inventory| InventoryPresentation {
                origin: to_vec2(inventory.panel.origin),
                size: Vec2::new(inventory.panel.width, inventory.panel.height),
                slots: inventory
                    .slots
                    .iter()
                    .map(|(element, bounds)| InventorySlotPresentation {
                        icon: self.icon_for(element),
                        origin: to_vec2(bounds.origin),
                        size: bounds.width,
                    })
                    .collect(),
                icon_gap: INVENTORY_ICON_GAP,
            });
    }

    fn entity_presentation(
        &self,
        entity: &EntitySnapshot,
        partial_tick: f32,
    ) -> EntityPresentation {
        EntityPresentation::new(
            self.icon_for(&entity.element),
            entity.element.as_str(),
            to_vec2(entity.position),
            entity.fade.fraction(partial_tick),
        )
    }

    fn icon_for(&self, element: &ElementName) -> IconKey {
        self.registry
            .icon_of(element)
            .cloned()
            .unwrap_or_else(|| IconKey::new(element.as_str()))
    }

    /// Converts the frame snapshot into ordered move, press and release events.
    fn pointer_inputs(&mut self, input: &FrameInput) -> Vec<PointerInput> {
        let Some(cursor) = input.cursor_world_space else {
            return Vec::new();
        };
        let position = self.play_area.clamp(WorldPoint::new(cursor.x, cursor.y));

        let mut inputs = Vec::with_capacity(3);
        if self.last_cursor != Some(position) {
            inputs.push(PointerInput::moved(position, self.clock));
            self.last_cursor = Some(position);
        }
        if input.primary_pressed {
            inputs.push(PointerInput::down(position, self.clock));
        }
        if input.primary_released {
            inputs.push(PointerInput::up(position, self.clock));
        }
        inputs
    }

    fn step(&mut self, input: Option<PointerInput>) {
        let events = std::mem::take(&mut self.pending_events);
        let view = query::entity_view(&self.world);
        let mut commands = Vec::new();
        self.interaction.handle(
            &events,
            input,
            &view,
            &self.registry,
            query::learned_elements(&self.world),
            &mut commands,
        );
        self.apply_commands(commands);
    }

    fn apply_commands(&mut self, commands: Vec<Command>) {
        for command in commands {
            world::apply(&mut self.world, command, &mut self.pending_events);
        }
    }
}

fn to_vec2(point: WorldPoint) -> Vec2 {
    Vec2::new(point.x, point.y)
}

#[cfg(test)]
mod tests {
    use alchemy_catalog::CatalogDocument;

    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn simulation() -> Simulation {
        let registry = CatalogDocument::default_catalog()
            .to_registry()
            .expect("default catalog is valid");
        Simulation::new(Arc::new(registry), InteractionConfig::default())
    }

    fn position_of(simulation: &Simulation, name: &str) -> Vec2 {
        query::entity_view(&simulation.world)
            .iter()
            .find(|entity| entity.element.as_str() == name)
            .map(|entity| to_vec2(entity.position))
            .expect("element is placed")
    }

    fn frame(cursor: Vec2, pressed: bool, released: bool) -> FrameInput {
        FrameInput {
            cursor_world_space: Some(cursor),
            primary_pressed: pressed,
            primary_released: released,
        }
    }

    #[test]
    fn new_session_places_base_elements_without_notifications() {
        let simulation = simulation();
        let mut scene = Scene::new(Vec2::ZERO);
        simulation.populate_scene(&mut scene);

        let labels: Vec<&str> = scene.entities.iter().map(|entity| entity.label.as_str()).collect();
        assert_eq!(labels, ["Water", "Fire", "Air", "Earth"]);
        assert_eq!(scene.play_area, Vec2::new(640.0, 480.0));
        assert!(scene.notification.is_none());
        assert!(scene.inventory.is_none());
        let trash = scene.trash.expect("trash is always described");
        assert!(!trash.lid_open);
        assert_eq!(trash.origin.y, 480.0, "trash starts tucked below the bottom edge");
    }

    #[test]
    fn frame_time_is_split_into_fixed_ticks() {
        let mut simulation = simulation();
        simulation.advance(Duration::from_millis(120), &FrameInput::default());

        assert_eq!(query::tick_index(&simulation.world), 2);
        assert!((simulation.partial_tick() - 0.4).abs() < 1e-3);
    }

    #[test]
    fn long_stalls_do_not_replay_every_tick() {
        let mut simulation = simulation();
        simulation.advance(Duration::from_secs(5), &FrameInput::default());

        assert_eq!(
            query::tick_index(&simulation.world),
            u64::from(MAX_TICKS_PER_FRAME)
        );
        assert_eq!(simulation.partial_tick(), 0.0);
    }

    #[test]
    fn entities_fade_in_over_ticks() {
        let mut simulation = simulation();
        let mut scene = Scene::new(Vec2::ZERO);
        simulation.populate_scene(&mut scene);
        assert!(scene.entities.iter().all(|entity| entity.opacity == 0.0));

        simulation.advance(Duration::from_millis(200), &FrameInput::default());
        simulation.populate_scene(&mut scene);
        assert!(scene.entities.iter().all(|entity| entity.opacity == 1.0));
    }

    #[test]
    fn dragging_water_onto_fire_crafts_steam_and_announces_it() {
        let mut simulation = simulation();
        let water = position_of(&simulation, "Water");
        let fire = position_of(&simulation, "Fire");

        simulation.advance(FRAME, &frame(water, true, false));
        simulation.advance(FRAME, &frame(fire, false, true));

        let mut elements: Vec<String> = query::entity_view(&simulation.world)
            .iter()
            .map(|entity| entity.element.as_str().to_owned())
            .collect();
        elements.sort();
        assert_eq!(elements, ["Air", "Earth", "Steam", "Steam"]);
        assert!(query::is_learned(&simulation.world, &ElementName::new("Steam")));

        simulation.advance(Duration::from_millis(250), &FrameInput::default());
        let mut scene = Scene::new(Vec2::ZERO);
        simulation.populate_scene(&mut scene);
        let toast = scene.notification.expect("discovery is announced");
        assert_eq!(toast.message, "Steam!");
        assert_eq!(toast.icon, IconKey::new("steam"));
        assert!(toast.is_on_screen());
    }

    #[test]
    fn cursor_outside_the_window_is_clamped_into_the_play_area() {
        let mut simulation = simulation();
        let inputs = simulation.pointer_inputs(&frame(Vec2::new(900.0, -20.0), true, true));

        assert_eq!(inputs.len(), 3);
        assert!(inputs
            .iter()
            .all(|input| input.position == WorldPoint::new(639.0, 0.0)));

        let repeated = simulation.pointer_inputs(&frame(Vec2::new(900.0, -20.0), false, false));
        assert!(repeated.is_empty(), "unchanged cursor emits no move");
    }
}
