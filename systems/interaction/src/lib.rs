#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure interaction system translating pointer input into crafting commands.
//!
//! The system owns the pick-up/drag/drop state machine together with the
//! trash bin and inventory widgets. It never mutates the world directly:
//! every decision is expressed as a [`Command`] and the outcome is observed
//! through the [`Event`] stream on the next call to [`Interaction::handle`].

pub mod layout;

use std::time::Duration;

use alchemy_catalog::Registry;
use alchemy_core::{
    ring_positions, Command, ElementName, EntityId, EntitySnapshot, EntityView, Event,
    PlayArea, PointerButton, PointerInput, PointerKind, RemovalReason, SpawnOrigin,
    TickProgress, WorldPoint, ELEMENT_ICON_SIZE,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use self::layout::{
    inventory_panel_bounds, inventory_panel_x, inventory_slot_at, inventory_slot_bounds,
    inventory_trigger_bounds, inventory_visible, slide_amount, trash_bounds, trash_drop_bounds,
    Bounds, INVENTORY_SLIDE_TICKS, TRASH_SLIDE_TICKS,
};

/// Default window within which a second press counts as a double click.
pub const DEFAULT_DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(250);

/// Tunables for the interaction system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionConfig {
    /// Bounds outside of which pointer events are ignored.
    pub play_area: PlayArea,
    /// Maximum delay between two presses forming a double click.
    pub double_click_window: Duration,
    /// Seed for the craft position jitter.
    pub rng_seed: u64,
}

impl InteractionConfig {
    /// Creates a configuration with explicit field values.
    #[must_use]
    pub const fn new(play_area: PlayArea, double_click_window: Duration, rng_seed: u64) -> Self {
        Self {
            play_area,
            double_click_window,
            rng_seed,
        }
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self::new(PlayArea::new(640.0, 480.0), DEFAULT_DOUBLE_CLICK_WINDOW, 0)
    }
}

/// Relationship between the pointer and the entities it manipulates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HoldState {
    /// Nothing is attached to the pointer.
    Idle,
    /// An entity follows the pointer.
    Holding {
        /// Entity attached to the pointer.
        entity: EntityId,
        /// Offset from the pointer to the entity centre.
        grab_offset: WorldPoint,
    },
    /// A spawn was requested and the resulting entity will be held.
    AwaitingSpawn {
        /// Offset applied once the entity exists.
        grab_offset: WorldPoint,
    },
}

/// Presentation-ready state of the trash bin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrashView {
    /// Current rectangle of the bin.
    pub bounds: Bounds,
    /// Whether the lid is open because a held entity hovers the bin.
    pub lid_open: bool,
}

/// Presentation-ready state of the inventory panel.
#[derive(Clone, Debug, PartialEq)]
pub struct InventoryView {
    /// Current rectangle of the panel.
    pub panel: Bounds,
    /// Learned elements with the rectangle of their slot.
    pub slots: Vec<(ElementName, Bounds)>,
}

/// Interaction system that converts pointer input into world commands.
#[derive(Debug)]
pub struct Interaction {
    config: InteractionConfig,
    rng: ChaCha8Rng,
    state: HoldState,
    clicks: u32,
    last_press_at: Option<Duration>,
    last_clicked: Option<EntityId>,
    pointer: Option<WorldPoint>,
    trash: TickProgress,
    inventory: TickProgress,
    inventory_open: bool,
    dragged: bool,
}

impl Interaction {
    /// Creates a new interaction system.
    #[must_use]
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            state: HoldState::Idle,
            clicks: 0,
            last_press_at: None,
            last_clicked: None,
            pointer: None,
            trash: TickProgress::start(TRASH_SLIDE_TICKS),
            inventory: TickProgress::start(INVENTORY_SLIDE_TICKS),
            inventory_open: false,
            dragged: false,
        }
    }

    /// Current hold state.
    #[must_use]
    pub const fn state(&self) -> HoldState {
        self.state
    }

    /// Entity currently attached to the pointer, if any.
    #[must_use]
    pub const fn held_entity(&self) -> Option<EntityId> {
        match self.state {
            HoldState::Holding { entity, .. } => Some(entity),
            HoldState::Idle | HoldState::AwaitingSpawn { .. } => None,
        }
    }

    /// Whether the inventory panel is requested open.
    #[must_use]
    pub const fn inventory_open(&self) -> bool {
        self.inventory_open
    }

    /// Consumes world events and at most one pointer input to emit commands.
    ///
    /// `entities` must reflect every command emitted by earlier calls, and
    /// `learned` lists the discovered elements in inventory order.
    pub fn handle(
        &mut self,
        events: &[Event],
        input: Option<PointerInput>,
        entities: &EntityView,
        registry: &Registry,
        learned: &[ElementName],
        out: &mut Vec<Command>,
    ) {
        for event in events {
            self.observe(event);
        }

        let Some(input) = input else {
            return;
        };
        if input.button != PointerButton::Primary
            || !self.config.play_area.contains(input.position)
        {
            return;
        }

        match input.kind {
            PointerKind::Move => self.pointer_moved(input.position, out),
            PointerKind::Down => self.pointer_down(input, entities, registry, learned, out),
            PointerKind::Up => self.pointer_up(input.position, entities, registry, out),
        }
    }

    /// Trash bin state for a render pass `partial_tick` into the next tick.
    #[must_use]
    pub fn trash_view(&self, partial_tick: f32) -> TrashView {
        let bounds = trash_bounds(self.config.play_area, slide_amount(&self.trash, partial_tick));
        let holding = self.held_entity().is_some();
        TrashView {
            bounds,
            lid_open: holding && self.pointer.is_some_and(|pointer| bounds.contains(pointer)),
        }
    }

    /// Inventory panel state, or `None` while the panel is tucked away.
    #[must_use]
    pub fn inventory_view(
        &self,
        learned: &[ElementName],
        partial_tick: f32,
    ) -> Option<InventoryView> {
        let slide = slide_amount(&self.inventory, partial_tick);
        if !inventory_visible(slide) {
            return None;
        }

        let play_area = self.config.play_area;
        let panel_x = inventory_panel_x(play_area, slide);
        let slots = learned
            .iter()
            .enumerate()
            .map(|(index, element)| (element.clone(), inventory_slot_bounds(panel_x, index)))
            .collect();
        Some(InventoryView {
            panel: Bounds::new(
                WorldPoint::new(panel_x, 0.0),
                layout::INVENTORY_WIDTH,
                play_area.height(),
            ),
            slots,
        })
    }

    fn observe(&mut self, event: &Event) {
        match event {
            Event::TimeAdvanced { .. } => {
                if self.held_entity().is_some() {
                    self.trash.advance();
                } else {
                    self.trash.retreat();
                }
                if self.inventory_open {
                    self.inventory.advance();
                } else {
                    self.inventory.retreat();
                }
            }
            Event::EntitySpawned { entity, origin, .. } if origin.is_held_on_spawn() => {
                if let HoldState::AwaitingSpawn { grab_offset } = self.state {
                    trace!(entity = entity.get(), "holding freshly spawned entity");
                    self.dragged = false;
                    self.state = HoldState::Holding {
                        entity: *entity,
                        grab_offset,
                    };
                }
            }
            Event::EntityRemoved { entity, .. } | Event::EntityMissing { entity } => {
                if self.held_entity() == Some(*entity) {
                    self.state = HoldState::Idle;
                }
            }
            _ => {}
        }
    }

    fn pointer_moved(&mut self, position: WorldPoint, out: &mut Vec<Command>) {
        self.pointer = Some(position);

        let play_area = self.config.play_area;
        let over_trigger = inventory_trigger_bounds(play_area).contains(position);
        let over_panel = inventory_panel_bounds(play_area).contains(position);
        self.inventory_open = self.state == HoldState::Idle
            && (over_trigger || (self.inventory_open && over_panel));

        if let HoldState::Holding {
            entity,
            grab_offset,
        } = self.state
        {
            self.dragged = true;
            out.push(Command::MoveEntity {
                entity,
                position: position.translated(grab_offset),
            });
        }
    }

    fn pointer_down(
        &mut self,
        input: PointerInput,
        entities: &EntityView,
        registry: &Registry,
        learned: &[ElementName],
        out: &mut Vec<Command>,
    ) {
        if self.state != HoldState::Idle {
            return;
        }
        let position = input.position;
        self.pointer = Some(position);

        if self.inventory_open && inventory_panel_bounds(self.config.play_area).contains(position) {
            self.pick_from_inventory(position, learned, out);
            return;
        }

        if self.within_double_click(input.at) {
            self.clicks = 0;
            self.last_press_at = None;
            let top = entities.topmost_at(position, None);

            match (top, self.last_clicked) {
                (Some(entity), Some(last)) if entity.id == last => {
                    debug!(entity = last.get(), element = %entity.element, "cloning entity");
                    out.push(Command::SpawnEntity {
                        element: entity.element.clone(),
                        position,
                        origin: SpawnOrigin::Clone,
                    });
                    self.state = HoldState::AwaitingSpawn {
                        grab_offset: WorldPoint::ZERO,
                    };
                }
                (None, None) => {
                    let base = registry.base_elements();
                    debug!(count = base.len(), "spawning base elements");
                    let ring = ring_positions(position, base.len());
                    for (element, spawn_at) in base.into_iter().zip(ring) {
                        out.push(Command::SpawnEntity {
                            element: element.name().clone(),
                            position: spawn_at,
                            origin: SpawnOrigin::Base,
                        });
                    }
                }
                _ => trace!("second press matched nothing"),
            }
            return;
        }

        self.clicks += 1;
        self.last_press_at = Some(input.at);

        match entities.topmost_at(position, None) {
            Some(top) => {
                self.grab(top, position, out);
                self.last_clicked = Some(top.id);
            }
            None => self.last_clicked = None,
        }
    }

    fn pointer_up(
        &mut self,
        position: WorldPoint,
        entities: &EntityView,
        registry: &Registry,
        out: &mut Vec<Command>,
    ) {
        let state = std::mem::replace(&mut self.state, HoldState::Idle);
        let dragged = std::mem::take(&mut self.dragged);
        let HoldState::Holding { entity, .. } = state else {
            return;
        };
        let Some(held) = entities.get(entity) else {
            return;
        };

        let partner = entities
            .topmost_at(held.position, Some(entity))
            .map(|other| (other, registry.products_of(&held.element, &other.element)))
            .filter(|(_, products)| !products.is_empty());
        let Some((other, products)) = partner else {
            if dragged && self.trash.is_complete() && self.trash_accepts(position) {
                debug!(
                    entity = entity.get(),
                    element = %held.element,
                    "dropping entity into trash"
                );
                out.push(Command::RemoveEntity {
                    entity,
                    reason: RemovalReason::Discarded,
                });
            } else {
                trace!(element = %held.element, "dropped without reaction");
            }
            return;
        };

        debug!(
            first = %held.element,
            second = %other.element,
            products = products.len(),
            "combining entities"
        );
        out.push(Command::RemoveEntity {
            entity: held.id,
            reason: RemovalReason::Consumed,
        });
        out.push(Command::RemoveEntity {
            entity: other.id,
            reason: RemovalReason::Consumed,
        });

        let midpoint = held.position.midpoint(other.position);
        for product in products {
            let jitter = WorldPoint::new(self.jitter(), self.jitter());
            out.push(Command::LearnElement {
                element: product.clone(),
            });
            out.push(Command::SpawnEntity {
                element: product.name().clone(),
                position: midpoint.translated(jitter),
                origin: SpawnOrigin::Craft,
            });
        }
    }

    fn pick_from_inventory(
        &mut self,
        position: WorldPoint,
        learned: &[ElementName],
        out: &mut Vec<Command>,
    ) {
        let slide = slide_amount(&self.inventory, 1.0);
        let panel_x = inventory_panel_x(self.config.play_area, slide);
        let Some(element) = inventory_slot_at(panel_x, learned.len(), position)
            .and_then(|index| learned.get(index))
        else {
            return;
        };

        debug!(%element, "taking element from inventory");
        out.push(Command::SpawnEntity {
            element: element.clone(),
            position,
            origin: SpawnOrigin::Inventory,
        });
        self.inventory_open = false;
        self.state = HoldState::AwaitingSpawn {
            grab_offset: WorldPoint::ZERO,
        };
    }

    fn trash_accepts(&self, position: WorldPoint) -> bool {
        trash_drop_bounds(self.config.play_area).contains(position)
    }

    fn grab(&mut self, top: &EntitySnapshot, position: WorldPoint, out: &mut Vec<Command>) {
        out.push(Command::RaiseEntity { entity: top.id });
        self.dragged = false;
        self.state = HoldState::Holding {
            entity: top.id,
            grab_offset: top.position.offset_from(position),
        };
    }

    fn within_double_click(&self, at: Duration) -> bool {
        self.clicks >= 1
            && self.last_press_at.is_some_and(|pressed| {
                at.saturating_sub(pressed) <= self.config.double_click_window
            })
    }

    fn jitter(&mut self) -> f32 {
        let max = ELEMENT_ICON_SIZE / 2.0;
        max - self.rng.gen::<f32>() * max * 2.0
    }
}
