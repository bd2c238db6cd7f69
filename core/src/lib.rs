#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Alchemy crafting engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems and adapters submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots such as [`EntityView`], and respond exclusively
//! with new command batches.

use std::{
    borrow::Borrow,
    f32::consts::{FRAC_PI_2, FRAC_PI_4, TAU},
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// Title used by windows hosting the experience.
pub const WINDOW_TITLE: &str = "Alchemy";

/// Side length of an element icon measured in world units.
///
/// Doubles as the hit radius of a placed entity and as the radius of the ring
/// used when spawning base elements.
pub const ELEMENT_ICON_SIZE: f32 = 64.0;

/// Number of logic ticks an entity needs to fade in after spawning.
pub const ENTITY_FADE_TICKS: u32 = 3;

/// Lifetime of a discovery notification measured in logic ticks.
pub const NOTIFICATION_TICKS: u32 = 60;

/// Ticks spent sliding a notification onto the screen.
pub const NOTIFICATION_SLIDE_IN_TICKS: u32 = 10;

/// Ticks spent sliding a notification off the screen at the end of its life.
pub const NOTIFICATION_SLIDE_OUT_TICKS: u32 = 5;

/// Duration of a single fixed-rate logic tick (20 ticks per second).
pub const TICK_DURATION: Duration = Duration::from_millis(50);

/// Title shown on every discovery notification.
pub const DISCOVERY_TITLE: &str = "New element found!";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances every animation counter by one fixed logic tick.
    Tick,
    /// Marks elements as already learned without announcing them.
    SeedDiscovery {
        /// Elements that should be treated as known from the start.
        elements: Vec<ElementName>,
    },
    /// Places a new entity for the provided element.
    SpawnEntity {
        /// Element instantiated by the new entity.
        element: ElementName,
        /// Position of the entity's centre in world units.
        position: WorldPoint,
        /// Gesture or rule that caused the spawn.
        origin: SpawnOrigin,
    },
    /// Relocates an existing entity.
    MoveEntity {
        /// Entity being moved.
        entity: EntityId,
        /// New centre of the entity in world units.
        position: WorldPoint,
    },
    /// Brings an entity to the top of the draw and hit-test order.
    RaiseEntity {
        /// Entity to raise.
        entity: EntityId,
    },
    /// Deletes an entity from the play area.
    RemoveEntity {
        /// Entity to delete.
        entity: EntityId,
        /// Why the entity is leaving the play area.
        reason: RemovalReason,
    },
    /// Records that the player produced the provided element.
    LearnElement {
        /// Element that was produced.
        element: Element,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the logic clock advanced by one tick.
    TimeAdvanced {
        /// Index of the tick that just completed.
        tick: u64,
    },
    /// Confirms that a new entity was placed.
    EntitySpawned {
        /// Identifier allocated to the entity by the world.
        entity: EntityId,
        /// Element instantiated by the entity.
        element: ElementName,
        /// Centre of the entity in world units.
        position: WorldPoint,
        /// Gesture or rule that caused the spawn.
        origin: SpawnOrigin,
    },
    /// Confirms that an entity moved.
    EntityMoved {
        /// Entity that moved.
        entity: EntityId,
        /// New centre of the entity.
        position: WorldPoint,
    },
    /// Confirms that an entity now sits on top of every other entity.
    EntityRaised {
        /// Entity that was raised.
        entity: EntityId,
    },
    /// Confirms that an entity left the play area.
    EntityRemoved {
        /// Entity that was removed.
        entity: EntityId,
        /// Element the entity instantiated.
        element: ElementName,
        /// Why the entity was removed.
        reason: RemovalReason,
    },
    /// Reports that a command referenced an entity that no longer exists.
    EntityMissing {
        /// Identifier that failed to resolve.
        entity: EntityId,
    },
    /// Announces that an element was learned for the first time.
    ElementLearned {
        /// Element that joined the discovery set.
        element: ElementName,
    },
    /// Reports that a discovery notification joined the queue.
    NotificationQueued {
        /// Element announced by the notification.
        element: ElementName,
    },
    /// Reports that the visible notification expired and left the queue.
    NotificationExpired {
        /// Element announced by the expired notification.
        element: ElementName,
    },
}

/// Gesture or rule responsible for creating an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnOrigin {
    /// Base element placed at startup or by the empty-space gesture.
    Base,
    /// Product of a successful combination.
    Craft,
    /// Copy of an entity created by a double click.
    Clone,
    /// Element dragged out of the discovery inventory.
    Inventory,
}

impl SpawnOrigin {
    /// Reports whether the pointer should grab entities created by this origin.
    #[must_use]
    pub const fn is_held_on_spawn(self) -> bool {
        matches!(self, Self::Clone | Self::Inventory)
    }
}

/// Reasons an entity may leave the play area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalReason {
    /// The entity was used up by a successful combination.
    Consumed,
    /// The player dropped the entity into the trash.
    Discarded,
}

/// Display name of an element; also its stable catalog key.
///
/// Names are reference counted so every entity shares the catalog's string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ElementName(Arc<str>);

impl ElementName {
    /// Creates a new element name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// Borrows the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ElementName {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<String> for ElementName {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<&str> for ElementName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<ElementName> for String {
    fn from(value: ElementName) -> Self {
        value.0.as_ref().to_owned()
    }
}

impl fmt::Debug for ElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for ElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque key identifying an icon texture inside the rendering backend.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct IconKey(Arc<str>);

impl IconKey {
    /// Creates a new icon key.
    #[must_use]
    pub fn new(key: &str) -> Self {
        Self(Arc::from(key))
    }

    /// Borrows the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for IconKey {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<IconKey> for String {
    fn from(value: IconKey) -> Self {
        value.0.as_ref().to_owned()
    }
}

impl fmt::Debug for IconKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for IconKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable definition of a craftable element.
///
/// Equality and hashing only consider the name, which is the catalog key.
#[derive(Clone, Debug)]
pub struct Element {
    name: ElementName,
    icon: IconKey,
    is_base: bool,
}

impl Element {
    /// Creates a new element definition.
    #[must_use]
    pub fn new(name: impl Into<ElementName>, icon: IconKey, is_base: bool) -> Self {
        Self {
            name: name.into(),
            icon,
            is_base,
        }
    }

    /// Display name and catalog key of the element.
    #[must_use]
    pub const fn name(&self) -> &ElementName {
        &self.name
    }

    /// Icon used when presenting the element.
    #[must_use]
    pub const fn icon(&self) -> &IconKey {
        &self.icon
    }

    /// Whether the element is always offered to the player.
    #[must_use]
    pub const fn is_base(&self) -> bool {
        self.is_base
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.name, f)
    }
}

/// Unique identifier assigned to a placed entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Position in the play area measured in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal coordinate, growing to the right.
    pub x: f32,
    /// Vertical coordinate, growing downwards.
    pub y: f32,
}

impl WorldPoint {
    /// Origin of the play area.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Vector from `origin` to this point.
    #[must_use]
    pub fn offset_from(self, origin: WorldPoint) -> Self {
        Self::new(self.x - origin.x, self.y - origin.y)
    }

    /// Point translated by the provided offset.
    #[must_use]
    pub fn translated(self, offset: WorldPoint) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y)
    }

    /// Point halfway between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: WorldPoint) -> Self {
        Self::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Playable rectangle anchored at the world origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayArea {
    width: f32,
    height: f32,
}

impl PlayArea {
    /// Creates a new play area with the provided dimensions.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width of the play area in world units.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Height of the play area in world units.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Centre of the play area.
    #[must_use]
    pub fn center(&self) -> WorldPoint {
        WorldPoint::new(self.width * 0.5, self.height * 0.5)
    }

    /// Reports whether the point lies inside the play area.
    #[must_use]
    pub fn contains(&self, point: WorldPoint) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x < self.width && point.y < self.height
    }

    /// Clamps a point so that [`PlayArea::contains`] accepts it.
    ///
    /// The far edges are exclusive, so points are pulled onto the last whole
    /// unit inside the area.
    #[must_use]
    pub fn clamp(&self, point: WorldPoint) -> WorldPoint {
        WorldPoint::new(
            point.x.clamp(0.0, (self.width - 1.0).max(0.0)),
            point.y.clamp(0.0, (self.height - 1.0).max(0.0)),
        )
    }
}

/// Pointer buttons distinguished by the interaction system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Left mouse button or primary touch.
    Primary,
    /// Right mouse button.
    Secondary,
    /// Middle mouse button.
    Middle,
}

/// Kinds of normalised pointer events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// A button was pressed.
    Down,
    /// A button was released.
    Up,
    /// The pointer moved.
    Move,
}

/// Normalised pointer event handed to the interaction system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
    /// What happened.
    pub kind: PointerKind,
    /// Button involved; move events report the primary button.
    pub button: PointerButton,
    /// Pointer position in world units.
    pub position: WorldPoint,
    /// Host clock reading when the event was observed.
    pub at: Duration,
}

impl PointerInput {
    /// Creates a primary-button press.
    #[must_use]
    pub const fn down(position: WorldPoint, at: Duration) -> Self {
        Self {
            kind: PointerKind::Down,
            button: PointerButton::Primary,
            position,
            at,
        }
    }

    /// Creates a primary-button release.
    #[must_use]
    pub const fn up(position: WorldPoint, at: Duration) -> Self {
        Self {
            kind: PointerKind::Up,
            button: PointerButton::Primary,
            position,
            at,
        }
    }

    /// Creates a pointer movement.
    #[must_use]
    pub const fn moved(position: WorldPoint, at: Duration) -> Self {
        Self {
            kind: PointerKind::Move,
            button: PointerButton::Primary,
            position,
            at,
        }
    }
}

/// Pair of tick counters captured across two consecutive logic updates.
///
/// Rendering interpolates between `previous` and `current` using the fraction
/// of the next tick that already elapsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickProgress {
    /// Counter value before the most recent tick.
    pub previous: u32,
    /// Counter value after the most recent tick.
    pub current: u32,
    /// Value at which the counter stops.
    pub max: u32,
}

impl TickProgress {
    /// Creates a counter that has not advanced yet.
    #[must_use]
    pub const fn start(max: u32) -> Self {
        Self {
            previous: 0,
            current: 0,
            max,
        }
    }

    /// Advances the counter by a tick, saturating at `max`.
    pub fn advance(&mut self) {
        self.previous = self.current;
        if self.current < self.max {
            self.current += 1;
        }
    }

    /// Steps the counter back by a tick, saturating at zero.
    pub fn retreat(&mut self) {
        self.previous = self.current;
        self.current = self.current.saturating_sub(1);
    }

    /// Whether the counter reached its maximum.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.current >= self.max
    }

    /// Interpolated tick count for a render pass `partial_tick` into the next tick.
    #[must_use]
    pub fn interpolated(&self, partial_tick: f32) -> f32 {
        let partial_tick = partial_tick.clamp(0.0, 1.0);
        let previous = self.previous as f32;
        previous + (self.current as f32 - previous) * partial_tick
    }

    /// Interpolated progress in `0.0..=1.0`.
    #[must_use]
    pub fn fraction(&self, partial_tick: f32) -> f32 {
        if self.max == 0 {
            return 1.0;
        }
        (self.interpolated(partial_tick).min(self.max as f32) / self.max as f32).clamp(0.0, 1.0)
    }
}

/// Computes how far a notification slid onto the screen.
///
/// `elapsed` is the interpolated tick count and `max_ticks` the lifetime.
/// Returns `0.0` when fully hidden and `1.0` when fully shown. The value rises
/// with a sine ease during the slide-in, holds, and falls with a cosine ease
/// over the final ticks, reaching zero at `max_ticks`.
#[must_use]
pub fn notification_visibility(elapsed: f32, max_ticks: u32) -> f32 {
    let max = max_ticks as f32;
    if elapsed <= 0.0 || elapsed >= max {
        return 0.0;
    }

    let slide_out_start = max - NOTIFICATION_SLIDE_OUT_TICKS as f32;
    if elapsed >= slide_out_start {
        let fraction = (elapsed - slide_out_start) / NOTIFICATION_SLIDE_OUT_TICKS as f32;
        return (fraction.min(1.0) * FRAC_PI_2).cos().max(0.0);
    }

    let slide_in = NOTIFICATION_SLIDE_IN_TICKS as f32;
    let fraction = elapsed.min(slide_in) / slide_in;
    (fraction * FRAC_PI_2).sin()
}

/// Positions of `count` entities arranged on a ring of radius
/// [`ELEMENT_ICON_SIZE`] around `center`.
///
/// Slot `i` sits at angle `i / count * 2π + π/4` and is placed at
/// `center - (cos, sin) * radius`.
#[must_use]
pub fn ring_positions(center: WorldPoint, count: usize) -> Vec<WorldPoint> {
    (0..count)
        .map(|index| {
            let angle = index as f32 / count as f32 * TAU + FRAC_PI_4;
            WorldPoint::new(
                center.x - angle.cos() * ELEMENT_ICON_SIZE,
                center.y - angle.sin() * ELEMENT_ICON_SIZE,
            )
        })
        .collect()
}

/// Immutable representation of a placed entity used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Identifier allocated by the world.
    pub id: EntityId,
    /// Element instantiated by the entity.
    pub element: ElementName,
    /// Centre of the entity in world units.
    pub position: WorldPoint,
    /// Fade-in animation counter.
    pub fade: TickProgress,
}

impl EntitySnapshot {
    /// Reports whether `point` lies within the entity's hit radius.
    #[must_use]
    pub fn covers(&self, point: WorldPoint) -> bool {
        self.position.distance(point) <= ELEMENT_ICON_SIZE
    }
}

/// Read-only snapshot of every placed entity in draw order.
///
/// The first snapshot is drawn first (bottom); the last one sits on top.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityView {
    snapshots: Vec<EntitySnapshot>,
}

impl EntityView {
    /// Creates a new entity view from snapshots ordered bottom to top.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<EntitySnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over snapshots in draw order (bottom first).
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over snapshots in hit-test order (top first).
    pub fn iter_topmost_first(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter().rev()
    }

    /// Finds the topmost entity covering `point`, skipping `except`.
    #[must_use]
    pub fn topmost_at(
        &self,
        point: WorldPoint,
        except: Option<EntityId>,
    ) -> Option<&EntitySnapshot> {
        self.iter_topmost_first()
            .filter(|snapshot| Some(snapshot.id) != except)
            .find(|snapshot| snapshot.covers(point))
    }

    /// Looks up an entity by identifier.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.id == id)
    }

    /// Number of entities captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the view contains no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of the notification at the head of the queue.
#[derive(Clone, Debug, PartialEq)]
pub struct NotificationSnapshot {
    /// Headline of the notification.
    pub title: String,
    /// Body text of the notification.
    pub message: String,
    /// Element being announced.
    pub element: ElementName,
    /// Icon of the announced element.
    pub icon: IconKey,
    /// Lifetime counter of the notification.
    pub progress: TickProgress,
}

impl NotificationSnapshot {
    /// Visibility of the notification for a render pass `partial_tick` into the next tick.
    #[must_use]
    pub fn visibility(&self, partial_tick: f32) -> f32 {
        notification_visibility(self.progress.interpolated(partial_tick), self.progress.max)
    }
}
