//! Pure layout helpers for the trash bin and the inventory panel.
//!
//! Both widgets slide in from the right or bottom edge of the play area. The
//! slide offset is `sin(fraction * π/2)` of the widget's tick counter.

use std::f32::consts::FRAC_PI_2;

use alchemy_core::{PlayArea, TickProgress, WorldPoint, ELEMENT_ICON_SIZE};

/// Side length of the trash bin.
pub const TRASH_SIZE: f32 = 128.0;

/// Horizontal inset of the trash bin from the right edge.
pub const TRASH_OFFSET_X: f32 = -8.0;

/// Vertical inset of the trash bin from the bottom edge.
pub const TRASH_OFFSET_Y: f32 = 8.0;

/// Ticks the trash bin needs to slide fully into view.
pub const TRASH_SLIDE_TICKS: u32 = 8;

/// Width of the inventory panel.
pub const INVENTORY_WIDTH: f32 = 256.0;

/// Distance between the top of the play area and the first inventory row.
pub const INVENTORY_TOP: f32 = 32.0;

/// Width of the strip along the right edge that opens the inventory.
pub const INVENTORY_TRIGGER_WIDTH: f32 = 16.0;

/// Ticks the inventory panel needs to slide fully into view.
pub const INVENTORY_SLIDE_TICKS: u32 = 4;

/// Gap kept between an inventory icon and the border of its slot.
pub const INVENTORY_ICON_GAP: f32 = 5.0;

/// Inventory panels with a smaller slide angle are not drawn.
const INVENTORY_HIDDEN_ANGLE: f32 = 0.1;

/// Axis-aligned rectangle in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Top-left corner.
    pub origin: WorldPoint,
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Bounds {
    /// Creates a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(origin: WorldPoint, width: f32, height: f32) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// Reports whether the point lies inside the rectangle.
    ///
    /// The left and top edges are inclusive, the right and bottom exclusive.
    #[must_use]
    pub fn contains(&self, point: WorldPoint) -> bool {
        point.x >= self.origin.x
            && point.x < self.origin.x + self.width
            && point.y >= self.origin.y
            && point.y < self.origin.y + self.height
    }

    /// Centre of the rectangle.
    #[must_use]
    pub fn center(&self) -> WorldPoint {
        WorldPoint::new(
            self.origin.x + self.width * 0.5,
            self.origin.y + self.height * 0.5,
        )
    }
}

/// Eased slide amount in `0.0..=1.0` for a widget counter.
#[must_use]
pub fn slide_amount(progress: &TickProgress, partial_tick: f32) -> f32 {
    (progress.fraction(partial_tick) * FRAC_PI_2).sin()
}

/// Trash bin rectangle for the given slide amount.
#[must_use]
pub fn trash_bounds(play_area: PlayArea, slide: f32) -> Bounds {
    let x = play_area.width() - (TRASH_SIZE + TRASH_OFFSET_X);
    let y = play_area.height() - slide * (TRASH_SIZE + TRASH_OFFSET_Y);
    Bounds::new(WorldPoint::new(x, y), TRASH_SIZE, TRASH_SIZE)
}

/// Trash bin rectangle once fully slid in; drops inside it discard entities.
#[must_use]
pub fn trash_drop_bounds(play_area: PlayArea) -> Bounds {
    trash_bounds(play_area, 1.0)
}

/// Strip along the right edge that opens the inventory when hovered.
#[must_use]
pub fn inventory_trigger_bounds(play_area: PlayArea) -> Bounds {
    Bounds::new(
        WorldPoint::new(play_area.width() - INVENTORY_TRIGGER_WIDTH, 0.0),
        INVENTORY_TRIGGER_WIDTH,
        play_area.height(),
    )
}

/// Area covered by the fully opened inventory panel.
#[must_use]
pub fn inventory_panel_bounds(play_area: PlayArea) -> Bounds {
    Bounds::new(
        WorldPoint::new(play_area.width() - INVENTORY_WIDTH, 0.0),
        INVENTORY_WIDTH,
        play_area.height(),
    )
}

/// Left edge of the inventory panel for the given slide amount.
#[must_use]
pub fn inventory_panel_x(play_area: PlayArea, slide: f32) -> f32 {
    play_area.width() - slide * INVENTORY_WIDTH
}

/// Whether an inventory panel at this slide amount is worth drawing.
#[must_use]
pub fn inventory_visible(slide: f32) -> bool {
    slide.clamp(0.0, 1.0).asin() > INVENTORY_HIDDEN_ANGLE
}

/// Number of inventory slots per row.
#[must_use]
pub fn inventory_columns() -> usize {
    (INVENTORY_WIDTH / ELEMENT_ICON_SIZE) as usize
}

/// Rectangle of the inventory slot at `index` for a panel starting at `panel_x`.
#[must_use]
pub fn inventory_slot_bounds(panel_x: f32, index: usize) -> Bounds {
    let columns = inventory_columns().max(1);
    let column = (index % columns) as f32;
    let row = (index / columns) as f32;
    Bounds::new(
        WorldPoint::new(
            panel_x + column * ELEMENT_ICON_SIZE,
            INVENTORY_TOP + row * ELEMENT_ICON_SIZE,
        ),
        ELEMENT_ICON_SIZE,
        ELEMENT_ICON_SIZE,
    )
}

/// Index of the inventory slot under `point`, if any of `count` slots is hit.
#[must_use]
pub fn inventory_slot_at(panel_x: f32, count: usize, point: WorldPoint) -> Option<usize> {
    (0..count).find(|index| inventory_slot_bounds(panel_x, *index).contains(point))
}
