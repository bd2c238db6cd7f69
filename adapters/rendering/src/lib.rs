#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Alchemy adapters.

use alchemy_core::{IconKey, ELEMENT_ICON_SIZE};
use anyhow::Result as AnyResult;
use glam::Vec2;
use std::{error::Error, fmt, time::Duration};

/// Width of a discovery notification.
pub const NOTIFICATION_WIDTH: f32 = 256.0;

/// Height of a discovery notification.
pub const NOTIFICATION_HEIGHT: f32 = 64.0;

/// Side length of the icon drawn inside a notification.
pub const NOTIFICATION_ICON_SIZE: f32 = 49.0;

/// Background texture drawn behind notifications.
pub const NOTIFICATION_BACKGROUND: &str = "toast";

/// Texture of the trash bin while its lid is closed.
pub const TRASH_CLOSED_ICON: &str = "trash_closed";

/// Texture of the trash bin while its lid is open.
pub const TRASH_OPEN_ICON: &str = "trash_open";

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Returns the same color with the alpha channel scaled by `opacity`.
    #[must_use]
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            alpha: self.alpha * opacity.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Cursor position expressed in world units; may lie outside the play area.
    pub cursor_world_space: Option<Vec2>,
    /// Whether the primary button went down on this frame.
    pub primary_pressed: bool,
    /// Whether the primary button went up on this frame.
    pub primary_released: bool,
}

/// Placed element drawn as an icon with its name underneath.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityPresentation {
    /// Icon texture to draw.
    pub icon: IconKey,
    /// Element name drawn below the icon.
    pub label: String,
    /// Centre of the icon in world units.
    pub center: Vec2,
    /// Opacity of the icon in the range 0.0..=1.0.
    pub opacity: f32,
}

impl EntityPresentation {
    /// Vertical distance between the icon centre and the label centre.
    pub const LABEL_OFFSET: f32 = ELEMENT_ICON_SIZE / 1.5 + 5.0;

    /// Creates a new entity descriptor.
    #[must_use]
    pub fn new(icon: IconKey, label: impl Into<String>, center: Vec2, opacity: f32) -> Self {
        Self {
            icon,
            label: label.into(),
            center,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    /// Side length of the drawn icon.
    #[must_use]
    pub const fn size(&self) -> f32 {
        ELEMENT_ICON_SIZE
    }

    /// Centre of the label drawn below the icon.
    #[must_use]
    pub fn label_center(&self) -> Vec2 {
        self.center + Vec2::new(0.0, Self::LABEL_OFFSET)
    }
}

/// Discovery notification sliding down from the top edge.
#[derive(Clone, Debug, PartialEq)]
pub struct NotificationPresentation {
    /// Headline drawn in the accent color.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Icon of the announced element.
    pub icon: IconKey,
    /// Centre of the notification box in world units.
    pub center: Vec2,
}

impl NotificationPresentation {
    /// Places a notification for a play area `width` wide.
    ///
    /// A `visibility` of zero parks the box just above the top edge; one
    /// shows it fully below the top edge.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        icon: IconKey,
        width: f32,
        visibility: f32,
    ) -> Self {
        let half_height = NOTIFICATION_HEIGHT * 0.5;
        let center = Vec2::new(
            width * 0.5,
            -half_height + NOTIFICATION_HEIGHT * visibility.clamp(0.0, 1.0),
        );
        Self {
            title: title.into(),
            message: message.into(),
            icon,
            center,
        }
    }

    /// Size of the notification box.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        Vec2::new(NOTIFICATION_WIDTH, NOTIFICATION_HEIGHT)
    }

    /// Centre of the element icon inside the box.
    #[must_use]
    pub fn icon_center(&self) -> Vec2 {
        self.center + Vec2::new(-96.5, 0.0)
    }

    /// Top-left corner of the title text.
    #[must_use]
    pub fn title_origin(&self) -> Vec2 {
        self.center + Vec2::new(-60.0, -25.0)
    }

    /// Top-left corner of the message text.
    #[must_use]
    pub fn message_origin(&self) -> Vec2 {
        self.center + Vec2::new(-60.0, -4.0)
    }

    /// Whether any part of the box lies below the top edge.
    #[must_use]
    pub fn is_on_screen(&self) -> bool {
        self.center.y + NOTIFICATION_HEIGHT * 0.5 > 0.0
    }
}

/// Trash bin drawn in the bottom-right corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrashPresentation {
    /// Top-left corner of the bin.
    pub origin: Vec2,
    /// Side length of the bin.
    pub size: f32,
    /// Whether the open-lid texture should be used.
    pub lid_open: bool,
}

impl TrashPresentation {
    /// Texture to draw for the current lid state.
    #[must_use]
    pub const fn icon_name(&self) -> &'static str {
        if self.lid_open {
            TRASH_OPEN_ICON
        } else {
            TRASH_CLOSED_ICON
        }
    }
}

/// Single inventory slot.
#[derive(Clone, Debug, PartialEq)]
pub struct InventorySlotPresentation {
    /// Icon of the learned element.
    pub icon: IconKey,
    /// Top-left corner of the slot.
    pub origin: Vec2,
    /// Side length of the slot.
    pub size: f32,
}

/// Panel listing learned elements along the right edge.
#[derive(Clone, Debug, PartialEq)]
pub struct InventoryPresentation {
    /// Top-left corner of the panel.
    pub origin: Vec2,
    /// Size of the panel.
    pub size: Vec2,
    /// Slots in learn order.
    pub slots: Vec<InventorySlotPresentation>,
    /// Gap between a slot border and its icon.
    pub icon_gap: f32,
}

/// Backend-agnostic description of everything drawn in a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Size of the play area in world units.
    pub play_area: Vec2,
    /// Placed entities in draw order (bottom first).
    pub entities: Vec<EntityPresentation>,
    /// Notification at the head of the queue.
    pub notification: Option<NotificationPresentation>,
    /// Trash bin, present once the simulation populated the scene.
    pub trash: Option<TrashPresentation>,
    /// Inventory panel while it is at least partially open.
    pub inventory: Option<InventoryPresentation>,
}

impl Scene {
    /// Creates an empty scene for a play area of the given size.
    #[must_use]
    pub fn new(play_area: Vec2) -> Self {
        Self {
            play_area,
            entities: Vec::new(),
            notification: None,
            trash: None,
            inventory: None,
        }
    }

    /// Icon keys referenced by the scene, including widget textures.
    pub fn icon_keys(&self) -> impl Iterator<Item = &str> {
        let entities = self.entities.iter().map(|entity| entity.icon.as_str());
        let notification = self
            .notification
            .iter()
            .flat_map(|toast| [NOTIFICATION_BACKGROUND, toast.icon.as_str()]);
        let trash = self.trash.iter().map(|bin| bin.icon_name());
        let inventory = self
            .inventory
            .iter()
            .flat_map(|panel| panel.slots.iter().map(|slot| slot.icon.as_str()));
        entities.chain(notification).chain(trash).chain(inventory)
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Alchemy scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// per-frame input captured by the adapter, and repopulates the scene
    /// before it is rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur while resolving rendering resources.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// No texture exists for the icon key.
    MissingIconAsset {
        /// Key that failed to resolve.
        key: String,
    },
    /// The icon file exists but does not hold a usable image.
    InvalidIconAsset {
        /// Key whose file failed to decode.
        key: String,
        /// Decoder message.
        reason: String,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingIconAsset { key } => {
                write!(f, "no icon asset found for `{key}`")
            }
            Self::InvalidIconAsset { key, reason } => {
                write!(f, "icon asset for `{key}` could not be decoded: {reason}")
            }
        }
    }
}

impl Error for RenderingError {}
