#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Alchemy.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The window is sized to the scene's play area. When the window is resized
//! the play area is scaled uniformly and letterboxed, and cursor positions are
//! mapped back into world units before they reach the simulation.

mod icons;

use alchemy_rendering::{
    Color, EntityPresentation, FrameInput, InventoryPresentation, NotificationPresentation,
    Presentation, RenderingBackend, Scene, TrashPresentation, NOTIFICATION_BACKGROUND,
    NOTIFICATION_ICON_SIZE,
};
use anyhow::{Context, Result};
use glam::Vec2;
use macroquad::math::Vec2 as MacroquadVec2;
use macroquad::{
    input::{
        is_key_pressed, is_mouse_button_pressed, is_mouse_button_released, mouse_position,
        KeyCode, MouseButton,
    },
    texture::{draw_texture_ex, DrawTextureParams, Texture2D},
};
use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::mpsc,
    time::{Duration, Instant},
};
use tracing::info;

use self::icons::IconCache;

/// Directory searched for icon textures when none is configured.
pub const DEFAULT_ICON_DIRECTORY: &str = "assets/textures";

const FONT_SIZE: f32 = 20.0;
const NOTIFICATION_FONT_SCALE: f32 = 0.9;
const TEXT_SHADOW_OFFSET: f32 = 1.0;
const ICON_SHADOW_OFFSET: f32 = 2.0;
const INVENTORY_HEADING: &str = "DISCOVERED";
const TITLE_COLOR: Color = Color::new(0.0, 0.65, 1.0, 1.0);
const TEXT_COLOR: Color = Color::new(1.0, 1.0, 1.0, 1.0);
const SHADOW_COLOR: Color = Color::new(0.0, 0.0, 0.0, 1.0);
const INVENTORY_FILL: Color = Color::new(0.0, 0.75, 1.0, 0.15);
const INVENTORY_BORDER: Color = Color::new(0.0, 0.75, 1.0, 0.5);

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    icon_directory: PathBuf,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            show_fps: false,
            icon_directory: PathBuf::from(DEFAULT_ICON_DIRECTORY),
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    /// Configures the directory icon textures are loaded from.
    #[must_use]
    pub fn with_icon_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.icon_directory = directory.into();
        self
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct FrameBreakdown {
    frame: Duration,
    simulation: Duration,
    render: Duration,
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
    simulation_accum: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_simulation: Duration,
    avg_render: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, breakdown: FrameBreakdown) -> Option<FpsMetrics> {
        self.elapsed += breakdown.frame;
        self.frames = self.frames.saturating_add(1);
        self.simulation_accum += breakdown.simulation;
        self.render_accum += breakdown.render;

        self.frame_times.push_back(breakdown.frame);
        self.window_duration += breakdown.frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            if let Some(removed) = self.frame_times.pop_front() {
                self.window_duration = self.window_duration.saturating_sub(removed);
            } else {
                break;
            }
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let frames = self.frames.max(1);
        let per_second = self.frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        let metrics = FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_simulation: self.simulation_accum / frames,
            avg_render: self.render_accum / frames,
        };

        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.simulation_accum = Duration::ZERO;
        self.render_accum = Duration::ZERO;
        Some(metrics)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            icon_directory,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: scene.play_area.x.round().max(1.0) as i32,
            window_height: scene.play_area.y.round().max(1.0) as i32,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        let (init_sender, init_receiver) = mpsc::channel::<Result<()>>();

        macroquad::Window::from_config(config, async move {
            let mut init_sender = Some(init_sender);
            let mut scene = scene;

            let placeholder = IconCache::placeholder_texture();
            let mut icons = match IconCache::open(&icon_directory, placeholder)
                .context("failed to initialise icon cache")
            {
                Ok(icons) => icons,
                Err(error) => {
                    if let Some(sender) = init_sender.take() {
                        let _ = sender.send(Err(error));
                    }
                    return;
                }
            };

            for key in scene.icon_keys() {
                let _ = icons.resolve(key);
            }

            if let Some(sender) = init_sender.take() {
                let _ = sender.send(Ok(()));
            }

            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();

            loop {
                if is_key_pressed(KeyCode::Escape) {
                    break;
                }

                macroquad::window::clear_background(background);

                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();
                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));

                let metrics_before = ViewMetrics::from_scene(&scene, screen_width, screen_height);
                let frame_input = gather_frame_input(&metrics_before);

                let simulation_start = Instant::now();
                update_scene(frame_dt, frame_input, &mut scene);
                let simulation_duration = simulation_start.elapsed();

                let metrics = ViewMetrics::from_scene(&scene, screen_width, screen_height);
                let render_start = Instant::now();
                if let Some(trash) = scene.trash {
                    draw_trash(&trash, &metrics, &mut icons);
                }
                draw_entities(&scene.entities, &metrics, &mut icons);
                if let Some(inventory) = &scene.inventory {
                    draw_inventory(inventory, &metrics, &mut icons);
                }
                if let Some(notification) = &scene.notification {
                    draw_notification(notification, &metrics, &mut icons);
                }
                let render_duration = render_start.elapsed();

                let fps_metrics = fps_counter.record_frame(FrameBreakdown {
                    frame: frame_dt,
                    simulation: simulation_duration,
                    render: render_duration,
                });
                if show_fps {
                    if let Some(FpsMetrics {
                        per_second,
                        trailing_ten_seconds,
                        avg_simulation,
                        avg_render,
                    }) = fps_metrics
                    {
                        info!(
                            fps = per_second,
                            fps_10s = trailing_ten_seconds,
                            simulation_ms = avg_simulation.as_secs_f64() * 1_000.0,
                            render_ms = avg_render.as_secs_f64() * 1_000.0,
                            "frame timing"
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        init_receiver.recv().unwrap_or_else(|_| Ok(()))?;

        Ok(())
    }
}

/// Uniform scale and letterbox offsets mapping world units onto the window.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ViewMetrics {
    scale: f32,
    offset: Vec2,
}

impl ViewMetrics {
    fn from_scene(scene: &Scene, screen_width: f32, screen_height: f32) -> Self {
        let world = scene.play_area;
        if world.x <= f32::EPSILON || world.y <= f32::EPSILON {
            return Self {
                scale: 1.0,
                offset: Vec2::ZERO,
            };
        }

        let scale = (screen_width / world.x).min(screen_height / world.y).max(0.0);
        let offset = Vec2::new(
            ((screen_width - world.x * scale) * 0.5).max(0.0),
            ((screen_height - world.y * scale) * 0.5).max(0.0),
        );
        Self { scale, offset }
    }

    fn to_screen(&self, world: Vec2) -> Vec2 {
        self.offset + world * self.scale
    }

    fn to_world(&self, screen: Vec2) -> Option<Vec2> {
        if self.scale <= f32::EPSILON {
            return None;
        }
        Some((screen - self.offset) / self.scale)
    }
}

fn gather_frame_input(metrics: &ViewMetrics) -> FrameInput {
    let (cursor_x, cursor_y) = mouse_position();
    frame_input_from_observations(
        metrics,
        Vec2::new(cursor_x, cursor_y),
        is_mouse_button_pressed(MouseButton::Left),
        is_mouse_button_released(MouseButton::Left),
    )
}

fn frame_input_from_observations(
    metrics: &ViewMetrics,
    cursor: Vec2,
    primary_pressed: bool,
    primary_released: bool,
) -> FrameInput {
    FrameInput {
        cursor_world_space: metrics.to_world(cursor),
        primary_pressed,
        primary_released,
    }
}

fn draw_entities(entities: &[EntityPresentation], metrics: &ViewMetrics, icons: &mut IconCache) {
    for entity in entities {
        let texture = icons.resolve(entity.icon.as_str());
        draw_icon_centered(
            texture,
            metrics.to_screen(entity.center),
            entity.size() * metrics.scale,
            TEXT_COLOR.with_opacity(entity.opacity),
        );
        draw_text_centered(
            &entity.label,
            metrics.to_screen(entity.label_center()),
            FONT_SIZE * metrics.scale,
            TEXT_COLOR,
        );
    }
}

fn draw_trash(trash: &TrashPresentation, metrics: &ViewMetrics, icons: &mut IconCache) {
    let texture = icons.resolve(trash.icon_name());
    let origin = metrics.to_screen(trash.origin);
    let size = trash.size * metrics.scale;
    draw_texture_ex(
        texture,
        origin.x,
        origin.y,
        to_macroquad_color(TEXT_COLOR),
        DrawTextureParams {
            dest_size: Some(MacroquadVec2::new(size, size)),
            ..DrawTextureParams::default()
        },
    );
}

fn draw_inventory(inventory: &InventoryPresentation, metrics: &ViewMetrics, icons: &mut IconCache) {
    let origin = metrics.to_screen(inventory.origin);
    let size = inventory.size * metrics.scale;
    macroquad::shapes::draw_rectangle(
        origin.x,
        origin.y,
        size.x,
        size.y,
        to_macroquad_color(INVENTORY_FILL),
    );
    macroquad::shapes::draw_rectangle_lines(
        origin.x,
        origin.y,
        size.x,
        size.y,
        1.0,
        to_macroquad_color(INVENTORY_BORDER),
    );

    for slot in &inventory.slots {
        let texture = icons.resolve(slot.icon.as_str());
        let center = slot.origin + Vec2::splat(slot.size * 0.5);
        let icon_size = (slot.size - inventory.icon_gap * 2.0).max(0.0) * metrics.scale;
        draw_icon_centered(
            texture,
            metrics.to_screen(center + Vec2::splat(ICON_SHADOW_OFFSET)),
            icon_size,
            SHADOW_COLOR,
        );
        draw_icon_centered(texture, metrics.to_screen(center), icon_size, TEXT_COLOR);
    }

    let heading = inventory.origin + Vec2::new(inventory.size.x * 0.5, 16.0);
    draw_text_centered(
        INVENTORY_HEADING,
        metrics.to_screen(heading),
        FONT_SIZE * metrics.scale,
        TEXT_COLOR,
    );
}

fn draw_notification(
    notification: &NotificationPresentation,
    metrics: &ViewMetrics,
    icons: &mut IconCache,
) {
    if !notification.is_on_screen() {
        return;
    }

    let background = icons.resolve(NOTIFICATION_BACKGROUND);
    let size = notification.size() * metrics.scale;
    let center = metrics.to_screen(notification.center);
    draw_texture_ex(
        background,
        center.x - size.x * 0.5,
        center.y - size.y * 0.5,
        to_macroquad_color(TEXT_COLOR),
        DrawTextureParams {
            dest_size: Some(MacroquadVec2::new(size.x, size.y)),
            ..DrawTextureParams::default()
        },
    );

    let icon = icons.resolve(notification.icon.as_str());
    let icon_size = NOTIFICATION_ICON_SIZE * metrics.scale;
    draw_icon_centered(
        icon,
        metrics.to_screen(notification.icon_center() + Vec2::splat(ICON_SHADOW_OFFSET)),
        icon_size,
        SHADOW_COLOR,
    );
    draw_icon_centered(
        icon,
        metrics.to_screen(notification.icon_center()),
        icon_size,
        TEXT_COLOR,
    );

    let font_size = FONT_SIZE * NOTIFICATION_FONT_SCALE * metrics.scale;
    draw_text_with_shadow(
        &notification.title,
        metrics.to_screen(notification.title_origin()),
        font_size,
        TITLE_COLOR,
    );
    draw_text_with_shadow(
        &notification.message,
        metrics.to_screen(notification.message_origin()),
        font_size,
        TEXT_COLOR,
    );
}

fn draw_icon_centered(texture: Texture2D, center: Vec2, size: f32, tint: Color) {
    draw_texture_ex(
        texture,
        center.x - size * 0.5,
        center.y - size * 0.5,
        to_macroquad_color(tint),
        DrawTextureParams {
            dest_size: Some(MacroquadVec2::new(size, size)),
            ..DrawTextureParams::default()
        },
    );
}

/// Draws text whose top-left corner sits at `origin`.
fn draw_text_with_shadow(text: &str, origin: Vec2, font_size: f32, color: Color) {
    let dimensions = macroquad::text::measure_text(text, None, font_size.round() as u16, 1.0);
    let baseline = origin.y + dimensions.offset_y;
    macroquad::text::draw_text(
        text,
        origin.x + TEXT_SHADOW_OFFSET,
        baseline + TEXT_SHADOW_OFFSET,
        font_size,
        to_macroquad_color(SHADOW_COLOR.with_opacity(color.alpha)),
    );
    macroquad::text::draw_text(text, origin.x, baseline, font_size, to_macroquad_color(color));
}

fn draw_text_centered(text: &str, center: Vec2, font_size: f32, color: Color) {
    let dimensions = macroquad::text::measure_text(text, None, font_size.round() as u16, 1.0);
    let origin = Vec2::new(
        center.x - dimensions.width * 0.5,
        center.y - dimensions.height * 0.5,
    );
    draw_text_with_shadow(text, origin, font_size, color);
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
