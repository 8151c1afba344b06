//! Canvas interaction and navigation functionality.
//!
//! This module handles panning, scroll and button zooming, label hover and
//! coordinate transformations between screen and world space.

use super::state::WordTreeApp;
use crate::constants::SCROLL_ZOOM_SENSITIVITY;
use crate::view::ZoomAnimation;
use eframe::egui;

impl WordTreeApp {
    /// Screen rectangle of the drawing canvas inside the available area.
    ///
    /// The canvas keeps the size chosen by the view parameters and is
    /// centered in the panel.
    pub fn canvas_frame(&self, available: egui::Rect) -> egui::Rect {
        egui::Rect::from_center_size(available.center(), self.view.params().canvas_size())
    }

    /// Converts screen coordinates to world coordinates accounting for zoom and pan.
    ///
    /// # Arguments
    ///
    /// * `screen_pos` - Position in screen space (pixels)
    ///
    /// # Returns
    ///
    /// The corresponding position in world space
    pub fn screen_to_world(&self, screen_pos: egui::Pos2) -> egui::Pos2 {
        let canvas_pos = (screen_pos - self.canvas.frame_rect.min).to_pos2();
        self.view.transform().invert(canvas_pos)
    }

    /// Converts world coordinates to screen coordinates accounting for zoom and pan.
    pub fn world_to_screen(&self, world_pos: egui::Pos2) -> egui::Pos2 {
        self.canvas.frame_rect.min + self.view.transform().apply(world_pos).to_vec2()
    }

    /// Handles primary or middle button drag panning.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    /// * `response` - The response from the canvas widget
    pub fn handle_canvas_panning(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let should_pan = response.is_pointer_button_down_on()
            && ui.input(|i| i.pointer.primary_down() || i.pointer.middle_down());

        if should_pan {
            if let Some(current_pos) = response.interact_pointer_pos() {
                if !self.canvas.is_panning {
                    self.canvas.is_panning = true;
                    self.canvas.last_pan_pos = Some(current_pos);
                } else if let Some(last_pos) = self.canvas.last_pan_pos {
                    let delta = current_pos - last_pos;
                    if delta != egui::Vec2::ZERO {
                        self.canvas.animation = None;
                        let panned = self.view.transform().translate_by(delta);
                        self.view.set_transform(panned);
                    }
                    self.canvas.last_pan_pos = Some(current_pos);
                }
            }
        } else {
            self.canvas.is_panning = false;
            self.canvas.last_pan_pos = None;
        }
    }

    /// Handles scroll wheel and pinch zooming.
    ///
    /// Zooms while keeping the world position under the cursor fixed. Only
    /// zooms if the cursor is over the canvas.
    pub fn handle_canvas_zoom(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let (scroll_delta, pinch) = ui.input(|i| (i.smooth_scroll_delta.y, i.zoom_delta()));
        let factor = (scroll_delta * SCROLL_ZOOM_SENSITIVITY).exp() * pinch;
        if (factor - 1.0).abs() <= f32::EPSILON {
            return;
        }

        let Some(mouse_pos) = ui
            .input(|i| i.pointer.hover_pos())
            .or_else(|| response.interact_pointer_pos())
        else {
            return;
        };
        if !response.rect.contains(mouse_pos) {
            return;
        }

        self.canvas.animation = None;
        let anchor = (mouse_pos - self.canvas.frame_rect.min).to_pos2();
        let zoomed = self.view.transform().scale_by(factor, anchor);
        self.view.set_transform(zoomed);
    }

    /// Starts an animated zoom around the canvas center.
    ///
    /// # Arguments
    ///
    /// * `factor` - Multiplicative scale step
    /// * `now` - Current time in seconds
    pub fn zoom_by_step(&mut self, factor: f32, now: f64) {
        // Chain from the target of a running animation so repeated clicks accumulate.
        let from = self
            .canvas
            .animation
            .map_or(self.view.transform(), |anim| anim.target());
        let anchor = (self.view.params().canvas_size() / 2.0).to_pos2();
        self.canvas.animation = Some(ZoomAnimation::new(from, factor, anchor, now));
    }

    /// Advances the button zoom animation, if any.
    pub fn advance_zoom_animation(&mut self, ctx: &egui::Context) {
        let Some(animation) = self.canvas.animation else {
            return;
        };
        let (transform, done) = animation.sample(ctx.input(|i| i.time));
        self.view.set_transform(transform);
        if done {
            self.canvas.animation = None;
        } else {
            ctx.request_repaint();
        }
    }

    /// Finds the label under a screen position.
    pub fn find_label_at_position(&self, ctx: &egui::Context, pos: egui::Pos2) -> Option<usize> {
        let scene = self.view.scene()?;
        let world = self.screen_to_world(pos);
        // Topmost label wins, matching paint order.
        scene
            .labels
            .iter()
            .rposition(|label| label.contains(world, text_width(ctx, &label.text, label.font_size)))
    }

    /// Opens or closes the definition tooltip as the pointer moves between labels.
    pub fn update_hover(&mut self, ctx: &egui::Context, hover_pos: Option<egui::Pos2>) {
        let hovered = hover_pos
            .filter(|pos| self.canvas.frame_rect.contains(*pos))
            .and_then(|pos| self.find_label_at_position(ctx, pos));
        if hovered == self.canvas.hovered_label {
            return;
        }
        self.canvas.hovered_label = hovered;
        let Some(scene) = self.view.scene_mut() else {
            return;
        };
        scene.hide_tooltip();
        if let Some(index) = hovered {
            let font_size = scene.labels.get(index).map_or(0.0, |l| l.font_size);
            scene.show_tooltip(index, &|text| text_width(ctx, text, font_size));
        }
    }
}

/// Width of `text` in world units at `font_size`, using egui's font metrics.
pub fn text_width(ctx: &egui::Context, text: &str, font_size: f32) -> f32 {
    ctx.fonts_mut(|f| {
        f.layout_no_wrap(
            text.to_owned(),
            egui::FontId::proportional(font_size),
            egui::Color32::BLACK,
        )
        .size()
        .x
    })
}
