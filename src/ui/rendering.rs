//! Canvas rendering of the scene: links, markers, labels and the tooltip.
//!
//! Everything is drawn from the retained [`Scene`](crate::scene::Scene) through the current zoom
//! transform; nothing here mutates state.

use super::state::WordTreeApp;
use crate::constants::{
    INTERNAL_MARKER_RGB, LEAF_MARKER_RGB, LINK_OPACITY, LINK_RGB, TOOLTIP_FILL_RGB,
    TOOLTIP_INK_RGB, TOOLTIP_OPACITY,
};
use crate::scene::{Label, Scene, TextAnchor};
use eframe::egui;
use eframe::epaint::{CubicBezierShape, StrokeKind, TextShape};

fn rgb(c: [u8; 3]) -> egui::Color32 {
    egui::Color32::from_rgb(c[0], c[1], c[2])
}

fn rgba(c: [u8; 3], opacity: f32) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c[0], c[1], c[2], (opacity * 255.0).round() as u8)
}

impl WordTreeApp {
    /// Renders the scene in layers: links, markers, labels, then the tooltip.
    ///
    /// # Arguments
    ///
    /// * `painter` - The egui painter for drawing operations
    /// * `scene` - Scene to draw
    pub fn render_scene(&self, painter: &egui::Painter, scene: &Scene) {
        let frame_stroke = egui::Stroke::new(1.0, painter.ctx().style().visuals.weak_text_color());
        painter.rect_stroke(self.canvas.frame_rect, 0.0, frame_stroke, StrokeKind::Inside);

        let scale = self.view.transform().scale;
        let link_color = rgba(LINK_RGB, LINK_OPACITY);
        for link in &scene.links {
            let points = [link.from, link.ctrl1, link.ctrl2, link.to].map(|p| self.world_to_screen(p));
            painter.add(CubicBezierShape::from_points_stroke(
                points,
                false,
                egui::Color32::TRANSPARENT,
                egui::Stroke::new(link.stroke_width * scale, link_color),
            ));
        }

        for marker in &scene.markers {
            let color = if marker.internal {
                rgb(INTERNAL_MARKER_RGB)
            } else {
                rgb(LEAF_MARKER_RGB)
            };
            painter.circle_filled(self.world_to_screen(marker.center), marker.radius * scale, color);
        }

        let text_color = painter.ctx().style().visuals.text_color();
        for label in &scene.labels {
            self.draw_label(painter, label, text_color);
        }

        self.draw_tooltip(painter, scene);
    }

    /// Draws one label rotated about its node.
    fn draw_label(&self, painter: &egui::Painter, label: &Label, color: egui::Color32) {
        if label.text.is_empty() {
            return;
        }
        let scale = self.view.transform().scale;
        let galley = painter.layout_no_wrap(
            label.text.clone(),
            egui::FontId::proportional(label.font_size * scale),
            color,
        );
        let size = galley.size();
        let offset = label.offset_x * scale;
        let left = match label.anchor {
            TextAnchor::Start => offset,
            TextAnchor::End => offset - size.x,
        };
        let angle = label.rotation.to_radians();
        let rot = egui::emath::Rot2::from_angle(angle);
        // TextShape rotates around the galley's top-left corner.
        let top_left = self.world_to_screen(label.position) + rot * egui::vec2(left, -size.y / 2.0);
        painter.add(TextShape::new(top_left, galley, color).with_angle(angle));
    }

    /// Draws the definition tooltip, if one is open.
    fn draw_tooltip(&self, painter: &egui::Painter, scene: &Scene) {
        let Some(tooltip) = &scene.tooltip else {
            return;
        };
        let scale = self.view.transform().scale;
        let font_size = scene
            .labels
            .get(tooltip.label)
            .map_or(tooltip.line_height, |l| l.font_size);
        let background = egui::Rect::from_min_max(
            self.world_to_screen(tooltip.background.min),
            self.world_to_screen(tooltip.background.max),
        );
        painter.rect_filled(background, 0.0, rgba(TOOLTIP_FILL_RGB, TOOLTIP_OPACITY));
        painter.rect_stroke(
            background,
            0.0,
            egui::Stroke::new(1.0, rgba(TOOLTIP_INK_RGB, TOOLTIP_OPACITY)),
            StrokeKind::Inside,
        );

        let font = egui::FontId::proportional(font_size * scale);
        let ink = rgba(TOOLTIP_INK_RGB, TOOLTIP_OPACITY);
        for (i, line) in tooltip.lines.iter().enumerate() {
            let baseline = tooltip.origin + egui::vec2(0.0, tooltip.line_height * i as f32);
            painter.text(
                self.world_to_screen(baseline),
                egui::Align2::LEFT_BOTTOM,
                line,
                font.clone(),
                ink,
            );
        }
    }
}
