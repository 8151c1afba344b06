//! User interface components and rendering logic for the word tree viewer.
//!
//! This module contains the main application struct, the toolbar with the
//! search form, the slider panel and the tree canvas.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main WordTreeApp
//! - `query_ops` - Dataset lookups, caching and startup restore
//! - `canvas` - Canvas navigation, zooming, panning and hover
//! - `rendering` - Drawing links, markers, labels and the tooltip
//! - `export` - Image and SVG export actions

mod canvas;
mod export;
mod query_ops;
mod rendering;
mod state;

pub use state::WordTreeApp;

use crate::constants::{
    ANGLE_PER_STEP, CACHE_KEY_APP_STATE, CANVAS_PER_STEP, RADIUS_PER_STEP, ZOOM_IN_STEP,
    ZOOM_OUT_STEP,
};
use crate::lexicon::Lexicon;
use crate::types::LabelMode;
use crate::view::ViewParams;
use eframe::egui;
use state::ExportRequest;

impl eframe::App for WordTreeApp {
    /// Persist UI settings between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.params = self.view.params();
        match self.to_json() {
            Ok(json) => storage.set_string(CACHE_KEY_APP_STATE, json),
            Err(err) => log::error!("failed to serialize app state: {err}"),
        }
    }

    /// Main update function called by egui for each frame.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context
    /// * `frame` - The eframe frame
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let visuals = if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        self.handle_pending_queries(ctx, frame.storage_mut());
        self.handle_pending_exports(ctx);
        self.advance_zoom_animation(ctx);
        self.update_title(ctx);

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.draw_status_bar(ui);
        });

        if self.show_edit_tools {
            egui::SidePanel::left("edit_tools")
                .resizable(false)
                .default_width(220.0)
                .show(ctx, |ui| {
                    self.draw_edit_tools(ui);
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });
    }
}

impl WordTreeApp {
    /// Rebuilds the view with new parameters, reporting layout failures.
    pub fn apply_params(&mut self, params: ViewParams) {
        if params == self.view.params() {
            return;
        }
        if let Err(e) = self.view.apply(params) {
            log::error!("failed to rebuild tree: {e}");
            self.status = Some(format!("Cannot draw tree: {e}"));
        }
        // A relabel keeps the open tooltip; a rebuild drops it.
        if self.view.scene().is_none_or(|scene| scene.tooltip.is_none()) {
            self.canvas.hovered_label = None;
        }
    }

    /// Window title, naming the root word when a tree is shown.
    pub fn window_title(&self) -> String {
        match self.view.title() {
            Some(title) => format!("Word Tree: {title}"),
            None => "Word Tree".to_string(),
        }
    }

    fn update_title(&mut self, ctx: &egui::Context) {
        let title = self.window_title();
        if self.applied_title.as_deref() == Some(title.as_str()) {
            return;
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
        #[cfg(target_arch = "wasm32")]
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            document.set_title(&title);
        }
        self.applied_title = Some(title);
    }

    /// Renders the toolbar: search form, label options, zoom and export.
    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            egui::ComboBox::from_id_salt("lexicon_combo")
                .selected_text(self.query.lexicon.id())
                .show_ui(ui, |ui| {
                    for lexicon in Lexicon::ALL {
                        ui.selectable_value(&mut self.query.lexicon, lexicon, lexicon.id());
                    }
                });

            let field = ui.add(
                egui::TextEdit::singleline(&mut self.query.query_text)
                    .hint_text("Word")
                    .desired_width(140.0),
            );
            let entered = field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let searching = self.query.in_flight.is_some();
            let clicked = ui
                .add_enabled(!searching, egui::Button::new("Search"))
                .clicked();
            if (entered || clicked) && !searching {
                self.submit_query();
            }
            if searching {
                ui.spinner();
            }

            ui.separator();

            let params = self.view.params();
            let mut mode = params.label_mode;
            ui.radio_value(&mut mode, LabelMode::Word, "Words");
            ui.radio_value(&mut mode, LabelMode::Steal, "Steals");
            let mut playability = params.playability_links;
            ui.checkbox(&mut playability, "Playability");
            self.apply_params(
                params
                    .with_label_mode(mode)
                    .with_playability_links(playability),
            );

            ui.separator();

            let now = ui.input(|i| i.time);
            if ui.button("+").on_hover_text("Zoom in").clicked() {
                self.zoom_by_step(ZOOM_IN_STEP, now);
            }
            if ui.button("-").on_hover_text("Zoom out").clicked() {
                self.zoom_by_step(ZOOM_OUT_STEP, now);
            }

            ui.separator();

            let has_scene = self.view.scene().is_some();
            let image_label = format!("Save {}", self.export.format().extension().to_uppercase());
            if ui.add_enabled(has_scene, egui::Button::new(image_label)).clicked() {
                self.export.pending = Some(ExportRequest::Image);
            }
            if ui.add_enabled(has_scene, egui::Button::new("Save SVG")).clicked() {
                self.export.pending = Some(ExportRequest::Svg);
            }

            ui.separator();

            ui.toggle_value(&mut self.show_edit_tools, "Edit tools");
            ui.checkbox(&mut self.dark_mode, "Dark Mode");

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("Zoom: {:.0}%", self.view.transform().scale * 100.0));
            });
        });
    }

    /// Renders the slider panel and dataset summary.
    fn draw_edit_tools(&mut self, ui: &mut egui::Ui) {
        let params = self.view.params();

        ui.heading("Layout");
        let mut radius = params.radius_slider();
        ui.add(egui::Slider::new(&mut radius, 1.0..=50.0).step_by(1.0).text("Radius"));
        let mut angle = params.angle_slider();
        ui.add(egui::Slider::new(&mut angle, 1.0..=72.0).step_by(1.0).text("Angle"));
        let mut font_size = params.font_size;
        ui.add(egui::Slider::new(&mut font_size, 4.0..=40.0).step_by(1.0).text("Font"));
        let mut size = params.size_slider();
        ui.add(egui::Slider::new(&mut size, 5.0..=40.0).text("Size"));

        let mut next = params
            .with_radius_unit(radius * RADIUS_PER_STEP)
            .with_angle_span(angle * ANGLE_PER_STEP)
            .with_font_size(font_size);
        if (size - params.size_slider()).abs() > f32::EPSILON {
            next = next.with_canvas_width(size * CANVAS_PER_STEP);
        }
        self.apply_params(next);

        ui.separator();
        ui.heading("Export");
        ui.add(egui::Slider::new(&mut self.export.scale, 0.25..=8.0).text("Scale"));
        ui.checkbox(&mut self.export.jpeg, "JPEG");
        ui.add_enabled(
            self.export.jpeg,
            egui::Slider::new(&mut self.export.quality, 0.1..=1.0).text("Quality"),
        );
        ui.checkbox(&mut self.export.hide_tooltip, "Hide tooltip");

        if let Some(dataset) = self.view.dataset() {
            ui.separator();
            ui.heading("Tree");
            if let Some(title) = dataset.title() {
                ui.label(format!("Root: {title}"));
            }
            ui.label(format!("Words: {}", dataset.records.len()));
            ui.label(format!("Depth: {}", dataset.depth()));
        }
    }

    /// Renders status messages and the lexicon copyright notice.
    fn draw_status_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(status) = &self.status {
                ui.label(status);
                ui.separator();
            }
            ui.small(self.query.lexicon.copyright());
        });
    }

    /// Allocates the canvas, handles navigation and draws the scene.
    fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        self.canvas.frame_rect = self.canvas_frame(response.rect);

        self.handle_canvas_panning(ui, &response);
        self.handle_canvas_zoom(ui, &response);
        let hover = if self.canvas.is_panning {
            None
        } else {
            response.hover_pos()
        };
        self.update_hover(ui.ctx(), hover);

        let painter = painter.with_clip_rect(response.rect);
        match self.view.scene() {
            Some(scene) => self.render_scene(&painter, scene),
            None => {
                let message = match &self.query.in_flight {
                    Some(query) => format!("Looking up {query}..."),
                    None => "Search for a word to see its steal tree".to_string(),
                };
                painter.text(
                    response.rect.center(),
                    egui::Align2::CENTER_CENTER,
                    message,
                    egui::FontId::proportional(16.0),
                    ui.visuals().weak_text_color(),
                );
            }
        }
    }
}
