//! View parameters, zoom transform and the controller that owns the current scene.
//!
//! [`ViewParams`] is an immutable value; every slider or toggle produces a new
//! one and hands it to [`ViewController::apply`], which rebuilds layout and
//! scene from scratch. A rebuild either fully replaces the scene or, on a
//! [`TreeError`], leaves the previous dataset, parameters and scene in place.

use crate::constants::{
    ANGLE_PER_STEP, CANVAS_PER_STEP, DEFAULT_ANGLE_SLIDER, DEFAULT_FONT_SIZE, DEFAULT_RADIUS_SLIDER,
    FIT_MARGIN, MAX_CANVAS_EDGE, MAX_ZOOM, MIN_CANVAS_EDGE, MIN_ZOOM, RADIUS_PER_STEP,
    ZOOM_ANIMATION_SECS,
};
use crate::scene::{approx_text_width, build_scene, Scene, SceneOptions};
use crate::tree::{build_layout, LayoutConfig};
use crate::types::{Dataset, LabelMode, TreeError};
use eframe::egui::{self, Pos2, Vec2};
use serde::{Deserialize, Serialize};

/// Visual parameters of the tree view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewParams {
    /// Radial distance between depth levels
    pub radius_unit: f32,
    /// Angular span of the tree in degrees
    pub angle_span: f32,
    /// Label font size
    pub font_size: f32,
    /// Width of the drawing canvas
    pub canvas_width: f32,
    /// Height of the drawing canvas
    pub canvas_height: f32,
    /// Which text labels show
    pub label_mode: LabelMode,
    /// Scale link widths by the playability score
    pub playability_links: bool,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            radius_unit: DEFAULT_RADIUS_SLIDER * RADIUS_PER_STEP,
            angle_span: DEFAULT_ANGLE_SLIDER * ANGLE_PER_STEP,
            font_size: DEFAULT_FONT_SIZE,
            canvas_width: MIN_CANVAS_EDGE,
            canvas_height: MIN_CANVAS_EDGE,
            label_mode: LabelMode::Word,
            playability_links: false,
        }
    }
}

impl ViewParams {
    /// Returns a copy with a new radius unit.
    pub fn with_radius_unit(self, radius_unit: f32) -> Self {
        Self { radius_unit, ..self }
    }

    /// Returns a copy with a new angular span.
    pub fn with_angle_span(self, angle_span: f32) -> Self {
        Self { angle_span, ..self }
    }

    /// Returns a copy with a new font size.
    pub fn with_font_size(self, font_size: f32) -> Self {
        Self { font_size, ..self }
    }

    /// Returns a copy with a new canvas width, keeping the aspect ratio.
    pub fn with_canvas_width(self, canvas_width: f32) -> Self {
        let aspect = if self.canvas_width > 0.0 {
            self.canvas_height / self.canvas_width
        } else {
            1.0
        };
        Self {
            canvas_width,
            canvas_height: canvas_width * aspect,
            ..self
        }
    }

    /// Returns a copy with a new canvas size, ignoring the previous aspect ratio.
    pub fn with_canvas_size(self, canvas_width: f32, canvas_height: f32) -> Self {
        Self {
            canvas_width,
            canvas_height,
            ..self
        }
    }

    /// Returns a copy with a new label mode.
    pub fn with_label_mode(self, label_mode: LabelMode) -> Self {
        Self { label_mode, ..self }
    }

    /// Returns a copy with playability links switched on or off.
    pub fn with_playability_links(self, playability_links: bool) -> Self {
        Self {
            playability_links,
            ..self
        }
    }

    /// Radius slider position for the current radius unit.
    pub fn radius_slider(&self) -> f32 {
        self.radius_unit / RADIUS_PER_STEP
    }

    /// Angle slider position for the current span.
    pub fn angle_slider(&self) -> f32 {
        self.angle_span / ANGLE_PER_STEP
    }

    /// Size slider position for the current canvas width.
    pub fn size_slider(&self) -> f32 {
        self.canvas_width / CANVAS_PER_STEP
    }

    /// Canvas dimensions.
    pub fn canvas_size(&self) -> Vec2 {
        egui::vec2(self.canvas_width, self.canvas_height)
    }

    /// Layout part of the parameters.
    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            radius_unit: self.radius_unit,
            angle_span: self.angle_span,
        }
    }

    /// Scene part of the parameters.
    pub fn scene_options(&self) -> SceneOptions {
        SceneOptions {
            font_size: self.font_size,
            label_mode: self.label_mode,
            playability_links: self.playability_links,
        }
    }
}

/// Pan and zoom applied to the whole scene: `canvas = world * scale + translate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    /// Uniform scale, clamped to the allowed zoom range
    pub scale: f32,
    /// Offset in canvas pixels
    pub translate: Vec2,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    /// No pan, no zoom.
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate: Vec2::ZERO,
    };

    /// Creates a transform, clamping the scale.
    pub fn new(scale: f32, translate: Vec2) -> Self {
        Self {
            scale: scale.clamp(MIN_ZOOM, MAX_ZOOM),
            translate,
        }
    }

    /// Maps a world point to canvas coordinates.
    pub fn apply(&self, world: Pos2) -> Pos2 {
        (world.to_vec2() * self.scale + self.translate).to_pos2()
    }

    /// Maps a canvas point back to world coordinates.
    pub fn invert(&self, canvas: Pos2) -> Pos2 {
        ((canvas.to_vec2() - self.translate) / self.scale).to_pos2()
    }

    /// Sets a new scale while keeping the world point under `anchor` fixed.
    pub fn scale_to(&self, scale: f32, anchor: Pos2) -> Self {
        let world = self.invert(anchor);
        let scale = scale.clamp(MIN_ZOOM, MAX_ZOOM);
        Self {
            scale,
            translate: anchor.to_vec2() - world.to_vec2() * scale,
        }
    }

    /// Multiplies the scale by `factor` around `anchor`.
    pub fn scale_by(&self, factor: f32, anchor: Pos2) -> Self {
        self.scale_to(self.scale * factor, anchor)
    }

    /// Shifts the view by a canvas-space delta.
    pub fn translate_by(&self, delta: Vec2) -> Self {
        Self {
            translate: self.translate + delta,
            ..*self
        }
    }

    /// SVG `transform` attribute value.
    pub fn to_svg(&self) -> String {
        format!(
            "translate({:.3},{:.3}) scale({:.5})",
            self.translate.x, self.translate.y, self.scale
        )
    }
}

/// Animated zoom started by the toolbar buttons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomAnimation {
    from: ZoomTransform,
    target_scale: f32,
    anchor: Pos2,
    started_at: f64,
}

impl ZoomAnimation {
    /// Starts zooming from `from` by `factor` around `anchor` at time `now` (seconds).
    pub fn new(from: ZoomTransform, factor: f32, anchor: Pos2, now: f64) -> Self {
        Self {
            from,
            target_scale: (from.scale * factor).clamp(MIN_ZOOM, MAX_ZOOM),
            anchor,
            started_at: now,
        }
    }

    /// Transform at time `now`, and whether the animation has finished.
    pub fn sample(&self, now: f64) -> (ZoomTransform, bool) {
        let t = (((now - self.started_at) as f32) / ZOOM_ANIMATION_SECS).clamp(0.0, 1.0);
        let eased = ease_cubic_in_out(t);
        // Interpolate geometrically so each frame zooms by the same ratio.
        let scale = self.from.scale * (self.target_scale / self.from.scale).powf(eased);
        let scale = if t >= 1.0 { self.target_scale } else { scale };
        (self.from.scale_to(scale, self.anchor), t >= 1.0)
    }

    /// Final transform of the animation.
    pub fn target(&self) -> ZoomTransform {
        self.from.scale_to(self.target_scale, self.anchor)
    }
}

fn ease_cubic_in_out(t: f32) -> f32 {
    let t = t * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

/// Owns the current dataset, parameters, transform and scene.
#[derive(Debug, Clone, Default)]
pub struct ViewController {
    dataset: Option<Dataset>,
    params: ViewParams,
    transform: ZoomTransform,
    scene: Option<Scene>,
}

impl ViewController {
    /// Creates an empty controller with the given parameters.
    pub fn new(params: ViewParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Current parameters.
    pub fn params(&self) -> ViewParams {
        self.params
    }

    /// Current pan and zoom.
    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    /// Replaces the pan and zoom.
    pub fn set_transform(&mut self, transform: ZoomTransform) {
        self.transform = transform;
    }

    /// Scene currently shown, if a dataset is loaded.
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Mutable access to the scene, for tooltip overlays.
    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    /// Dataset currently shown.
    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Id of the root word of the current dataset.
    pub fn title(&self) -> Option<&str> {
        self.scene.as_ref().map(|s| s.title.as_str())
    }

    /// Shows a new dataset, sizing the canvas and centering the tree.
    ///
    /// On error nothing changes.
    pub fn load(&mut self, dataset: Dataset) -> Result<(), TreeError> {
        let scene = render(&dataset, &self.params)?;

        let bounds = scene.bounds(&approx_text_width);
        let padded = bounds.size() + Vec2::splat(2.0 * FIT_MARGIN);
        let canvas = egui::vec2(
            padded.x.clamp(MIN_CANVAS_EDGE, MAX_CANVAS_EDGE),
            padded.y.clamp(MIN_CANVAS_EDGE, MAX_CANVAS_EDGE),
        );
        let scale = (canvas.x / padded.x).min(canvas.y / padded.y).min(1.0);
        let transform = ZoomTransform::new(scale, canvas / 2.0 - bounds.center().to_vec2() * scale);

        log::info!(
            "loaded {} ({} words, depth {})",
            scene.title,
            dataset.records.len(),
            dataset.depth()
        );
        self.params = self.params.with_canvas_size(canvas.x, canvas.y);
        self.dataset = Some(dataset);
        self.scene = Some(scene);
        self.transform = transform;
        Ok(())
    }

    /// Rebuilds the scene with new parameters, keeping the current pan and zoom.
    ///
    /// Without a dataset the parameters are simply stored. On error the
    /// previous parameters and scene stay in place.
    pub fn apply(&mut self, params: ViewParams) -> Result<(), TreeError> {
        let Some(dataset) = &self.dataset else {
            self.params = params;
            return Ok(());
        };
        if let Some(scene) = &mut self.scene {
            if params.with_label_mode(self.params.label_mode) == self.params {
                scene.set_label_mode(params.label_mode);
                self.params = params;
                return Ok(());
            }
        }
        let snapshot = self.transform;
        let scene = render(dataset, &params)?;
        self.params = params;
        self.scene = Some(scene);
        self.transform = snapshot;
        Ok(())
    }
}

/// Pure layout + scene pipeline.
pub fn render(dataset: &Dataset, params: &ViewParams) -> Result<Scene, TreeError> {
    let tree = build_layout(dataset, &params.layout_config())?;
    Ok(build_scene(&tree, &params.scene_options()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeRecord;

    fn dataset(ids: &[&str]) -> Dataset {
        Dataset::new(ids.iter().map(|id| NodeRecord::new(*id)).collect())
    }

    fn loaded() -> ViewController {
        let mut controller = ViewController::new(ViewParams::default());
        controller
            .load(dataset(&["CARE", "CARE.RACE", "CARE.ACRE", "CARE.RACE.SCARE"]))
            .expect("valid tree");
        controller
    }

    #[test]
    fn params_are_replaced_not_mutated() {
        let base = ViewParams::default();
        let changed = base.with_radius_unit(200.0).with_angle_span(180.0);
        assert_eq!(base.radius_unit, 160.0);
        assert_eq!(base.angle_span, 360.0);
        assert_eq!(changed.radius_unit, 200.0);
        assert_eq!(changed.angle_span, 180.0);
        assert_eq!(base.radius_slider(), 16.0);
        assert_eq!(base.angle_slider(), 72.0);
    }

    #[test]
    fn canvas_width_keeps_aspect_ratio() {
        let params = ViewParams::default().with_canvas_size(600.0, 300.0);
        let resized = params.with_canvas_width(900.0);
        assert_eq!(resized.canvas_height, 450.0);
        assert_eq!(resized.size_slider(), 15.0);
    }

    #[test]
    fn transform_round_trips_points() {
        let t = ZoomTransform::new(2.0, egui::vec2(10.0, -5.0));
        let world = egui::pos2(3.0, 4.0);
        assert_eq!(t.apply(world), egui::pos2(16.0, 3.0));
        assert_eq!(t.invert(t.apply(world)), world);
    }

    #[test]
    fn zoom_is_clamped() {
        let t = ZoomTransform::IDENTITY.scale_by(100.0, Pos2::ZERO);
        assert_eq!(t.scale, MAX_ZOOM);
        let t = ZoomTransform::IDENTITY.scale_by(0.0001, Pos2::ZERO);
        assert_eq!(t.scale, MIN_ZOOM);
    }

    #[test]
    fn scale_keeps_anchor_fixed() {
        let t = ZoomTransform::new(1.5, egui::vec2(40.0, 20.0));
        let anchor = egui::pos2(250.0, 125.0);
        let world = t.invert(anchor);
        let zoomed = t.scale_by(1.15, anchor);
        let moved = zoomed.apply(world);
        assert!((moved - anchor).length() < 1e-3);
    }

    #[test]
    fn animation_reaches_target() {
        let from = ZoomTransform::IDENTITY;
        let anim = ZoomAnimation::new(from, 1.15, egui::pos2(100.0, 100.0), 10.0);
        let (start, done) = anim.sample(10.0);
        assert!(!done);
        assert_eq!(start, from);
        let (mid, done) = anim.sample(10.3);
        assert!(!done);
        assert!(mid.scale > 1.0 && mid.scale < 1.15);
        let (end, done) = anim.sample(10.6);
        assert!(done);
        assert_eq!(end, anim.target());
        assert!((end.scale - 1.15).abs() < 1e-6);
    }

    #[test]
    fn load_fits_canvas_and_centers_tree() {
        let controller = loaded();
        let params = controller.params();
        assert!(params.canvas_width >= MIN_CANVAS_EDGE && params.canvas_width <= MAX_CANVAS_EDGE);
        assert!(params.canvas_height >= MIN_CANVAS_EDGE && params.canvas_height <= MAX_CANVAS_EDGE);
        let scene = controller.scene().expect("scene");
        let center = controller
            .transform()
            .apply(scene.bounds(&approx_text_width).center());
        assert!((center - params.canvas_size().to_pos2() / 2.0).length() < 1e-2);
        assert_eq!(controller.title(), Some("CARE"));
    }

    #[test]
    fn relayout_preserves_transform() {
        let mut controller = loaded();
        let custom = ZoomTransform::new(2.5, egui::vec2(-120.0, 33.0));
        controller.set_transform(custom);

        let params = controller.params().with_radius_unit(90.0).with_angle_span(200.0);
        controller.apply(params).expect("rebuild");
        assert_eq!(controller.transform(), custom);
        assert_eq!(controller.params().radius_unit, 90.0);
    }

    #[test]
    fn label_mode_change_keeps_geometry() {
        let mut controller = loaded();
        let before = controller.scene().cloned().expect("scene");
        let params = controller.params().with_label_mode(LabelMode::Steal);
        controller.apply(params).expect("rebuild");
        let after = controller.scene().expect("scene");
        assert_eq!(after.links, before.links);
        assert_eq!(after.markers, before.markers);
        assert_eq!(after.label_mode, LabelMode::Steal);
    }

    #[test]
    fn label_mode_change_keeps_open_tooltip() {
        let mut root = NodeRecord::new("CARE");
        root.def = Some("to be concerned".into());
        let mut steal = NodeRecord::new("CARE.SCARE");
        steal.shortsteal = Some("S".into());
        let mut controller = ViewController::new(ViewParams::default());
        controller
            .load(Dataset::new(vec![root, steal]))
            .expect("valid tree");

        let measure = |text: &str| approx_text_width(text, 12.0);
        let scene = controller.scene_mut().expect("scene");
        assert!(scene.show_tooltip(0, &measure));

        let params = controller.params().with_label_mode(LabelMode::Steal);
        controller.apply(params).expect("relabel");
        let scene = controller.scene().expect("scene");
        assert!(scene.tooltip.is_some());
        assert_eq!(scene.labels[1].text, "S");
        assert_eq!(controller.params().label_mode, LabelMode::Steal);
    }

    #[test]
    fn failed_load_keeps_previous_scene() {
        let mut controller = loaded();
        let before_scene = controller.scene().cloned();
        let before_params = controller.params();
        let before_transform = controller.transform();

        let err = controller.load(dataset(&["A", "B"])).unwrap_err();
        assert_eq!(err, TreeError::MultipleRoots("A".into(), "B".into()));
        assert_eq!(controller.scene().cloned(), before_scene);
        assert_eq!(controller.params(), before_params);
        assert_eq!(controller.transform(), before_transform);
        assert_eq!(controller.dataset().map(|d| d.records.len()), Some(4));
    }

    #[test]
    fn apply_without_dataset_stores_params() {
        let mut controller = ViewController::default();
        let params = ViewParams::default().with_font_size(20.0);
        controller.apply(params).expect("no dataset");
        assert_eq!(controller.params().font_size, 20.0);
        assert!(controller.scene().is_none());
    }
}
