//! Retained scene model built from a laid-out tree.
//!
//! A [`Scene`] is a flat list of drawable primitives in world coordinates
//! (root at the origin). It knows nothing about egui painting or SVG; the
//! canvas renderer and the exporter both consume it. Switching label modes
//! or opening a tooltip mutates only text and overlay state, never geometry.

use crate::constants::{
    LABEL_OFFSET, LINK_WIDTH, MARKER_RADIUS, MIN_PLAYABILITY_WIDTH, TOOLTIP_BACKGROUND_SHIFT,
    TOOLTIP_PAD_X, TOOLTIP_PAD_Y, TOOLTIP_WRAP_WIDTH,
};
use crate::projection::project;
use crate::tree::LayoutTree;
use crate::types::LabelMode;
use eframe::egui::{self, Pos2, Rect};

/// Horizontal alignment of a label relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    /// Text begins at the anchor
    Start,
    /// Text ends at the anchor
    End,
}

/// Independently renderable groups of primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneLayer {
    /// Parent-child curves
    Links,
    /// Node circles
    Markers,
    /// Node labels
    Labels,
    /// Definition tooltip overlay
    Tooltip,
}

/// Cubic curve from a node to its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Index of the child node in the layout tree
    pub node: usize,
    /// Curve start, at the child
    pub from: Pos2,
    /// First control point, on the child's angle at the mid radius
    pub ctrl1: Pos2,
    /// Second control point, on the parent's angle at the mid radius
    pub ctrl2: Pos2,
    /// Curve end, at the parent
    pub to: Pos2,
    /// Stroke width in world units
    pub stroke_width: f32,
}

/// Small circle drawn at a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Index of the node in the layout tree
    pub node: usize,
    /// Center in world coordinates
    pub center: Pos2,
    /// Radius in world units
    pub radius: f32,
    /// Whether the node has children
    pub internal: bool,
}

/// Text label of a node, rotated to read outward from the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    /// Index of the node in the layout tree
    pub node: usize,
    /// Node position; the label rotates around it
    pub position: Pos2,
    /// Clockwise rotation in degrees
    pub rotation: f32,
    /// Offset along the rotated x axis from the node to the anchor
    pub offset_x: f32,
    /// Alignment relative to the anchor
    pub anchor: TextAnchor,
    /// Direction, in degrees, along which the tooltip is pushed away from the label
    pub tooltip_angle: f32,
    /// Text shown in word mode
    pub word: String,
    /// Text shown in steal mode
    pub steal: String,
    /// Dictionary definition shown on hover
    pub definition: Option<String>,
    /// Text currently displayed
    pub text: String,
    /// Font size in world units
    pub font_size: f32,
}

impl Label {
    /// Text displayed for the given mode.
    pub fn text_for(&self, mode: LabelMode) -> &str {
        match mode {
            LabelMode::Word => &self.word,
            LabelMode::Steal => &self.steal,
        }
    }

    /// Corners of the label's text box in world coordinates, given its text width.
    pub fn quad(&self, text_width: f32) -> [Pos2; 4] {
        let (x0, x1) = match self.anchor {
            TextAnchor::Start => (self.offset_x, self.offset_x + text_width),
            TextAnchor::End => (self.offset_x - text_width, self.offset_x),
        };
        let half_h = self.font_size / 2.0;
        let rot = egui::emath::Rot2::from_angle(self.rotation.to_radians());
        [
            egui::vec2(x0, -half_h),
            egui::vec2(x1, -half_h),
            egui::vec2(x1, half_h),
            egui::vec2(x0, half_h),
        ]
        .map(|corner| self.position + rot * corner)
    }

    /// Whether a world point lies inside the label's rotated text box.
    pub fn contains(&self, point: Pos2, text_width: f32) -> bool {
        let quad = self.quad(text_width);
        let mut sign = 0.0_f32;
        for i in 0..4 {
            let a = quad[i];
            let b = quad[(i + 1) % 4];
            let cross = (b - a).x * (point - a).y - (b - a).y * (point - a).x;
            if cross.abs() <= f32::EPSILON {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }
}

/// Word-wrapped definition shown next to a hovered label.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    /// Label the tooltip belongs to
    pub label: usize,
    /// Wrapped lines of the definition
    pub lines: Vec<String>,
    /// Left end of the first line's baseline, in world coordinates
    pub origin: Pos2,
    /// Distance between baselines
    pub line_height: f32,
    /// Background rectangle behind the text
    pub background: Rect,
}

/// Options that shape the scene without affecting layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneOptions {
    /// Label font size
    pub font_size: f32,
    /// Which text labels show
    pub label_mode: LabelMode,
    /// Scale link widths by the playability score
    pub playability_links: bool,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            font_size: crate::constants::DEFAULT_FONT_SIZE,
            label_mode: LabelMode::Word,
            playability_links: false,
        }
    }
}

/// All drawable primitives of one rendering of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Id of the root word
    pub title: String,
    /// One link per non-root node, breadth-first
    pub links: Vec<Link>,
    /// One marker per node, breadth-first
    pub markers: Vec<Marker>,
    /// One label per node, breadth-first
    pub labels: Vec<Label>,
    /// Currently open tooltip
    pub tooltip: Option<Tooltip>,
    /// Mode the label texts currently reflect
    pub label_mode: LabelMode,
}

/// Stroke width of a link given the playability score of its child.
pub fn link_width(prob: f64, playability_links: bool) -> f32 {
    if playability_links {
        (prob.log2() as f32).max(MIN_PLAYABILITY_WIDTH)
    } else {
        LINK_WIDTH
    }
}

/// Builds the scene for a laid-out tree.
pub fn build_scene(tree: &LayoutTree, options: &SceneOptions) -> Scene {
    let order = tree.descendants();

    let links = order
        .iter()
        .skip(1)
        .filter_map(|&i| {
            let node = tree.node(i);
            let parent = tree.node(node.parent?);
            let mid = (node.radial_distance + parent.radial_distance) / 2.0;
            Some(Link {
                node: i,
                from: project(node.angle, node.radial_distance),
                ctrl1: project(node.angle, mid),
                ctrl2: project(parent.angle, mid),
                to: project(parent.angle, parent.radial_distance),
                stroke_width: link_width(node.record.prob, options.playability_links),
            })
        })
        .collect();

    let markers = order
        .iter()
        .map(|&i| {
            let node = tree.node(i);
            Marker {
                node: i,
                center: project(node.angle, node.radial_distance),
                radius: MARKER_RADIUS,
                internal: !node.is_leaf(),
            }
        })
        .collect();

    let labels = order
        .iter()
        .map(|&i| {
            let node = tree.node(i);
            let left_half = node.angle < 180.0;
            let outward = left_half == node.is_leaf();
            let steal = if node.depth == 0 {
                node.record.terminal_segment().to_string()
            } else {
                node.record.shortsteal.clone().unwrap_or_default()
            };
            let mut label = Label {
                node: i,
                position: project(node.angle, node.radial_distance),
                rotation: if left_half { node.angle - 90.0 } else { node.angle + 90.0 },
                offset_x: if outward { LABEL_OFFSET } else { -LABEL_OFFSET },
                anchor: if outward { TextAnchor::Start } else { TextAnchor::End },
                tooltip_angle: if node.is_leaf() { node.angle } else { node.angle + 180.0 },
                word: node.record.display_word(),
                steal,
                definition: node.record.def.clone(),
                text: String::new(),
                font_size: options.font_size,
            };
            label.text = if node.depth == 0 {
                label.word.clone()
            } else {
                label.text_for(options.label_mode).to_string()
            };
            label
        })
        .collect();

    Scene {
        title: tree.root().record.id.clone(),
        links,
        markers,
        labels,
        tooltip: None,
        label_mode: options.label_mode,
    }
}

impl Scene {
    /// Switches every label between its word and its steal text.
    pub fn set_label_mode(&mut self, mode: LabelMode) {
        for label in &mut self.labels {
            label.text = label.text_for(mode).to_string();
        }
        self.label_mode = mode;
    }

    /// Opens the definition tooltip for a label.
    ///
    /// `measure` returns the rendered width of a string at the label's font
    /// size. Labels without a definition leave the scene untouched and return
    /// `false`.
    pub fn show_tooltip(&mut self, label_index: usize, measure: &dyn Fn(&str) -> f32) -> bool {
        let Some(label) = self.labels.get(label_index) else {
            return false;
        };
        let Some(definition) = label.definition.as_deref() else {
            return false;
        };

        let line_height = label.font_size;
        let lines = wrap_text(definition, TOOLTIP_WRAP_WIDTH, measure);
        let width = lines.iter().map(|l| measure(l)).fold(0.0, f32::max);
        let height = line_height * lines.len() as f32;

        let base = label.position + project(label.tooltip_angle, measure(&label.text) / 2.0).to_vec2();
        let origin = base + egui::vec2(-width / 2.0, 0.0);
        let background = Rect::from_min_size(
            base + egui::vec2(-(width / 2.0 + TOOLTIP_BACKGROUND_SHIFT), -line_height),
            egui::vec2(width + TOOLTIP_PAD_X, height + TOOLTIP_PAD_Y),
        );

        self.tooltip = Some(Tooltip {
            label: label_index,
            lines,
            origin,
            line_height,
            background,
        });
        true
    }

    /// Removes the tooltip, if any.
    pub fn hide_tooltip(&mut self) {
        self.tooltip = None;
    }

    /// Bounding box of markers and label boxes.
    pub fn bounds(&self, measure: &dyn Fn(&str, f32) -> f32) -> Rect {
        let mut rect = Rect::NOTHING;
        for marker in &self.markers {
            rect = rect.union(Rect::from_center_size(
                marker.center,
                egui::Vec2::splat(marker.radius * 2.0),
            ));
        }
        for label in &self.labels {
            for corner in label.quad(measure(&label.text, label.font_size)) {
                rect.extend_with(corner);
            }
        }
        if rect.is_positive() {
            rect
        } else {
            Rect::from_center_size(Pos2::ZERO, egui::Vec2::ZERO)
        }
    }
}

/// Rough text width for contexts without font metrics.
pub fn approx_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.6
}

/// Greedily wraps words into lines no wider than `max_width`.
///
/// A single word wider than the budget gets a line of its own.
pub fn wrap_text(text: &str, max_width: f32, measure: &dyn Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();
    for word in text.split_whitespace() {
        let test_line = if current_line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current_line, word)
        };
        if measure(&test_line) <= max_width || current_line.is_empty() {
            current_line = test_line;
        } else {
            lines.push(std::mem::replace(&mut current_line, word.to_string()));
        }
    }
    if !current_line.is_empty() {
        lines.push(current_line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{build_layout, LayoutConfig};
    use crate::types::{Dataset, NodeRecord};

    fn record(id: &str, steal: &str, def: Option<&str>, prob: f64) -> NodeRecord {
        NodeRecord {
            id: id.into(),
            def: def.map(Into::into),
            prob,
            shortsteal: Some(steal.into()),
            longsteal: None,
        }
    }

    fn care_scene(options: &SceneOptions) -> Scene {
        let dataset = Dataset::new(vec![
            record("CARE", "", Some("to be concerned"), 100.0),
            record("CARE.RACE", "", None, 50.0),
            record("CARE.RACE.ACRE", "", Some("a unit of area"), 0.5),
            record("CARE.SCARE#", "S", None, 8.0),
        ]);
        let tree = build_layout(&dataset, &LayoutConfig::default()).expect("valid tree");
        build_scene(&tree, options)
    }

    fn char_measure(text: &str) -> f32 {
        text.chars().count() as f32 * 10.0
    }

    #[test]
    fn chain_renders_one_link_per_child() {
        let dataset = Dataset::new(vec![
            NodeRecord::new("CARE"),
            NodeRecord::new("CARE.RACE"),
            NodeRecord::new("CARE.RACE.ACRE"),
        ]);
        let tree = build_layout(&dataset, &LayoutConfig::default()).expect("valid tree");
        let scene = build_scene(&tree, &SceneOptions::default());
        assert_eq!(scene.title, "CARE");
        assert_eq!(scene.markers.len(), 3);
        assert_eq!(scene.labels.len(), 3);
        assert_eq!(scene.links.len(), 2);
        assert_eq!(scene.labels[2].text, "ACRE");
        // Links run from child to parent.
        assert_eq!(scene.links[0].to, scene.markers[0].center);
        assert_eq!(scene.links[1].from, scene.markers[2].center);
    }

    #[test]
    fn link_control_points_sit_at_mid_radius() {
        let scene = care_scene(&SceneOptions::default());
        for link in &scene.links {
            let r_child = link.from.to_vec2().length();
            let r_parent = link.to.to_vec2().length();
            let mid = (r_child + r_parent) / 2.0;
            assert!((link.ctrl1.to_vec2().length() - mid).abs() < 1e-2);
            assert!((link.ctrl2.to_vec2().length() - mid).abs() < 1e-2);
        }
    }

    #[test]
    fn playability_scales_link_width() {
        assert_eq!(link_width(64.0, false), LINK_WIDTH);
        assert_eq!(link_width(64.0, true), 6.0);
        assert_eq!(link_width(0.5, true), 1.0);
        assert_eq!(link_width(0.0, true), 1.0);

        let scene = care_scene(&SceneOptions {
            playability_links: true,
            ..Default::default()
        });
        let widths: Vec<f32> = scene.links.iter().map(|l| l.stroke_width).collect();
        assert_eq!(widths, vec![50f64.log2() as f32, 3.0, 1.0]);
    }

    #[test]
    fn label_mode_toggles_text_only() {
        let mut scene = care_scene(&SceneOptions::default());
        let texts: Vec<&str> = scene.labels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["CARE", "RACE", "SCARE", "ACRE"]);

        let before = scene.clone();
        scene.set_label_mode(LabelMode::Steal);
        let texts: Vec<&str> = scene.labels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["CARE", "", "S", ""]);
        assert_eq!(scene.links, before.links);
        assert_eq!(scene.markers, before.markers);
        for (a, b) in scene.labels.iter().zip(&before.labels) {
            assert_eq!(a.position, b.position);
            assert_eq!(a.rotation, b.rotation);
            assert_eq!(a.anchor, b.anchor);
        }

        scene.set_label_mode(LabelMode::Word);
        assert_eq!(scene.labels, before.labels);
    }

    #[test]
    fn root_keeps_its_word_in_steal_mode() {
        let scene = care_scene(&SceneOptions {
            label_mode: LabelMode::Steal,
            ..Default::default()
        });
        assert_eq!(scene.labels[0].text, "CARE");
        assert_eq!(scene.labels[2].text, "S");
    }

    #[test]
    fn label_anchor_depends_on_half_and_leafness() {
        let scene = care_scene(&SceneOptions::default());
        for label in &scene.labels {
            let marker = scene.markers.iter().find(|m| m.node == label.node).expect("marker");
            let angle = label.tooltip_angle - if marker.internal { 180.0 } else { 0.0 };
            let outward = (angle < 180.0) == !marker.internal;
            assert_eq!(label.anchor == TextAnchor::Start, outward);
            assert_eq!(label.offset_x > 0.0, outward);
            let expected_rotation = if angle < 180.0 { angle - 90.0 } else { angle + 90.0 };
            assert!((label.rotation - expected_rotation).abs() < 1e-4);
        }
    }

    #[test]
    fn wrap_text_fills_lines_greedily() {
        let lines = wrap_text("aa bb cc dd", 50.0, &char_measure);
        assert_eq!(lines, vec!["aa bb", "cc dd"]);
        let lines = wrap_text("short averyveryverylongword x", 50.0, &char_measure);
        assert_eq!(lines, vec!["short", "averyveryverylongword", "x"]);
        assert!(wrap_text("   ", 50.0, &char_measure).is_empty());
    }

    #[test]
    fn tooltip_opens_for_defined_label() {
        let mut scene = care_scene(&SceneOptions::default());
        assert!(scene.show_tooltip(0, &char_measure));
        let tip = scene.tooltip.clone().expect("tooltip");
        assert_eq!(tip.label, 0);
        assert_eq!(tip.lines, vec!["to be concerned"]);
        assert_eq!(tip.line_height, 12.0);
        assert_eq!(tip.background.width(), 150.0 + TOOLTIP_PAD_X);
        assert_eq!(tip.background.height(), 12.0 + TOOLTIP_PAD_Y);
        assert!((tip.background.min.x - (tip.origin.x - TOOLTIP_BACKGROUND_SHIFT)).abs() < 1e-4);

        // Opening another tooltip replaces the first.
        assert!(scene.show_tooltip(3, &char_measure));
        assert_eq!(scene.tooltip.as_ref().map(|t| t.label), Some(3));

        scene.hide_tooltip();
        assert!(scene.tooltip.is_none());
    }

    #[test]
    fn hovering_label_without_definition_changes_nothing() {
        let mut scene = care_scene(&SceneOptions::default());
        let before = scene.clone();
        assert!(!scene.show_tooltip(1, &char_measure));
        assert_eq!(scene, before);

        scene.show_tooltip(0, &char_measure);
        let with_tip = scene.clone();
        assert!(!scene.show_tooltip(2, &char_measure));
        assert_eq!(scene, with_tip);
    }

    #[test]
    fn long_definitions_wrap_at_budget() {
        let mut scene = care_scene(&SceneOptions::default());
        scene.labels[0].definition = Some("word ".repeat(40));
        scene.show_tooltip(0, &char_measure);
        let tip = scene.tooltip.expect("tooltip");
        assert!(tip.lines.len() > 1);
        for line in &tip.lines {
            assert!(char_measure(line) <= TOOLTIP_WRAP_WIDTH);
        }
    }

    #[test]
    fn label_contains_points_inside_its_box() {
        let scene = care_scene(&SceneOptions::default());
        let label = &scene.labels[3];
        let quad = label.quad(40.0);
        let center = quad[0] + (quad[2] - quad[0]) / 2.0;
        assert!(label.contains(center, 40.0));
        assert!(!label.contains(label.position + egui::vec2(500.0, 500.0), 40.0));
    }

    #[test]
    fn bounds_cover_every_marker() {
        let scene = care_scene(&SceneOptions::default());
        let bounds = scene.bounds(&approx_text_width);
        for marker in &scene.markers {
            assert!(bounds.contains(marker.center));
        }
    }
}
