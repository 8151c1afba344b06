//! Polar to Cartesian projection shared by every drawing step.

use eframe::egui;

/// Projects a polar position onto the plane.
///
/// `angle` is in degrees with `0` pointing up and increasing clockwise on
/// screen; `radius` is the distance from the origin. Node placement, link
/// control points and tooltip placement all go through this function so
/// they stay consistent with each other.
pub fn project(angle: f32, radius: f32) -> egui::Pos2 {
    let theta = (angle - 90.0).to_radians();
    egui::pos2(radius * theta.cos(), radius * theta.sin())
}
