//! Toolbar export actions: build the SVG from the visible canvas and run the export pipeline.
//!
//! Notes:
//! - PNG/JPEG and SVG export are supported on all targets (native + wasm).
//! - Failures are logged and shown in the status bar; the view is never touched.

use super::state::{ExportRequest, WordTreeApp};
use crate::export::{save_image, save_svg, scene_to_svg, ExportOptions, SvgFrame};
use crate::scene::SceneLayer;
use eframe::egui;

impl WordTreeApp {
    /// Export options for the current settings.
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            scale: self.export.scale,
            format: self.export.format(),
            quality: self.export.quality,
            ignore: self.export.hide_tooltip.then_some(SceneLayer::Tooltip),
            ..Default::default()
        }
    }

    /// SVG document of the visible canvas, or `None` without a scene.
    pub fn current_svg(&self, options: &ExportOptions) -> Option<String> {
        let scene = self.view.scene()?;
        let frame = SvgFrame {
            size: self.view.params().canvas_size(),
            transform: self.view.transform(),
        };
        Some(scene_to_svg(scene, &frame, options))
    }

    /// Reports finished exports and starts the requested one.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context for requesting repaints
    pub fn handle_pending_exports(&mut self, ctx: &egui::Context) {
        if let Some(receiver) = &self.export.receiver {
            while let Ok(result) = receiver.try_recv() {
                match result {
                    Ok(summary) => self.status = Some(summary),
                    Err(e) => {
                        log::error!("export failed: {e}");
                        self.status = Some(format!("Export failed: {e}"));
                    }
                }
            }
        }

        let Some(request) = self.export.pending.take() else {
            return;
        };
        let options = self.export_options();
        let (Some(svg), Some(root_id)) = (self.current_svg(&options), self.view.title()) else {
            log::warn!("nothing to export");
            return;
        };
        let root_id = root_id.to_string();
        let Some(sender) = self.export.sender.clone() else {
            return;
        };
        let ctx = ctx.clone();
        let task = async move {
            let result = match request {
                ExportRequest::Image => save_image(svg, root_id, options)
                    .await
                    .map(|raster| format!("Exported {}x{} image", raster.width, raster.height)),
                ExportRequest::Svg => save_svg(svg, root_id)
                    .await
                    .map(|()| "Exported SVG".to_string()),
            };
            let _ = sender.send(result);
            ctx.request_repaint();
        };

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(task);

        #[cfg(not(target_arch = "wasm32"))]
        tokio::spawn(task);
    }
}
