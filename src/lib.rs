//! # Word Tree
//!
//! A radial viewer for anagram "steal" trees. A steal forms a new word by
//! adding letters to an existing word and rearranging; the lookup server
//! returns every chain of steals starting from a query word, and this crate
//! draws them as a tidy tree fanned out around the query.
//!
//! ## Features
//! - Lexicon picker and word search against the anagrams server
//! - Radial tidy-tree layout with adjustable radius, span, font and canvas size
//! - Word or steal labels, playability-weighted links
//! - Definition tooltips on hover
//! - Canvas panning and zooming
//! - PNG, JPEG and SVG export
//! - The last lookup is cached and restored on the next start
//!
//! The layout and scene modules are plain data transformations and can be
//! used without the UI:
//!
//! ```
//! use word_tree::{build_layout, build_scene, Dataset, LayoutConfig, SceneOptions};
//!
//! let dataset = Dataset::from_json(r#"[{"id":"CARE"},{"id":"CARE.RACE"}]"#).unwrap();
//! let tree = build_layout(&dataset, &LayoutConfig::default()).unwrap();
//! let scene = build_scene(&tree, &SceneOptions::default());
//! assert_eq!(scene.links.len(), 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod export;
pub mod lexicon;
pub mod projection;
pub mod query;
pub mod scene;
pub mod tree;
mod types;
mod ui;
pub mod view;

// Re-export public types and functions
pub use export::{save_image, ExportError, ExportOptions, ImageFormat};
pub use lexicon::Lexicon;
pub use projection::project;
pub use query::{FetchError, StartupAction, StartupParams};
pub use scene::{build_scene, Scene, SceneLayer, SceneOptions};
pub use tree::{build_layout, LayoutConfig, LayoutTree};
pub use types::*;
pub use ui::WordTreeApp;
pub use view::{ViewController, ViewParams, ZoomTransform};

/// Runs the viewer natively with default settings.
///
/// Must be called inside a tokio runtime context; lookups and save dialogs
/// are spawned onto it.
///
/// # Returns
///
/// Returns `Ok(())` if the application runs successfully, or an `eframe::Error` if
/// initialization fails.
///
/// # Example
///
/// ```no_run
/// fn main() -> Result<(), eframe::Error> {
///     let runtime = tokio::runtime::Runtime::new().unwrap();
///     let _guard = runtime.enter();
///     word_tree::run_app()
/// }
/// ```
#[cfg(not(target_arch = "wasm32"))]
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1200.0, 900.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Word Tree",
        options,
        Box::new(|cc| {
            Ok(Box::new(WordTreeApp::from_storage(
                cc.storage,
                &StartupParams::from_location(),
            )))
        }),
    )
}

/// Starts the viewer in the browser on the canvas with id `word_tree_canvas`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    use wasm_bindgen::JsCast;

    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);

    wasm_bindgen_futures::spawn_local(async {
        let canvas = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("word_tree_canvas"))
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok());
        let Some(canvas) = canvas else {
            log::error!("no canvas element with id word_tree_canvas");
            return;
        };

        let result = eframe::WebRunner::new()
            .start(
                canvas,
                eframe::WebOptions::default(),
                Box::new(|cc| {
                    Ok(Box::new(WordTreeApp::from_storage(
                        cc.storage,
                        &StartupParams::from_location(),
                    )))
                }),
            )
            .await;
        if let Err(e) = result {
            log::error!("failed to start eframe: {e:?}");
        }
    });
}
