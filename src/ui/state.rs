//! Application state management structures.
//!
//! This module contains the state structures that track the viewer's UI
//! state: canvas navigation, the search form with its async lookups, and
//! pending image exports.

use crate::export::{ExportError, ImageFormat};
use crate::lexicon::Lexicon;
use crate::query::FetchError;
use crate::view::{ViewController, ViewParams, ZoomAnimation};
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};

/// State related to canvas navigation.
///
/// The zoom transform itself lives in the [`ViewController`]; this only
/// tracks in-progress gestures and overlays.
pub struct CanvasState {
    /// Whether the user is currently dragging the canvas
    pub is_panning: bool,
    /// Last pointer position during a pan
    pub last_pan_pos: Option<egui::Pos2>,
    /// Button zoom in progress
    pub animation: Option<ZoomAnimation>,
    /// Label under the pointer
    pub hovered_label: Option<usize>,
    /// Screen rectangle of the drawing canvas in the last frame
    pub frame_rect: egui::Rect,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            is_panning: false,
            last_pan_pos: None,
            animation: None,
            hovered_label: None,
            frame_rect: egui::Rect::NOTHING,
        }
    }
}

/// State of the search form and its lookups.
pub struct QueryState {
    /// Lexicon picked in the form
    pub lexicon: Lexicon,
    /// Text typed in the query field
    pub query_text: String,
    /// Lookup waiting to be started
    pub pending_fetch: Option<(Lexicon, String)>,
    /// Query currently being fetched
    pub in_flight: Option<String>,
    /// Channel for receiving lookup results from async contexts
    pub sender: Option<Sender<QueryResult>>,
    pub receiver: Option<Receiver<QueryResult>>,
}

impl Default for QueryState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            lexicon: Lexicon::default(),
            query_text: String::new(),
            pending_fetch: None,
            in_flight: None,
            sender: Some(sender),
            receiver: Some(receiver),
        }
    }
}

/// Messages sent from async lookups back to the app.
#[derive(Debug)]
pub enum QueryResult {
    /// The server returned a dataset body
    Fetched {
        /// Lexicon that was searched
        lexicon: Lexicon,
        /// Query that was looked up
        query: String,
        /// Raw response body
        json: String,
    },
    /// The lookup failed
    Failed {
        /// Query that was looked up
        query: String,
        /// What went wrong
        error: FetchError,
    },
}

/// What the user asked to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportRequest {
    /// Raster image in the configured format
    Image,
    /// The SVG document
    Svg,
}

/// Export settings and in-flight exports.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct ExportState {
    /// Output size relative to the canvas
    pub scale: f32,
    /// Save JPEG instead of PNG
    pub jpeg: bool,
    /// JPEG quality in `0.0..=1.0`
    pub quality: f32,
    /// Leave the definition tooltip out of exports
    pub hide_tooltip: bool,
    /// Export requested from the toolbar this frame
    #[serde(skip)]
    pub pending: Option<ExportRequest>,
    /// Channel for receiving export outcomes from async contexts
    #[serde(skip)]
    pub sender: Option<Sender<Result<String, ExportError>>>,
    #[serde(skip)]
    pub receiver: Option<Receiver<Result<String, ExportError>>>,
}

impl Default for ExportState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            scale: 1.0,
            jpeg: false,
            quality: 1.0,
            hide_tooltip: false,
            pending: None,
            sender: Some(sender),
            receiver: Some(receiver),
        }
    }
}

impl ExportState {
    /// Raster format selected in the settings.
    pub fn format(&self) -> ImageFormat {
        if self.jpeg {
            ImageFormat::Jpeg
        } else {
            ImageFormat::Png
        }
    }
}

/// The main application structure.
///
/// Only UI settings are persisted here; the dataset itself is cached
/// separately under its own storage keys so other tools can share it.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct WordTreeApp {
    /// Visual parameters, as of the last save
    pub params: ViewParams,
    /// Current dataset, scene and zoom
    #[serde(skip)]
    pub view: ViewController,
    /// Canvas navigation state
    #[serde(skip)]
    pub canvas: CanvasState,
    /// Search form state
    #[serde(skip)]
    pub query: QueryState,
    /// Export settings
    pub export: ExportState,
    /// Whether the slider panel is shown
    pub show_edit_tools: bool,
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
    /// Message shown in the status bar
    #[serde(skip)]
    pub status: Option<String>,
    /// Window title last sent to the viewport
    #[serde(skip)]
    pub applied_title: Option<String>,
}

impl Default for WordTreeApp {
    fn default() -> Self {
        Self {
            params: ViewParams::default(),
            view: ViewController::default(),
            canvas: CanvasState::default(),
            query: QueryState::default(),
            export: ExportState::default(),
            show_edit_tools: true,
            dark_mode: false,
            status: None,
            applied_title: None,
        }
    }
}

impl WordTreeApp {
    /// Serializes the persisted settings to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Restores settings from JSON, with a fresh view built from the saved parameters.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut app: Self = serde_json::from_str(json)?;
        app.view = ViewController::new(app.params);
        Ok(app)
    }
}
