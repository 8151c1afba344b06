//! Shared application-wide constants.
//! Centralizes tweakable values used across layout, rendering and export.

// Dataset paths
/// Separator between words in a node's dotted path id.
pub const PATH_SEPARATOR: char = '.';
/// Lexicon markers the server appends to words; stripped for display.
pub const WORD_MARKERS: [char; 2] = ['#', '$'];

// Slider defaults and mappings
/// Default value of the radius slider.
pub const DEFAULT_RADIUS_SLIDER: f32 = 16.0;
/// World units of radial distance per radius slider step.
pub const RADIUS_PER_STEP: f32 = 10.0;
/// Default value of the angle slider.
pub const DEFAULT_ANGLE_SLIDER: f32 = 72.0;
/// Degrees of angular span per angle slider step.
pub const ANGLE_PER_STEP: f32 = 5.0;
/// Default label font size in world units.
pub const DEFAULT_FONT_SIZE: f32 = 12.0;
/// Canvas width in pixels per size slider step.
pub const CANVAS_PER_STEP: f32 = 60.0;

// Canvas sizing on first load
/// Smallest canvas edge chosen when fitting a freshly loaded tree.
pub const MIN_CANVAS_EDGE: f32 = 500.0;
/// Largest canvas edge chosen when fitting a freshly loaded tree.
pub const MAX_CANVAS_EDGE: f32 = 1000.0;
/// Margin (in world units) kept around the scene bounds when fitting.
pub const FIT_MARGIN: f32 = 50.0;

// Zoom
/// Smallest allowed zoom scale.
pub const MIN_ZOOM: f32 = 0.1;
/// Largest allowed zoom scale.
pub const MAX_ZOOM: f32 = 10.0;
/// Multiplicative step of the "zoom in" button.
pub const ZOOM_IN_STEP: f32 = 1.15;
/// Multiplicative step of the "zoom out" button.
pub const ZOOM_OUT_STEP: f32 = 0.85;
/// Duration of the animated button zoom, in seconds.
pub const ZOOM_ANIMATION_SECS: f32 = 0.6;
/// Scale change per unit of scroll delta.
pub const SCROLL_ZOOM_SENSITIVITY: f32 = 0.002;

// Scene geometry
/// Radius of the marker drawn at each node.
pub const MARKER_RADIUS: f32 = 2.5;
/// Horizontal distance between a marker and its label.
pub const LABEL_OFFSET: f32 = 6.0;
/// Link stroke width when playability is not shown.
pub const LINK_WIDTH: f32 = 1.5;
/// Minimum link stroke width when playability is shown.
pub const MIN_PLAYABILITY_WIDTH: f32 = 1.0;
/// Pixel width budget for one line of tooltip text.
pub const TOOLTIP_WRAP_WIDTH: f32 = 300.0;
/// Extra width added to the tooltip background.
pub const TOOLTIP_PAD_X: f32 = 5.0;
/// Extra height added to the tooltip background.
pub const TOOLTIP_PAD_Y: f32 = 4.0;
/// Left shift of the tooltip background relative to the text block.
pub const TOOLTIP_BACKGROUND_SHIFT: f32 = 3.0;
/// Opacity of the tooltip text and background.
pub const TOOLTIP_OPACITY: f32 = 0.9;

// Palette, shared by the canvas and exported images (RGB)
/// Link stroke color.
pub const LINK_RGB: [u8; 3] = [0x55, 0x55, 0x55];
/// Link stroke opacity.
pub const LINK_OPACITY: f32 = 0.4;
/// Leaf marker fill.
pub const LEAF_MARKER_RGB: [u8; 3] = [0x99, 0x99, 0x99];
/// Internal marker fill.
pub const INTERNAL_MARKER_RGB: [u8; 3] = [0x55, 0x55, 0x55];
/// Label text color in exported images.
pub const LABEL_RGB: [u8; 3] = [0x00, 0x00, 0x00];
/// Tooltip background fill.
pub const TOOLTIP_FILL_RGB: [u8; 3] = [0xff, 0xff, 0xe0];
/// Tooltip background border and text color.
pub const TOOLTIP_INK_RGB: [u8; 3] = [0x00, 0x00, 0x00];

// Export
/// Smallest accepted export scale.
pub const MIN_EXPORT_SCALE: f32 = 0.25;
/// Largest accepted export scale.
pub const MAX_EXPORT_SCALE: f32 = 8.0;
/// Baseline shift of label text, in ems.
pub const LABEL_BASELINE_SHIFT: f32 = 0.31;

// Remote lookup
/// Base URL of the anagrams lookup server.
pub const LOOKUP_BASE_URL: &str = "https://anagrams.mynetgear.com/";
/// Shortest accepted query.
pub const MIN_QUERY_LEN: usize = 4;
/// Longest accepted query.
pub const MAX_QUERY_LEN: usize = 15;

// Local cache keys
/// Cache key holding the last used lexicon id.
pub const CACHE_KEY_LEXICON: &str = "lexicon";
/// Cache key holding the last fetched raw dataset.
pub const CACHE_KEY_JSON: &str = "json";
/// Storage key for persisted UI settings.
pub const CACHE_KEY_APP_STATE: &str = "app_state";
