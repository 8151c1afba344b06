//! Image export: serialize a scene to SVG, rasterize it, encode it and hand it to the user.
//!
//! The pipeline runs in stages:
//! 1. [`scene_to_svg`] writes a standalone SVG document, with styles either
//!    inlined on each element or collected in a `<style>` block.
//! 2. [`rasterize`] parses it with usvg, renders it with resvg into a scaled
//!    tiny-skia pixmap and encodes PNG or JPEG bytes plus a base64 data URL.
//! 3. [`save_image`] optionally delivers the bytes: a save dialog natively,
//!    an anchor download in the browser.
//!
//! SVG export is supported on all targets (native + wasm).

use crate::constants::{
    INTERNAL_MARKER_RGB, LABEL_BASELINE_SHIFT, LABEL_RGB, LEAF_MARKER_RGB, LINK_OPACITY, LINK_RGB,
    MAX_EXPORT_SCALE, MIN_EXPORT_SCALE, TOOLTIP_FILL_RGB, TOOLTIP_INK_RGB, TOOLTIP_OPACITY,
};
use crate::scene::{Scene, SceneLayer, TextAnchor};
use crate::view::ZoomTransform;
use base64::Engine as _;
use eframe::egui::Vec2;
use std::fmt::{self, Write as _};
use std::sync::Arc;

/// Raster encoding of an exported image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// Lossless, keeps transparency
    #[default]
    Png,
    /// Lossy, flattened onto white
    Jpeg,
}

impl ImageFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    /// MIME type used in data URLs.
    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Options for [`save_image`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// Output size relative to the canvas
    pub scale: f32,
    /// Raster encoding
    pub format: ImageFormat,
    /// JPEG quality in `0.0..=1.0`; ignored for PNG
    pub quality: f32,
    /// Deliver the file to the user once encoded
    pub download: bool,
    /// Layer left out of the image
    pub ignore: Option<SceneLayer>,
    /// Write computed styles on every element instead of a `<style>` block
    pub inline_styles: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            format: ImageFormat::Png,
            quality: 1.0,
            download: true,
            ignore: None,
            inline_styles: true,
        }
    }
}

/// Failure in one of the export stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// The SVG document could not be parsed
    Svg(String),
    /// The output pixmap could not be allocated
    Pixmap {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
    /// Pixel data could not be encoded
    Encode(String),
    /// The encoded file could not be delivered
    Download(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Svg(e) => write!(f, "failed to parse SVG: {e}"),
            ExportError::Pixmap { width, height } => {
                write!(f, "failed to create pixmap {width}x{height}")
            }
            ExportError::Encode(e) => write!(f, "failed to encode image: {e}"),
            ExportError::Download(e) => write!(f, "failed to save image: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

/// Visible canvas area the scene is exported from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgFrame {
    /// Canvas size in pixels
    pub size: Vec2,
    /// Pan and zoom applied to the scene
    pub transform: ZoomTransform,
}

/// Encoded image ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Encoding of `bytes`
    pub format: ImageFormat,
    /// Encoded file content
    pub bytes: Vec<u8>,
    /// `data:` URL of the encoded file
    pub data_url: String,
}

fn hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

/// CSS for one element class.
fn class_style(class: &str) -> String {
    match class {
        "link" => format!(
            "fill:none;stroke:{};stroke-opacity:{}",
            hex(LINK_RGB),
            LINK_OPACITY
        ),
        "marker" => format!("fill:{}", hex(LEAF_MARKER_RGB)),
        "marker internal" => format!("fill:{}", hex(INTERNAL_MARKER_RGB)),
        "label" => format!("font-family:sans-serif;fill:{}", hex(LABEL_RGB)),
        "tooltip-bg" => format!(
            "fill:{};stroke:{};opacity:{}",
            hex(TOOLTIP_FILL_RGB),
            hex(TOOLTIP_INK_RGB),
            TOOLTIP_OPACITY
        ),
        "tooltip-text" => format!(
            "font-family:sans-serif;fill:{};opacity:{}",
            hex(TOOLTIP_INK_RGB),
            TOOLTIP_OPACITY
        ),
        _ => String::new(),
    }
}

/// `class` or inline `style` attribute for an element, depending on the options.
fn style_attr(class: &str, inline: bool) -> String {
    if inline {
        format!("style=\"{}\"", class_style(class))
    } else {
        format!("class=\"{class}\"")
    }
}

fn stylesheet() -> String {
    let mut css = String::new();
    for (selector, class) in [
        (".link", "link"),
        (".marker", "marker"),
        (".marker.internal", "marker internal"),
        (".label", "label"),
        (".tooltip-bg", "tooltip-bg"),
        (".tooltip-text", "tooltip-text"),
    ] {
        let _ = writeln!(css, "{selector} {{ {} }}", class_style(class));
    }
    css
}

/// Serializes the scene as it appears on the canvas.
pub fn scene_to_svg(scene: &Scene, frame: &SvgFrame, options: &ExportOptions) -> String {
    let inline = options.inline_styles;
    let shown = |layer: SceneLayer| options.ignore != Some(layer);
    let width = frame.size.x.round().max(1.0);
    let height = frame.size.y.round().max(1.0);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        w = width,
        h = height
    );
    if !inline {
        let _ = writeln!(out, "<style>\n{}</style>", stylesheet());
    }
    let _ = writeln!(out, "<g transform=\"{}\">", frame.transform.to_svg());

    if shown(SceneLayer::Links) {
        let _ = writeln!(out, "<g>");
        for link in &scene.links {
            let _ = writeln!(
                out,
                "  <path {} stroke-width=\"{:.2}\" d=\"M{:.2},{:.2} C{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}\" />",
                style_attr("link", inline),
                link.stroke_width,
                link.from.x,
                link.from.y,
                link.ctrl1.x,
                link.ctrl1.y,
                link.ctrl2.x,
                link.ctrl2.y,
                link.to.x,
                link.to.y
            );
        }
        let _ = writeln!(out, "</g>");
    }

    if shown(SceneLayer::Markers) {
        let _ = writeln!(out, "<g>");
        for marker in &scene.markers {
            let class = if marker.internal { "marker internal" } else { "marker" };
            let _ = writeln!(
                out,
                "  <circle {} cx=\"{:.2}\" cy=\"{:.2}\" r=\"{}\" />",
                style_attr(class, inline),
                marker.center.x,
                marker.center.y,
                marker.radius
            );
        }
        let _ = writeln!(out, "</g>");
    }

    if shown(SceneLayer::Labels) {
        let _ = writeln!(out, "<g>");
        for label in &scene.labels {
            let anchor = match label.anchor {
                TextAnchor::Start => "start",
                TextAnchor::End => "end",
            };
            let _ = writeln!(
                out,
                "  <text {} font-size=\"{}\" text-anchor=\"{}\" x=\"{}\" dy=\"{:.2}\" transform=\"translate({:.2},{:.2}) rotate({:.2})\">{}</text>",
                style_attr("label", inline),
                label.font_size,
                anchor,
                label.offset_x,
                label.font_size * LABEL_BASELINE_SHIFT,
                label.position.x,
                label.position.y,
                label.rotation,
                escape_xml(&label.text)
            );
        }
        let _ = writeln!(out, "</g>");
    }

    if let Some(tooltip) = scene.tooltip.as_ref().filter(|_| shown(SceneLayer::Tooltip)) {
        let font_size = scene
            .labels
            .get(tooltip.label)
            .map_or(tooltip.line_height, |l| l.font_size);
        let bg = tooltip.background;
        let _ = writeln!(out, "<g>");
        let _ = writeln!(
            out,
            "  <rect {} x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" />",
            style_attr("tooltip-bg", inline),
            bg.min.x,
            bg.min.y,
            bg.width(),
            bg.height()
        );
        let _ = writeln!(
            out,
            "  <text {} font-size=\"{}\">",
            style_attr("tooltip-text", inline),
            font_size
        );
        for (i, line) in tooltip.lines.iter().enumerate() {
            let _ = writeln!(
                out,
                "    <tspan x=\"{:.2}\" y=\"{:.2}\">{}</tspan>",
                tooltip.origin.x,
                tooltip.origin.y + tooltip.line_height * i as f32,
                escape_xml(line)
            );
        }
        let _ = writeln!(out, "  </text>");
        let _ = writeln!(out, "</g>");
    }

    let _ = writeln!(out, "</g>");
    let _ = writeln!(out, "</svg>");
    out
}

/// Fonts available to the SVG renderer.
///
/// The fonts bundled with egui are always present so exports render the
/// same text on every target; native builds add the system fonts.
fn font_database() -> fontdb::Database {
    let mut db = fontdb::Database::new();
    for data in eframe::egui::FontDefinitions::default().font_data.values() {
        db.load_font_data(data.font.to_vec());
    }
    let family = db
        .faces()
        .flat_map(|face| face.families.iter().map(|(name, _)| name.clone()))
        .find(|name| name.starts_with("Ubuntu"));
    if let Some(family) = family {
        db.set_sans_serif_family(family);
    }
    #[cfg(not(target_arch = "wasm32"))]
    db.load_system_fonts();
    db
}

/// Renders an SVG document to encoded image bytes.
pub fn rasterize(svg: &str, options: &ExportOptions) -> Result<Raster, ExportError> {
    let mut opt = usvg::Options::default();
    opt.fontdb = Arc::new(font_database());
    let tree =
        usvg::Tree::from_data(svg.as_bytes(), &opt).map_err(|e| ExportError::Svg(e.to_string()))?;

    let scale = options.scale.clamp(MIN_EXPORT_SCALE, MAX_EXPORT_SCALE);
    let size = tree.size();
    let width = (size.width() * scale).round().max(1.0) as u32;
    let height = (size.height() * scale).round().max(1.0) as u32;

    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(ExportError::Pixmap { width, height })?;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let bytes = match options.format {
        ImageFormat::Png => pixmap
            .encode_png()
            .map_err(|e| ExportError::Encode(e.to_string()))?,
        ImageFormat::Jpeg => encode_jpeg(&pixmap, options.quality)?,
    };
    log::debug!(
        "rasterized {}x{} {} ({} bytes)",
        width,
        height,
        options.format.extension(),
        bytes.len()
    );
    let data_url = data_url(options.format.mime(), &bytes);
    Ok(Raster {
        width,
        height,
        format: options.format,
        bytes,
        data_url,
    })
}

fn encode_jpeg(pixmap: &tiny_skia::Pixmap, quality: f32) -> Result<Vec<u8>, ExportError> {
    // JPEG has no alpha channel; composite onto white.
    let mut rgb = Vec::with_capacity(pixmap.pixels().len() * 3);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        let alpha = c.alpha() as u32;
        for channel in [c.red(), c.green(), c.blue()] {
            rgb.push(((channel as u32 * alpha + 255 * (255 - alpha)) / 255) as u8);
        }
    }
    let quality = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode(
            &rgb,
            pixmap.width(),
            pixmap.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Base64 `data:` URL for some bytes.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Exported file name for a tree rooted at `root_id`.
pub fn file_name(root_id: &str, extension: &str) -> String {
    let stem: String = root_id
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    let stem = if stem.is_empty() { "tree".to_string() } else { stem };
    format!("{stem}.{extension}")
}

/// Rasterizes an SVG document and, if requested, delivers the file.
///
/// # Arguments
///
/// * `svg` - Document produced by [`scene_to_svg`]
/// * `root_id` - Id of the tree's root word; names the file
/// * `options` - Scale, format and delivery options
///
/// # Returns
///
/// The encoded image, whether or not it was delivered.
pub async fn save_image(
    svg: String,
    root_id: String,
    options: ExportOptions,
) -> Result<Raster, ExportError> {
    let raster = rasterize(&svg, &options)?;
    if options.download {
        let name = file_name(&root_id, raster.format.extension());
        deliver(&name, &raster.bytes, &raster.data_url).await?;
    }
    Ok(raster)
}

/// Delivers the SVG document itself.
pub async fn save_svg(svg: String, root_id: String) -> Result<(), ExportError> {
    let name = file_name(&root_id, "svg");
    let url = data_url("image/svg+xml", svg.as_bytes());
    deliver(&name, svg.as_bytes(), &url).await
}

/// Asks where to save the file and writes it.
#[cfg(not(target_arch = "wasm32"))]
async fn deliver(name: &str, bytes: &[u8], _data_url: &str) -> Result<(), ExportError> {
    let extension = name.rsplit('.').next().unwrap_or_default();
    let Some(handle) = rfd::AsyncFileDialog::new()
        .add_filter(extension.to_ascii_uppercase(), &[extension])
        .set_file_name(name)
        .save_file()
        .await
    else {
        log::info!("save dialog for {name} cancelled");
        return Ok(());
    };
    let path = handle.path();
    std::fs::write(path, bytes).map_err(|e| ExportError::Download(e.to_string()))?;
    log::info!("saved {}", path.display());
    Ok(())
}

/// Triggers a browser download through a temporary anchor element.
#[cfg(target_arch = "wasm32")]
async fn deliver(name: &str, _bytes: &[u8], data_url: &str) -> Result<(), ExportError> {
    use wasm_bindgen::JsCast;

    let fail = |what: &str| ExportError::Download(what.to_string());
    let window = web_sys::window().ok_or_else(|| fail("no window"))?;
    let document = window.document().ok_or_else(|| fail("no document"))?;
    let body = document.body().ok_or_else(|| fail("no body"))?;

    let anchor = document
        .create_element("a")
        .map_err(|_| fail("failed to create anchor element"))?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|_| fail("failed to cast to anchor element"))?;
    anchor.set_href(data_url);
    anchor.set_download(name);
    anchor.style().set_property("display", "none").ok();

    body.append_child(&anchor)
        .map_err(|_| fail("failed to append anchor"))?;
    anchor.click();
    body.remove_child(&anchor)
        .map_err(|_| fail("failed to remove anchor"))?;
    log::info!("downloaded {name}");
    Ok(())
}

fn escape_xml(input: &str) -> String {
    let mut s = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => s.push_str("&amp;"),
            '<' => s.push_str("&lt;"),
            '>' => s.push_str("&gt;"),
            '"' => s.push_str("&quot;"),
            '\'' => s.push_str("&apos;"),
            _ => s.push(ch),
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::approx_text_width;
    use crate::types::{Dataset, NodeRecord};
    use crate::view::{render, ViewParams};
    use eframe::egui;

    const SQUARE: &str = "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"100\" height=\"100\">\
        <rect x=\"10\" y=\"10\" width=\"80\" height=\"80\" fill=\"#336699\" /></svg>";

    fn scene() -> Scene {
        let mut root = NodeRecord::new("CARE");
        root.def = Some("to be <concerned> & careful".into());
        let dataset = Dataset::new(vec![
            root,
            NodeRecord::new("CARE.RACE"),
            NodeRecord::new("CARE.SCARE#"),
        ]);
        let mut scene = render(&dataset, &ViewParams::default()).expect("valid tree");
        scene.show_tooltip(0, &|t| approx_text_width(t, 12.0));
        scene
    }

    fn frame() -> SvgFrame {
        SvgFrame {
            size: egui::vec2(500.0, 400.0),
            transform: ZoomTransform::new(1.0, egui::vec2(250.0, 200.0)),
        }
    }

    #[test]
    fn scale_multiplies_output_size() {
        let options = ExportOptions {
            scale: 2.0,
            download: false,
            ..Default::default()
        };
        let raster = rasterize(SQUARE, &options).expect("rasterize");
        assert_eq!((raster.width, raster.height), (200, 200));
        assert!(raster.data_url.starts_with("data:image/png;base64,"));
        assert_eq!(&raster.bytes[1..4], b"PNG");
    }

    #[test]
    fn jpeg_export_uses_jpeg_encoding() {
        let options = ExportOptions {
            format: ImageFormat::Jpeg,
            quality: 0.8,
            download: false,
            ..Default::default()
        };
        let raster = rasterize(SQUARE, &options).expect("rasterize");
        assert_eq!((raster.width, raster.height), (100, 100));
        assert_eq!(&raster.bytes[..2], &[0xff, 0xd8]);
        assert!(raster.data_url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn save_image_without_download_returns_raster() {
        let svg = scene_to_svg(&scene(), &frame(), &ExportOptions::default());
        let options = ExportOptions {
            download: false,
            ..Default::default()
        };
        let raster = futures::executor::block_on(save_image(svg, "CARE".into(), options))
            .expect("export");
        assert_eq!((raster.width, raster.height), (500, 400));
    }

    #[test]
    fn invalid_svg_is_reported() {
        let err = rasterize("not svg", &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::Svg(_)));
    }

    #[test]
    fn svg_contains_every_primitive() {
        let scene = scene();
        let svg = scene_to_svg(&scene, &frame(), &ExportOptions::default());
        assert_eq!(svg.matches("<path").count(), scene.links.len());
        assert_eq!(svg.matches("<circle").count(), scene.markers.len());
        assert!(svg.contains(">SCARE</text>"));
        assert!(svg.contains("to be &lt;concerned&gt; &amp; careful"));
        assert!(svg.contains("translate(250.000,200.000) scale(1.00000)"));
    }

    #[test]
    fn ignored_layer_is_left_out() {
        let options = ExportOptions {
            ignore: Some(SceneLayer::Tooltip),
            ..Default::default()
        };
        let svg = scene_to_svg(&scene(), &frame(), &options);
        assert!(!svg.contains("<rect"));
        assert!(!svg.contains("concerned"));

        let options = ExportOptions {
            ignore: Some(SceneLayer::Links),
            ..Default::default()
        };
        let svg = scene_to_svg(&scene(), &frame(), &options);
        assert!(!svg.contains("<path"));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn styles_are_inlined_or_collected() {
        let inline = scene_to_svg(&scene(), &frame(), &ExportOptions::default());
        assert!(inline.contains("style=\"fill:none;stroke:#555555;stroke-opacity:0.4\""));
        assert!(!inline.contains("<style>"));
        assert!(!inline.contains("class="));

        let options = ExportOptions {
            inline_styles: false,
            ..Default::default()
        };
        let classed = scene_to_svg(&scene(), &frame(), &options);
        assert!(classed.contains("<style>"));
        assert!(classed.contains(".marker.internal { fill:#555555 }"));
        assert!(classed.contains("class=\"link\""));
    }

    #[test]
    fn file_name_uses_root_id() {
        assert_eq!(file_name("CARE", "png"), "CARE.png");
        assert_eq!(file_name("SC#", "jpg"), "SC.jpg");
        assert_eq!(file_name("", "svg"), "tree.svg");
    }
}
