//! Refinement pipeline and file workflow.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageFormat;

use crate::buffer::PixelBuffer;
use crate::compositor::{validate_blur_radius, LayerPair};
use crate::detection::detect_edges;
use crate::dilation::dilate;
use crate::erase::erase_alpha;
use crate::error::{Error, Result};
use crate::surface::RasterSurface;

/// Default band width, in pixels.
pub const DEFAULT_EDGE_WIDTH: u32 = 2;
/// Default backdrop blur radius, in pixels.
pub const DEFAULT_BLUR_RADIUS: f32 = 2.0;

/// What [`process_file`] writes to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// The refined foreground alone, with the band erased.
    #[default]
    Refined,
    /// The refined foreground flattened over the blurred original.
    Composite,
}

/// Options controlling refinement.
#[derive(Debug, Clone)]
pub struct RefineOptions {
    /// Width of the erased band in pixels (at least 1).
    pub edge_width: u32,
    /// Backdrop blur radius in pixels (finite, at least 0).
    pub blur_radius: f32,
    /// What to write when processing files.
    pub output_mode: OutputMode,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            edge_width: DEFAULT_EDGE_WIDTH,
            blur_radius: DEFAULT_BLUR_RADIUS,
            output_mode: OutputMode::Refined,
            verbose: false,
            quiet: false,
        }
    }
}

impl RefineOptions {
    /// Check the tunable parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for `edge_width == 0` or a
    /// negative or non-finite `blur_radius`.
    pub fn validate(&self) -> Result<()> {
        validate_params(self.edge_width, self.blur_radius)
    }
}

fn validate_params(edge_width: u32, blur_radius: f32) -> Result<()> {
    if edge_width < 1 {
        return Err(Error::invalid("edge_width", "must be at least 1"));
    }
    validate_blur_radius(blur_radius)
}

/// Erase the alpha boundary band of `source` and pair it with its backdrop.
///
/// Detects the edge pixels, grows them into a band `edge_width` wide,
/// erases the band and returns the refined foreground alongside `source`.
/// The result depends only on the arguments; dimensions never change.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] before touching any pixel when
/// `edge_width` is 0 or `blur_radius` is negative or not finite.
#[tracing::instrument(level = "debug", skip(source), fields(width = source.width(), height = source.height()))]
pub fn refine(source: Arc<PixelBuffer>, edge_width: u32, blur_radius: f32) -> Result<LayerPair> {
    validate_params(edge_width, blur_radius)?;

    let edges = detect_edges(&source);
    let band = dilate(&edges, edge_width)?;
    let foreground = erase_alpha(&source, &band)?;
    LayerPair::new(source, foreground, blur_radius)
}

/// Flatten a layer pair into one raster with [`RasterSurface`].
///
/// # Errors
///
/// Propagates surface errors.
pub fn composite(pair: &LayerPair) -> Result<PixelBuffer> {
    let (width, height) = pair.dimensions();
    let mut surface = RasterSurface::new(width, height);
    pair.present(&mut surface, 0, 0)?;
    Ok(surface.flatten())
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Number of pixels whose alpha was erased.
    pub erased: usize,
    /// Human-readable status message.
    pub message: String,
}

/// Process a single image file: load, refine, save as PNG.
///
/// Returns a [`ProcessResult`] indicating success or failure.
#[must_use]
pub fn process_file(input: &Path, output: &Path, opts: &RefineOptions) -> ProcessResult {
    let mut result = ProcessResult {
        path: input.to_path_buf(),
        success: false,
        erased: 0,
        message: String::new(),
    };

    match run_file(input, output, opts) {
        Ok(erased) => {
            result.success = true;
            result.erased = erased;
            result.message = format!("{erased} edge pixels erased");
        }
        Err(e) => {
            tracing::debug!(path = %input.display(), error = %e, "refinement failed");
            result.message = e.to_string();
        }
    }

    result
}

fn run_file(input: &Path, output: &Path, opts: &RefineOptions) -> Result<usize> {
    opts.validate()?;

    let source = Arc::new(PixelBuffer::from_dynamic(&image::open(input)?));
    let before = opaque_count(&source);
    let pair = refine(source, opts.edge_width, opts.blur_radius)?;
    let erased = before - opaque_count(pair.foreground());

    let rendered = match opts.output_mode {
        OutputMode::Refined => pair.into_foreground(),
        OutputMode::Composite => composite(&pair)?,
    };

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    save_png(rendered, output)?;
    Ok(erased)
}

fn opaque_count(image: &PixelBuffer) -> usize {
    image.alphas().filter(|&a| a > 0).count()
}

/// Refine all supported images in a directory.
///
/// Uses parallel iteration when the `parallel` feature is enabled (via rayon).
/// Outputs keep the input file stem with a `.png` extension. Inputs sharing
/// a stem (`a.png`, `a.bmp`) fold their extension into the name
/// (`a_png.png`, `a_bmp.png`); any input whose output name would still
/// collide is reported as a failure instead of being overwritten.
#[must_use]
pub fn process_directory(
    input_dir: &Path,
    output_dir: &Path,
    opts: &RefineOptions,
) -> Vec<ProcessResult> {
    let mut entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
        Ok(rd) => rd
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_ok_and(|ft| ft.is_file()))
            .map(|e| e.path())
            .filter(|p| is_supported_image(p))
            .collect(),
        Err(e) => {
            return vec![failure(input_dir, format!("Failed to read directory: {e}"))];
        }
    };

    if !output_dir.exists() {
        if let Err(e) = std::fs::create_dir_all(output_dir) {
            return vec![failure(
                output_dir,
                format!("Failed to create output directory: {e}"),
            )];
        }
    }

    entries.sort();
    let targets: Vec<(PathBuf, Option<PathBuf>)> = entries
        .iter()
        .cloned()
        .zip(output_names(&entries))
        .collect();

    let job = |(input, name): &(PathBuf, Option<PathBuf>)| match name {
        Some(name) => process_file(input, &output_dir.join(name), opts),
        None => failure(input, "Output name collides with another input".to_string()),
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        targets.par_iter().map(job).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        targets.iter().map(job).collect()
    }
}

fn failure(path: &Path, message: String) -> ProcessResult {
    ProcessResult {
        path: path.to_path_buf(),
        success: false,
        erased: 0,
        message,
    }
}

/// PNG output names for `inputs`, `None` where two inputs would still share one.
///
/// Names are compared case-insensitively so the result is safe on
/// case-insensitive filesystems.
fn output_names(inputs: &[PathBuf]) -> Vec<Option<PathBuf>> {
    let stem_of = |p: &Path| p.file_stem().unwrap_or_default().to_string_lossy().into_owned();

    let mut stems: HashMap<String, usize> = HashMap::new();
    for input in inputs {
        *stems.entry(stem_of(input).to_lowercase()).or_default() += 1;
    }

    let names: Vec<String> = inputs
        .iter()
        .map(|input| {
            let stem = stem_of(input);
            if stems[&stem.to_lowercase()] > 1 {
                let ext = input.extension().unwrap_or_default().to_string_lossy();
                format!("{stem}_{ext}.png")
            } else {
                format!("{stem}.png")
            }
        })
        .collect();

    let mut taken: HashMap<String, usize> = HashMap::new();
    for name in &names {
        *taken.entry(name.to_lowercase()).or_default() += 1;
    }

    names
        .into_iter()
        .map(|name| (taken[&name.to_lowercase()] == 1).then(|| PathBuf::from(name)))
        .collect()
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "png" | "webp" | "jpg" | "jpeg" | "bmp"
        ),
        None => false,
    }
}

/// Save a buffer as PNG, the only supported output since alpha must survive.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] unless `path` ends in `.png`, or an
/// I/O or encoding error if writing fails.
pub fn save_png(image: PixelBuffer, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;
    if format != ImageFormat::Png {
        return Err(Error::UnsupportedFormat(format!(
            "{format:?} (output must be PNG to keep alpha)"
        )));
    }
    image.into_rgba_image().save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_smooth.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_smooth.png"))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 5x5, transparent except an opaque 3x3 block at rows/cols 1..=3.
    fn block_5x5() -> Arc<PixelBuffer> {
        let mut pixels = vec![0u8; 5 * 5 * 4];
        for y in 1..=3 {
            for x in 1..=3 {
                let i = (y * 5 + x) * 4;
                pixels[i..i + 4].copy_from_slice(&[200, 100, 50, 255]);
            }
        }
        Arc::new(PixelBuffer::new(5, 5, pixels).unwrap())
    }

    #[test]
    fn edge_width_one_keeps_only_the_center() {
        let pair = refine(block_5x5(), 1, 2.0).unwrap();
        let fg = pair.foreground();
        for y in 0..5 {
            for x in 0..5 {
                let expected = if (x, y) == (2, 2) { 255 } else { 0 };
                assert_eq!(fg.alpha(x, y).unwrap(), expected, "({x},{y})");
            }
        }
    }

    #[test]
    fn edge_width_two_erases_the_whole_block() {
        let pair = refine(block_5x5(), 2, 2.0).unwrap();
        assert!(pair.foreground().alphas().all(|a| a == 0));
    }

    #[test]
    fn rgb_survives_erasure() {
        let source = block_5x5();
        let pair = refine(Arc::clone(&source), 2, 0.0).unwrap();
        for (a, b) in source
            .as_raw()
            .chunks_exact(4)
            .zip(pair.foreground().as_raw().chunks_exact(4))
        {
            assert_eq!(a[..3], b[..3]);
        }
    }

    #[test]
    fn backdrop_is_the_source_itself() {
        let source = block_5x5();
        let pair = refine(Arc::clone(&source), 1, 3.0).unwrap();
        assert!(Arc::ptr_eq(pair.backdrop_arc(), &source));
        assert!((pair.blur_radius() - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(matches!(
            refine(block_5x5(), 0, 2.0),
            Err(Error::InvalidParameter {
                name: "edge_width",
                ..
            })
        ));
        for radius in [-1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                refine(block_5x5(), 1, radius),
                Err(Error::InvalidParameter {
                    name: "blur_radius",
                    ..
                })
            ));
        }
    }

    #[test]
    fn default_options_match_documented_defaults() {
        let opts = RefineOptions::default();
        assert_eq!(opts.edge_width, 2);
        assert!((opts.blur_radius - 2.0).abs() < f32::EPSILON);
        assert_eq!(opts.output_mode, OutputMode::Refined);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn composite_fills_the_erased_band_from_the_backdrop() {
        let pair = refine(block_5x5(), 1, 0.0).unwrap();
        let flat = composite(&pair).unwrap();
        assert_eq!(flat.dimensions(), (5, 5));
        // With no blur the backdrop shows through unchanged.
        assert_eq!(flat.alpha(1, 1).unwrap(), 255);
        assert_eq!(flat.alpha(0, 0).unwrap(), 0);
    }

    #[test]
    fn default_output_path_appends_smooth_suffix() {
        let p = default_output_path(Path::new("/tmp/photo.jpg"));
        assert_eq!(p, PathBuf::from("/tmp/photo_smooth.png"));

        let p = default_output_path(Path::new("cutout.png"));
        assert_eq!(p.file_name().unwrap().to_str().unwrap(), "cutout_smooth.png");
    }

    #[test]
    fn output_names_fold_extension_for_shared_stems() {
        let inputs: Vec<PathBuf> = ["a.bmp", "a.png", "b.png", "c.PNG", "C.jpg"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let names = output_names(&inputs);
        assert_eq!(
            names,
            vec![
                Some(PathBuf::from("a_bmp.png")),
                Some(PathBuf::from("a_png.png")),
                Some(PathBuf::from("b.png")),
                Some(PathBuf::from("c_PNG.png")),
                Some(PathBuf::from("C_jpg.png")),
            ]
        );
    }

    #[test]
    fn output_names_refuse_remaining_collisions() {
        let inputs: Vec<PathBuf> = ["a.bmp", "a.png", "a_bmp.jpg"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let names = output_names(&inputs);
        assert_eq!(names[0], None);
        assert_eq!(names[1], Some(PathBuf::from("a_png.png")));
        assert_eq!(names[2], None);
    }

    #[test]
    fn is_supported_image_accepts_common_formats() {
        assert!(is_supported_image(Path::new("photo.png")));
        assert!(is_supported_image(Path::new("photo.WEBP")));
        assert!(is_supported_image(Path::new("photo.jpeg")));
        assert!(!is_supported_image(Path::new("photo.gif")));
        assert!(!is_supported_image(Path::new("photo")));
    }

    #[test]
    fn save_png_rejects_lossy_targets() {
        let img = PixelBuffer::new(1, 1, vec![0; 4]).unwrap();
        assert!(matches!(
            save_png(img, Path::new("out.jpg")),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
