//! Refine hard background-removal cutouts by erasing the alpha boundary band.
//!
//! Background-removal models produce a near-binary alpha matte whose edge
//! often carries a fringe of the old background colour. This crate finds
//! the opaque pixels that touch transparency, grows them into a band of
//! configurable width, and erases that band. The refined foreground is
//! then meant to be drawn over a blurred copy of the original, so the
//! erased band shows soft colour instead of a halo.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use smooth_edges::{refine, PixelBuffer};
//!
//! let decoded = image::open("cutout.png").unwrap();
//! let source = Arc::new(PixelBuffer::from_dynamic(&decoded));
//! let pair = refine(source, 2, 2.0).expect("valid parameters");
//! pair.into_foreground().into_rgba_image().save("cutout_smooth.png").unwrap();
//! ```
//!
//! # Pipeline
//!
//! The stages are public for callers that need the intermediate masks:
//!
//! ```
//! use smooth_edges::{detect_edges, dilate, erase_alpha, PixelBuffer};
//!
//! let image = PixelBuffer::new(2, 1, vec![0, 0, 0, 255, 0, 0, 0, 0]).unwrap();
//! let edges = detect_edges(&image);
//! let band = dilate(&edges, 1).unwrap();
//! let refined = erase_alpha(&image, &band).unwrap();
//! assert_eq!(refined.alpha(0, 0).unwrap(), 0);
//! ```

#![deny(missing_docs)]

mod buffer;
pub mod compositor;
pub mod detection;
pub mod dilation;
mod engine;
pub mod erase;
pub mod error;
mod mask;
pub mod surface;
#[cfg(feature = "parallel")]
pub mod worker;

pub use buffer::{PixelBuffer, CHANNELS};
pub use compositor::{LayerPair, Placement, RenderSurface};
pub use detection::detect_edges;
pub use dilation::dilate;
pub use engine::{
    composite, default_output_path, is_supported_image, process_directory, process_file,
    refine, save_png, OutputMode, ProcessResult, RefineOptions, DEFAULT_BLUR_RADIUS,
    DEFAULT_EDGE_WIDTH,
};
pub use erase::erase_alpha;
pub use error::{Error, Result};
pub use mask::EdgeMask;
pub use surface::RasterSurface;
