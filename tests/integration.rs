use std::sync::Arc;

use image::{Rgba, RgbaImage};
use smooth_edges::{
    composite, detect_edges, dilate, process_directory, process_file, refine, Error,
    OutputMode, PixelBuffer, RefineOptions,
};

/// Opaque disc of radius `r` centred in a transparent `size`x`size` image.
fn disc(size: u32, r: i64) -> Arc<PixelBuffer> {
    let c = i64::from(size) / 2;
    let img = RgbaImage::from_fn(size, size, |x, y| {
        let (dx, dy) = (i64::from(x) - c, i64::from(y) - c);
        if dx * dx + dy * dy <= r * r {
            Rgba([240, 120, 30, 255])
        } else {
            Rgba([0, 255, 0, 0])
        }
    });
    Arc::new(PixelBuffer::from(img))
}

/// Opaque square covering `lo..=hi` on both axes of a transparent image.
fn block(size: u32, lo: u32, hi: u32) -> Arc<PixelBuffer> {
    let img = RgbaImage::from_fn(size, size, |x, y| {
        if (lo..=hi).contains(&x) && (lo..=hi).contains(&y) {
            Rgba([240, 120, 30, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    Arc::new(PixelBuffer::from(img))
}

#[test]
fn edge_mask_never_marks_transparent_pixels() {
    let image = disc(40, 12);
    let mask = detect_edges(&image);
    assert!(!mask.is_empty());
    for (x, y) in mask.iter_marked() {
        assert!(image.alpha(x, y).unwrap() > 0, "({x},{y}) is transparent");
    }
}

#[test]
fn wider_bands_erase_a_superset() {
    let image = disc(40, 12);
    let edges = detect_edges(&image);
    let mut previous = dilate(&edges, 1).unwrap();
    assert_eq!(previous, edges);
    for edge_width in 2..6 {
        let band = dilate(&edges, edge_width).unwrap();
        assert!(previous.is_subset_of(&band).unwrap());
        previous = band;
    }
}

#[test]
fn uniform_images_pass_through_unchanged() {
    for alpha in [0u8, 255] {
        let image = Arc::new(PixelBuffer::from(RgbaImage::from_pixel(
            7,
            5,
            Rgba([1, 2, 3, alpha]),
        )));
        let pair = refine(Arc::clone(&image), 3, 2.0).unwrap();
        assert_eq!(pair.foreground(), image.as_ref());
    }
}

#[test]
fn refine_keeps_dimensions_and_aligns_layers() {
    let image = disc(33, 9);
    for edge_width in [1, 2, 7] {
        let pair = refine(Arc::clone(&image), edge_width, 1.0).unwrap();
        assert_eq!(pair.foreground().dimensions(), (33, 33));
        assert_eq!(pair.backdrop().dimensions(), pair.foreground().dimensions());
    }
}

#[test]
fn erased_band_has_requested_width() {
    let pair = refine(block(20, 4, 15), 3, 0.0).unwrap();
    let fg = pair.foreground();
    for x in 4..=6 {
        assert_eq!(fg.alpha(x, 10).unwrap(), 0, "x={x} should be erased");
    }
    assert_eq!(fg.alpha(7, 10).unwrap(), 255);
    assert_eq!(fg.alpha(12, 12).unwrap(), 255);
    assert_eq!(fg.alpha(13, 10).unwrap(), 0);
}

#[test]
fn second_pass_erases_a_further_band() {
    let first = refine(block(20, 4, 15), 2, 0.0).unwrap().into_foreground();
    let second = refine(Arc::new(first.clone()), 2, 0.0)
        .unwrap()
        .into_foreground();
    assert_ne!(first, second);
    assert_eq!(first.alpha(5, 10).unwrap(), 0);
    assert_eq!(first.alpha(6, 10).unwrap(), 255);
    assert_eq!(second.alpha(6, 10).unwrap(), 0);
    assert_eq!(second.alpha(8, 10).unwrap(), 255);
}

#[test]
fn zero_edge_width_returns_no_layers() {
    let result = refine(disc(8, 2), 0, 2.0);
    assert!(matches!(result, Err(Error::InvalidParameter { .. })));
}

#[test]
fn composite_is_opaque_where_the_original_was() {
    let image = disc(24, 8);
    let flat = composite(&refine(Arc::clone(&image), 2, 0.0).unwrap()).unwrap();
    assert_eq!(flat.alpha(12, 12).unwrap(), 255);
    // Erased band is filled from the unblurred backdrop.
    assert_eq!(flat.alpha(4, 12).unwrap(), 255);
    assert_eq!(flat.alpha(0, 0).unwrap(), 0);
}

#[test]
fn process_file_writes_refined_png() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cutout.png");
    let output = dir.path().join("out/cutout_smooth.png");
    Arc::try_unwrap(disc(20, 6))
        .unwrap()
        .into_rgba_image()
        .save(&input)
        .unwrap();

    let result = process_file(&input, &output, &RefineOptions::default());
    assert!(result.success, "{}", result.message);
    assert!(result.erased > 0);

    let written = image::open(&output).unwrap().to_rgba8();
    assert_eq!(written.dimensions(), (20, 20));
    assert_eq!(written.get_pixel(10, 10)[3], 255);
    assert_eq!(written.get_pixel(4, 10)[3], 0);
}

#[test]
fn process_file_reports_invalid_options() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cutout.png");
    Arc::try_unwrap(disc(10, 3))
        .unwrap()
        .into_rgba_image()
        .save(&input)
        .unwrap();

    let opts = RefineOptions {
        edge_width: 0,
        ..RefineOptions::default()
    };
    let result = process_file(&input, &dir.path().join("out.png"), &opts);
    assert!(!result.success);
    assert!(result.message.contains("edge_width"));
    assert!(!dir.path().join("out.png").exists());
}

#[test]
fn process_file_fails_on_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let result = process_file(
        &dir.path().join("missing.png"),
        &dir.path().join("out.png"),
        &RefineOptions::default(),
    );
    assert!(!result.success);
}

#[test]
fn process_directory_refines_every_supported_file() {
    let dir = tempfile::tempdir().unwrap();
    let input_dir = dir.path().join("in");
    let output_dir = dir.path().join("out");
    std::fs::create_dir_all(&input_dir).unwrap();
    for name in ["a.png", "b.png"] {
        Arc::try_unwrap(disc(16, 5))
            .unwrap()
            .into_rgba_image()
            .save(input_dir.join(name))
            .unwrap();
    }
    std::fs::write(input_dir.join("notes.txt"), "not an image").unwrap();

    let opts = RefineOptions {
        output_mode: OutputMode::Composite,
        ..RefineOptions::default()
    };
    let results = process_directory(&input_dir, &output_dir, &opts);
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.success));
    assert!(output_dir.join("a.png").exists());
    assert!(output_dir.join("b.png").exists());
}

#[cfg(feature = "parallel")]
#[test]
fn worker_discards_superseded_results() {
    use smooth_edges::worker::RefineWorker;

    let worker = RefineWorker::new();
    let stale = worker.submit(disc(64, 20), 3, 2.0);
    let fresh = worker.submit(disc(48, 10), 1, 2.0);
    assert!(stale < fresh);

    let tagged = worker.wait_latest().unwrap();
    assert_eq!(tagged.generation, fresh);
    assert_eq!(tagged.value.unwrap().dimensions(), (48, 48));
    assert!(worker.latest().is_none());
}

#[test]
fn process_directory_keeps_inputs_sharing_a_stem_apart() {
    let dir = tempfile::tempdir().unwrap();
    let input_dir = dir.path().join("in");
    let output_dir = dir.path().join("out");
    std::fs::create_dir_all(&input_dir).unwrap();
    for name in ["a.png", "a.bmp"] {
        Arc::try_unwrap(disc(16, 5))
            .unwrap()
            .into_rgba_image()
            .save(input_dir.join(name))
            .unwrap();
    }

    let results = process_directory(&input_dir, &output_dir, &RefineOptions::default());
    let successes = results.iter().filter(|r| r.success).count();
    let written = std::fs::read_dir(&output_dir).unwrap().count();
    assert_eq!(successes, 2);
    assert_eq!(written, successes);
    assert!(output_dir.join("a_png.png").exists());
    assert!(output_dir.join("a_bmp.png").exists());
}
