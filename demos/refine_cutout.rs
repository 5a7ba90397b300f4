//! Refine a single cutout and write both the refined PNG and the composite.
//!
//! Usage:
//! ```sh
//! cargo run --example refine_cutout -- cutout.png out_dir
//! ```

use std::env;
use std::path::Path;
use std::process;
use std::sync::Arc;

use smooth_edges::{composite, refine, save_png, PixelBuffer};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <output_dir>", args[0]);
        process::exit(1);
    }

    let decoded = image::open(&args[1]).expect("failed to decode input");
    let source = Arc::new(PixelBuffer::from_dynamic(&decoded));
    let pair = refine(source, 5, 2.0).expect("valid parameters");

    let out_dir = Path::new(&args[2]);
    std::fs::create_dir_all(out_dir).expect("failed to create output directory");

    let flat = composite(&pair).expect("composite failed");
    save_png(flat, &out_dir.join("composite.png")).expect("failed to save composite");
    save_png(pair.into_foreground(), &out_dir.join("refined.png"))
        .expect("failed to save refined cutout");

    println!("Done: {}", out_dir.display());
}
