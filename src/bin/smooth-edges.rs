use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use smooth_edges::{
    default_output_path, process_directory, process_file, OutputMode, ProcessResult,
    RefineOptions, DEFAULT_BLUR_RADIUS, DEFAULT_EDGE_WIDTH,
};

#[derive(Parser)]
#[command(
    name = "smooth-edges",
    about = "Soften background-removal cutouts by erasing the alpha boundary band",
    version,
    after_help = "Simple usage: smooth-edges <cutout.png>  (writes cutout_smooth.png)\n\n\
                  Output is always PNG so the refined alpha channel is kept."
)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_smooth.png)
    #[arg(short, long)]
    output: Option<String>,

    /// Width of the erased boundary band in pixels
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_EDGE_WIDTH,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    edge_width: u32,

    /// Blur radius of the backdrop in pixels (used with --composite)
    #[arg(short, long, default_value_t = DEFAULT_BLUR_RADIUS)]
    blur_radius: f32,

    /// Write the refined cutout flattened over its blurred original
    #[arg(short, long)]
    composite: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let opts = RefineOptions {
        edge_width: cli.edge_width,
        blur_radius: cli.blur_radius,
        output_mode: if cli.composite {
            OutputMode::Composite
        } else {
            OutputMode::Refined
        },
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    if let Err(e) = opts.validate() {
        eprintln!("Error: {e}");
        process::exit(1);
    }

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if !opts.quiet {
        eprintln!(
            "Edge width: {}px, blur radius: {}px, output: {}",
            opts.edge_width,
            opts.blur_radius,
            match opts.output_mode {
                OutputMode::Refined => "refined cutout",
                OutputMode::Composite => "composite",
            }
        );
        eprintln!();
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: smooth-edges <input_dir> -o <output_dir>");
            process::exit(1);
        };
        process_directory(input_path, &output_dir, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![process_file(input_path, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` overrides the level picked from the flags.
fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "smooth_edges=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_result(result: &ProcessResult, opts: &RefineOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        if !opts.quiet {
            eprintln!("[OK] {filename} ({} px erased)", result.erased);
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
