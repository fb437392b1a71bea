//! Command line converter of Philips PAR/REC files to NIfTI-1.

use clap::Parser;
use env_logger::{Builder, Env};
use parrec2nii::convert::{convert_batch, ConvertOptions, OutputNaming};
use std::path::PathBuf;
use std::process::exit;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// PAR files to convert
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Prepended to every output file name
    #[arg(long, default_value = "")]
    prefix: String,

    /// Appended to every output file name
    #[arg(long, default_value = "")]
    suffix: String,

    /// Output directory, created when missing
    #[arg(short, long, default_value = "NIFTI")]
    outdir: PathBuf,

    /// Leave the scanner angulation and off-centre out of the transform
    #[arg(long)]
    no_angulation: bool,

    /// Do not store the PAR rescale slope and intercept
    #[arg(long)]
    no_rescale: bool,

    /// Put the b0 volumes first and write bval/bvec files
    #[arg(long)]
    dti_revert_b0: bool,

    /// Write gzip compressed files (.nii.gz)
    #[arg(short = 'z', long)]
    gzip: bool,

    /// Log debugging information
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(level)).init();

    let options = ConvertOptions {
        angulation: !args.no_angulation,
        rescale: !args.no_rescale,
        dti_revert_b0: args.dti_revert_b0,
    };
    let naming = OutputNaming {
        prefix: args.prefix,
        suffix: args.suffix,
        out_dir: args.outdir,
        compress: args.gzip,
    };

    let summary = convert_batch(&args.files, &options, &naming);
    log::info!(
        "{} written, {} skipped, {} failed",
        summary.written.len(),
        summary.skipped.len(),
        summary.failed.len()
    );
    for (path, e) in &summary.failed {
        eprintln!("{}: {}", path.display(), e);
    }
    if !summary.is_success() {
        exit(1);
    }
}
