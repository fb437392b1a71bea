//! Conversion of PAR/REC pairs to NIfTI-1 files.
//!
//! Each PAR file is converted on its own: a file which cannot be read or
//! converted is reported and the batch goes on with the next one.
//!
//! ```no_run
//! use parrec2nii::convert::{convert_batch, ConvertOptions, OutputNaming};
//!
//! let naming = OutputNaming {
//!     out_dir: "nifti".into(),
//!     ..OutputNaming::default()
//! };
//! let summary = convert_batch(&["a.PAR", "b.PAR"], &ConvertOptions::default(), &naming);
//! for path in &summary.written {
//!     println!("wrote {}", path.display());
//! }
//! ```

use crate::error::{ParRecError, Result};
use crate::header::NiftiHeaderBuilder;
use crate::par::{ParFile, ParWarning};
use crate::volume::{DiffusionTable, VolumeAssembler};
use crate::writer::{write_diffusion_files, write_nifti};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Options of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConvertOptions {
    /// Include the scanner angulation and off-centre in the transform.
    pub angulation: bool,
    /// Store the PAR rescale slope and intercept in the header.
    pub rescale: bool,
    /// Move b0 volumes in front and write the bval/bvec files.
    pub dti_revert_b0: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            angulation: true,
            rescale: true,
            dti_revert_b0: false,
        }
    }
}

/// Naming of the output files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputNaming {
    /// Prepended to the PAR file stem.
    pub prefix: String,
    /// Appended to the PAR file stem.
    pub suffix: String,
    /// Directory receiving the output files, created when missing.
    pub out_dir: PathBuf,
    /// Write `.nii.gz` instead of `.nii`.
    pub compress: bool,
}

impl Default for OutputNaming {
    fn default() -> Self {
        OutputNaming {
            prefix: String::new(),
            suffix: String::new(),
            out_dir: PathBuf::from("NIFTI"),
            compress: false,
        }
    }
}

impl OutputNaming {
    /// Path of the NIfTI file converted from the given PAR file.
    pub fn output_path<P: AsRef<Path>>(&self, par_path: P) -> PathBuf {
        let stem = par_path
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = if self.compress { "nii.gz" } else { "nii" };
        self.out_dir
            .join(format!("{}{}{}.{}", self.prefix, stem, self.suffix, ext))
    }
}

/// Outcome of the conversion of one PAR file.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    /// The NIfTI file was written.
    Written {
        /// The NIfTI file.
        nifti: PathBuf,
        /// The bval and bvec files, when requested.
        diffusion: Option<(PathBuf, PathBuf)>,
        /// Anomalies corrected while reading the PAR file.
        warnings: Vec<ParWarning>,
    },
    /// The PAR file was read, but its data could not be.
    Skipped {
        /// Anomalies found while reading the PAR file.
        warnings: Vec<ParWarning>,
    },
}

/// Convert one PAR/REC pair.
pub fn convert_par<P>(par_path: P, options: &ConvertOptions, naming: &OutputNaming) -> Result<Conversion>
where
    P: AsRef<Path>,
{
    let par_path = par_path.as_ref();
    let par = ParFile::from_file(par_path)?;
    if par.problem_reading {
        log::warn!("Skipping volume {} because of reading errors", par_path.display());
        return Ok(Conversion::Skipped {
            warnings: par.warnings,
        });
    }
    log::info!("Start to convert scan: {}", par_path.display());

    let rec_path = par
        .rec_path
        .clone()
        .unwrap_or_else(|| crate::util::rec_path_for(par_path));
    let rec = File::open(&rec_path).map_err(|e| ParRecError::FileRead(rec_path.clone(), e))?;
    let assembler = VolumeAssembler::new(&par, BufReader::new(rec), options.dti_revert_b0)?;

    let header = NiftiHeaderBuilder::new(&par)
        .angulation(options.angulation)
        .rescale(options.rescale)
        .volumes(assembler.volumes())
        .build()?;
    let diffusion = if options.dti_revert_b0 {
        Some(DiffusionTable::from_layout(&par.slices, assembler.layout()))
    } else {
        None
    };

    if !naming.out_dir.is_dir() {
        log::debug!("Creating directory {}", naming.out_dir.display());
        fs::create_dir_all(&naming.out_dir)
            .map_err(|e| ParRecError::Write(naming.out_dir.clone(), e))?;
    }
    let nifti = naming.output_path(par_path);
    log::info!("Writing file: {}", nifti.display());
    write_nifti(&nifti, &header, assembler)?;

    let diffusion = match diffusion {
        Some(table) => Some(write_diffusion_files(&nifti, &table)?),
        None => None,
    };

    Ok(Conversion::Written {
        nifti,
        diffusion,
        warnings: par.warnings,
    })
}

/// Outcome of a batch of conversions.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// NIfTI files written.
    pub written: Vec<PathBuf>,
    /// PAR files skipped because of reading problems.
    pub skipped: Vec<PathBuf>,
    /// PAR files whose conversion failed, with the cause.
    pub failed: Vec<(PathBuf, ParRecError)>,
}

impl BatchSummary {
    /// Whether every PAR file was converted.
    pub fn is_success(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Convert several PAR/REC pairs, one after the other. A failure only
/// stops the conversion of the file concerned.
pub fn convert_batch<I, P>(par_paths: I, options: &ConvertOptions, naming: &OutputNaming) -> BatchSummary
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut summary = BatchSummary::default();
    for path in par_paths {
        let path = path.as_ref();
        match convert_par(path, options, naming) {
            Ok(Conversion::Written { nifti, .. }) => summary.written.push(nifti),
            Ok(Conversion::Skipped { .. }) => summary.skipped.push(path.to_owned()),
            Err(e) => {
                log::warn!("Could not convert {}: {}", path.display(), e);
                summary.failed.push((path.to_owned(), e));
            }
        }
    }
    summary
}
