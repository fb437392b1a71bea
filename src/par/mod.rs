//! Reading of Philips PAR headers.
//!
//! A PAR file is a line oriented text file made of a short banner holding
//! the export tool version, a GENERAL INFORMATION block of `.`-prefixed
//! `label : value` lines, an IMAGE INFORMATION DEFINITION block describing
//! the columns of the slice table, and finally one whitespace delimited row
//! per image stored in the companion REC file.
//!
//! # Example
//!
//! ```no_run
//! use parrec2nii::ParFile;
//! # use parrec2nii::Result;
//! # fn run() -> Result<()> {
//! let par = ParFile::from_file("scan.PAR")?;
//! println!("{} slices of {:?}", par.slices.len(), par.geometry.dim);
//! for warning in &par.warnings {
//!     println!("{}", warning);
//! }
//! # Ok(())
//! # }
//! ```

pub mod definition;
pub mod general;
pub mod slice;

pub use self::definition::{Column, ColumnKind, FieldDefinition, SliceSchema};
pub use self::general::{GeneralEntry, GeneralInfo, GeneralValue};
pub use self::slice::{
    ColumnValue, InterleavedCounts, SliceOrder, SliceRecord, SliceTable, VolumeSliceOrder,
};

use crate::error::{ParRecError, Result};
use crate::typedef::SliceOrientation;
use crate::util::{all_close, rec_path_for};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Number of banner lines preceding the version line.
const BANNER_LINES: usize = 7;
/// Header line opening the image information definition block.
const DEFINITION_HEADER: &str = "# === IMAGE INFORMATION DEFINITION";
/// Header line opening the slice table.
const TABLE_SENTINEL: &str = "# === IMAGE INFORMATION =";

/// Version of the export tool which wrote a PAR file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParVersion {
    /// Legacy format, not supported.
    V3,
    V4,
    V4_1,
    V4_2,
    /// Any other version token.
    Unknown(String),
}

impl ParVersion {
    /// Interpret a version token.
    pub fn parse(token: &str) -> ParVersion {
        match token {
            "V3" => ParVersion::V3,
            "V4" => ParVersion::V4,
            "V4.1" => ParVersion::V4_1,
            "V4.2" => ParVersion::V4_2,
            other => ParVersion::Unknown(other.to_string()),
        }
    }

    /// Whether files of this version can be read.
    pub fn is_supported(&self) -> bool {
        matches!(self, ParVersion::V4 | ParVersion::V4_1 | ParVersion::V4_2)
    }
}

impl fmt::Display for ParVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParVersion::V3 => f.write_str("V3"),
            ParVersion::V4 => f.write_str("V4"),
            ParVersion::V4_1 => f.write_str("V4.1"),
            ParVersion::V4_2 => f.write_str("V4.2"),
            ParVersion::Unknown(v) => f.write_str(v),
        }
    }
}

/// An anomaly found and corrected while reading a PAR file.
#[derive(Debug, Clone, PartialEq)]
pub enum ParWarning {
    /// Scaling coefficients differ between slices.
    MultipleScalingFactors,
    /// The two in-plane FOV components differ; both were set to the larger.
    InPlaneFovMismatch {
        orientation: SliceOrientation,
        first: f64,
        second: f64,
    },
    /// The slice thickness disagrees with FOV / number of slices.
    SliceThicknessAdjusted { declared: f64, derived: f64 },
    /// A non-zero slice gap was folded into the slice thickness.
    SliceGapFolded { gap: f64 },
    /// The distinct dynamics disagree with rows / distinct slices.
    VolumeCountMismatch { dynamics: usize, derived: usize },
    /// The slice table holds a number of rows which is not
    /// `slices x volumes`.
    SliceCountMismatch { expected: usize, found: usize },
    /// Rows interleave volumes and slices in no known order.
    UnknownSliceOrdering,
    /// The companion REC file could not be found.
    MissingRec(PathBuf),
}

impl fmt::Display for ParWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParWarning::MultipleScalingFactors => write!(
                f,
                "Multiple scaling factors detected, switching to float32 output and rescaling"
            ),
            ParWarning::InPlaneFovMismatch {
                orientation,
                first,
                second,
            } => write!(
                f,
                "{}: in-plane FOV components differ ({} != {}), setting both to the larger",
                orientation.label(),
                first,
                second
            ),
            ParWarning::SliceThicknessAdjusted { declared, derived } => write!(
                f,
                "Slice thickness {} does not match FOV / number of slices, adjusting to {}",
                declared, derived
            ),
            ParWarning::SliceGapFolded { gap } => {
                write!(f, "Non-zero slice gap {}, adjusting slice thickness", gap)
            }
            ParWarning::VolumeCountMismatch { dynamics, derived } => write!(
                f,
                "Dynamic scan number ({}) does not match number of slices ({} volumes), assuming slices are ordered",
                dynamics, derived
            ),
            ParWarning::SliceCountMismatch { expected, found } => write!(
                f,
                "Number of slices differs between header ({}) and slice table ({})",
                expected, found
            ),
            ParWarning::UnknownSliceOrdering => {
                write!(f, "Slice ordering is not a predefined type")
            }
            ParWarning::MissingRec(path) => {
                write!(f, "REC file {} could not be found", path.display())
            }
        }
    }
}

/// Scan geometry derived from a PAR file.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanGeometry {
    /// Slice orientation of the first slice.
    pub orientation: SliceOrientation,
    /// Reconstruction matrix size and number of slice locations.
    pub dim: [usize; 3],
    /// Pixel spacing and effective slice thickness.
    pub voxel_size: [f64; 3],
    /// Field of view, as (ap, fh, rl), in mm.
    pub fov_apfhrl: [f64; 3],
    /// Angulation of the middle slice, as (ap, fh, rl), in degrees.
    pub angulation_apfhrl: [f64; 3],
    /// Off-centre of the middle slice, as (ap, fh, rl), in mm.
    pub offcentre_apfhrl: [f64; 3],
    /// Effective slice thickness, gap included.
    pub slice_thickness: f64,
    /// Slice gap; always zero once the gap is folded into the thickness.
    pub slice_gap: f64,
}

/// Intensity scaling to embed in the output header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rescale {
    pub slope: f64,
    pub intercept: f64,
}

impl Default for Rescale {
    fn default() -> Self {
        Rescale {
            slope: 1.,
            intercept: 0.,
        }
    }
}

/// A parsed and validated PAR file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParFile {
    pub version: ParVersion,
    pub general: GeneralInfo,
    pub slices: SliceTable,
    pub geometry: ScanGeometry,
    /// Uniform rescale coefficients, taken from the first slice.
    pub rescale: Rescale,
    /// Whether each slice needs its own rescaling.
    pub multiple_scaling: bool,
    /// Bits per REC sample.
    pub bits: i64,
    /// Repetition time in seconds, when the scan has several dynamics.
    pub repetition_time: Option<f64>,
    pub slice_order: SliceOrder,
    pub volume_slice_order: VolumeSliceOrder,
    /// Number of volumes, after the dynamics consistency check.
    pub number_of_volumes: usize,
    /// `.`-prefixed lines which could not be read as an entry.
    pub comments: Vec<String>,
    /// Anomalies corrected while reading.
    pub warnings: Vec<ParWarning>,
    /// Set when the data of this file cannot be read.
    pub problem_reading: bool,
    /// Path to the PAR file, when read from the file system.
    pub path: Option<PathBuf>,
    /// Path to the companion REC file.
    pub rec_path: Option<PathBuf>,
}

impl ParFile {
    /// Read a PAR file from the file system. The companion REC file is
    /// looked up next to it; when it is missing, `problem_reading` is set.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ParFile> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ParRecError::FileRead(path.to_owned(), e))?;
        let mut par = ParFile::from_reader(BufReader::new(file)).map_err(|e| match e {
            ParRecError::Io(e) => ParRecError::FileRead(path.to_owned(), e),
            e => e,
        })?;

        let rec_path = rec_path_for(path);
        if !rec_path.is_file() {
            par.problem_reading = true;
            par.warn(ParWarning::MissingRec(rec_path.clone()));
        }
        par.path = Some(path.to_owned());
        par.rec_path = Some(rec_path);
        Ok(par)
    }

    /// Read a PAR file from a byte stream.
    pub fn from_reader<R: BufRead>(mut input: R) -> Result<ParFile> {
        let mut buf = Vec::new();
        // PAR files are not guaranteed to be valid UTF-8 (patient names)
        let mut next_line = |input: &mut R| -> Result<Option<String>> {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                return Ok(None);
            }
            Ok(Some(String::from_utf8_lossy(&buf).trim_end().to_string()))
        };

        for _ in 0..BANNER_LINES {
            next_line(&mut input)?.ok_or(ParRecError::InvalidFormat("truncated banner"))?;
        }
        let version_line =
            next_line(&mut input)?.ok_or(ParRecError::InvalidFormat("missing version line"))?;
        let token = version_line
            .split_whitespace()
            .last()
            .ok_or(ParRecError::InvalidFormat("missing version line"))?;
        let version = ParVersion::parse(token);
        if !version.is_supported() {
            return Err(ParRecError::UnsupportedVersion(token.to_string()));
        }
        log::debug!("PAR format version {}", version);

        let mut reader = BlockReader::default();
        // line numbers are counted from 1, the banner and version included
        let mut number = BANNER_LINES + 1;
        while let Some(line) = next_line(&mut input)? {
            number += 1;
            if reader.feed(&line, number)? {
                break;
            }
        }
        reader.finish(version)
    }

    /// Log and record a corrected anomaly.
    fn warn(&mut self, warning: ParWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Compute the derived fields and correct the known scanner quirks.
    fn derive(
        version: ParVersion,
        mut general: GeneralInfo,
        slices: SliceTable,
        comments: Vec<String>,
    ) -> Result<ParFile> {
        let first = slices
            .first()
            .ok_or(ParRecError::InvalidFormat("no slice rows"))?
            .clone();
        let last = slices.last().unwrap_or(&first).clone();

        let orientation = first.orientation()?;
        let nslices = match general.integer("max_number_of_slices_locations")? {
            n if n > 0 => n as usize,
            _ => {
                return Err(ParRecError::InvalidField(
                    "max_number_of_slices_locations".to_string(),
                    "a positive integer",
                ))
            }
        };
        let max_dynamics = general.integer("max_number_of_dynamics")?;
        let fov_apfhrl = general.vector::<3>("fov")?;
        let angulation_apfhrl = general.vector::<3>("angulation_midslice")?;
        let offcentre_apfhrl = general.vector::<3>("off_centre_midslice")?;

        let repetition_time = if max_dynamics > 1 {
            Some((last.dyn_scan_begin_time - first.dyn_scan_begin_time) / (max_dynamics - 1) as f64)
        } else {
            None
        };

        let rescale = Rescale {
            slope: if first.scale_slope != 0. {
                1. / first.scale_slope
            } else {
                1.
            },
            intercept: first.rescale_intercept,
        };

        let mut par = ParFile {
            version,
            slice_order: slices.slice_order(),
            volume_slice_order: slices.volume_slice_order(),
            multiple_scaling: slices.has_multiple_scaling_factors(),
            number_of_volumes: 0,
            bits: first.image_pixel_size,
            repetition_time,
            rescale,
            geometry: ScanGeometry {
                orientation,
                dim: [first.recon_resolution_x, first.recon_resolution_y, nslices],
                voxel_size: [
                    first.pixel_spacing_x,
                    first.pixel_spacing_y,
                    first.slice_thickness + first.slice_gap,
                ],
                fov_apfhrl,
                angulation_apfhrl,
                offcentre_apfhrl,
                slice_thickness: first.slice_thickness,
                slice_gap: first.slice_gap,
            },
            general: GeneralInfo::default(),
            slices,
            comments,
            warnings: Vec::new(),
            problem_reading: false,
            path: None,
            rec_path: None,
        };

        if par.multiple_scaling {
            par.warn(ParWarning::MultipleScalingFactors);
        }
        par.check_number_of_volumes();
        par.check_slice_orientation(&mut general, nslices)?;
        par.general = general;
        if par.volume_slice_order == VolumeSliceOrder::Unknown {
            par.warn(ParWarning::UnknownSliceOrdering);
        }

        let expected = nslices * par.slices.counts().volumes();
        if expected != par.slices.len() {
            par.warn(ParWarning::SliceCountMismatch {
                expected,
                found: par.slices.len(),
            });
        }

        log::debug!(
            "{} slices, dim {:?}, {} volume(s), {:?} slice order",
            par.slices.len(),
            par.geometry.dim,
            par.number_of_volumes,
            par.volume_slice_order
        );
        Ok(par)
    }

    /// The number of volumes is taken from the dynamics, unless it
    /// disagrees with rows / distinct slice numbers.
    fn check_number_of_volumes(&mut self) {
        let dynamics = self.slices.distinct(|r| r.dynamic_scan_number);
        let locations = self.slices.distinct(|r| r.slice_number).max(1);
        let derived = self.slices.len() / locations;
        self.number_of_volumes = dynamics;
        if derived != dynamics {
            self.warn(ParWarning::VolumeCountMismatch { dynamics, derived });
            self.number_of_volumes = derived;
        }
    }

    /// Reconcile the field of view with the slice thickness, depending on
    /// the slice orientation, then fold the slice gap into the thickness.
    fn check_slice_orientation(&mut self, general: &mut GeneralInfo, nslices: usize) -> Result<()> {
        let mut fov = general.vector::<3>("fov")?;
        // in-plane FOV components and the slice axis, as (ap, fh, rl) indices
        let (a, b, slice_axis) = match self.geometry.orientation {
            SliceOrientation::Transverse => (0, 2, 1),
            SliceOrientation::Coronal => (1, 2, 0),
            SliceOrientation::Sagittal => (0, 1, 2),
        };
        if !all_close(fov[a], fov[b]) {
            self.warn(ParWarning::InPlaneFovMismatch {
                orientation: self.geometry.orientation,
                first: fov[a],
                second: fov[b],
            });
            let larger = fov[a].max(fov[b]);
            fov[a] = larger;
            fov[b] = larger;
            general.set_vector("fov", &fov)?;
        }

        let derived = fov[slice_axis] / nslices as f64;
        let declared = self.geometry.slice_thickness;
        if !all_close(declared, derived) {
            self.warn(ParWarning::SliceThicknessAdjusted { declared, derived });
            self.geometry.slice_thickness = derived;
        }
        let gap = self.geometry.slice_gap;
        if !all_close(gap, 0.) {
            self.warn(ParWarning::SliceGapFolded { gap });
            self.geometry.slice_thickness += gap;
            self.geometry.slice_gap = 0.;
        }
        self.geometry.voxel_size[2] = self.geometry.slice_thickness;
        Ok(())
    }

    /// Protocol name, or an empty string when not declared.
    pub fn protocol_name(&self) -> &str {
        self.general.text("protocol_name").unwrap_or("")
    }

    /// Counts of the interleaved dimensions of the slice table.
    pub fn counts(&self) -> InterleavedCounts {
        self.slices.counts()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    General,
    Definition,
    Table,
}

impl Default for Block {
    fn default() -> Self {
        Block::General
    }
}

/// Line by line state machine over the blocks following the version line.
#[derive(Debug, Default)]
struct BlockReader {
    block: Block,
    general: GeneralInfo,
    comments: Vec<String>,
    schema: SliceSchema,
    table: Option<SliceTable>,
}

impl BlockReader {
    /// Consume one line. Returns `true` once the slice table has ended.
    fn feed(&mut self, line: &str, number: usize) -> Result<bool> {
        let trimmed = line.trim();
        match self.block {
            Block::General => {
                if trimmed.starts_with('.') {
                    match GeneralInfo::parse_line(trimmed) {
                        Some(entry) => self.general.insert(entry),
                        None => self.comments.push(trimmed.to_string()),
                    }
                } else if trimmed.starts_with(DEFINITION_HEADER) {
                    self.block = Block::Definition;
                }
            }
            Block::Definition => {
                if trimmed.starts_with(TABLE_SENTINEL) {
                    if self.schema.is_empty() {
                        return Err(ParRecError::InvalidFormat("empty image information definition"));
                    }
                    self.table = Some(SliceTable::new(::std::mem::take(&mut self.schema)));
                    self.block = Block::Table;
                } else if let Some(field) = SliceSchema::parse_line(trimmed, number)? {
                    self.schema.push(field);
                }
            }
            Block::Table => {
                let table = match self.table.as_mut() {
                    Some(table) => table,
                    None => return Err(ParRecError::InvalidFormat("missing slice table")),
                };
                if trimmed.is_empty() {
                    return Ok(false);
                }
                if trimmed.starts_with('#') {
                    return Ok(!table.is_empty());
                }
                table.push_row(trimmed, number)?;
            }
        }
        Ok(false)
    }

    fn finish(self, version: ParVersion) -> Result<ParFile> {
        let table = match (self.block, self.table) {
            (Block::Table, Some(table)) => table,
            (Block::General, _) => {
                return Err(ParRecError::InvalidFormat("missing image information definition"))
            }
            _ => return Err(ParRecError::InvalidFormat("missing slice table")),
        };
        ParFile::derive(version, self.general, table, self.comments)
    }
}
