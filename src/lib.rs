//! Conversion of Philips PAR/REC scanner exports to the NIfTI-1 format.
//!
//! A PAR file describes the acquisition in text, and its REC companion
//! holds the raw slices. This crate reads the PAR header into a
//! [`ParFile`], derives the voxel to world transform of the scan, and
//! writes a single file NIfTI-1 image with the slices of the REC file
//! in volume order.
//!
//! # Example
//!
//! ```no_run
//! use parrec2nii::convert::{convert_par, ConvertOptions, OutputNaming};
//! # use parrec2nii::Result;
//! # fn run() -> Result<()> {
//! let outcome = convert_par("scan.PAR", &ConvertOptions::default(), &OutputNaming::default())?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```
//!
//! The pieces may also be used on their own:
//!
//! ```no_run
//! use parrec2nii::{NiftiHeaderBuilder, ParFile};
//! # use parrec2nii::Result;
//! # fn run() -> Result<()> {
//! let par = ParFile::from_file("scan.PAR")?;
//! let header = NiftiHeaderBuilder::new(&par).angulation(false).build()?;
//! println!("{:?} {:?}", header.dim, header.pixdim);
//! # Ok(())
//! # }
//! ```
//!
//! [`ParFile`]: ./par/struct.ParFile.html
#![deny(missing_debug_implementations)]
#![warn(missing_docs, unused_extern_crates, trivial_casts, unused_results)]
#![recursion_limit = "128"]

#[macro_use]
extern crate quick_error;
#[macro_use]
extern crate num_derive;

pub mod affine;
pub mod convert;
pub mod error;
pub mod extension;
pub mod header;
pub mod par;
pub mod typedef;
mod util;
pub mod volume;
pub mod writer;

pub use crate::convert::{convert_batch, convert_par, BatchSummary, ConvertOptions, Conversion, OutputNaming};
pub use crate::error::{ParRecError, Result};
pub use crate::extension::Extender;
pub use crate::header::{NiftiHeader, NiftiHeaderBuilder};
pub use crate::par::{ParFile, ParVersion, ParWarning};
pub use crate::typedef::{NiftiType, SliceOrientation, Unit, XForm};
pub use crate::volume::{SliceData, VolumeAssembler};
pub use byteordered::Endianness;
