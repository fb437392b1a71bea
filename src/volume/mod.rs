//! This module reads the voxels of a REC file in the order of the NIfTI
//! output.
//!
//! [`VolumeAssembler`] walks the complete volumes of a [`VolumeLayout`]
//! and yields one decoded slice at a time, seeking to each slice in the
//! REC file rather than loading the file as a whole.
//!
//! [`VolumeAssembler`]: ./struct.VolumeAssembler.html
//! [`VolumeLayout`]: ./layout/struct.VolumeLayout.html

pub mod diffusion;
pub mod element;
pub mod layout;
pub mod shape;

pub use self::diffusion::DiffusionTable;
pub use self::element::{RecElement, SliceData};
pub use self::layout::VolumeLayout;
pub use self::shape::AxisOrder;

use crate::error::{ParRecError, Result};
use crate::par::{ParFile, SliceRecord};
use crate::typedef::NiftiType;
use byteordered::ByteOrdered;
use num_traits::cast::AsPrimitive;
use std::io::{Read, Seek, SeekFrom};

/// Reads the slices of the complete volumes of a PAR/REC pair, in output
/// order.
///
/// Each item is one slice, indexed as `[x, y]` with the y axis reversed.
/// When the PAR file holds several scaling factors, every slice is
/// converted to floating point with its own coefficients.
///
/// ```no_run
/// use parrec2nii::ParFile;
/// use parrec2nii::volume::VolumeAssembler;
/// use std::fs::File;
/// use std::io::BufReader;
/// # use parrec2nii::Result;
/// # fn run() -> Result<()> {
/// let par = ParFile::from_file("scan.PAR")?;
/// let rec = BufReader::new(File::open("scan.REC")?);
/// for slice in VolumeAssembler::new(&par, rec, false)? {
///     let slice = slice?;
///     println!("{:?}", slice.dim());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct VolumeAssembler<'a, R> {
    par: &'a ParFile,
    source: R,
    layout: VolumeLayout,
    order: Vec<usize>,
    next: usize,
    data_type: NiftiType,
}

impl<'a, R> VolumeAssembler<'a, R>
where
    R: Read + Seek,
{
    /// Prepare the reading of a REC file. With `revert_b0`, the volumes
    /// with b-value number 1 are moved to the front.
    pub fn new(par: &'a ParFile, source: R, revert_b0: bool) -> Result<Self> {
        let [nx, ny, nz] = par.geometry.dim;
        let records = par.slices.records();
        if records
            .iter()
            .any(|r| r.recon_resolution_x != nx || r.recon_resolution_y != ny)
        {
            return Err(ParRecError::InvalidField(
                "recon_resolution".to_string(),
                "the same for all slices",
            ));
        }
        if par.slices.distinct(|r| r.image_pixel_size) > 1 {
            return Err(ParRecError::InvalidField(
                "image_pixel_size".to_string(),
                "the same for all slices",
            ));
        }
        let data_type = match par.bits {
            _ if par.multiple_scaling => NiftiType::Float32,
            8 => NiftiType::Uint8,
            16 => NiftiType::Int16,
            32 => NiftiType::Float32,
            bits => return Err(ParRecError::UnsupportedBitDepth(bits)),
        };

        let mut layout = VolumeLayout::new(&par.slices, nz);
        if layout.dropped() > 0 {
            log::warn!(
                "Leaving out {} slice(s) which do not form a complete volume",
                layout.dropped()
            );
        }
        if layout.is_empty() {
            return Err(ParRecError::InvalidFormat("no complete volume"));
        }
        if revert_b0 && layout.revert_b0(&par.slices) {
            log::info!("Moved the b0 volume(s) in front");
        }
        let order = layout.slices().collect();

        Ok(VolumeAssembler {
            par,
            source,
            layout,
            order,
            next: 0,
            data_type,
        })
    }

    /// Volumes read by this assembler.
    pub fn layout(&self) -> &VolumeLayout {
        &self.layout
    }

    /// Number of complete volumes.
    pub fn volumes(&self) -> usize {
        self.layout.len()
    }

    /// Data type of the slices produced.
    pub fn data_type(&self) -> NiftiType {
        self.data_type
    }

    /// Read and decode the slice of the given record.
    pub fn read_slice(&mut self, record: &SliceRecord) -> Result<SliceData> {
        let offset = record.rec_offset()?;
        let count = record.sample_count();
        let mut buf = vec![0u8; count * record.bytes_per_sample()?];
        self.source
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.source.read_exact(&mut buf))
            .map_err(|e| ParRecError::SliceRead(record.index_in_rec_file, offset, e))?;

        let mut slice = match record.image_pixel_size {
            8 => self.decode::<u8>(record, &buf)?,
            16 => self.decode::<i16>(record, &buf)?,
            32 => self.decode::<i32>(record, &buf)?,
            bits => return Err(ParRecError::UnsupportedBitDepth(bits)),
        };
        slice.flip_y();
        Ok(slice)
    }

    fn decode<T: RecElement>(&self, record: &SliceRecord, buf: &[u8]) -> Result<SliceData> {
        let samples = T::read_many(ByteOrdered::native(buf), record.sample_count())?;
        let shape = (record.recon_resolution_x, record.recon_resolution_y);
        let slice = AxisOrder::ColumnMajor.reshape(shape, samples)?;
        if self.par.multiple_scaling {
            let (slope, intercept) = (record.rescale_slope, record.rescale_intercept);
            let denominator = match record.scale_slope * slope {
                d if d == 0. => 1.,
                d => d,
            };
            let scaled = slice
                .mapv(|v| ((AsPrimitive::<f64>::as_(v) * slope + intercept) / denominator) as f32);
            Ok(SliceData::Float32(scaled))
        } else {
            Ok(T::into_slice_data(slice))
        }
    }
}

impl<'a, R> Iterator for VolumeAssembler<'a, R>
where
    R: Read + Seek,
{
    type Item = Result<SliceData>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = *self.order.get(self.next)?;
        self.next += 1;
        let par = self.par;
        Some(self.read_slice(&par.slices.records()[index]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.order.len() - self.next;
        (left, Some(left))
    }
}
