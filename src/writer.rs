//! Utility functions to write nifti images.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteordered::{ByteOrdered, Endian};
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{ParRecError, Result};
use crate::extension::Extender;
use crate::header::{NiftiHeader, HEADER_SIZE};
use crate::util::{is_gz_file, sibling_with_suffix};
use crate::volume::{DiffusionTable, SliceData};

/// Write a nifti file (.nii or .nii.gz) made of the given header and
/// slices.
///
/// All numbers are written in the byte order of the host. The slices are
/// written as they come, so the whole volume is never held in memory. An
/// I/O failure is logged and reported as `ParRecError::Write`; a partially
/// written file is left behind.
pub fn write_nifti<P, I>(path: P, header: &NiftiHeader, slices: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Result<SliceData>>,
{
    let path = path.as_ref();
    let result = File::create(path)
        .map_err(ParRecError::from)
        .and_then(|f| {
            let writer = BufWriter::new(f);
            if is_gz_file(path) {
                let e = GzEncoder::new(writer, Compression::default());
                let e = write_all(e, header, slices)?;
                let mut writer = e.finish()?;
                writer.flush()?;
            } else {
                let mut writer = write_all(writer, header, slices)?;
                writer.flush()?;
            }
            Ok(())
        });

    result.map_err(|e| match e {
        ParRecError::Io(e) => {
            log::error!("Write failed: {}: {}", path.display(), e);
            ParRecError::Write(path.to_owned(), e)
        }
        e => e,
    })
}

/// Write the companion bval and bvec text files of a NIfTI file, next to
/// it. Returns the paths written.
pub fn write_diffusion_files<P>(nifti_path: P, table: &DiffusionTable) -> Result<(PathBuf, PathBuf)>
where
    P: AsRef<Path>,
{
    let bval = sibling_with_suffix(&nifti_path, "-x-bval.txt");
    let bvec = sibling_with_suffix(&nifti_path, "-x-bvec.txt");
    for (path, text) in &[(&bval, table.bval_text()), (&bvec, table.bvec_text())] {
        fs::write(path, text).map_err(|e| {
            log::error!("Write failed: {}: {}", path.display(), e);
            ParRecError::Write(path.to_path_buf(), e)
        })?;
    }
    Ok((bval, bvec))
}

fn write_all<W, I>(writer: W, header: &NiftiHeader, slices: I) -> Result<W>
where
    W: Write,
    I: IntoIterator<Item = Result<SliceData>>,
{
    let mut writer = ByteOrdered::native(writer);
    write_header(&mut writer, header)?;
    Extender::SINGLE_FILE_MARKER.write_to(&mut writer)?;

    let padding = (header.vox_offset as usize).saturating_sub(HEADER_SIZE + 4);
    writer.write_all(&vec![0u8; padding])?;

    for slice in slices {
        let slice = slice?;
        if slice.data_type() as i16 != header.datatype {
            return Err(ParRecError::InvalidField(
                "datatype".to_string(),
                "the data type of the voxels written",
            ));
        }
        slice.write_to(&mut writer)?;
    }
    Ok(writer.into_inner())
}

/// Write the 348 bytes of a NIfTI-1 header.
pub fn write_header<W, E>(writer: &mut ByteOrdered<W, E>, header: &NiftiHeader) -> Result<()>
where
    W: Write,
    E: Endian,
{
    writer.write_i32(header.sizeof_hdr)?;
    writer.write_all(&header.data_type)?;
    writer.write_all(&header.db_name)?;
    writer.write_i32(header.extents)?;
    writer.write_i16(header.session_error)?;
    writer.write_u8(header.regular)?;
    writer.write_u8(header.dim_info)?;
    for s in &header.dim {
        writer.write_u16(*s)?;
    }
    writer.write_f32(header.intent_p1)?;
    writer.write_f32(header.intent_p2)?;
    writer.write_f32(header.intent_p3)?;
    writer.write_i16(header.intent_code)?;
    writer.write_i16(header.datatype)?;
    writer.write_i16(header.bitpix)?;
    writer.write_i16(header.slice_start)?;
    for f in &header.pixdim {
        writer.write_f32(*f)?;
    }
    writer.write_f32(header.vox_offset)?;
    writer.write_f32(header.scl_slope)?;
    writer.write_f32(header.scl_inter)?;
    writer.write_i16(header.slice_end)?;
    writer.write_u8(header.slice_code)?;
    writer.write_u8(header.xyzt_units)?;
    writer.write_f32(header.cal_max)?;
    writer.write_f32(header.cal_min)?;
    writer.write_f32(header.slice_duration)?;
    writer.write_f32(header.toffset)?;
    writer.write_i32(header.glmax)?;
    writer.write_i32(header.glmin)?;

    writer.write_all(&header.descrip)?;
    writer.write_all(&header.aux_file)?;
    writer.write_i16(header.qform_code)?;
    writer.write_i16(header.sform_code)?;
    for f in &[
        header.quatern_b,
        header.quatern_c,
        header.quatern_d,
        header.quatern_x,
        header.quatern_y,
        header.quatern_z,
    ] {
        writer.write_f32(*f)?;
    }
    for f in header.srow_x.iter().chain(&header.srow_y).chain(&header.srow_z) {
        writer.write_f32(*f)?;
    }
    writer.write_all(&header.intent_name)?;
    writer.write_all(&header.magic)?;
    Ok(())
}
