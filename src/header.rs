//! This module defines the `NiftiHeader` struct, the 348-byte record
//! which opens every NIfTI-1 file, and `NiftiHeaderBuilder`, which fills it
//! in from a parsed PAR file.

use crate::affine::{calc_angulation, mat44_to_quatern, quatern_to_mat44, Affine4, QuaternParams};
use crate::error::{ParRecError, Result};
use crate::extension::Extender;
use crate::par::ParFile;
use crate::typedef::{NiftiType, Unit, XForm};
use crate::util::is_gz_file;
use byteordered::{ByteOrdered, Endian, Endianness};
use flate2::bufread::GzDecoder;
use num_traits::FromPrimitive;
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Magic code of a header stored apart from its data.
pub const MAGIC_CODE_NI1: &[u8; 4] = b"ni1\0";
/// Magic code of a single file image, header and data together.
pub const MAGIC_CODE_NIP1: &[u8; 4] = b"n+1\0";
/// Size of the NIfTI-1 header record, in bytes.
pub const HEADER_SIZE: usize = 348;
/// Offset of the voxel data in a single file without extensions.
pub const VOX_OFFSET: usize = 352;

/// Name of the converter, as written in the description field.
const TOOL_NAME: &str = "parrec2nii";
/// Version of the converter, as written in the description field.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A NIfTI-1 header, field by field in file order.
///
/// Fields the converter does not use keep their zero value, and the
/// legacy ANALYZE text fields are filled with spaces.
///
/// ```no_run
/// use parrec2nii::NiftiHeader;
/// # use parrec2nii::Result;
/// # fn run() -> Result<()> {
/// let header = NiftiHeader::from_file("NIFTI/T1W.nii.gz")?;
/// println!("{:?} {}", header.dim, header.description());
/// # Ok(())
/// # }
/// ```
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct NiftiHeader {
    /// Always 348.
    pub sizeof_hdr: i32,
    /// ANALYZE leftover.
    pub data_type: [u8; 10],
    /// ANALYZE leftover.
    pub db_name: [u8; 18],
    /// ANALYZE leftover.
    pub extents: i32,
    /// ANALYZE leftover.
    pub session_error: i16,
    /// `b'r'` in converted files.
    pub regular: u8,
    pub dim_info: u8,
    /// Rank, then the size of each axis: x, y, slices, volumes.
    pub dim: [u16; 8],
    pub intent_p1: f32,
    pub intent_p2: f32,
    pub intent_p3: f32,
    pub intent_code: i16,
    /// A `NiftiType` code.
    pub datatype: i16,
    /// Bits per voxel, following `datatype`.
    pub bitpix: i16,
    pub slice_start: i16,
    /// qfac, then the voxel size and the repetition time.
    pub pixdim: [f32; 8],
    /// Byte offset of the voxels in a single file.
    pub vox_offset: f32,
    /// Slope applied by readers to the stored values.
    pub scl_slope: f32,
    /// Intercept applied by readers to the stored values.
    pub scl_inter: f32,
    pub slice_end: i16,
    pub slice_code: u8,
    /// Spatial and temporal `Unit` codes, or-ed together.
    pub xyzt_units: u8,
    pub cal_max: f32,
    pub cal_min: f32,
    pub slice_duration: f32,
    pub toffset: f32,
    /// ANALYZE leftover; 255 in converted files.
    pub glmax: i32,
    /// ANALYZE leftover.
    pub glmin: i32,

    /// Free text, space padded.
    pub descrip: [u8; 80],
    pub aux_file: [u8; 24],
    /// `XForm` code of the quaternion transform.
    pub qform_code: i16,
    /// `XForm` code of the `srow_*` transform.
    pub sform_code: i16,
    pub quatern_b: f32,
    pub quatern_c: f32,
    pub quatern_d: f32,
    pub quatern_x: f32,
    pub quatern_y: f32,
    pub quatern_z: f32,

    /// Rows of the voxel to world matrix.
    pub srow_x: [f32; 4],
    pub srow_y: [f32; 4],
    pub srow_z: [f32; 4],

    pub intent_name: [u8; 16],

    /// Magic code. Must be `b"ni1\0"` or `b"n+1\0"`
    pub magic: [u8; 4],

    /// Byte order of the header when it was read. Not serialized.
    pub endianness: Endianness,
}

impl Default for NiftiHeader {
    fn default() -> NiftiHeader {
        NiftiHeader {
            sizeof_hdr: HEADER_SIZE as i32,
            data_type: [0; 10],
            db_name: [0; 18],
            extents: 0,
            session_error: 0,
            regular: 0,
            dim_info: 0,
            dim: [1, 0, 0, 0, 0, 0, 0, 0],
            intent_p1: 0.,
            intent_p2: 0.,
            intent_p3: 0.,
            intent_code: 0,
            datatype: 0,
            bitpix: 0,
            slice_start: 0,
            pixdim: [0.; 8],
            vox_offset: VOX_OFFSET as f32,
            scl_slope: 0.,
            scl_inter: 0.,
            slice_end: 0,
            slice_code: 0,
            xyzt_units: 0,
            cal_max: 0.,
            cal_min: 0.,
            slice_duration: 0.,
            toffset: 0.,
            glmax: 0,
            glmin: 0,

            descrip: [0; 80],
            aux_file: [0; 24],
            qform_code: 0,
            sform_code: 0,
            quatern_b: 0.,
            quatern_c: 0.,
            quatern_d: 0.,
            quatern_x: 0.,
            quatern_y: 0.,
            quatern_z: 0.,

            srow_x: [0.; 4],
            srow_y: [0.; 4],
            srow_z: [0.; 4],

            intent_name: [0; 16],

            magic: *MAGIC_CODE_NIP1,

            endianness: Endianness::native(),
        }
    }
}

impl NiftiHeader {
    /// Retrieve a NIFTI header, along with its byte order, from a file in the file system.
    /// If the file's name ends with ".gz", the file is assumed to need GZip decoding.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<NiftiHeader> {
        NiftiHeader::from_reader(open_nifti(path.as_ref())?)
    }

    /// Retrieve a NIFTI header and the extender frame which follows it.
    pub fn from_file_with_extender<P: AsRef<Path>>(path: P) -> Result<(NiftiHeader, Extender)> {
        let mut input = open_nifti(path.as_ref())?;
        let header = NiftiHeader::from_reader(&mut input)?;
        let extender = Extender::read_from(&mut input)?;
        Ok((header, extender))
    }

    /// Read a NIfTI-1 header, along with its byte order, from the given byte stream.
    /// It is assumed that the input is currently at the start of the
    /// NIFTI header.
    pub fn from_reader<S: Read>(input: S) -> Result<NiftiHeader> {
        parse_header_1(input)
    }

    /// Get the data type as a validated enum.
    pub fn data_type(&self) -> Result<NiftiType> {
        FromPrimitive::from_i16(self.datatype)
            .ok_or(ParRecError::InvalidCode("datatype", self.datatype))
    }

    /// Get the spatial units type as a validated unit enum.
    pub fn xyzt_to_space(&self) -> Result<Unit> {
        let space_code = self.xyzt_units & 0o0007;
        FromPrimitive::from_u8(space_code)
            .ok_or(ParRecError::InvalidCode("xyzt units (space)", i16::from(space_code)))
    }

    /// Get the time units type as a validated unit enum.
    pub fn xyzt_to_time(&self) -> Result<Unit> {
        let time_code = self.xyzt_units & 0o0070;
        FromPrimitive::from_u8(time_code)
            .ok_or(ParRecError::InvalidCode("xyzt units (time)", i16::from(time_code)))
    }

    /// Get the xyzt units type as a validated pair of space and time unit enum.
    pub fn xyzt_units(&self) -> Result<(Unit, Unit)> {
        Ok((self.xyzt_to_space()?, self.xyzt_to_time()?))
    }

    /// Get the qform coordinate mapping method as a validated enum.
    pub fn qform(&self) -> Result<XForm> {
        FromPrimitive::from_i16(self.qform_code)
            .ok_or(ParRecError::InvalidCode("qform", self.qform_code))
    }

    /// Get the sform coordinate mapping method as a validated enum.
    pub fn sform(&self) -> Result<XForm> {
        FromPrimitive::from_i16(self.sform_code)
            .ok_or(ParRecError::InvalidCode("sform", self.sform_code))
    }

    /// The voxel to world transform stored in the `srow_*` fields.
    pub fn sform_affine(&self) -> Affine4 {
        let mut out = Affine4::identity();
        for (i, row) in [self.srow_x, self.srow_y, self.srow_z].iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                out[(i, j)] = f64::from(*v);
            }
        }
        out
    }

    /// The quaternion parameters of the qform.
    pub fn quatern_params(&self) -> QuaternParams {
        QuaternParams {
            bcd: [
                f64::from(self.quatern_b),
                f64::from(self.quatern_c),
                f64::from(self.quatern_d),
            ],
            offset: [
                f64::from(self.quatern_x),
                f64::from(self.quatern_y),
                f64::from(self.quatern_z),
            ],
            qfac: f64::from(self.pixdim[0]),
        }
    }

    /// The voxel to world transform described by the quaternion fields
    /// and the grid spacings, regardless of `qform_code`.
    pub fn qform_affine(&self) -> Affine4 {
        let voxel_size = [
            f64::from(self.pixdim[1]),
            f64::from(self.pixdim[2]),
            f64::from(self.pixdim[3]),
        ];
        quatern_to_mat44(&self.quatern_params(), voxel_size)
    }

    /// Number of voxels in the data array. Fails if it does not fit in a
    /// `usize`.
    pub fn voxel_count(&self) -> Result<usize> {
        let ndim = usize::from(self.dim[0]).min(7);
        self.dim[1..=ndim]
            .iter()
            .try_fold(1usize, |n, d| n.checked_mul(usize::from(*d)))
            .ok_or(ParRecError::InvalidHeader("voxel count overflows"))
    }

    /// Number of bytes in the data array.
    pub fn data_size(&self) -> Result<usize> {
        self.voxel_count()?
            .checked_mul(self.bitpix.max(0) as usize / 8)
            .ok_or(ParRecError::InvalidHeader("data size overflows"))
    }

    /// The description field as text, without its padding.
    pub fn description(&self) -> String {
        String::from_utf8_lossy(&self.descrip)
            .trim_end_matches(|c| c == ' ' || c == '\0')
            .to_string()
    }

    /// Set the `descrip` field, cutting the text at 80 bytes and padding
    /// it with spaces.
    pub fn set_description_str<T>(&mut self, description: T)
    where
        T: AsRef<str>,
    {
        let bytes = description.as_ref().as_bytes();
        let len = bytes.len().min(self.descrip.len());
        self.descrip = [b' '; 80];
        self.descrip[..len].copy_from_slice(&bytes[..len]);
    }
}

fn open_nifti(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).map_err(|e| ParRecError::FileRead(path.to_owned(), e))?;
    let file = BufReader::new(file);
    if is_gz_file(path) {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

fn parse_header_1<S: Read>(input: S) -> Result<NiftiHeader> {
    let mut h = NiftiHeader::default();

    // try the system's native endianness first
    let mut input = ByteOrdered::native(input);

    h.sizeof_hdr = input.read_i32()?;
    input.read_exact(&mut h.data_type)?;
    input.read_exact(&mut h.db_name)?;
    h.extents = input.read_i32()?;
    h.session_error = input.read_i16()?;
    h.regular = input.read_u8()?;
    h.dim_info = input.read_u8()?;
    h.dim[0] = input.read_u16()?;

    if h.dim[0] > 7 {
        h.endianness = Endianness::native().to_opposite();

        // swap bytes read so far, continue with the opposite endianness
        h.sizeof_hdr = h.sizeof_hdr.swap_bytes();
        h.extents = h.extents.swap_bytes();
        h.session_error = h.session_error.swap_bytes();
        h.dim[0] = h.dim[0].swap_bytes();
        parse_header_2(h, input.into_opposite())
    } else {
        // all is well
        h.endianness = Endianness::native();
        parse_header_2(h, input)
    }
}

/// second part of header parsing
fn parse_header_2<S, E>(mut h: NiftiHeader, mut input: ByteOrdered<S, E>) -> Result<NiftiHeader>
where
    S: Read,
    E: Endian,
{
    for v in &mut h.dim[1..] {
        *v = input.read_u16()?;
    }
    h.intent_p1 = input.read_f32()?;
    h.intent_p2 = input.read_f32()?;
    h.intent_p3 = input.read_f32()?;
    h.intent_code = input.read_i16()?;
    h.datatype = input.read_i16()?;
    h.bitpix = input.read_i16()?;
    h.slice_start = input.read_i16()?;
    for v in &mut h.pixdim {
        *v = input.read_f32()?;
    }
    h.vox_offset = input.read_f32()?;
    h.scl_slope = input.read_f32()?;
    h.scl_inter = input.read_f32()?;
    h.slice_end = input.read_i16()?;
    h.slice_code = input.read_u8()?;
    h.xyzt_units = input.read_u8()?;
    h.cal_max = input.read_f32()?;
    h.cal_min = input.read_f32()?;
    h.slice_duration = input.read_f32()?;
    h.toffset = input.read_f32()?;
    h.glmax = input.read_i32()?;
    h.glmin = input.read_i32()?;

    input.read_exact(&mut h.descrip)?;
    input.read_exact(&mut h.aux_file)?;
    h.qform_code = input.read_i16()?;
    h.sform_code = input.read_i16()?;
    h.quatern_b = input.read_f32()?;
    h.quatern_c = input.read_f32()?;
    h.quatern_d = input.read_f32()?;
    h.quatern_x = input.read_f32()?;
    h.quatern_y = input.read_f32()?;
    h.quatern_z = input.read_f32()?;
    for v in h
        .srow_x
        .iter_mut()
        .chain(h.srow_y.iter_mut())
        .chain(h.srow_z.iter_mut())
    {
        *v = input.read_f32()?;
    }
    input.read_exact(&mut h.intent_name)?;
    input.read_exact(&mut h.magic)?;

    if h.sizeof_hdr != HEADER_SIZE as i32 {
        Err(ParRecError::InvalidHeader("header size is not 348"))
    } else if &h.magic != MAGIC_CODE_NI1 && &h.magic != MAGIC_CODE_NIP1 {
        Err(ParRecError::InvalidHeader("unknown magic code"))
    } else {
        Ok(h)
    }
}

/// Builds the header of the NIfTI file converted from a PAR file.
///
/// ```no_run
/// use parrec2nii::{NiftiHeaderBuilder, ParFile};
/// # use parrec2nii::Result;
/// # fn run() -> Result<()> {
/// let par = ParFile::from_file("scan.PAR")?;
/// let header = NiftiHeaderBuilder::new(&par)
///     .angulation(true)
///     .rescale(false)
///     .build()?;
/// assert_eq!(header.sform_code, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct NiftiHeaderBuilder<'a> {
    par: &'a ParFile,
    angulation: bool,
    rescale: bool,
    volumes: Option<usize>,
}

impl<'a> NiftiHeaderBuilder<'a> {
    /// Start a header for the given PAR file, with angulation and rescaling
    /// enabled.
    pub fn new(par: &'a ParFile) -> Self {
        NiftiHeaderBuilder {
            par,
            angulation: true,
            rescale: true,
            volumes: None,
        }
    }

    /// Whether the scanner angulation and off-centre go into the transform.
    pub fn angulation(mut self, angulation: bool) -> Self {
        self.angulation = angulation;
        self
    }

    /// Whether the PAR rescale slope and intercept go into `scl_slope` and
    /// `scl_inter`.
    pub fn rescale(mut self, rescale: bool) -> Self {
        self.rescale = rescale;
        self
    }

    /// Number of volumes along the fourth dimension. Defaults to the
    /// number of volumes of the PAR file.
    pub fn volumes(mut self, volumes: usize) -> Self {
        self.volumes = Some(volumes);
        self
    }

    /// Fill in the header.
    pub fn build(&self) -> Result<NiftiHeader> {
        let par = self.par;
        let angulation = calc_angulation(&par.geometry, self.angulation);
        let quatern = mat44_to_quatern(&angulation.affine);

        let datatype = if par.multiple_scaling {
            NiftiType::Float32
        } else {
            NiftiType::from_rec_bits(par.bits).ok_or(ParRecError::UnsupportedBitDepth(par.bits))?
        };

        let [nx, ny, nz] = par.geometry.dim;
        let volumes = self.volumes.unwrap_or(par.number_of_volumes).max(1);
        let dim = [
            4,
            dim_u16("recon_resolution_x", nx)?,
            dim_u16("recon_resolution_y", ny)?,
            dim_u16("max_number_of_slices_locations", nz)?,
            dim_u16("number_of_volumes", volumes)?,
            1,
            1,
            1,
        ];

        let (scl_slope, scl_inter) = if self.rescale && !par.multiple_scaling {
            (par.rescale.slope as f32, par.rescale.intercept as f32)
        } else {
            (1., 0.)
        };

        let [vx, vy, vz] = angulation.voxel_size;
        let pixdim = [
            quatern.qfac as f32,
            vx as f32,
            vy as f32,
            vz as f32,
            par.repetition_time.unwrap_or(1.) as f32,
            1.,
            1.,
            1.,
        ];

        let row = |i: usize| -> [f32; 4] {
            let mut out = [0.; 4];
            for (j, v) in out.iter_mut().enumerate() {
                *v = angulation.affine[(i, j)] as f32;
            }
            out
        };

        let mut header = NiftiHeader {
            data_type: [b' '; 10],
            db_name: [b' '; 18],
            regular: b'r',
            dim,
            datatype: datatype as i16,
            bitpix: (datatype.size_of() * 8) as i16,
            pixdim,
            scl_slope,
            scl_inter,
            xyzt_units: Unit::Mm as u8 | Unit::Sec as u8,
            glmax: 255,
            glmin: 0,
            aux_file: [b' '; 24],
            // the quaternion is kept for reference, readers rely on the sform
            qform_code: XForm::Unknown as i16,
            sform_code: XForm::ScannerAnat as i16,
            quatern_b: quatern.bcd[0] as f32,
            quatern_c: quatern.bcd[1] as f32,
            quatern_d: quatern.bcd[2] as f32,
            quatern_x: quatern.offset[0] as f32,
            quatern_y: quatern.offset[1] as f32,
            quatern_z: quatern.offset[2] as f32,
            srow_x: row(0),
            srow_y: row(1),
            srow_z: row(2),
            intent_name: [b' '; 16],
            magic: *MAGIC_CODE_NIP1,
            ..NiftiHeader::default()
        };
        header.set_description_str(format!(
            "{}; converted by {} {}",
            par.protocol_name(),
            TOOL_NAME,
            VERSION
        ));
        Ok(header)
    }
}

fn dim_u16(name: &str, value: usize) -> Result<u16> {
    u16::try_from(value)
        .map_err(|_| ParRecError::InvalidField(name.to_string(), "a dimension below 65536"))
}
