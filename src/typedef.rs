//! Enumerations of the header codes: the NIfTI-1 codes the converter reads
//! and writes, and the slice orientations of PAR files. Each one converts
//! from its primitive code through `FromPrimitive`.

/// Voxel data type, as stored in the `datatype` header field.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum NiftiType {
    /// `u8`, for 8-bit REC samples.
    Uint8 = 2,
    /// `i16`, for 16-bit REC samples.
    Int16 = 4,
    /// `i32`.
    Int32 = 8,
    /// `f32`, for 32-bit REC samples and rescaled voxels.
    Float32 = 16,
    /// `f64`.
    Float64 = 64,
    /// `i8`.
    Int8 = 256,
    /// `u16`.
    Uint16 = 512,
    /// `u32`.
    Uint32 = 768,
}

impl NiftiType {
    /// Size of one voxel, in bytes.
    pub fn size_of(&self) -> usize {
        use NiftiType::*;
        match *self {
            Int8 | Uint8 => 1,
            Int16 | Uint16 => 2,
            Int32 | Uint32 | Float32 => 4,
            Float64 => 8,
        }
    }

    /// The output data type for samples stored with the given number of
    /// bits in a REC file.
    ///
    /// 32-bit samples are promoted to `Float32`, following the conventions
    /// of the scanner export tools.
    pub fn from_rec_bits(bits: i64) -> Option<NiftiType> {
        match bits {
            8 => Some(NiftiType::Uint8),
            16 => Some(NiftiType::Int16),
            32 => Some(NiftiType::Float32),
            64 => Some(NiftiType::Float64),
            _ => None,
        }
    }
}

/// Unit of the voxel spacing or of the repetition time. Spatial units
/// take the low three bits of `xyzt_units`, temporal units the next three.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum Unit {
    /// No unit given.
    Unknown = 0,
    /// m
    Meter = 1,
    /// mm, used for the voxel spacing.
    Mm = 2,
    /// µm
    Micron = 3,
    /// s, used for the repetition time.
    Sec = 8,
    /// ms
    Msec = 16,
    /// µs
    Usec = 24,
}

/// Meaning of the world coordinates of a transform (`qform_code` and
/// `sform_code`).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum XForm {
    /// The transform is not to be used.
    Unknown = 0,
    /// Scanner coordinates; the converter's sform.
    ScannerAnat = 1,
    /// Registered to another image.
    AlignedAnat = 2,
    /// Talairach space.
    Talairach = 3,
    /// MNI 152 space.
    Mni152 = 4,
}

/// Slice orientation of a scan, as coded in the `slice orientation`
/// column of a PAR image definition.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum SliceOrientation {
    /// TRA
    Transverse = 1,
    /// SAG
    Sagittal = 2,
    /// COR
    Coronal = 3,
}

impl SliceOrientation {
    /// The short label used by the scanner software.
    pub fn label(&self) -> &'static str {
        match *self {
            SliceOrientation::Transverse => "TRA",
            SliceOrientation::Sagittal => "SAG",
            SliceOrientation::Coronal => "COR",
        }
    }
}
