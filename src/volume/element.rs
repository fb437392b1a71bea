//! This module defines the sample types found in REC files and the slice
//! buffers handed over to the NIfTI writer.
use crate::typedef::NiftiType;
use byteordered::{ByteOrdered, Endian};
use ndarray::{Array2, Axis};
use num_traits::cast::AsPrimitive;
use std::io::{Read, Result as IoResult, Write};

/// A sample type which can be read from a REC file.
pub trait RecElement: 'static + Copy + AsPrimitive<f64> {
    /// Width of the sample in bits, as declared in `image pixel size`.
    const BITS: i64;

    /// Read a single sample from the source.
    fn read_one<S, E>(source: &mut ByteOrdered<S, E>) -> IoResult<Self>
    where
        S: Read,
        E: Endian;

    /// Wrap a decoded slice in the buffer kind written for this sample type.
    fn into_slice_data(slice: Array2<Self>) -> SliceData;

    /// Read `count` consecutive samples.
    fn read_many<S, E>(mut source: ByteOrdered<S, E>, count: usize) -> IoResult<Vec<Self>>
    where
        S: Read,
        E: Endian,
    {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(Self::read_one(&mut source)?);
        }
        Ok(out)
    }
}

impl RecElement for u8 {
    const BITS: i64 = 8;

    fn read_one<S, E>(source: &mut ByteOrdered<S, E>) -> IoResult<Self>
    where
        S: Read,
        E: Endian,
    {
        source.read_u8()
    }

    fn into_slice_data(slice: Array2<Self>) -> SliceData {
        SliceData::Uint8(slice)
    }
}

impl RecElement for i16 {
    const BITS: i64 = 16;

    fn read_one<S, E>(source: &mut ByteOrdered<S, E>) -> IoResult<Self>
    where
        S: Read,
        E: Endian,
    {
        source.read_i16()
    }

    fn into_slice_data(slice: Array2<Self>) -> SliceData {
        SliceData::Int16(slice)
    }
}

impl RecElement for i32 {
    const BITS: i64 = 32;

    fn read_one<S, E>(source: &mut ByteOrdered<S, E>) -> IoResult<Self>
    where
        S: Read,
        E: Endian,
    {
        source.read_i32()
    }

    // 32-bit samples are written as float32
    fn into_slice_data(slice: Array2<Self>) -> SliceData {
        SliceData::Float32(slice.mapv(|v| v as f32))
    }
}

/// One decoded slice, indexed as `[x, y]`, in the output data type.
#[derive(Debug, Clone, PartialEq)]
pub enum SliceData {
    /// Unsigned 8-bit voxels.
    Uint8(Array2<u8>),
    /// Signed 16-bit voxels.
    Int16(Array2<i16>),
    /// Single precision voxels.
    Float32(Array2<f32>),
}

impl SliceData {
    /// The NIfTI data type of the voxels.
    pub fn data_type(&self) -> NiftiType {
        match self {
            SliceData::Uint8(_) => NiftiType::Uint8,
            SliceData::Int16(_) => NiftiType::Int16,
            SliceData::Float32(_) => NiftiType::Float32,
        }
    }

    /// The slice shape, as `(x, y)`.
    pub fn dim(&self) -> (usize, usize) {
        match self {
            SliceData::Uint8(a) => a.dim(),
            SliceData::Int16(a) => a.dim(),
            SliceData::Float32(a) => a.dim(),
        }
    }

    /// Fetch a single voxel as a double precision value.
    pub fn get_f64(&self, x: usize, y: usize) -> Option<f64> {
        match self {
            SliceData::Uint8(a) => a.get((x, y)).map(|v| f64::from(*v)),
            SliceData::Int16(a) => a.get((x, y)).map(|v| f64::from(*v)),
            SliceData::Float32(a) => a.get((x, y)).map(|v| f64::from(*v)),
        }
    }

    /// Reverse the y axis.
    pub fn flip_y(&mut self) {
        match self {
            SliceData::Uint8(a) => a.invert_axis(Axis(1)),
            SliceData::Int16(a) => a.invert_axis(Axis(1)),
            SliceData::Float32(a) => a.invert_axis(Axis(1)),
        }
    }

    /// Write the voxels with the x index varying fastest.
    pub fn write_to<W, E>(&self, sink: &mut ByteOrdered<W, E>) -> IoResult<()>
    where
        W: Write,
        E: Endian,
    {
        match self {
            SliceData::Uint8(a) => a.t().iter().try_for_each(|v| sink.write_u8(*v)),
            SliceData::Int16(a) => a.t().iter().try_for_each(|v| sink.write_i16(*v)),
            SliceData::Float32(a) => a.t().iter().try_for_each(|v| sink.write_f32(*v)),
        }
    }
}
