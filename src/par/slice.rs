//! Per-image records of a PAR file and the table holding them.

use super::definition::{ColumnKind, SliceSchema};
use crate::error::{ParRecError, Result};
use crate::typedef::SliceOrientation;
use num_traits::FromPrimitive;
use std::collections::BTreeSet;

/// A single value of a slice row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnValue {
    /// Value of an `integer` or `string` column.
    Int(i64),
    /// Value of a `float` column.
    Float(f64),
}

impl ColumnValue {
    /// The value as a real number.
    pub fn as_f64(&self) -> f64 {
        match *self {
            ColumnValue::Int(i) => i as f64,
            ColumnValue::Float(x) => x,
        }
    }

    /// The value as an integer, if it holds one.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            ColumnValue::Int(i) => Some(i),
            ColumnValue::Float(x) if x.fract() == 0. => Some(x as i64),
            ColumnValue::Float(_) => None,
        }
    }
}

/// Whether the slice numbers of a file grow or shrink along the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceOrder {
    /// First slice number smaller than the second one, or a single row.
    Ascending,
    /// First slice number larger than the second one.
    Descending,
}

/// How the rows of a file interleave volumes and slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeSliceOrder {
    /// All slices of a volume are listed before the next volume.
    Volume,
    /// A slice is listed for all volumes before the next slice.
    Slice,
    /// Any other ordering.
    Unknown,
}

/// Counts of the dimensions interleaved in one slice table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InterleavedCounts {
    /// Distinct scanning sequences.
    pub sequences: usize,
    /// Distinct image types.
    pub image_types: usize,
    /// Distinct echo numbers.
    pub echoes: usize,
    /// Distinct dynamic scan numbers.
    pub dynamics: usize,
    /// Distinct gradient orientation numbers.
    pub gradients: usize,
    /// Distinct diffusion b-value numbers.
    pub b_values: usize,
    /// Distinct (b-value number, gradient orientation number) pairs.
    pub diffusion_volumes: usize,
}

impl InterleavedCounts {
    /// Number of 3D volumes described by these counts.
    pub fn volumes(&self) -> usize {
        self.dynamics
            * self.diffusion_volumes
            * self.echoes
            * self.sequences.max(self.image_types)
    }
}

/// One row of the image information table.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceRecord {
    pub slice_number: i64,
    pub echo_number: i64,
    pub dynamic_scan_number: i64,
    pub cardiac_phase_number: i64,
    pub image_type_mr: i64,
    pub scanning_sequence: i64,
    pub index_in_rec_file: i64,
    /// Bits per sample in the REC file.
    pub image_pixel_size: i64,
    pub scan_percentage: i64,
    pub recon_resolution_x: usize,
    pub recon_resolution_y: usize,
    pub rescale_intercept: f64,
    pub rescale_slope: f64,
    pub scale_slope: f64,
    pub slice_thickness: f64,
    pub slice_gap: f64,
    pub slice_orientation: i64,
    pub pixel_spacing_x: f64,
    pub pixel_spacing_y: f64,
    pub echo_time: f64,
    pub dyn_scan_begin_time: f64,
    /// 1 when the file does not declare diffusion columns.
    pub diffusion_b_value_number: i64,
    /// 1 when the file does not declare diffusion columns.
    pub gradient_orientation_number: i64,
    pub diffusion_b_factor: f64,
    /// Diffusion gradient direction as (ap, fh, rl), zero when absent.
    pub diffusion: [f64; 3],
    /// The whole row, following the schema.
    pub values: Vec<ColumnValue>,
}

impl SliceRecord {
    /// Read a slice record from one data row.
    pub fn parse_row(schema: &SliceSchema, line: &str, line_number: usize) -> Result<SliceRecord> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let malformed = || {
            ParRecError::MalformedSliceRow(line_number, schema.len(), tokens.len(), line.trim().to_string())
        };
        if tokens.len() != schema.len() {
            return Err(malformed());
        }

        let mut values = Vec::with_capacity(tokens.len());
        for (token, column) in tokens.iter().zip(schema.columns()) {
            let value = match column.kind {
                ColumnKind::Int => match token.parse::<i64>() {
                    Ok(i) => ColumnValue::Int(i),
                    Err(_) => token
                        .parse::<f64>()
                        .ok()
                        .filter(|x| x.fract() == 0.)
                        .map(|x| ColumnValue::Int(x as i64))
                        .ok_or_else(malformed)?,
                },
                ColumnKind::Float => ColumnValue::Float(token.parse::<f64>().map_err(|_| malformed())?),
            };
            values.push(value);
        }

        let int = |name: &str| -> Result<i64> {
            let v = values[schema.require(name)?];
            v.as_i64()
                .ok_or_else(|| ParRecError::InvalidField(name.to_string(), "an integer"))
        };
        let int_or = |name: &str, default: i64| -> Result<i64> {
            match schema.index_of(name) {
                Some(_) => int(name),
                None => Ok(default),
            }
        };
        let real = |name: &str| -> Result<f64> { Ok(values[schema.require(name)?].as_f64()) };
        let real_or = |name: &str| -> f64 {
            schema.index_of(name).map(|i| values[i].as_f64()).unwrap_or(0.)
        };
        let resolution = |name: &str| -> Result<usize> {
            match int(name)? {
                r if r > 0 => Ok(r as usize),
                _ => Err(ParRecError::InvalidField(name.to_string(), "a positive integer")),
            }
        };

        let index_in_rec_file = int("index_in_rec_file")?;
        if index_in_rec_file < 0 {
            return Err(ParRecError::InvalidField(
                "index_in_rec_file".to_string(),
                "a non-negative integer",
            ));
        }

        Ok(SliceRecord {
            slice_number: int("slice_number")?,
            echo_number: int("echo_number")?,
            dynamic_scan_number: int("dynamic_scan_number")?,
            cardiac_phase_number: int("cardiac_phase_number")?,
            image_type_mr: int("image_type_mr")?,
            scanning_sequence: int("scanning_sequence")?,
            index_in_rec_file,
            image_pixel_size: int("image_pixel_size")?,
            scan_percentage: int("scan_percentage")?,
            recon_resolution_x: resolution("recon_resolution_x")?,
            recon_resolution_y: resolution("recon_resolution_y")?,
            rescale_intercept: real("rescale_intercept")?,
            rescale_slope: real("rescale_slope")?,
            scale_slope: real("scale_slope")?,
            slice_thickness: real("slice_thickness")?,
            slice_gap: real("slice_gap")?,
            slice_orientation: int("slice_orientation")?,
            pixel_spacing_x: real("pixel_spacing_x")?,
            pixel_spacing_y: real("pixel_spacing_y")?,
            echo_time: real_or("echo_time"),
            dyn_scan_begin_time: real("dyn_scan_begin_time")?,
            diffusion_b_value_number: int_or("diffusion_b_value_number", 1)?,
            gradient_orientation_number: int_or("gradient_orientation_number", 1)?,
            diffusion_b_factor: real_or("diffusion_b_factor"),
            diffusion: [
                real_or("diffusion_ap"),
                real_or("diffusion_fh"),
                real_or("diffusion_rl"),
            ],
            values,
        })
    }

    /// The slice orientation as a validated enum.
    pub fn orientation(&self) -> Result<SliceOrientation> {
        SliceOrientation::from_i64(self.slice_orientation)
            .ok_or(ParRecError::UnsupportedOrientation(self.slice_orientation))
    }

    /// Number of bytes taken by one sample in the REC file.
    pub fn bytes_per_sample(&self) -> Result<usize> {
        match self.image_pixel_size {
            8 | 16 | 32 => Ok(self.image_pixel_size as usize / 8),
            bits => Err(ParRecError::UnsupportedBitDepth(bits)),
        }
    }

    /// Number of samples in this slice.
    pub fn sample_count(&self) -> usize {
        self.recon_resolution_x * self.recon_resolution_y
    }

    /// Byte offset of this slice in the REC file.
    pub fn rec_offset(&self) -> Result<u64> {
        Ok(self.index_in_rec_file as u64 * (self.sample_count() * self.bytes_per_sample()?) as u64)
    }
}

/// The ordered collection of slice records read from a PAR file, along
/// with the schema they follow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliceTable {
    schema: SliceSchema,
    records: Vec<SliceRecord>,
}

impl SliceTable {
    /// Create an empty table with the given schema.
    pub fn new(schema: SliceSchema) -> Self {
        SliceTable {
            schema,
            records: Vec::new(),
        }
    }

    /// Parse a data row and append it to the table.
    pub fn push_row(&mut self, line: &str, line_number: usize) -> Result<()> {
        let record = SliceRecord::parse_row(&self.schema, line, line_number)?;
        self.records.push(record);
        Ok(())
    }

    /// The schema shared by all records.
    pub fn schema(&self) -> &SliceSchema {
        &self.schema
    }

    /// All records in file order.
    pub fn records(&self) -> &[SliceRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The first record in file order.
    pub fn first(&self) -> Option<&SliceRecord> {
        self.records.first()
    }

    /// The last record in file order.
    pub fn last(&self) -> Option<&SliceRecord> {
        self.records.last()
    }

    /// Value of an arbitrary column of a record, by column name.
    pub fn value(&self, record: &SliceRecord, column: &str) -> Option<ColumnValue> {
        self.schema.index_of(column).map(|i| record.values[i])
    }

    /// Number of distinct keys over all records.
    pub fn distinct<K, F>(&self, key: F) -> usize
    where
        K: Ord,
        F: Fn(&SliceRecord) -> K,
    {
        self.records.iter().map(key).collect::<BTreeSet<_>>().len()
    }

    /// Number of distinct real values over all records. Values are
    /// compared exactly.
    pub fn distinct_reals<F>(&self, value: F) -> usize
    where
        F: Fn(&SliceRecord) -> f64,
    {
        self.distinct(|r| value(r).to_bits())
    }

    /// Whether the scaling coefficients differ between records.
    pub fn has_multiple_scaling_factors(&self) -> bool {
        self.distinct_reals(|r| r.scale_slope) > 1
            || self.distinct_reals(|r| r.rescale_slope) > 1
            || self.distinct_reals(|r| r.rescale_intercept) > 1
    }

    /// Ordering of slice numbers, judged from the first two records.
    pub fn slice_order(&self) -> SliceOrder {
        match (self.records.get(0), self.records.get(1)) {
            (Some(a), Some(b)) if a.slice_number > b.slice_number => SliceOrder::Descending,
            _ => SliceOrder::Ascending,
        }
    }

    /// Classify the interleaving of volumes and slices in file order.
    pub fn volume_slice_order(&self) -> VolumeSliceOrder {
        let in_order = |key: &dyn Fn(&SliceRecord) -> (i64, i64)| {
            let mut idx: Vec<usize> = (0..self.records.len()).collect();
            idx.sort_by_key(|&i| key(&self.records[i]));
            idx.iter().enumerate().all(|(pos, &i)| pos == i)
        };
        if in_order(&|r| (r.dynamic_scan_number, r.slice_number)) {
            VolumeSliceOrder::Volume
        } else if in_order(&|r| (r.slice_number, r.dynamic_scan_number)) {
            VolumeSliceOrder::Slice
        } else {
            VolumeSliceOrder::Unknown
        }
    }

    /// Counts of the interleaved dimensions.
    pub fn counts(&self) -> InterleavedCounts {
        InterleavedCounts {
            sequences: self.distinct(|r| r.scanning_sequence),
            image_types: self.distinct(|r| r.image_type_mr),
            echoes: self.distinct(|r| r.echo_number),
            dynamics: self.distinct(|r| r.dynamic_scan_number),
            gradients: self.distinct(|r| r.gradient_orientation_number),
            b_values: self.distinct(|r| r.diffusion_b_value_number),
            diffusion_volumes: self
                .distinct(|r| (r.diffusion_b_value_number, r.gradient_orientation_number)),
        }
    }

    /// Indices of the records in output order.
    ///
    /// From slowest to fastest varying: scanning sequence, image type, echo,
    /// gradient orientation, b-value number, dynamic, slice. With more than
    /// two b-values the b-value number varies slower than the gradient
    /// orientation. The sort is stable, so equal keys keep their file order.
    pub fn output_order(&self) -> Vec<usize> {
        let multi_shell = self.distinct(|r| r.diffusion_b_value_number) > 2;
        let mut idx: Vec<usize> = (0..self.records.len()).collect();
        idx.sort_by_key(|&i| {
            let r = &self.records[i];
            let (outer, inner) = if multi_shell {
                (r.diffusion_b_value_number, r.gradient_orientation_number)
            } else {
                (r.gradient_orientation_number, r.diffusion_b_value_number)
            };
            (
                r.scanning_sequence,
                r.image_type_mr,
                r.echo_number,
                outer,
                inner,
                r.dynamic_scan_number,
                r.slice_number,
            )
        });
        idx
    }
}
