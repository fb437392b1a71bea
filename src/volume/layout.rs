//! Grouping of sorted slice records into output volumes.
use crate::par::{SliceRecord, SliceTable};

/// Fields of a record which identify the volume it belongs to, in output
/// order precedence.
fn volume_key(r: &SliceRecord) -> (i64, i64, i64, i64, i64, i64) {
    (
        r.scanning_sequence,
        r.image_type_mr,
        r.echo_number,
        r.gradient_orientation_number,
        r.diffusion_b_value_number,
        r.dynamic_scan_number,
    )
}

/// The record indices of every complete output volume, in output order.
///
/// Records are taken in [`SliceTable::output_order`] and cut into runs
/// sharing the same sequence, type, echo, diffusion and dynamic numbers.
/// Each run gives as many volumes as it holds full sets of slices; the
/// remaining records are dropped.
///
/// [`SliceTable::output_order`]: ../../par/slice/struct.SliceTable.html#method.output_order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeLayout {
    volumes: Vec<Vec<usize>>,
    dropped: usize,
}

impl VolumeLayout {
    /// Lay out the records of a table in volumes of `slices_per_volume`.
    pub fn new(table: &SliceTable, slices_per_volume: usize) -> Self {
        let records = table.records();
        let mut volumes = Vec::new();
        let mut dropped = 0;
        let mut run: Vec<usize> = Vec::new();

        let mut flush = |run: &mut Vec<usize>| {
            if slices_per_volume == 0 {
                dropped += run.len();
            } else {
                let mut chunks = run.chunks_exact(slices_per_volume);
                volumes.extend(chunks.by_ref().map(|c| c.to_vec()));
                dropped += chunks.remainder().len();
            }
            run.clear();
        };

        for i in table.output_order() {
            if let Some(&last) = run.last() {
                if volume_key(&records[last]) != volume_key(&records[i]) {
                    flush(&mut run);
                }
            }
            run.push(i);
        }
        flush(&mut run);

        VolumeLayout { volumes, dropped }
    }

    /// Move the volumes with b-value number 1 in front of all others,
    /// keeping the relative order within both groups. Returns whether the
    /// order changed.
    pub fn revert_b0(&mut self, table: &SliceTable) -> bool {
        let records = table.records();
        let is_b0 = |v: &Vec<usize>| {
            v.first()
                .map(|&i| records[i].diffusion_b_value_number == 1)
                .unwrap_or(false)
        };
        let before = self.volumes.clone();
        let (b0, rest): (Vec<_>, Vec<_>) = self.volumes.drain(..).partition(is_b0);
        self.volumes = b0;
        self.volumes.extend(rest);
        self.volumes != before
    }

    /// Record indices per volume.
    pub fn volumes(&self) -> &[Vec<usize>] {
        &self.volumes
    }

    /// Number of complete volumes.
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// Whether no complete volume was found.
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Number of records left out of any volume.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// All record indices, volume after volume.
    pub fn slices(&self) -> impl Iterator<Item = usize> + '_ {
        self.volumes.iter().flatten().copied()
    }
}
