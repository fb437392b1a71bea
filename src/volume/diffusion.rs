//! Diffusion weighting of the output volumes, for the bval/bvec files.
use super::layout::VolumeLayout;
use crate::par::SliceTable;

/// The b-value and gradient direction of every output volume.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffusionTable {
    /// b-values, in s/mm².
    pub bvals: Vec<f64>,
    /// Gradient directions, as (ap, fh, rl).
    pub directions: Vec<[f64; 3]>,
}

impl DiffusionTable {
    /// Collect the diffusion parameters of the first slice of each volume.
    pub fn from_layout(table: &SliceTable, layout: &VolumeLayout) -> Self {
        let records = table.records();
        let mut out = DiffusionTable::default();
        for &first in layout.volumes().iter().filter_map(|v| v.first()) {
            let record = &records[first];
            out.bvals.push(record.diffusion_b_factor);
            out.directions.push(record.diffusion);
        }
        out
    }

    /// Number of volumes.
    pub fn len(&self) -> usize {
        self.bvals.len()
    }

    /// Whether the table holds no volume.
    pub fn is_empty(&self) -> bool {
        self.bvals.is_empty()
    }

    /// Contents of the bval file: one line with a value per volume.
    pub fn bval_text(&self) -> String {
        line(self.bvals.iter().copied())
    }

    /// Contents of the bvec file: the rl, ap and fh components on one line
    /// each. The ap component is negated.
    pub fn bvec_text(&self) -> String {
        let rl = line(self.directions.iter().map(|d| d[2]));
        // subtracting from zero keeps negated zeros positive
        let ap = line(self.directions.iter().map(|d| 0. - d[0]));
        let fh = line(self.directions.iter().map(|d| d[1]));
        format!("{}{}{}", rl, ap, fh)
    }
}

fn line<I>(values: I) -> String
where
    I: IntoIterator<Item = f64>,
{
    let mut out = values
        .into_iter()
        .map(|v| format!("{:.6}", v))
        .collect::<Vec<_>>()
        .join(" ");
    out.push('\n');
    out
}
