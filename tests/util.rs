//! Synthetic PAR/REC pairs for the integration tests.
#![allow(dead_code)]

use byteordered::ByteOrdered;
use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const DEFINITION: &[&str] = &[
    "#  slice number                             (integer)",
    "#  echo number                              (integer)",
    "#  dynamic scan number                      (integer)",
    "#  cardiac phase number                     (integer)",
    "#  image_type_mr                            (integer)",
    "#  scanning sequence                        (integer)",
    "#  index in REC file (in images)            (integer)",
    "#  image pixel size (in bits)               (integer)",
    "#  scan percentage                          (integer)",
    "#  recon resolution (x y)                   (2*integer)",
    "#  rescale intercept                        (float)",
    "#  rescale slope                            (float)",
    "#  scale slope                              (float)",
    "#  slice thickness (in mm )                 (float)",
    "#  slice gap (in mm )                       (float)",
    "#  slice orientation ( TRA/SAG/COR )        (integer)",
    "#  pixel spacing (x,y) (in mm)              (2*float)",
    "#  echo_time                                (float)",
    "#  dyn_scan_begin_time                      (float)",
    "#  diffusion_b_value_number    <imagekey!>  (integer)",
    "#  gradient orientation number <imagekey!>  (integer)",
    "#  diffusion b factor                       (float)",
    "#  diffusion (ap, fh, rl)                   (3*float)",
];

/// Diffusion parameters of one volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffusionVolume {
    pub b_value_number: i64,
    pub gradient_number: i64,
    pub b_factor: f64,
    /// (ap, fh, rl)
    pub direction: [f64; 3],
}

/// Description of a synthetic scan. Volumes are written one after the
/// other, each with all of its slices.
#[derive(Debug, Clone)]
pub struct SyntheticScan {
    pub protocol: String,
    pub dim: [usize; 3],
    pub voxel_size: [f64; 3],
    pub orientation: i64,
    pub bits: i64,
    pub dynamics: usize,
    pub diffusion: Vec<DiffusionVolume>,
    /// `scale slope` of every slice; a second value on odd volumes when set.
    pub scale_slopes: (f64, Option<f64>),
    pub rescale: (f64, f64),
    pub angulation: [f64; 3],
    pub offcentre: [f64; 3],
    /// Rows to leave out at the end of the slice table.
    pub missing_rows: usize,
}

impl Default for SyntheticScan {
    fn default() -> Self {
        SyntheticScan {
            protocol: "WIP T1W".to_string(),
            dim: [64, 64, 10],
            voxel_size: [3.5, 3.5, 4.],
            orientation: 1,
            bits: 8,
            dynamics: 1,
            diffusion: Vec::new(),
            scale_slopes: (0.5, None),
            rescale: (0., 2.),
            angulation: [0., 0., 0.],
            offcentre: [0., 0., 0.],
            missing_rows: 0,
        }
    }
}

impl SyntheticScan {
    /// Number of volumes described.
    pub fn volumes(&self) -> usize {
        if self.diffusion.is_empty() {
            self.dynamics
        } else {
            self.diffusion.len()
        }
    }

    /// Number of rows in the slice table.
    pub fn rows(&self) -> usize {
        self.volumes() * self.dim[2] - self.missing_rows
    }

    /// Field of view as (ap, fh, rl), consistent with the voxel size for
    /// the slice orientation.
    fn fov(&self) -> [f64; 3] {
        let inplane = self.dim[0] as f64 * self.voxel_size[0];
        let through = self.dim[2] as f64 * self.voxel_size[2];
        match self.orientation {
            2 => [inplane, inplane, through],
            3 => [through, inplane, inplane],
            _ => [inplane, through, inplane],
        }
    }

    /// Value of a sample of the REC file.
    pub fn sample(&self, index: usize, x: usize, y: usize) -> i64 {
        let v = (index * 7 + x + 3 * y) as i64;
        match self.bits {
            8 => v % 256,
            16 => v % 30000 - 1000,
            _ => v * 1000,
        }
    }

    /// Text of the PAR file.
    pub fn par_text(&self) -> String {
        let fov = self.fov();
        let mut out = String::new();
        out.push_str("# === DATA DESCRIPTION FILE ======================================================\n");
        out.push_str("#\n# CAUTION - Investigational device.\n# Limited by Federal Law to investigational use.\n#\n");
        out.push_str("# Dataset name: E:\\Export\\synthetic\n#\n");
        out.push_str("# CLINICAL TRYOUT             Research image export tool     V4.2\n#\n");
        out.push_str("# === GENERAL INFORMATION ========================================================\n#\n");
        let _ = writeln!(out, ".    Patient name                       :   synthetic");
        let _ = writeln!(out, ".    Protocol name                      :   {}", self.protocol);
        let _ = writeln!(out, ".    Max. number of cardiac phases      :   1");
        let _ = writeln!(out, ".    Max. number of echoes              :   1");
        let _ = writeln!(out, ".    Max. number of slices/locations    :   {}", self.dim[2]);
        let _ = writeln!(out, ".    Max. number of dynamics            :   {}", self.dynamics);
        let _ = writeln!(out, ".    Repetition time [ms]               :   2000.000");
        let _ = writeln!(
            out,
            ".    FOV (ap,fh,rl) [mm]                :   {:.3}  {:.3}  {:.3}",
            fov[0], fov[1], fov[2]
        );
        let _ = writeln!(
            out,
            ".    Angulation midslice(ap,fh,rl)[degr]:   {:.3}  {:.3}  {:.3}",
            self.angulation[0], self.angulation[1], self.angulation[2]
        );
        let _ = writeln!(
            out,
            ".    Off Centre midslice(ap,fh,rl) [mm] :   {:.3}  {:.3}  {:.3}",
            self.offcentre[0], self.offcentre[1], self.offcentre[2]
        );
        let _ = writeln!(out, ".    Diffusion   <0=no 1=yes>           :   {}", !self.diffusion.is_empty() as i32);
        out.push_str("#\n# === PIXEL VALUES =============================================================\n#\n");
        out.push_str("# === IMAGE INFORMATION DEFINITION =============================================\n");
        out.push_str("#  The rest of this file contains ONE line per image, this line contains the following information:\n#\n");
        for line in DEFINITION {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("#\n# === IMAGE INFORMATION ==========================================================\n");
        out.push_str("#  sl ec  dyn ph ty    idx pix scan% rec size\n\n");

        let mut index = 0;
        'rows: for volume in 0..self.volumes() {
            let (dynamic, diffusion) = match self.diffusion.get(volume) {
                Some(d) => (1, *d),
                None => (
                    volume + 1,
                    DiffusionVolume {
                        b_value_number: 1,
                        gradient_number: 1,
                        b_factor: 0.,
                        direction: [0.; 3],
                    },
                ),
            };
            let scale_slope = match self.scale_slopes {
                (_, Some(odd)) if volume % 2 == 1 => odd,
                (s, _) => s,
            };
            for slice in 0..self.dim[2] {
                if index == self.rows() {
                    break 'rows;
                }
                let _ = writeln!(
                    out,
                    "{} 1 {} 1 0 2 {} {} 100 {} {} {:.5} {:.5} {:.6} {:.3} 0.000 {} {:.3} {:.3} 5.00 {:.2} {} {} {:.1} {:.5} {:.5} {:.5}",
                    slice + 1,
                    dynamic,
                    index,
                    self.bits,
                    self.dim[0],
                    self.dim[1],
                    self.rescale.0,
                    self.rescale.1,
                    scale_slope,
                    self.voxel_size[2],
                    self.orientation,
                    self.voxel_size[0],
                    self.voxel_size[1],
                    volume as f64 * 2.,
                    diffusion.b_value_number,
                    diffusion.gradient_number,
                    diffusion.b_factor,
                    diffusion.direction[0],
                    diffusion.direction[1],
                    diffusion.direction[2],
                );
                index += 1;
            }
        }
        out.push_str("\n# === END OF DATA DESCRIPTION FILE ===============================================\n");
        out
    }

    /// Bytes of the REC file, in host byte order.
    pub fn rec_bytes(&self) -> Vec<u8> {
        let mut out = ByteOrdered::native(Vec::new());
        for index in 0..self.rows() {
            for y in 0..self.dim[1] {
                for x in 0..self.dim[0] {
                    let v = self.sample(index, x, y);
                    match self.bits {
                        8 => out.write_u8(v as u8).unwrap(),
                        16 => out.write_i16(v as i16).unwrap(),
                        _ => out.write_i32(v as i32).unwrap(),
                    }
                }
            }
        }
        out.into_inner()
    }

    /// Write `<stem>.PAR` and `<stem>.REC` in the given directory and
    /// return the path of the PAR file.
    pub fn write_to<P: AsRef<Path>>(&self, dir: P, stem: &str) -> PathBuf {
        let par = dir.as_ref().join(format!("{}.PAR", stem));
        fs::write(&par, self.par_text()).unwrap();
        let mut rec = fs::File::create(dir.as_ref().join(format!("{}.REC", stem))).unwrap();
        rec.write_all(&self.rec_bytes()).unwrap();
        par
    }
}

/// A diffusion scan with one b0 volume acquired last, after two weighted
/// directions.
pub fn dti_scan() -> SyntheticScan {
    SyntheticScan {
        protocol: "DTI".to_string(),
        dim: [4, 4, 2],
        voxel_size: [2., 2., 2.],
        diffusion: vec![
            DiffusionVolume {
                b_value_number: 2,
                gradient_number: 1,
                b_factor: 1000.,
                direction: [0.5, -0.25, 1.],
            },
            DiffusionVolume {
                b_value_number: 2,
                gradient_number: 2,
                b_factor: 1000.,
                direction: [-1., 0.125, 0.],
            },
            DiffusionVolume {
                b_value_number: 1,
                gradient_number: 3,
                b_factor: 0.,
                direction: [0., 0., 0.],
            },
        ],
        ..SyntheticScan::default()
    }
}
