//! Voxel to world transforms: the scanner angulation solver and the NIfTI
//! quaternion encoding of its rotation part.

use crate::par::ScanGeometry;
use crate::typedef::SliceOrientation;
use nalgebra::{Matrix3, Matrix4, Quaternion, Vector3, Vector4};

pub type Affine3 = Matrix3<f64>;
pub type Affine4 = Matrix4<f64>;

/// Separate a 4x4 affine into its 3x3 affine and translation components.
pub fn get_affine_and_translation(affine: &Affine4) -> (Affine3, Vector3<f64>) {
    let translation = Vector3::new(affine[(0, 3)], affine[(1, 3)], affine[(2, 3)]);
    let affine = affine.fixed_view::<3, 3>(0, 0).into_owned();
    (affine, translation)
}

/// Embed a 3x3 matrix in the top left corner of a 4x4 identity.
fn homogeneous(m: &Affine3) -> Affine4 {
    let mut out = Affine4::identity();
    out.fixed_view_mut::<3, 3>(0, 0).copy_from(m);
    out
}

/// Rotation by `degrees` about the x (right-left) axis.
fn rotation_rl(degrees: f64) -> Affine3 {
    let (s, c) = degrees.to_radians().sin_cos();
    Affine3::new(
        1., 0., 0.,
        0., c, -s,
        0., s, c,
    )
}

/// Rotation by `degrees` about the y (anterior-posterior) axis.
fn rotation_ap(degrees: f64) -> Affine3 {
    let (s, c) = degrees.to_radians().sin_cos();
    Affine3::new(
        c, 0., s,
        0., 1., 0.,
        -s, 0., c,
    )
}

/// Rotation by `degrees` about the z (foot-head) axis.
fn rotation_fh(degrees: f64) -> Affine3 {
    let (s, c) = degrees.to_radians().sin_cos();
    Affine3::new(
        c, -s, 0.,
        s, c, 0.,
        0., 0., 1.,
    )
}

/// The voxel to world transform of a scan, and the voxel sizes implied by it.
#[derive(Debug, Clone, PartialEq)]
pub struct Angulation {
    /// Voxel to world transform.
    pub affine: Affine4,
    /// Voxel size along each voxel axis, in mm.
    pub voxel_size: [f64; 3],
}

/// Compute the voxel to world transform of a scan from its angulation,
/// orientation, field of view and off-centre.
///
/// In-plane voxel sizes are both set to the coarser of the two in-plane
/// `FOV / matrix size` ratios. When `angulation` is false, the rotation is
/// dropped and the off-centre is ignored.
pub fn calc_angulation(geometry: &ScanGeometry, angulation: bool) -> Angulation {
    let [ang_ap, ang_fh, ang_rl] = geometry.angulation_apfhrl;
    let [off_ap, off_fh, off_rl] = geometry.offcentre_apfhrl;
    let [fov_ap, fov_fh, fov_rl] = geometry.fov_apfhrl;
    let d = [
        geometry.dim[0] as f64,
        geometry.dim[1] as f64,
        geometry.dim[2] as f64,
    ];

    let rotation = if angulation {
        homogeneous(&(rotation_rl(ang_rl) * rotation_ap(ang_ap) * rotation_fh(ang_fh)))
    } else {
        Affine4::identity()
    };

    let (permutation, lx, ly, lz, voxel_size) = match geometry.orientation {
        SliceOrientation::Transverse => {
            let inplane = (fov_rl / d[0]).max(fov_ap / d[1]);
            let lz = fov_fh / d[2];
            (Affine3::identity(), inplane, inplane, lz, [inplane, inplane, lz])
        }
        SliceOrientation::Sagittal => {
            let inplane = (fov_ap / d[0]).max(fov_fh / d[1]);
            let lx = fov_rl / d[2];
            let permutation = Affine3::new(
                0., 0., -1.,
                1., 0., 0.,
                0., -1., 0.,
            );
            (permutation, lx, inplane, inplane, [inplane, inplane, lx])
        }
        SliceOrientation::Coronal => {
            let inplane = (fov_rl / d[0]).max(fov_fh / d[1]);
            let ly = fov_ap / d[2];
            let permutation = Affine3::new(
                1., 0., 0.,
                0., 0., 1.,
                0., -1., 0.,
            );
            (permutation, inplane, ly, inplane, [inplane, inplane, ly])
        }
    };

    let zoom = Affine4::from_diagonal(&Vector4::new(lx, ly, lz, 1.));
    let patient_to_tal = Affine4::from_diagonal(&Vector4::new(-1., -1., 1., 1.));
    let analyze_to_dicom = Affine4::from_diagonal(&Vector4::new(1., -1., 1., 1.));

    let mut affine =
        patient_to_tal * rotation * zoom * homogeneous(&permutation) * analyze_to_dicom;

    let centre = Vector4::new((d[0] - 1.) / 2., (d[1] - 1.) / 2., (d[2] - 1.) / 2., 1.);
    let offset = affine * centre;
    let mut translation = -Vector3::new(offset[0], offset[1], offset[2]);
    if angulation {
        translation -= Vector3::new(off_rl, off_ap, -off_fh);
    }
    for i in 0..3 {
        affine[(i, 3)] = translation[i];
    }

    Angulation { affine, voxel_size }
}

/// The quaternion representation of a NIfTI transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuaternParams {
    /// Quaternion b, c and d parameters.
    pub bcd: [f64; 3],
    /// Translation.
    pub offset: [f64; 3],
    /// Sign of the third voxel axis: 1 or -1.
    pub qfac: f64,
}

/// Encode the rotation of an affine transform as a NIfTI quaternion.
///
/// Scaling is removed by normalizing the columns of the 3x3 part; a null
/// column is replaced with the matching basis vector. The closest
/// orthogonal matrix is then found by polar decomposition, and an improper
/// rotation is turned proper by negating its third column, which makes
/// `qfac` -1.
pub fn mat44_to_quatern(affine: &Affine4) -> QuaternParams {
    let (mut q, translation) = get_affine_and_translation(affine);

    for j in 0..3 {
        let norm = q.column(j).norm();
        if norm == 0. {
            let mut column = q.column_mut(j);
            column.fill(0.);
            column[j] = 1.;
        } else {
            q.column_mut(j).unscale_mut(norm);
        }
    }

    let svd = q.svd(true, true);
    let mut p = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => u * v_t,
        _ => q,
    };

    let qfac = if p.determinant() > 0. {
        1.
    } else {
        p.column_mut(2).neg_mut();
        -1.
    };

    let mut a = p.trace() + 1.;
    let mut b;
    let mut c;
    let mut d;
    if a > 0.5 {
        a = 0.5 * a.sqrt();
        b = 0.25 * (p[(2, 1)] - p[(1, 2)]) / a;
        c = 0.25 * (p[(0, 2)] - p[(2, 0)]) / a;
        d = 0.25 * (p[(1, 0)] - p[(0, 1)]) / a;
    } else {
        let xd = 1. + p[(0, 0)] - (p[(1, 1)] + p[(2, 2)]);
        let yd = 1. + p[(1, 1)] - (p[(0, 0)] + p[(2, 2)]);
        let zd = 1. + p[(2, 2)] - (p[(0, 0)] + p[(1, 1)]);
        if xd > 1. {
            b = 0.5 * xd.sqrt();
            c = 0.25 * (p[(0, 1)] + p[(1, 0)]) / b;
            d = 0.25 * (p[(0, 2)] + p[(2, 0)]) / b;
            a = 0.25 * (p[(2, 1)] - p[(1, 2)]) / b;
        } else if yd > 1. {
            c = 0.5 * yd.sqrt();
            b = 0.25 * (p[(0, 1)] + p[(1, 0)]) / c;
            d = 0.25 * (p[(1, 2)] + p[(2, 1)]) / c;
            a = 0.25 * (p[(0, 2)] - p[(2, 0)]) / c;
        } else {
            d = 0.5 * zd.sqrt();
            b = 0.25 * (p[(0, 2)] + p[(2, 0)]) / d;
            c = 0.25 * (p[(1, 2)] + p[(2, 1)]) / d;
            a = 0.25 * (p[(1, 0)] - p[(0, 1)]) / d;
        }
        if a < 0. {
            b = -b;
            c = -c;
            d = -d;
        }
    }

    QuaternParams {
        bcd: [b, c, d],
        offset: [translation[0], translation[1], translation[2]],
        qfac,
    }
}

/// Rebuild the voxel to world transform described by quaternion parameters
/// and voxel sizes.
pub fn quatern_to_mat44(params: &QuaternParams, voxel_size: [f64; 3]) -> Affine4 {
    let rotation = quaternion_to_affine(fill_positive(Vector3::from(params.bcd)));
    let qfac = if params.qfac < 0. { -1. } else { 1. };
    let scale = Vector3::new(voxel_size[0], voxel_size[1], voxel_size[2] * qfac);
    let mut out = homogeneous(&(rotation * Affine3::from_diagonal(&scale)));
    for i in 0..3 {
        out[(i, 3)] = params.offset[i];
    }
    out
}

/// Compute unit quaternion from last 3 values.
///
/// If w, x, y, z are the values in the full quaternion, assumes w is positive.
/// The unit quaternion specifies that `wxyz.dot(wxyz) == 1.0`, so w is given by
///     w = (1.0 - (x*x + y*y + z*z)).sqrt()
/// A slightly negative `1.0 - (x*x + y*y + z*z)` from rounding gives w = 0,
/// a 180 degree rotation.
pub(crate) fn fill_positive(xyz: Vector3<f64>) -> Quaternion<f64> {
    let w2 = 1.0 - xyz.dot(&xyz);
    let w = if w2 < 0.0 { 0.0 } else { w2.sqrt() };
    Quaternion::new(w, xyz.x, xyz.y, xyz.z)
}

/// Calculate rotation matrix corresponding to quaternion.
///
/// Rotation matrix applies to column vectors, and is applied to the left of coordinate vectors.
/// The algorithm here allows non-unit quaternions.
///
/// Algorithm from https://en.wikipedia.org/wiki/Rotation_matrix#Quaternion
pub(crate) fn quaternion_to_affine(q: Quaternion<f64>) -> Affine3 {
    let nq = q.w * q.w + q.i * q.i + q.j * q.j + q.k * q.k;
    if nq < ::std::f64::EPSILON {
        return Affine3::identity();
    }
    let s = 2.0 / nq;
    let x = q.i * s;
    let y = q.j * s;
    let z = q.k * s;
    let wx = q.w * x;
    let wy = q.w * y;
    let wz = q.w * z;
    let xx = q.i * x;
    let xy = q.i * y;
    let xz = q.i * z;
    let yy = q.j * y;
    let yz = q.j * z;
    let zz = q.k * z;
    Affine3::new(
        1.0 - (yy + zz), xy - wz, xz + wy,
        xy + wz, 1.0 - (xx + zz), yz - wx,
        xz - wy, yz + wx, 1.0 - (xx + yy),
    )
}
