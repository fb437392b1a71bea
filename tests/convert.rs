extern crate parrec2nii;
#[macro_use]
extern crate pretty_assertions;
extern crate tempfile;

mod util;

use parrec2nii::header::{HEADER_SIZE, VOX_OFFSET};
use parrec2nii::{
    convert_batch, convert_par, Conversion, ConvertOptions, NiftiHeader, NiftiType, ParRecError,
    OutputNaming, ParWarning,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use util::{dti_scan, SyntheticScan};

fn naming(dir: &Path) -> OutputNaming {
    OutputNaming {
        out_dir: dir.join("NIFTI"),
        ..OutputNaming::default()
    }
}

fn written(outcome: Conversion) -> std::path::PathBuf {
    match outcome {
        Conversion::Written { nifti, .. } => nifti,
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn transverse_8bit_scan() {
    let dir = tempdir().unwrap();
    let par = SyntheticScan::default().write_to(dir.path(), "T1W");
    let nifti = written(convert_par(&par, &ConvertOptions::default(), &naming(dir.path())).unwrap());
    assert_eq!(nifti, dir.path().join("NIFTI").join("T1W.nii"));

    let bytes = fs::read(&nifti).unwrap();
    assert_eq!(bytes.len(), VOX_OFFSET + 64 * 64 * 10);

    let header = NiftiHeader::from_file(&nifti).unwrap();
    assert_eq!(header.sizeof_hdr, HEADER_SIZE as i32);
    assert_eq!(header.dim, [4, 64, 64, 10, 1, 1, 1, 1]);
    assert_eq!(header.data_type().unwrap(), NiftiType::Uint8);
    assert_eq!(header.vox_offset, 352.);
    assert_eq!(header.pixdim[0], -1.);
    assert_eq!(header.sform_code, 1);
    assert_eq!(header.qform_code, 0);
}

#[test]
fn conversion_is_reproducible() {
    let dir = tempdir().unwrap();
    let par = SyntheticScan::default().write_to(dir.path(), "T1W");
    let options = ConvertOptions::default();
    let naming = naming(dir.path());

    let nifti = written(convert_par(&par, &options, &naming).unwrap());
    let first = fs::read(&nifti).unwrap();
    let nifti = written(convert_par(&par, &options, &naming).unwrap());
    assert_eq!(fs::read(&nifti).unwrap(), first);
}

#[test]
fn naming_and_compression() {
    let dir = tempdir().unwrap();
    let par = SyntheticScan::default().write_to(dir.path(), "scan");
    let naming = OutputNaming {
        prefix: "sub-01_".to_string(),
        suffix: "_T1w".to_string(),
        compress: true,
        ..naming(dir.path())
    };
    let nifti = written(convert_par(&par, &ConvertOptions::default(), &naming).unwrap());
    assert_eq!(nifti, dir.path().join("NIFTI").join("sub-01_scan_T1w.nii.gz"));
    assert_eq!(NiftiHeader::from_file(&nifti).unwrap().dim, [4, 64, 64, 10, 1, 1, 1, 1]);
}

#[test]
fn multiple_scaling_factors() {
    let dir = tempdir().unwrap();
    let scan = SyntheticScan {
        bits: 16,
        dim: [8, 8, 4],
        voxel_size: [2., 2., 2.],
        dynamics: 2,
        scale_slopes: (0.5, Some(0.25)),
        ..SyntheticScan::default()
    };
    let par = scan.write_to(dir.path(), "fmri");
    let outcome = convert_par(&par, &ConvertOptions::default(), &naming(dir.path())).unwrap();
    let warnings = match &outcome {
        Conversion::Written { warnings, .. } => warnings.clone(),
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(warnings, vec![ParWarning::MultipleScalingFactors]);

    let nifti = written(outcome);
    let header = NiftiHeader::from_file(&nifti).unwrap();
    assert_eq!(header.data_type().unwrap(), NiftiType::Float32);
    assert_eq!(header.dim[4], 2);
    assert_eq!(fs::read(&nifti).unwrap().len(), VOX_OFFSET + 8 * 8 * 4 * 2 * 4);
}

#[test]
fn diffusion_files() {
    let dir = tempdir().unwrap();
    let par = dti_scan().write_to(dir.path(), "dti");
    let options = ConvertOptions {
        dti_revert_b0: true,
        ..ConvertOptions::default()
    };
    match convert_par(&par, &options, &naming(dir.path())).unwrap() {
        Conversion::Written {
            nifti,
            diffusion: Some((bval, bvec)),
            ..
        } => {
            assert_eq!(bval, dir.path().join("NIFTI").join("dti-x-bval.txt"));
            assert_eq!(bvec, dir.path().join("NIFTI").join("dti-x-bvec.txt"));
            assert_eq!(
                fs::read_to_string(bval).unwrap(),
                "0.000000 1000.000000 1000.000000\n"
            );
            assert_eq!(
                fs::read_to_string(bvec).unwrap(),
                "0.000000 1.000000 0.000000\n\
                 0.000000 -0.500000 1.000000\n\
                 0.000000 -0.250000 0.125000\n"
            );
            assert_eq!(NiftiHeader::from_file(&nifti).unwrap().dim[4], 3);
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    // no companion files without b0 reordering
    let outcome = convert_par(&par, &ConvertOptions::default(), &naming(dir.path())).unwrap();
    assert!(matches!(outcome, Conversion::Written { diffusion: None, .. }));
}

#[test]
fn batch_goes_on_after_failures() {
    let dir = tempdir().unwrap();
    let good = SyntheticScan::default().write_to(dir.path(), "good");

    let orphan = SyntheticScan::default().write_to(dir.path(), "orphan");
    fs::remove_file(dir.path().join("orphan.REC")).unwrap();

    let short = SyntheticScan::default().write_to(dir.path(), "short");
    fs::write(dir.path().join("short.REC"), vec![0u8; 100]).unwrap();

    let legacy = dir.path().join("legacy.PAR");
    fs::write(
        &legacy,
        SyntheticScan::default().par_text().replace("tool     V4.2", "tool     V3"),
    )
    .unwrap();

    let summary = convert_batch(
        &[&legacy, &orphan, &short, &good],
        &ConvertOptions::default(),
        &naming(dir.path()),
    );
    assert!(!summary.is_success());
    assert_eq!(summary.written, vec![dir.path().join("NIFTI").join("good.nii")]);
    assert_eq!(summary.skipped, vec![orphan]);
    assert_eq!(summary.failed.len(), 2);
    assert_eq!(summary.failed[0].0, legacy);
    assert!(matches!(summary.failed[0].1, ParRecError::UnsupportedVersion(_)));
    assert_eq!(summary.failed[1].0, short);
    assert!(matches!(summary.failed[1].1, ParRecError::SliceRead(..)));
}
