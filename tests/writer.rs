extern crate flate2;
extern crate parrec2nii;
extern crate tempfile;

mod util;

use flate2::read::GzDecoder;
use parrec2nii::header::VOX_OFFSET;
use parrec2nii::volume::VolumeAssembler;
use parrec2nii::writer::write_nifti;
use parrec2nii::{Extender, NiftiHeader, NiftiHeaderBuilder, ParFile};
use std::fs;
use std::io::{Cursor, Read};
use tempfile::tempdir;
use util::SyntheticScan;

fn small_scan() -> SyntheticScan {
    SyntheticScan {
        dim: [4, 3, 2],
        voxel_size: [2., 2., 2.],
        dynamics: 2,
        ..SyntheticScan::default()
    }
}

/// The voxels expected in the NIfTI file: x fastest, y reversed.
fn expected_voxels(scan: &SyntheticScan) -> Vec<u8> {
    let [nx, ny, _] = scan.dim;
    let mut out = Vec::new();
    for index in 0..scan.rows() {
        for y in (0..ny).rev() {
            for x in 0..nx {
                out.push(scan.sample(index, x, y) as u8);
            }
        }
    }
    out
}

fn write(scan: &SyntheticScan, name: &str) -> (tempfile::TempDir, std::path::PathBuf, NiftiHeader) {
    let par = ParFile::from_reader(scan.par_text().as_bytes()).unwrap();
    let assembler = VolumeAssembler::new(&par, Cursor::new(scan.rec_bytes()), false).unwrap();
    let header = NiftiHeaderBuilder::new(&par)
        .volumes(assembler.volumes())
        .build()
        .unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join(name);
    write_nifti(&path, &header, assembler).unwrap();
    (dir, path, header)
}

#[test]
fn voxels_follow_the_header() {
    let scan = small_scan();
    let (_dir, path, header) = write(&scan, "small.nii");

    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len(), VOX_OFFSET + header.data_size().unwrap());
    assert_eq!(&bytes[348..352], &[0x6E, 0x2B, 0x31, 0x00]);
    assert_eq!(&bytes[VOX_OFFSET..], &expected_voxels(&scan)[..]);

    let read = NiftiHeader::from_file(&path).unwrap();
    assert_eq!(read, header);
    assert_eq!(read.dim, [4, 4, 3, 2, 2, 1, 1, 1]);
}

#[test]
fn gzip_stream() {
    let scan = small_scan();
    let (_dir, path, header) = write(&scan, "small.nii.gz");

    let mut bytes = Vec::new();
    GzDecoder::new(fs::File::open(&path).unwrap())
        .read_to_end(&mut bytes)
        .unwrap();
    assert_eq!(bytes.len(), VOX_OFFSET + header.data_size().unwrap());
    assert_eq!(&bytes[VOX_OFFSET..], &expected_voxels(&scan)[..]);
    let (read, extender) = NiftiHeader::from_file_with_extender(&path).unwrap();
    assert_eq!(read, header);
    assert_eq!(extender, Extender::SINGLE_FILE_MARKER);
    assert_eq!(extender.bytes(), *b"n+1\0");
    assert!(extender.has_extensions());
}
