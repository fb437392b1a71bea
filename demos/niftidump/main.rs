//! An application for reading the header of a NIfTI-1 file, such as the
//! ones written by `parrec2nii`.

extern crate parrec2nii;

use parrec2nii::NiftiHeader;
use std::env;

fn main() {
    let mut args = env::args().skip(1);
    let filename = args.next().expect("Path to NIFTI file is required");
    let (header, extender) =
        NiftiHeader::from_file_with_extender(filename).expect("Failed to read NIFTI file");
    println!("{:#?}", &header);
    println!(
        "extender: {:02X?} (extensions: {})",
        extender.bytes(),
        extender.has_extensions()
    );
    println!("description: {}", header.description().trim_end());
    println!("sform: {}", header.sform_affine());
}
