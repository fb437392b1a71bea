//! An application for inspecting a Philips PAR file: the general
//! information, the derived scan geometry and the anomalies found.

extern crate parrec2nii;

use parrec2nii::ParFile;
use std::env;

fn main() {
    let mut args = env::args().skip(1);
    let filename = args.next().expect("Path to PAR file is required");
    let par = ParFile::from_file(filename).expect("Failed to read PAR file");

    println!("version: {}", par.version);
    for entry in par.general.iter() {
        println!("{:<40} {}", entry.key, entry.value);
    }
    println!("{:#?}", par.geometry);
    println!("{:?}", par.counts());
    println!(
        "{} slices, {} volume(s), {} bits, {:?} slice order",
        par.slices.len(),
        par.number_of_volumes,
        par.bits,
        par.volume_slice_order
    );
    for warning in &par.warnings {
        println!("warning: {}", warning);
    }
    if par.problem_reading {
        println!("the data of this file cannot be read");
    }
}
