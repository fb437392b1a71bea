#![no_main]
use libfuzzer_sys::fuzz_target;
use parrec2nii::{NiftiHeaderBuilder, ParFile};
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    if let Ok(par) = ParFile::from_reader(data) {
        let _ = par.counts();
        let _ = par.slices.output_order();
        if let Ok(header) = NiftiHeaderBuilder::new(&par).build() {
            let size = header.data_size().unwrap_or(0);
            let rec = vec![0u8; size.min(1 << 20)];
            if let Ok(assembler) = parrec2nii::VolumeAssembler::new(&par, Cursor::new(rec), true) {
                for slice in assembler {
                    if slice.is_err() {
                        break;
                    }
                }
            }
        }
    }
});
