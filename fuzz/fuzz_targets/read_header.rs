#![no_main]
use libfuzzer_sys::fuzz_target;
use parrec2nii::NiftiHeader;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = NiftiHeader::from_reader(data) {
        let _ = header.data_type();
        let _ = header.qform();
        let _ = header.sform();
        let _ = header.xyzt_units();
        let _ = header.qform_affine();
        let _ = header.description();
    }
});
