//! Private utility module
use std::path::{Path, PathBuf};

/// Absolute tolerance used when comparing values derived from PAR headers.
const ABS_TOLERANCE: f64 = 1e-8;
/// Relative tolerance used when comparing values derived from PAR headers.
const REL_TOLERANCE: f64 = 1e-5;

/// Whether two header-derived values are equal up to rounding noise.
pub fn all_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= ABS_TOLERANCE + REL_TOLERANCE * b.abs()
}

/// Check whether the given path refers to a gzipped file.
pub fn is_gz_file<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref()
        .file_name()
        .map(|a| a.to_string_lossy().ends_with(".gz"))
        .unwrap_or(false)
}

/// Find the REC file path paired with the given PAR file path.
/// The extension's case is preserved (`x.PAR` pairs with `x.REC`).
pub fn rec_path_for<P>(par_path: P) -> PathBuf
where
    P: AsRef<Path>,
{
    let par_path = par_path.as_ref();
    let ext = par_path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lowercase = !ext.is_empty() && ext.chars().all(|c| !c.is_ascii_uppercase());
    let rec_ext = if lowercase { "rec" } else { "REC" };
    par_path.with_extension(rec_ext)
}

/// Build a path with the given suffix appended to the file stem, dropping
/// any `.nii` or `.nii.gz` extension.
pub fn sibling_with_suffix<P>(path: P, suffix: &str) -> PathBuf
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name
        .strip_suffix(".gz")
        .unwrap_or(&name)
        .trim_end_matches(".nii")
        .to_string();
    path.with_file_name(format!("{}{}", stem, suffix))
}

#[cfg(test)]
mod tests {
    use super::{all_close, is_gz_file, rec_path_for, sibling_with_suffix};
    use std::path::PathBuf;

    #[test]
    fn filenames() {
        assert!(!is_gz_file("/path/to/something.nii"));
        assert!(is_gz_file("/path/to/something.nii.gz"));
        assert!(!is_gz_file("volume.não"));
        assert!(is_gz_file("1.2.3.nii.gz"));
        assert!(!is_gz_file("not_gz.nii.gz.hdr"));
    }

    #[test]
    fn rec_companions() {
        assert_eq!(rec_path_for("scan.PAR"), PathBuf::from("scan.REC"));
        assert_eq!(rec_path_for("/data/scan.par"), PathBuf::from("/data/scan.rec"));
        assert_eq!(rec_path_for("scan"), PathBuf::from("scan.REC"));
    }

    #[test]
    fn suffixed_siblings() {
        assert_eq!(
            sibling_with_suffix("/out/dti.nii", "-x-bval.txt"),
            PathBuf::from("/out/dti-x-bval.txt")
        );
        assert_eq!(
            sibling_with_suffix("/out/dti.nii.gz", "-x-bvec.txt"),
            PathBuf::from("/out/dti-x-bvec.txt")
        );
    }

    #[test]
    fn closeness() {
        assert!(all_close(3.0, 3.000_000_1));
        assert!(!all_close(3.0, 3.1));
        assert!(all_close(0.0, 0.0));
    }
}
