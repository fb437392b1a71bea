//! Types for error handling go here.

use std::io::Error as IOError;
use std::path::PathBuf;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum ParRecError {
        /// The PAR file declares a format version which cannot be read.
        UnsupportedVersion(version: String) {
            display("Unsupported PAR format version `{}`", version)
        }
        /// The PAR file is structurally incomplete.
        InvalidFormat(reason: &'static str) {
            display("Invalid PAR file: {}", reason)
        }
        /// An image definition line declares an unknown column type.
        UnknownFieldType(line: usize, kind: String) {
            display("Unknown field type `{}` in image definition at line {}", kind, line)
        }
        /// A slice row does not agree with the image definition schema.
        MalformedSliceRow(line: usize, expected: usize, found: usize, text: String) {
            display("Malformed slice row at line {}: expected {} values, found {}: `{}`",
                line, expected, found, text)
        }
        /// A required field is not present.
        MissingField(name: String) {
            display("Missing field `{}`", name)
        }
        /// A field is present, but holds a value of the wrong kind.
        InvalidField(name: String, expected: &'static str) {
            display("Field `{}` is not {}", name, expected)
        }
        /// Slice orientation code outside of TRA/SAG/COR.
        UnsupportedOrientation(code: i64) {
            display("Unsupported slice orientation code {}", code)
        }
        /// Sample width which can be neither read nor written.
        UnsupportedBitDepth(bits: i64) {
            display("Unsupported pixel size of {} bits", bits)
        }
        /// A NIfTI header field holds a code outside of its enumeration.
        InvalidCode(name: &'static str, code: i16) {
            display("Invalid code `{}` for header field {}", code, name)
        }
        /// The bytes read are not a NIfTI-1 header.
        InvalidHeader(reason: &'static str) {
            display("Invalid NIfTI-1 header: {}", reason)
        }
        /// Could not open or read the PAR file.
        FileRead(path: PathBuf, err: IOError) {
            display("Failed to read {}: {}", path.display(), err)
            source(err)
        }
        /// The REC file ended before a slice could be fully read.
        SliceRead(index: i64, offset: u64, err: IOError) {
            display("Failed to read slice {} at REC offset {}: {}", index, offset, err)
            source(err)
        }
        /// Failure while serializing the output files.
        Write(path: PathBuf, err: IOError) {
            display("Failed to write {}: {}", path.display(), err)
            source(err)
        }
        /// Array reshaping failure.
        Shape(err: ndarray::ShapeError) {
            from()
            display("{}", err)
            source(err)
        }
        /// I/O Error
        Io(err: IOError) {
            from()
            display("{}", err)
            source(err)
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, ParRecError>;
