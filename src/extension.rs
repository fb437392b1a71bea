//! The extender frame: 4 bytes sitting between the NIfTI-1 header and the
//! voxel data of a single file.
//!
//! Converted files carry the bytes `6E 2B 31 00` there, the single file
//! magic, as the scanner export tools have always written them. Readers
//! which do not look for extensions skip the frame through `vox_offset`.

use crate::error::Result;
use std::io::{Read, Write};

/// The 4 extender bytes.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Extender([u8; 4]);

impl Extender {
    /// The extender written after the header of converted files.
    pub const SINGLE_FILE_MARKER: Extender = Extender(*b"n+1\0");

    /// Read the frame which follows a header.
    pub fn read_from<S: Read>(mut source: S) -> Result<Extender> {
        let mut bytes = [0u8; 4];
        source.read_exact(&mut bytes)?;
        Ok(Extender(bytes))
    }

    /// Write the frame.
    pub fn write_to<W: Write>(&self, mut sink: W) -> Result<()> {
        sink.write_all(&self.0)?;
        Ok(())
    }

    /// A non-zero first byte tells standard readers that extensions follow.
    pub fn has_extensions(&self) -> bool {
        self.0[0] != 0
    }

    /// The raw bytes.
    pub fn bytes(&self) -> [u8; 4] {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::Extender;

    #[test]
    fn marker_bytes() {
        assert_eq!(Extender::SINGLE_FILE_MARKER.bytes(), [0x6E, 0x2B, 0x31, 0x00]);
        assert!(Extender::SINGLE_FILE_MARKER.has_extensions());
        assert!(!Extender::default().has_extensions());
    }

    #[test]
    fn read_and_write() {
        let mut out = Vec::new();
        Extender::SINGLE_FILE_MARKER.write_to(&mut out).unwrap();
        assert_eq!(out, b"n+1\0");
        out.push(0xFF);
        assert_eq!(
            Extender::read_from(&out[..]).unwrap(),
            Extender::SINGLE_FILE_MARKER
        );
        assert!(Extender::read_from(&out[..2]).is_err());
    }
}
