//! Block I/O — sector-addressed read/write over a seekable byte container.
//!
//! This is the leaf of the driver: every other layer eventually bottoms out in a
//! `read_sector`/`write_sector` call here. Mirrors the teacher's `BlockDevice` trait
//! (`block_device.rs`/`device.rs`) but drops the `Send + Sync + Any` bounds the
//! teacher needs for its `Arc<dyn BlockDevice>` sharing across a no_std allocator —
//! this driver is single-threaded and owns its device outright.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{FatError, Result};

pub const SECTOR_SIZE: usize = 512;

/// A seekable byte container addressed in whole sectors.
pub trait BlockDevice {
    /// Read exactly one sector into `buf`. `buf.len()` must equal [`SECTOR_SIZE`].
    fn read_sector(&mut self, sector: u64, buf: &mut [u8]) -> Result<()>;

    /// Write exactly one sector from `buf`, then durably flush before returning.
    /// `buf.len()` must equal [`SECTOR_SIZE`].
    fn write_sector(&mut self, sector: u64, buf: &[u8]) -> Result<()>;
}

/// A FAT32 image backed by a regular host file, opened read-write.
pub struct ImageFile {
    file: File,
    path: PathBuf,
}

impl ImageFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| FatError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(Self { file, path })
    }

    fn io_err(&self, source: std::io::Error) -> FatError {
        FatError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl BlockDevice for ImageFile {
    fn read_sector(&mut self, sector: u64, buf: &mut [u8]) -> Result<()> {
        debug_assert_eq!(buf.len(), SECTOR_SIZE);
        log::debug!("read_sector({sector})");
        self.file
            .seek(SeekFrom::Start(sector * SECTOR_SIZE as u64))
            .map_err(|e| self.io_err(e))?;
        let mut read = 0;
        while read < buf.len() {
            match self.file.read(&mut buf[read..]) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) => return Err(self.io_err(e)),
            }
        }
        if read != SECTOR_SIZE {
            return Err(FatError::ShortRead {
                sector,
                got: read,
                expected: SECTOR_SIZE,
            });
        }
        Ok(())
    }

    fn write_sector(&mut self, sector: u64, buf: &[u8]) -> Result<()> {
        debug_assert_eq!(buf.len(), SECTOR_SIZE);
        log::debug!("write_sector({sector})");
        self.file
            .seek(SeekFrom::Start(sector * SECTOR_SIZE as u64))
            .map_err(|e| self.io_err(e))?;
        let written = self.file.write(buf).map_err(|e| self.io_err(e))?;
        if written != SECTOR_SIZE {
            return Err(FatError::ShortWrite {
                sector,
                wrote: written,
                expected: SECTOR_SIZE,
            });
        }
        // Every sector write must be durable on return (spec §4.1/§5): a crash
        // between two logically related writes must leave each sector in either
        // its pre- or post-state, never partially written.
        self.file.sync_data().map_err(|e| self.io_err(e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn scratch_file(len: usize) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&vec![0u8; len]).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn round_trips_a_sector() {
        let f = scratch_file(SECTOR_SIZE * 4);
        let mut dev = ImageFile::open(f.path()).unwrap();
        let mut buf = [0xABu8; SECTOR_SIZE];
        dev.write_sector(2, &buf).unwrap();
        buf = [0u8; SECTOR_SIZE];
        dev.read_sector(2, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn short_read_past_end_of_file() {
        let f = scratch_file(SECTOR_SIZE);
        let mut dev = ImageFile::open(f.path()).unwrap();
        let mut buf = [0u8; SECTOR_SIZE];
        let err = dev.read_sector(5, &mut buf).unwrap_err();
        assert!(matches!(err, FatError::ShortRead { .. }));
    }
}
