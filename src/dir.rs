//! Root Directory — iterate entries in the root cluster, locate by name, find a
//! free slot, and write a slot back.
//!
//! Grounded in the teacher's `dir.rs` `Dir` trait (`find`/`create`/`ls`/`remove`),
//! narrowed to the root-only, short-name-only, single-cluster case this driver
//! targets (spec §4.6, §9 Open Question #4): a FAT32 root directory can in general
//! span a cluster chain, but this driver assumes it fits in one and treats a root
//! whose end-of-directory sentinel isn't reached within that cluster as full.
//!
//! Unlike the teacher's `VirtFile`, this type does not hold on to the block
//! device between calls — it borrows one only for the duration of `load`/
//! `write_slot` — so callers are free to interleave FAT table operations (which
//! need their own borrow of the same device) with directory lookups.

use crate::bpb::BiosParameterBlock;
use crate::cluster;
use crate::device::BlockDevice;
use crate::entry::{decode, DecodedEntry, ShortDirEntry, DIRENT_SIZE};
use crate::error::{FatError, Result};

/// A snapshot of the root directory's single cluster, read fresh for the
/// current command. Per §4.6's read-modify-write discipline, this snapshot is
/// not cached or reused across commands — each CLI invocation builds one.
pub struct RootDirectory {
    bpb: BiosParameterBlock,
    buffer: Vec<u8>,
}

/// One live (non-free, non-long-name) entry together with its slot index.
pub struct FoundEntry {
    pub slot: usize,
    pub entry: ShortDirEntry,
}

impl RootDirectory {
    pub fn load<D: BlockDevice>(device: &mut D, bpb: &BiosParameterBlock) -> Result<Self> {
        let mut buffer = vec![0u8; bpb.bytes_per_cluster() as usize];
        cluster::read_cluster(device, bpb, bpb.root_cluster, &mut buffer)?;
        Ok(Self { bpb: *bpb, buffer })
    }

    fn slot_count(&self) -> usize {
        self.buffer.len() / DIRENT_SIZE
    }

    fn slot_bytes(&self, slot: usize) -> [u8; DIRENT_SIZE] {
        self.buffer[slot * DIRENT_SIZE..(slot + 1) * DIRENT_SIZE]
            .try_into()
            .unwrap()
    }

    /// All live entries in slot order, stopping at the end-of-directory sentinel.
    pub fn list(&self) -> Vec<FoundEntry> {
        let mut out = Vec::new();
        for slot in 0..self.slot_count() {
            match decode(&self.slot_bytes(slot)) {
                DecodedEntry::EndOfDir => break,
                DecodedEntry::Free | DecodedEntry::LongName => continue,
                DecodedEntry::Entry(entry) => out.push(FoundEntry { slot, entry }),
            }
        }
        out
    }

    /// The first live entry whose name matches `name` (case-insensitive,
    /// padding-insensitive — see `entry::name_matches`).
    pub fn find(&self, name: &str) -> Option<FoundEntry> {
        self.list()
            .into_iter()
            .find(|f| crate::entry::name_matches(f.entry.name_bytes(), name))
    }

    /// The first slot whose byte 0 is `0x00` or `0xE5`.
    pub fn find_free_slot(&self) -> Result<usize> {
        for slot in 0..self.slot_count() {
            let bytes = self.slot_bytes(slot);
            if matches!(
                decode(&bytes),
                DecodedEntry::EndOfDir | DecodedEntry::Free
            ) {
                return Ok(slot);
            }
        }
        Err(FatError::Full)
    }

    /// Overwrite the 32 bytes at `slot` and persist the sector(s) that contain
    /// it. Re-reads the root cluster from disk first so a stale in-memory copy
    /// never clobbers a change made by an earlier step of the same command.
    pub fn write_slot<D: BlockDevice>(
        &mut self,
        device: &mut D,
        slot: usize,
        entry: &ShortDirEntry,
    ) -> Result<()> {
        cluster::read_cluster(device, &self.bpb, self.bpb.root_cluster, &mut self.buffer)?;
        let start = slot * DIRENT_SIZE;
        self.buffer[start..start + DIRENT_SIZE].copy_from_slice(entry.as_bytes());
        cluster::write_cluster(device, &self.bpb, self.bpb.root_cluster, &self.buffer)
    }
}
