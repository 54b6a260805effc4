//! FAT Table — read, write, allocate, and free 32-bit FAT entries; follow and
//! mutate cluster chains.
//!
//! Grounded in the teacher's `fat.rs` (`ClusterChain`/`FatManager`), trimmed to a
//! single `FatTable` that talks straight to the block device: the teacher's
//! `recycled_cluster` free-list and block-cache-backed iterator are global-state
//! conveniences the design notes (§9) rule out for this driver — every command
//! re-reads the FAT sector it needs, fresh, from disk.
//!
//! Like [`crate::dir::RootDirectory`], this type does not hold on to the block
//! device between calls, so callers are free to interleave FAT operations with
//! directory lookups that need their own borrow of the same device.

use crate::bpb::{BiosParameterBlock, FAT_ENTRY_MASK, FAT_EOC_MIN, FAT_FREE};
use crate::device::{BlockDevice, SECTOR_SIZE};
use crate::error::Result;

const ENTRY_SIZE: u64 = 4;

pub struct FatTable {
    bpb: BiosParameterBlock,
}

impl FatTable {
    pub fn new(bpb: &BiosParameterBlock) -> Self {
        Self { bpb: *bpb }
    }

    fn entry_location(&self, cluster: u32) -> (u64, usize) {
        let fat_byte_offset = cluster as u64 * ENTRY_SIZE;
        let sector = self.bpb.first_fat_sector() + fat_byte_offset / SECTOR_SIZE as u64;
        let offset_in_sector = (fat_byte_offset % SECTOR_SIZE as u64) as usize;
        (sector, offset_in_sector)
    }

    /// Read the FAT entry for `cluster`, masked to its low 28 bits.
    ///
    /// A read failure downgrades to [`FAT_EOC_MIN`] (spec §7): a corrupt or
    /// truncated image must not make chain traversal loop forever, it should
    /// simply stop as if it had reached the end of the chain.
    pub fn get<D: BlockDevice>(&self, device: &mut D, cluster: u32) -> u32 {
        let (sector, offset) = self.entry_location(cluster);
        let mut buf = [0u8; SECTOR_SIZE];
        match device.read_sector(sector, &mut buf) {
            Ok(()) => {
                let raw = u32::from_le_bytes([
                    buf[offset],
                    buf[offset + 1],
                    buf[offset + 2],
                    buf[offset + 3],
                ]);
                raw & FAT_ENTRY_MASK
            }
            Err(e) => {
                log::warn!("FAT read failed for cluster {cluster}, treating as EOC: {e}");
                FAT_EOC_MIN
            }
        }
    }

    /// Read-modify-write the FAT entry for `cluster`, preserving its high 4
    /// reserved bits (Open Question #2, decided in DESIGN.md: preserve, don't
    /// zero).
    pub fn set<D: BlockDevice>(&self, device: &mut D, cluster: u32, value: u32) -> Result<()> {
        let (sector, offset) = self.entry_location(cluster);
        let mut buf = [0u8; SECTOR_SIZE];
        device.read_sector(sector, &mut buf)?;
        let existing = u32::from_le_bytes([
            buf[offset],
            buf[offset + 1],
            buf[offset + 2],
            buf[offset + 3],
        ]);
        let reserved_bits = existing & !FAT_ENTRY_MASK;
        let new_value = reserved_bits | (value & FAT_ENTRY_MASK);
        buf[offset..offset + 4].copy_from_slice(&new_value.to_le_bytes());
        device.write_sector(sector, &buf)
    }

    /// Linearly scan for the first free cluster (entry == 0), mark it EOC, and
    /// return it. Clusters are numbered from 2.
    pub fn allocate<D: BlockDevice>(&self, device: &mut D) -> Result<u32> {
        let total = self.bpb.total_cluster_count();
        for cluster in 2..total + 2 {
            if self.get(device, cluster) == FAT_FREE {
                self.set(device, cluster, FAT_EOC_MIN)?;
                return Ok(cluster);
            }
        }
        Err(crate::error::FatError::NoSpace)
    }

    /// Point `tail_cluster`'s FAT entry at `new_cluster`. The caller must have
    /// already marked `new_cluster` EOC via [`FatTable::allocate`] *before*
    /// calling this, so a crash between the two writes leaks a cluster rather
    /// than leaving a dangling pointer into free space (spec §4.3/§5).
    pub fn append<D: BlockDevice>(
        &self,
        device: &mut D,
        tail_cluster: u32,
        new_cluster: u32,
    ) -> Result<()> {
        self.set(device, tail_cluster, new_cluster)
    }

    /// Free every cluster on the chain starting at `start`, zeroing each FAT
    /// entry in turn. Stops at EOC or at a free (0) link mid-chain, which would
    /// indicate a corrupt chain rather than looping forever.
    pub fn free_chain<D: BlockDevice>(&self, device: &mut D, start: u32) -> Result<()> {
        let mut cluster = start;
        let total = self.bpb.total_cluster_count();
        for _ in 0..=total {
            if cluster >= FAT_EOC_MIN || cluster == FAT_FREE {
                break;
            }
            let next = self.get(device, cluster);
            self.set(device, cluster, FAT_FREE)?;
            cluster = next;
        }
        Ok(())
    }
}
