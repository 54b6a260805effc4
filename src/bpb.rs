//! BIOS Parameter Block (BPB) — the structured region of sector 0 describing the
//! volume geometry.
//!
//! Fields are projected by explicit little-endian extraction at the documented byte
//! offsets rather than by casting the raw sector bytes onto a `#[repr(packed)]`
//! struct, per the design note in the source material: compiler-specific packing is
//! not a portable substitute for reading a wire format. Grounded in the teacher's
//! `bpb.rs`, whose `BIOSParameterBlock` carries the same field set and derived
//! offsets — here re-derived without the packed-struct cast.

use crate::error::{FatError, Result};

/// Reserved cluster values and the end-of-chain threshold. Any value `>= FAT_EOC_MIN`
/// terminates a chain; legal EOC values form the range `0x0FFFFFF8..=0x0FFFFFFF`, so
/// traversal must compare against a threshold, never equality with one sentinel.
pub const FAT_EOC_MIN: u32 = 0x0FFF_FFF8;
pub const FAT_FREE: u32 = 0x0000_0000;
pub const FAT_ENTRY_MASK: u32 = 0x0FFF_FFFF;

#[derive(Debug, Clone, Copy)]
pub struct BiosParameterBlock {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sector_count: u16,
    pub num_fats: u8,
    pub total_sectors_32: u32,
    pub sectors_per_fat_32: u32,
    pub root_cluster: u32,
}

impl BiosParameterBlock {
    /// Parse the BPB out of a freshly-read sector 0.
    pub fn parse(sector0: &[u8]) -> Result<Self> {
        let bytes_per_sector = u16::from_le_bytes([sector0[11], sector0[12]]);
        let sectors_per_cluster = sector0[13];
        let reserved_sector_count = u16::from_le_bytes([sector0[14], sector0[15]]);
        let num_fats = sector0[16];
        let total_sectors_32 = u32::from_le_bytes([
            sector0[32],
            sector0[33],
            sector0[34],
            sector0[35],
        ]);
        let sectors_per_fat_32 = u32::from_le_bytes([
            sector0[36],
            sector0[37],
            sector0[38],
            sector0[39],
        ]);
        let root_cluster = u32::from_le_bytes([
            sector0[44],
            sector0[45],
            sector0[46],
            sector0[47],
        ]);

        if bytes_per_sector == 0 || !bytes_per_sector.is_power_of_two() {
            return Err(FatError::BadBootSector {
                reason: "bytes_per_sector is zero or not a power of two",
            });
        }
        if sectors_per_cluster == 0 {
            return Err(FatError::BadBootSector {
                reason: "sectors_per_cluster is zero",
            });
        }
        if num_fats == 0 {
            return Err(FatError::BadBootSector {
                reason: "num_fats is zero",
            });
        }
        if root_cluster < 2 {
            return Err(FatError::BadBootSector {
                reason: "root_cluster is less than 2",
            });
        }

        let bpb = Self {
            bytes_per_sector,
            sectors_per_cluster,
            reserved_sector_count,
            num_fats,
            total_sectors_32,
            sectors_per_fat_32,
            root_cluster,
        };

        if bpb.bytes_per_sector != 512 || bpb.bytes_per_cluster() != 1024 {
            log::warn!(
                "GeometryMismatch: bytes_per_sector={}, bytes_per_cluster={} (this driver targets 512/1024)",
                bpb.bytes_per_sector,
                bpb.bytes_per_cluster()
            );
        }

        Ok(bpb)
    }

    pub fn first_fat_sector(&self) -> u64 {
        self.reserved_sector_count as u64
    }

    pub fn first_data_sector(&self) -> u64 {
        self.reserved_sector_count as u64
            + self.num_fats as u64 * self.sectors_per_fat_32 as u64
    }

    pub fn bytes_per_cluster(&self) -> u32 {
        self.bytes_per_sector as u32 * self.sectors_per_cluster as u32
    }

    /// Total number of data clusters, used as the traversal-depth cap (spec §9:
    /// chain traversal safety) and as the upper bound for FAT allocation scans.
    pub fn total_cluster_count(&self) -> u32 {
        let data_sectors = self
            .total_sectors_32
            .saturating_sub(self.first_data_sector() as u32);
        data_sectors / self.sectors_per_cluster as u32
    }
}
