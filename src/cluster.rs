//! Cluster I/O — read/write whole clusters by cluster number, built on Block I/O
//! plus the Volume Descriptor.
//!
//! Grounded in the teacher's `BIOSParameterBlock::first_sector_of_cluster`/`offset`
//! helpers (`bpb.rs`) combined with its block-cache read/write loop (`cache.rs`,
//! `block_cache.rs`) — minus the cache, per §9's "no process-wide mutable state".

use crate::bpb::BiosParameterBlock;
use crate::device::{BlockDevice, SECTOR_SIZE};
use crate::error::Result;

/// `FirstSectorofCluster = (N - 2) * BPB_SecPerClus + FirstDataSector`.
pub fn cluster_to_first_sector(bpb: &BiosParameterBlock, cluster: u32) -> u64 {
    bpb.first_data_sector() + (cluster as u64 - 2) * bpb.sectors_per_cluster as u64
}

/// Read an entire cluster as `sectors_per_cluster` back-to-back sector reads.
pub fn read_cluster<D: BlockDevice>(
    device: &mut D,
    bpb: &BiosParameterBlock,
    cluster: u32,
    buf: &mut [u8],
) -> Result<()> {
    debug_assert_eq!(buf.len(), bpb.bytes_per_cluster() as usize);
    let first_sector = cluster_to_first_sector(bpb, cluster);
    for i in 0..bpb.sectors_per_cluster as u64 {
        let start = (i as usize) * SECTOR_SIZE;
        device.read_sector(first_sector + i, &mut buf[start..start + SECTOR_SIZE])?;
    }
    Ok(())
}

/// Write an entire cluster as `sectors_per_cluster` back-to-back sector writes.
/// No rollback on partial failure (spec §4.4): a failing sector in the middle
/// leaves earlier sectors of the cluster already written.
pub fn write_cluster<D: BlockDevice>(
    device: &mut D,
    bpb: &BiosParameterBlock,
    cluster: u32,
    buf: &[u8],
) -> Result<()> {
    debug_assert_eq!(buf.len(), bpb.bytes_per_cluster() as usize);
    let first_sector = cluster_to_first_sector(bpb, cluster);
    for i in 0..bpb.sectors_per_cluster as u64 {
        let start = (i as usize) * SECTOR_SIZE;
        device.write_sector(first_sector + i, &buf[start..start + SECTOR_SIZE])?;
    }
    Ok(())
}
