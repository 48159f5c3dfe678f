// MBR creation for a single FAT32 partition

use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use crate::fat_common::{
    lba_to_chs, BOOT_SIGNATURE, BOOT_SIGNATURE_OFFSET, MBR_DISK_SIGNATURE, MBR_PARTITION_TABLE,
    NUM_HEADS, PARTITION_STATUS_INACTIVE, SECTORS_PER_TRACK,
};

/// Partition entry for creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionEntry {
    pub start_lba: u32,
    pub size_lba: u32,
    pub partition_type: u8,
    pub bootable: bool,
}

impl PartitionEntry {
    /// Encode the 16-byte partition table entry.
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut entry = [0u8; 16];

        let end_lba = self.start_lba.saturating_add(self.size_lba.saturating_sub(1));
        let (start_head, start_sector, start_cyl) =
            lba_to_chs(self.start_lba, NUM_HEADS, SECTORS_PER_TRACK);
        let (end_head, end_sector, end_cyl) = lba_to_chs(end_lba, NUM_HEADS, SECTORS_PER_TRACK);

        entry[0] = if self.bootable { 0x80 } else { PARTITION_STATUS_INACTIVE };
        entry[1] = start_head;
        entry[2] = start_sector;
        entry[3] = start_cyl;
        entry[4] = self.partition_type;
        entry[5] = end_head;
        entry[6] = end_sector;
        entry[7] = end_cyl;
        LittleEndian::write_u32(&mut entry[8..12], self.start_lba);
        LittleEndian::write_u32(&mut entry[12..16], self.size_lba);

        entry
    }

    pub fn from_bytes(entry: &[u8]) -> Self {
        Self {
            start_lba: LittleEndian::read_u32(&entry[8..12]),
            size_lba: LittleEndian::read_u32(&entry[12..16]),
            partition_type: entry[4],
            bootable: entry[0] == 0x80,
        }
    }
}

/// Create an MBR sector holding one partition entry.
///
/// The boot code region is left zeroed. The buffer is `sector_size` bytes so
/// it can be written as one whole sector.
pub fn build_single_partition_mbr(
    sector_size: usize,
    partition: &PartitionEntry,
    disk_signature: u32,
) -> Vec<u8> {
    let mut mbr = vec![0u8; sector_size];

    // Windows wants a non-zero disk signature
    let disk_signature = if disk_signature == 0 { 0x5344_4657 } else { disk_signature };
    LittleEndian::write_u32(&mut mbr[MBR_DISK_SIGNATURE..], disk_signature);

    mbr[MBR_PARTITION_TABLE..MBR_PARTITION_TABLE + 16].copy_from_slice(&partition.to_bytes());
    mbr[BOOT_SIGNATURE_OFFSET..BOOT_SIGNATURE_OFFSET + 2].copy_from_slice(&BOOT_SIGNATURE);

    debug!(
        "MBR: type 0x{:02X}, start LBA {}, {} sectors, disk signature 0x{:08X}",
        partition.partition_type, partition.start_lba, partition.size_lba, disk_signature
    );

    mbr
}
