// FAT32 table initialization

use byteorder::{ByteOrder, LittleEndian};

use super::constants::*;

/// Initialize the head of a FAT32 table in `fat_data`.
///
/// Everything is cleared, then the reserved entries are set:
/// - FAT[0] = 0x0FFFFF00 | media_descriptor
/// - FAT[1] = 0x0FFFFFFF (end of chain)
/// - FAT[root_cluster] = 0x0FFFFFFF (single-cluster root directory)
///
/// `fat_data` must hold at least `root_cluster + 1` entries.
pub fn init_fat32_table(fat_data: &mut [u8], media_descriptor: u8, root_cluster: u32) {
    fat_data.fill(0);

    set_fat32_entry(fat_data, 0, FAT32_MEDIA_ENTRY_BASE | media_descriptor as u32);
    set_fat32_entry(fat_data, 1, FAT32_EOC);
    set_fat32_entry(fat_data, root_cluster, FAT32_EOC);
}

/// Store a 28-bit entry; the upper four bits are reserved and left clear.
pub fn set_fat32_entry(fat_data: &mut [u8], index: u32, value: u32) {
    let offset = index as usize * FAT32_ENTRY_SIZE as usize;
    LittleEndian::write_u32(&mut fat_data[offset..offset + 4], value & FAT32_ENTRY_MASK);
}

pub fn fat32_entry(fat_data: &[u8], index: u32) -> u32 {
    let offset = index as usize * FAT32_ENTRY_SIZE as usize;
    LittleEndian::read_u32(&fat_data[offset..offset + 4]) & FAT32_ENTRY_MASK
}

pub fn is_end_of_chain(entry: u32) -> bool {
    (entry & FAT32_ENTRY_MASK) >= FAT32_EOC_MIN
}
