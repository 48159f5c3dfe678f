// FAT32 boot sector builder

use byteorder::{ByteOrder, LittleEndian};

use super::constants::*;

/// Fields of a FAT32 boot sector / BPB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fat32BootSectorParams {
    pub oem_name: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub media_descriptor: u8,
    pub sectors_per_track: u16,
    pub num_heads: u16,
    pub hidden_sectors: u32,
    pub total_sectors: u32,
    pub sectors_per_fat: u32,
    pub root_cluster: u32,
    pub fs_info_sector: u16,
    pub backup_boot_sector: u16,
    pub volume_serial: u32,
    pub volume_label: [u8; 11],
}

impl Default for Fat32BootSectorParams {
    fn default() -> Self {
        Self {
            oem_name: *b"MSWIN4.1",
            bytes_per_sector: STANDARD_BYTES_PER_SECTOR as u16,
            sectors_per_cluster: 1,
            reserved_sectors: FAT32_MIN_RESERVED_SECTORS as u16,
            num_fats: FAT32_NUM_FATS as u8,
            media_descriptor: MEDIA_FIXED,
            sectors_per_track: SECTORS_PER_TRACK,
            num_heads: NUM_HEADS,
            hidden_sectors: 0,
            total_sectors: 0,
            sectors_per_fat: 0,
            root_cluster: FAT32_ROOT_CLUSTER,
            fs_info_sector: FAT32_FS_INFO_SECTOR as u16,
            backup_boot_sector: FAT32_BACKUP_BOOT_SECTOR as u16,
            volume_serial: 0,
            volume_label: NO_NAME_LABEL,
        }
    }
}

/// Build a FAT32 boot sector one logical sector long. The signature sits
/// at offset 510 whatever the sector size.
pub fn build_fat32_boot_sector(params: &Fat32BootSectorParams) -> Vec<u8> {
    let mut boot_sector = vec![0u8; params.bytes_per_sector as usize];

    boot_sector[BS_JMP_BOOT..BS_JMP_BOOT + 3].copy_from_slice(&FAT32_JUMP);
    boot_sector[BS_OEM_NAME..BS_OEM_NAME + 8].copy_from_slice(&params.oem_name);

    // BPB common fields
    LittleEndian::write_u16(&mut boot_sector[BPB_BYTES_PER_SEC..], params.bytes_per_sector);
    boot_sector[BPB_SEC_PER_CLUS] = params.sectors_per_cluster;
    LittleEndian::write_u16(&mut boot_sector[BPB_RSVD_SEC_CNT..], params.reserved_sectors);
    boot_sector[BPB_NUM_FATS] = params.num_fats;
    LittleEndian::write_u16(&mut boot_sector[BPB_ROOT_ENT_CNT..], 0); // Always 0 for FAT32
    LittleEndian::write_u16(&mut boot_sector[BPB_TOT_SEC16..], 0);
    boot_sector[BPB_MEDIA] = params.media_descriptor;
    LittleEndian::write_u16(&mut boot_sector[BPB_FAT_SZ16..], 0); // Always 0 for FAT32
    LittleEndian::write_u16(&mut boot_sector[BPB_SEC_PER_TRK..], params.sectors_per_track);
    LittleEndian::write_u16(&mut boot_sector[BPB_NUM_HEADS..], params.num_heads);
    LittleEndian::write_u32(&mut boot_sector[BPB_HIDD_SEC..], params.hidden_sectors);
    LittleEndian::write_u32(&mut boot_sector[BPB_TOT_SEC32..], params.total_sectors);

    // FAT32 extended BPB
    LittleEndian::write_u32(&mut boot_sector[BPB_FAT_SZ32..], params.sectors_per_fat);
    LittleEndian::write_u16(&mut boot_sector[BPB_EXT_FLAGS..], 0); // Mirroring enabled
    LittleEndian::write_u16(&mut boot_sector[BPB_FS_VER..], 0); // Version 0.0
    LittleEndian::write_u32(&mut boot_sector[BPB_ROOT_CLUS..], params.root_cluster);
    LittleEndian::write_u16(&mut boot_sector[BPB_FS_INFO..], params.fs_info_sector);
    LittleEndian::write_u16(&mut boot_sector[BPB_BK_BOOT_SEC..], params.backup_boot_sector);

    boot_sector[BS32_DRV_NUM] = DRIVE_NUMBER_HARD_DISK;
    boot_sector[BS32_RESERVED1] = 0;
    boot_sector[BS32_BOOT_SIG] = EXTENDED_BOOT_SIGNATURE;
    LittleEndian::write_u32(&mut boot_sector[BS32_VOL_ID..], params.volume_serial);
    boot_sector[BS32_VOL_LAB..BS32_VOL_LAB + 11].copy_from_slice(&params.volume_label);
    boot_sector[BS32_FIL_SYS_TYPE..BS32_FIL_SYS_TYPE + 8].copy_from_slice(FAT32_FS_TYPE);

    boot_sector[BOOT_SIGNATURE_OFFSET..BOOT_SIGNATURE_OFFSET + 2].copy_from_slice(&BOOT_SIGNATURE);

    boot_sector
}
