// FAT32 on-disk constants: boot sector offsets, FSInfo layout, FAT entry values
// and the MBR partition record.

use static_assertions::const_assert;

// Boot sector offsets
pub const BS_JMP_BOOT: usize = 0x00;
pub const BS_OEM_NAME: usize = 0x03;
pub const BPB_BYTES_PER_SEC: usize = 0x0B;
pub const BPB_SEC_PER_CLUS: usize = 0x0D;
pub const BPB_RSVD_SEC_CNT: usize = 0x0E;
pub const BPB_NUM_FATS: usize = 0x10;
pub const BPB_ROOT_ENT_CNT: usize = 0x11;
pub const BPB_TOT_SEC16: usize = 0x13;
pub const BPB_MEDIA: usize = 0x15;
pub const BPB_FAT_SZ16: usize = 0x16;
pub const BPB_SEC_PER_TRK: usize = 0x18;
pub const BPB_NUM_HEADS: usize = 0x1A;
pub const BPB_HIDD_SEC: usize = 0x1C;
pub const BPB_TOT_SEC32: usize = 0x20;

// FAT32 extended BPB (starts at 36)
pub const BPB_FAT_SZ32: usize = 0x24;
pub const BPB_EXT_FLAGS: usize = 0x28;
pub const BPB_FS_VER: usize = 0x2A;
pub const BPB_ROOT_CLUS: usize = 0x2C;
pub const BPB_FS_INFO: usize = 0x30;
pub const BPB_BK_BOOT_SEC: usize = 0x32;
pub const BS32_DRV_NUM: usize = 0x40;
pub const BS32_RESERVED1: usize = 0x41;
pub const BS32_BOOT_SIG: usize = 0x42;
pub const BS32_VOL_ID: usize = 0x43;
pub const BS32_VOL_LAB: usize = 0x47;
pub const BS32_FIL_SYS_TYPE: usize = 0x52;

pub const FAT32_JUMP: [u8; 3] = [0xEB, 0x58, 0x90];
pub const FAT32_FS_TYPE: &[u8; 8] = b"FAT32   ";
pub const EXTENDED_BOOT_SIGNATURE: u8 = 0x29;
pub const DRIVE_NUMBER_HARD_DISK: u8 = 0x80;

// Boot sector signature, shared by the MBR
pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];
pub const BOOT_SIGNATURE_OFFSET: usize = 0x1FE;

// FSInfo layout
pub const FSINFO_LEAD_SIG: u32 = 0x4161_5252; // "RRaA"
pub const FSINFO_STRUC_SIG: u32 = 0x6141_7272; // "rrAa"
pub const FSINFO_TRAIL_SIG: u32 = 0xAA55_0000;
pub const FSI_LEAD_SIG: usize = 0;
pub const FSI_STRUC_SIG: usize = 484;
pub const FSI_FREE_COUNT: usize = 488;
pub const FSI_NXT_FREE: usize = 492;
pub const FSI_TRAIL_SIG: usize = 508;

// FAT entry values (28 significant bits)
pub const FAT32_ENTRY_MASK: u32 = 0x0FFF_FFFF;
pub const FAT32_EOC: u32 = 0x0FFF_FFFF; // Value written to terminate a chain
pub const FAT32_EOC_MIN: u32 = 0x0FFF_FFF8; // Readers treat >= this as end of chain
pub const FAT32_MEDIA_ENTRY_BASE: u32 = 0x0FFF_FF00;
pub const FAT32_ENTRY_SIZE: u64 = 4;
pub const FAT32_RESERVED_ENTRIES: u64 = 2;

// Cluster count thresholds
pub const FAT32_MIN_CLUSTERS: u32 = 65525;
pub const FAT32_MAX_CLUSTERS: u32 = 0x0FFF_FFF5;

// Standard values
pub const STANDARD_BYTES_PER_SECTOR: u32 = 512;
pub const FAT32_ROOT_CLUSTER: u32 = 2;
pub const FAT32_FS_INFO_SECTOR: u32 = 1;
pub const FAT32_BACKUP_BOOT_SECTOR: u32 = 6;
pub const FAT32_BACKUP_FS_INFO_SECTOR: u32 = 7;
pub const FAT32_MIN_RESERVED_SECTORS: u32 = 32;
pub const FAT32_NUM_FATS: u32 = 2;
pub const SECTORS_PER_TRACK: u16 = 63;
pub const NUM_HEADS: u16 = 255;

// Media descriptors
pub const MEDIA_FIXED: u8 = 0xF8;
pub const MEDIA_REMOVABLE: u8 = 0xF0;

// MBR layout
pub const MBR_DISK_SIGNATURE: usize = 0x1B8;
pub const MBR_PARTITION_TABLE: usize = 0x1BE;
pub const MBR_PARTITION_ENTRY_SIZE: usize = 16;
pub const PARTITION_TYPE_FAT32_LBA: u8 = 0x0C;
pub const PARTITION_STATUS_INACTIVE: u8 = 0x00;

/// Volume label written when the caller passes an empty one.
pub const NO_NAME_LABEL: [u8; 11] = *b"NO NAME    ";

/// Smallest device the formatter accepts, in bytes (18432 sectors of 512).
pub const MIN_DEVICE_BYTES: u64 = 9 * 1024 * 1024;

const_assert!(BS32_FIL_SYS_TYPE + 8 <= BOOT_SIGNATURE_OFFSET);
const_assert!(FSI_TRAIL_SIG + 4 <= STANDARD_BYTES_PER_SECTOR as usize);
const_assert!(MBR_PARTITION_TABLE + 4 * MBR_PARTITION_ENTRY_SIZE == BOOT_SIGNATURE_OFFSET);
const_assert!(FAT32_BACKUP_FS_INFO_SECTOR < FAT32_MIN_RESERVED_SECTORS);
