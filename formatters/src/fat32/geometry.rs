// FAT32 geometry: label normalization, cluster-size bands, FAT sizing and
// the absolute sector offsets every writer works from. No I/O happens here.

use log::{debug, warn};
use sdformat_core::{
    FormatterConfig, FormatterError, DEFAULT_PARTITION_OFFSET_BYTES, MAX_CLUSTER_BYTES,
    SUPPORTED_SECTOR_SIZES,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fat_common::*;
use crate::partitioner::PartitionEntry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("Invalid volume label: {0}")]
    InvalidLabel(String),

    #[error("Unsupported sector size: {0} bytes")]
    UnsupportedSectorSize(u32),

    #[error("Invalid cluster size: {0} bytes")]
    InvalidClusterSize(u32),

    #[error("Invalid partition start sector: {0}")]
    InvalidAlignment(u64),

    #[error("Device too small: {total_sectors} sectors (need at least {minimum_sectors})")]
    TooSmall { total_sectors: u64, minimum_sectors: u64 },

    #[error("Device too large for FAT32: {0}")]
    TooLarge(String),
}

impl From<GeometryError> for FormatterError {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::TooSmall { total_sectors, minimum_sectors } => FormatterError::TooSmall {
                total_sectors,
                minimum_sectors,
            },
            other => FormatterError::InvalidDevice(other.to_string()),
        }
    }
}

/// Knobs the geometry depends on besides size and label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryOptions {
    /// First sector of the partition. `None` places it at 4 MiB.
    pub partition_start: Option<u64>,
    /// Cluster size in bytes. `None` picks it from the capacity bands.
    pub cluster_size: Option<u32>,
    pub media_descriptor: u8,
}

impl Default for GeometryOptions {
    fn default() -> Self {
        Self {
            partition_start: None,
            cluster_size: None,
            media_descriptor: MEDIA_FIXED,
        }
    }
}

impl From<&FormatterConfig> for GeometryOptions {
    fn from(config: &FormatterConfig) -> Self {
        Self {
            partition_start: config.partition_alignment,
            cluster_size: config.cluster_size,
            media_descriptor: config.media_descriptor,
        }
    }
}

/// Complete description of the volume about to be written.
///
/// Sector numbers returned by the `*_lba` methods are absolute (counted from
/// the start of the device, MBR = 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub total_sectors: u64,
    pub sector_size: u32,
    pub partition_start: u64,
    pub partition_sectors: u32,
    pub sectors_per_cluster: u32,
    pub reserved_sector_count: u32,
    pub fat_count: u32,
    pub sectors_per_fat: u32,
    pub cluster_count: u32,
    pub root_dir_cluster: u32,
    pub fs_info_sector: u32,
    pub backup_boot_sector: u32,
    pub media_descriptor: u8,
    pub volume_label: [u8; 11],
    /// Zero until a session stamps it.
    pub volume_serial: u32,
}

/// Dry-run report for a layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatPlan {
    pub layout: Layout,
    pub cluster_bytes: u64,
    pub overhead_bytes: u64,
    pub space_after_format: u64,
    pub warnings: Vec<String>,
    pub will_erase_data: bool,
}

impl FormatPlan {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Compute the layout with default options.
pub fn compute_layout(
    total_sectors: u64,
    sector_size: u32,
    label: &str,
) -> Result<Layout, GeometryError> {
    compute_layout_with(total_sectors, sector_size, label, &GeometryOptions::default())
}

pub fn compute_layout_with(
    total_sectors: u64,
    sector_size: u32,
    label: &str,
    options: &GeometryOptions,
) -> Result<Layout, GeometryError> {
    // Label first: a bad label is reported before any size checks
    let volume_label =
        format_volume_label(label).map_err(|e| GeometryError::InvalidLabel(e.to_string()))?;

    if !SUPPORTED_SECTOR_SIZES.contains(&sector_size) {
        return Err(GeometryError::UnsupportedSectorSize(sector_size));
    }

    let minimum_sectors = minimum_total_sectors(sector_size);
    if total_sectors < minimum_sectors {
        return Err(GeometryError::TooSmall { total_sectors, minimum_sectors });
    }

    let partition_start = options
        .partition_start
        .unwrap_or(DEFAULT_PARTITION_OFFSET_BYTES / sector_size as u64);
    // The MBR entry and the BPB hidden-sector field are both 32-bit
    if partition_start == 0 || partition_start > u32::MAX as u64 {
        return Err(GeometryError::InvalidAlignment(partition_start));
    }
    if partition_start >= total_sectors {
        return Err(GeometryError::TooSmall {
            total_sectors,
            minimum_sectors: partition_start + minimum_sectors,
        });
    }

    let partition_sectors = u32::try_from(total_sectors - partition_start).map_err(|_| {
        GeometryError::TooLarge(format!(
            "{} partition sectors exceed the 32-bit sector count fields",
            total_sectors - partition_start
        ))
    })?;

    let cluster_bytes = match options.cluster_size {
        Some(bytes) => {
            if !bytes.is_power_of_two() || bytes < sector_size || bytes > MAX_CLUSTER_BYTES {
                return Err(GeometryError::InvalidClusterSize(bytes));
            }
            bytes
        }
        None => {
            let device_bytes = total_sectors
                .checked_mul(sector_size as u64)
                .ok_or_else(|| GeometryError::TooLarge(format!("{} sectors", total_sectors)))?;
            select_cluster_bytes(device_bytes)
        }
    };
    let sectors_per_cluster = (cluster_bytes / sector_size).max(1);

    let (reserved_sector_count, sectors_per_fat) = size_reserved_and_fat(
        partition_start,
        partition_sectors,
        sectors_per_cluster,
        sector_size,
    )
    .ok_or(GeometryError::TooSmall {
        total_sectors,
        minimum_sectors: partition_start + minimum_sectors,
    })?;

    let overhead = reserved_sector_count as u64 + FAT32_NUM_FATS as u64 * sectors_per_fat as u64;
    if (partition_sectors as u64) <= overhead + sectors_per_cluster as u64 {
        return Err(GeometryError::TooSmall {
            total_sectors,
            minimum_sectors: partition_start + overhead + sectors_per_cluster as u64 + 1,
        });
    }

    let cluster_count = ((partition_sectors as u64 - overhead) / sectors_per_cluster as u64) as u32;
    if cluster_count > FAT32_MAX_CLUSTERS {
        return Err(GeometryError::TooLarge(format!(
            "{} clusters exceed the FAT32 maximum of {}",
            cluster_count, FAT32_MAX_CLUSTERS
        )));
    }
    if cluster_count < FAT32_MIN_CLUSTERS {
        warn!(
            "FAT32 volume has only {} clusters (< {}); some readers may not recognise it as FAT32",
            cluster_count, FAT32_MIN_CLUSTERS
        );
    }

    let layout = Layout {
        total_sectors,
        sector_size,
        partition_start,
        partition_sectors,
        sectors_per_cluster,
        reserved_sector_count,
        fat_count: FAT32_NUM_FATS,
        sectors_per_fat,
        cluster_count,
        root_dir_cluster: FAT32_ROOT_CLUSTER,
        fs_info_sector: FAT32_FS_INFO_SECTOR,
        backup_boot_sector: FAT32_BACKUP_BOOT_SECTOR,
        media_descriptor: options.media_descriptor,
        volume_label,
        volume_serial: 0,
    };

    debug!(
        "FAT32 geometry: {} sectors, partition at {}, {} sectors/cluster, {} reserved, \
         {} sectors/FAT, {} clusters",
        total_sectors,
        partition_start,
        sectors_per_cluster,
        reserved_sector_count,
        sectors_per_fat,
        cluster_count
    );

    Ok(layout)
}

/// Smallest device accepted for a sector size (9 MiB).
pub fn minimum_total_sectors(sector_size: u32) -> u64 {
    MIN_DEVICE_BYTES.div_ceil(sector_size as u64)
}

/// Cluster size bands for FAT32: larger devices get larger clusters, up to
/// 32 KiB.
pub fn select_cluster_bytes(device_bytes: u64) -> u32 {
    const MIB: u64 = 1024 * 1024;
    const GIB: u64 = 1024 * MIB;

    if device_bytes <= 260 * MIB {
        512
    } else if device_bytes <= 8 * GIB {
        4 * 1024
    } else if device_bytes <= 16 * GIB {
        8 * 1024
    } else if device_bytes <= 32 * GIB {
        16 * 1024
    } else {
        MAX_CLUSTER_BYTES
    }
}

/// Grow the reserved area until the data region starts on a cluster
/// boundary, resizing the FAT after every change.
///
/// A larger reserved area never grows the FAT, so each pass either finishes
/// or shrinks the FAT, which bounds the loop.
fn size_reserved_and_fat(
    partition_start: u64,
    partition_sectors: u32,
    sectors_per_cluster: u32,
    sector_size: u32,
) -> Option<(u32, u32)> {
    let mut reserved = FAT32_MIN_RESERVED_SECTORS;

    loop {
        let fat_sectors =
            fat_sectors_for(partition_sectors, reserved, sectors_per_cluster, sector_size)?;
        let data_start =
            partition_start + reserved as u64 + FAT32_NUM_FATS as u64 * fat_sectors as u64;
        let misalignment = (data_start % sectors_per_cluster as u64) as u32;

        if misalignment == 0 {
            return Some((reserved, fat_sectors));
        }

        reserved += sectors_per_cluster - misalignment;
        if reserved > u16::MAX as u32 {
            return None;
        }
    }
}

/// Smallest FAT (in sectors) whose 4-byte entries cover every data cluster
/// plus the two reserved entries.
///
/// The cluster count depends on the FAT size, so start from the FAT needed
/// when the FAT takes a single sector (an upper bound, since the needed size
/// only shrinks as the FAT grows) and walk down while the smaller size still
/// covers its own cluster count.
pub fn fat_sectors_for(
    partition_sectors: u32,
    reserved: u32,
    sectors_per_cluster: u32,
    sector_size: u32,
) -> Option<u32> {
    let needed = |fat_sectors: u64| -> Option<u64> {
        let overhead = reserved as u64 + FAT32_NUM_FATS as u64 * fat_sectors;
        let data_sectors = (partition_sectors as u64).checked_sub(overhead)?;
        let clusters = data_sectors / sectors_per_cluster as u64;
        Some(((clusters + FAT32_RESERVED_ENTRIES) * FAT32_ENTRY_SIZE).div_ceil(sector_size as u64))
    };

    let mut fat_sectors = needed(1)?.max(1);
    // The upper bound itself has to fit
    needed(fat_sectors)?;

    while fat_sectors > 1 {
        match needed(fat_sectors - 1) {
            Some(n) if n <= fat_sectors - 1 => fat_sectors -= 1,
            _ => break,
        }
    }

    u32::try_from(fat_sectors).ok()
}

impl Layout {
    /// Same layout with the session's serial stamped in.
    pub fn with_volume_serial(mut self, volume_serial: u32) -> Self {
        self.volume_serial = volume_serial;
        self
    }

    pub fn boot_sector_lba(&self) -> u64 {
        self.partition_start
    }

    pub fn fs_info_lba(&self) -> u64 {
        self.partition_start + self.fs_info_sector as u64
    }

    pub fn backup_boot_sector_lba(&self) -> u64 {
        self.partition_start + self.backup_boot_sector as u64
    }

    pub fn backup_fs_info_lba(&self) -> u64 {
        self.backup_boot_sector_lba() + self.fs_info_sector as u64
    }

    /// First sector of FAT copy `index` (0-based).
    pub fn fat_start_lba(&self, index: u32) -> u64 {
        self.partition_start
            + self.reserved_sector_count as u64
            + index as u64 * self.sectors_per_fat as u64
    }

    pub fn data_start_lba(&self) -> u64 {
        self.fat_start_lba(self.fat_count)
    }

    /// First sector of data cluster `cluster` (clusters are numbered from 2).
    pub fn cluster_lba(&self, cluster: u32) -> u64 {
        let index = cluster as u64 - FAT32_ROOT_CLUSTER as u64;
        self.data_start_lba() + index * self.sectors_per_cluster as u64
    }

    pub fn cluster_bytes(&self) -> u64 {
        self.sectors_per_cluster as u64 * self.sector_size as u64
    }

    pub fn fat_bytes(&self) -> u64 {
        self.sectors_per_fat as u64 * self.sector_size as u64
    }

    pub fn sector_offset(&self, lba: u64) -> u64 {
        lba * self.sector_size as u64
    }

    /// Free clusters on a fresh volume: everything except the root cluster.
    pub fn free_cluster_count(&self) -> u32 {
        self.cluster_count - 1
    }

    pub fn next_free_cluster(&self) -> u32 {
        self.root_dir_cluster + 1
    }

    /// Partition start as the 32-bit value the MBR and BPB store.
    pub fn partition_start_lba32(&self) -> Result<u32, GeometryError> {
        u32::try_from(self.partition_start)
            .map_err(|_| GeometryError::InvalidAlignment(self.partition_start))
    }

    pub fn boot_sector_params(
        &self,
        oem_name: [u8; 8],
    ) -> Result<Fat32BootSectorParams, GeometryError> {
        Ok(Fat32BootSectorParams {
            oem_name,
            bytes_per_sector: self.sector_size as u16,
            sectors_per_cluster: self.sectors_per_cluster as u8,
            reserved_sectors: self.reserved_sector_count as u16,
            num_fats: self.fat_count as u8,
            media_descriptor: self.media_descriptor,
            sectors_per_track: SECTORS_PER_TRACK,
            num_heads: NUM_HEADS,
            hidden_sectors: self.partition_start_lba32()?,
            total_sectors: self.partition_sectors,
            sectors_per_fat: self.sectors_per_fat,
            root_cluster: self.root_dir_cluster,
            fs_info_sector: self.fs_info_sector as u16,
            backup_boot_sector: self.backup_boot_sector as u16,
            volume_serial: self.volume_serial,
            volume_label: self.volume_label,
        })
    }

    /// The single MBR entry: the partition begins where the reserved
    /// region begins and runs to the end of the device.
    pub fn partition_entry(&self) -> Result<PartitionEntry, GeometryError> {
        Ok(PartitionEntry {
            start_lba: self.partition_start_lba32()?,
            size_lba: self.partition_sectors,
            partition_type: PARTITION_TYPE_FAT32_LBA,
            bootable: false,
        })
    }

    pub fn label_str(&self) -> String {
        String::from_utf8_lossy(&self.volume_label).trim_end().to_string()
    }

    pub fn plan(&self) -> FormatPlan {
        let overhead_bytes = self.sector_offset(self.data_start_lba());
        let space_after_format = self.free_cluster_count() as u64 * self.cluster_bytes();

        let mut warnings = Vec::new();
        if self.cluster_count < FAT32_MIN_CLUSTERS {
            warnings.push(format!(
                "Only {} clusters; readers that size FAT type by cluster count may see FAT16",
                self.cluster_count
            ));
        }
        if self.total_sectors * self.sector_size as u64 > 32 * 1024 * 1024 * 1024 {
            warnings.push(
                "Windows' own format tool refuses FAT32 above 32GB; the volume still mounts"
                    .to_string(),
            );
        }
        if self.partition_start + self.partition_sectors as u64 > u32::MAX as u64 {
            warnings.push("Partition ends beyond the 32-bit LBA range of the MBR".to_string());
        }

        FormatPlan {
            layout: self.clone(),
            cluster_bytes: self.cluster_bytes(),
            overhead_bytes,
            space_after_format,
            warnings,
            will_erase_data: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_64mib_card_uses_single_sector_clusters() {
        let layout = compute_layout(131_072, 512, "TESTCARD").unwrap();

        assert_eq!(layout.sectors_per_cluster, 1);
        assert_eq!(layout.partition_start, 8192);
        assert_eq!(layout.partition_sectors, 122_880);
        assert_eq!(layout.reserved_sector_count, 32);
        assert_eq!(layout.fat_count, 2);
        // 130 * spf >= 122850 -> spf = 945, clusters = 122848 - 1890
        assert_eq!(layout.sectors_per_fat, 945);
        assert_eq!(layout.cluster_count, 120_958);
        assert_eq!(layout.root_dir_cluster, 2);
        assert_eq!(&layout.volume_label, b"TESTCARD   ");
        assert_eq!(layout.volume_serial, 0);
    }

    #[test]
    fn test_fat_covers_clusters_minimally() {
        for &total in &[18_432u64, 131_072, 2_097_152, 15_523_840, 62_521_344] {
            let layout = compute_layout(total, 512, "CARD").unwrap();
            let entries_per_sector = layout.sector_size as u64 / 4;
            let needed = layout.cluster_count as u64 + 2;

            let covered = layout.sectors_per_fat as u64 * entries_per_sector;
            assert!(covered >= needed, "total {}", total);

            // One sector fewer would not cover the clusters it frees up
            let smaller = layout.sectors_per_fat as u64 - 1;
            let data = layout.partition_sectors as u64
                - layout.reserved_sector_count as u64
                - 2 * smaller;
            let clusters = data / layout.sectors_per_cluster as u64;
            assert!(smaller * entries_per_sector < clusters + 2, "total {}", total);
        }
    }

    #[test]
    fn test_layout_is_deterministic() {
        let a = compute_layout(31_116_288, 512, "nds").unwrap();
        let b = compute_layout(31_116_288, 512, "nds").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_small() {
        assert_eq!(
            compute_layout(100, 512, "TESTCARD"),
            Err(GeometryError::TooSmall { total_sectors: 100, minimum_sectors: 18_432 })
        );
        assert!(matches!(compute_layout(18_431, 512, "X"), Err(GeometryError::TooSmall { .. })));
        assert!(compute_layout(18_432, 512, "X").is_ok());
    }

    #[test]
    fn test_label_checked_before_size() {
        assert!(matches!(
            compute_layout(100, 512, "WAY_TOO_LONG_LABEL"),
            Err(GeometryError::InvalidLabel(_))
        ));
        assert!(matches!(
            compute_layout(131_072, 512, "BAD*NAME"),
            Err(GeometryError::InvalidLabel(_))
        ));
    }

    #[test]
    fn test_cluster_bands() {
        assert_eq!(select_cluster_bytes(64 * 1024 * 1024), 512);
        assert_eq!(select_cluster_bytes(260 * 1024 * 1024), 512);
        assert_eq!(select_cluster_bytes(2 * 1024 * 1024 * 1024), 4096);
        assert_eq!(select_cluster_bytes(16 * 1024 * 1024 * 1024), 8192);
        assert_eq!(select_cluster_bytes(32 * 1024 * 1024 * 1024), 16384);
        assert_eq!(select_cluster_bytes(128 * 1024 * 1024 * 1024), 32768);
    }

    #[test]
    fn test_data_region_aligned_to_cluster() {
        // 8 GB card: 4 KiB clusters
        let layout = compute_layout(15_523_840, 512, "SDCARD").unwrap();
        assert_eq!(layout.sectors_per_cluster, 8);
        assert_eq!(layout.data_start_lba() % 8, 0);
        assert!(layout.reserved_sector_count >= 32);

        // 64 GB card: 32 KiB clusters
        let layout = compute_layout(124_735_488, 512, "SDXC").unwrap();
        assert_eq!(layout.sectors_per_cluster, 64);
        assert_eq!(layout.data_start_lba() % 64, 0);
    }

    #[test]
    fn test_offsets() {
        let layout = compute_layout(131_072, 512, "TESTCARD").unwrap();

        assert_eq!(layout.boot_sector_lba(), 8192);
        assert_eq!(layout.fs_info_lba(), 8193);
        assert_eq!(layout.backup_boot_sector_lba(), 8198);
        assert_eq!(layout.backup_fs_info_lba(), 8199);
        assert_eq!(layout.fat_start_lba(0), 8224);
        assert_eq!(layout.fat_start_lba(1), 8224 + 945);
        assert_eq!(layout.data_start_lba(), 8224 + 2 * 945);
        assert_eq!(layout.cluster_lba(2), layout.data_start_lba());
        assert_eq!(layout.free_cluster_count(), 120_957);
        assert_eq!(layout.next_free_cluster(), 3);
    }

    #[test]
    fn test_large_sectors() {
        // 2 GiB device with 4 KiB sectors
        let layout = compute_layout(524_288, 4096, "BIG").unwrap();
        assert_eq!(layout.partition_start, 1024);
        assert_eq!(layout.sectors_per_cluster, 1);
        assert!(layout.sectors_per_fat as u64 * 1024 >= layout.cluster_count as u64 + 2);
    }

    #[test]
    fn test_unsupported_sector_size() {
        assert_eq!(
            compute_layout(131_072, 520, "X"),
            Err(GeometryError::UnsupportedSectorSize(520))
        );
    }

    #[test]
    fn test_too_large_for_32bit_fields() {
        let result = compute_layout(1u64 << 33, 512, "HUGE");
        assert!(matches!(result, Err(GeometryError::TooLarge(_))));
    }

    #[test]
    fn test_cluster_override() {
        let options = GeometryOptions { cluster_size: Some(32 * 1024), ..Default::default() };
        let layout = compute_layout_with(131_072, 512, "X", &options).unwrap();
        assert_eq!(layout.sectors_per_cluster, 64);
        assert_eq!(layout.data_start_lba() % 64, 0);

        let options = GeometryOptions { cluster_size: Some(256), ..Default::default() };
        assert_eq!(
            compute_layout_with(131_072, 512, "X", &options),
            Err(GeometryError::InvalidClusterSize(256))
        );
    }

    #[test]
    fn test_custom_partition_start() {
        let options = GeometryOptions { partition_start: Some(2048), ..Default::default() };
        let layout = compute_layout_with(131_072, 512, "X", &options).unwrap();
        assert_eq!(layout.partition_start, 2048);
        assert_eq!(layout.partition_sectors, 131_072 - 2048);

        let options = GeometryOptions { partition_start: Some(0), ..Default::default() };
        assert_eq!(
            compute_layout_with(131_072, 512, "X", &options),
            Err(GeometryError::InvalidAlignment(0))
        );

        let options = GeometryOptions { partition_start: Some(131_072), ..Default::default() };
        assert!(matches!(
            compute_layout_with(131_072, 512, "X", &options),
            Err(GeometryError::TooSmall { .. })
        ));
    }

    #[test]
    fn test_partition_start_beyond_32_bits() {
        let options = GeometryOptions { partition_start: Some(1u64 << 32), ..Default::default() };
        assert_eq!(
            compute_layout_with((1u64 << 32) + 131_072, 512, "X", &options),
            Err(GeometryError::InvalidAlignment(1u64 << 32))
        );

        // Far past 32 bits: rejected before any size arithmetic can overflow
        let options = GeometryOptions { partition_start: Some(1u64 << 56), ..Default::default() };
        assert_eq!(
            compute_layout_with((1u64 << 56) + 131_072, 512, "X", &options),
            Err(GeometryError::InvalidAlignment(1u64 << 56))
        );

        // Largest start that still fits is accepted and stored unchanged
        let start = u32::MAX as u64 - 131_072;
        let options = GeometryOptions { partition_start: Some(start), ..Default::default() };
        let layout = compute_layout_with(start + 131_072, 512, "X", &options).unwrap();
        assert_eq!(layout.partition_entry().unwrap().start_lba, start as u32);
        assert_eq!(layout.boot_sector_params(*b"MSWIN4.1").unwrap().hidden_sectors, start as u32);
    }

    #[test]
    fn test_oversized_device_does_not_overflow() {
        let options = GeometryOptions { partition_start: Some(8192), ..Default::default() };
        assert!(matches!(
            compute_layout_with(u64::MAX, 4096, "X", &options),
            Err(GeometryError::TooLarge(_))
        ));
    }

    #[test]
    fn test_deserialized_layout_with_wide_start_is_rejected() {
        let mut layout = compute_layout(131_072, 512, "X").unwrap();
        layout.partition_start = 1u64 << 32;
        assert!(matches!(layout.partition_entry(), Err(GeometryError::InvalidAlignment(_))));
        assert!(layout.boot_sector_params(*b"MSWIN4.1").is_err());
    }

    #[test]
    fn test_geometry_error_translation() {
        let err: FormatterError = GeometryError::InvalidLabel("x".to_string()).into();
        assert!(matches!(err, FormatterError::InvalidDevice(_)));

        let err: FormatterError =
            GeometryError::TooSmall { total_sectors: 1, minimum_sectors: 2 }.into();
        assert!(matches!(err, FormatterError::TooSmall { total_sectors: 1, minimum_sectors: 2 }));
    }

    #[test]
    fn test_plan_report() {
        let layout = compute_layout(131_072, 512, "TESTCARD").unwrap();
        let plan = layout.plan();

        assert_eq!(plan.cluster_bytes, 512);
        assert_eq!(plan.overhead_bytes, (8224 + 2 * 945) * 512);
        assert_eq!(plan.space_after_format, 120_957 * 512);
        assert!(plan.will_erase_data);
        // 120958 clusters is above the FAT32 threshold
        assert!(plan.warnings.is_empty());

        let json = plan.to_json_pretty().unwrap();
        assert!(json.contains("\"sectors_per_fat\": 945"));
    }

    #[test]
    fn test_small_volume_plan_warns() {
        let layout = compute_layout(18_432, 512, "TINY").unwrap();
        assert!(layout.cluster_count < FAT32_MIN_CLUSTERS);
        assert_eq!(layout.plan().warnings.len(), 1);
    }
}
