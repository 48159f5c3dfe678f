use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SUPPORTED_SECTOR_SIZES: [u32; 4] = [512, 1024, 2048, 4096];

/// Largest cluster the band selection or an override may produce.
pub const MAX_CLUSTER_BYTES: u32 = 32 * 1024;

/// Partition offset used unless the configuration pins one.
pub const DEFAULT_PARTITION_OFFSET_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Options for a formatting session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// Bytes per logical sector of the target device.
    pub sector_size: u32,
    /// First sector of the FAT32 partition. `None` starts it at 4 MiB.
    pub partition_alignment: Option<u64>,
    /// Cluster size in bytes. `None` selects it from the capacity bands.
    pub cluster_size: Option<u32>,
    pub oem_name: String,
    pub media_descriptor: u8,
    /// Fixed volume serial. `None` derives one from the clock when the
    /// session opens.
    pub volume_serial: Option<u32>,
    /// Reject writes whose prerequisites have not been written yet.
    pub strict_ordering: bool,
    /// Upper bound for a single zero-fill write.
    pub zero_chunk_size: usize,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            sector_size: 512,
            partition_alignment: None,
            cluster_size: None,
            oem_name: "MSWIN4.1".to_string(),
            media_descriptor: 0xF8,
            volume_serial: None,
            strict_ordering: false,
            zero_chunk_size: 1024 * 1024,
        }
    }
}

impl FormatterConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: FormatterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_SECTOR_SIZES.contains(&self.sector_size) {
            return Err(ConfigError::Invalid(format!(
                "sector size {} is not one of {:?}",
                self.sector_size, SUPPORTED_SECTOR_SIZES
            )));
        }

        // Sector 0 holds the MBR
        if self.partition_alignment == Some(0) {
            return Err(ConfigError::Invalid(
                "partition alignment must leave room for the MBR".to_string(),
            ));
        }

        // Stored in 32-bit MBR and BPB fields
        if let Some(start) = self.partition_alignment {
            if start > u32::MAX as u64 {
                return Err(ConfigError::Invalid(format!(
                    "partition start sector {} does not fit in 32 bits",
                    start
                )));
            }
        }

        if let Some(cluster) = self.cluster_size {
            if !cluster.is_power_of_two()
                || cluster < self.sector_size
                || cluster > MAX_CLUSTER_BYTES
            {
                return Err(ConfigError::Invalid(format!(
                    "cluster size {} must be a power of two between {} and {}",
                    cluster, self.sector_size, MAX_CLUSTER_BYTES
                )));
            }
        }

        if self.oem_name.len() > 8 || !self.oem_name.bytes().all(|b| (0x20..0x7F).contains(&b)) {
            return Err(ConfigError::Invalid(format!(
                "OEM name '{}' must be at most 8 printable ASCII characters",
                self.oem_name
            )));
        }

        // 0xF0 and 0xF8..=0xFF are the only media bytes readers accept
        if self.media_descriptor != 0xF0 && self.media_descriptor < 0xF8 {
            return Err(ConfigError::Invalid(format!(
                "media descriptor 0x{:02X} is not valid",
                self.media_descriptor
            )));
        }

        if self.zero_chunk_size < self.sector_size as usize {
            return Err(ConfigError::Invalid(format!(
                "zero chunk size {} is smaller than one sector",
                self.zero_chunk_size
            )));
        }

        Ok(())
    }

    /// First partition sector, honouring the override.
    pub fn partition_start_sector(&self) -> u64 {
        self.partition_alignment
            .unwrap_or(DEFAULT_PARTITION_OFFSET_BYTES / self.sector_size as u64)
    }

    /// OEM name as the 8 space-padded bytes stored in the boot sector.
    pub fn oem_name_bytes(&self) -> [u8; 8] {
        let mut name = [b' '; 8];
        let bytes = self.oem_name.as_bytes();
        let len = bytes.len().min(8);
        name[..len].copy_from_slice(&bytes[..len]);
        name
    }
}
