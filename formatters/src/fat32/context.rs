// FAT32 formatting session: one write operation per on-disk structure,
// all working from the layout computed when the session opens.

use std::io::{Seek, SeekFrom, Write};

use log::{debug, info, warn};
use sdformat_core::{FormatterConfig, FormatterError};

use super::geometry::{compute_layout_with, GeometryOptions, Layout};
use super::session::{FormatStep, SessionProgress, SessionReport};
use crate::fat_common::{
    build_fat32_boot_sector, build_fsinfo_sector, generate_volume_serial, init_fat32_table,
};
use crate::partitioner::build_single_partition_mbr;

/// A formatting session over a borrowed, seekable handle.
///
/// Call the writers in this order, or use [`format_volume`](Self::format_volume),
/// which runs all five and stops at the first failure:
///
/// 1. [`write_master_boot_record`](Self::write_master_boot_record) (optional)
/// 2. [`write_boot_sector`](Self::write_boot_sector)
/// 3. [`write_file_system_info`](Self::write_file_system_info)
/// 4. [`write_fat32`](Self::write_fat32)
/// 5. [`write_root_directory`](Self::write_root_directory)
///
/// The FAT must be written before the root directory. Unless
/// `strict_ordering` is set this is not checked: an out-of-order call logs a
/// warning and writes anyway.
///
/// Each operation writes all of its bytes or returns the error of the write
/// that failed; nothing is retried or rolled back. A sequence that fails part
/// way leaves the device unmountable until it is run again successfully.
///
/// The handle is never flushed or closed here; callers sync it themselves.
/// The context is released exactly once, by [`close`](Self::close) or by
/// dropping it, and must be released before the handle is reused.
pub struct Fat32Context<'a, D: Write + Seek> {
    device: &'a mut D,
    layout: Layout,
    config: FormatterConfig,
    zero_chunk: Vec<u8>,
    progress: SessionProgress,
    bytes_written: u64,
    released: bool,
}

impl<'a, D: Write + Seek> Fat32Context<'a, D> {
    /// Open a session with the default configuration (512-byte sectors).
    pub fn open(
        device: &'a mut D,
        total_sectors: u64,
        label: &str,
    ) -> Result<Self, FormatterError> {
        Self::open_with_config(device, total_sectors, label, &FormatterConfig::default())
    }

    /// Open a session. Validates the inputs and computes the layout; nothing
    /// is written to `device`.
    ///
    /// Fails with `InvalidDevice` for a bad label or configuration and with
    /// `TooSmall` when the device cannot hold a FAT32 volume.
    pub fn open_with_config(
        device: &'a mut D,
        total_sectors: u64,
        label: &str,
        config: &FormatterConfig,
    ) -> Result<Self, FormatterError> {
        config
            .validate()
            .map_err(|e| FormatterError::InvalidDevice(e.to_string()))?;

        let options = GeometryOptions::from(config);
        let layout = compute_layout_with(total_sectors, config.sector_size, label, &options)?;
        let volume_serial = config.volume_serial.unwrap_or_else(generate_volume_serial);
        let layout = layout.with_volume_serial(volume_serial);

        info!(
            "FAT32 session: {} sectors, label '{}', {} sectors/cluster, {} sectors/FAT, \
             {} clusters, serial {:08X}",
            layout.total_sectors,
            layout.label_str(),
            layout.sectors_per_cluster,
            layout.sectors_per_fat,
            layout.cluster_count,
            layout.volume_serial
        );

        let chunk_sectors = (config.zero_chunk_size / config.sector_size as usize).max(1) as u64;
        let largest_fill = layout.fat_bytes().max(layout.cluster_bytes());
        let chunk_len = (chunk_sectors * config.sector_size as u64).min(largest_fill) as usize;

        Ok(Self {
            device,
            layout,
            config: config.clone(),
            zero_chunk: vec![0u8; chunk_len],
            progress: SessionProgress::default(),
            bytes_written: 0,
            released: false,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    pub fn progress(&self) -> SessionProgress {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.progress.is_complete()
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Write the MBR with a single FAT32 LBA partition at sector 0.
    pub fn write_master_boot_record(&mut self) -> Result<(), FormatterError> {
        self.begin(FormatStep::MasterBootRecord)?;

        let entry = self.layout.partition_entry()?;
        let mbr = build_single_partition_mbr(
            self.layout.sector_size as usize,
            &entry,
            self.layout.volume_serial,
        );
        self.write_sectors(0, &mbr, "master boot record")?;

        info!(
            "Wrote MBR: FAT32 partition at sector {} ({} sectors)",
            self.layout.partition_start, self.layout.partition_sectors
        );
        self.progress.mark(FormatStep::MasterBootRecord);
        Ok(())
    }

    /// Write the boot sector and its backup at +6.
    ///
    /// If the backup fails after the primary landed, the error is an
    /// `IoError` and the primary stays on disk.
    pub fn write_boot_sector(&mut self) -> Result<(), FormatterError> {
        self.begin(FormatStep::BootSector)?;

        let params = self.layout.boot_sector_params(self.config.oem_name_bytes())?;
        let boot_sector = build_fat32_boot_sector(&params);

        let primary = self.layout.boot_sector_lba();
        self.write_sectors(primary, &boot_sector, "boot sector")?;
        info!("Wrote FAT32 boot sector at sector {}", primary);

        let backup = self.layout.backup_boot_sector_lba();
        self.write_backup(backup, &boot_sector, "backup boot sector", primary)?;
        info!("Wrote backup boot sector at sector {}", backup);

        self.progress.mark(FormatStep::BootSector);
        Ok(())
    }

    /// Write the FSInfo sector and its backup at +7, with the same backup
    /// policy as the boot sector.
    pub fn write_file_system_info(&mut self) -> Result<(), FormatterError> {
        self.begin(FormatStep::FileSystemInfo)?;

        let fsinfo = build_fsinfo_sector(
            self.layout.sector_size as usize,
            self.layout.free_cluster_count(),
            self.layout.next_free_cluster(),
        );

        let primary = self.layout.fs_info_lba();
        self.write_sectors(primary, &fsinfo, "FSInfo sector")?;
        info!("Wrote FSInfo sector at sector {}", primary);

        let backup = self.layout.backup_fs_info_lba();
        self.write_backup(backup, &fsinfo, "backup FSInfo sector", primary)?;
        info!("Wrote backup FSInfo sector at sector {}", backup);

        self.progress.mark(FormatStep::FileSystemInfo);
        Ok(())
    }

    /// Write every FAT copy: fully zeroed except FAT[0], FAT[1] and the
    /// root directory's end-of-chain entry.
    pub fn write_fat32(&mut self) -> Result<(), FormatterError> {
        self.begin(FormatStep::AllocationTables)?;

        let sector_size = self.layout.sector_size as usize;
        let mut head = vec![0u8; sector_size];
        init_fat32_table(&mut head, self.layout.media_descriptor, self.layout.root_dir_cluster);

        for index in 0..self.layout.fat_count {
            let start = self.layout.fat_start_lba(index);
            let end = start + self.layout.sectors_per_fat as u64;
            self.write_sectors(start, &head, "FAT head")?;
            self.zero_fill(start + 1, end - start - 1, "FAT")?;
            debug!("FAT #{} cleared: sectors {}..{}", index, start, end);
        }

        info!("Wrote {} FAT32 tables", self.layout.fat_count);
        self.progress.mark(FormatStep::AllocationTables);
        Ok(())
    }

    /// Zero the root directory cluster. An empty root directory is valid.
    pub fn write_root_directory(&mut self) -> Result<(), FormatterError> {
        self.begin(FormatStep::RootDirectory)?;

        let start = self.layout.cluster_lba(self.layout.root_dir_cluster);
        self.zero_fill(start, self.layout.sectors_per_cluster as u64, "root directory")?;

        info!("Initialized root directory cluster at sector {}", start);
        self.progress.mark(FormatStep::RootDirectory);
        Ok(())
    }

    /// Run the whole sequence, stopping at the first failure.
    pub fn format_volume(&mut self) -> Result<(), FormatterError> {
        self.write_master_boot_record()?;
        self.write_boot_sector()?;
        self.write_file_system_info()?;
        self.write_fat32()?;
        self.write_root_directory()?;
        info!("FAT32 format completed ({} bytes written)", self.bytes_written);
        Ok(())
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            layout: self.layout.clone(),
            completed_steps: self.progress.completed_steps(),
            bytes_written: self.bytes_written,
            complete: self.progress.is_complete(),
        }
    }

    /// End the session. The handle is left open and unflushed.
    pub fn close(mut self) -> SessionReport {
        let report = self.report();
        self.release();
        report
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.zero_chunk = Vec::new();

        if !self.progress.is_complete() {
            warn!(
                "FAT32 session released before completion; written: {:?}",
                self.progress.completed_steps()
            );
        }
        debug!("Released FAT32 context for '{}'", self.layout.label_str());
    }

    fn begin(&self, step: FormatStep) -> Result<(), FormatterError> {
        if let Some(missing) = self.progress.missing_prerequisite(step) {
            if self.config.strict_ordering {
                return Err(FormatterError::SequenceError(format!(
                    "{} requires the {} to be written first",
                    step, missing
                )));
            }
            warn!("Writing {} before {}", step, missing);
        }
        Ok(())
    }

    fn write_sectors(&mut self, lba: u64, data: &[u8], what: &str) -> Result<(), FormatterError> {
        let offset = self.layout.sector_offset(lba);

        self.device.seek(SeekFrom::Start(offset)).map_err(|e| {
            FormatterError::from_io(&format!("seek to {} at sector {}", what, lba), e)
        })?;
        self.device.write_all(data).map_err(|e| {
            FormatterError::from_io(&format!("write {} at sector {}", what, lba), e)
        })?;

        self.bytes_written += data.len() as u64;
        Ok(())
    }

    fn write_backup(
        &mut self,
        lba: u64,
        data: &[u8],
        what: &str,
        primary: u64,
    ) -> Result<(), FormatterError> {
        self.write_sectors(lba, data, what).map_err(|e| {
            FormatterError::IoError(format!("{} (primary at sector {} was written)", e, primary))
        })
    }

    fn zero_fill(&mut self, start: u64, sectors: u64, what: &str) -> Result<(), FormatterError> {
        let sector_size = self.layout.sector_size as u64;
        let chunk_sectors = (self.zero_chunk.len() as u64 / sector_size).max(1);
        let zeros = std::mem::take(&mut self.zero_chunk);

        let mut result = Ok(());
        let mut lba = start;
        let end = start + sectors;
        while lba < end {
            let count = chunk_sectors.min(end - lba);
            result = self.write_sectors(lba, &zeros[..(count * sector_size) as usize], what);
            if result.is_err() {
                break;
            }
            lba += count;
        }

        self.zero_chunk = zeros;
        result
    }
}

impl<'a, D: Write + Seek> Drop for Fat32Context<'a, D> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdformat_core::ErrorKind;
    use std::io::Cursor;

    fn image(total_sectors: u64) -> Cursor<Vec<u8>> {
        Cursor::new(vec![0u8; (total_sectors * 512) as usize])
    }

    fn config() -> FormatterConfig {
        FormatterConfig { volume_serial: Some(0x1234_ABCD), ..Default::default() }
    }

    #[test]
    fn test_open_writes_nothing() {
        let mut device = image(131_072);
        let context =
            Fat32Context::open_with_config(&mut device, 131_072, "TESTCARD", &config()).unwrap();
        assert_eq!(context.bytes_written(), 0);
        assert_eq!(context.layout().volume_serial, 0x1234_ABCD);
        drop(context);

        assert!(device.get_ref().iter().all(|&b| b == 0));
        assert_eq!(device.position(), 0);
    }

    #[test]
    fn test_invalid_config_is_invalid_device() {
        let mut device = image(131_072);
        let bad = FormatterConfig { sector_size: 100, ..Default::default() };
        let err = Fat32Context::open_with_config(&mut device, 131_072, "X", &bad).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidDevice);
    }

    #[test]
    fn test_wide_partition_start_is_refused_before_writing() {
        let mut device = image(131_072);
        let wide = FormatterConfig { partition_alignment: Some(1u64 << 32), ..config() };
        let err = Fat32Context::open_with_config(&mut device, (1u64 << 32) + 131_072, "X", &wide)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidDevice);
        assert!(device.get_ref().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_strict_ordering_rejects_root_before_fat() {
        let mut device = image(131_072);
        let strict = FormatterConfig { strict_ordering: true, ..config() };
        let mut context =
            Fat32Context::open_with_config(&mut device, 131_072, "X", &strict).unwrap();

        let err = context.write_root_directory().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SequenceError);
        assert_eq!(context.bytes_written(), 0);

        // MBR and boot sector have no prerequisite
        context.write_master_boot_record().unwrap();
        context.write_boot_sector().unwrap();
        assert_eq!(context.write_fat32().unwrap_err().kind(), ErrorKind::SequenceError);
        context.write_file_system_info().unwrap();
        context.write_fat32().unwrap();
        context.write_root_directory().unwrap();
        assert!(context.is_complete());
    }

    #[test]
    fn test_small_zero_chunks_cover_whole_fat() {
        let mut device = Cursor::new(vec![0xEEu8; 131_072 * 512]);
        let tiny_chunks = FormatterConfig { zero_chunk_size: 512, ..config() };
        let mut context =
            Fat32Context::open_with_config(&mut device, 131_072, "X", &tiny_chunks).unwrap();
        context.write_fat32().unwrap();
        let layout = context.layout().clone();
        drop(context);

        let data = device.get_ref();
        let start = layout.sector_offset(layout.fat_start_lba(0)) as usize;
        let end = layout.sector_offset(layout.data_start_lba()) as usize;
        assert!(data[start + 12..start + layout.fat_bytes() as usize].iter().all(|&b| b == 0));
        assert!(data[end..end + 512].iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn test_close_reports_progress() {
        let mut device = image(131_072);
        let mut context =
            Fat32Context::open_with_config(&mut device, 131_072, "X", &config()).unwrap();
        context.write_boot_sector().unwrap();

        let report = context.close();
        assert_eq!(report.completed_steps, vec![FormatStep::BootSector]);
        assert_eq!(report.bytes_written, 1024);
        assert!(!report.complete);
    }
}
