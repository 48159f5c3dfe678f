// Shared helpers for the formatting tests
#![allow(dead_code)]

use std::io::{self, Cursor, Seek, SeekFrom, Write};
use std::ops::Range;

use sdformat_core::FormatterConfig;

pub const SECTOR: u64 = 512;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Config with a fixed serial so images are reproducible.
pub fn test_config() -> FormatterConfig {
    FormatterConfig {
        volume_serial: Some(0xCAFE_BABE),
        ..Default::default()
    }
}

pub fn blank_image(total_sectors: u64) -> Cursor<Vec<u8>> {
    Cursor::new(vec![0u8; (total_sectors * SECTOR) as usize])
}

pub fn sector(data: &[u8], lba: u64) -> &[u8] {
    let start = (lba * SECTOR) as usize;
    &data[start..start + SECTOR as usize]
}

/// In-memory device that fails every write touching a byte range.
pub struct FailingDevice {
    inner: Cursor<Vec<u8>>,
    fail_range: Range<u64>,
    kind: io::ErrorKind,
    pub failed_writes: usize,
}

impl FailingDevice {
    pub fn failing_at_sector(total_sectors: u64, lba: u64) -> Self {
        Self {
            inner: blank_image(total_sectors),
            fail_range: lba * SECTOR..(lba + 1) * SECTOR,
            kind: io::ErrorKind::Other,
            failed_writes: 0,
        }
    }

    pub fn with_error_kind(mut self, kind: io::ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn data(&self) -> &[u8] {
        self.inner.get_ref()
    }
}

impl Write for FailingDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let start = self.inner.position();
        let end = start + buf.len() as u64;
        if start < self.fail_range.end && end > self.fail_range.start {
            self.failed_writes += 1;
            return Err(io::Error::new(self.kind, "injected write failure"));
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for FailingDevice {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}
