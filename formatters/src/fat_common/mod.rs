// Building blocks shared by the FAT32 writers: on-disk constants, sector
// builders, label/serial helpers and CHS conversion.

pub mod boot_sector;
pub mod constants;
pub mod fat_table;
pub mod fsinfo;

pub use boot_sector::*;
pub use constants::*;
pub use fat_table::*;
pub use fsinfo::*;

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use thiserror::Error;

/// Bytes that may not appear in a FAT volume label.
const LABEL_FORBIDDEN: &[u8] = b"\"*+,./:;<=>?[\\]|";

/// Why a label was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("label is {0} characters, maximum is 11")]
    TooLong(usize),

    #[error("character {0:?} is not allowed in a label")]
    InvalidCharacter(char),
}

/// Convert a caller label to the 11-byte on-disk form: upper-cased and
/// space padded. An empty label becomes `NO NAME`.
pub fn format_volume_label(label: &str) -> Result<[u8; 11], LabelError> {
    let normalized = label.to_ascii_uppercase();

    if let Some(c) = normalized
        .chars()
        .find(|&c| !c.is_ascii() || c.is_ascii_control() || LABEL_FORBIDDEN.contains(&(c as u8)))
    {
        return Err(LabelError::InvalidCharacter(c));
    }

    let bytes = normalized.as_bytes();
    if bytes.len() > 11 {
        return Err(LabelError::TooLong(bytes.len()));
    }

    if bytes.iter().all(|&b| b == b' ') {
        return Ok(NO_NAME_LABEL);
    }

    let mut result = [0x20u8; 11];
    result[..bytes.len()].copy_from_slice(bytes);
    Ok(result)
}

/// Volume serial derived from the current local time.
pub fn generate_volume_serial() -> u32 {
    volume_serial_at(&Local::now().naive_local())
}

/// DOS-style serial: the high word mixes hour/minute with the year, the low
/// word mixes month/day with second/hundredths.
pub fn volume_serial_at(at: &NaiveDateTime) -> u32 {
    let hundredths = (at.nanosecond() / 10_000_000).min(99);

    let low = (((at.month() << 8) | at.day()) as u16)
        .wrapping_add(((at.second() << 8) | hundredths) as u16);
    let high = (((at.hour() << 8) | at.minute()) as u16).wrapping_add(at.year() as u16);

    ((high as u32) << 16) | low as u32
}

/// Calculate CHS geometry for a given LBA, used for partition table entries.
pub fn lba_to_chs(lba: u32, heads: u16, sectors: u16) -> (u8, u8, u8) {
    let total_sectors = heads as u32 * sectors as u32;
    let cylinder = lba / total_sectors;
    let temp = lba % total_sectors;
    let head = (temp / sectors as u32) as u8;
    let sector = ((temp % sectors as u32) + 1) as u8;

    // CHS has limits: 1023 cylinders, 254 heads, 63 sectors
    if cylinder > 1023 {
        (0xFE, 0xFF, 0xFF)
    } else {
        let cyl_high = ((cylinder >> 2) & 0xC0) as u8;
        let cyl_low = (cylinder & 0xFF) as u8;
        (head, sector | cyl_high, cyl_low)
    }
}
