// FSInfo sector builder

use byteorder::{ByteOrder, LittleEndian};

use super::constants::*;

/// Build an FSInfo sector one logical sector long.
///
/// `free_clusters` is the exact count for a fresh volume; `next_free` is the
/// allocation hint readers start searching from.
pub fn build_fsinfo_sector(sector_size: usize, free_clusters: u32, next_free: u32) -> Vec<u8> {
    let mut fsinfo = vec![0u8; sector_size];

    LittleEndian::write_u32(&mut fsinfo[FSI_LEAD_SIG..], FSINFO_LEAD_SIG);
    // 480 reserved bytes stay zero
    LittleEndian::write_u32(&mut fsinfo[FSI_STRUC_SIG..], FSINFO_STRUC_SIG);
    LittleEndian::write_u32(&mut fsinfo[FSI_FREE_COUNT..], free_clusters);
    LittleEndian::write_u32(&mut fsinfo[FSI_NXT_FREE..], next_free);
    LittleEndian::write_u32(&mut fsinfo[FSI_TRAIL_SIG..], FSINFO_TRAIL_SIG);

    fsinfo
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fsinfo_signatures_and_counts() {
        let sector = build_fsinfo_sector(512, 129_000, 3);

        assert_eq!(&sector[0..4], b"RRaA");
        assert_eq!(&sector[484..488], b"rrAa");
        assert_eq!(LittleEndian::read_u32(&sector[488..]), 129_000);
        assert_eq!(LittleEndian::read_u32(&sector[492..]), 3);
        assert_eq!(&sector[508..512], &[0x00, 0x00, 0x55, 0xAA]);
        assert!(sector[4..484].iter().all(|&b| b == 0));
    }
}
